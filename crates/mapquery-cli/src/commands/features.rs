use anyhow::{Context, Result};
use mapquery_core::config::ClientConfig;
use mapquery_core::models::LayerId;

use crate::cli::FeaturesArgs;
use crate::export::write_geojson;
use crate::output::OutputWriter;
use crate::output_types::FeaturesOutput;

/// Execute the features command
pub async fn execute(args: FeaturesArgs, config: &ClientConfig, output: &OutputWriter) -> Result<()> {
    let session = super::open_session(config)?;
    session.load_layers().await.context("Failed to load layers")?;

    let layer = LayerId::from(args.layer.as_str());
    session.select_layer(layer.clone());

    // The first page carries the total that makes later pages reachable
    if !session.change_page(&layer, 1).await {
        return Err(super::page_failure(&session, 1));
    }
    if args.page != 1 && !session.change_page(&layer, args.page).await {
        return Err(super::page_failure(&session, args.page));
    }

    let snapshot = session.snapshot();
    if let Some(path) = &args.geojson {
        write_geojson(path, &snapshot.features)?;
    }

    if output.is_json() {
        return output.result(FeaturesOutput {
            layer: args.layer,
            pagination: snapshot.pagination,
            features: snapshot.features,
            geojson_path: args.geojson.map(|p| p.display().to_string()),
        });
    }

    super::print_results(&snapshot, output);
    if let Some(path) = &args.geojson {
        output.success(format!("Wrote {} features to {}", snapshot.features.len(), path.display()));
    }
    Ok(())
}
