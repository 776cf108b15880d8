use anyhow::{Context, Result};
use mapquery_core::config::ClientConfig;

use crate::output::OutputWriter;
use crate::output_types::{LayerRow, LayersOutput};

/// Execute the layers command
pub async fn execute(config: &ClientConfig, output: &OutputWriter) -> Result<()> {
    let session = super::open_session(config)?;
    let layers = session.load_layers().await.context("Failed to load layers")?;

    if output.is_json() {
        return output.result(LayersOutput { layers });
    }

    output.info(format!("{} layers at {}", layers.len(), session.backend().base_url()));
    output.table(layers.iter().map(LayerRow::from).collect::<Vec<_>>());
    Ok(())
}
