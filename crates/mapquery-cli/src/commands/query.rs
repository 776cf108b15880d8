use anyhow::{Context, Result};
use mapquery_core::config::ClientConfig;
use mapquery_core::models::{Coordinate, FeatureId, Geometry, LayerId, OutcomeKind};
use mapquery_geo::{parse_query_wkt, polygon_to_query_wkt, reproject_geometry};
use tracing::info;

use crate::cli::QueryArgs;
use crate::export::write_geojson;
use crate::output::OutputWriter;
use crate::output_types::QueryOutput;

/// Execute the query command
pub async fn execute(args: QueryArgs, config: &ClientConfig, output: &OutputWriter) -> Result<()> {
    let drawing = drawing_from_args(&args, config)?;

    // Reject bad polygons before talking to the backend
    polygon_to_query_wkt(&drawing, &config.view_crs, &config.data_crs)?;

    let session = super::open_session(config)?;
    session.load_layers().await.context("Failed to load layers")?;

    session.start_drawing();
    let outcome = session
        .complete_drawing(Some(drawing))
        .await
        .context("Query was superseded by a newer one")?;
    if outcome.is_error() {
        anyhow::bail!(outcome.message);
    }

    if let Some(layer) = &args.layer {
        if !session.set_active_tab(&LayerId::from(layer.as_str())).await {
            output.warning(format!("No results for layer {}", layer));
        }
    }

    if args.page != 1 {
        let layer = session
            .snapshot()
            .active_tab
            .context("No layer has features to page through")?;
        if !session.change_page(&layer, args.page).await {
            return Err(super::page_failure(&session, args.page));
        }
    }

    if !args.select.is_empty() {
        session.select_many(args.select.iter().map(|id| parse_feature_id(id)), true);
        if !session.zoom_to_selected() {
            output.warning("None of the selected features are on the shown page");
        }
    }

    let snapshot = session.snapshot();
    if let Some(path) = &args.geojson {
        write_geojson(path, &snapshot.features)?;
        info!(path = %path.display(), count = snapshot.features.len(), "Wrote GeoJSON");
    }

    if output.is_json() {
        return output.result(QueryOutput {
            query_wkt: session.query_wkt(),
            session: snapshot,
            geojson_path: args.geojson.map(|p| p.display().to_string()),
        });
    }

    if let Some(outcome) = &snapshot.outcome {
        match outcome.kind {
            OutcomeKind::Success => output.success(&outcome.message),
            OutcomeKind::Info => output.info(&outcome.message),
            OutcomeKind::Error => output.error(&outcome.message),
        }
    }
    super::print_results(&snapshot, output);

    if let Some((layer, _)) = session.map().overlay() {
        let filter = if snapshot.overlay_filtered { "filtered" } else { "unfiltered" };
        output.kv("Overlay", format!("{} ({})", layer, filter));
    }
    if let Some(extent) = session.map().extent() {
        output.kv("View", extent.to_bbox_param());
    }
    if !snapshot.selection.is_empty() {
        output.kv("Highlighted", session.map().highlighted());
    }
    if let Some(path) = &args.geojson {
        output.success(format!("Wrote {} features to {}", snapshot.features.len(), path.display()));
    }
    Ok(())
}

/// Query polygon in view coordinates
fn drawing_from_args(args: &QueryArgs, config: &ClientConfig) -> Result<Geometry> {
    match (&args.ring, &args.wkt) {
        (Some(ring), _) => Ok(Geometry::polygon(vec![parse_ring(ring)?])),
        (None, Some(wkt)) => {
            let ring = parse_query_wkt(wkt)?;
            let polygon = Geometry::polygon(vec![ring]);
            Ok(reproject_geometry(&polygon, &config.data_crs, &config.view_crs)?)
        }
        (None, None) => anyhow::bail!("Give the polygon with --ring or --wkt"),
    }
}

/// Parse `"x y, x y, ..."` into a ring, closing it if needed
fn parse_ring(text: &str) -> Result<Vec<Coordinate>> {
    let mut ring = text
        .split(',')
        .map(|pair| -> Result<Coordinate> {
            let numbers = pair
                .split_whitespace()
                .map(str::parse::<f64>)
                .collect::<std::result::Result<Vec<_>, _>>()
                .with_context(|| format!("Invalid vertex '{}'", pair.trim()))?;
            match numbers.as_slice() {
                [x, y] => Ok([*x, *y]),
                _ => anyhow::bail!("Invalid vertex '{}': expected \"x y\"", pair.trim()),
            }
        })
        .collect::<Result<Vec<Coordinate>>>()?;

    if let (Some(first), Some(last)) = (ring.first().copied(), ring.last().copied()) {
        if first != last {
            ring.push(first);
        }
    }
    Ok(ring)
}

/// Numeric ids select numeric features, anything else is a string id
fn parse_feature_id(text: &str) -> FeatureId {
    text.trim()
        .parse::<i64>()
        .map(FeatureId::Number)
        .unwrap_or_else(|_| FeatureId::Text(text.trim().to_string()))
}
