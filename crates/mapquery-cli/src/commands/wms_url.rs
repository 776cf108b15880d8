use anyhow::{Context, Result};
use mapquery_client::wms::WMS_SRS;
use mapquery_client::{get_feature_info_url, get_map_url, overlay_source, OverlayState};
use mapquery_core::config::ClientConfig;
use mapquery_core::models::{BoundingBox, Crs, Geometry, LayerId};
use mapquery_geo::{
    geometry_extent, parse_query_wkt, reproject_geometry, to_query_wkt, EXTENT_PADDING_FRACTION,
};

use crate::cli::WmsUrlArgs;
use crate::output::OutputWriter;
use crate::output_types::WmsUrlOutput;

/// Execute the wms-url command
pub fn execute(args: WmsUrlArgs, config: &ClientConfig, output: &OutputWriter) -> Result<()> {
    let layer = LayerId::from(args.layer.as_str());

    let ring = args.wkt.as_deref().map(parse_query_wkt).transpose()?;
    let state = match &ring {
        Some(ring) => OverlayState::Filtered {
            wkt: to_query_wkt(ring, &config.data_crs, &config.data_crs)?,
        },
        None => OverlayState::Unfiltered,
    };

    let bbox = match (&args.bbox, &ring) {
        (Some(text), _) => {
            let v = super::parse_numbers(text, 4, "bbox")?;
            BoundingBox::new(v[0], v[1], v[2], v[3])
        }
        (None, Some(ring)) => {
            let polygon = Geometry::polygon(vec![ring.clone()]);
            let projected = reproject_geometry(&polygon, &config.data_crs, &Crs::web_mercator())?;
            geometry_extent(&projected)
                .context("Polygon has no extent")?
                .expand_by_fraction(EXTENT_PADDING_FRACTION)
        }
        (None, None) => anyhow::bail!("Give --bbox (in {}) or --wkt to derive one", WMS_SRS),
    };

    let source = overlay_source(&config.wms_base_url, &layer, &state);
    let get_map = get_map_url(&source, &bbox, args.width, args.height)?;

    let get_feature_info = match (&args.click, args.resolution) {
        (Some(click), Some(resolution)) => {
            let point = super::parse_numbers(click, 2, "click point")?;
            Some(get_feature_info_url(&source, [point[0], point[1]], resolution)?)
        }
        _ => None,
    };

    if output.is_json() {
        return output.result(WmsUrlOutput {
            layer: args.layer,
            cql_filter: state.cql_filter(),
            bbox,
            get_map,
            get_feature_info,
        });
    }

    if let Some(filter) = state.cql_filter() {
        output.kv("CQL_FILTER", filter);
    }
    output.kv("GetMap", get_map);
    if let Some(url) = get_feature_info {
        output.kv("GetFeatureInfo", url);
    }
    Ok(())
}
