//! GeoJSON export of a displayed result page

use anyhow::{Context, Result};
use geojson::{feature::Id, FeatureCollection, GeoJson, JsonObject};
use mapquery_core::models::{Feature, FeatureId};
use std::path::Path;
use tracing::warn;

/// Convert backend features to a FeatureCollection. Geometries that are not
/// valid GeoJSON are dropped, keeping the feature and its properties.
pub fn feature_collection(features: &[Feature]) -> FeatureCollection {
    let features = features
        .iter()
        .map(|feature| {
            let geometry = feature.geometry.clone().and_then(|value| {
                geojson::Geometry::from_json_value(value)
                    .map_err(|e| warn!(id = ?feature.key(), error = %e, "Dropping unreadable geometry"))
                    .ok()
            });

            let properties: JsonObject =
                feature.properties.iter().map(|(k, v)| (k.clone(), v.clone())).collect();

            geojson::Feature {
                bbox: None,
                geometry,
                id: feature.key().map(|id| match id {
                    FeatureId::Number(n) => Id::Number(n.into()),
                    FeatureId::Text(s) => Id::String(s),
                }),
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    FeatureCollection { bbox: None, features, foreign_members: None }
}

/// Write features to `path` as a GeoJSON FeatureCollection
pub fn write_geojson(path: &Path, features: &[Feature]) -> Result<()> {
    let geojson = GeoJson::FeatureCollection(feature_collection(features));
    std::fs::write(path, geojson.to_string())
        .with_context(|| format!("Failed to write GeoJSON to {}", path.display()))
}
