//! Extents for fitting the map view

use geo::BoundingRect;
use mapquery_core::error::Result;
use mapquery_core::models::{BoundingBox, Crs, Feature, Geometry};
use tracing::warn;

use crate::models::{rect_to_bbox, to_geo_geometry};
use crate::transform::Projector;

/// Fraction of the extent added as padding before fitting
pub const EXTENT_PADDING_FRACTION: f64 = 0.1;

/// Bounding box of a single geometry in its own coordinates
pub fn geometry_extent(geometry: &Geometry) -> Option<BoundingBox> {
    to_geo_geometry(geometry).bounding_rect().map(rect_to_bbox)
}

/// Padded view-space extent enclosing every feature outline.
///
/// Polygon features contribute their exterior rings, multipolygons the
/// exterior of every part. Features without a usable geometry are skipped;
/// `None` means nothing had coordinates.
pub fn extent_of(features: &[Feature], data_crs: &Crs, view_crs: &Crs) -> Result<Option<BoundingBox>> {
    let projector = Projector::new(data_crs, view_crs)?;
    let mut coords = Vec::new();

    for feature in features {
        match feature.parsed_geometry() {
            Some(geometry) => coords.extend(projector.convert_all(&geometry.outline_coords())?),
            None if feature.geometry.is_some() => {
                warn!(feature = ?feature.key(), "Skipping feature with unreadable geometry");
            }
            None => {}
        }
    }

    Ok(BoundingBox::from_coords(&coords).map(|bbox| bbox.expand_by_fraction(EXTENT_PADDING_FRACTION)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn polygon_feature(id: i64, ring: Vec<[f64; 2]>) -> Feature {
        Feature::new(Some(id.into()), Some(Geometry::polygon(vec![ring])), BTreeMap::new())
    }

    #[test]
    fn test_extent_is_padded_by_ten_percent() {
        let features = vec![polygon_feature(
            1,
            vec![[0.0, 0.0], [10.0, 0.0], [10.0, 20.0], [0.0, 0.0]],
        )];
        let bbox = extent_of(&features, &Crs::wgs84(), &Crs::wgs84()).unwrap().unwrap();
        assert!((bbox.min_x - -1.0).abs() < 1e-9);
        assert!((bbox.max_x - 11.0).abs() < 1e-9);
        assert!((bbox.min_y - -2.0).abs() < 1e-9);
        assert!((bbox.max_y - 22.0).abs() < 1e-9);
    }

    #[test]
    fn test_extent_spans_all_features() {
        let features = vec![
            polygon_feature(1, vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]),
            polygon_feature(2, vec![[9.0, 9.0], [10.0, 9.0], [10.0, 10.0], [9.0, 9.0]]),
        ];
        let bbox = extent_of(&features, &Crs::wgs84(), &Crs::wgs84()).unwrap().unwrap();
        assert!(bbox.min_x < 0.0 && bbox.max_x > 10.0);
    }

    #[test]
    fn test_extent_reprojects_to_view() {
        let features = vec![polygon_feature(
            1,
            vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]],
        )];
        let bbox = extent_of(&features, &Crs::wgs84(), &Crs::web_mercator()).unwrap().unwrap();
        assert!(bbox.max_x > 111_000.0);
    }

    #[test]
    fn test_features_without_geometry_give_no_extent() {
        let mut broken = Feature::new(Some(3.into()), None, BTreeMap::new());
        broken.geometry = Some(json!({"type": "Unknown"}));
        let features = vec![Feature::new(Some(2.into()), None, BTreeMap::new()), broken];
        assert!(extent_of(&features, &Crs::wgs84(), &Crs::wgs84()).unwrap().is_none());
    }

    #[test]
    fn test_geometry_extent_of_point() {
        let bbox = geometry_extent(&Geometry::point(3.0, 4.0)).unwrap();
        assert_eq!(bbox, BoundingBox::new(3.0, 4.0, 3.0, 4.0));
    }
}
