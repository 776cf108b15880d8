//! Query WKT building and parsing
//!
//! The backend receives the drawn polygon as `POLYGON((x y,x y,...))` in
//! geographic coordinates with six decimals and an explicitly closed ring.

use geo::Polygon;
use mapquery_core::error::{MapQueryError, Result};
use mapquery_core::models::{Coordinate, Crs, Geometry};
use tracing::debug;
use wkt::TryFromWkt;

use crate::models::exterior_coords;
use crate::transform::Projector;
use crate::validation::{check_query_ring, query_exterior};

/// Decimal places written for each ordinate
pub const WKT_PRECISION: usize = 6;

fn format_ring(ring: &[Coordinate]) -> String {
    let mut parts: Vec<String> = ring
        .iter()
        .map(|c| format!("{:.*} {:.*}", WKT_PRECISION, c[0], WKT_PRECISION, c[1]))
        .collect();
    if let Some(first) = parts.first().cloned() {
        parts.push(first);
    }
    format!("POLYGON(({}))", parts.join(","))
}

/// Build query WKT from a ring drawn in `source` coordinates
pub fn to_query_wkt(ring: &[Coordinate], source: &Crs, target: &Crs) -> Result<String> {
    let open = check_query_ring(ring)?;
    let projected = Projector::new(source, target)?.convert_all(open)?;
    let wkt = format_ring(&projected);
    debug!(vertices = open.len(), from = %source.code(), to = %target.code(), "Built query WKT");
    Ok(wkt)
}

/// Build query WKT from a drawn geometry; only polygons are accepted
pub fn polygon_to_query_wkt(geometry: &Geometry, source: &Crs, target: &Crs) -> Result<String> {
    to_query_wkt(query_exterior(geometry)?, source, target)
}

/// Parse query WKT back into its exterior ring, closing vertex included
pub fn parse_query_wkt(text: &str) -> Result<Vec<Coordinate>> {
    let polygon = Polygon::<f64>::try_from_wkt_str(text)
        .map_err(|e| MapQueryError::InvalidWkt { reason: e.to_string() })?;
    Ok(exterior_coords(&polygon))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_wgs84_ring_is_closed_and_formatted() {
        let ring = [[-105.0, 40.0], [-104.0, 40.0], [-104.0, 41.0]];
        let wkt = to_query_wkt(&ring, &Crs::wgs84(), &Crs::wgs84()).unwrap();
        assert_eq!(
            wkt,
            "POLYGON((-105.000000 40.000000,-104.000000 40.000000,\
             -104.000000 41.000000,-105.000000 40.000000))"
        );
    }

    #[test]
    fn test_closed_input_is_not_doubled() {
        let ring = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]];
        let wkt = to_query_wkt(&ring, &Crs::wgs84(), &Crs::wgs84()).unwrap();
        assert_eq!(parse_query_wkt(&wkt).unwrap().len(), 4);
    }

    #[test]
    fn test_web_mercator_ring_is_reprojected() {
        let ring = [[0.0, 0.0], [111_319.490_793, 0.0], [111_319.490_793, 111_325.142_866]];
        let wkt = to_query_wkt(&ring, &Crs::web_mercator(), &Crs::wgs84()).unwrap();
        let coords = parse_query_wkt(&wkt).unwrap();
        assert!((coords[1][0] - 1.0).abs() < 1e-6);
        assert!((coords[2][1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_degenerate_ring_rejected() {
        let ring = [[0.0, 0.0], [1.0, 1.0], [0.0, 0.0]];
        let result = to_query_wkt(&ring, &Crs::wgs84(), &Crs::wgs84());
        assert!(matches!(result, Err(MapQueryError::InsufficientVertices { found: 2 })));
    }

    #[test]
    fn test_point_geometry_rejected() {
        let point = Geometry::point(1.0, 2.0);
        let result = polygon_to_query_wkt(&point, &Crs::wgs84(), &Crs::wgs84());
        assert!(matches!(result, Err(MapQueryError::InvalidGeometryKind { .. })));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(parse_query_wkt("POLYGON((1 2"), Err(MapQueryError::InvalidWkt { .. })));
        assert!(parse_query_wkt("POINT(1 2)").is_err());
    }

    proptest! {
        #[test]
        fn prop_round_trip_within_precision(
            x0 in -179.0f64..179.0, y0 in -85.0f64..85.0,
            dx in 0.01f64..0.9, dy in 0.01f64..0.9,
        ) {
            let ring = [[x0, y0], [x0 + dx, y0], [x0 + dx, y0 + dy], [x0, y0 + dy]];
            let wkt = to_query_wkt(&ring, &Crs::wgs84(), &Crs::wgs84()).unwrap();
            let parsed = parse_query_wkt(&wkt).unwrap();

            prop_assert_eq!(parsed.len(), ring.len() + 1);
            prop_assert_eq!(parsed.first(), parsed.last());
            for (original, read) in ring.iter().zip(parsed.iter()) {
                prop_assert!((original[0] - read[0]).abs() <= 1e-6);
                prop_assert!((original[1] - read[1]).abs() <= 1e-6);
            }
        }

        #[test]
        fn prop_mercator_drawing_round_trips_to_degrees(
            x0 in -179.0f64..179.0, y0 in -80.0f64..79.0,
            dx in 0.01f64..0.9, dy in 0.01f64..0.9,
        ) {
            let ring = [[x0, y0], [x0 + dx, y0], [x0 + dx, y0 + dy], [x0, y0 + dy]];
            let drawn = Projector::new(&Crs::wgs84(), &Crs::web_mercator())
                .unwrap()
                .convert_all(&ring)
                .unwrap();

            let wkt = to_query_wkt(&drawn, &Crs::web_mercator(), &Crs::wgs84()).unwrap();
            let parsed = parse_query_wkt(&wkt).unwrap();

            prop_assert_eq!(parsed.len(), ring.len() + 1);
            prop_assert_eq!(parsed.first(), parsed.last());
            for (original, read) in ring.iter().zip(parsed.iter()) {
                prop_assert!((original[0] - read[0]).abs() <= 1e-6, "{}", wkt);
                prop_assert!((original[1] - read[1]).abs() <= 1e-6, "{}", wkt);
            }
        }
    }
}
