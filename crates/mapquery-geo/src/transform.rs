//! CRS transformation between the map view and geographic coordinates

use mapquery_core::error::{MapQueryError, Result};
use mapquery_core::models::{Coordinate, Crs, Geometry};
use proj4rs::proj::Proj;
use proj4rs::transform::transform;

/// PROJ.4 definitions for the CRS codes the viewer works with
fn proj4_definition(crs: &Crs) -> Option<&'static str> {
    match crs.epsg {
        4326 => Some("+proj=longlat +datum=WGS84 +no_defs +type=crs"),
        3857 => Some(
            "+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 \
             +units=m +nadgrids=@null +wktext +no_defs +type=crs",
        ),
        _ => None,
    }
}

/// Check if two CRS are the same
pub fn crs_match(crs1: &Crs, crs2: &Crs) -> bool {
    crs1.epsg == crs2.epsg
}

/// Coordinate converter between two CRS.
///
/// Geographic coordinates are taken and returned in degrees; the radian
/// conversion PROJ.4 expects is handled here.
pub struct Projector {
    from: Crs,
    to: Crs,
    projs: Option<(Proj, Proj)>,
}

impl Projector {
    pub fn new(from: &Crs, to: &Crs) -> Result<Self> {
        if crs_match(from, to) {
            return Ok(Self { from: from.clone(), to: to.clone(), projs: None });
        }

        let build = |crs: &Crs| -> Result<Proj> {
            let definition = proj4_definition(crs).ok_or_else(|| MapQueryError::Projection {
                from: from.code(),
                to: to.code(),
                reason: format!("unsupported CRS {}", crs.code()),
            })?;
            Proj::from_proj_string(definition).map_err(|e| MapQueryError::Projection {
                from: from.code(),
                to: to.code(),
                reason: format!("failed to build PROJ.4 definition for {}: {}", crs.code(), e),
            })
        };

        let source = build(from)?;
        let target = build(to)?;
        Ok(Self { from: from.clone(), to: to.clone(), projs: Some((source, target)) })
    }

    /// Whether conversion leaves coordinates untouched
    pub fn is_identity(&self) -> bool {
        self.projs.is_none()
    }

    /// Convert one coordinate
    pub fn convert(&self, coord: Coordinate) -> Result<Coordinate> {
        let Some((source, target)) = &self.projs else {
            return Ok(coord);
        };

        let mut point = if self.from.is_geographic() {
            (coord[0].to_radians(), coord[1].to_radians(), 0.0)
        } else {
            (coord[0], coord[1], 0.0)
        };

        transform(source, target, &mut point).map_err(|e| MapQueryError::Projection {
            from: self.from.code(),
            to: self.to.code(),
            reason: format!("cannot convert ({}, {}): {}", coord[0], coord[1], e),
        })?;

        if self.to.is_geographic() {
            Ok([point.0.to_degrees(), point.1.to_degrees()])
        } else {
            Ok([point.0, point.1])
        }
    }

    /// Convert a sequence of coordinates, failing on the first bad one
    pub fn convert_all(&self, coords: &[Coordinate]) -> Result<Vec<Coordinate>> {
        coords.iter().map(|c| self.convert(*c)).collect()
    }

    fn convert_rings(&self, rings: &[Vec<Coordinate>]) -> Result<Vec<Vec<Coordinate>>> {
        rings.iter().map(|ring| self.convert_all(ring)).collect()
    }
}

/// Reproject a geometry from one CRS to another
pub fn reproject_geometry(geometry: &Geometry, from_crs: &Crs, to_crs: &Crs) -> Result<Geometry> {
    let projector = Projector::new(from_crs, to_crs)?;
    if projector.is_identity() {
        return Ok(geometry.clone());
    }

    let transformed = match geometry {
        Geometry::Point { coordinates } => {
            Geometry::Point { coordinates: projector.convert(*coordinates)? }
        }
        Geometry::LineString { coordinates } => {
            Geometry::LineString { coordinates: projector.convert_all(coordinates)? }
        }
        Geometry::MultiPoint { coordinates } => {
            Geometry::MultiPoint { coordinates: projector.convert_all(coordinates)? }
        }
        Geometry::Polygon { coordinates } => {
            Geometry::Polygon { coordinates: projector.convert_rings(coordinates)? }
        }
        Geometry::MultiLineString { coordinates } => {
            Geometry::MultiLineString { coordinates: projector.convert_rings(coordinates)? }
        }
        Geometry::MultiPolygon { coordinates } => Geometry::MultiPolygon {
            coordinates: coordinates
                .iter()
                .map(|polygon| projector.convert_rings(polygon))
                .collect::<Result<_>>()?,
        },
    };

    Ok(transformed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Coordinate, b: Coordinate, tolerance: f64) -> bool {
        (a[0] - b[0]).abs() < tolerance && (a[1] - b[1]).abs() < tolerance
    }

    #[test]
    fn test_identity_projection() {
        let projector = Projector::new(&Crs::wgs84(), &Crs::wgs84()).unwrap();
        assert!(projector.is_identity());
        assert_eq!(projector.convert([-105.5, 40.25]).unwrap(), [-105.5, 40.25]);
    }

    #[test]
    fn test_web_mercator_origin() {
        let projector = Projector::new(&Crs::web_mercator(), &Crs::wgs84()).unwrap();
        assert!(close(projector.convert([0.0, 0.0]).unwrap(), [0.0, 0.0], 1e-9));
    }

    #[test]
    fn test_wgs84_to_web_mercator_known_point() {
        let projector = Projector::new(&Crs::wgs84(), &Crs::web_mercator()).unwrap();
        let converted = projector.convert([10.0, 50.0]).unwrap();
        assert!(close(converted, [1_113_194.907_9, 6_446_275.841_0], 0.01), "{:?}", converted);
    }

    #[test]
    fn test_round_trip_through_web_mercator() {
        let forward = Projector::new(&Crs::wgs84(), &Crs::web_mercator()).unwrap();
        let back = Projector::new(&Crs::web_mercator(), &Crs::wgs84()).unwrap();
        let original = [-104.991, 39.742];
        let round = back.convert(forward.convert(original).unwrap()).unwrap();
        assert!(close(round, original, 1e-9));
    }

    #[test]
    fn test_unsupported_crs() {
        let result = Projector::new(&Crs::from_epsg(32748), &Crs::wgs84());
        assert!(matches!(result, Err(MapQueryError::Projection { .. })));
    }

    #[test]
    fn test_reproject_polygon_keeps_structure() {
        let polygon = Geometry::polygon(vec![vec![
            [0.0, 0.0],
            [1.0, 0.0],
            [1.0, 1.0],
            [0.0, 0.0],
        ]]);
        let projected = reproject_geometry(&polygon, &Crs::wgs84(), &Crs::web_mercator()).unwrap();
        match projected {
            Geometry::Polygon { coordinates } => {
                assert_eq!(coordinates.len(), 1);
                assert_eq!(coordinates[0].len(), 4);
                assert!(coordinates[0][1][0] > 111_000.0);
            }
            other => panic!("Expected Polygon, got {:?}", other),
        }
    }
}
