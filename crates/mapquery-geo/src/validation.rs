//! Validation of drawn query rings

use mapquery_core::error::{MapQueryError, Result};
use mapquery_core::models::{Coordinate, Geometry, GeometryType};

/// Minimum number of distinct vertices of a query polygon
pub const MIN_DISTINCT_VERTICES: usize = 3;

/// Validation result with details
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
}

/// Validation error with location details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub location: String,
    pub reason: String,
}

impl ValidationResult {
    /// Create a valid result
    pub fn valid() -> Self {
        Self { is_valid: true, errors: Vec::new() }
    }

    /// Add an error to the result
    pub fn add_error(&mut self, location: String, reason: String) {
        self.is_valid = false;
        self.errors.push(ValidationError { location, reason });
    }
}

/// Drop a trailing vertex that repeats the first one
pub fn open_ring(ring: &[Coordinate]) -> &[Coordinate] {
    match (ring.first(), ring.last()) {
        (Some(first), Some(last)) if ring.len() > 1 && first == last => &ring[..ring.len() - 1],
        _ => ring,
    }
}

/// Number of distinct vertices, ignoring the closing repeat
pub fn distinct_vertex_count(ring: &[Coordinate]) -> usize {
    let mut seen: Vec<Coordinate> = Vec::with_capacity(ring.len());
    for coord in open_ring(ring) {
        if !seen.contains(coord) {
            seen.push(*coord);
        }
    }
    seen.len()
}

/// Report every problem with a ring without stopping at the first
pub fn validate_ring(ring: &[Coordinate]) -> ValidationResult {
    let mut result = ValidationResult::valid();

    for (i, coord) in ring.iter().enumerate() {
        if !coord[0].is_finite() || !coord[1].is_finite() {
            result.add_error(format!("Ring[{}]", i), "Coordinates must be finite".to_string());
        }
    }

    let distinct = distinct_vertex_count(ring);
    if distinct < MIN_DISTINCT_VERTICES {
        result.add_error(
            "Ring".to_string(),
            format!(
                "Polygon must have at least {} distinct vertices, found {}",
                MIN_DISTINCT_VERTICES, distinct
            ),
        );
    }

    result
}

/// Validate a query ring and return it without its closing vertex
pub fn check_query_ring(ring: &[Coordinate]) -> Result<&[Coordinate]> {
    let distinct = distinct_vertex_count(ring);
    if distinct < MIN_DISTINCT_VERTICES {
        return Err(MapQueryError::InsufficientVertices { found: distinct });
    }

    let validation = validate_ring(ring);
    if !validation.is_valid {
        return Err(MapQueryError::InvalidGeometry {
            reason: validation
                .errors
                .first()
                .map(|e| format!("{}: {}", e.location, e.reason))
                .unwrap_or_else(|| "Invalid ring".to_string()),
        });
    }

    Ok(open_ring(ring))
}

/// Exterior ring of a drawn query shape; anything but a polygon is rejected
pub fn query_exterior(geometry: &Geometry) -> Result<&[Coordinate]> {
    match geometry.geometry_type() {
        GeometryType::Polygon => Ok(geometry.exterior_ring().unwrap_or(&[])),
        other => Err(MapQueryError::InvalidGeometryKind { kind: other.to_string() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_triangle_is_valid() {
        let ring = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]];
        assert!(validate_ring(&ring).is_valid);
        assert_eq!(check_query_ring(&ring).unwrap().len(), 3);
    }

    #[test]
    fn test_open_triangle_is_valid() {
        let ring = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]];
        assert_eq!(check_query_ring(&ring).unwrap().len(), 3);
    }

    #[test]
    fn test_repeated_vertices_do_not_count() {
        let ring = [[0.0, 0.0], [1.0, 0.0], [1.0, 0.0], [0.0, 0.0]];
        assert_eq!(distinct_vertex_count(&ring), 2);
        assert!(matches!(
            check_query_ring(&ring),
            Err(MapQueryError::InsufficientVertices { found: 2 })
        ));
    }

    #[test]
    fn test_non_finite_coordinates_rejected() {
        let ring = [[0.0, 0.0], [f64::NAN, 0.0], [1.0, 1.0], [2.0, 2.0]];
        let validation = validate_ring(&ring);
        assert!(!validation.is_valid);
        assert_eq!(validation.errors[0].location, "Ring[1]");
    }

    #[test]
    fn test_non_finite_query_ring_is_invalid_geometry() {
        let ring = [[0.0, 0.0], [1.0, 0.0], [f64::NAN, 1.0], [0.0, 1.0], [0.0, 0.0]];
        match check_query_ring(&ring) {
            Err(MapQueryError::InvalidGeometry { reason }) => {
                assert_eq!(reason, "Ring[2]: Coordinates must be finite");
            }
            other => panic!("Expected invalid geometry, got {:?}", other),
        }
    }

    #[test]
    fn test_non_polygon_rejected() {
        let line = Geometry::line_string(vec![[0.0, 0.0], [1.0, 1.0]]);
        assert!(matches!(query_exterior(&line), Err(MapQueryError::InvalidGeometryKind { .. })));
    }
}
