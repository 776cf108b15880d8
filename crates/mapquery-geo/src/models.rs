//! Conversions between mapquery geometries and the `geo` crate.

use geo::{Coord, Geometry as GeoGeometry, LineString, MultiPolygon, Polygon, Rect};
use mapquery_core::models::{BoundingBox, Coordinate, Geometry};

fn line(coords: &[Coordinate]) -> LineString<f64> {
    LineString::new(coords.iter().map(|c| Coord { x: c[0], y: c[1] }).collect())
}

fn polygon(rings: &[Vec<Coordinate>]) -> Polygon<f64> {
    match rings.split_first() {
        Some((exterior, interiors)) => {
            Polygon::new(line(exterior), interiors.iter().map(|r| line(r)).collect())
        }
        None => Polygon::new(LineString::new(vec![]), vec![]),
    }
}

/// Convert a canonical Geometry to a geo::Geometry
pub fn to_geo_geometry(geom: &Geometry) -> GeoGeometry<f64> {
    match geom {
        Geometry::Point { coordinates } => {
            GeoGeometry::Point(geo::Point::new(coordinates[0], coordinates[1]))
        }
        Geometry::LineString { coordinates } => GeoGeometry::LineString(line(coordinates)),
        Geometry::Polygon { coordinates } => GeoGeometry::Polygon(polygon(coordinates)),
        Geometry::MultiPoint { coordinates } => GeoGeometry::MultiPoint(
            coordinates.iter().map(|c| geo::Point::new(c[0], c[1])).collect(),
        ),
        Geometry::MultiLineString { coordinates } => GeoGeometry::MultiLineString(
            geo::MultiLineString::new(coordinates.iter().map(|l| line(l)).collect()),
        ),
        Geometry::MultiPolygon { coordinates } => GeoGeometry::MultiPolygon(MultiPolygon::new(
            coordinates.iter().map(|p| polygon(p)).collect(),
        )),
    }
}

/// Exterior ring of a geo polygon as plain coordinates
pub fn exterior_coords(polygon: &Polygon<f64>) -> Vec<Coordinate> {
    polygon.exterior().coords().map(|c| [c.x, c.y]).collect()
}

/// Convert a geo rectangle into a bounding box
pub fn rect_to_bbox(rect: Rect<f64>) -> BoundingBox {
    BoundingBox::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::BoundingRect;

    #[test]
    fn test_polygon_conversion_keeps_holes() {
        let geom = Geometry::polygon(vec![
            vec![[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 0.0]],
            vec![[1.0, 1.0], [2.0, 1.0], [2.0, 2.0], [1.0, 1.0]],
        ]);
        match to_geo_geometry(&geom) {
            GeoGeometry::Polygon(p) => {
                assert_eq!(p.interiors().len(), 1);
                assert_eq!(exterior_coords(&p).len(), 4);
            }
            other => panic!("Expected Polygon, got {:?}", other),
        }
    }

    #[test]
    fn test_bounding_rect_of_line() {
        let geom = Geometry::line_string(vec![[-3.0, 2.0], [5.0, -1.0]]);
        let rect = to_geo_geometry(&geom).bounding_rect().unwrap();
        assert_eq!(rect_to_bbox(rect), BoundingBox::new(-3.0, -1.0, 5.0, 2.0));
    }
}
