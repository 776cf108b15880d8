//! mapquery Geo - Coordinate and geometry adapter
//!
//! This crate turns drawn polygons into query WKT, reprojects coordinates
//! between the map view and geographic coordinates, and computes extents for
//! fitting the view.

pub mod extent;
pub mod models;
pub mod query_wkt;
pub mod transform;
pub mod validation;

pub use extent::{extent_of, geometry_extent, EXTENT_PADDING_FRACTION};
pub use query_wkt::{parse_query_wkt, polygon_to_query_wkt, to_query_wkt, WKT_PRECISION};
pub use transform::{reproject_geometry, Projector};
