//! Port trait definitions
//!
//! These traits define the interfaces that adapters must implement.

pub mod backend;
pub mod map;

pub use backend::{
    FeatureBackend, FeaturePage, FeaturePageRequest, PagedSpatialQueryRequest,
    SpatialQueryRequest, SpatialQueryResponse,
};
pub use map::{FitOptions, MapSurface, WmsSource, FIT_DURATION, FIT_PADDING};
