pub mod feature;
pub mod geometry;
pub mod layer;
pub mod pagination;
pub mod query;

pub use feature::{Feature, FeatureId};
pub use geometry::{BoundingBox, Coordinate, Crs, Geometry, GeometryType};
pub use layer::{layer_display_name, LayerDescriptor, LayerId};
pub use pagination::{page_numbers, PageItem, PaginationDescriptor, DEFAULT_PAGE_SIZE};
pub use query::{LayerQueryResult, OutcomeKind, QueryOutcome};
