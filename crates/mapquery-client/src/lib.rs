//! mapquery Client - Spatial query session and backend adapter
//!
//! This crate implements the query use cases: it turns a drawn polygon into a
//! combined spatial query, keeps per-layer results, pages through them and
//! tracks the feature selection. The HTTP adapter talks to the feature backend.

pub mod dto;
pub mod http;
pub mod orchestrator;
pub mod pagination;
pub mod selection;
pub mod store;
pub mod wms;

pub use http::HttpBackend;
pub use orchestrator::{QueryPhase, ResultTab, SessionSnapshot, SpatialQueryOrchestrator};
pub use pagination::{PageFetch, PaginationController};
pub use selection::SelectionSet;
pub use store::QueryResultStore;
pub use wms::{cql_intersects_filter, get_feature_info_url, get_map_url, overlay_source, OverlayState};
