use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{Feature, LayerDescriptor, LayerId, LayerQueryResult, PaginationDescriptor};

/// Combined spatial query across several layers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialQueryRequest {
    /// Query polygon as WKT in geographic coordinates
    pub geometry: String,
    pub layers: Vec<LayerId>,
}

/// Spatial query for one page of results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedSpatialQueryRequest {
    pub geometry: String,
    pub layers: Vec<LayerId>,
    pub page: u32,
    pub page_size: u32,
}

/// Plain per-layer feature page, without a spatial constraint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeaturePageRequest {
    pub layer: LayerId,
    pub page: u32,
    pub page_size: u32,
    pub get_total_count: bool,
}

/// Response to a [`FeaturePageRequest`]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeaturePage {
    pub features: Vec<Feature>,

    /// Absent when the backend skipped recomputing the total
    pub pagination: Option<PaginationDescriptor>,
}

/// Response to a [`SpatialQueryRequest`]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpatialQueryResponse {
    pub success: bool,

    /// One entry per layer the backend answered for, in no particular order
    pub results: Vec<LayerQueryResult>,
}

/// Port for the feature backend that performs the actual spatial intersection
#[async_trait]
pub trait FeatureBackend: Send + Sync {
    /// List queryable layers
    async fn list_layers(&self) -> Result<Vec<LayerDescriptor>>;

    /// Fetch one page of a layer's features
    async fn fetch_features(&self, request: &FeaturePageRequest) -> Result<FeaturePage>;

    /// Intersect a polygon with every requested layer
    async fn spatial_query(&self, request: &SpatialQueryRequest) -> Result<SpatialQueryResponse>;

    /// Intersect a polygon with every requested layer, returning one page per
    /// layer with authoritative pagination metadata
    async fn spatial_query_paginated(
        &self,
        request: &PagedSpatialQueryRequest,
    ) -> Result<Vec<LayerQueryResult>>;
}
