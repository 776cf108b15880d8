//! Wire formats of the feature backend's JSON API

use std::collections::BTreeMap;

use mapquery_core::models::{Feature, LayerDescriptor, LayerId, LayerQueryResult, PaginationDescriptor};
use serde::Deserialize;

/// `GET /api/layers`
#[derive(Debug, Deserialize)]
pub struct LayersBody {
    #[serde(default)]
    pub layers: Vec<LayerDescriptor>,
}

/// Pagination block of `GET /api/features`.
///
/// Only the inputs are read; `totalPages` and `hasMore` are derived again.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationBody {
    pub page: u32,
    pub page_size: u32,
    pub total_features: u64,
}

impl From<PaginationBody> for PaginationDescriptor {
    fn from(body: PaginationBody) -> Self {
        PaginationDescriptor::new(body.page, body.page_size, body.total_features)
    }
}

/// `GET /api/features`
#[derive(Debug, Deserialize)]
pub struct FeaturesBody {
    #[serde(default)]
    pub features: Vec<Feature>,
    #[serde(default)]
    pub pagination: Option<PaginationBody>,
}

/// Per-layer entry of both spatial query endpoints
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerResultBody {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub features: Vec<Feature>,
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub layer_name: Option<String>,
    #[serde(default)]
    pub error: Option<String>,

    // Paginated endpoint only
    #[serde(default)]
    pub current_page: Option<u32>,
    #[serde(default)]
    pub page_size: Option<u32>,
    #[serde(default)]
    pub total_features: Option<u64>,
}

impl LayerResultBody {
    /// Convert into a domain result; `page_size` fills in a missing page size
    pub fn into_result(self, layer_id: LayerId, page_size: u32) -> LayerQueryResult {
        let count = self.count.unwrap_or(self.features.len() as u64);
        let pagination = match (self.current_page, self.total_features) {
            (Some(page), Some(total)) => {
                Some(PaginationDescriptor::new(page, self.page_size.unwrap_or(page_size), total))
            }
            _ => None,
        };

        LayerQueryResult {
            layer_name: self.layer_name.unwrap_or_else(|| layer_id.to_string()),
            layer_id,
            success: self.success,
            features: self.features,
            count,
            pagination,
            error: self.error,
        }
    }
}

/// `POST /api/spatial-query` and `POST /api/spatial-query-paginated`
#[derive(Debug, Deserialize)]
pub struct SpatialQueryBody {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub results: BTreeMap<String, LayerResultBody>,
}

impl SpatialQueryBody {
    pub fn into_results(self, page_size: u32) -> Vec<LayerQueryResult> {
        self.results
            .into_iter()
            .map(|(layer, body)| body.into_result(LayerId::from(layer), page_size))
            .collect()
    }
}

/// Error body `{ "error": "..." }`
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_spatial_query_body() {
        let body: SpatialQueryBody = serde_json::from_value(json!({
            "success": true,
            "results": {
                "topp:states": {
                    "success": true,
                    "features": [{"id": 1, "geometry": null, "properties": {"name": "CO"}}],
                    "count": 1,
                    "layerName": "States",
                    "loadTime": 12.5
                },
                "topp:roads": {
                    "success": false,
                    "features": [],
                    "count": 0,
                    "error": "HTTP 500"
                }
            },
            "totalTime": 20.0
        }))
        .unwrap();

        let results = body.into_results(100);
        let roads = results.iter().find(|r| r.layer_id.as_str() == "topp:roads").unwrap();
        assert!(!roads.success);
        assert_eq!(roads.layer_name, "topp:roads");
        assert_eq!(roads.error.as_deref(), Some("HTTP 500"));

        let states = results.iter().find(|r| r.layer_id.as_str() == "topp:states").unwrap();
        assert_eq!(states.layer_name, "States");
        assert!(states.pagination.is_none());
    }

    #[test]
    fn test_paginated_entry_rebuilds_descriptor() {
        let body: LayerResultBody = serde_json::from_value(json!({
            "success": true,
            "features": [],
            "count": 250,
            "layerName": "Parcels",
            "currentPage": 2,
            "pageSize": 100,
            "totalFeatures": 250,
            "totalPages": 99
        }))
        .unwrap();

        let result = body.into_result("parcels".into(), 100);
        assert_eq!(result.pagination, Some(PaginationDescriptor::new(2, 100, 250)));
        assert_eq!(result.pagination.unwrap().total_pages, 3);
    }

    #[test]
    fn test_features_body_without_pagination() {
        let body: FeaturesBody = serde_json::from_value(json!({"features": []})).unwrap();
        assert!(body.pagination.is_none());
    }

    #[test]
    fn test_error_body() {
        let body: ErrorBody = serde_json::from_str(r#"{"error": "db timeout"}"#).unwrap();
        assert_eq!(body.error.as_deref(), Some("db timeout"));
    }
}
