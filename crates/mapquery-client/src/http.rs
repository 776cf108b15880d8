//! HTTP adapter for the feature backend

use async_trait::async_trait;
use mapquery_core::config::ClientConfig;
use mapquery_core::error::{MapQueryError, Result};
use mapquery_core::models::{LayerDescriptor, LayerQueryResult};
use mapquery_core::ports::{
    FeatureBackend, FeaturePage, FeaturePageRequest, PagedSpatialQueryRequest,
    SpatialQueryRequest, SpatialQueryResponse,
};
use reqwest::{Response, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error};

use crate::dto::{ErrorBody, FeaturesBody, LayersBody, SpatialQueryBody};

/// Feature backend reached over its JSON API
pub struct HttpBackend {
    /// Base URL without trailing slash (e.g., "http://localhost:5000")
    base_url: String,

    /// Page size assumed when a response leaves it out
    default_page_size: u32,

    client: reqwest::Client,
}

impl HttpBackend {
    /// Create a backend client with the configured timeout
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| MapQueryError::BackendUnavailable {
                reason: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            base_url: config.backend_base_url.trim_end_matches('/').to_string(),
            default_page_size: config.default_page_size,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn connection_error(&self, e: reqwest::Error) -> MapQueryError {
        let reason = if e.is_timeout() {
            format!("Request to {} timed out", self.base_url)
        } else {
            format!("Failed to connect to backend at {}: {}", self.base_url, e)
        };
        MapQueryError::BackendUnavailable { reason }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = Url::parse_with_params(&self.endpoint(path), query).map_err(|e| {
            MapQueryError::ConfigInvalid {
                key: "backend_url".to_string(),
                reason: format!("'{}' is not a valid URL: {}", self.base_url, e),
            }
        })?;
        debug!(url = %url, "GET");

        let response =
            self.client.get(url).send().await.map_err(|e| self.connection_error(e))?;
        read_json(response).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = self.endpoint(path);
        debug!(url = %url, "POST");

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.connection_error(e))?;
        read_json(response).await
    }
}

/// Decode a successful response, or turn an error status into `Http`
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .ok()
            .and_then(|body| body.error)
            .unwrap_or_else(|| "Unknown error".to_string());
        error!(status = status.as_u16(), message = %message, "Backend request failed");
        return Err(MapQueryError::Http { status: status.as_u16(), message });
    }

    response
        .json()
        .await
        .map_err(|e| MapQueryError::Decode { reason: e.to_string() })
}

#[async_trait]
impl FeatureBackend for HttpBackend {
    async fn list_layers(&self) -> Result<Vec<LayerDescriptor>> {
        let body: LayersBody = self.get_json("/api/layers", &[]).await?;
        Ok(body.layers)
    }

    async fn fetch_features(&self, request: &FeaturePageRequest) -> Result<FeaturePage> {
        let query = [
            ("layer", request.layer.to_string()),
            ("page", request.page.to_string()),
            ("pageSize", request.page_size.to_string()),
            ("getTotalCount", request.get_total_count.to_string()),
        ];
        let body: FeaturesBody = self.get_json("/api/features", &query).await?;
        Ok(FeaturePage { features: body.features, pagination: body.pagination.map(Into::into) })
    }

    async fn spatial_query(&self, request: &SpatialQueryRequest) -> Result<SpatialQueryResponse> {
        let body: SpatialQueryBody = self.post_json("/api/spatial-query", request).await?;
        Ok(SpatialQueryResponse {
            success: body.success.unwrap_or(true),
            results: body.into_results(self.default_page_size),
        })
    }

    async fn spatial_query_paginated(
        &self,
        request: &PagedSpatialQueryRequest,
    ) -> Result<Vec<LayerQueryResult>> {
        let body: SpatialQueryBody =
            self.post_json("/api/spatial-query-paginated", request).await?;
        Ok(body.into_results(request.page_size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let config = ClientConfig {
            backend_base_url: "http://example.test:5000/".to_string(),
            ..ClientConfig::default()
        };
        let backend = HttpBackend::new(&config).unwrap();
        assert_eq!(backend.base_url(), "http://example.test:5000");
        assert_eq!(backend.endpoint("/api/layers"), "http://example.test:5000/api/layers");
    }
}
