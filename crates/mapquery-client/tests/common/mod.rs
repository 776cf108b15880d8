//! In-memory fakes of the backend and map ports

#![allow(dead_code)]

use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use mapquery_core::config::ClientConfig;
use mapquery_core::error::{MapQueryError, Result};
use mapquery_core::models::{
    BoundingBox, Crs, Feature, FeatureId, Geometry, LayerDescriptor, LayerId, LayerQueryResult,
};
use mapquery_core::ports::{
    FeatureBackend, FeaturePage, FeaturePageRequest, FitOptions, MapSurface,
    PagedSpatialQueryRequest, SpatialQueryRequest, SpatialQueryResponse, WmsSource,
};

#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    ListLayers,
    Features(FeaturePageRequest),
    Spatial(SpatialQueryRequest),
    Paginated(PagedSpatialQueryRequest),
}

/// Backend answering from scripted queues, one entry per call
#[derive(Default)]
pub struct FakeBackend {
    pub layers: Vec<LayerDescriptor>,
    spatial: Mutex<VecDeque<(Duration, Result<SpatialQueryResponse>)>>,
    paginated: Mutex<VecDeque<Result<Vec<LayerQueryResult>>>>,
    features: Mutex<VecDeque<Result<FeaturePage>>>,
    calls: Mutex<Vec<BackendCall>>,
}

impl FakeBackend {
    pub fn with_layers(layers: Vec<LayerDescriptor>) -> Self {
        Self { layers, ..Self::default() }
    }

    pub fn push_spatial(&self, response: Result<SpatialQueryResponse>) {
        self.push_spatial_delayed(Duration::ZERO, response);
    }

    pub fn push_spatial_delayed(&self, delay: Duration, response: Result<SpatialQueryResponse>) {
        self.spatial.lock().unwrap().push_back((delay, response));
    }

    pub fn push_paginated(&self, response: Result<Vec<LayerQueryResult>>) {
        self.paginated.lock().unwrap().push_back(response);
    }

    pub fn push_features(&self, response: Result<FeaturePage>) {
        self.features.lock().unwrap().push_back(response);
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: BackendCall) {
        self.calls.lock().unwrap().push(call);
    }
}

fn exhausted(what: &str) -> MapQueryError {
    MapQueryError::BackendUnavailable { reason: format!("no scripted {} response", what) }
}

#[async_trait]
impl FeatureBackend for FakeBackend {
    async fn list_layers(&self) -> Result<Vec<LayerDescriptor>> {
        self.record(BackendCall::ListLayers);
        Ok(self.layers.clone())
    }

    async fn fetch_features(&self, request: &FeaturePageRequest) -> Result<FeaturePage> {
        self.record(BackendCall::Features(request.clone()));
        let next = self.features.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Err(exhausted("features")))
    }

    async fn spatial_query(&self, request: &SpatialQueryRequest) -> Result<SpatialQueryResponse> {
        self.record(BackendCall::Spatial(request.clone()));
        let next = self.spatial.lock().unwrap().pop_front();
        match next {
            Some((delay, response)) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                response
            }
            None => Err(exhausted("spatial")),
        }
    }

    async fn spatial_query_paginated(
        &self,
        request: &PagedSpatialQueryRequest,
    ) -> Result<Vec<LayerQueryResult>> {
        self.record(BackendCall::Paginated(request.clone()));
        let next = self.paginated.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Err(exhausted("paginated")))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    Overlay { layer: LayerId, source: WmsSource },
    Fit { extent: BoundingBox, options: FitOptions },
    ClearDrawing,
    Highlight(Vec<Geometry>),
}

/// Map surface that records every call
#[derive(Default)]
pub struct RecordingMap {
    events: Mutex<Vec<MapEvent>>,
    pub fail_overlay: bool,
}

impl RecordingMap {
    pub fn failing_overlay() -> Self {
        Self { fail_overlay: true, ..Self::default() }
    }

    pub fn events(&self) -> Vec<MapEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn overlays(&self) -> Vec<WmsSource> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                MapEvent::Overlay { source, .. } => Some(source),
                _ => None,
            })
            .collect()
    }

    pub fn last_highlight(&self) -> Option<Vec<Geometry>> {
        self.events().into_iter().rev().find_map(|e| match e {
            MapEvent::Highlight(geometries) => Some(geometries),
            _ => None,
        })
    }

    pub fn count(&self, wanted: fn(&MapEvent) -> bool) -> usize {
        self.events().iter().filter(|e| wanted(e)).count()
    }
}

impl MapSurface for RecordingMap {
    fn apply_overlay(&self, layer: &LayerId, source: &WmsSource) -> Result<()> {
        self.events
            .lock()
            .unwrap()
            .push(MapEvent::Overlay { layer: layer.clone(), source: source.clone() });
        if self.fail_overlay {
            return Err(MapQueryError::OverlayRefresh { reason: "tile server down".to_string() });
        }
        Ok(())
    }

    fn fit_extent(&self, extent: BoundingBox, options: FitOptions) {
        self.events.lock().unwrap().push(MapEvent::Fit { extent, options });
    }

    fn clear_drawing(&self) {
        self.events.lock().unwrap().push(MapEvent::ClearDrawing);
    }

    fn show_highlight(&self, geometries: &[Geometry]) {
        self.events.lock().unwrap().push(MapEvent::Highlight(geometries.to_vec()));
    }
}

/// Configuration with geographic view coordinates so rings read as degrees
pub fn geographic_config() -> ClientConfig {
    ClientConfig { view_crs: Crs::wgs84(), ..ClientConfig::default() }
}

pub fn layers() -> Vec<LayerDescriptor> {
    vec![
        LayerDescriptor::new("topp:parcels", "Parcels"),
        LayerDescriptor::new("topp:roads", "Roads"),
    ]
}

/// Square query polygon around Denver
pub fn drawn_square() -> Geometry {
    Geometry::polygon(vec![vec![
        [-105.0, 39.5],
        [-104.5, 39.5],
        [-104.5, 40.0],
        [-105.0, 40.0],
        [-105.0, 39.5],
    ]])
}

pub fn feature(id: i64) -> Feature {
    let x = -105.0 + id as f64 * 0.001;
    let mut properties = BTreeMap::new();
    properties.insert("name".to_string(), serde_json::json!(format!("parcel {}", id)));
    Feature::new(
        Some(FeatureId::Number(id)),
        Some(Geometry::polygon(vec![vec![
            [x, 39.6],
            [x + 0.0005, 39.6],
            [x + 0.0005, 39.7],
            [x, 39.6],
        ]])),
        properties,
    )
}

pub fn features(ids: std::ops::Range<i64>) -> Vec<Feature> {
    ids.map(feature).collect()
}

pub fn layer_result(layer: &str, name: &str, features: Vec<Feature>, count: u64) -> LayerQueryResult {
    LayerQueryResult::success(layer.into(), name, features, count)
}

pub fn response(results: Vec<LayerQueryResult>) -> SpatialQueryResponse {
    SpatialQueryResponse { success: true, results }
}
