//! Spatial query orchestration
//!
//! Owns the query session: the drawn polygon, the stored results, the page
//! on display, the selection and the overlay filter. Every backend response is
//! applied inside one critical section, and only if no newer request has been
//! issued in the meantime.

use std::sync::{Mutex, PoisonError};

use mapquery_core::config::ClientConfig;
use mapquery_core::error::{MapQueryError, Result};
use mapquery_core::models::{
    layer_display_name, page_numbers, Feature, FeatureId, Geometry, LayerDescriptor, LayerId,
    LayerQueryResult, PageItem, PaginationDescriptor, QueryOutcome,
};
use mapquery_core::ports::{
    FeatureBackend, FitOptions, MapSurface, PagedSpatialQueryRequest, SpatialQueryRequest,
};
use mapquery_geo::{extent_of, geometry_extent, polygon_to_query_wkt};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::pagination::{PageFetch, PaginationController};
use crate::selection::SelectionSet;
use crate::store::QueryResultStore;
use crate::wms::{overlay_source, OverlayState};

/// Where the session is in the draw/query/display cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum QueryPhase {
    Idle,
    Drawing,
    Querying,
    Displaying { page: u32 },
}

/// One result tab
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultTab {
    pub layer_id: LayerId,
    pub layer_name: String,
    pub success: bool,
    pub count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Read-only view of the session for presentation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub phase: QueryPhase,
    pub outcome: Option<QueryOutcome>,
    pub layers: Vec<LayerDescriptor>,
    pub selected_layer: Option<LayerId>,
    pub tabs: Vec<ResultTab>,
    pub active_tab: Option<LayerId>,
    pub features: Vec<Feature>,
    pub pagination: PaginationDescriptor,
    pub pages: Vec<PageItem>,
    pub selection: Vec<FeatureId>,
    pub loading_page: bool,
    pub overlay_filtered: bool,
}

impl SessionSnapshot {
    pub fn can_go_previous(&self) -> bool {
        !self.loading_page && self.pagination.can_go_previous()
    }

    pub fn can_go_next(&self) -> bool {
        !self.loading_page && self.pagination.can_go_next()
    }
}

struct Session {
    phase: QueryPhase,
    layers: Vec<LayerDescriptor>,
    selected_layer: Option<LayerId>,
    active_tab: Option<LayerId>,
    drawing: Option<Geometry>,
    store: QueryResultStore,
    displayed: Vec<Feature>,
    pagination: PaginationDescriptor,
    /// Query polygon kept for fetching later pages spatially
    query_wkt: Option<String>,
    /// Layers the kept polygon was queried against
    query_layers: Vec<LayerId>,
    overlay: OverlayState,
    selection: SelectionSet,
    outcome: Option<QueryOutcome>,
    latest_seq: u64,
    loading_page: bool,
}

impl Session {
    fn new(page_size: u32) -> Self {
        Self {
            phase: QueryPhase::Idle,
            layers: Vec::new(),
            selected_layer: None,
            active_tab: None,
            drawing: None,
            store: QueryResultStore::new(),
            displayed: Vec::new(),
            pagination: PaginationDescriptor::empty(page_size),
            query_wkt: None,
            query_layers: Vec::new(),
            overlay: OverlayState::Unfiltered,
            selection: SelectionSet::new(),
            outcome: None,
            latest_seq: 0,
            loading_page: false,
        }
    }

    fn next_seq(&mut self) -> u64 {
        self.latest_seq += 1;
        self.latest_seq
    }

    fn is_stale(&self, seq: u64) -> bool {
        seq != self.latest_seq
    }

    fn forget_query(&mut self) {
        self.query_wkt = None;
        self.query_layers.clear();
    }

    fn display_name(&self, layer: &LayerId) -> String {
        layer_display_name(&self.layers, layer)
    }

    /// Layer addressed by page navigation
    fn paging_layer(&self) -> Option<LayerId> {
        self.active_tab.clone().or_else(|| self.selected_layer.clone())
    }

    fn show(&mut self, layer: Option<LayerId>, features: Vec<Feature>, pagination: PaginationDescriptor) {
        self.active_tab = layer;
        self.displayed = features;
        self.pagination = pagination;
        self.phase = QueryPhase::Displaying { page: pagination.page };
    }
}

/// What to do once the initial spatial query has answered
enum Followup {
    Done(QueryOutcome),
    FetchFirstPage { active: LayerQueryResult, ordered: Vec<LayerQueryResult> },
}

/// Coordinates drawing, querying, paging and selection for one map view
pub struct SpatialQueryOrchestrator<B, M>
where
    B: FeatureBackend,
    M: MapSurface,
{
    backend: B,
    map: M,
    config: ClientConfig,
    pagination: PaginationController,
    session: Mutex<Session>,
}

impl<B, M> SpatialQueryOrchestrator<B, M>
where
    B: FeatureBackend,
    M: MapSurface,
{
    pub fn new(backend: B, map: M, config: ClientConfig) -> Self {
        let pagination = PaginationController::new(config.default_page_size);
        Self {
            session: Mutex::new(Session::new(pagination.page_size())),
            backend,
            map,
            config,
            pagination,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn with_session<R>(&self, f: impl FnOnce(&mut Session) -> R) -> R {
        let mut session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut session)
    }

    fn apply_overlay(&self, layer: &LayerId, state: &OverlayState) {
        let source = overlay_source(&self.config.wms_base_url, layer, state);
        if let Err(e) = self.map.apply_overlay(layer, &source) {
            warn!(layer = %layer, error = %e, "Overlay refresh failed");
        }
    }

    fn refresh_highlight(&self) {
        let geometries = self.with_session(|s| {
            s.selection.highlight_geometries(&s.displayed, &self.config.data_crs, &self.config.view_crs)
        });
        self.map.show_highlight(&geometries);
    }

    /// Fetch the layer list; the first layer becomes the selected one if
    /// none is selected yet
    pub async fn load_layers(&self) -> Result<Vec<LayerDescriptor>> {
        let layers = self.backend.list_layers().await.map_err(|e| {
            error!(error = %e, "Failed to load layers");
            e
        })?;

        let newly_selected = self.with_session(|s| {
            s.layers = layers.clone();
            if s.selected_layer.is_none() {
                s.selected_layer = layers.first().map(|layer| layer.id.clone());
                s.selected_layer.clone().map(|layer| (layer, s.overlay.clone()))
            } else {
                None
            }
        });
        if let Some((layer, state)) = newly_selected {
            self.apply_overlay(&layer, &state);
        }

        info!(count = layers.len(), "Loaded layers");
        Ok(layers)
    }

    /// Show `layer` on the map, keeping the current spatial filter
    pub fn select_layer(&self, layer: LayerId) {
        let state = self.with_session(|s| {
            s.selected_layer = Some(layer.clone());
            s.overlay.clone()
        });
        self.apply_overlay(&layer, &state);
    }

    /// Switch the displayed result tab; returns false for unknown layers.
    ///
    /// A tab whose result is larger than one page and was never paged is
    /// loaded through the paginated spatial endpoint, so it shows page 1
    /// with the server's total rather than the initial truncated list.
    pub async fn set_active_tab(&self, layer: &LayerId) -> bool {
        let fetch_first_page = self.with_session(|s| {
            let entry = s.store.get(layer).cloned()?;
            s.selection.clear();
            let unpaged = entry.pagination.is_none()
                && entry.count > u64::from(self.pagination.page_size())
                && s.query_wkt.is_some();
            if unpaged {
                return Some(true);
            }
            let pagination = self.pagination.descriptor_for(Some(&entry));
            s.show(Some(layer.clone()), entry.features, pagination);
            Some(false)
        });
        match fetch_first_page {
            None => false,
            Some(true) => {
                self.map.show_highlight(&[]);
                self.change_page(layer, 1).await
            }
            Some(false) => {
                self.map.show_highlight(&[]);
                true
            }
        }
    }

    /// Enter drawing mode, discarding the previous outcome
    pub fn start_drawing(&self) {
        self.with_session(|s| {
            s.phase = QueryPhase::Drawing;
            s.drawing = None;
            s.outcome = None;
        });
    }

    /// Leave drawing mode without completing a polygon
    pub fn stop_drawing(&self) {
        self.with_session(|s| {
            if s.phase == QueryPhase::Drawing {
                s.phase = if s.store.is_empty() {
                    QueryPhase::Idle
                } else {
                    QueryPhase::Displaying { page: s.pagination.page }
                };
            }
        });
    }

    /// Reset the session to its initial state. Calling it twice in a row
    /// has the same effect as calling it once.
    pub fn clear_drawing(&self) {
        let unfilter = self.with_session(|s| {
            s.next_seq();
            let was_filtered = s.overlay.is_filtered();
            s.overlay = OverlayState::Unfiltered;
            s.store.clear();
            s.drawing = None;
            s.forget_query();
            s.selection.clear();
            s.outcome = None;
            s.loading_page = false;
            s.show(None, Vec::new(), PaginationDescriptor::empty(self.pagination.page_size()));
            s.phase = QueryPhase::Idle;
            if was_filtered {
                s.selected_layer.clone()
            } else {
                None
            }
        });

        self.map.clear_drawing();
        self.map.show_highlight(&[]);
        if let Some(layer) = unfilter {
            self.apply_overlay(&layer, &OverlayState::Unfiltered);
        }
    }

    /// Run the spatial query for a completed drawing.
    ///
    /// Returns the outcome recorded in the session, or `None` when a newer
    /// request superseded this one before it finished.
    pub async fn complete_drawing(&self, drawing: Option<Geometry>) -> Option<QueryOutcome> {
        let prepared = self.with_session(|s| {
            let seq = s.next_seq();
            s.drawing = drawing.clone();
            s.loading_page = false;

            let wkt = match &drawing {
                None => Err(MapQueryError::NoGeometry),
                Some(geometry) => {
                    polygon_to_query_wkt(geometry, &self.config.view_crs, &self.config.data_crs)
                        .map_err(|e| match e {
                            MapQueryError::InvalidGeometryKind { .. } => MapQueryError::NoGeometry,
                            other => other,
                        })
                }
            };

            let targets: Vec<LayerId> = if s.layers.is_empty() {
                s.selected_layer.iter().cloned().collect()
            } else {
                s.layers.iter().map(|layer| layer.id.clone()).collect()
            };

            match wkt {
                Ok(_) if targets.is_empty() => {
                    Err(QueryOutcome::error("No layers available to query"))
                }
                Ok(wkt) => {
                    s.phase = QueryPhase::Querying;
                    s.overlay = OverlayState::Filtered { wkt: wkt.clone() };
                    let overlay_layer = s.selected_layer.clone().or_else(|| targets.first().cloned());
                    Ok((seq, wkt, targets, overlay_layer))
                }
                Err(e) => Err(QueryOutcome::error(e.to_string())),
            }
        });

        let (seq, wkt, targets, overlay_layer) = match prepared {
            Ok(prepared) => prepared,
            Err(outcome) => {
                debug!(message = %outcome.message, "Query rejected before sending");
                return Some(self.with_session(|s| {
                    s.phase = QueryPhase::Idle;
                    s.outcome = Some(outcome.clone());
                    outcome
                }));
            }
        };

        if let Some(layer) = &overlay_layer {
            self.apply_overlay(layer, &OverlayState::Filtered { wkt: wkt.clone() });
        }
        if let Some(extent) = drawing.as_ref().and_then(geometry_extent) {
            self.map.fit_extent(extent, FitOptions::default());
        }

        debug!(seq, layers = targets.len(), "Issuing spatial query");
        let request = SpatialQueryRequest { geometry: wkt.clone(), layers: targets.clone() };
        let response = self.backend.spatial_query(&request).await;

        let followup = self.with_session(|s| {
            if s.is_stale(seq) {
                return None;
            }
            let response = match response {
                Ok(response) if response.success => response,
                Ok(_) => return Some(Followup::Done(self.fail_query(s, "Unknown error".to_string()))),
                Err(e) => return Some(Followup::Done(self.fail_query(s, e.user_message()))),
            };

            let ordered = order_results(s, &targets, response.results);
            let active = ordered.iter().find(|r| r.success).cloned();
            let outcome = match active {
                Some(active) if active.has_features() => {
                    let page_size = self.pagination.page_size();
                    if active.count > u64::from(page_size) {
                        return Some(Followup::FetchFirstPage { active, ordered });
                    }
                    let pagination = PaginationDescriptor::new(1, page_size, active.count);
                    let outcome = found_outcome(&active);
                    // Keep the polygon while another tab still needs server paging
                    if ordered.iter().any(|r| r.success && r.count > u64::from(page_size)) {
                        s.query_wkt = Some(wkt.clone());
                        s.query_layers = targets.clone();
                    } else {
                        s.forget_query();
                    }
                    s.store.replace_all(ordered.into_iter().map(|r| {
                        if r.layer_id == active.layer_id {
                            r.with_pagination(pagination)
                        } else {
                            r
                        }
                    }));
                    s.show(Some(active.layer_id), active.features, pagination);
                    outcome
                }
                _ => {
                    s.store.replace_all(ordered);
                    s.forget_query();
                    s.show(None, Vec::new(), PaginationDescriptor::empty(self.pagination.page_size()));
                    QueryOutcome::info("No features found in the selected area")
                }
            };
            Some(Followup::Done(self.finish_query(s, outcome)))
        });

        let outcome = match followup {
            None => {
                debug!(seq, "Discarding stale spatial query response");
                return None;
            }
            Some(Followup::Done(outcome)) => outcome,
            Some(Followup::FetchFirstPage { active, ordered }) => {
                self.fetch_first_page(seq, wkt, targets, active, ordered).await?
            }
        };

        if !outcome.is_error() {
            self.map.clear_drawing();
            self.map.show_highlight(&[]);
        }
        Some(outcome)
    }

    /// Large result: show page 1 from the paginated endpoint instead of the
    /// initial, possibly truncated, feature list
    async fn fetch_first_page(
        &self,
        seq: u64,
        wkt: String,
        targets: Vec<LayerId>,
        active: LayerQueryResult,
        ordered: Vec<LayerQueryResult>,
    ) -> Option<QueryOutcome> {
        let request = PagedSpatialQueryRequest {
            geometry: wkt.clone(),
            layers: targets.clone(),
            page: 1,
            page_size: self.pagination.page_size(),
        };
        debug!(seq, layer = %active.layer_id, count = active.count, "Fetching first page");
        let response = self.backend.spatial_query_paginated(&request).await;

        let outcome = self.with_session(|s| {
            if s.is_stale(seq) {
                return None;
            }
            let results = match response {
                Ok(results) => results,
                Err(e) => return Some(self.fail_query(s, e.user_message())),
            };

            let mut first_page = self
                .pagination
                .merge_spatial(&active.layer_id, 1, results)
                .unwrap_or_else(|| {
                    warn!(layer = %active.layer_id, "Paginated response lacks the layer, using initial features");
                    let pagination = PaginationDescriptor::new(1, self.pagination.page_size(), active.count);
                    active.clone().with_pagination(pagination)
                });
            first_page.layer_name = active.layer_name.clone();
            let pagination = self.pagination.descriptor_for(Some(&first_page));

            s.store.replace_all(ordered.into_iter().map(|r| {
                if r.layer_id == active.layer_id {
                    first_page.clone()
                } else {
                    r
                }
            }));
            s.query_wkt = Some(wkt);
            s.query_layers = targets;
            s.show(Some(active.layer_id.clone()), first_page.features, pagination);
            Some(self.finish_query(s, found_outcome(&active)))
        });

        if outcome.is_none() {
            debug!(seq, "Discarding stale first page response");
        }
        outcome
    }

    fn fail_query(&self, s: &mut Session, message: String) -> QueryOutcome {
        error!(message = %message, "Spatial query failed");
        let outcome = QueryOutcome::error(format!("Spatial query failed: {}", message));
        s.phase = QueryPhase::Idle;
        s.outcome = Some(outcome.clone());
        outcome
    }

    fn finish_query(&self, s: &mut Session, outcome: QueryOutcome) -> QueryOutcome {
        info!(
            tabs = s.store.len(),
            displayed = s.displayed.len(),
            total = s.pagination.total_features,
            "Spatial query completed"
        );
        s.drawing = None;
        s.selection.clear();
        s.outcome = Some(outcome.clone());
        outcome
    }

    /// Show `page` of `layer`. Out-of-range pages are ignored.
    ///
    /// Returns whether the page is now displayed; a failed fetch keeps the
    /// current page and records an error outcome.
    pub async fn change_page(&self, layer: &LayerId, page: u32) -> bool {
        let planned = self.with_session(|s| {
            let entry = s.store.get(layer).cloned();
            let fetch = self.pagination.plan(
                layer,
                entry.as_ref(),
                s.query_wkt.as_deref(),
                &s.query_layers,
                page,
            )?;
            let seq = s.next_seq();
            let previous_phase = s.phase;
            s.phase = QueryPhase::Querying;
            s.loading_page = true;
            let layer_name = entry
                .as_ref()
                .map(|e| e.layer_name.clone())
                .unwrap_or_else(|| s.display_name(layer));
            Some((seq, fetch, entry, layer_name, previous_phase))
        });

        let Some((seq, fetch, entry, layer_name, previous_phase)) = planned else {
            debug!(layer = %layer, page, "Ignoring page change outside the result range");
            return false;
        };

        debug!(seq, layer = %layer, page, "Fetching page");
        let result = match fetch {
            PageFetch::Spatial(request) => self
                .backend
                .spatial_query_paginated(&request)
                .await
                .and_then(|results| {
                    self.pagination.merge_spatial(layer, page, results).ok_or_else(|| {
                        MapQueryError::Decode {
                            reason: format!("response has no results for layer {}", layer),
                        }
                    })
                })
                .map(|mut result| {
                    result.layer_name = layer_name.clone();
                    result
                }),
            PageFetch::Plain(request) => self.backend.fetch_features(&request).await.map(|response| {
                self.pagination.merge_plain(layer, &layer_name, entry.as_ref(), page, response)
            }),
        };

        let shown = self.with_session(|s| {
            if s.is_stale(seq) {
                debug!(seq, layer = %layer, page, "Discarding stale page response");
                return false;
            }
            s.loading_page = false;
            match result {
                Ok(result) => {
                    let pagination = self.pagination.descriptor_for(Some(&result));
                    s.store.upsert(layer, result.clone());
                    if s.active_tab.as_ref() != Some(layer) {
                        s.selection.clear();
                    }
                    s.show(Some(layer.clone()), result.features, pagination);
                    true
                }
                Err(e) => {
                    error!(layer = %layer, page, error = %e, "Page fetch failed");
                    s.outcome = Some(QueryOutcome::error(format!(
                        "Failed to load page {}: {}",
                        page,
                        e.user_message()
                    )));
                    s.phase = match previous_phase {
                        QueryPhase::Querying => QueryPhase::Displaying { page: s.pagination.page },
                        other => other,
                    };
                    false
                }
            }
        });

        if shown {
            self.refresh_highlight();
        }
        shown
    }

    pub async fn next_page(&self) -> bool {
        let target = self.with_session(|s| {
            if s.loading_page || !s.pagination.can_go_next() {
                return None;
            }
            s.paging_layer().map(|layer| (layer, s.pagination.page + 1))
        });
        match target {
            Some((layer, page)) => self.change_page(&layer, page).await,
            None => false,
        }
    }

    pub async fn previous_page(&self) -> bool {
        let target = self.with_session(|s| {
            if s.loading_page || !s.pagination.can_go_previous() {
                return None;
            }
            s.paging_layer().map(|layer| (layer, s.pagination.page - 1))
        });
        match target {
            Some((layer, page)) => self.change_page(&layer, page).await,
            None => false,
        }
    }

    /// Toggle one feature in the selection
    pub fn select_one(&self, id: FeatureId, selected: bool) {
        self.with_session(|s| s.selection.select_one(id, selected));
        self.refresh_highlight();
    }

    /// Replace the selection; `selected = false` clears it
    pub fn select_many(&self, ids: impl IntoIterator<Item = FeatureId>, selected: bool) {
        self.with_session(|s| s.selection.select_many(ids, selected));
        self.refresh_highlight();
    }

    /// Fit the view to the selected features; false when nothing could be fitted
    pub fn zoom_to_selected(&self) -> bool {
        let selected: Vec<Feature> = self.with_session(|s| {
            s.selection.resolve(&s.displayed).into_iter().cloned().collect()
        });
        if selected.is_empty() {
            return false;
        }

        match extent_of(&selected, &self.config.data_crs, &self.config.view_crs) {
            Ok(Some(extent)) => {
                self.map.fit_extent(extent, FitOptions::default());
                true
            }
            Ok(None) => false,
            Err(e) => {
                warn!(error = %e, "Cannot compute extent of selection");
                false
            }
        }
    }

    /// Drawn polygon of the current or last attempt
    pub fn drawing(&self) -> Option<Geometry> {
        self.with_session(|s| s.drawing.clone())
    }

    /// Query polygon kept for spatial paging
    pub fn query_wkt(&self) -> Option<String> {
        self.with_session(|s| s.query_wkt.clone())
    }

    pub fn overlay_state(&self) -> OverlayState {
        self.with_session(|s| s.overlay.clone())
    }

    pub fn stored_result(&self, layer: &LayerId) -> Option<LayerQueryResult> {
        self.with_session(|s| s.store.get(layer).cloned())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.with_session(|s| SessionSnapshot {
            phase: s.phase,
            outcome: s.outcome.clone(),
            layers: s.layers.clone(),
            selected_layer: s.selected_layer.clone(),
            tabs: s
                .store
                .iter()
                .map(|r| ResultTab {
                    layer_id: r.layer_id.clone(),
                    layer_name: r.layer_name.clone(),
                    success: r.success,
                    count: r.count,
                    error: r.error.clone(),
                })
                .collect(),
            active_tab: s.active_tab.clone(),
            features: s.displayed.clone(),
            pagination: s.pagination,
            pages: page_numbers(s.pagination.page, s.pagination.total_pages),
            selection: s.selection.ids(),
            loading_page: s.loading_page,
            overlay_filtered: s.overlay.is_filtered(),
        })
    }
}

/// Backend results in target-layer order, named from the layer list
fn order_results(
    s: &Session,
    targets: &[LayerId],
    mut results: Vec<LayerQueryResult>,
) -> Vec<LayerQueryResult> {
    let mut ordered = Vec::with_capacity(results.len());
    for target in targets {
        if let Some(index) = results.iter().position(|r| &r.layer_id == target) {
            ordered.push(results.remove(index));
        }
    }
    ordered.extend(results);

    for result in &mut ordered {
        if result.layer_name.is_empty() || result.layer_name == result.layer_id.as_str() {
            result.layer_name = s.display_name(&result.layer_id);
        }
    }
    ordered
}

fn found_outcome(active: &LayerQueryResult) -> QueryOutcome {
    QueryOutcome::success(format!("Found {} features in {}", active.count, active.layer_name))
}
