//! Map surface for a terminal session: nothing is rendered, every call is
//! logged and the last overlay and viewport are kept for reporting

use std::sync::{Mutex, PoisonError};

use mapquery_core::models::{BoundingBox, Geometry, LayerId};
use mapquery_core::ports::{FitOptions, MapSurface, WmsSource};
use mapquery_core::Result;
use tracing::{debug, info};

#[derive(Debug, Default)]
struct ViewState {
    overlay: Option<(LayerId, WmsSource)>,
    extent: Option<BoundingBox>,
    highlighted: usize,
}

#[derive(Debug, Default)]
pub struct TerminalMap {
    state: Mutex<ViewState>,
}

impl TerminalMap {
    fn with_state<R>(&self, f: impl FnOnce(&mut ViewState) -> R) -> R {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    /// Overlay currently shown, if any
    pub fn overlay(&self) -> Option<(LayerId, WmsSource)> {
        self.with_state(|s| s.overlay.clone())
    }

    /// Extent of the last fit, in view coordinates
    pub fn extent(&self) -> Option<BoundingBox> {
        self.with_state(|s| s.extent)
    }

    pub fn highlighted(&self) -> usize {
        self.with_state(|s| s.highlighted)
    }
}

impl MapSurface for TerminalMap {
    fn apply_overlay(&self, layer: &LayerId, source: &WmsSource) -> Result<()> {
        debug!(layer = %layer, filtered = source.param("CQL_FILTER").is_some(), "Overlay source updated");
        self.with_state(|s| s.overlay = Some((layer.clone(), source.clone())));
        Ok(())
    }

    fn fit_extent(&self, extent: BoundingBox, options: FitOptions) {
        info!(
            min_x = extent.min_x,
            min_y = extent.min_y,
            max_x = extent.max_x,
            max_y = extent.max_y,
            duration_ms = options.duration.as_millis() as u64,
            "Fit view"
        );
        self.with_state(|s| s.extent = Some(extent));
    }

    fn clear_drawing(&self) {
        debug!("Drawing cleared");
    }

    fn show_highlight(&self, geometries: &[Geometry]) {
        debug!(count = geometries.len(), "Highlight updated");
        self.with_state(|s| s.highlighted = geometries.len());
    }
}
