use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::Result;
use crate::models::{BoundingBox, Geometry, LayerId};

/// Padding around a fitted extent, in pixels (top, right, bottom, left)
pub const FIT_PADDING: [u32; 4] = [20, 20, 20, 20];

/// Duration of the animated fit
pub const FIT_DURATION: Duration = Duration::from_millis(1000);

/// How the view moves to a new extent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FitOptions {
    pub padding: [u32; 4],
    pub duration: Duration,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self { padding: FIT_PADDING, duration: FIT_DURATION }
    }
}

/// Image source for a WMS overlay layer: endpoint plus request parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WmsSource {
    pub url: String,
    pub params: BTreeMap<String, String>,
}

impl WmsSource {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

/// Port for the rendering engine.
///
/// Implementations own tiles, vector overlays and drawing interactions; the
/// orchestrator only tells them what to show. All coordinates are in the view
/// CRS.
pub trait MapSurface: Send + Sync {
    /// Replace the overlay source displayed for `layer`
    fn apply_overlay(&self, layer: &LayerId, source: &WmsSource) -> Result<()>;

    /// Move the view so `extent` is visible
    fn fit_extent(&self, extent: BoundingBox, options: FitOptions);

    /// Remove the drawn query polygon
    fn clear_drawing(&self);

    /// Replace the highlight overlay; an empty slice clears it
    fn show_highlight(&self, geometries: &[Geometry]);
}
