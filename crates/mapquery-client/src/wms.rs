//! WMS overlay sources and request URLs

use std::collections::BTreeMap;

use mapquery_core::error::{MapQueryError, Result};
use mapquery_core::models::{BoundingBox, Coordinate, LayerId};
use mapquery_core::ports::WmsSource;
use reqwest::Url;

/// WMS protocol version requested from the server
pub const WMS_VERSION: &str = "1.1.0";

/// Projection of overlay images, always the view CRS
pub const WMS_SRS: &str = "EPSG:3857";

/// Geometry column the CQL filter tests against
pub const GEOMETRY_COLUMN: &str = "the_geom";

/// Pixel size of the window sent with GetFeatureInfo requests
pub const FEATURE_INFO_WINDOW: u32 = 101;

/// Filter applied to the overlay image
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OverlayState {
    #[default]
    Unfiltered,
    Filtered { wkt: String },
}

impl OverlayState {
    pub fn is_filtered(&self) -> bool {
        matches!(self, OverlayState::Filtered { .. })
    }

    /// CQL filter expression, if any
    pub fn cql_filter(&self) -> Option<String> {
        match self {
            OverlayState::Unfiltered => None,
            OverlayState::Filtered { wkt } => Some(cql_intersects_filter(wkt)),
        }
    }
}

/// `INTERSECTS(the_geom, <WKT>)`
pub fn cql_intersects_filter(wkt: &str) -> String {
    format!("INTERSECTS({}, {})", GEOMETRY_COLUMN, wkt)
}

/// Overlay image source for `layer` in the given filter state
pub fn overlay_source(base_url: &str, layer: &LayerId, state: &OverlayState) -> WmsSource {
    let mut params = BTreeMap::new();
    params.insert("LAYERS".to_string(), layer.to_string());
    params.insert("VERSION".to_string(), WMS_VERSION.to_string());
    params.insert("FORMAT".to_string(), "image/png".to_string());
    params.insert("TRANSPARENT".to_string(), "true".to_string());
    params.insert("SRS".to_string(), WMS_SRS.to_string());
    params.insert("STYLES".to_string(), String::new());
    if let Some(filter) = state.cql_filter() {
        params.insert("CQL_FILTER".to_string(), filter);
    }
    WmsSource { url: base_url.to_string(), params }
}

fn request_url(source: &WmsSource, extra: &[(&str, String)]) -> Result<String> {
    let mut pairs: Vec<(&str, &str)> = vec![("SERVICE", "WMS")];
    pairs.extend(source.params.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    pairs.extend(extra.iter().map(|(k, v)| (*k, v.as_str())));

    Url::parse_with_params(&source.url, pairs)
        .map(String::from)
        .map_err(|e| MapQueryError::ConfigInvalid {
            key: "wms_url".to_string(),
            reason: format!("'{}' is not a valid URL: {}", source.url, e),
        })
}

/// GetMap request for an image of `width` x `height` pixels covering `bbox`
pub fn get_map_url(source: &WmsSource, bbox: &BoundingBox, width: u32, height: u32) -> Result<String> {
    request_url(
        source,
        &[
            ("REQUEST", "GetMap".to_string()),
            ("BBOX", bbox.to_bbox_param()),
            ("WIDTH", width.to_string()),
            ("HEIGHT", height.to_string()),
        ],
    )
}

/// GetFeatureInfo request for a click at `coordinate` (view CRS) with the
/// view at `resolution` map units per pixel.
///
/// The request covers a small window centred on the click, and the pixel
/// offset is computed inside that window.
pub fn get_feature_info_url(
    source: &WmsSource,
    coordinate: Coordinate,
    resolution: f64,
) -> Result<String> {
    if !(resolution.is_finite() && resolution > 0.0) {
        return Err(MapQueryError::ConfigInvalid {
            key: "resolution".to_string(),
            reason: format!("must be positive, got {}", resolution),
        });
    }

    let half = resolution * f64::from(FEATURE_INFO_WINDOW) / 2.0;
    let window = BoundingBox::new(
        coordinate[0] - half,
        coordinate[1] - half,
        coordinate[0] + half,
        coordinate[1] + half,
    );
    let x = ((coordinate[0] - window.min_x) / resolution).floor() as u32;
    let y = ((window.max_y - coordinate[1]) / resolution).floor() as u32;
    let layers = source.param("LAYERS").unwrap_or_default().to_string();

    request_url(
        source,
        &[
            ("REQUEST", "GetFeatureInfo".to_string()),
            ("QUERY_LAYERS", layers),
            ("BBOX", window.to_bbox_param()),
            ("WIDTH", FEATURE_INFO_WINDOW.to_string()),
            ("HEIGHT", FEATURE_INFO_WINDOW.to_string()),
            ("X", x.to_string()),
            ("Y", y.to_string()),
            ("INFO_FORMAT", "text/html".to_string()),
            ("FEATURE_COUNT", "1".to_string()),
        ],
    )
}
