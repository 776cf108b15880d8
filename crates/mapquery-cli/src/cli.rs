use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// mapquery - Spatial queries against a WMS-backed feature service
#[derive(Parser, Debug)]
#[command(name = "mapquery")]
#[command(about = "Draw-and-query spatial search over WMS feature layers", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Configuration file (TOML)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Feature backend base URL
    #[arg(long, global = true, value_name = "URL")]
    pub backend_url: Option<String>,

    /// WMS endpoint for overlay images
    #[arg(long, global = true, value_name = "URL")]
    pub wms_url: Option<String>,

    /// Features per result page
    #[arg(long, global = true)]
    pub page_size: Option<u32>,

    /// Request timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the layers the backend can query
    Layers,

    /// Run a spatial query with a polygon
    Query(QueryArgs),

    /// Browse one layer's features page by page
    Features(FeaturesArgs),

    /// Print WMS request URLs for a filtered overlay
    WmsUrl(WmsUrlArgs),

    /// Show the resolved configuration and where each value came from
    Config,
}

#[derive(Parser, Debug)]
pub struct QueryArgs {
    /// Polygon ring in view coordinates, e.g. "-105 39.5, -104.5 39.5, -104.5 40"
    #[arg(long, conflicts_with = "wkt", required_unless_present = "wkt", allow_hyphen_values = true)]
    pub ring: Option<String>,

    /// Polygon as WKT in data coordinates
    #[arg(long)]
    pub wkt: Option<String>,

    /// Result tab to show (defaults to the first layer that answered)
    #[arg(long)]
    pub layer: Option<String>,

    /// Page of the shown tab to fetch
    #[arg(long, default_value = "1")]
    pub page: u32,

    /// Write the shown page as a GeoJSON FeatureCollection
    #[arg(long, value_name = "FILE")]
    pub geojson: Option<PathBuf>,

    /// Feature ids to select after the page is shown
    #[arg(long, value_delimiter = ',')]
    pub select: Vec<String>,
}

#[derive(Parser, Debug)]
pub struct FeaturesArgs {
    /// Layer identifier, e.g. "topp:parcels"
    #[arg(long)]
    pub layer: String,

    /// Page to fetch
    #[arg(long, default_value = "1")]
    pub page: u32,

    /// Write the page as a GeoJSON FeatureCollection
    #[arg(long, value_name = "FILE")]
    pub geojson: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct WmsUrlArgs {
    /// Layer identifier
    #[arg(long)]
    pub layer: String,

    /// Filter polygon as WKT in data coordinates; unfiltered when omitted
    #[arg(long)]
    pub wkt: Option<String>,

    /// Map extent "minx,miny,maxx,maxy" in EPSG:3857 (defaults to the polygon's padded extent)
    #[arg(long, allow_hyphen_values = true)]
    pub bbox: Option<String>,

    /// Image width in pixels
    #[arg(long, default_value = "768")]
    pub width: u32,

    /// Image height in pixels
    #[arg(long, default_value = "512")]
    pub height: u32,

    /// Also print a GetFeatureInfo URL for a click at "x,y" (EPSG:3857)
    #[arg(long, requires = "resolution", allow_hyphen_values = true)]
    pub click: Option<String>,

    /// View resolution in map units per pixel, for --click
    #[arg(long)]
    pub resolution: Option<f64>,
}
