use crate::error::{MapQueryError, Result};
use crate::models::{Crs, DEFAULT_PAGE_SIZE};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

const DEFAULT_BACKEND_URL: &str = "http://localhost:5000";
const DEFAULT_WMS_URL: &str = "http://localhost:8080/geoserver/wms";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Resolved settings handed to the orchestrator and the HTTP backend
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base URL of the feature backend (`/api/...` is appended)
    pub backend_base_url: String,

    /// WMS endpoint used for overlay images
    pub wms_base_url: String,

    pub default_page_size: u32,

    pub request_timeout: Duration,

    /// Working projection of the map view and of drawn geometries
    pub view_crs: Crs,

    /// CRS of feature geometries returned by the backend
    pub data_crs: Crs,
}

impl Default for ClientConfig {
    fn default() -> Self {
        LayeredConfig::with_defaults().resolve()
    }
}

/// Layered configuration for mapquery
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub backend_url: ConfigValue<String>,
    pub wms_url: ConfigValue<String>,
    pub page_size: ConfigValue<u32>,
    pub timeout_secs: ConfigValue<u64>,
    pub view_crs: ConfigValue<u32>,
    pub data_crs: ConfigValue<u32>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        Self {
            backend_url: ConfigValue::new(DEFAULT_BACKEND_URL.to_string(), ConfigSource::Default),
            wms_url: ConfigValue::new(DEFAULT_WMS_URL.to_string(), ConfigSource::Default),
            page_size: ConfigValue::new(DEFAULT_PAGE_SIZE, ConfigSource::Default),
            timeout_secs: ConfigValue::new(DEFAULT_TIMEOUT_SECS, ConfigSource::Default),
            view_crs: ConfigValue::new(3857, ConfigSource::Default),
            data_crs: ConfigValue::new(4326, ConfigSource::Default),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| MapQueryError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| MapQueryError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(url) = file_config.backend_url {
            self.backend_url.update(url, ConfigSource::File);
        }

        if let Some(url) = file_config.wms_url {
            self.wms_url.update(url, ConfigSource::File);
        }

        if let Some(size) = file_config.page_size {
            if size == 0 {
                return Err(MapQueryError::ConfigInvalid {
                    key: "page_size".to_string(),
                    reason: "Page size must be at least 1".to_string(),
                });
            }
            self.page_size.update(size, ConfigSource::File);
        }

        if let Some(secs) = file_config.timeout_secs {
            self.timeout_secs.update(secs, ConfigSource::File);
        }

        if let Some(crs) = file_config.view_crs {
            self.view_crs.update(crs, ConfigSource::File);
        }

        if let Some(crs) = file_config.data_crs {
            self.data_crs.update(crs, ConfigSource::File);
        }

        Ok(self)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        // MAPQUERY_BACKEND_URL
        if let Ok(url) = env::var("MAPQUERY_BACKEND_URL") {
            self.backend_url.update(url, ConfigSource::Environment);
        }

        // MAPQUERY_WMS_URL
        if let Ok(url) = env::var("MAPQUERY_WMS_URL") {
            self.wms_url.update(url, ConfigSource::Environment);
        }

        // MAPQUERY_PAGE_SIZE
        if let Ok(size_str) = env::var("MAPQUERY_PAGE_SIZE") {
            match parse_page_size(&size_str) {
                Ok(size) => self.page_size.update(size, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid MAPQUERY_PAGE_SIZE value '{}': expected a positive integer",
                    size_str
                ),
            }
        }

        // MAPQUERY_TIMEOUT_SECS
        if let Ok(secs_str) = env::var("MAPQUERY_TIMEOUT_SECS") {
            match secs_str.parse::<u64>() {
                Ok(secs) => self.timeout_secs.update(secs, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid MAPQUERY_TIMEOUT_SECS value '{}': expected seconds as an integer",
                    secs_str
                ),
            }
        }

        // MAPQUERY_VIEW_CRS / MAPQUERY_DATA_CRS
        for (var, target) in [
            ("MAPQUERY_VIEW_CRS", &mut self.view_crs),
            ("MAPQUERY_DATA_CRS", &mut self.data_crs),
        ] {
            if let Ok(crs_str) = env::var(var) {
                match parse_epsg(&crs_str) {
                    Ok(crs) => target.update(crs, ConfigSource::Environment),
                    Err(_) => tracing::warn!(
                        "Invalid {} value '{}': expected EPSG code like 3857 or EPSG:3857",
                        var,
                        crs_str
                    ),
                }
            }
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        if let Some(url) = overrides.backend_url {
            self.backend_url.update(url, ConfigSource::Cli);
        }

        if let Some(url) = overrides.wms_url {
            self.wms_url.update(url, ConfigSource::Cli);
        }

        if let Some(size) = overrides.page_size {
            self.page_size.update(size.max(1), ConfigSource::Cli);
        }

        if let Some(secs) = overrides.timeout_secs {
            self.timeout_secs.update(secs, ConfigSource::Cli);
        }
    }

    /// Collapse the layers into the values the client runs with
    pub fn resolve(&self) -> ClientConfig {
        ClientConfig {
            backend_base_url: self.backend_url.value.trim_end_matches('/').to_string(),
            wms_base_url: self.wms_url.value.clone(),
            default_page_size: self.page_size.value.max(1),
            request_timeout: Duration::from_secs(self.timeout_secs.value),
            view_crs: Crs::from_epsg(self.view_crs.value),
            data_crs: Crs::from_epsg(self.data_crs.value),
        }
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        map.insert(
            "backend_url".to_string(),
            (self.backend_url.value.clone(), self.backend_url.source),
        );
        map.insert("wms_url".to_string(), (self.wms_url.value.clone(), self.wms_url.source));
        map.insert(
            "page_size".to_string(),
            (self.page_size.value.to_string(), self.page_size.source),
        );
        map.insert(
            "timeout_secs".to_string(),
            (self.timeout_secs.value.to_string(), self.timeout_secs.source),
        );
        map.insert(
            "view_crs".to_string(),
            (format!("EPSG:{}", self.view_crs.value), self.view_crs.source),
        );
        map.insert(
            "data_crs".to_string(),
            (format!("EPSG:{}", self.data_crs.value), self.data_crs.source),
        );

        map
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    backend_url: Option<String>,
    wms_url: Option<String>,
    page_size: Option<u32>,
    timeout_secs: Option<u64>,
    view_crs: Option<u32>,
    data_crs: Option<u32>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub backend_url: Option<String>,
    pub wms_url: Option<String>,
    pub page_size: Option<u32>,
    pub timeout_secs: Option<u64>,
}

/// Parse a page size; zero is rejected
pub fn parse_page_size(s: &str) -> Result<u32> {
    match s.trim().parse::<u32>() {
        Ok(size) if size > 0 => Ok(size),
        _ => Err(MapQueryError::ConfigInvalid {
            key: "page_size".to_string(),
            reason: format!("Invalid page size: {}. Use a positive integer", s),
        }),
    }
}

/// Parse an EPSG code given as `3857` or `EPSG:3857`
pub fn parse_epsg(s: &str) -> Result<u32> {
    let trimmed = s.trim();
    let digits = trimmed
        .strip_prefix("EPSG:")
        .or_else(|| trimmed.strip_prefix("epsg:"))
        .unwrap_or(trimmed);
    digits.parse::<u32>().map_err(|_| MapQueryError::ConfigInvalid {
        key: "crs".to_string(),
        reason: format!("Invalid EPSG code: {}", s),
    })
}
