//! Integration tests for layered configuration
//!
//! These tests verify that configuration loading follows the correct precedence:
//! CLI arguments > Environment variables > Config file > Defaults

use mapquery_core::config::{CliConfigOverrides, ConfigSource, LayeredConfig};
use mapquery_core::models::Crs;
use serial_test::serial;
use std::env;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

const ENV_VARS: [&str; 6] = [
    "MAPQUERY_BACKEND_URL",
    "MAPQUERY_WMS_URL",
    "MAPQUERY_PAGE_SIZE",
    "MAPQUERY_TIMEOUT_SECS",
    "MAPQUERY_VIEW_CRS",
    "MAPQUERY_DATA_CRS",
];

fn clear_env() {
    for var in ENV_VARS {
        env::remove_var(var);
    }
}

#[test]
fn test_default_configuration_resolves() {
    let resolved = LayeredConfig::with_defaults().resolve();

    assert_eq!(resolved.backend_base_url, "http://localhost:5000");
    assert_eq!(resolved.default_page_size, 100);
    assert_eq!(resolved.request_timeout, Duration::from_secs(30));
    assert_eq!(resolved.view_crs, Crs::web_mercator());
    assert_eq!(resolved.data_crs, Crs::wgs84());
}

#[test]
#[serial]
fn test_environment_overrides_file() {
    clear_env();
    env::set_var("MAPQUERY_BACKEND_URL", "http://env-backend:5000");
    env::set_var("MAPQUERY_PAGE_SIZE", "250");
    env::set_var("MAPQUERY_DATA_CRS", "EPSG:3857");

    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
backend_url = "http://file-backend:5000"
page_size = 50
timeout_secs = 10
"#
    )
    .unwrap();

    let config = LayeredConfig::with_defaults()
        .load_from_file(file.path())
        .unwrap()
        .load_from_env();

    assert_eq!(config.backend_url.value, "http://env-backend:5000");
    assert_eq!(config.backend_url.source, ConfigSource::Environment);
    assert_eq!(config.page_size.value, 250);
    assert_eq!(config.page_size.source, ConfigSource::Environment);
    assert_eq!(config.data_crs.value, 3857);
    // Only set in the file
    assert_eq!(config.timeout_secs.value, 10);
    assert_eq!(config.timeout_secs.source, ConfigSource::File);

    clear_env();
}

#[test]
#[serial]
fn test_invalid_environment_values_are_ignored() {
    clear_env();
    env::set_var("MAPQUERY_PAGE_SIZE", "0");
    env::set_var("MAPQUERY_TIMEOUT_SECS", "soon");
    env::set_var("MAPQUERY_VIEW_CRS", "mercator");

    let config = LayeredConfig::with_defaults().load_from_env();

    assert_eq!(config.page_size.value, 100);
    assert_eq!(config.page_size.source, ConfigSource::Default);
    assert_eq!(config.timeout_secs.source, ConfigSource::Default);
    assert_eq!(config.view_crs.value, 3857);
    assert_eq!(config.view_crs.source, ConfigSource::Default);

    clear_env();
}

#[test]
#[serial]
fn test_cli_overrides_all() {
    clear_env();
    env::set_var("MAPQUERY_WMS_URL", "http://env-wms/geoserver/wms");

    let mut config = LayeredConfig::with_defaults().load_from_env();

    config.update_from_cli(CliConfigOverrides {
        wms_url: Some("http://cli-wms/geoserver/wms".to_string()),
        timeout_secs: Some(5),
        ..Default::default()
    });

    assert_eq!(config.wms_url.value, "http://cli-wms/geoserver/wms");
    assert_eq!(config.wms_url.source, ConfigSource::Cli);

    let resolved = config.resolve();
    assert_eq!(resolved.request_timeout, Duration::from_secs(5));

    // Verify precedence levels
    assert!(ConfigSource::Cli.precedence() > ConfigSource::Environment.precedence());
    assert!(ConfigSource::Environment.precedence() > ConfigSource::File.precedence());
    assert!(ConfigSource::File.precedence() > ConfigSource::Default.precedence());

    clear_env();
}

#[test]
fn test_missing_file_is_config_error() {
    let result = LayeredConfig::with_defaults().load_from_file("/nonexistent/mapquery.toml");
    assert!(result.is_err());
}
