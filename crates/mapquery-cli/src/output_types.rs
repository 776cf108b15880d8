use mapquery_client::SessionSnapshot;
use mapquery_core::config::ConfigSource;
use mapquery_core::models::{BoundingBox, Feature, LayerDescriptor, PaginationDescriptor};
use serde::Serialize;
use tabled::Tabled;

/// Number of property columns shown per feature row
const PROPERTY_PREVIEW: usize = 3;

/// Output for layers command
#[derive(Debug, Serialize)]
pub struct LayersOutput {
    pub layers: Vec<LayerDescriptor>,
}

/// Output for query command
#[derive(Debug, Serialize)]
pub struct QueryOutput {
    /// WKT sent to the backend, in data coordinates
    pub query_wkt: Option<String>,

    #[serde(flatten)]
    pub session: SessionSnapshot,

    pub geojson_path: Option<String>,
}

/// Output for features command
#[derive(Debug, Serialize)]
pub struct FeaturesOutput {
    pub layer: String,
    pub pagination: PaginationDescriptor,
    pub features: Vec<Feature>,
    pub geojson_path: Option<String>,
}

/// Output for wms-url command
#[derive(Debug, Serialize)]
pub struct WmsUrlOutput {
    pub layer: String,
    pub cql_filter: Option<String>,
    pub bbox: BoundingBox,
    pub get_map: String,
    pub get_feature_info: Option<String>,
}

/// Output for config command
#[derive(Debug, Serialize)]
pub struct ConfigOutput {
    pub values: Vec<ConfigEntry>,
}

#[derive(Debug, Serialize, Tabled)]
pub struct ConfigEntry {
    #[tabled(rename = "Key")]
    pub key: String,
    #[tabled(rename = "Value")]
    pub value: String,
    #[tabled(rename = "Source", display_with = "source_label")]
    pub source: ConfigSource,
}

fn source_label(source: &ConfigSource) -> String {
    match source {
        ConfigSource::Default => "default",
        ConfigSource::File => "file",
        ConfigSource::Environment => "env",
        ConfigSource::Cli => "cli",
    }
    .to_string()
}

#[derive(Tabled)]
pub struct LayerRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Name")]
    pub name: String,
}

impl From<&LayerDescriptor> for LayerRow {
    fn from(layer: &LayerDescriptor) -> Self {
        Self { id: layer.id.to_string(), name: layer.name.clone() }
    }
}

#[derive(Tabled)]
pub struct TabRow {
    #[tabled(rename = "")]
    pub marker: String,
    #[tabled(rename = "Layer")]
    pub layer: String,
    #[tabled(rename = "Features")]
    pub count: String,
}

#[derive(Tabled)]
pub struct FeatureRow {
    #[tabled(rename = "")]
    pub selected: String,
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Properties")]
    pub properties: String,
}

impl FeatureRow {
    pub fn new(feature: &Feature, selected: bool) -> Self {
        let properties = feature
            .properties
            .keys()
            .take(PROPERTY_PREVIEW)
            .map(|key| format!("{}={}", key, feature.property_text(key)))
            .collect::<Vec<_>>()
            .join(", ");

        Self {
            selected: if selected { "*".to_string() } else { String::new() },
            id: feature.key().map(|id| id.to_string()).unwrap_or_default(),
            properties,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapquery_core::models::FeatureId;
    use serde_json::json;
    use std::collections::BTreeMap;

    #[test]
    fn test_feature_row_previews_properties() {
        let mut properties = BTreeMap::new();
        properties.insert("apn".to_string(), json!(1042));
        properties.insert("owner".to_string(), json!("City"));
        properties.insert("zone".to_string(), json!(null));
        properties.insert("use".to_string(), json!("park"));
        let feature = Feature::new(Some(FeatureId::Text("parcels.7".into())), None, properties);

        let row = FeatureRow::new(&feature, true);
        assert_eq!(row.selected, "*");
        assert_eq!(row.id, "parcels.7");
        assert_eq!(row.properties, "apn=1042, owner=City, use=park");
    }
}
