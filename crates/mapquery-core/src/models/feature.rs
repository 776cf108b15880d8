use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use super::geometry::Geometry;

/// Identifier of a backend feature; GeoServer emits strings like
/// `layer.42`, other backends plain integers
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureId {
    Number(i64),
    Text(String),
}

impl FeatureId {
    /// Interpret a JSON scalar as an identifier
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.is_empty() => Some(FeatureId::Text(s.clone())),
            Value::Number(n) => n.as_i64().map(FeatureId::Number),
            _ => None,
        }
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureId::Number(n) => write!(f, "{}", n),
            FeatureId::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for FeatureId {
    fn from(id: &str) -> Self {
        FeatureId::Text(id.to_string())
    }
}

impl From<i64> for FeatureId {
    fn from(id: i64) -> Self {
        FeatureId::Number(id)
    }
}

/// Feature returned by a spatial query.
///
/// The property bag has no fixed schema across layers; values are kept as raw
/// JSON scalars for table rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<FeatureId>,

    /// Geometry as received (GeoJSON object), parsed on demand
    #[serde(default)]
    pub geometry: Option<Value>,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub properties: BTreeMap<String, Value>,
}

impl Feature {
    pub fn new(
        id: Option<FeatureId>,
        geometry: Option<Geometry>,
        properties: BTreeMap<String, Value>,
    ) -> Self {
        Self { id, geometry: geometry.map(|g| g.to_geojson()), properties }
    }

    /// Selection key: `id` if present, else `properties.id`
    pub fn key(&self) -> Option<FeatureId> {
        self.id.clone().or_else(|| self.properties.get("id").and_then(FeatureId::from_value))
    }

    /// Parsed geometry; `None` when absent or of an unsupported type
    pub fn parsed_geometry(&self) -> Option<Geometry> {
        self.geometry.as_ref().and_then(Geometry::from_geojson)
    }

    /// Property value rendered as table text
    pub fn property_text(&self, key: &str) -> String {
        match self.properties.get(key) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<BTreeMap<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<BTreeMap<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}
