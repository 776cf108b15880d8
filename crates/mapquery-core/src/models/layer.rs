use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable layer identifier, e.g. `workspace:layer`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(pub String);

impl LayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LayerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for LayerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Queryable layer as listed by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerDescriptor {
    /// Unique identifier
    pub id: LayerId,

    /// Display label
    pub name: String,
}

impl LayerDescriptor {
    pub fn new(id: impl Into<LayerId>, name: impl Into<String>) -> Self {
        Self { id: id.into(), name: name.into() }
    }
}

/// Look up the display name for a layer, falling back to its id
pub fn layer_display_name(layers: &[LayerDescriptor], id: &LayerId) -> String {
    layers
        .iter()
        .find(|layer| &layer.id == id)
        .map(|layer| layer.name.clone())
        .unwrap_or_else(|| id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_descriptor_wire_shape() {
        let json = r#"{"id": "Picarro:Boundary", "name": "Boundary"}"#;
        let layer: LayerDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(layer.id.as_str(), "Picarro:Boundary");
        assert_eq!(layer.name, "Boundary");
    }

    #[test]
    fn test_display_name_fallback() {
        let layers = vec![LayerDescriptor::new("ns:a", "Layer A")];
        assert_eq!(layer_display_name(&layers, &"ns:a".into()), "Layer A");
        assert_eq!(layer_display_name(&layers, &"ns:b".into()), "ns:b");
    }
}
