use serde::{Deserialize, Serialize};

use super::feature::Feature;
use super::layer::LayerId;
use super::pagination::PaginationDescriptor;

/// Outcome of querying one layer. Always stored and replaced as a whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerQueryResult {
    pub layer_id: LayerId,

    pub success: bool,

    pub features: Vec<Feature>,

    /// Number of matching features reported by the backend; may exceed
    /// `features.len()` when the backend caps its response
    pub count: u64,

    pub layer_name: String,

    pub pagination: Option<PaginationDescriptor>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LayerQueryResult {
    /// Successful result without pagination metadata
    pub fn success(
        layer_id: LayerId,
        layer_name: impl Into<String>,
        features: Vec<Feature>,
        count: u64,
    ) -> Self {
        Self {
            layer_id,
            success: true,
            features,
            count,
            layer_name: layer_name.into(),
            pagination: None,
            error: None,
        }
    }

    /// Failed result for a single layer
    pub fn failure(
        layer_id: LayerId,
        layer_name: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            layer_id,
            success: false,
            features: Vec::new(),
            count: 0,
            layer_name: layer_name.into(),
            pagination: None,
            error: Some(error.into()),
        }
    }

    pub fn with_pagination(mut self, pagination: PaginationDescriptor) -> Self {
        self.pagination = Some(pagination);
        self
    }

    pub fn has_features(&self) -> bool {
        self.success && !self.features.is_empty()
    }
}

/// Kind of a user-visible query outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeKind {
    Success,
    Error,
    Info,
}

/// Ephemeral message describing the latest query attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOutcome {
    #[serde(rename = "type")]
    pub kind: OutcomeKind,
    pub message: String,
}

impl QueryOutcome {
    pub fn success(message: impl Into<String>) -> Self {
        Self { kind: OutcomeKind::Success, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { kind: OutcomeKind::Error, message: message.into() }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self { kind: OutcomeKind::Info, message: message.into() }
    }

    pub fn is_error(&self) -> bool {
        self.kind == OutcomeKind::Error
    }
}
