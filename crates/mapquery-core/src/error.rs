//! Error types for mapquery

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MapQueryError {
    // Geometry errors
    #[error("No geometry drawn")]
    NoGeometry,

    #[error("Unsupported geometry type {kind}: only polygon queries are supported")]
    InvalidGeometryKind { kind: String },

    #[error("Polygon needs at least 3 distinct vertices, found {found}")]
    InsufficientVertices { found: usize },

    #[error("Projection from {from} to {to} failed: {reason}")]
    Projection {
        from: String,
        to: String,
        reason: String,
    },

    #[error("Invalid geometry: {reason}")]
    InvalidGeometry { reason: String },

    #[error("Invalid WKT: {reason}")]
    InvalidWkt { reason: String },

    // Backend errors
    #[error("Backend unavailable: {reason}")]
    BackendUnavailable { reason: String },

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Failed to decode backend response: {reason}")]
    Decode { reason: String },

    // Rendering side effects
    #[error("Overlay refresh failed: {reason}")]
    OverlayRefresh { reason: String },

    // Configuration errors
    #[error("Missing required configuration: {key}")]
    ConfigMissing { key: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl MapQueryError {
    /// Message suitable for a user-facing query outcome.
    ///
    /// HTTP failures report the server-provided message only, so the outcome
    /// reads `Spatial query failed: db timeout` rather than repeating the status.
    pub fn user_message(&self) -> String {
        match self {
            MapQueryError::Http { message, .. } => message.clone(),
            MapQueryError::BackendUnavailable { reason } => reason.clone(),
            other => other.to_string(),
        }
    }

    /// Whether the error happened before any network call was made
    pub fn is_local_validation(&self) -> bool {
        matches!(
            self,
            MapQueryError::NoGeometry
                | MapQueryError::InvalidGeometryKind { .. }
                | MapQueryError::InsufficientVertices { .. }
                | MapQueryError::Projection { .. }
                | MapQueryError::InvalidGeometry { .. }
                | MapQueryError::InvalidWkt { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, MapQueryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_user_message_is_server_text() {
        let err = MapQueryError::Http { status: 500, message: "db timeout".to_string() };
        assert_eq!(err.user_message(), "db timeout");
        assert_eq!(err.to_string(), "HTTP 500: db timeout");
    }

    #[test]
    fn test_local_validation_classification() {
        assert!(MapQueryError::NoGeometry.is_local_validation());
        assert!(MapQueryError::InsufficientVertices { found: 2 }.is_local_validation());
        assert!(MapQueryError::InvalidGeometry { reason: "NaN".into() }.is_local_validation());
        assert!(!MapQueryError::BackendUnavailable { reason: "refused".into() }
            .is_local_validation());
    }
}
