//! Error types shared by the map service clients.

use serde::Deserialize;
use thiserror::Error;

/// Result type alias using MapError.
pub type MapResult<T> = Result<T, MapError>;

/// Primary error type for map service operations.
#[derive(Debug, Clone, Error)]
pub enum MapError {
    // === Request Errors ===
    #[error("Layer not found: {0}")]
    LayerNotFound(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // === Transport Errors ===
    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Request timeout")]
    Timeout,

    // === Service Errors ===
    #[error("Service error {code}: {message}")]
    Service {
        code: i64,
        message: String,
        details: Vec<String>,
    },

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl MapError {
    /// Whether the failure happened before the service produced a response.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            MapError::Transport { .. } | MapError::HttpStatus { .. } | MapError::Timeout
        )
    }
}

/// The `{ "error": { ... } }` payload a map service returns instead of data.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ServiceErrorPayload {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub details: Vec<String>,
}

impl From<ServiceErrorPayload> for MapError {
    fn from(payload: ServiceErrorPayload) -> Self {
        MapError::Service {
            code: payload.code,
            message: payload.message,
            details: payload.details,
        }
    }
}

impl From<serde_json::Error> for MapError {
    fn from(err: serde_json::Error) -> Self {
        MapError::Decode(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_payload_conversion() {
        let payload: ServiceErrorPayload = serde_json::from_str(
            r#"{"code": 400, "message": "Invalid query", "details": ["'where' parameter is invalid"]}"#,
        )
        .unwrap();

        let err: MapError = payload.into();
        assert_eq!(err.to_string(), "Service error 400: Invalid query");
        assert!(!err.is_transport());
    }

    #[test]
    fn test_transport_classification() {
        let err = MapError::HttpStatus {
            url: "http://example.com/0".to_string(),
            status: 502,
        };
        assert!(err.is_transport());
        assert!(MapError::Timeout.is_transport());
    }
}
