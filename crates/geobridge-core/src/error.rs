//! Error types for geobridge

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    // Identity errors
    #[error("Sign-in failed: {reason}")]
    Authentication { reason: String },

    #[error("{message}")]
    Authorization { status: u16, message: String },

    #[error("{message}")]
    ResourceAccess { status: u16, message: String },

    // Workflow errors
    #[error("{0}")]
    Validation(String),

    #[error("Category '{category}' has no mapped system, record skipped")]
    UnmappedCategory { category: String },

    #[error("Feature has no geometry, record skipped")]
    MissingGeometry,

    #[error("Operation not allowed while {state}: {operation}")]
    InvalidState { state: String, operation: String },

    // Transport errors
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Request failed with status {status}.\nResponse:\n{body}")]
    Http { status: u16, body: ResponseBody },

    // Configuration errors
    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl BridgeError {
    /// HTTP status attached to the error, if the remote answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            BridgeError::Authorization { status, .. }
            | BridgeError::ResourceAccess { status, .. }
            | BridgeError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// A response body kept for error reporting.
///
/// Bodies that parse as JSON are kept structured so they can be
/// pretty-printed; anything else is kept verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(serde_json::Value),
    Text(String),
}

impl ResponseBody {
    pub fn parse(raw: &str) -> Self {
        match serde_json::from_str(raw) {
            Ok(value) => ResponseBody::Json(value),
            Err(_) => ResponseBody::Text(raw.to_string()),
        }
    }
}

impl fmt::Display for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseBody::Json(value) => match serde_json::to_string_pretty(value) {
                Ok(pretty) => f.write_str(&pretty),
                Err(_) => write!(f, "{}", value),
            },
            ResponseBody::Text(text) => f.write_str(text),
        }
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
