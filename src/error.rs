//! Error types for the generation gateway
//!
//! `GatewayError` is the single taxonomy shared by the provider layer, the
//! proxy dispatcher and the HTTP boundary. Every variant maps to exactly one
//! HTTP status and one JSON error body.
//!
//! # Example
//!
//! ```rust,ignore
//! use assistive_gateway::error::GatewayError;
//!
//! let error = GatewayError::unknown_action("doSomethingElse");
//! assert_eq!(error.status_code(), 400);
//! assert!(!error.is_retryable());
//! ```

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::decode::FailureKind;

/// Errors produced while serving a generation request.
#[derive(Error, Debug, Clone)]
pub enum GatewayError {
    /// The request used a method other than POST.
    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    /// Missing/unknown action, missing prompt/schema/term or malformed body.
    #[error("{0}")]
    BadRequest(String),

    /// The provider credential (or another required setting) is missing.
    #[error("Server misconfigured: {0}")]
    ServerMisconfigured(String),

    /// The provider could not be reached.
    #[error("Upstream network error: {0}")]
    UpstreamNetwork(String),

    /// The provider answered with a non-2xx status.
    #[error("Upstream provider error ({status}): {message}")]
    UpstreamProvider {
        /// Status returned by the provider
        status: u16,
        /// Provider message, when one could be extracted
        message: String,
        /// Raw provider error payload
        details: Option<Value>,
    },

    /// The provider text could not be decoded into the requested shape.
    #[error("Model output could not be decoded ({kind})")]
    NonDecodableOutput {
        /// Which step of the decode ladder gave up
        kind: FailureKind,
        /// The raw text as returned by the provider
        raw: String,
    },

    /// Catch-all for anything else.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON body returned to callers for every failed request.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ErrorBody {
    /// Human readable message
    pub error: String,
    /// Optional diagnostic payload (provider detail, failure kind)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// Raw provider text for undecodable output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

impl GatewayError {
    /// Shorthand for a `BadRequest` naming an unrecognised action.
    pub fn unknown_action(action: &str) -> Self {
        Self::BadRequest(format!("Unknown action: {action}"))
    }

    /// Shorthand for a `BadRequest` about a missing payload field.
    pub fn missing_field(action: &str, field: &str) -> Self {
        Self::BadRequest(format!("Missing '{field}' in payload for action '{action}'"))
    }

    /// HTTP status code this error is reported with.
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::MethodNotAllowed(_) => 405,
            Self::BadRequest(_) => 400,
            Self::ServerMisconfigured(_) | Self::Internal(_) => 500,
            Self::UpstreamNetwork(_) | Self::UpstreamProvider { .. } => 502,
            Self::NonDecodableOutput { .. } => 422,
        }
    }

    /// Whether repeating the same request could reasonably succeed.
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::UpstreamNetwork(_) => true,
            Self::UpstreamProvider { status, .. } => matches!(*status, 429 | 500..=599),
            _ => false,
        }
    }

    /// Build the JSON error body for this error.
    pub fn to_body(&self) -> ErrorBody {
        match self {
            Self::UpstreamProvider {
                status, details, ..
            } => ErrorBody {
                error: self.to_string(),
                details: Some(serde_json::json!({
                    "providerStatus": status,
                    "provider": details.clone().unwrap_or(Value::Null),
                })),
                raw: None,
            },
            Self::NonDecodableOutput { kind, raw } => ErrorBody {
                error: self.to_string(),
                details: Some(serde_json::json!({ "kind": kind })),
                raw: Some(raw.clone()),
            },
            _ => ErrorBody {
                error: self.to_string(),
                details: None,
                raw: None,
            },
        }
    }
}

/// Errors raised while assembling the process at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required setting is absent from the environment.
    #[error("Missing required setting: {0}")]
    Missing(String),

    /// A setting is present but cannot be parsed.
    #[error("Invalid value for {key}: {reason}")]
    Invalid {
        /// Environment variable name
        key: String,
        /// What was wrong with it
        reason: String,
    },

    /// Field-level validation failed.
    #[error("Invalid configuration: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// The tracing subscriber could not be installed.
    #[error("Telemetry initialization error: {0}")]
    TelemetryInit(String),
}
