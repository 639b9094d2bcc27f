//! Error types for azurerm-network.
//!
//! Every failure surfaced by the library is an [`Error`]. Failures reported by
//! Azure Resource Manager itself are normalised into [`Error::Azure`], carrying
//! the context of the operation that was attempted plus the ARM error code and
//! message parsed from the response envelope.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Result type alias for azurerm-network operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for azurerm-network.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Model Errors
    // ========================================================================
    /// A required model attribute was not set.
    #[error("{0} is required for this operation")]
    MissingAttribute(String),

    /// An attribute has a value the operation cannot accept.
    #[error("Invalid value for attribute '{attribute}': {message}")]
    InvalidAttribute {
        /// Attribute name
        attribute: String,
        /// Error message
        message: String,
    },

    /// Attributes that are fixed after creation were passed to an update.
    #[error("Attributes {} can not be updated.", .0.join(", "))]
    RestrictedAttributes(Vec<String>),

    /// The attribute does not exist on the model.
    #[error("Unknown attribute: {0}")]
    UnknownAttribute(String),

    /// The string is not a well-formed ARM resource id.
    #[error("Invalid resource id: '{0}'")]
    InvalidResourceId(String),

    /// The resource does not exist.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// The change does not apply to the resource's current state.
    #[error("{0}")]
    InvalidState(String),

    // ========================================================================
    // Azure Errors
    // ========================================================================
    /// Azure Resource Manager rejected the operation.
    #[error("{context} Exception: {code}: {message}")]
    Azure {
        /// What was being attempted when the error happened
        context: String,
        /// HTTP status, when the error came from a response
        status: Option<u16>,
        /// ARM error code (e.g. `InvalidResourceReference`)
        code: String,
        /// ARM error message
        message: String,
    },

    /// A successful ARM response did not match the expected shape.
    #[error("{context} Exception: Failed to decode response: {source}")]
    Decode {
        /// What was being attempted when the error happened
        context: String,
        /// The underlying parse error
        #[source]
        source: serde_json::Error,
    },

    /// Token acquisition failed.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// A long-running operation did not finish in time.
    #[error("Operation timed out: {0}")]
    Timeout(String),

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// The configuration is missing something or is malformed.
    #[error("Configuration error: {0}")]
    Config(String),

    // ========================================================================
    // Module Errors
    // ========================================================================
    /// A declarative module failed.
    #[error("Module '{module}' failed: {message}")]
    Module {
        /// Module name
        module: String,
        /// Error message
        message: String,
    },

    // ========================================================================
    // Wrapped Errors
    // ========================================================================
    /// Transport error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The error envelope returned by Azure Resource Manager.
///
/// ```json
/// { "error": { "code": "ResourceNotFound", "message": "..." } }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ArmErrorBody {
    /// The error payload
    pub error: ArmErrorDetail,
}

/// Code and message of an ARM error.
#[derive(Debug, Clone, Deserialize)]
pub struct ArmErrorDetail {
    /// Machine-readable error code
    #[serde(default)]
    pub code: String,
    /// Human-readable message
    #[serde(default)]
    pub message: String,
}

impl Error {
    /// Build an [`Error::Azure`] from a failed ARM response.
    ///
    /// The body is parsed as an ARM error envelope; when that fails the raw
    /// body (or the status reason when the body is empty) becomes the message.
    pub fn azure(context: impl Into<String>, status: StatusCode, body: &str) -> Self {
        let (code, message) = match serde_json::from_str::<ArmErrorBody>(body) {
            Ok(envelope) => (envelope.error.code, envelope.error.message),
            Err(_) => {
                let reason = status.canonical_reason().unwrap_or("Unknown").to_string();
                let message = if body.trim().is_empty() {
                    reason.clone()
                } else {
                    body.trim().to_string()
                };
                (reason.replace(' ', ""), message)
            }
        };

        Self::Azure {
            context: context.into(),
            status: Some(status.as_u16()),
            code,
            message,
        }
    }

    /// Build an [`Error::Azure`] from an operation status body (no HTTP status).
    pub fn azure_operation(context: impl Into<String>, detail: ArmErrorDetail) -> Self {
        Self::Azure {
            context: context.into(),
            status: None,
            code: detail.code,
            message: detail.message,
        }
    }

    /// Build an [`Error::InvalidAttribute`].
    pub fn invalid_attribute(attribute: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidAttribute {
            attribute: attribute.into(),
            message: message.into(),
        }
    }

    /// Build an [`Error::Module`].
    pub fn module(module: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Module {
            module: module.into(),
            message: message.into(),
        }
    }

    /// Check if this is a not found error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::NotFound(_) => true,
            Error::Azure { status, code, .. } => {
                *status == Some(404) || code == "ResourceNotFound" || code == "NotFound"
            }
            _ => false,
        }
    }

    /// Check if this error is worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Azure {
                status: Some(status),
                ..
            } => is_retryable_status(*status),
            Error::Network(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Get the HTTP status code if available.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Azure { status, .. } => *status,
            Error::NotFound(_) => Some(404),
            Error::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Throttling and server-side failures are worth another attempt.
pub fn is_retryable_status(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}
