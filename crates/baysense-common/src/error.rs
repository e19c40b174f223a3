//! Error types for the dashboard crates.

use thiserror::Error;

/// Result type alias using DashboardError.
pub type DashboardResult<T> = Result<T, DashboardError>;

/// Primary error type for dashboard operations.
#[derive(Debug, Error)]
pub enum DashboardError {
    // === Network Errors ===
    #[error("Request to {endpoint} failed: {message}")]
    Network { endpoint: String, message: String },

    #[error("Backend returned {status} for {endpoint}: {message}")]
    Http {
        endpoint: String,
        status: u16,
        message: String,
    },

    #[error("Request timeout: {0}")]
    Timeout(String),

    // === Data Errors ===
    #[error("Malformed data: {0}")]
    MalformedData(String),

    #[error("No data available: {0}")]
    Unavailable(String),

    // === Input Errors ===
    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    // === Infrastructure Errors ===
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification used by widgets to decide how to present a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Request rejected or non-2xx; shown as a dismissible inline message.
    NetworkFailure,
    /// Unparseable payload; dropped at the smallest granularity.
    MalformedData,
    /// Empty result; not an error, dependent controls are disabled.
    Unavailable,
    /// Bad user input or configuration.
    Invalid,
}

impl DashboardError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DashboardError::Network { .. }
            | DashboardError::Http { .. }
            | DashboardError::Timeout(_)
            | DashboardError::Internal(_) => ErrorKind::NetworkFailure,
            DashboardError::MalformedData(_) => ErrorKind::MalformedData,
            DashboardError::Unavailable(_) => ErrorKind::Unavailable,
            DashboardError::InvalidParameter { .. } | DashboardError::Config(_) => {
                ErrorKind::Invalid
            }
        }
    }

    /// Whether retrying the same request could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            DashboardError::Network { .. } | DashboardError::Timeout(_) => true,
            DashboardError::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Short string suitable for display next to the affected widget.
    ///
    /// Never includes the underlying transport or parser message.
    pub fn user_message(&self) -> &'static str {
        match self {
            DashboardError::Network { .. } => "Could not reach the server.",
            DashboardError::Http { status, .. } if *status >= 500 => {
                "The server failed to process the request."
            }
            DashboardError::Http { .. } => "The request was rejected.",
            DashboardError::Timeout(_) => "The request timed out.",
            DashboardError::MalformedData(_) => "Some data could not be read.",
            DashboardError::Unavailable(_) => "No data for the current filters.",
            DashboardError::InvalidParameter { .. } => "Invalid selection.",
            DashboardError::Config(_) => "Invalid configuration.",
            DashboardError::Internal(_) => "Something went wrong.",
        }
    }

    pub fn invalid(param: impl Into<String>, message: impl Into<String>) -> Self {
        DashboardError::InvalidParameter {
            param: param.into(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for DashboardError {
    fn from(err: serde_json::Error) -> Self {
        DashboardError::MalformedData(format!("JSON error: {}", err))
    }
}
