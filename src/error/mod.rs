//! Error types for Insur.

pub mod unified;

pub use unified::{ErrorCategory, RecoverySuggestion};

use thiserror::Error;

use crate::auth::error::AuthError;

/// Primary error type for all Insur operations.
#[derive(Error, Debug)]
pub enum InsurError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// No response was received (DNS, connection, timeout).
    #[error("Network error: {0}")]
    Network(String),

    /// The backend answered with a non-success status.
    #[error("HTTP error (status {status}): {}", http_message(.payload))]
    Http {
        status: u16,
        payload: Option<serde_json::Value>,
    },

    /// The session could not be (re)authenticated. Stored credentials have
    /// already been cleared when this is returned from the HTTP client.
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// A resource call failed; `message` is ready to show to a user.
    #[error("{message}")]
    Operation {
        message: String,
        status: Option<u16>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl From<reqwest::Error> for InsurError {
    fn from(error: reqwest::Error) -> Self {
        Self::Network(error.to_string())
    }
}

impl InsurError {
    /// Create an HTTP error from a status and optional JSON payload.
    pub fn http(status: u16, payload: Option<serde_json::Value>) -> Self {
        Self::Http { status, payload }
    }

    /// Human-readable message carried by the backend payload, if any.
    ///
    /// Looks at `message` first, then `error`, then a bare string body.
    pub fn payload_message(&self) -> Option<&str> {
        match self {
            Self::Http {
                payload: Some(payload),
                ..
            } => extract_message(payload),
            _ => None,
        }
    }

    /// Message suitable for display: the backend payload message when
    /// present, else the error's own rendering.
    pub fn message(&self) -> String {
        self.payload_message()
            .map(str::to_string)
            .unwrap_or_else(|| self.to_string())
    }

    /// HTTP status associated with this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Operation { status, .. } => *status,
            _ => None,
        }
    }

    /// Whether the caller should send the user back to the login flow.
    pub fn requires_login(&self) -> bool {
        self.category() == ErrorCategory::Authentication
    }

    /// Wrap this error for display, keeping auth failures intact.
    ///
    /// The message is taken from the backend payload when present, else
    /// `fallback` is used.
    pub fn into_operation(self, fallback: &str) -> Self {
        match self {
            Self::Auth(_) | Self::Operation { .. } => self,
            other => {
                let message = other
                    .payload_message()
                    .map(str::to_string)
                    .unwrap_or_else(|| fallback.to_string());
                Self::Operation {
                    message,
                    status: other.status(),
                }
            }
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Auth(_) => ErrorCategory::Authentication,
            Self::Network(_) => ErrorCategory::Network,
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Serialization(_) => ErrorCategory::Serialization,
            Self::InvalidArgument(_) => ErrorCategory::Validation,
            Self::Http { status, .. }
            | Self::Operation {
                status: Some(status),
                ..
            } => match status {
                401 | 403 => ErrorCategory::Authentication,
                400 | 404 | 409 | 422 => ErrorCategory::Validation,
                500..=599 => ErrorCategory::Server,
                _ => ErrorCategory::Api,
            },
            _ => ErrorCategory::Unknown,
        }
    }

    /// Suggest recovery actions.
    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        match self.category() {
            ErrorCategory::Authentication => RecoverySuggestion::LogInAgain,
            ErrorCategory::Network | ErrorCategory::Server => RecoverySuggestion::RetryLater,
            ErrorCategory::Configuration => RecoverySuggestion::CheckConfiguration,
            ErrorCategory::Validation => RecoverySuggestion::FixInput,
            _ => RecoverySuggestion::ContactSupport,
        }
    }
}

fn extract_message(payload: &serde_json::Value) -> Option<&str> {
    if let Some(text) = payload.as_str() {
        return (!text.trim().is_empty()).then_some(text);
    }
    ["message", "error"]
        .iter()
        .filter_map(|key| payload.get(*key).and_then(|v| v.as_str()))
        .find(|text| !text.trim().is_empty())
}

fn http_message(payload: &Option<serde_json::Value>) -> String {
    payload
        .as_ref()
        .and_then(extract_message)
        .unwrap_or("no message")
        .to_string()
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, InsurError>;
