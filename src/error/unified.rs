//! Error classification and recovery.

use serde::{Deserialize, Serialize};
use strum::Display;

/// Broad error category for routing recovery logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorCategory {
    Authentication,
    Network,
    Server,
    Validation,
    Api,
    Configuration,
    Serialization,
    Unknown,
}

/// Suggested recovery action for a host UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoverySuggestion {
    /// Send the user to the login view.
    LogInAgain,
    /// Offer a retry action.
    RetryLater,
    CheckConfiguration,
    FixInput,
    ContactSupport,
}
