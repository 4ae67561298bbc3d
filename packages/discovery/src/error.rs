//! Typed errors for the discovery library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) so callers can tell
//! transport trouble apart from malformed answers.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while discovering a source.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Reasoner or probe unreachable, or returned a non-success response
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// An external call exceeded its time budget
    #[error("call timed out after {0:?}")]
    Timeout(Duration),

    /// Response was not in the expected structured shape
    #[error("parse error: {reason}")]
    Parse { reason: String },

    /// Judge could not produce a verdict
    #[error("validation error: {reason}")]
    Validation { reason: String },

    /// Input or output table could not be read or written
    #[error("table error: {0}")]
    Table(#[from] csv::Error),

    /// Input table is missing columns or otherwise unusable
    #[error("invalid input table: {0}")]
    Input(String),

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DiscoveryError {
    /// Build a transport error from any displayable message.
    pub fn transport(message: impl Into<String>) -> Self {
        let message: String = message.into();
        Self::Transport(message.into())
    }

    /// Build a parse error.
    pub fn parse(reason: impl Into<String>) -> Self {
        Self::Parse {
            reason: reason.into(),
        }
    }

    /// Build a validation error.
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    /// Classify this error for the round history.
    ///
    /// Timeouts count as transport failures. Table, input, config and I/O errors
    /// never occur inside a round; they are reported as transport for
    /// completeness.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Parse { .. } | Self::Json(_) => FailureKind::Parse,
            Self::Validation { .. } => FailureKind::Validation,
            _ => FailureKind::Transport,
        }
    }
}

/// The three ways a round can go wrong.
///
/// All three are handled identically by the loop: recorded, treated as
/// "not accepted", and fed into the next refinement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Transport,
    Parse,
    Validation,
}

/// Result type alias for discovery operations.
pub type Result<T> = std::result::Result<T, DiscoveryError>;
