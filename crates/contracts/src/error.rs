//! Layered error definitions
//!
//! Categorized by source: config / capture / collaborator / protocol / output

use thiserror::Error;

use crate::StageName;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Capture Errors =====
    /// The capture collaborator could not open the input. Not retryable.
    #[error("failed to open video source '{path}': {message}")]
    SourceOpen { path: String, message: String },

    // ===== Stage Errors =====
    /// A detection, rendering or capture collaborator failed mid-run
    #[error("{stage} collaborator failed: {message}")]
    Collaborator { stage: StageName, message: String },

    /// Stage wiring defect (duplicate sentinel, stale id, leftover buffer...)
    #[error("protocol violation in {stage}: {message}")]
    ProtocolViolation { stage: StageName, message: String },

    /// Downstream receiver went away before the sentinel was delivered
    #[error("{stage} output channel closed")]
    ChannelClosed { stage: StageName },

    // ===== Output Errors =====
    /// Presenter write error
    #[error("presenter '{presenter}' error: {message}")]
    Present { presenter: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create source open error
    pub fn source_open(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SourceOpen {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create collaborator failure
    pub fn collaborator(stage: StageName, message: impl Into<String>) -> Self {
        Self::Collaborator {
            stage,
            message: message.into(),
        }
    }

    /// Create protocol violation
    pub fn protocol(stage: StageName, message: impl Into<String>) -> Self {
        Self::ProtocolViolation {
            stage,
            message: message.into(),
        }
    }

    /// Create presenter error
    pub fn present(presenter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Present {
            presenter: presenter.into(),
            message: message.into(),
        }
    }

    /// Whether this error indicates a wiring defect rather than a runtime failure
    pub fn is_protocol_violation(&self) -> bool {
        matches!(self, Self::ProtocolViolation { .. })
    }

    /// Whether this error only reports that a neighbouring stage went away
    pub fn is_channel_closed(&self) -> bool {
        matches!(self, Self::ChannelClosed { .. })
    }
}
