//! Redaction error types

use thiserror::Error;

/// Redaction-specific errors
#[derive(Debug, Error)]
pub enum RedactionError {
    /// Presenter could not be built from the output config
    #[error("failed to create presenter '{name}': {message}")]
    PresenterCreation { name: String, message: String },

    /// Render or present failure (from contract)
    #[error("redaction error: {0}")]
    Contract(#[from] contracts::ContractError),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl RedactionError {
    pub fn presenter_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PresenterCreation {
            name: name.into(),
            message: message.into(),
        }
    }
}
