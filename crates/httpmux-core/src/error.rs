//! Configuration errors
//!
//! Raised while parsing, validating or wiring settings. None of these are
//! retried; they abort assembly for the client they name.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// A setting resolved to a value the client cannot be built with
    #[error("Client [{client_id}]: invalid {field}: {reason}")]
    InvalidSetting {
        client_id: String,
        field: &'static str,
        reason: String,
    },

    /// A client needs a collaborator or settings section that was not supplied
    #[error("Client [{client_id}]: missing required dependency [{name}]")]
    MissingDependency { client_id: String, name: String },

    /// The composition root lacks a collaborator every client needs
    #[error("missing required collaborator [{name}]")]
    MissingCollaborator { name: String },

    #[error("invalid time span [{0}]")]
    InvalidTimeSpan(String),

    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ConfigError {
    pub fn invalid(client_id: &str, field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidSetting {
            client_id: client_id.to_string(),
            field,
            reason: reason.into(),
        }
    }

    pub fn missing_dependency(client_id: &str, name: impl Into<String>) -> Self {
        Self::MissingDependency {
            client_id: client_id.to_string(),
            name: name.into(),
        }
    }
}
