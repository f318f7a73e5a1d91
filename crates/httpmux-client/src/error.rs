//! Error types for assembly and for requests issued through the facades

use std::backtrace::Backtrace;
use std::fmt;

use bytes::Bytes;
use httpmux_core::ConfigError;
use reqwest::StatusCode;
use thiserror::Error;

/// Failure while building one component of a client
#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to construct {component}: {reason}")]
    Construction {
        component: &'static str,
        reason: String,
    },

    /// The key is already occupied by a component of another type
    #[error("component [{name}] is registered with a type other than {expected}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
    },
}

impl AssemblyError {
    /// Whether the message already starts with the client it concerns
    fn names_client(&self) -> bool {
        matches!(
            self,
            Self::Config(
                ConfigError::InvalidSetting { .. } | ConfigError::MissingDependency { .. }
            )
        )
    }

    pub fn construction(component: &'static str, reason: impl fmt::Display) -> Self {
        Self::Construction {
            component,
            reason: reason.to_string(),
        }
    }
}

/// Assembly failure attributed to the client whose pass aborted
#[derive(Debug, Error)]
pub struct ClientAssemblyError {
    pub client_id: String,
    #[source]
    pub source: AssemblyError,
}

impl fmt::Display for ClientAssemblyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.source.names_client() {
            write!(f, "{}", self.source)
        } else {
            write!(f, "Client [{}]: {}", self.client_id, self.source)
        }
    }
}

/// Every client that failed during one registration pass
#[derive(Debug)]
pub struct RegistrationError {
    pub failures: Vec<ClientAssemblyError>,
}

impl RegistrationError {
    pub fn client_ids(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.client_id.as_str()).collect()
    }
}

impl fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} client(s) failed to assemble", self.failures.len())?;
        for failure in &self.failures {
            write!(f, "; {}", failure)?;
        }
        Ok(())
    }
}

impl std::error::Error for RegistrationError {}

/// Failure of a request issued through a facade or template
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid request uri: {0}")]
    InvalidUri(String),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("interceptor [{stage}] failed: {reason}")]
    Interceptor { stage: &'static str, reason: String },

    #[error("conversion failed: {0}")]
    Conversion(String),

    #[error("executor unavailable: {0}")]
    Executor(String),

    #[error("unexpected status {status}")]
    Status { status: StatusCode, body: Bytes },

    /// Marked by the transient fault plugin: safe to retry
    #[error("transient fault: {0}")]
    Transient(#[source] Box<HttpError>),

    /// Decorated by the stack trace plugin with the caller's backtrace
    #[error("{source}")]
    OriginalTrace {
        #[source]
        source: Box<HttpError>,
        trace: Box<Backtrace>,
    },
}

impl HttpError {
    pub fn interceptor(stage: &'static str, reason: impl fmt::Display) -> Self {
        Self::Interceptor {
            stage,
            reason: reason.to_string(),
        }
    }

    /// Whether any layer marked this failure as transient
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transient(_) => true,
            Self::OriginalTrace { source, .. } => source.is_transient(),
            _ => false,
        }
    }

    /// Backtrace of the call site, when the stack trace plugin captured one
    pub fn original_trace(&self) -> Option<&Backtrace> {
        match self {
            Self::OriginalTrace { trace, .. } => Some(&**trace),
            Self::Transient(inner) => inner.original_trace(),
            _ => None,
        }
    }

    /// The failure with plugin decorations removed
    pub fn root(&self) -> &HttpError {
        match self {
            Self::Transient(inner) => inner.root(),
            Self::OriginalTrace { source, .. } => source.root(),
            other => other,
        }
    }
}
