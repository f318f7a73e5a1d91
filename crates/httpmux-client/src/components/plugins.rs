//! Facade plugins
//!
//! Plugins decorate failures of requests issued through the [`Http`] facade.
//!
//! [`Http`]: crate::facade::Http

use std::backtrace::Backtrace;

use crate::error::HttpError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluginKind {
    OriginalStackTrace,
    TransientFault,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plugin {
    /// Attach the caller's backtrace; the exchange itself runs on the
    /// executor, so the failure's own stack says nothing about the caller
    OriginalStackTrace,
    /// Mark connect failures and timeouts as transient
    TransientFault,
}

impl Plugin {
    pub fn kind(&self) -> PluginKind {
        match self {
            Self::OriginalStackTrace => PluginKind::OriginalStackTrace,
            Self::TransientFault => PluginKind::TransientFault,
        }
    }

    /// Hook run on the caller's thread before the exchange is dispatched
    pub fn prepare(&self, call_site: &mut Option<Backtrace>) {
        if matches!(self, Self::OriginalStackTrace) && call_site.is_none() {
            *call_site = Some(Backtrace::force_capture());
        }
    }

    pub fn apply(&self, error: HttpError, call_site: &mut Option<Backtrace>) -> HttpError {
        match self {
            Self::OriginalStackTrace => match call_site.take() {
                Some(trace) => HttpError::OriginalTrace {
                    source: Box::new(error),
                    trace: Box::new(trace),
                },
                None => error,
            },
            Self::TransientFault if !error.is_transient() && is_transient_fault(error.root()) => {
                HttpError::Transient(Box::new(error))
            }
            Self::TransientFault => error,
        }
    }
}

fn is_transient_fault(error: &HttpError) -> bool {
    match error {
        HttpError::Transport(e) => e.is_connect() || e.is_timeout(),
        _ => false,
    }
}
