//! # HttpMux Core Library
//!
//! Settings model for HttpMux: the parsed configuration of every named
//! HTTP client and the global defaults they fall back to.
//!
//! ## Modules
//!
//! - `domain` - Settings documents, time spans and per-client resolution
//! - `error` - Configuration errors

pub mod domain;
pub mod error;

// Re-export commonly used types
pub use domain::*;
pub use error::ConfigError;
