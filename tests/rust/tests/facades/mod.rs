//! Facade integration tests
//!
//! Requests issued through assembled clients against wiremock servers.

mod plugins;
mod timeouts;
