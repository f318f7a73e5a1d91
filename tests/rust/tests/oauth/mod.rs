//! OAuth integration tests
//!
//! Client-credentials tokens fetched through the shared token source and
//! attached by the access token interceptor.

mod tokens;
