//! Assembly integration tests
//!
//! Registry semantics, shared components and interceptor wiring across
//! whole registration passes.

mod interceptors;
mod registry;
mod sharing;
