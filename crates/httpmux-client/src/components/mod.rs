//! Components a client is assembled from
//!
//! Leaves first: the shared [`TaskExecutor`], the per-client
//! [`HttpTransport`] with its [`InterceptorChain`], the [`RequestFactory`]
//! tying the two together, plus converters and plugins used by the facades.

pub mod converters;
mod executor;
mod factory;
pub mod interceptors;
mod plugins;
mod transport;

pub use converters::{ConverterKind, HttpMessageConverters, MessageConverter, ObjectMapper};
pub use executor::TaskExecutor;
pub use factory::RequestFactory;
pub use interceptors::{InterceptorChain, InterceptorKind, RequestStage, ResponseStage};
pub use plugins::{Plugin, PluginKind};
pub use transport::{ConnectionLimits, HttpClientCustomizer, HttpTransport};
