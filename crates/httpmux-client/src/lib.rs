//! HttpMux Client
//!
//! Assembles one HTTP client per configured id:
//! - Idempotent component registry with per-client and shared keys
//! - Settings resolution against shared defaults
//! - Interceptor chains (OAuth, tracing, metrics, logging, gzip)
//! - One shared task executor for every exchange
//! - `Http` facade plus sync and async templates per client

pub mod assembler;
pub mod collaborators;
pub mod components;
pub mod error;
pub mod facade;
pub mod registrar;
pub mod registry;

pub use assembler::ComponentAssembler;
pub use collaborators::{Collaborators, CollaboratorsBuilder};
pub use error::{AssemblyError, ClientAssemblyError, HttpError, RegistrationError};
pub use facade::{
    AsyncTemplate, ClientFacade, Http, HttpRequestBuilder, HttpResponse, SyncTemplate,
    UriTemplateHandler,
};
pub use registrar::{HttpClients, Registrar};
pub use registry::{ComponentKey, ComponentKind, Dispose, Registry, Scope};

// Components
pub use components::interceptors::{
    AccessTokens, CredentialsProvider, ExchangeContext, MetricsCollector, RequestInterceptor,
    RequestMetric, ResponseInterceptor,
};
pub use components::{
    HttpClientCustomizer, HttpMessageConverters, InterceptorKind, ObjectMapper, Plugin, PluginKind,
    RequestFactory, TaskExecutor,
};

pub use httpmux_core::{ClientSettings, ConfigError, Defaults, Settings};
