//! HTTP transport
//!
//! The per-client HTTP client: a `reqwest::Client` configured from resolved
//! settings, the client's interceptor chain, and semaphores enforcing the
//! total and per-route connection limits.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use httpmux_core::{Keystore, ResolvedSettings};
use reqwest::{Certificate, ClientBuilder, Request};
use tokio::sync::Semaphore;
use tracing::debug;

use super::interceptors::{ExchangeContext, InterceptorChain};
use crate::error::{AssemblyError, HttpError};
use crate::facade::HttpResponse;

/// Last-step adjustment of a client's `reqwest` builder, supplied per client
pub trait HttpClientCustomizer: Send + Sync {
    fn customize(&self, builder: ClientBuilder) -> ClientBuilder;
}

/// Connection settings the transport was built with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionLimits {
    pub connection_timeout: Duration,
    pub socket_timeout: Duration,
    pub connection_time_to_live: Duration,
    pub max_connections_per_route: u32,
    pub max_connections_total: u32,
}

impl From<&ResolvedSettings> for ConnectionLimits {
    fn from(settings: &ResolvedSettings) -> Self {
        Self {
            connection_timeout: settings.connection_timeout,
            socket_timeout: settings.socket_timeout,
            connection_time_to_live: settings.connection_time_to_live,
            max_connections_per_route: settings.max_connections_per_route,
            max_connections_total: settings.max_connections_total,
        }
    }
}

pub struct HttpTransport {
    client_id: String,
    client: reqwest::Client,
    interceptors: InterceptorChain,
    limits: ConnectionLimits,
    trusts_keystore: bool,
    customized: bool,
    total_permits: Arc<Semaphore>,
    route_permits: DashMap<String, Arc<Semaphore>>,
}

impl HttpTransport {
    pub fn build(
        client_id: &str,
        settings: &ResolvedSettings,
        interceptors: InterceptorChain,
        customizer: Option<&dyn HttpClientCustomizer>,
    ) -> Result<Self, AssemblyError> {
        let limits = ConnectionLimits::from(settings);

        let mut builder = reqwest::Client::builder()
            .connect_timeout(limits.connection_timeout)
            .read_timeout(limits.socket_timeout)
            .pool_idle_timeout(limits.connection_time_to_live)
            .pool_max_idle_per_host(limits.max_connections_per_route as usize);

        if let Some(keystore) = &settings.keystore {
            builder = builder.add_root_certificate(load_certificate(keystore)?);
        }
        if let Some(customizer) = customizer {
            builder = customizer.customize(builder);
        }

        let client = builder
            .build()
            .map_err(|e| AssemblyError::construction("HttpClient", e))?;

        Ok(Self {
            client_id: client_id.to_string(),
            client,
            interceptors,
            limits,
            trusts_keystore: settings.keystore.is_some(),
            customized: customizer.is_some(),
            total_permits: Arc::new(Semaphore::new(limits.max_connections_total as usize)),
            route_permits: DashMap::new(),
        })
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn interceptors(&self) -> &InterceptorChain {
        &self.interceptors
    }

    pub fn limits(&self) -> ConnectionLimits {
        self.limits
    }

    pub fn trusts_keystore(&self) -> bool {
        self.trusts_keystore
    }

    pub fn is_customized(&self) -> bool {
        self.customized
    }

    fn route_semaphore(&self, request: &Request) -> Arc<Semaphore> {
        let url = request.url();
        let route = format!(
            "{}:{}",
            url.host_str().unwrap_or_default(),
            url.port_or_known_default().unwrap_or_default()
        );
        self.route_permits
            .entry(route)
            .or_insert_with(|| {
                Arc::new(Semaphore::new(self.limits.max_connections_per_route as usize))
            })
            .clone()
    }

    /// Run one exchange: request interceptors, send, buffer the body,
    /// response interceptors
    pub async fn execute(&self, mut request: Request) -> Result<HttpResponse, HttpError> {
        let mut context = ExchangeContext::new(&self.client_id, &request);
        self.interceptors.before_send(&mut context, &mut request).await?;

        let route = self.route_semaphore(&request);
        let _total = self
            .total_permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| HttpError::Executor(e.to_string()))?;
        let _route = route
            .acquire_owned()
            .await
            .map_err(|e| HttpError::Executor(e.to_string()))?;

        let response = self.client.execute(request).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;
        let response = HttpResponse::new(status, headers, body);

        self.interceptors.after_receive(&context, &response).await?;
        Ok(response)
    }
}

fn load_certificate(keystore: &Keystore) -> Result<Certificate, AssemblyError> {
    debug!("Loading trusted keystore from {}", keystore.path.display());
    let pem = std::fs::read(&keystore.path).map_err(|e| {
        AssemblyError::construction(
            "HttpClient",
            format!("cannot read keystore {}: {}", keystore.path.display(), e),
        )
    })?;
    Certificate::from_pem(&pem).map_err(|e| {
        AssemblyError::construction(
            "HttpClient",
            format!("invalid keystore {}: {}", keystore.path.display(), e),
        )
    })
}
