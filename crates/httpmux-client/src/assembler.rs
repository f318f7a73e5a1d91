//! Component Assembler
//!
//! Walks the fixed build order for one client and drives the [`Registry`]
//! at every step, so a component already built for this client, or shared
//! by all clients, is reused instead of rebuilt:
//!
//! ```text
//! RequestFactory ── HttpClient ── InterceptorChain ── [AccessTokens]
//!        └────────── taskExecutor
//! HttpMessageConverters ── ObjectMapper (scoped, else objectMapper)
//! Plugins ── Http ── SyncTemplate ── AsyncTemplate
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use httpmux_core::{ClientSettings, ConfigError, ResolvedSettings, Settings};
use tracing::debug;

use crate::collaborators::Collaborators;
use crate::components::interceptors::{
    AccessTokenInterceptor, AccessTokens, CredentialsProvider, DirectoryCredentialsProvider,
    GzipRequestInterceptor, MetricsRequestInterceptor, MetricsResponseInterceptor,
};
use crate::components::{
    HttpMessageConverters, HttpTransport, InterceptorChain, MessageConverter, ObjectMapper, Plugin,
    PluginKind, RequestFactory, RequestStage, ResponseStage, TaskExecutor,
};
use crate::error::AssemblyError;
use crate::facade::{AsyncTemplate, ClientFacade, Http, SyncTemplate};
use crate::registry::{ComponentKey, ComponentKind, Registry};

/// Assembles clients into a registry.
///
/// Holds no state of its own beyond borrowed inputs; one per registration
/// pass.
pub struct ComponentAssembler<'a> {
    registry: &'a Registry,
    settings: &'a Settings,
    collaborators: &'a Collaborators,
}

impl<'a> ComponentAssembler<'a> {
    pub fn new(
        registry: &'a Registry,
        settings: &'a Settings,
        collaborators: &'a Collaborators,
    ) -> Self {
        Self {
            registry,
            settings,
            collaborators,
        }
    }

    /// Build, or reuse, every component of `client_id` and return its facades
    pub fn assemble(
        &self,
        client_id: &str,
        client: &ClientSettings,
    ) -> Result<ClientFacade, AssemblyError> {
        let resolved = ResolvedSettings::resolve(client, &self.settings.defaults);
        resolved.validate(client_id)?;
        log_resolved(client_id, &resolved);
        let base_url = resolved.parsed_base_url(client_id)?;

        let factory = self.request_factory(client_id, &resolved)?;
        let converters = self.converters(client_id)?;
        let plugins = self.plugins(client_id, &resolved)?;

        let http = self.registry.register(
            ComponentKey::client(client_id, ComponentKind::Http),
            || {
                debug!("Client [{}]: Registering Http", client_id);
                Ok(Http::new(
                    client_id,
                    base_url.clone(),
                    factory.clone(),
                    converters.clone(),
                    plugins,
                ))
            },
        )?;
        let sync_template = self.registry.register(
            ComponentKey::client(client_id, ComponentKind::SyncTemplate),
            || {
                debug!("Client [{}]: Registering SyncTemplate", client_id);
                Ok(SyncTemplate::new(
                    client_id,
                    base_url.clone(),
                    factory.clone(),
                    converters.clone(),
                ))
            },
        )?;
        let async_template = self.registry.register(
            ComponentKey::client(client_id, ComponentKind::AsyncTemplate),
            || {
                debug!("Client [{}]: Registering AsyncTemplate", client_id);
                Ok(AsyncTemplate::new(
                    client_id,
                    base_url.clone(),
                    factory.clone(),
                    converters.clone(),
                ))
            },
        )?;

        Ok(ClientFacade {
            client_id: client_id.to_string(),
            http,
            sync_template,
            async_template,
        })
    }

    fn request_factory(
        &self,
        client_id: &str,
        resolved: &ResolvedSettings,
    ) -> Result<Arc<RequestFactory>, AssemblyError> {
        self.registry.register(
            ComponentKey::client(client_id, ComponentKind::RequestFactory),
            || {
                debug!("Client [{}]: Registering RequestFactory", client_id);
                let transport = self.http_client(client_id, resolved)?;
                let executor = self.executor()?;
                Ok(RequestFactory::new(transport, executor))
            },
        )
    }

    fn http_client(
        &self,
        client_id: &str,
        resolved: &ResolvedSettings,
    ) -> Result<Arc<HttpTransport>, AssemblyError> {
        self.registry.register(
            ComponentKey::client(client_id, ComponentKind::HttpClient),
            || {
                debug!("Client [{}]: Registering HttpClient", client_id);
                let interceptors = self.interceptors(client_id, resolved)?;
                let customizer = self.collaborators.customizer(client_id);
                if customizer.is_some() {
                    debug!("Client [{}]: Applying HttpClientCustomizer", client_id);
                }
                HttpTransport::build(
                    client_id,
                    resolved,
                    interceptors,
                    customizer.map(|c| &**c),
                )
            },
        )
    }

    fn executor(&self) -> Result<Arc<TaskExecutor>, AssemblyError> {
        self.registry
            .register_disposable(ComponentKey::global(ComponentKind::Executor), || {
                debug!("Registering shared TaskExecutor");
                TaskExecutor::new()
            })
    }

    fn interceptors(
        &self,
        client_id: &str,
        resolved: &ResolvedSettings,
    ) -> Result<InterceptorChain, AssemblyError> {
        let mut chain = InterceptorChain::default();

        if resolved.oauth.is_some() {
            debug!("Client [{}]: Registering AccessTokenInterceptor", client_id);
            let tokens = self.access_tokens(client_id)?;
            chain
                .first_request
                .push(RequestStage::AccessToken(AccessTokenInterceptor::new(client_id, tokens)));
        }
        chain
            .first_request
            .push(RequestStage::Tracing(self.collaborators.tracer_interceptor.clone()));

        if let Some(collector) = &self.collaborators.metrics {
            debug!("Client [{}]: Registering metrics interceptors", client_id);
            chain
                .first_request
                .push(RequestStage::Metrics(MetricsRequestInterceptor));
            chain
                .last_response
                .push(ResponseStage::Metrics(MetricsResponseInterceptor::new(collector.clone())));
        }

        chain.last_request.push(RequestStage::Logging(
            self.collaborators.logging_request_interceptor.clone(),
        ));
        chain.last_response.push(ResponseStage::Logging(
            self.collaborators.logging_response_interceptor.clone(),
        ));

        if resolved.compress_request {
            debug!("Client [{}]: Registering GzipRequestInterceptor", client_id);
            chain
                .last_request
                .push(RequestStage::Compression(GzipRequestInterceptor));
        }

        debug!(
            "Client [{}]: Request interceptors {:?}, response interceptors {:?}",
            client_id,
            chain.request_kinds(),
            chain.response_kinds()
        );
        Ok(chain)
    }

    /// Token source shared by every client with OAuth enabled
    fn access_tokens(&self, client_id: &str) -> Result<Arc<AccessTokens>, AssemblyError> {
        let oauth = self
            .settings
            .oauth
            .as_ref()
            .ok_or_else(|| ConfigError::missing_dependency(client_id, "oauth"))?;

        self.registry
            .register(ComponentKey::global(ComponentKind::AccessTokens), || {
                let credentials: Arc<dyn CredentialsProvider> =
                    match (&self.collaborators.credentials_provider, &oauth.credentials_directory) {
                        (Some(provider), _) => provider.clone(),
                        (None, Some(directory)) => {
                            Arc::new(DirectoryCredentialsProvider::new(directory.clone()))
                        }
                        (None, None) => {
                            return Err(ConfigError::missing_dependency(
                                client_id,
                                "oauth.credentialsDirectory",
                            )
                            .into())
                        }
                    };

                let scopes: HashMap<String, Vec<String>> = self
                    .settings
                    .clients
                    .iter()
                    .filter_map(|(id, client)| {
                        client.oauth.as_ref().map(|o| (id.clone(), o.scopes.clone()))
                    })
                    .collect();

                debug!(
                    "Registering shared AccessTokens for {} client(s) at {}",
                    scopes.len(),
                    oauth.access_token_url
                );
                AccessTokens::new(oauth, scopes, credentials)
            })
    }

    fn converters(&self, client_id: &str) -> Result<Arc<HttpMessageConverters>, AssemblyError> {
        self.registry.register(
            ComponentKey::client(client_id, ComponentKind::Converters),
            || {
                debug!("Client [{}]: Registering HttpMessageConverters", client_id);
                let mapper = self.object_mapper(client_id)?;
                Ok(HttpMessageConverters::new(vec![
                    MessageConverter::String {
                        write_accept_charset: false,
                    },
                    MessageConverter::Json {
                        mapper: mapper.clone(),
                    },
                    MessageConverter::Stream { mapper },
                ]))
            },
        )
    }

    /// The client's own mapper if one is registered, else the shared one
    fn object_mapper(&self, client_id: &str) -> Result<Arc<ObjectMapper>, AssemblyError> {
        let scoped = ComponentKey::client(client_id, ComponentKind::ObjectMapper);
        if let Some(mapper) = self.registry.get::<ObjectMapper>(&scoped) {
            debug!("Client [{}]: Using ObjectMapper [{}]", client_id, scoped);
            return Ok(mapper);
        }

        self.registry
            .register(ComponentKey::global(ComponentKind::ObjectMapper), || {
                debug!("Registering shared ObjectMapper");
                Ok(self
                    .collaborators
                    .object_mapper
                    .as_deref()
                    .cloned()
                    .unwrap_or_else(|| ObjectMapper::new("objectMapper")))
            })
    }

    fn plugins(
        &self,
        client_id: &str,
        resolved: &ResolvedSettings,
    ) -> Result<Vec<Arc<Plugin>>, AssemblyError> {
        let mut plugins = Vec::new();

        if resolved.keep_original_stack_trace {
            plugins.push(self.plugin(client_id, Plugin::OriginalStackTrace)?);
        }
        if resolved.detect_transient_faults {
            plugins.push(self.plugin(client_id, Plugin::TransientFault)?);
        }

        Ok(plugins)
    }

    fn plugin(&self, client_id: &str, plugin: Plugin) -> Result<Arc<Plugin>, AssemblyError> {
        let kind: PluginKind = plugin.kind();
        self.registry.register(
            ComponentKey::client(client_id, ComponentKind::Plugin(kind)),
            || {
                debug!("Client [{}]: Registering {:?} plugin", client_id, kind);
                Ok(plugin)
            },
        )
    }
}

fn log_resolved(client_id: &str, resolved: &ResolvedSettings) {
    let base_url = resolved.base_url.as_deref().unwrap_or("-");
    debug!("Client [{}]: Configuring baseUrl: [{}]", client_id, base_url);
    debug!(
        "Client [{}]: Configuring connectionTimeout: [{:?}]",
        client_id, resolved.connection_timeout
    );
    debug!(
        "Client [{}]: Configuring socketTimeout: [{:?}]",
        client_id, resolved.socket_timeout
    );
    debug!(
        "Client [{}]: Configuring connectionTimeToLive: [{:?}]",
        client_id, resolved.connection_time_to_live
    );
    debug!(
        "Client [{}]: Configuring maxConnectionsPerRoute: [{}]",
        client_id, resolved.max_connections_per_route
    );
    debug!(
        "Client [{}]: Configuring maxConnectionsTotal: [{}]",
        client_id, resolved.max_connections_total
    );
    debug!(
        "Client [{}]: Configuring compressRequest: [{}]",
        client_id, resolved.compress_request
    );
}
