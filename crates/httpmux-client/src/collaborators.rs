//! Collaborators supplied by the application
//!
//! Everything the assembler consumes but does not build itself. Optional
//! collaborators are explicit `Option`s; the assembler branches on their
//! presence instead of looking them up by name.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use httpmux_core::ConfigError;

use crate::components::interceptors::{
    CredentialsProvider, LogbookRequestInterceptor, LogbookResponseInterceptor, MetricsCollector,
    RequestInterceptor, ResponseInterceptor, TraceIdInterceptor,
};
use crate::components::{HttpClientCustomizer, ObjectMapper};

#[derive(Clone)]
pub struct Collaborators {
    pub tracer_interceptor: Arc<dyn RequestInterceptor>,
    pub logging_request_interceptor: Arc<dyn RequestInterceptor>,
    pub logging_response_interceptor: Arc<dyn ResponseInterceptor>,
    /// Metrics interceptors are only wired when present
    pub metrics: Option<Arc<dyn MetricsCollector>>,
    /// Shared mapper, registered under the global `objectMapper` key
    pub object_mapper: Option<Arc<ObjectMapper>>,
    /// Per-client mappers, preferred over the shared one
    pub client_object_mappers: HashMap<String, Arc<ObjectMapper>>,
    pub customizers: HashMap<String, Arc<dyn HttpClientCustomizer>>,
    /// Overrides the `credentialsDirectory` of the OAuth settings
    pub credentials_provider: Option<Arc<dyn CredentialsProvider>>,
}

impl Collaborators {
    pub fn builder() -> CollaboratorsBuilder {
        CollaboratorsBuilder::new()
    }

    pub fn customizer(&self, client_id: &str) -> Option<&Arc<dyn HttpClientCustomizer>> {
        self.customizers.get(client_id)
    }
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut mapper_ids: Vec<_> = self.client_object_mappers.keys().collect();
        mapper_ids.sort();
        let mut customizer_ids: Vec<_> = self.customizers.keys().collect();
        customizer_ids.sort();

        f.debug_struct("Collaborators")
            .field("metrics", &self.metrics.is_some())
            .field("object_mapper", &self.object_mapper.as_ref().map(|m| m.name()))
            .field("client_object_mappers", &mapper_ids)
            .field("customizers", &customizer_ids)
            .field("credentials_provider", &self.credentials_provider.is_some())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Collaborators`]
#[derive(Default)]
pub struct CollaboratorsBuilder {
    tracer_interceptor: Option<Arc<dyn RequestInterceptor>>,
    logging_request_interceptor: Option<Arc<dyn RequestInterceptor>>,
    logging_response_interceptor: Option<Arc<dyn ResponseInterceptor>>,
    metrics: Option<Arc<dyn MetricsCollector>>,
    object_mapper: Option<Arc<ObjectMapper>>,
    client_object_mappers: HashMap<String, Arc<ObjectMapper>>,
    customizers: HashMap<String, Arc<dyn HttpClientCustomizer>>,
    credentials_provider: Option<Arc<dyn CredentialsProvider>>,
}

impl CollaboratorsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the built-in trace id and logbook interceptors for any
    /// interceptor not yet set
    pub fn with_default_interceptors(mut self) -> Self {
        self.tracer_interceptor
            .get_or_insert_with(|| Arc::new(TraceIdInterceptor::new()));
        self.logging_request_interceptor
            .get_or_insert_with(|| Arc::new(LogbookRequestInterceptor));
        self.logging_response_interceptor
            .get_or_insert_with(|| Arc::new(LogbookResponseInterceptor));
        self
    }

    pub fn with_tracer_interceptor(mut self, interceptor: Arc<dyn RequestInterceptor>) -> Self {
        self.tracer_interceptor = Some(interceptor);
        self
    }

    pub fn with_logging_interceptors(
        mut self,
        request: Arc<dyn RequestInterceptor>,
        response: Arc<dyn ResponseInterceptor>,
    ) -> Self {
        self.logging_request_interceptor = Some(request);
        self.logging_response_interceptor = Some(response);
        self
    }

    pub fn with_metrics(mut self, collector: Arc<dyn MetricsCollector>) -> Self {
        self.metrics = Some(collector);
        self
    }

    pub fn with_object_mapper(mut self, mapper: Arc<ObjectMapper>) -> Self {
        self.object_mapper = Some(mapper);
        self
    }

    pub fn with_client_object_mapper(
        mut self,
        client_id: impl Into<String>,
        mapper: Arc<ObjectMapper>,
    ) -> Self {
        self.client_object_mappers.insert(client_id.into(), mapper);
        self
    }

    pub fn with_customizer(
        mut self,
        client_id: impl Into<String>,
        customizer: Arc<dyn HttpClientCustomizer>,
    ) -> Self {
        self.customizers.insert(client_id.into(), customizer);
        self
    }

    pub fn with_credentials_provider(mut self, provider: Arc<dyn CredentialsProvider>) -> Self {
        self.credentials_provider = Some(provider);
        self
    }

    pub fn build(self) -> Result<Collaborators, ConfigError> {
        let tracer_interceptor = self.tracer_interceptor.ok_or_else(|| missing("tracerInterceptor"))?;
        let logging_request_interceptor = self
            .logging_request_interceptor
            .ok_or_else(|| missing("loggingRequestInterceptor"))?;
        let logging_response_interceptor = self
            .logging_response_interceptor
            .ok_or_else(|| missing("loggingResponseInterceptor"))?;

        Ok(Collaborators {
            tracer_interceptor,
            logging_request_interceptor,
            logging_response_interceptor,
            metrics: self.metrics,
            object_mapper: self.object_mapper,
            client_object_mappers: self.client_object_mappers,
            customizers: self.customizers,
            credentials_provider: self.credentials_provider,
        })
    }
}

fn missing(name: &str) -> ConfigError {
    ConfigError::MissingCollaborator {
        name: name.to_string(),
    }
}
