//! Interceptor chain
//!
//! Request interceptors run in two groups, first then last:
//!
//! ```text
//! first: [AccessToken] → Tracing → [MetricsRequest]
//! last:  Logging → [Compression]
//! response: [MetricsResponse] → Logging
//! ```
//!
//! Compression runs after logging, so logging always sees the uncompressed
//! body. Stages supplied by the application are trait objects; the built-in
//! ones are concrete types behind the same tagged variants.

mod compression;
mod logging;
mod metrics;
mod oauth;

pub use compression::GzipRequestInterceptor;
pub use logging::{
    LogbookRequestInterceptor, LogbookResponseInterceptor, TraceIdInterceptor, TRACE_ID_HEADER,
};
pub use metrics::{
    MetricsCollector, MetricsRequestInterceptor, MetricsResponseInterceptor, RequestMetric,
};
pub use oauth::{
    AccessTokenInterceptor, AccessTokens, ClientCredentials, CredentialsProvider,
    DirectoryCredentialsProvider,
};

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use reqwest::{Method, Request};
use url::Url;

use crate::error::HttpError;
use crate::facade::HttpResponse;

/// Per-exchange state shared by the request and response interceptors
#[derive(Debug, Clone)]
pub struct ExchangeContext {
    pub client_id: String,
    pub method: Method,
    pub url: Url,
    pub started_at: Instant,
    /// Set by the metrics request interceptor
    pub timer: Option<Instant>,
}

impl ExchangeContext {
    pub fn new(client_id: &str, request: &Request) -> Self {
        Self {
            client_id: client_id.to_string(),
            method: request.method().clone(),
            url: request.url().clone(),
            started_at: Instant::now(),
            timer: None,
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.started_at.elapsed().as_millis() as u64
    }
}

#[async_trait]
pub trait RequestInterceptor: Send + Sync {
    async fn intercept(
        &self,
        context: &mut ExchangeContext,
        request: &mut Request,
    ) -> Result<(), HttpError>;
}

#[async_trait]
pub trait ResponseInterceptor: Send + Sync {
    async fn intercept(
        &self,
        context: &ExchangeContext,
        response: &HttpResponse,
    ) -> Result<(), HttpError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterceptorKind {
    AccessToken,
    Tracing,
    MetricsRequest,
    MetricsResponse,
    Logging,
    Compression,
}

#[derive(Clone)]
pub enum RequestStage {
    AccessToken(AccessTokenInterceptor),
    Tracing(Arc<dyn RequestInterceptor>),
    Metrics(MetricsRequestInterceptor),
    Logging(Arc<dyn RequestInterceptor>),
    Compression(GzipRequestInterceptor),
}

impl RequestStage {
    pub fn kind(&self) -> InterceptorKind {
        match self {
            Self::AccessToken(_) => InterceptorKind::AccessToken,
            Self::Tracing(_) => InterceptorKind::Tracing,
            Self::Metrics(_) => InterceptorKind::MetricsRequest,
            Self::Logging(_) => InterceptorKind::Logging,
            Self::Compression(_) => InterceptorKind::Compression,
        }
    }

    async fn apply(
        &self,
        context: &mut ExchangeContext,
        request: &mut Request,
    ) -> Result<(), HttpError> {
        match self {
            Self::AccessToken(interceptor) => interceptor.intercept(context, request).await,
            Self::Tracing(interceptor) | Self::Logging(interceptor) => {
                interceptor.intercept(context, request).await
            }
            Self::Metrics(interceptor) => interceptor.intercept(context, request).await,
            Self::Compression(interceptor) => interceptor.intercept(context, request).await,
        }
    }
}

#[derive(Clone)]
pub enum ResponseStage {
    Metrics(MetricsResponseInterceptor),
    Logging(Arc<dyn ResponseInterceptor>),
}

impl ResponseStage {
    pub fn kind(&self) -> InterceptorKind {
        match self {
            Self::Metrics(_) => InterceptorKind::MetricsResponse,
            Self::Logging(_) => InterceptorKind::Logging,
        }
    }

    async fn apply(
        &self,
        context: &ExchangeContext,
        response: &HttpResponse,
    ) -> Result<(), HttpError> {
        match self {
            Self::Metrics(interceptor) => interceptor.intercept(context, response).await,
            Self::Logging(interceptor) => interceptor.intercept(context, response).await,
        }
    }
}

/// Ordered interceptor groups of one HTTP client
#[derive(Clone, Default)]
pub struct InterceptorChain {
    pub first_request: Vec<RequestStage>,
    pub last_request: Vec<RequestStage>,
    pub last_response: Vec<ResponseStage>,
}

impl InterceptorChain {
    /// Request stages in execution order
    pub fn request_stages(&self) -> impl Iterator<Item = &RequestStage> {
        self.first_request.iter().chain(self.last_request.iter())
    }

    pub fn request_kinds(&self) -> Vec<InterceptorKind> {
        self.request_stages().map(RequestStage::kind).collect()
    }

    pub fn response_kinds(&self) -> Vec<InterceptorKind> {
        self.last_response.iter().map(ResponseStage::kind).collect()
    }

    pub async fn before_send(
        &self,
        context: &mut ExchangeContext,
        request: &mut Request,
    ) -> Result<(), HttpError> {
        for stage in self.request_stages() {
            stage.apply(context, request).await?;
        }
        Ok(())
    }

    pub async fn after_receive(
        &self,
        context: &ExchangeContext,
        response: &HttpResponse,
    ) -> Result<(), HttpError> {
        for stage in &self.last_response {
            stage.apply(context, response).await?;
        }
        Ok(())
    }
}
