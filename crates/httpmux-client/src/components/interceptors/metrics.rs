use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Method, Request};

use super::{ExchangeContext, RequestInterceptor, ResponseInterceptor};
use crate::error::HttpError;
use crate::facade::HttpResponse;

/// One completed exchange as reported to the metrics collaborator
#[derive(Debug, Clone, PartialEq)]
pub struct RequestMetric {
    pub client_id: String,
    pub method: Method,
    pub host: String,
    pub status: u16,
    pub elapsed: Duration,
}

/// Receives timing samples; supplied by the application
pub trait MetricsCollector: Send + Sync {
    fn record(&self, metric: RequestMetric);
}

/// Starts the exchange timer
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsRequestInterceptor;

#[async_trait]
impl RequestInterceptor for MetricsRequestInterceptor {
    async fn intercept(
        &self,
        context: &mut ExchangeContext,
        _request: &mut Request,
    ) -> Result<(), HttpError> {
        context.timer = Some(Instant::now());
        Ok(())
    }
}

/// Reports the exchange once the response is in
#[derive(Clone)]
pub struct MetricsResponseInterceptor {
    collector: Arc<dyn MetricsCollector>,
}

impl MetricsResponseInterceptor {
    pub fn new(collector: Arc<dyn MetricsCollector>) -> Self {
        Self { collector }
    }

    pub fn collector(&self) -> &Arc<dyn MetricsCollector> {
        &self.collector
    }
}

#[async_trait]
impl ResponseInterceptor for MetricsResponseInterceptor {
    async fn intercept(
        &self,
        context: &ExchangeContext,
        response: &HttpResponse,
    ) -> Result<(), HttpError> {
        let Some(started) = context.timer else {
            return Ok(());
        };

        self.collector.record(RequestMetric {
            client_id: context.client_id.clone(),
            method: context.method.clone(),
            host: context.url.host_str().unwrap_or_default().to_string(),
            status: response.status().as_u16(),
            elapsed: started.elapsed(),
        });
        Ok(())
    }
}
