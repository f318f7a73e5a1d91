//! Built-in tracer and logging interceptors
//!
//! Applications may supply their own; these are what
//! `CollaboratorsBuilder::with_default_interceptors` installs.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use reqwest::header::HeaderValue;
use reqwest::{Body, Request};
use tracing::info;

use super::{ExchangeContext, RequestInterceptor, ResponseInterceptor};
use crate::error::HttpError;
use crate::facade::HttpResponse;

pub const TRACE_ID_HEADER: &str = "x-trace-id";

/// Stamps outgoing requests with an `X-Trace-ID` header unless one is set.
///
/// IDs are 8 hex characters: a per-instance prefix followed by a sequence
/// number, so IDs issued by one interceptor never repeat within 65536 calls.
#[derive(Debug)]
pub struct TraceIdInterceptor {
    prefix: u16,
    issued: AtomicU32,
}

impl TraceIdInterceptor {
    pub fn new() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.subsec_nanos())
            .unwrap_or_default();
        Self {
            prefix: (nanos >> 8) as u16,
            issued: AtomicU32::new(0),
        }
    }

    pub fn next_id(&self) -> String {
        let sequence = self.issued.fetch_add(1, Ordering::Relaxed) as u16;
        format!("{:04x}{:04x}", self.prefix, sequence)
    }
}

impl Default for TraceIdInterceptor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RequestInterceptor for TraceIdInterceptor {
    async fn intercept(
        &self,
        _context: &mut ExchangeContext,
        request: &mut Request,
    ) -> Result<(), HttpError> {
        if !request.headers().contains_key(TRACE_ID_HEADER) {
            let value = HeaderValue::from_str(&self.next_id())
                .map_err(|e| HttpError::interceptor("Tracing", e))?;
            request.headers_mut().insert(TRACE_ID_HEADER, value);
        }
        Ok(())
    }
}

/// One consolidated line per outgoing request
#[derive(Debug, Default)]
pub struct LogbookRequestInterceptor;

#[async_trait]
impl RequestInterceptor for LogbookRequestInterceptor {
    async fn intercept(
        &self,
        context: &mut ExchangeContext,
        request: &mut Request,
    ) -> Result<(), HttpError> {
        let trace_id = request
            .headers()
            .get(TRACE_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");
        let body_len = request
            .body()
            .and_then(Body::as_bytes)
            .map(<[u8]>::len)
            .unwrap_or(0);

        info!(
            trace_id = %trace_id,
            client = %context.client_id,
            "→ {} {} ({} bytes)",
            context.method,
            context.url,
            body_len
        );
        Ok(())
    }
}

/// One consolidated line per received response
#[derive(Debug, Default)]
pub struct LogbookResponseInterceptor;

#[async_trait]
impl ResponseInterceptor for LogbookResponseInterceptor {
    async fn intercept(
        &self,
        context: &ExchangeContext,
        response: &HttpResponse,
    ) -> Result<(), HttpError> {
        info!(
            client = %context.client_id,
            "← {} {} {} ({}ms)",
            response.status().as_u16(),
            context.method,
            context.url,
            context.elapsed_ms()
        );
        Ok(())
    }
}
