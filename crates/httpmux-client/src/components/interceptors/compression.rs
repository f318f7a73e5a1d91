use std::io::Write;

use async_trait::async_trait;
use flate2::write::GzEncoder;
use flate2::Compression;
use reqwest::header::{HeaderValue, CONTENT_ENCODING, CONTENT_LENGTH};
use reqwest::{Body, Request};
use tracing::debug;

use super::{ExchangeContext, RequestInterceptor};
use crate::error::HttpError;

/// Gzips buffered request bodies and marks them with `Content-Encoding: gzip`.
///
/// Streaming bodies and requests without a body pass through untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct GzipRequestInterceptor;

impl GzipRequestInterceptor {
    fn compress(bytes: &[u8]) -> std::io::Result<Vec<u8>> {
        let mut encoder = GzEncoder::new(Vec::with_capacity(bytes.len() / 2), Compression::default());
        encoder.write_all(bytes)?;
        encoder.finish()
    }
}

#[async_trait]
impl RequestInterceptor for GzipRequestInterceptor {
    async fn intercept(
        &self,
        context: &mut ExchangeContext,
        request: &mut Request,
    ) -> Result<(), HttpError> {
        let Some(bytes) = request.body().and_then(Body::as_bytes) else {
            return Ok(());
        };
        if request.headers().contains_key(CONTENT_ENCODING) {
            return Ok(());
        }

        let compressed =
            Self::compress(bytes).map_err(|e| HttpError::interceptor("Compression", e))?;
        debug!(
            "Client [{}]: Compressed request body {} → {} bytes",
            context.client_id,
            bytes.len(),
            compressed.len()
        );

        *request.body_mut() = Some(Body::from(compressed));
        let headers = request.headers_mut();
        headers.remove(CONTENT_LENGTH);
        headers.insert(CONTENT_ENCODING, HeaderValue::from_static("gzip"));
        Ok(())
    }
}
