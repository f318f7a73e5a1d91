//! Template-style clients
//!
//! `AsyncTemplate` and `SyncTemplate` expose the same operations; the sync
//! one blocks the calling thread until the exchange, which runs on the
//! shared executor, completes. Non-2xx responses become
//! [`HttpError::Status`].

use std::sync::Arc;

use bytes::Bytes;
use futures::executor::block_on;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Body, Method, Request};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use super::HttpResponse;
use crate::components::{HttpMessageConverters, RequestFactory};
use crate::error::HttpError;

/// Expands `{name}` placeholders and resolves the result against a base URL
#[derive(Debug, Clone, Default)]
pub struct UriTemplateHandler {
    base_url: Option<Url>,
}

impl UriTemplateHandler {
    pub fn new(base_url: Option<Url>) -> Self {
        Self { base_url }
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    /// Fill placeholders positionally, percent-encoding each value
    pub fn expand(&self, template: &str, vars: &[&str]) -> Result<Url, HttpError> {
        let mut expanded = String::with_capacity(template.len());
        let mut values = vars.iter();
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            let close = rest[open..]
                .find('}')
                .map(|i| open + i)
                .ok_or_else(|| HttpError::InvalidUri(format!("unclosed placeholder in {}", template)))?;
            let value = values.next().ok_or_else(|| {
                HttpError::InvalidUri(format!(
                    "no value for placeholder {} in {}",
                    &rest[open..=close],
                    template
                ))
            })?;
            expanded.push_str(&rest[..open]);
            expanded.push_str(&urlencoding::encode(value));
            rest = &rest[close + 1..];
        }
        expanded.push_str(rest);

        self.resolve(&expanded)
    }

    /// Absolute URLs are kept; anything else is appended to the base URL
    pub fn resolve(&self, path: &str) -> Result<Url, HttpError> {
        if let Ok(absolute) = Url::parse(path) {
            return Ok(absolute);
        }

        let base = self.base_url.as_ref().ok_or_else(|| {
            HttpError::InvalidUri(format!("relative uri {} without a base url", path))
        })?;
        let joined = format!(
            "{}/{}",
            base.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&joined).map_err(|e| HttpError::InvalidUri(format!("{}: {}", joined, e)))
    }
}

struct TemplateCore {
    client_id: String,
    factory: Arc<RequestFactory>,
    converters: Arc<HttpMessageConverters>,
    uris: UriTemplateHandler,
}

impl TemplateCore {
    async fn exchange(
        &self,
        method: Method,
        template: &str,
        vars: &[&str],
        mut headers: HeaderMap,
        body: Option<Bytes>,
    ) -> Result<HttpResponse, HttpError> {
        let url = self.uris.expand(template, vars)?;
        if !headers.contains_key(ACCEPT) {
            if let Ok(accept) = HeaderValue::from_str(&self.converters.accept()) {
                headers.insert(ACCEPT, accept);
            }
        }

        let mut request = Request::new(method, url);
        *request.headers_mut() = headers;
        *request.body_mut() = body.map(Body::from);

        self.factory.execute(request).await?.error_for_status()
    }

    async fn get_for_object<T: DeserializeOwned>(
        &self,
        template: &str,
        vars: &[&str],
    ) -> Result<T, HttpError> {
        let response = self
            .exchange(Method::GET, template, vars, HeaderMap::new(), None)
            .await?;
        self.converters.read_json(response.body())
    }

    async fn get_for_string(&self, template: &str, vars: &[&str]) -> Result<String, HttpError> {
        let response = self
            .exchange(Method::GET, template, vars, HeaderMap::new(), None)
            .await?;
        self.converters.read_string(response.body())
    }

    async fn post_for_object<B, T>(
        &self,
        template: &str,
        vars: &[&str],
        body: &B,
    ) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut headers = HeaderMap::new();
        let body = self.converters.write_json(body, &mut headers)?;
        let response = self
            .exchange(Method::POST, template, vars, headers, Some(body))
            .await?;
        self.converters.read_json(response.body())
    }

    async fn put<B: Serialize + ?Sized>(
        &self,
        template: &str,
        vars: &[&str],
        body: &B,
    ) -> Result<(), HttpError> {
        let mut headers = HeaderMap::new();
        let body = self.converters.write_json(body, &mut headers)?;
        self.exchange(Method::PUT, template, vars, headers, Some(body))
            .await
            .map(|_| ())
    }

    async fn delete(&self, template: &str, vars: &[&str]) -> Result<(), HttpError> {
        self.exchange(Method::DELETE, template, vars, HeaderMap::new(), None)
            .await
            .map(|_| ())
    }
}

pub struct AsyncTemplate {
    core: TemplateCore,
}

impl AsyncTemplate {
    pub fn new(
        client_id: impl Into<String>,
        base_url: Option<Url>,
        factory: Arc<RequestFactory>,
        converters: Arc<HttpMessageConverters>,
    ) -> Self {
        Self {
            core: TemplateCore {
                client_id: client_id.into(),
                factory,
                converters,
                uris: UriTemplateHandler::new(base_url),
            },
        }
    }

    pub fn client_id(&self) -> &str {
        &self.core.client_id
    }

    pub fn factory(&self) -> &Arc<RequestFactory> {
        &self.core.factory
    }

    pub fn uri_template_handler(&self) -> &UriTemplateHandler {
        &self.core.uris
    }

    pub async fn get_for_object<T: DeserializeOwned>(
        &self,
        template: &str,
        vars: &[&str],
    ) -> Result<T, HttpError> {
        self.core.get_for_object(template, vars).await
    }

    pub async fn get_for_string(&self, template: &str, vars: &[&str]) -> Result<String, HttpError> {
        self.core.get_for_string(template, vars).await
    }

    pub async fn post_for_object<B, T>(
        &self,
        template: &str,
        vars: &[&str],
        body: &B,
    ) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.core.post_for_object(template, vars, body).await
    }

    pub async fn put<B: Serialize + ?Sized>(
        &self,
        template: &str,
        vars: &[&str],
        body: &B,
    ) -> Result<(), HttpError> {
        self.core.put(template, vars, body).await
    }

    pub async fn delete(&self, template: &str, vars: &[&str]) -> Result<(), HttpError> {
        self.core.delete(template, vars).await
    }

    pub async fn exchange(
        &self,
        method: Method,
        template: &str,
        vars: &[&str],
        body: Option<Bytes>,
    ) -> Result<HttpResponse, HttpError> {
        self.core
            .exchange(method, template, vars, HeaderMap::new(), body)
            .await
    }
}

pub struct SyncTemplate {
    core: TemplateCore,
}

impl SyncTemplate {
    pub fn new(
        client_id: impl Into<String>,
        base_url: Option<Url>,
        factory: Arc<RequestFactory>,
        converters: Arc<HttpMessageConverters>,
    ) -> Self {
        Self {
            core: TemplateCore {
                client_id: client_id.into(),
                factory,
                converters,
                uris: UriTemplateHandler::new(base_url),
            },
        }
    }

    pub fn client_id(&self) -> &str {
        &self.core.client_id
    }

    pub fn factory(&self) -> &Arc<RequestFactory> {
        &self.core.factory
    }

    pub fn uri_template_handler(&self) -> &UriTemplateHandler {
        &self.core.uris
    }

    pub fn get_for_object<T: DeserializeOwned>(
        &self,
        template: &str,
        vars: &[&str],
    ) -> Result<T, HttpError> {
        block_on(self.core.get_for_object(template, vars))
    }

    pub fn get_for_string(&self, template: &str, vars: &[&str]) -> Result<String, HttpError> {
        block_on(self.core.get_for_string(template, vars))
    }

    pub fn post_for_object<B, T>(&self, template: &str, vars: &[&str], body: &B) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        block_on(self.core.post_for_object(template, vars, body))
    }

    pub fn put<B: Serialize + ?Sized>(
        &self,
        template: &str,
        vars: &[&str],
        body: &B,
    ) -> Result<(), HttpError> {
        block_on(self.core.put(template, vars, body))
    }

    pub fn delete(&self, template: &str, vars: &[&str]) -> Result<(), HttpError> {
        block_on(self.core.delete(template, vars))
    }

    pub fn exchange(
        &self,
        method: Method,
        template: &str,
        vars: &[&str],
        body: Option<Bytes>,
    ) -> Result<HttpResponse, HttpError> {
        block_on(
            self.core
                .exchange(method, template, vars, HeaderMap::new(), body),
        )
    }
}
