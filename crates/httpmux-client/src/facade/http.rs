use std::sync::Arc;

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use reqwest::{Body, Method, Request};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use super::{HttpResponse, UriTemplateHandler};
use crate::components::{HttpMessageConverters, Plugin, RequestFactory};
use crate::error::HttpError;

/// Request facade of one client.
///
/// Paths are resolved against the client's base URL; absolute URLs are used
/// as given. Failures pass through the client's plugins in order.
pub struct Http {
    client_id: String,
    uris: UriTemplateHandler,
    factory: Arc<RequestFactory>,
    converters: Arc<HttpMessageConverters>,
    plugins: Vec<Arc<Plugin>>,
}

impl Http {
    pub fn new(
        client_id: impl Into<String>,
        base_url: Option<Url>,
        factory: Arc<RequestFactory>,
        converters: Arc<HttpMessageConverters>,
        plugins: Vec<Arc<Plugin>>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            uris: UriTemplateHandler::new(base_url),
            factory,
            converters,
            plugins,
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.uris.base_url()
    }

    pub fn factory(&self) -> &Arc<RequestFactory> {
        &self.factory
    }

    pub fn converters(&self) -> &Arc<HttpMessageConverters> {
        &self.converters
    }

    pub fn plugins(&self) -> Vec<Plugin> {
        self.plugins.iter().map(|p| **p).collect()
    }

    pub fn request(&self, method: Method, path: &str) -> HttpRequestBuilder<'_> {
        HttpRequestBuilder {
            http: self,
            method,
            url: self.uris.resolve(path),
            headers: HeaderMap::new(),
            body: Ok(None),
        }
    }

    pub fn get(&self, path: &str) -> HttpRequestBuilder<'_> {
        self.request(Method::GET, path)
    }

    pub fn head(&self, path: &str) -> HttpRequestBuilder<'_> {
        self.request(Method::HEAD, path)
    }

    pub fn post(&self, path: &str) -> HttpRequestBuilder<'_> {
        self.request(Method::POST, path)
    }

    pub fn put(&self, path: &str) -> HttpRequestBuilder<'_> {
        self.request(Method::PUT, path)
    }

    pub fn patch(&self, path: &str) -> HttpRequestBuilder<'_> {
        self.request(Method::PATCH, path)
    }

    pub fn delete(&self, path: &str) -> HttpRequestBuilder<'_> {
        self.request(Method::DELETE, path)
    }

    pub fn options(&self, path: &str) -> HttpRequestBuilder<'_> {
        self.request(Method::OPTIONS, path)
    }

    async fn dispatch(
        &self,
        method: Method,
        url: Url,
        mut headers: HeaderMap,
        body: Option<Bytes>,
    ) -> Result<HttpResponse, HttpError> {
        let mut call_site = None;
        for plugin in &self.plugins {
            plugin.prepare(&mut call_site);
        }

        if !headers.contains_key(ACCEPT) {
            if let Ok(accept) = HeaderValue::from_str(&self.converters.accept()) {
                headers.insert(ACCEPT, accept);
            }
        }

        let mut request = Request::new(method, url);
        *request.headers_mut() = headers;
        *request.body_mut() = body.map(Body::from);

        match self.factory.execute(request).await {
            Ok(response) => Ok(response),
            Err(error) => Err(self
                .plugins
                .iter()
                .fold(error, |error, plugin| plugin.apply(error, &mut call_site))),
        }
    }
}

pub struct HttpRequestBuilder<'a> {
    http: &'a Http,
    method: Method,
    url: Result<Url, HttpError>,
    headers: HeaderMap,
    body: Result<Option<Bytes>, HttpError>,
}

impl HttpRequestBuilder<'_> {
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        self.body = self
            .http
            .converters
            .write_json(value, &mut self.headers)
            .map(Some);
        self
    }

    pub fn text(mut self, value: impl Into<String>) -> Self {
        let body = self
            .http
            .converters
            .write_string(value.into(), &mut self.headers);
        self.body = Ok(Some(body));
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Ok(Some(body.into()));
        self
    }

    /// Send and return the raw response, whatever its status
    pub async fn send(self) -> Result<HttpResponse, HttpError> {
        let url = self.url?;
        let body = self.body?;
        self.http
            .dispatch(self.method, url, self.headers, body)
            .await
    }

    pub async fn send_json<T: DeserializeOwned>(self) -> Result<T, HttpError> {
        let converters = self.http.converters.clone();
        let response = self.send().await?.error_for_status()?;
        converters.read_json(response.body())
    }

    pub async fn send_stream<T: DeserializeOwned>(self) -> Result<Vec<T>, HttpError> {
        let converters = self.http.converters.clone();
        let response = self.send().await?.error_for_status()?;
        converters.read_stream(response.body())
    }
}
