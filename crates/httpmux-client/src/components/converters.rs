//! Message converters
//!
//! Every client gets the same ordered list: string, JSON, stream. The JSON
//! and stream converters share one [`ObjectMapper`].

use std::sync::Arc;

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_CHARSET, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::HttpError;

pub const APPLICATION_JSON: &str = "application/json";
pub const APPLICATION_X_JSON_STREAM: &str = "application/x-json-stream";
pub const TEXT_PLAIN: &str = "text/plain;charset=UTF-8";

/// JSON (de)serialization settings shared by the JSON-based converters
#[derive(Debug, Clone, Default)]
pub struct ObjectMapper {
    name: String,
    pretty: bool,
}

impl ObjectMapper {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pretty: false,
        }
    }

    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn to_vec<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, HttpError> {
        let encoded = if self.pretty {
            serde_json::to_vec_pretty(value)
        } else {
            serde_json::to_vec(value)
        };
        encoded.map_err(|e| HttpError::Conversion(e.to_string()))
    }

    pub fn from_slice<T: DeserializeOwned>(&self, body: &[u8]) -> Result<T, HttpError> {
        serde_json::from_slice(body).map_err(|e| HttpError::Conversion(e.to_string()))
    }

    /// Read a JSON array, concatenated JSON values or NDJSON
    pub fn stream_from_slice<T: DeserializeOwned>(&self, body: &[u8]) -> Result<Vec<T>, HttpError> {
        let start = body
            .iter()
            .position(|b| !b.is_ascii_whitespace())
            .unwrap_or(body.len());
        let trimmed = &body[start..];
        if trimmed.starts_with(b"[") {
            return self.from_slice(trimmed);
        }
        serde_json::Deserializer::from_slice(trimmed)
            .into_iter::<T>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| HttpError::Conversion(e.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConverterKind {
    String,
    Json,
    Stream,
}

#[derive(Debug, Clone)]
pub enum MessageConverter {
    String { write_accept_charset: bool },
    Json { mapper: Arc<ObjectMapper> },
    Stream { mapper: Arc<ObjectMapper> },
}

impl MessageConverter {
    pub fn kind(&self) -> ConverterKind {
        match self {
            Self::String { .. } => ConverterKind::String,
            Self::Json { .. } => ConverterKind::Json,
            Self::Stream { .. } => ConverterKind::Stream,
        }
    }

    pub fn media_type(&self) -> &'static str {
        match self {
            Self::String { .. } => "text/plain",
            Self::Json { .. } => APPLICATION_JSON,
            Self::Stream { .. } => APPLICATION_X_JSON_STREAM,
        }
    }
}

/// Ordered converter list of one client
#[derive(Debug, Clone)]
pub struct HttpMessageConverters {
    converters: Vec<MessageConverter>,
}

impl HttpMessageConverters {
    pub fn new(converters: Vec<MessageConverter>) -> Self {
        Self { converters }
    }

    pub fn converters(&self) -> &[MessageConverter] {
        &self.converters
    }

    pub fn kinds(&self) -> Vec<ConverterKind> {
        self.converters.iter().map(MessageConverter::kind).collect()
    }

    /// `Accept` header value covering every converter
    pub fn accept(&self) -> String {
        self.converters
            .iter()
            .map(MessageConverter::media_type)
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn json_mapper(&self) -> Result<&ObjectMapper, HttpError> {
        self.converters
            .iter()
            .find_map(|c| match c {
                MessageConverter::Json { mapper } => Some(mapper.as_ref()),
                _ => None,
            })
            .ok_or_else(|| HttpError::Conversion("no JSON converter configured".to_string()))
    }

    fn stream_mapper(&self) -> Result<&ObjectMapper, HttpError> {
        self.converters
            .iter()
            .find_map(|c| match c {
                MessageConverter::Stream { mapper } => Some(mapper.as_ref()),
                _ => None,
            })
            .ok_or_else(|| HttpError::Conversion("no stream converter configured".to_string()))
    }

    pub fn write_json<T: Serialize + ?Sized>(
        &self,
        value: &T,
        headers: &mut HeaderMap,
    ) -> Result<Bytes, HttpError> {
        let body = self.json_mapper()?.to_vec(value)?;
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
        Ok(Bytes::from(body))
    }

    pub fn write_string(&self, value: String, headers: &mut HeaderMap) -> Bytes {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN));
        let advertise = self.converters.iter().any(|c| {
            matches!(
                c,
                MessageConverter::String {
                    write_accept_charset: true
                }
            )
        });
        if advertise {
            headers.insert(ACCEPT_CHARSET, HeaderValue::from_static("utf-8"));
        }
        Bytes::from(value)
    }

    pub fn read_json<T: DeserializeOwned>(&self, body: &[u8]) -> Result<T, HttpError> {
        self.json_mapper()?.from_slice(body)
    }

    pub fn read_stream<T: DeserializeOwned>(&self, body: &[u8]) -> Result<Vec<T>, HttpError> {
        self.stream_mapper()?.stream_from_slice(body)
    }

    pub fn read_string(&self, body: &[u8]) -> Result<String, HttpError> {
        String::from_utf8(body.to_vec()).map_err(|e| HttpError::Conversion(e.to_string()))
    }
}
