//! OAuth access tokens
//!
//! `AccessTokens` is shared by every client with OAuth enabled. It fetches
//! tokens with the client-credentials grant, one token per client id with
//! that client's scopes, and caches each until shortly before it expires.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use httpmux_core::GlobalOAuthSettings;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::Request;
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use super::{ExchangeContext, RequestInterceptor};
use crate::error::{AssemblyError, HttpError};

/// Refresh tokens this long before they expire
const REFRESH_BUFFER: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Deserialize)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Source of the credentials presented to the token endpoint
pub trait CredentialsProvider: Send + Sync {
    fn credentials(&self) -> Result<ClientCredentials>;
}

/// Reads `client.json` from a credentials directory on every call, so
/// rotated secrets are picked up without a restart
#[derive(Debug, Clone)]
pub struct DirectoryCredentialsProvider {
    directory: PathBuf,
}

impl DirectoryCredentialsProvider {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }
}

impl CredentialsProvider for DirectoryCredentialsProvider {
    fn credentials(&self) -> Result<ClientCredentials> {
        let path = self.directory.join("client.json");
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    token_type: Option<String>,
    expires_in: Option<u64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    header: String,
    expires_at: Option<Instant>,
}

impl CachedToken {
    fn expires_soon(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => Instant::now() + REFRESH_BUFFER >= expires_at,
            None => false,
        }
    }
}

impl From<TokenResponse> for CachedToken {
    fn from(response: TokenResponse) -> Self {
        let token_type = response.token_type.unwrap_or_else(|| "Bearer".to_string());
        Self {
            header: format!("{} {}", token_type, response.access_token),
            expires_at: response
                .expires_in
                .map(|secs| Instant::now() + Duration::from_secs(secs)),
        }
    }
}

pub struct AccessTokens {
    token_url: Url,
    http: reqwest::Client,
    credentials: Arc<dyn CredentialsProvider>,
    scopes: HashMap<String, Vec<String>>,
    tokens: DashMap<String, CachedToken>,
}

impl AccessTokens {
    pub fn new(
        settings: &GlobalOAuthSettings,
        scopes: HashMap<String, Vec<String>>,
        credentials: Arc<dyn CredentialsProvider>,
    ) -> Result<Self, AssemblyError> {
        let token_url = Url::parse(&settings.access_token_url)
            .map_err(|e| AssemblyError::construction("AccessTokens", e))?;
        let http = reqwest::Client::builder()
            .connect_timeout(settings.connection_timeout.as_duration())
            .timeout(settings.socket_timeout.as_duration())
            .build()
            .map_err(|e| AssemblyError::construction("AccessTokens", e))?;

        Ok(Self {
            token_url,
            http,
            credentials,
            scopes,
            tokens: DashMap::new(),
        })
    }

    pub fn token_ids(&self) -> Vec<&str> {
        let mut ids: Vec<_> = self.scopes.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// `Authorization` header value for `token_id`, fetching if needed
    pub async fn authorization(&self, token_id: &str) -> Result<String, HttpError> {
        if let Some(cached) = self.tokens.get(token_id) {
            if !cached.expires_soon() {
                return Ok(cached.header.clone());
            }
        }

        let token = self.fetch(token_id).await?;
        let header = token.header.clone();
        self.tokens.insert(token_id.to_string(), token);
        Ok(header)
    }

    async fn fetch(&self, token_id: &str) -> Result<CachedToken, HttpError> {
        let scopes = self.scopes.get(token_id).ok_or_else(|| {
            HttpError::interceptor("AccessToken", format!("unknown token id [{}]", token_id))
        })?;
        let credentials = self
            .credentials
            .credentials()
            .map_err(|e| HttpError::interceptor("AccessToken", format!("{:#}", e)))?;

        debug!("[AccessTokens] Requesting token [{}] with scopes {:?}", token_id, scopes);
        let scope = scopes.join(" ");
        let response = self
            .http
            .post(self.token_url.clone())
            .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
            .form(&[("grant_type", "client_credentials"), ("scope", scope.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json::<TokenResponse>()
            .await?;

        info!("[AccessTokens] Obtained token [{}]", token_id);
        Ok(response.into())
    }
}

/// Adds the client's bearer token to every request
#[derive(Clone)]
pub struct AccessTokenInterceptor {
    token_id: String,
    tokens: Arc<AccessTokens>,
}

impl AccessTokenInterceptor {
    pub fn new(token_id: impl Into<String>, tokens: Arc<AccessTokens>) -> Self {
        Self {
            token_id: token_id.into(),
            tokens,
        }
    }

    pub fn tokens(&self) -> &Arc<AccessTokens> {
        &self.tokens
    }
}

#[async_trait]
impl RequestInterceptor for AccessTokenInterceptor {
    async fn intercept(
        &self,
        _context: &mut ExchangeContext,
        request: &mut Request,
    ) -> Result<(), HttpError> {
        let header = self.tokens.authorization(&self.token_id).await?;
        let value =
            HeaderValue::from_str(&header).map_err(|e| HttpError::interceptor("AccessToken", e))?;
        request.headers_mut().insert(AUTHORIZATION, value);
        Ok(())
    }
}
