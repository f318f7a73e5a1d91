use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::time_span::TimeSpan;
use crate::error::ConfigError;

/// Settings document: global defaults plus one entry per named client.
///
/// Immutable once parsed. Client order is document order and drives the
/// order in which clients are assembled.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub defaults: Defaults,

    /// Token endpoint shared by every client that enables OAuth
    #[serde(default)]
    pub oauth: Option<GlobalOAuthSettings>,

    #[serde(default)]
    pub clients: IndexMap<String, ClientSettings>,
}

impl Settings {
    pub fn from_json(document: &str) -> Result<Self, ConfigError> {
        let settings: Self = serde_json::from_str(document)?;
        debug!(
            "[Settings] Loaded {} client(s), oauth: {}",
            settings.clients.len(),
            settings.oauth.is_some()
        );
        Ok(settings)
    }

    pub fn with_client(mut self, id: impl Into<String>, client: ClientSettings) -> Self {
        self.clients.insert(id.into(), client);
        self
    }

    pub fn with_defaults(mut self, defaults: Defaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_oauth(mut self, oauth: GlobalOAuthSettings) -> Self {
        self.oauth = Some(oauth);
        self
    }
}

/// Global fallback for every overridable client field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Defaults {
    pub connection_timeout: TimeSpan,
    pub socket_timeout: TimeSpan,
    pub connection_time_to_live: TimeSpan,
    pub max_connections_per_route: u32,
    pub max_connections_total: u32,
    pub keep_original_stack_trace: bool,
    pub detect_transient_faults: bool,
    pub compress_request: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            connection_timeout: TimeSpan::from_secs(5),
            socket_timeout: TimeSpan::from_secs(5),
            connection_time_to_live: TimeSpan::from_secs(30),
            max_connections_per_route: 2,
            max_connections_total: 20,
            keep_original_stack_trace: true,
            detect_transient_faults: true,
            compress_request: false,
        }
    }
}

/// Per-client configuration. `None` means "use the default".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientSettings {
    pub base_url: Option<String>,
    pub connection_timeout: Option<TimeSpan>,
    pub socket_timeout: Option<TimeSpan>,
    pub connection_time_to_live: Option<TimeSpan>,
    pub max_connections_per_route: Option<u32>,
    pub max_connections_total: Option<u32>,
    pub keep_original_stack_trace: Option<bool>,
    pub detect_transient_faults: Option<bool>,
    pub compress_request: Option<bool>,
    pub keystore: Option<Keystore>,
    pub oauth: Option<ClientOAuthSettings>,
}

impl ClientSettings {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_oauth(mut self, scopes: &[&str]) -> Self {
        self.oauth = Some(ClientOAuthSettings {
            scopes: scopes.iter().map(|s| s.to_string()).collect(),
        });
        self
    }
}

/// Trusted certificate store for a client (PEM encoded)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Keystore {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientOAuthSettings {
    pub scopes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalOAuthSettings {
    pub access_token_url: String,

    /// Directory holding `client.json` with the client credentials
    #[serde(default)]
    pub credentials_directory: Option<PathBuf>,

    #[serde(default = "GlobalOAuthSettings::default_timeout")]
    pub connection_timeout: TimeSpan,

    #[serde(default = "GlobalOAuthSettings::default_timeout")]
    pub socket_timeout: TimeSpan,
}

impl GlobalOAuthSettings {
    pub fn new(access_token_url: impl Into<String>) -> Self {
        Self {
            access_token_url: access_token_url.into(),
            credentials_directory: None,
            connection_timeout: Self::default_timeout(),
            socket_timeout: Self::default_timeout(),
        }
    }

    fn default_timeout() -> TimeSpan {
        TimeSpan::from_secs(1)
    }
}
