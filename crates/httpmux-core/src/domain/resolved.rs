//! Per-client settings merged with the global defaults

use std::time::Duration;

use url::Url;

use super::settings::{ClientOAuthSettings, ClientSettings, Defaults, Keystore};
use crate::error::ConfigError;

/// Fully merged configuration for one client.
///
/// Computed on demand from a [`ClientSettings`] and the [`Defaults`]; never
/// stored in the settings document.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSettings {
    pub base_url: Option<String>,
    pub connection_timeout: Duration,
    pub socket_timeout: Duration,
    pub connection_time_to_live: Duration,
    pub max_connections_per_route: u32,
    /// Never below `max_connections_per_route`
    pub max_connections_total: u32,
    pub keep_original_stack_trace: bool,
    pub detect_transient_faults: bool,
    pub compress_request: bool,
    pub keystore: Option<Keystore>,
    pub oauth: Option<ClientOAuthSettings>,
}

impl ResolvedSettings {
    /// Merge a client's overrides with the defaults.
    ///
    /// An explicit per-client value always wins, including an explicit
    /// `false`. The total pool size is raised to the per-route limit when it
    /// would otherwise be smaller, even if the total was set explicitly.
    pub fn resolve(client: &ClientSettings, defaults: &Defaults) -> Self {
        let max_connections_per_route = client
            .max_connections_per_route
            .unwrap_or(defaults.max_connections_per_route);
        let max_connections_total = client
            .max_connections_total
            .unwrap_or(defaults.max_connections_total)
            .max(max_connections_per_route);

        Self {
            base_url: client.base_url.clone(),
            connection_timeout: client
                .connection_timeout
                .unwrap_or(defaults.connection_timeout)
                .as_duration(),
            socket_timeout: client
                .socket_timeout
                .unwrap_or(defaults.socket_timeout)
                .as_duration(),
            connection_time_to_live: client
                .connection_time_to_live
                .unwrap_or(defaults.connection_time_to_live)
                .as_duration(),
            max_connections_per_route,
            max_connections_total,
            keep_original_stack_trace: client
                .keep_original_stack_trace
                .unwrap_or(defaults.keep_original_stack_trace),
            detect_transient_faults: client
                .detect_transient_faults
                .unwrap_or(defaults.detect_transient_faults),
            compress_request: client
                .compress_request
                .unwrap_or(defaults.compress_request),
            keystore: client.keystore.clone(),
            oauth: client.oauth.clone(),
        }
    }

    /// Reject values a client cannot be built with
    pub fn validate(&self, client_id: &str) -> Result<(), ConfigError> {
        if self.max_connections_per_route == 0 {
            return Err(ConfigError::invalid(
                client_id,
                "maxConnectionsPerRoute",
                "must be at least 1",
            ));
        }
        if self.max_connections_total == 0 {
            return Err(ConfigError::invalid(
                client_id,
                "maxConnectionsTotal",
                "must be at least 1",
            ));
        }
        self.parsed_base_url(client_id)?;
        Ok(())
    }

    /// Base URL as an absolute URL, if one is configured
    pub fn parsed_base_url(&self, client_id: &str) -> Result<Option<Url>, ConfigError> {
        self.base_url
            .as_deref()
            .map(|raw| {
                Url::parse(raw).map_err(|e| ConfigError::invalid(client_id, "baseUrl", e.to_string()))
            })
            .transpose()
    }
}
