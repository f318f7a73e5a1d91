use std::fmt;

use crate::components::PluginKind;

/// Owner of a component: one client, or every client
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    Client(String),
    Global,
}

/// The fixed set of component types a client is assembled from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    RequestFactory,
    Executor,
    HttpClient,
    Converters,
    ObjectMapper,
    AccessTokens,
    Plugin(PluginKind),
    Http,
    SyncTemplate,
    AsyncTemplate,
}

impl ComponentKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::RequestFactory => "RequestFactory",
            Self::Executor => "TaskExecutor",
            Self::HttpClient => "HttpClient",
            Self::Converters => "HttpMessageConverters",
            Self::ObjectMapper => "ObjectMapper",
            Self::AccessTokens => "AccessTokens",
            Self::Plugin(PluginKind::OriginalStackTrace) => "OriginalStackTracePlugin",
            Self::Plugin(PluginKind::TransientFault) => "TransientFaultPlugin",
            Self::Http => "Http",
            Self::SyncTemplate => "SyncTemplate",
            Self::AsyncTemplate => "AsyncTemplate",
        }
    }

    /// Well-known name used when the component is shared by all clients
    fn global_name(&self) -> String {
        match self {
            Self::Executor => "taskExecutor".to_string(),
            Self::AccessTokens => "accessTokens".to_string(),
            Self::ObjectMapper => "objectMapper".to_string(),
            other => lower_first(other.type_name()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComponentKey {
    pub scope: Scope,
    pub kind: ComponentKind,
}

impl ComponentKey {
    pub fn client(client_id: impl Into<String>, kind: ComponentKind) -> Self {
        Self {
            scope: Scope::Client(client_id.into()),
            kind,
        }
    }

    pub fn global(kind: ComponentKind) -> Self {
        Self {
            scope: Scope::Global,
            kind,
        }
    }

    /// External identity: `lowerCamel(clientId) + TypeName` for scoped keys,
    /// a fixed well-known name for global ones.
    pub fn name(&self) -> String {
        match &self.scope {
            Scope::Client(id) => format!("{}{}", lower_camel(id), self.kind.type_name()),
            Scope::Global => self.kind.global_name(),
        }
    }
}

impl fmt::Display for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

fn lower_camel(id: &str) -> String {
    id.split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .enumerate()
        .map(|(i, part)| {
            let lower = part.to_lowercase();
            if i == 0 {
                lower
            } else {
                upper_first(&lower)
            }
        })
        .collect()
}

fn upper_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
