//! Registration pass over every configured client
//!
//! `Registrar` runs the [`ComponentAssembler`] once per client in document
//! order. A failing client does not stop later clients from assembling, but
//! any failure fails the pass as a whole.

use std::sync::Arc;

use httpmux_core::Settings;
use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::assembler::ComponentAssembler;
use crate::collaborators::Collaborators;
use crate::error::{ClientAssemblyError, RegistrationError};
use crate::facade::ClientFacade;
use crate::registry::{ComponentKey, ComponentKind, Registry};

pub struct Registrar<'a> {
    registry: &'a Registry,
    settings: &'a Settings,
    collaborators: &'a Collaborators,
}

impl<'a> Registrar<'a> {
    pub fn new(
        registry: &'a Registry,
        settings: &'a Settings,
        collaborators: &'a Collaborators,
    ) -> Self {
        Self {
            registry,
            settings,
            collaborators,
        }
    }

    /// Assemble every client, collecting every failure
    pub fn register(&self) -> Result<IndexMap<String, ClientFacade>, RegistrationError> {
        self.seed_object_mappers();

        let assembler = ComponentAssembler::new(self.registry, self.settings, self.collaborators);
        let mut clients = IndexMap::with_capacity(self.settings.clients.len());
        let mut failures = Vec::new();

        for (client_id, client) in &self.settings.clients {
            match assembler.assemble(client_id, client) {
                Ok(facade) => {
                    debug!("Client [{}]: Assembled", client_id);
                    clients.insert(client_id.clone(), facade);
                }
                Err(source) => {
                    let failure = ClientAssemblyError {
                        client_id: client_id.clone(),
                        source,
                    };
                    warn!("Assembly failed: {}", failure);
                    failures.push(failure);
                }
            }
        }

        info!(
            "[Registrar] Assembled {}/{} client(s), {} component(s) registered",
            clients.len(),
            self.settings.clients.len(),
            self.registry.len()
        );

        if failures.is_empty() {
            Ok(clients)
        } else {
            Err(RegistrationError { failures })
        }
    }

    /// Supplied mappers take their keys before any default could be built
    fn seed_object_mappers(&self) {
        for (client_id, mapper) in &self.collaborators.client_object_mappers {
            let key = ComponentKey::client(client_id.as_str(), ComponentKind::ObjectMapper);
            if !self.registry.provide(key, Arc::clone(mapper)) {
                debug!("Client [{}]: ObjectMapper already registered", client_id);
            }
        }
        if let Some(mapper) = &self.collaborators.object_mapper {
            self.registry
                .provide(ComponentKey::global(ComponentKind::ObjectMapper), Arc::clone(mapper));
        }
    }
}

/// Owner of the registry and of every assembled client.
///
/// Tears the registry down when dropped.
pub struct HttpClients {
    registry: Registry,
    clients: IndexMap<String, ClientFacade>,
}

impl HttpClients {
    /// Assemble every configured client into a fresh registry
    pub fn bootstrap(
        settings: &Settings,
        collaborators: &Collaborators,
    ) -> Result<Self, RegistrationError> {
        let registry = Registry::new();
        let result = Registrar::new(&registry, settings, collaborators).register();

        match result {
            Ok(clients) => Ok(Self { registry, clients }),
            Err(err) => {
                registry.teardown();
                Err(err)
            }
        }
    }

    pub fn get(&self, client_id: &str) -> Option<&ClientFacade> {
        self.clients.get(client_id)
    }

    /// Client ids in document order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.clients.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Dispose every disposable component. Returns how many were disposed;
    /// a second call disposes nothing.
    pub fn teardown(&self) -> usize {
        let disposed = self.registry.teardown();
        if disposed > 0 {
            info!("[HttpClients] Disposed {} component(s)", disposed);
        }
        disposed
    }
}

impl Drop for HttpClients {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for HttpClients {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClients")
            .field("clients", &self.clients.keys().collect::<Vec<_>>())
            .field("components", &self.registry.len())
            .finish()
    }
}
