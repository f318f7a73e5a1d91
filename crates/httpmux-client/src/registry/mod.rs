//! Component Registry
//!
//! Idempotent keyed store for the components of every configured client.
//! A key is built at most once: the first `register` call runs its builder
//! and stores the result, later calls get the stored instance back and their
//! builders are dropped unused.
//!
//! ```text
//! (orders, HttpClient)   → "ordersHttpClient"   → Arc<HttpTransport>
//! (orders, SyncTemplate) → "ordersSyncTemplate" → Arc<SyncTemplate>
//! (global, Executor)     → "taskExecutor"       → Arc<TaskExecutor>
//! ```

mod key;

pub use key::{ComponentKey, ComponentKind, Scope};

use std::any::{type_name, Any};
use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use tracing::debug;

use crate::error::AssemblyError;

type Stored = Arc<dyn Any + Send + Sync>;
type Slot = Arc<OnceCell<Stored>>;

/// Component that holds resources released at teardown
pub trait Dispose: Send + Sync {
    /// Release resources. Returns `false` if they were already released.
    fn dispose(&self) -> bool;
}

struct TeardownHook {
    name: String,
    component: Arc<dyn Dispose>,
}

/// Keyed registration store.
///
/// Passed explicitly to whoever assembles clients; there is no process-wide
/// instance. Builders run without the map lock held, so a builder may
/// register its own dependencies. Callers racing on one key share a single
/// build.
#[derive(Default)]
pub struct Registry {
    entries: Mutex<HashMap<ComponentKey, Slot>>,
    teardown: Mutex<Vec<TeardownHook>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the component stored under `key`, building it first if absent.
    ///
    /// A failed build leaves the key absent.
    pub fn register<T, F>(&self, key: ComponentKey, builder: F) -> Result<Arc<T>, AssemblyError>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> Result<T, AssemblyError>,
    {
        self.register_inner(key, builder).map(|(component, _)| component)
    }

    /// Like [`register`](Self::register), and schedules the component for
    /// [`teardown`](Self::teardown) if this call built it.
    pub fn register_disposable<T, F>(
        &self,
        key: ComponentKey,
        builder: F,
    ) -> Result<Arc<T>, AssemblyError>
    where
        T: Dispose + Any,
        F: FnOnce() -> Result<T, AssemblyError>,
    {
        let name = key.name();
        let (component, built) = self.register_inner(key, builder)?;
        if built {
            self.teardown.lock().push(TeardownHook {
                name,
                component: component.clone(),
            });
        }
        Ok(component)
    }

    fn register_inner<T, F>(
        &self,
        key: ComponentKey,
        builder: F,
    ) -> Result<(Arc<T>, bool), AssemblyError>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> Result<T, AssemblyError>,
    {
        let slot = self.slot(&key);
        let mut built = false;
        let stored = slot.get_or_try_init(|| {
            let component = builder()?;
            built = true;
            Ok::<_, AssemblyError>(Arc::new(component) as Stored)
        })?;

        if built {
            debug!("[Registry] Registered [{}]", key.name());
        } else {
            debug!("[Registry] Reusing [{}]", key.name());
        }
        downcast(&key, stored.clone()).map(|component| (component, built))
    }

    /// Cell for `key`, created empty on first use.
    ///
    /// The map lock is held only to fetch the cell; builders run under the
    /// cell's own lock so concurrent callers of one key wait for a single
    /// build while other keys stay free.
    fn slot(&self, key: &ComponentKey) -> Slot {
        self.entries
            .lock()
            .entry(key.clone())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone()
    }

    /// Pre-register a user-supplied component.
    ///
    /// Later `register` calls for the same key return it without building.
    /// Returns `false` and keeps the existing entry if the key is taken.
    pub fn provide<T>(&self, key: ComponentKey, component: Arc<T>) -> bool
    where
        T: Any + Send + Sync,
    {
        let provided = self.slot(&key).set(component as Stored).is_ok();
        if provided {
            debug!("[Registry] Provided [{}]", key.name());
        }
        provided
    }

    pub fn is_registered(&self, key: &ComponentKey) -> bool {
        self.stored(key).is_some()
    }

    pub fn contains(&self, key: &ComponentKey) -> bool {
        self.is_registered(key)
    }

    pub fn get<T>(&self, key: &ComponentKey) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        self.stored(key)?.downcast::<T>().ok()
    }

    fn stored(&self, key: &ComponentKey) -> Option<Stored> {
        self.entries.lock().get(key)?.get().cloned()
    }

    pub fn len(&self) -> usize {
        self.names().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// External names of every registered component, sorted
    pub fn names(&self) -> Vec<String> {
        // Cells of failed or in-flight builds stay empty and are skipped
        let mut names: Vec<_> = self
            .entries
            .lock()
            .iter()
            .filter(|(_, slot)| slot.get().is_some())
            .map(|(key, _)| key.name())
            .collect();
        names.sort();
        names
    }

    /// Dispose every component scheduled for teardown, in reverse
    /// registration order. Returns how many were actually disposed.
    pub fn teardown(&self) -> usize {
        let hooks: Vec<_> = self.teardown.lock().drain(..).collect();
        hooks
            .into_iter()
            .rev()
            .filter(|hook| {
                let disposed = hook.component.dispose();
                if disposed {
                    debug!("[Registry] Disposed [{}]", hook.name);
                }
                disposed
            })
            .count()
    }
}

fn downcast<T>(key: &ComponentKey, stored: Stored) -> Result<Arc<T>, AssemblyError>
where
    T: Any + Send + Sync,
{
    stored
        .downcast::<T>()
        .map_err(|_| AssemblyError::TypeMismatch {
            name: key.name(),
            expected: type_name::<T>(),
        })
}
