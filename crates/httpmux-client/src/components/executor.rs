//! Shared task executor
//!
//! One multi-threaded runtime for the whole process. Every exchange issued by
//! any client runs here, so connection pools live on a single runtime no
//! matter which thread or runtime the caller is on.

use std::future::Future;

use parking_lot::Mutex;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;
use tracing::{info, Instrument};

use crate::error::{AssemblyError, HttpError};
use crate::registry::Dispose;

pub struct TaskExecutor {
    runtime: Mutex<Option<Runtime>>,
    handle: Handle,
}

impl TaskExecutor {
    pub fn new() -> Result<Self, AssemblyError> {
        let runtime = Builder::new_multi_thread()
            .thread_name("httpmux-worker")
            .enable_all()
            .build()
            .map_err(|e| AssemblyError::construction("TaskExecutor", e))?;
        let handle = runtime.handle().clone();

        Ok(Self {
            runtime: Mutex::new(Some(runtime)),
            handle,
        })
    }

    /// Run `future` on the executor inside the caller's current span
    pub fn spawn<F>(&self, future: F) -> Result<JoinHandle<F::Output>, HttpError>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        if self.is_shut_down() {
            return Err(HttpError::Executor("executor has been shut down".to_string()));
        }
        Ok(self.handle.spawn(future.in_current_span()))
    }

    /// Spawn and wait for the result
    pub async fn run<F, T>(&self, future: F) -> Result<T, HttpError>
    where
        F: Future<Output = Result<T, HttpError>> + Send + 'static,
        T: Send + 'static,
    {
        self.spawn(future)?
            .await
            .map_err(|e| HttpError::Executor(e.to_string()))?
    }

    pub fn is_shut_down(&self) -> bool {
        self.runtime.lock().is_none()
    }

    fn shutdown(&self) -> bool {
        match self.runtime.lock().take() {
            Some(runtime) => {
                // Non-blocking so teardown may happen from async contexts
                runtime.shutdown_background();
                info!("[TaskExecutor] Shut down");
                true
            }
            None => false,
        }
    }
}

impl Dispose for TaskExecutor {
    fn dispose(&self) -> bool {
        self.shutdown()
    }
}

impl Drop for TaskExecutor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for TaskExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskExecutor")
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}
