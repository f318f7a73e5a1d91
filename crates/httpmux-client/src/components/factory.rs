use std::sync::Arc;

use reqwest::Request;

use super::{HttpTransport, TaskExecutor};
use crate::error::HttpError;
use crate::facade::HttpResponse;

/// Dispatches a client's exchanges through its transport on the shared
/// executor
pub struct RequestFactory {
    transport: Arc<HttpTransport>,
    executor: Arc<TaskExecutor>,
}

impl RequestFactory {
    pub fn new(transport: Arc<HttpTransport>, executor: Arc<TaskExecutor>) -> Self {
        Self {
            transport,
            executor,
        }
    }

    pub fn transport(&self) -> &Arc<HttpTransport> {
        &self.transport
    }

    pub fn executor(&self) -> &Arc<TaskExecutor> {
        &self.executor
    }

    pub async fn execute(&self, request: Request) -> Result<HttpResponse, HttpError> {
        let transport = self.transport.clone();
        self.executor
            .run(async move { transport.execute(request).await })
            .await
    }
}
