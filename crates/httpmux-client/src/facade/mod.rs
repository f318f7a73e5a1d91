//! Client facades
//!
//! The artifacts handed to the application for each configured client: the
//! [`Http`] request facade and the [`SyncTemplate`]/[`AsyncTemplate`] pair.
//! All three share the client's request factory and converters.

mod http;
mod response;
mod template;

pub use http::{Http, HttpRequestBuilder};
pub use response::HttpResponse;
pub use template::{AsyncTemplate, SyncTemplate, UriTemplateHandler};

use std::sync::Arc;

/// Terminal artifacts of one assembled client
#[derive(Clone)]
pub struct ClientFacade {
    pub client_id: String,
    pub http: Arc<Http>,
    pub sync_template: Arc<SyncTemplate>,
    pub async_template: Arc<AsyncTemplate>,
}

impl std::fmt::Debug for ClientFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientFacade")
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}
