//! Shared test utilities and fixtures for HttpMux integration tests.

use std::path::Path;
use std::sync::{Arc, Once};

use httpmux_client::components::interceptors::RequestStage;
use httpmux_client::{
    AccessTokens, ClientFacade, Collaborators, CollaboratorsBuilder, MetricsCollector,
    RequestMetric,
};
use parking_lot::Mutex;

pub use httpmux_client::{HttpClients, Registry};
pub use httpmux_core::{ClientSettings, Defaults, GlobalOAuthSettings, Settings, TimeSpan};

static TRACING: Once = Once::new();

/// Install a test subscriber once; honours `RUST_LOG`
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Collaborators with the built-in interceptors and nothing optional
pub fn default_collaborators() -> Collaborators {
    collaborators().build().expect("default collaborators")
}

pub fn collaborators() -> CollaboratorsBuilder {
    CollaboratorsBuilder::new().with_default_interceptors()
}

/// Metrics collector keeping every sample in memory
#[derive(Default)]
pub struct RecordingMetrics {
    samples: Mutex<Vec<RequestMetric>>,
}

impl RecordingMetrics {
    pub fn samples(&self) -> Vec<RequestMetric> {
        self.samples.lock().clone()
    }
}

impl MetricsCollector for RecordingMetrics {
    fn record(&self, metric: RequestMetric) {
        self.samples.lock().push(metric);
    }
}

/// Write `client.json` as read by the directory credentials provider
pub fn write_credentials(directory: &Path, client_id: &str, client_secret: &str) {
    let body = serde_json::json!({
        "client_id": client_id,
        "client_secret": client_secret,
    });
    std::fs::write(directory.join("client.json"), body.to_string()).expect("write credentials");
}

/// The token source wired into a client's interceptor chain, if any
pub fn access_tokens(facade: &ClientFacade) -> Option<Arc<AccessTokens>> {
    facade
        .http
        .factory()
        .transport()
        .interceptors()
        .request_stages()
        .find_map(|stage| match stage {
            RequestStage::AccessToken(interceptor) => Some(interceptor.tokens().clone()),
            _ => None,
        })
}
