//! Failure decoration by the facade plugins

use std::net::TcpListener;

use httpmux_client::{HttpClients, HttpError};
use tests::{default_collaborators, ClientSettings, Settings};

/// Base URL of a port nothing listens on
fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

#[tokio::test(flavor = "multi_thread")]
async fn test_connect_failure_is_transient_with_call_site() {
    let settings = Settings::default()
        .with_client("orders", ClientSettings::default().with_base_url(closed_port_url()));
    let clients = HttpClients::bootstrap(&settings, &default_collaborators()).unwrap();

    let err = clients
        .get("orders")
        .unwrap()
        .http
        .get("/orders")
        .send()
        .await
        .unwrap_err();

    assert!(err.is_transient());
    assert!(err.original_trace().is_some());
    assert!(matches!(err.root(), HttpError::Transport(_)));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_disabled_plugins_leave_error_untouched() {
    let client = ClientSettings {
        keep_original_stack_trace: Some(false),
        detect_transient_faults: Some(false),
        ..ClientSettings::default()
    }
    .with_base_url(closed_port_url());
    let settings = Settings::default().with_client("orders", client);
    let clients = HttpClients::bootstrap(&settings, &default_collaborators()).unwrap();

    let err = clients
        .get("orders")
        .unwrap()
        .http
        .get("/orders")
        .send()
        .await
        .unwrap_err();

    assert!(!err.is_transient());
    assert!(err.original_trace().is_none());
    assert!(matches!(err, HttpError::Transport(_)));
}
