//! Interceptor chain composition

use std::sync::Arc;

use httpmux_client::{ClientFacade, Collaborators, HttpClients, InterceptorKind, Plugin};
use pretty_assertions::assert_eq;
use tests::{
    collaborators, default_collaborators, write_credentials, ClientSettings, Defaults,
    GlobalOAuthSettings, RecordingMetrics, Settings,
};

fn request_kinds(facade: &ClientFacade) -> Vec<InterceptorKind> {
    facade.http.factory().transport().interceptors().request_kinds()
}

fn response_kinds(facade: &ClientFacade) -> Vec<InterceptorKind> {
    facade.http.factory().transport().interceptors().response_kinds()
}

fn bootstrap(client: ClientSettings, collaborators: &Collaborators) -> HttpClients {
    let settings = Settings::default().with_client("orders", client);
    HttpClients::bootstrap(&settings, collaborators).unwrap()
}

#[test]
fn test_compression_without_metrics() {
    let mut client = ClientSettings::default();
    client.compress_request = Some(true);

    let clients = bootstrap(client, &default_collaborators());
    let orders = clients.get("orders").unwrap();

    assert_eq!(
        request_kinds(orders),
        vec![
            InterceptorKind::Tracing,
            InterceptorKind::Logging,
            InterceptorKind::Compression,
        ]
    );
    assert_eq!(response_kinds(orders), vec![InterceptorKind::Logging]);
}

#[test]
fn test_metrics_pair_when_collector_present() {
    let collaborators = collaborators()
        .with_metrics(Arc::new(RecordingMetrics::default()))
        .build()
        .unwrap();

    let clients = bootstrap(ClientSettings::default(), &collaborators);
    let orders = clients.get("orders").unwrap();

    assert_eq!(
        request_kinds(orders),
        vec![
            InterceptorKind::Tracing,
            InterceptorKind::MetricsRequest,
            InterceptorKind::Logging,
        ]
    );
    assert_eq!(
        response_kinds(orders),
        vec![InterceptorKind::MetricsResponse, InterceptorKind::Logging]
    );
}

#[test]
fn test_access_token_runs_first() {
    let credentials = tempfile::tempdir().unwrap();
    write_credentials(credentials.path(), "app", "secret");
    let mut client = ClientSettings::default().with_oauth(&["orders.read"]);
    client.compress_request = Some(true);
    let settings = Settings::default()
        .with_oauth(GlobalOAuthSettings {
            credentials_directory: Some(credentials.path().to_path_buf()),
            ..GlobalOAuthSettings::new("http://auth.local/token")
        })
        .with_client("orders", client);

    let clients = HttpClients::bootstrap(&settings, &default_collaborators()).unwrap();

    assert_eq!(
        request_kinds(clients.get("orders").unwrap()),
        vec![
            InterceptorKind::AccessToken,
            InterceptorKind::Tracing,
            InterceptorKind::Logging,
            InterceptorKind::Compression,
        ]
    );
}

#[test]
fn test_plugins_follow_resolved_flags() {
    let settings = Settings::default()
        .with_defaults(Defaults {
            keep_original_stack_trace: true,
            detect_transient_faults: true,
            ..Defaults::default()
        })
        .with_client("defaults", ClientSettings::default())
        .with_client(
            "quiet",
            ClientSettings {
                keep_original_stack_trace: Some(false),
                ..ClientSettings::default()
            },
        );

    let clients = HttpClients::bootstrap(&settings, &default_collaborators()).unwrap();

    assert_eq!(
        clients.get("defaults").unwrap().http.plugins(),
        vec![Plugin::OriginalStackTrace, Plugin::TransientFault]
    );
    assert_eq!(
        clients.get("quiet").unwrap().http.plugins(),
        vec![Plugin::TransientFault]
    );
}
