//! Components shared between clients, settings fallback and failure isolation

use std::sync::Arc;
use std::time::Duration;

use httpmux_client::{AssemblyError, ComponentKey, ComponentKind, HttpClients, Registrar, Registry};
use httpmux_core::Keystore;
use pretty_assertions::assert_eq;
use tests::{
    access_tokens, default_collaborators, init_tracing, write_credentials, ClientSettings,
    GlobalOAuthSettings, Settings,
};

#[test]
fn test_clients_share_one_executor() {
    init_tracing();
    let settings = Settings::default()
        .with_client("a", ClientSettings::default())
        .with_client("b", ClientSettings::default());

    let clients = HttpClients::bootstrap(&settings, &default_collaborators()).unwrap();

    let a = clients.get("a").unwrap().http.factory().executor().clone();
    let b = clients.get("b").unwrap().http.factory().executor().clone();
    assert!(Arc::ptr_eq(&a, &b));
    assert!(!a.is_shut_down());

    assert_eq!(clients.teardown(), 1);
    assert!(a.is_shut_down());
    assert_eq!(clients.teardown(), 0);
}

#[test]
fn test_orders_settings_fall_back_to_defaults() {
    let settings = Settings::from_json(
        r#"{
            "defaults": { "connectionTimeout": "5 seconds", "socketTimeout": "10 seconds" },
            "clients": {
                "orders": { "baseUrl": "http://orders.local", "connectionTimeout": "2 seconds" }
            }
        }"#,
    )
    .unwrap();

    let clients = HttpClients::bootstrap(&settings, &default_collaborators()).unwrap();

    let orders = clients.get("orders").unwrap();
    let limits = orders.http.factory().transport().limits();
    assert_eq!(limits.connection_timeout, Duration::from_secs(2));
    assert_eq!(limits.socket_timeout, Duration::from_secs(10));
    assert_eq!(limits.connection_time_to_live, Duration::from_secs(30));
    assert_eq!(
        orders.http.base_url().map(|u| u.as_str()),
        Some("http://orders.local/")
    );
}

#[test]
fn test_total_pool_is_clamped_to_per_route() {
    let mut client = ClientSettings::default();
    client.max_connections_per_route = Some(50);
    client.max_connections_total = Some(10);
    let settings = Settings::default().with_client("orders", client);

    let clients = HttpClients::bootstrap(&settings, &default_collaborators()).unwrap();

    let limits = clients.get("orders").unwrap().http.factory().transport().limits();
    assert_eq!(limits.max_connections_per_route, 50);
    assert_eq!(limits.max_connections_total, 50);
}

#[test]
fn test_oauth_clients_share_token_source() {
    let credentials = tempfile::tempdir().unwrap();
    write_credentials(credentials.path(), "app", "secret");
    let settings = Settings::default()
        .with_oauth(GlobalOAuthSettings {
            credentials_directory: Some(credentials.path().to_path_buf()),
            ..GlobalOAuthSettings::new("http://auth.local/token")
        })
        .with_client("orders", ClientSettings::default().with_oauth(&["orders.read"]))
        .with_client("billing", ClientSettings::default().with_oauth(&["billing.read"]))
        .with_client("public", ClientSettings::default());

    let clients = HttpClients::bootstrap(&settings, &default_collaborators()).unwrap();

    let orders = access_tokens(clients.get("orders").unwrap()).unwrap();
    let billing = access_tokens(clients.get("billing").unwrap()).unwrap();
    assert!(Arc::ptr_eq(&orders, &billing));
    assert_eq!(orders.token_ids(), vec!["billing", "orders"]);
    assert!(access_tokens(clients.get("public").unwrap()).is_none());
}

#[test]
fn test_broken_keystore_fails_only_its_client() {
    let missing = tempfile::tempdir().unwrap().path().join("truststore.pem");
    let mut secure = ClientSettings::default();
    secure.keystore = Some(Keystore { path: missing });
    let settings = Settings::default()
        .with_client("secure", secure)
        .with_client("orders", ClientSettings::default());
    let collaborators = default_collaborators();
    let registry = Registry::new();

    let err = Registrar::new(&registry, &settings, &collaborators)
        .register()
        .unwrap_err();

    assert_eq!(err.client_ids(), vec!["secure"]);
    assert!(matches!(
        err.failures[0].source,
        AssemblyError::Construction { component: "HttpClient", .. }
    ));
    assert!(err.to_string().contains("Client [secure]"));
    assert!(!registry.contains(&ComponentKey::client("secure", ComponentKind::HttpClient)));
    assert!(registry.contains(&ComponentKey::client("orders", ComponentKind::Http)));
    registry.teardown();
}

#[test]
fn test_bootstrap_fails_when_any_client_fails() {
    let settings = Settings::default()
        .with_client("orders", ClientSettings::default().with_base_url("not a url"))
        .with_client("billing", ClientSettings::default());

    let err = HttpClients::bootstrap(&settings, &default_collaborators()).unwrap_err();

    assert_eq!(err.client_ids(), vec!["orders"]);
    let message = err.to_string();
    assert!(message.contains("baseUrl"));
    assert_eq!(message.matches("Client [orders]").count(), 1);
}
