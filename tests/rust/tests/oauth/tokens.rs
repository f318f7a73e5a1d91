//! Token acquisition and caching with a mock token endpoint

use std::sync::Arc;

use httpmux_client::components::interceptors::{ClientCredentials, CredentialsProvider};
use httpmux_client::{HttpClients, HttpError};
use serde_json::json;
use tests::{
    collaborators, default_collaborators, write_credentials, ClientSettings, GlobalOAuthSettings,
    Settings,
};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Credentials held in memory
struct StaticCredentials;

impl CredentialsProvider for StaticCredentials {
    fn credentials(&self) -> anyhow::Result<ClientCredentials> {
        Ok(ClientCredentials {
            client_id: "static".to_string(),
            client_secret: "static-secret".to_string(),
        })
    }
}

async fn mount_token_endpoint(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=client_credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok-1",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn settings(server: &MockServer, oauth: GlobalOAuthSettings) -> Settings {
    Settings::default().with_oauth(oauth).with_client(
        "orders",
        ClientSettings::default()
            .with_base_url(server.uri())
            .with_oauth(&["orders.read"]),
    )
}

#[tokio::test(flavor = "multi_thread")]
async fn test_token_is_fetched_once_and_attached() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/orders"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(2)
        .mount(&server)
        .await;

    let credentials = tempfile::tempdir().unwrap();
    write_credentials(credentials.path(), "app", "secret");
    let oauth = GlobalOAuthSettings {
        credentials_directory: Some(credentials.path().to_path_buf()),
        ..GlobalOAuthSettings::new(format!("{}/token", server.uri()))
    };
    let clients = HttpClients::bootstrap(&settings(&server, oauth), &default_collaborators()).unwrap();
    let http = &clients.get("orders").unwrap().http;

    for _ in 0..2 {
        let orders: Vec<serde_json::Value> = http.get("/orders").send_json().await.unwrap();
        assert!(orders.is_empty());
    }

    let received = server.received_requests().await.unwrap();
    let token_request = received
        .iter()
        .find(|r| r.url.path() == "/token")
        .unwrap();
    let form = String::from_utf8_lossy(&token_request.body);
    assert!(form.contains("scope=orders.read"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_supplied_credentials_provider_is_used() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/orders"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    // No credentials directory: the provider must cover it
    let oauth = GlobalOAuthSettings::new(format!("{}/token", server.uri()));
    let collaborators = collaborators()
        .with_credentials_provider(Arc::new(StaticCredentials))
        .build()
        .unwrap();
    let clients = HttpClients::bootstrap(&settings(&server, oauth), &collaborators).unwrap();

    clients
        .get("orders")
        .unwrap()
        .http
        .get("/orders")
        .send()
        .await
        .unwrap();

    let received = server.received_requests().await.unwrap();
    let token_request = received
        .iter()
        .find(|r| r.url.path() == "/token")
        .unwrap();
    assert!(token_request.headers.contains_key("authorization"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_token_endpoint_failure_rejects_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/orders"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let credentials = tempfile::tempdir().unwrap();
    write_credentials(credentials.path(), "app", "wrong");
    let oauth = GlobalOAuthSettings {
        credentials_directory: Some(credentials.path().to_path_buf()),
        ..GlobalOAuthSettings::new(format!("{}/token", server.uri()))
    };
    let clients = HttpClients::bootstrap(&settings(&server, oauth), &default_collaborators()).unwrap();

    let err = clients
        .get("orders")
        .unwrap()
        .http
        .get("/orders")
        .send()
        .await
        .unwrap_err();

    assert!(matches!(err.root(), HttpError::Transport(_)));
}

#[test]
fn test_missing_credentials_source_fails_assembly() {
    let oauth = GlobalOAuthSettings::new("http://auth.local/token");
    let settings = Settings::default()
        .with_oauth(oauth)
        .with_client("orders", ClientSettings::default().with_oauth(&["orders.read"]));

    let err = HttpClients::bootstrap(&settings, &default_collaborators()).unwrap_err();

    assert_eq!(err.client_ids(), vec!["orders"]);
    assert!(err.to_string().contains("oauth.credentialsDirectory"));
}
