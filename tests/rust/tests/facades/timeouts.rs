//! Socket timeout bounds each read, not the whole exchange

use std::time::Duration;

use httpmux_client::HttpClients;
use tests::{default_collaborators, ClientSettings, Settings, TimeSpan};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Serve one chunked response, writing a chunk every `gap`
async fn trickle_server(chunks: usize, gap: Duration) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 1024];
        let _ = socket.read(&mut request).await.unwrap();

        socket
            .write_all(b"HTTP/1.1 200 OK\r\ntransfer-encoding: chunked\r\n\r\n")
            .await
            .unwrap();
        for _ in 0..chunks {
            tokio::time::sleep(gap).await;
            socket.write_all(b"1\r\nx\r\n").await.unwrap();
            socket.flush().await.unwrap();
        }
        socket.write_all(b"0\r\n\r\n").await.unwrap();
        socket.flush().await.unwrap();
    });
    format!("http://{}", addr)
}

fn settings(base_url: String, socket_timeout: TimeSpan) -> Settings {
    let client = ClientSettings {
        socket_timeout: Some(socket_timeout),
        ..ClientSettings::default()
    }
    .with_base_url(base_url);
    Settings::default().with_client("orders", client)
}

#[tokio::test(flavor = "multi_thread")]
async fn test_slow_body_within_read_timeout_completes() {
    // 4 chunks, 250ms apart: 1s total, each gap well under 600ms
    let base_url = trickle_server(4, Duration::from_millis(250)).await;
    let clients = HttpClients::bootstrap(
        &settings(base_url, TimeSpan::from_millis(600)),
        &default_collaborators(),
    )
    .unwrap();

    let response = clients
        .get("orders")
        .unwrap()
        .http
        .get("/orders")
        .send()
        .await
        .unwrap();

    assert_eq!(response.body().as_ref(), b"xxxx");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_stalled_read_times_out() {
    let base_url = trickle_server(1, Duration::from_millis(1500)).await;
    let clients = HttpClients::bootstrap(
        &settings(base_url, TimeSpan::from_millis(300)),
        &default_collaborators(),
    )
    .unwrap();

    let err = clients
        .get("orders")
        .unwrap()
        .http
        .get("/orders")
        .send()
        .await
        .unwrap_err();

    assert!(err.is_transient());
}
