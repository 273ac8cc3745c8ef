//! End-to-end tests for the refresh channel at `/api/v1/ws`.
//!
//! The app is served on an ephemeral port and driven with a real WebSocket
//! client.

mod common;

use std::net::SocketAddr;
use std::time::Duration;

use axum::http::{Method, StatusCode};
use common::{admin_request, send, TestApp};
use futures::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn serve(app: &TestApp) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = app.app();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// Connect and wait until the server has attached the connection's listener.
async fn connect(app: &TestApp, addr: SocketAddr) -> Client {
    let before = app.state.hub.listener_count();
    let (client, _) = connect_async(format!("ws://{addr}/api/v1/ws")).await.unwrap();
    tokio::time::timeout(Duration::from_secs(2), async {
        while app.state.hub.listener_count() <= before {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("server should attach a refresh listener");
    client
}

/// Next text frame, parsed as JSON.
async fn next_frame(client: &mut Client) -> serde_json::Value {
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            match client.next().await {
                Some(Ok(Message::Text(text))) => return serde_json::from_str(&text).unwrap(),
                Some(Ok(_)) => continue,
                other => panic!("refresh channel closed: {other:?}"),
            }
        }
    })
    .await
    .expect("a refresh frame should arrive")
}

async fn send_frame(client: &mut Client, frame: serde_json::Value) {
    client.send(Message::Text(frame.to_string())).await.unwrap();
}

// ---------------------------------------------------------------------------
// Test: a publish from one tab reaches the other tabs
// ---------------------------------------------------------------------------

#[tokio::test]
async fn publish_from_one_client_reaches_another() {
    let app = common::build_test_app();
    let addr = serve(&app).await;
    let mut admin_tab = connect(&app, addr).await;
    let mut browse_tab = connect(&app, addr).await;

    send_frame(&mut admin_tab, json!({ "type": "publish" })).await;

    let frame = next_frame(&mut browse_tab).await;
    assert_eq!(frame["type"], "portfolio_updated");
    assert!(frame["timestamp"].is_string());

    // The publishing tab hears its own in-process update too.
    assert_eq!(next_frame(&mut admin_tab).await["type"], "portfolio_updated");
}

// ---------------------------------------------------------------------------
// Test: regaining focus triggers a refresh for that tab only
// ---------------------------------------------------------------------------

#[tokio::test]
async fn focus_refreshes_the_same_client() {
    let app = common::build_test_app();
    let addr = serve(&app).await;
    let mut tab = connect(&app, addr).await;

    send_frame(&mut tab, json!({ "type": "reload" })).await;
    send_frame(&mut tab, json!({ "type": "focus" })).await;

    assert_eq!(next_frame(&mut tab).await["type"], "portfolio_updated");
}

// ---------------------------------------------------------------------------
// Test: an admin mutation over HTTP notifies connected browsers
// ---------------------------------------------------------------------------

#[tokio::test]
async fn http_mutation_notifies_connected_clients() {
    let app = common::build_test_app();
    let addr = serve(&app).await;
    let mut tab = connect(&app, addr).await;

    let response = send(
        app.app(),
        admin_request(
            Method::POST,
            "/api/v1/portfolio",
            Some(json!({
                "title": "Launch film",
                "category": "promos",
                "youtube_url": "https://youtu.be/dQw4w9WgXcQ",
            })),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    assert_eq!(next_frame(&mut tab).await["type"], "portfolio_updated");
}

// ---------------------------------------------------------------------------
// Test: closing the socket detaches the listener
// ---------------------------------------------------------------------------

#[tokio::test]
async fn closing_detaches_listener() {
    let app = common::build_test_app();
    let addr = serve(&app).await;
    let mut tab = connect(&app, addr).await;
    assert_eq!(app.state.hub.listener_count(), 1);

    tab.close(None).await.unwrap();

    tokio::time::timeout(Duration::from_secs(2), async {
        while app.state.hub.listener_count() > 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("listener should detach after close");
}
