// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use kawasan_map::config::Config;
use kawasan_map::routes::create_router;
use kawasan_map::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceExt;

/// Create a test app reading the bundled datasets.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (Router, Arc<AppState>) {
    create_test_app_with(Config::default())
}

#[allow(dead_code)]
pub fn create_test_app_with(config: Config) -> (Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(config).expect("Failed to build app state"));
    (create_router(state.clone()), state)
}

/// Serve `app` on an ephemeral local port.
#[allow(dead_code)]
pub async fn spawn_server(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test server");
    let addr = listener.local_addr().expect("No local address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    addr
}

/// Send one request through a clone of the router.
#[allow(dead_code)]
pub async fn send(app: &Router, method: &str, uri: &str) -> Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

/// Read a JSON response body.
#[allow(dead_code)]
pub async fn json_body(response: Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).expect("Response is not JSON")
}

/// Send a request and check the status before decoding the body.
#[allow(dead_code)]
pub async fn send_json(
    app: &Router,
    method: &str,
    uri: &str,
    expected: StatusCode,
) -> serde_json::Value {
    let response = send(app, method, uri).await;
    assert_eq!(response.status(), expected, "{} {}", method, uri);
    json_body(response).await
}
