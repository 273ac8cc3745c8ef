#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use creativestalk_events::RefreshHub;
use creativestalk_store::memory::{InMemoryMediaHost, InMemoryRecordStore};
use creativestalk_store::{AccessConfig, MediaHost, PortfolioAccess, RecordStore};
use http_body_util::BodyExt;
use tower::ServiceExt;

use creativestalk_api::config::ServerConfig;
use creativestalk_api::router::build_app_router;
use creativestalk_api::state::AppState;

pub const ADMIN_PASSWORD: &str = "letmein";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        admin_password: ADMIN_PASSWORD.to_string(),
    }
}

/// The app plus handles on its in-memory backends.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<InMemoryRecordStore>,
    pub media: Arc<InMemoryMediaHost>,
}

impl TestApp {
    pub fn app(&self) -> Router {
        self.router.clone()
    }
}

/// Build the full application router over in-memory backends, using the
/// same middleware stack as `main.rs`.
pub fn build_test_app() -> TestApp {
    build_test_app_with(InMemoryRecordStore::new())
}

pub fn build_test_app_with(store: InMemoryRecordStore) -> TestApp {
    let store = Arc::new(store);
    let media = Arc::new(InMemoryMediaHost::new("studio"));
    let access = PortfolioAccess::new(
        Some(Arc::clone(&store) as Arc<dyn RecordStore>),
        Some(Arc::clone(&media) as Arc<dyn MediaHost>),
        AccessConfig {
            bulk_delay: Duration::ZERO,
            ..AccessConfig::default()
        },
    );
    let config = test_config();
    let state = AppState::new(config.clone(), Arc::new(access), Arc::new(RefreshHub::default()));
    let router = build_app_router(state.clone(), &config);
    TestApp {
        router,
        state,
        store,
        media,
    }
}

/// App with neither a Record Store nor a Media Host.
pub fn build_unconfigured_app() -> Router {
    let config = test_config();
    let state = AppState::new(
        config.clone(),
        Arc::new(PortfolioAccess::unconfigured()),
        Arc::new(RefreshHub::default()),
    );
    build_app_router(state, &config)
}

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, path: &str) -> Response<Body> {
    let request = Request::builder().uri(path).body(Body::empty()).unwrap();
    send(app, request).await
}

/// A request carrying the admin password and an optional JSON body.
pub fn admin_request(method: Method, path: &str, body: Option<serde_json::Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(path)
        .header("x-admin-password", ADMIN_PASSWORD);
    match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
