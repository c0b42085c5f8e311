use super::*;
use crate::Config;
use crate::notify::{Mailer, Notifier};
use crate::pipeline::AggregationPipeline;
use crate::test_helpers::{FakeCatalog, RecordingMailer};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;


/// Test harness: router state over an in-memory catalog
struct TestApp {
    state: AppState,
    catalog: Arc<FakeCatalog>,
    mailer: Option<Arc<RecordingMailer>>,
}

impl TestApp {
    fn new(catalog: FakeCatalog) -> Self {
        Self::build(catalog, Config::default(), Some(Arc::new(RecordingMailer::default())))
    }

    fn without_mail(catalog: FakeCatalog) -> Self {
        Self::build(catalog, Config::default(), None)
    }

    fn build(catalog: FakeCatalog, config: Config, mailer: Option<Arc<RecordingMailer>>) -> Self {
        let catalog = Arc::new(catalog);
        let pipeline = AggregationPipeline::new(catalog.clone(), &config);
        let notifier = Notifier::new(
            pipeline.clone(),
            mailer.clone().map(|m| m as Arc<dyn Mailer>),
        );
        let state = AppState::new(pipeline, notifier, Arc::new(config));
        Self {
            state,
            catalog,
            mailer,
        }
    }

    fn router(&self) -> Router {
        create_router(self.state.clone())
    }

    async fn get(&self, uri: &str) -> Response {
        self.router()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn post_json(&self, uri: &str, body: serde_json::Value) -> Response {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.router().oneshot(request).await.unwrap()
    }
}

async fn json_body(response: Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_api_server_spawns() {
    let app = TestApp::new(FakeCatalog::default());

    let mut config = (*app.state.config).clone();
    config.api.bind_address = "127.0.0.1:0".parse().unwrap(); // Port 0 = OS assigns a free port
    let state = AppState {
        config: Arc::new(config),
        ..app.state.clone()
    };

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let api_handle = tokio::spawn(serve_until(state, async move {
        stop_rx.await.ok();
    }));

    tokio::time::sleep(Duration::from_millis(100)).await;
    stop_tx.send(()).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), api_handle)
        .await
        .expect("server should stop after the shutdown signal")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_cors_enabled() {
    let mut config = Config::default();
    config.api.cors_enabled = true;
    config.api.cors_origins = vec!["*".to_string()];
    let app = TestApp::build(FakeCatalog::default(), config, None);

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.router().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin"),
        "CORS header should be present when CORS is enabled"
    );
}

#[tokio::test]
async fn test_cors_specific_origin() {
    let mut config = Config::default();
    config.api.cors_enabled = true;
    config.api.cors_origins = vec!["https://localhost:7175".to_string()];
    let app = TestApp::build(FakeCatalog::default(), config, None);

    let allowed = Request::builder()
        .uri("/health")
        .header("Origin", "https://localhost:7175")
        .body(Body::empty())
        .unwrap();
    let response = app.router().oneshot(allowed).await.unwrap();
    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "https://localhost:7175"
    );

    let foreign = Request::builder()
        .uri("/health")
        .header("Origin", "https://evil.example")
        .body(Body::empty())
        .unwrap();
    let response = app.router().oneshot(foreign).await.unwrap();
    assert!(!response.headers().contains_key("access-control-allow-origin"));
}

#[tokio::test]
async fn test_cors_disabled() {
    let mut config = Config::default();
    config.api.cors_enabled = false;
    let app = TestApp::build(FakeCatalog::default(), config, None);

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.router().oneshot(request).await.unwrap();

    assert!(!response.headers().contains_key("access-control-allow-origin"));
}

#[tokio::test]
async fn test_swagger_ui_toggle() {
    let mut config = Config::default();
    config.api.swagger_ui = true;
    let app = TestApp::build(FakeCatalog::default(), config, None);
    let response = app.get("/api-docs/openapi.json").await;
    assert_eq!(response.status(), StatusCode::OK);

    let mut config = Config::default();
    config.api.swagger_ui = false;
    let app = TestApp::build(FakeCatalog::default(), config, None);
    let response = app.get("/api-docs/openapi.json").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
