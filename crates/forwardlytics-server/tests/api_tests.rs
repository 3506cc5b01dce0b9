//! Integration tests for the ingestion API.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server. Each test builds its own registry and registers
//! fake integrations into it.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use forwardlytics_core::model::now_epoch_seconds;
use forwardlytics_core::{
    Event, Identification, Integration, IntegrationError, IntegrationRegistry, Page,
};
use forwardlytics_server::router::build_router;
use forwardlytics_server::state::AppState;
use serde_json::Value;
use tower::ServiceExt;

const VALID_BODY: &str = r#"{
    "name": "something.created",
    "userID": "123",
    "properties": { "someCounter": 97 },
    "timestamp": 12345678
}"#;

// =========================================================================
// Test integrations
// =========================================================================

/// Records every call and always succeeds.
#[derive(Default)]
struct Recording {
    identified: Mutex<Vec<Identification>>,
    tracked: Mutex<Vec<Event>>,
    paged: Mutex<Vec<Page>>,
}

#[async_trait]
impl Integration for Recording {
    async fn identify(&self, identification: &Identification) -> Result<(), IntegrationError> {
        self.identified.lock().unwrap().push(identification.clone());
        Ok(())
    }

    async fn track(&self, event: &Event) -> Result<(), IntegrationError> {
        self.tracked.lock().unwrap().push(event.clone());
        Ok(())
    }

    async fn page(&self, page: &Page) -> Result<(), IntegrationError> {
        self.paged.lock().unwrap().push(page.clone());
        Ok(())
    }

    fn enabled(&self) -> bool {
        true
    }
}

/// Fails every call with a fixed message.
struct Failing {
    calls: AtomicUsize,
}

impl Failing {
    const fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    fn fail(&self) -> Result<(), IntegrationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(IntegrationError::other("some random error"))
    }
}

#[async_trait]
impl Integration for Failing {
    async fn identify(&self, _: &Identification) -> Result<(), IntegrationError> {
        self.fail()
    }

    async fn track(&self, _: &Event) -> Result<(), IntegrationError> {
        self.fail()
    }

    async fn page(&self, _: &Page) -> Result<(), IntegrationError> {
        self.fail()
    }

    fn enabled(&self) -> bool {
        true
    }
}

/// Would fail, but is never enabled.
struct Disabled;

#[async_trait]
impl Integration for Disabled {
    async fn identify(&self, _: &Identification) -> Result<(), IntegrationError> {
        Err(IntegrationError::other("disabled integration was called"))
    }

    async fn track(&self, _: &Event) -> Result<(), IntegrationError> {
        Err(IntegrationError::other("disabled integration was called"))
    }

    async fn page(&self, _: &Page) -> Result<(), IntegrationError> {
        Err(IntegrationError::other("disabled integration was called"))
    }

    fn enabled(&self) -> bool {
        false
    }
}

// =========================================================================
// Helpers
// =========================================================================

fn app(registry: &Arc<IntegrationRegistry>) -> Router {
    build_router(Arc::new(AppState::new(Arc::clone(registry))))
}

fn post(path: &str, body: &str) -> Request<Body> {
    Request::post(path)
        .header("content-type", "application/json")
        .body(Body::from(body.to_owned()))
        .unwrap()
}

async fn send(router: Router, request: Request<Body>) -> (StatusCode, String) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn send_json(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, body) = send(router, request).await;
    (status, serde_json::from_str(&body).unwrap())
}

fn message(json: &Value) -> &str {
    json["message"].as_str().unwrap()
}

// =========================================================================
// Identify
// =========================================================================

#[tokio::test]
async fn test_identify_when_not_post() {
    let registry = Arc::new(IntegrationRegistry::new());

    let (status, body) = send(
        app(&registry),
        Request::get("/identify").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("404 page not found"));
}

#[tokio::test]
async fn test_identify_options_is_not_found() {
    let registry = Arc::new(IntegrationRegistry::new());

    let (status, body) = send(
        app(&registry),
        Request::options("/identify").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("404 page not found"));
}

#[tokio::test]
async fn test_identify_preflight_is_not_found() {
    let registry = Arc::new(IntegrationRegistry::new());
    let request = Request::options("/identify")
        .header("origin", "https://example.com")
        .header("access-control-request-method", "POST")
        .body(Body::empty())
        .unwrap();

    let response = app(&registry).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(
        response
            .headers()
            .get("access-control-allow-origin")
            .is_none()
    );
}

#[tokio::test]
async fn test_identify_when_invalid_json() {
    let registry = Arc::new(IntegrationRegistry::new());
    let recording = Arc::new(Recording::default());
    registry.register("test-only-integration-called", recording.clone());

    let (status, json) = send_json(app(&registry), post("/identify", "invalid JSON here")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message(&json), "Invalid request.");
    assert!(recording.identified.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_identify_invalid_without_content_type() {
    let registry = Arc::new(IntegrationRegistry::new());
    let request = Request::post("/identify")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, json) = send_json(app(&registry), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message(&json), "Invalid request.");
}

#[tokio::test]
async fn test_identify_wrong_field_type_is_invalid() {
    let registry = Arc::new(IntegrationRegistry::new());

    let (status, json) = send_json(
        app(&registry),
        post("/identify", r#"{"userID": 123, "timestamp": 1}"#),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message(&json), "Invalid request.");
}

#[tokio::test]
async fn test_identify_null_body_is_invalid() {
    let registry = Arc::new(IntegrationRegistry::new());
    let recording = Arc::new(Recording::default());
    registry.register("test-only-integration-called", recording.clone());

    let (status, json) = send_json(app(&registry), post("/identify", "null")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message(&json), "Invalid request.");
    assert!(recording.identified.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_track_null_body_is_invalid() {
    let registry = Arc::new(IntegrationRegistry::new());

    let (status, json) = send_json(app(&registry), post("/track", "null")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message(&json), "Invalid request.");
}

#[tokio::test]
async fn test_identify_when_missing_parameters() {
    let registry = Arc::new(IntegrationRegistry::new());

    let (status, json) = send_json(app(&registry), post("/identify", "{}")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message(&json), "Missing parameters: userID, timestamp.");
}

#[tokio::test]
async fn test_identify_when_one_integration_fails() {
    let registry = Arc::new(IntegrationRegistry::new());
    registry.register("test-only-integration-failing", Arc::new(Failing::new()));
    registry.register(
        "test-only-integration-working",
        Arc::new(Recording::default()),
    );

    let (status, json) = send_json(app(&registry), post("/identify", VALID_BODY)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        message(&json),
        "Fatal error during identification with an integration \
         (test-only-integration-failing): some random error"
    );
}

#[tokio::test]
async fn test_identify_when_valid() {
    let registry = Arc::new(IntegrationRegistry::new());
    let recording = Arc::new(Recording::default());
    registry.register("test-only-integration-called", recording.clone());

    let (status, json) = send_json(app(&registry), post("/identify", VALID_BODY)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(message(&json), "Forwarding identify to integrations.");

    let calls = recording.identified.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].user_id, "123");
    assert_eq!(calls[0].timestamp, 12_345_678);
    assert_eq!(calls[0].user_traits["someCounter"], serde_json::json!(97));
    assert!(calls[0].received_at >= now_epoch_seconds() - 5);
    assert!(calls[0].received_at <= now_epoch_seconds());
}

#[tokio::test]
async fn test_identify_twice_is_dispatched_twice() {
    let registry = Arc::new(IntegrationRegistry::new());
    let recording = Arc::new(Recording::default());
    registry.register("test-only-integration-called", recording.clone());

    let (first, _) = send(app(&registry), post("/identify", VALID_BODY)).await;
    let (second, _) = send(app(&registry), post("/identify", VALID_BODY)).await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::OK);
    assert_eq!(recording.identified.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_identify_skips_disabled_integration() {
    let registry = Arc::new(IntegrationRegistry::new());
    registry.register("test-only-integration-disabled", Arc::new(Disabled));

    let (status, json) = send_json(app(&registry), post("/identify", VALID_BODY)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(message(&json), "Forwarding identify to integrations.");
}

#[tokio::test]
async fn test_removed_integration_is_not_called() {
    let registry = Arc::new(IntegrationRegistry::new());
    let failing = Arc::new(Failing::new());
    registry.register("test-only-integration-failing", failing.clone());
    registry.remove("test-only-integration-failing");

    let (status, _) = send(app(&registry), post("/identify", VALID_BODY)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(failing.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_two_failing_integrations_report_one_failure() {
    let registry = Arc::new(IntegrationRegistry::new());
    let a = Arc::new(Failing::new());
    let b = Arc::new(Failing::new());
    registry.register("failing-a", a.clone());
    registry.register("failing-b", b.clone());

    let (status, json) = send_json(app(&registry), post("/identify", VALID_BODY)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let msg = message(&json);
    assert!(msg.contains("(failing-a)") ^ msg.contains("(failing-b)"));
    assert_eq!(
        a.calls.load(Ordering::SeqCst) + b.calls.load(Ordering::SeqCst),
        1
    );
}

// =========================================================================
// Track
// =========================================================================

#[tokio::test]
async fn test_track_when_not_post() {
    let registry = Arc::new(IntegrationRegistry::new());

    let (status, _) = send(
        app(&registry),
        Request::put("/track").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_track_when_missing_parameters() {
    let registry = Arc::new(IntegrationRegistry::new());

    let (status, json) = send_json(app(&registry), post("/track", "{}")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        message(&json),
        "Missing parameters: userID, timestamp, name."
    );
}

#[tokio::test]
async fn test_track_when_missing_name() {
    let registry = Arc::new(IntegrationRegistry::new());

    let (status, json) = send_json(
        app(&registry),
        post("/track", r#"{"userID": "1", "timestamp": 2}"#),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message(&json), "Missing parameters: name.");
}

#[tokio::test]
async fn test_track_when_valid() {
    let registry = Arc::new(IntegrationRegistry::new());
    let recording = Arc::new(Recording::default());
    registry.register("test-only-integration-called", recording.clone());

    let (status, json) = send_json(app(&registry), post("/track", VALID_BODY)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(message(&json), "Forwarding track to integrations.");
    let calls = recording.tracked.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].name, "something.created");
    assert_eq!(calls[0].properties["someCounter"], serde_json::json!(97));
    assert!(recording.identified.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_track_when_integration_fails() {
    let registry = Arc::new(IntegrationRegistry::new());
    registry.register("test-only-integration-failing", Arc::new(Failing::new()));

    let (status, json) = send_json(app(&registry), post("/track", VALID_BODY)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        message(&json),
        "Fatal error during tracking with an integration \
         (test-only-integration-failing): some random error"
    );
}

// =========================================================================
// Page
// =========================================================================

#[tokio::test]
async fn test_page_when_invalid_json() {
    let registry = Arc::new(IntegrationRegistry::new());

    let (status, json) = send_json(app(&registry), post("/page", "")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message(&json), "Invalid request.");
}

#[tokio::test]
async fn test_page_when_valid() {
    let registry = Arc::new(IntegrationRegistry::new());
    let recording = Arc::new(Recording::default());
    registry.register("test-only-integration-called", recording.clone());

    let (status, json) = send_json(app(&registry), post("/page", VALID_BODY)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(message(&json), "Forwarding page to integrations.");
    assert_eq!(recording.paged.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_page_when_integration_fails() {
    let registry = Arc::new(IntegrationRegistry::new());
    registry.register("test-only-integration-failing", Arc::new(Failing::new()));

    let (status, json) = send_json(app(&registry), post("/page", VALID_BODY)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(
        message(&json).starts_with("Fatal error during page tracking with an integration")
    );
}

// =========================================================================
// Misc
// =========================================================================

#[tokio::test]
async fn test_health_lists_integrations() {
    let registry = Arc::new(IntegrationRegistry::new());
    registry.register("zeta", Arc::new(Disabled));
    registry.register("alpha", Arc::new(Recording::default()));

    let (status, json) = send_json(
        app(&registry),
        Request::get("/health").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["integrations"], serde_json::json!(["alpha", "zeta"]));
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let registry = Arc::new(IntegrationRegistry::new());

    let (status, body) = send(app(&registry), post("/alias", VALID_BODY)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("404 page not found"));
}
