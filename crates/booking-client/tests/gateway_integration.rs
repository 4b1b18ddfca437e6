//! Integration tests for the authenticated gateway
//!
//! These tests use wiremock to stand in for the booking backend and exercise
//! credential decoration, the refresh-and-retry cycle and forced logout.

use booking_client::{
    ApiGateway, ApiRequest, ClientConfig, GatewayConfig, RefreshStrategy, SessionContext,
    SessionEvent, SessionStore, SessionTokens,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// =============================================================================
// Harness
// =============================================================================

struct Harness {
    server: MockServer,
    store: Arc<SessionStore>,
    gateway: ApiGateway,
    logouts: Arc<AtomicUsize>,
    resets: Arc<AtomicUsize>,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

async fn harness(tokens: Option<SessionTokens>, strategy: RefreshStrategy) -> Harness {
    init_tracing();
    let server = MockServer::start().await;

    let context = Arc::new(SessionContext::new());
    let gateway = ApiGateway::new(
        GatewayConfig::new(ClientConfig::new(server.uri())).with_refresh_strategy(strategy),
        context.clone(),
    )
    .unwrap();

    let store = Arc::new(SessionStore::ephemeral());
    if let Some(tokens) = tokens {
        store.sign_in(tokens).await.unwrap();
    }

    let logouts = Arc::new(AtomicUsize::new(0));
    let logouts_clone = logouts.clone();
    store.on_session_event(move |event| {
        if event == SessionEvent::SignedOut {
            logouts_clone.fetch_add(1, Ordering::SeqCst);
        }
    });

    let resets = Arc::new(AtomicUsize::new(0));
    let resets_clone = resets.clone();

    // Bound after the gateway exists
    context.bind_session(store.clone());
    context.bind_navigator(Arc::new(move || {
        resets_clone.fetch_add(1, Ordering::SeqCst);
    }));

    Harness { server, store, gateway, logouts, resets }
}

fn data(value: Value) -> Value {
    json!({ "data": value })
}

fn expired() -> ResponseTemplate {
    ResponseTemplate::new(401).set_body_json(json!({
        "error": "Unauthorized",
        "message": "Access token expired"
    }))
}

fn refreshed(access: &str, refresh: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(data(json!({
        "accessToken": access,
        "refreshToken": refresh
    })))
}

fn booking(id: &str) -> Value {
    json!({
        "id": id,
        "roomId": "r1",
        "userId": "u1",
        "title": "Standup",
        "startTime": "2026-10-19T09:00:00Z",
        "endTime": "2026-10-19T09:15:00Z",
        "status": "confirmed"
    })
}

// =============================================================================
// Decoration
// =============================================================================

#[tokio::test]
async fn test_request_carries_bearer() {
    let h = harness(Some(SessionTokens::new("A1", "R1")), RefreshStrategy::PerRequest).await;

    Mock::given(method("GET"))
        .and(path("/bookings/my"))
        .and(header("Authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(data(json!([]))))
        .expect(1)
        .mount(&h.server)
        .await;

    let bookings = h.gateway.bookings().mine().await.unwrap();
    assert!(bookings.is_empty());
}

#[tokio::test]
async fn test_campus_header_present_only_when_set() {
    let h = harness(Some(SessionTokens::new("A1", "R1")), RefreshStrategy::PerRequest).await;

    Mock::given(method("GET"))
        .and(path("/rooms"))
        .respond_with(ResponseTemplate::new(200).set_body_json(data(json!([]))))
        .expect(2)
        .mount(&h.server)
        .await;

    h.gateway.rooms().list(&Default::default()).await.unwrap();
    h.gateway.set_campus_id(Some("campus-7".to_string()));
    h.gateway.rooms().list(&Default::default()).await.unwrap();

    let requests = h.server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].headers.get("x-campus-id").is_none());
    assert_eq!(requests[1].headers.get("x-campus-id").unwrap(), "campus-7");
}

#[tokio::test]
async fn test_no_session_sends_no_authorization() {
    let h = harness(None, RefreshStrategy::PerRequest).await;

    Mock::given(method("GET"))
        .and(path("/campuses"))
        .respond_with(ResponseTemplate::new(200).set_body_json(data(json!([]))))
        .mount(&h.server)
        .await;

    h.gateway.campuses().list().await.unwrap();

    let requests = h.server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("authorization").is_none());
}

// =============================================================================
// Refresh and Retry
// =============================================================================

#[tokio::test]
async fn test_refresh_then_retry_with_new_credential() {
    let h = harness(Some(SessionTokens::new("A1", "R1")), RefreshStrategy::PerRequest).await;

    Mock::given(method("GET"))
        .and(path("/bookings/my"))
        .and(header("Authorization", "Bearer A1"))
        .respond_with(expired())
        .expect(1)
        .mount(&h.server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .and(body_json(json!({ "refreshToken": "R1" })))
        .respond_with(refreshed("A2", "R2"))
        .expect(1)
        .mount(&h.server)
        .await;

    Mock::given(method("GET"))
        .and(path("/bookings/my"))
        .and(header("Authorization", "Bearer A2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(data(json!([booking("b1")]))))
        .expect(1)
        .mount(&h.server)
        .await;

    let bookings = h.gateway.bookings().mine().await.unwrap();

    assert_eq!(bookings.len(), 1);
    assert_eq!(h.store.tokens(), Some(SessionTokens::new("A2", "R2")));
    assert_eq!(h.logouts.load(Ordering::SeqCst), 0);
    assert_eq!(h.resets.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_refresh_request_is_not_decorated() {
    let h = harness(Some(SessionTokens::new("A1", "R1")), RefreshStrategy::PerRequest).await;
    h.gateway.set_campus_id(Some("campus-7".to_string()));

    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .and(header("Authorization", "Bearer A1"))
        .respond_with(expired())
        .mount(&h.server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(refreshed("A2", "R2"))
        .mount(&h.server)
        .await;

    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .and(header("Authorization", "Bearer A2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(data(json!({
            "id": "u1", "name": "Alice", "email": "alice@example.com", "role": "super_admin"
        }))))
        .mount(&h.server)
        .await;

    h.gateway.auth().me().await.unwrap();

    let requests = h.server.received_requests().await.unwrap();
    let refresh = requests
        .iter()
        .find(|r| r.url.path() == "/auth/refresh")
        .unwrap();
    assert!(refresh.headers.get("authorization").is_none());
    assert!(refresh.headers.get("x-campus-id").is_none());
}

#[tokio::test]
async fn test_retry_carries_campus_header() {
    let h = harness(Some(SessionTokens::new("A1", "R1")), RefreshStrategy::PerRequest).await;
    h.gateway.set_campus_id(Some("campus-7".to_string()));

    Mock::given(method("GET"))
        .and(path("/admin/users"))
        .and(header("Authorization", "Bearer A1"))
        .respond_with(expired())
        .mount(&h.server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(refreshed("A2", "R2"))
        .mount(&h.server)
        .await;

    Mock::given(method("GET"))
        .and(path("/admin/users"))
        .and(header("Authorization", "Bearer A2"))
        .and(header("X-Campus-Id", "campus-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(data(json!([]))))
        .expect(1)
        .mount(&h.server)
        .await;

    h.gateway.admin().users().await.unwrap();
}

#[tokio::test]
async fn test_missing_refresh_credential_logs_out() {
    let h = harness(Some(SessionTokens::new("A1", "")), RefreshStrategy::PerRequest).await;

    Mock::given(method("GET"))
        .and(path("/bookings/my"))
        .respond_with(expired())
        .expect(1)
        .mount(&h.server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(refreshed("A2", "R2"))
        .expect(0)
        .mount(&h.server)
        .await;

    let err = h.gateway.execute(ApiRequest::get("/bookings/my")).await.unwrap_err();

    assert_eq!(err.status(), 401);
    assert_eq!(err.message(), "Access token expired");
    assert_eq!(h.logouts.load(Ordering::SeqCst), 1);
    assert_eq!(h.resets.load(Ordering::SeqCst), 1);
    assert!(!h.store.is_authenticated());
}

#[tokio::test]
async fn test_failed_refresh_propagates_original_401() {
    let h = harness(Some(SessionTokens::new("A1", "R1")), RefreshStrategy::PerRequest).await;

    Mock::given(method("GET"))
        .and(path("/bookings/my"))
        .respond_with(expired())
        .expect(1)
        .mount(&h.server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": "ServerError",
            "message": "refresh store unavailable"
        })))
        .expect(1)
        .mount(&h.server)
        .await;

    let err = h.gateway.bookings().mine().await.unwrap_err();

    match err {
        booking_client::Error::Api(api) => {
            assert_eq!(api.status(), 401);
            assert_eq!(api.message(), "Access token expired");
        }
        other => panic!("expected API error, got {:?}", other),
    }
    assert_eq!(h.logouts.load(Ordering::SeqCst), 1);
    assert_eq!(h.resets.load(Ordering::SeqCst), 1);
    assert!(h.store.tokens().is_none());
}

#[tokio::test]
async fn test_malformed_refresh_body_logs_out() {
    let h = harness(Some(SessionTokens::new("A1", "R1")), RefreshStrategy::PerRequest).await;

    Mock::given(method("GET"))
        .and(path("/rooms/r1"))
        .respond_with(expired())
        .mount(&h.server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&h.server)
        .await;

    let err = h.gateway.rooms().get("r1").await.unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert_eq!(h.logouts.load(Ordering::SeqCst), 1);
    assert_eq!(h.resets.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_refresh_network_failure_logs_out() {
    init_tracing();
    let server = MockServer::start().await;

    let context = Arc::new(SessionContext::new());
    let store = Arc::new(SessionStore::ephemeral());
    store.sign_in(SessionTokens::new("A1", "R1")).await.unwrap();
    context.bind_session(store.clone());

    let resets = Arc::new(AtomicUsize::new(0));
    let resets_clone = resets.clone();
    context.bind_navigator(Arc::new(move || {
        resets_clone.fetch_add(1, Ordering::SeqCst);
    }));

    Mock::given(method("GET"))
        .and(path("/bookings/my"))
        .respond_with(expired())
        .mount(&server)
        .await;

    // Outlives the client timeout, so the exchange fails at the transport
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(refreshed("A2", "R2").set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let gateway = ApiGateway::new(
        GatewayConfig::new(
            ClientConfig::new(server.uri()).with_timeout(Duration::from_millis(500)),
        ),
        context,
    )
    .unwrap();

    let err = gateway.execute(ApiRequest::get("/bookings/my")).await.unwrap_err();

    assert_eq!(err.status(), 401);
    assert!(!store.is_authenticated());
    assert_eq!(resets.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_retried_request_is_not_refreshed_again() {
    let h = harness(Some(SessionTokens::new("A1", "R1")), RefreshStrategy::PerRequest).await;

    Mock::given(method("GET"))
        .and(path("/bookings/my"))
        .respond_with(expired())
        .expect(1)
        .mount(&h.server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(refreshed("A2", "R2"))
        .expect(0)
        .mount(&h.server)
        .await;

    let mut request = ApiRequest::get("/bookings/my");
    request.mark_retried();

    let err = h.gateway.execute(request).await.unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(h.store.tokens(), Some(SessionTokens::new("A1", "R1")));
    assert_eq!(h.logouts.load(Ordering::SeqCst), 0);
    assert_eq!(h.resets.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_second_401_after_refresh_is_returned() {
    let h = harness(Some(SessionTokens::new("A1", "R1")), RefreshStrategy::PerRequest).await;

    Mock::given(method("GET"))
        .and(path("/admin/users"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "Unauthorized",
            "message": "Admin session required"
        })))
        .expect(2)
        .mount(&h.server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(refreshed("A2", "R2"))
        .expect(1)
        .mount(&h.server)
        .await;

    let err = h.gateway.execute(ApiRequest::get("/admin/users")).await.unwrap_err();

    assert_eq!(err.status(), 401);
    // The refresh itself succeeded, so the session survives
    assert_eq!(h.store.tokens(), Some(SessionTokens::new("A2", "R2")));
    assert_eq!(h.logouts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_non_401_failures_pass_through() {
    let h = harness(Some(SessionTokens::new("A1", "R1")), RefreshStrategy::PerRequest).await;

    Mock::given(method("GET"))
        .and(path("/rooms/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": "NotFound",
            "message": "Room not found"
        })))
        .mount(&h.server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(refreshed("A2", "R2"))
        .expect(0)
        .mount(&h.server)
        .await;

    let err = h.gateway.execute(ApiRequest::get("/rooms/missing")).await.unwrap_err();

    assert_eq!(err.status(), 404);
    assert_eq!(err.code(), "NotFound");
}

#[tokio::test]
async fn test_login_401_does_not_log_out() {
    let h = harness(Some(SessionTokens::new("A1", "R1")), RefreshStrategy::PerRequest).await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "Unauthorized",
            "message": "Invalid credentials"
        })))
        .expect(1)
        .mount(&h.server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(refreshed("A2", "R2"))
        .expect(0)
        .mount(&h.server)
        .await;

    let err = h.gateway.auth().login("alice@example.com", "wrong").await.unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert!(h.store.is_authenticated());
    assert_eq!(h.logouts.load(Ordering::SeqCst), 0);
    assert_eq!(h.resets.load(Ordering::SeqCst), 0);
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test]
async fn test_single_flight_refreshes_once() {
    let h = harness(Some(SessionTokens::new("A1", "R1")), RefreshStrategy::SingleFlight).await;

    Mock::given(method("GET"))
        .and(path("/bookings/my"))
        .and(header("Authorization", "Bearer A1"))
        .respond_with(expired())
        .mount(&h.server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(refreshed("A2", "R2").set_delay(Duration::from_millis(200)))
        .expect(1)
        .mount(&h.server)
        .await;

    Mock::given(method("GET"))
        .and(path("/bookings/my"))
        .and(header("Authorization", "Bearer A2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(data(json!([]))))
        .expect(2)
        .mount(&h.server)
        .await;

    let (first, second) = tokio::join!(h.gateway.bookings().mine(), h.gateway.bookings().mine());

    assert!(first.is_ok());
    assert!(second.is_ok());
    assert_eq!(h.store.tokens(), Some(SessionTokens::new("A2", "R2")));
}

#[tokio::test]
async fn test_per_request_refreshes_independently() {
    let h = harness(Some(SessionTokens::new("A1", "R1")), RefreshStrategy::PerRequest).await;

    Mock::given(method("GET"))
        .and(path("/bookings/my"))
        .and(header("Authorization", "Bearer A1"))
        .respond_with(expired())
        .expect(2)
        .mount(&h.server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .and(body_json(json!({ "refreshToken": "R1" })))
        .respond_with(refreshed("A2", "R2").set_delay(Duration::from_millis(200)))
        .expect(2)
        .mount(&h.server)
        .await;

    Mock::given(method("GET"))
        .and(path("/bookings/my"))
        .and(header("Authorization", "Bearer A2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(data(json!([]))))
        .expect(2)
        .mount(&h.server)
        .await;

    let (first, second) = tokio::join!(h.gateway.bookings().mine(), h.gateway.bookings().mine());

    assert!(first.is_ok());
    assert!(second.is_ok());
    assert_eq!(h.store.tokens(), Some(SessionTokens::new("A2", "R2")));

    let refreshes = h
        .server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|request| request.url.path() == "/auth/refresh")
        .count();
    assert_eq!(refreshes, 2);
    assert_eq!(h.logouts.load(Ordering::SeqCst), 0);
}

// =============================================================================
// End-to-end Scenario
// =============================================================================

#[tokio::test]
async fn test_login_expire_refresh_scenario() {
    let h = harness(None, RefreshStrategy::PerRequest).await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({ "email": "alice@example.com", "password": "hunter2" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(data(json!({
            "accessToken": "A1",
            "refreshToken": "R1",
            "user": { "id": "u1", "name": "Alice", "email": "alice@example.com", "role": "user" }
        }))))
        .expect(1)
        .mount(&h.server)
        .await;

    Mock::given(method("GET"))
        .and(path("/bookings/my"))
        .and(header("Authorization", "Bearer A1"))
        .respond_with(expired())
        .expect(1)
        .mount(&h.server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .and(body_json(json!({ "refreshToken": "R1" })))
        .respond_with(refreshed("A2", "R2"))
        .expect(1)
        .mount(&h.server)
        .await;

    Mock::given(method("GET"))
        .and(path("/bookings/my"))
        .and(header("Authorization", "Bearer A2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(data(json!([booking("b1")]))))
        .expect(1)
        .mount(&h.server)
        .await;

    let session = h.gateway.auth().login("alice@example.com", "hunter2").await.unwrap();
    h.store.sign_in(session.tokens()).await.unwrap();

    let bookings = h.gateway.bookings().mine().await.unwrap();

    assert_eq!(bookings[0].id, "b1");
    assert_eq!(h.store.tokens(), Some(SessionTokens::new("A2", "R2")));
    assert_eq!(h.logouts.load(Ordering::SeqCst), 0);
    assert_eq!(h.resets.load(Ordering::SeqCst), 0);
}
