//! End-to-end tests of the HTTP API against a temporary submission log.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header};
use http_body_util::BodyExt;
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;

use persona_profile::config::{
    AccessConfig, Config, RateLimitConfig, ScoringConfig, ServerConfig, StoreConfig,
};
use persona_profile::error::NotificationError;
use persona_profile::notify::{MailTransport, OutgoingMessage, SubmissionNotifier};
use persona_profile::store::{JsonlSubmissionStore, SubmissionStore};
use persona_profile::web::{AppState, build_router};

const API_KEY: &str = "test-admin-key";

struct Harness {
    app: Router,
    _dir: tempfile::TempDir,
}

fn config(store_path: &Path, access: AccessConfig, rate_limit: RateLimitConfig) -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        scoring: ScoringConfig::default(),
        access,
        rate_limit,
        store: StoreConfig {
            path: store_path.to_path_buf(),
        },
        email: None,
    }
}

fn keyed_access() -> AccessConfig {
    AccessConfig {
        api_key: Some(SecretString::from(API_KEY.to_string())),
        allowed_origins: vec!["https://assess.example".to_string()],
        require_submission_api_key: false,
    }
}

fn harness_with(
    access: AccessConfig,
    rate_limit: RateLimitConfig,
    notifier: Option<Arc<SubmissionNotifier>>,
) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data/submissions.ndjson");
    let config = config(&path, access, rate_limit);
    let store: Arc<dyn SubmissionStore> = Arc::new(JsonlSubmissionStore::new(&path));
    let state = Arc::new(AppState::new(&config, store, notifier));
    Harness {
        app: build_router(state),
        _dir: dir,
    }
}

fn harness() -> Harness {
    harness_with(keyed_access(), RateLimitConfig::default(), None)
}

fn payload(name: &str, test_version: &str) -> Value {
    let answers: serde_json::Map<String, Value> = (1..=52)
        .map(|id| (id.to_string(), json!(if id % 3 == 0 { 5 } else { 3 })))
        .collect();
    json!({
        "candidateName": name,
        "candidateEmail": "candidate@example.com",
        "durationMinutes": 21,
        "testVersion": test_version,
        "answers": answers,
        "knownAssessments": { "mbti": "ENTJ", "disc": "D/I" }
    })
}

fn submit_request(body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/submissions")
        .header("content-type", "application/json")
        .header("x-api-key", API_KEY)
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn admin_get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("x-api-key", API_KEY)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(resp: Response<Body>) -> Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_text(resp: Response<Body>) -> String {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn health_reports_service_and_security_headers() {
    let h = harness();
    let resp = h
        .app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let headers = resp.headers();
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["referrer-policy"], "no-referrer");
    assert_eq!(
        headers["permissions-policy"],
        "camera=(), microphone=(), geolocation=()"
    );
    assert_eq!(
        body_json(resp).await,
        json!({"ok": true, "service": "personality-assessment-backend"})
    );
}

#[tokio::test]
async fn submission_requires_json_content_type() {
    let h = harness();
    let req = Request::builder()
        .method("POST")
        .uri("/api/submissions")
        .header("content-type", "text/plain")
        .body(Body::from("hello"))
        .unwrap();
    let resp = h.app.oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(
        body_json(resp).await,
        json!({"ok": false, "error": "Content-Type must be application/json"})
    );
}

#[tokio::test]
async fn accepted_submission_is_scored_stored_and_listed() {
    let h = harness();

    let resp = h
        .app
        .clone()
        .oneshot(submit_request(&payload("Ada Lovelace", "pilot-1")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["ok"], true);
    assert_eq!(body["emailed"], false);
    assert!(body["submissionId"].as_str().unwrap().starts_with("pers_"));
    assert_eq!(body["profile"]["answeredCount"], 52);
    assert_eq!(body["profile"]["rapidFlag"], false);
    assert_eq!(body["profile"]["calibration"]["hasKnown"], true);
    assert_eq!(body["profile"]["mbti"]["type"].as_str().unwrap().len(), 4);

    let resp = h
        .app
        .oneshot(admin_get("/api/submissions"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let listing = body_json(resp).await;
    assert_eq!(listing["count"], 1);
    assert_eq!(listing["rows"][0]["candidateName"], "Ada Lovelace");
    assert_eq!(listing["rows"][0]["roleLabel"], "Leadership Personality Profile");
    assert_eq!(listing["rows"][0]["submissionId"], body["submissionId"]);
}

#[tokio::test]
async fn email_typo_is_rejected_with_suggestion() {
    let h = harness();
    let mut body = payload("Ada", "pilot");
    body["candidateEmail"] = json!("ada@gmial.com");

    let resp = h.app.oneshot(submit_request(&body)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(resp).await["error"],
        "Possible candidateEmail typo. Did you mean ada@gmail.com?"
    );
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let h = harness();
    let req = Request::builder()
        .method("POST")
        .uri("/api/submissions")
        .header("content-type", "application/json")
        .header("x-api-key", API_KEY)
        .body(Body::from("{not json"))
        .unwrap();
    let resp = h.app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_origin_without_key_is_unauthorized() {
    let h = harness();
    let req = Request::builder()
        .method("POST")
        .uri("/api/submissions")
        .header("content-type", "application/json")
        .header("origin", "https://elsewhere.example")
        .body(Body::from(payload("Ada", "pilot").to_string()))
        .unwrap();
    let resp = h.app.oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_json(resp).await["error"],
        "Unauthorized submission origin or API key."
    );
}

#[tokio::test]
async fn allowed_origin_may_submit_without_key() {
    let h = harness();
    let req = Request::builder()
        .method("POST")
        .uri("/api/submissions")
        .header("content-type", "application/json")
        .header("origin", "https://assess.example")
        .body(Body::from(payload("Ada", "pilot").to_string()))
        .unwrap();
    let resp = h.app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn admin_endpoints_need_a_configured_key() {
    let h = harness_with(AccessConfig::default(), RateLimitConfig::default(), None);
    let resp = h
        .app
        .oneshot(admin_get("/api/submissions"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_json(resp).await["error"],
        "API_KEY is required for this endpoint."
    );
}

#[tokio::test]
async fn wrong_admin_key_is_rejected() {
    let h = harness();
    let req = Request::builder()
        .uri("/api/admin/submissions/download")
        .header("x-api-key", "nope")
        .body(Body::empty())
        .unwrap();
    let resp = h.app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await["error"], "Unauthorized API key.");
}

#[tokio::test]
async fn submissions_are_rate_limited_per_client() {
    let limits = RateLimitConfig {
        window: Duration::from_secs(600),
        max_submissions: 2,
        max_admin: 120,
    };
    let h = harness_with(keyed_access(), limits, None);

    let request_from = |client: &str| {
        let mut req = submit_request(&payload("Ada", "pilot"));
        req.headers_mut()
            .insert("x-forwarded-for", format!("10.0.0.1, {client}").parse().unwrap());
        req
    };

    for _ in 0..2 {
        let resp = h.app.clone().oneshot(request_from("203.0.113.9")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
    let resp = h.app.clone().oneshot(request_from("203.0.113.9")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body_json(resp).await["error"], "Rate limit exceeded");

    let resp = h.app.oneshot(request_from("198.51.100.4")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn listing_filters_by_test_version_and_limit() {
    let h = harness();
    for (name, version) in [("A", "v1"), ("B", "v2"), ("C", "v1")] {
        let resp = h
            .app
            .clone()
            .oneshot(submit_request(&payload(name, version)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let listing = body_json(
        h.app
            .clone()
            .oneshot(admin_get("/api/submissions?testVersion=v1"))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(listing["count"], 2);
    assert_eq!(listing["rows"][0]["candidateName"], "C");
    assert_eq!(listing["rows"][1]["candidateName"], "A");

    // The filter runs after the limit is applied.
    let listing = body_json(
        h.app
            .oneshot(admin_get("/api/submissions?limit=2&testVersion=v1"))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(listing["count"], 1);
    assert_eq!(listing["rows"][0]["candidateName"], "C");
}

#[tokio::test]
async fn download_defaults_to_csv_attachment() {
    let h = harness();
    h.app
        .clone()
        .oneshot(submit_request(&payload("=cmd|calc", "pilot")))
        .await
        .unwrap();

    let resp = h
        .app
        .oneshot(admin_get("/api/admin/submissions/download"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "text/csv; charset=utf-8");
    let disposition = resp.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment; filename=\"personality-submissions-"));
    assert!(disposition.ends_with(".csv\""));

    let csv = body_text(resp).await;
    let mut lines = csv.lines();
    assert!(lines.next().unwrap().starts_with("submissionId,receivedAt,submittedAt,"));
    assert!(lines.next().unwrap().contains(",'=cmd|calc,"));
}

#[tokio::test]
async fn download_as_json() {
    let h = harness();
    h.app
        .clone()
        .oneshot(submit_request(&payload("Ada", "pilot")))
        .await
        .unwrap();

    let resp = h
        .app
        .oneshot(admin_get("/api/admin/submissions/download?format=JSON"))
        .await
        .unwrap();
    assert_eq!(
        resp.headers()[header::CONTENT_TYPE],
        "application/json; charset=utf-8"
    );
    assert!(
        resp.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .ends_with(".json\"")
    );
    let rows = body_json(resp).await;
    assert_eq!(rows.as_array().map(Vec::len), Some(1));
}

#[derive(Default)]
struct CapturingTransport {
    sent: Mutex<Vec<OutgoingMessage>>,
}

#[async_trait]
impl MailTransport for CapturingTransport {
    async fn send(&self, message: &OutgoingMessage) -> Result<(), NotificationError> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

#[tokio::test]
async fn configured_notifier_emails_each_submission() {
    let transport = Arc::new(CapturingTransport::default());
    let notifier = Arc::new(SubmissionNotifier::new(
        transport.clone(),
        "noreply@example.com",
        "hiring@example.com",
        Some("lead@example.com".to_string()),
    ));
    let h = harness_with(keyed_access(), RateLimitConfig::default(), Some(notifier));

    let resp = h
        .app
        .oneshot(submit_request(&payload("Grace Hopper", "pilot")))
        .await
        .unwrap();
    assert_eq!(body_json(resp).await["emailed"], true);

    let sent = transport.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].subject.starts_with("Personality Submission [pilot] - Grace Hopper - "));
    assert_eq!(sent[0].cc.as_deref(), Some("lead@example.com"));
    assert!(sent[0].body.contains("Known MBTI: ENTJ"));
}
