//! HTTP surface tests driven through the router with `tower::ServiceExt`.

mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use autodialer::state_machine::ContactStatus;
use common::TestDialer;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

const FORM: &str = "application/x-www-form-urlencoded";

async fn send(app: Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

fn post_form(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, FORM)
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_start_batch_reports_first_contact() {
    let dialer = TestDialer::new();
    dialer.seed(&["+919876543210"]);

    let (status, body) = send(dialer.system.router(), post_form("/calls/start_batch", "")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Dialing started with +919876543210");
    assert_eq!(dialer.queue.pending_commands().len(), 1);
}

#[tokio::test]
async fn test_start_batch_with_empty_table() {
    let dialer = TestDialer::new();

    let (status, body) = send(dialer.system.router(), post_form("/calls/start_batch", "")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "No pending contacts.");
}

#[tokio::test]
async fn test_start_prompt_queues_extracted_number() {
    let dialer = TestDialer::new();

    let (status, body) = send(
        dialer.system.router(),
        post_form("/calls/start_prompt", "prompt=please+call+9876543210+now"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Calling +919876543210 based on your prompt.");
    assert_eq!(dialer.queue.pending_commands().len(), 1);
}

#[tokio::test]
async fn test_start_prompt_without_number_is_422() {
    let dialer = TestDialer::new();

    let (status, body) = send(
        dialer.system.router(),
        post_form("/calls/start_prompt", "prompt=no+numbers+here"),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["error"]["code"], "UNPROCESSABLE_ENTITY");
    assert_eq!(
        json["error"]["message"],
        "Could not find a phone number in your prompt."
    );
    assert!(dialer.queue.pending_commands().is_empty());
}

#[tokio::test]
async fn test_status_callback_applies_and_acknowledges() {
    let dialer = TestDialer::new();
    let ids = dialer.seed(&["+911111111111", "+912222222222"]);
    dialer.system.engine.dispatch(ids[0]).await.unwrap();

    let (status, body) = send(
        dialer.system.router(),
        post_form(
            &format!("/calls/status?contact_id={}", ids[0]),
            "CallSid=CA42&CallStatus=completed&CallDuration=37",
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());
    assert_eq!(dialer.contact(ids[0]).await.status.as_str(), "completed");

    let outcome = dialer.attempts(ids[0]).await.pop().unwrap();
    assert_eq!(outcome.provider_call_id.as_deref(), Some("CA42"));
    assert_eq!(outcome.duration_secs, Some(37));
    assert_eq!(dialer.queue.pending_commands()[0].contact_id, ids[1]);
}

#[tokio::test]
async fn test_status_callback_always_acknowledges() {
    let dialer = TestDialer::new();
    let id = dialer.seed(&["+919876543210"])[0];

    let requests = vec![
        post_form("/calls/status?contact_id=abc", "CallStatus=completed"),
        post_form("/calls/status?contact_id=999", "CallStatus=completed"),
        post_form("/calls/status", "CallStatus=completed"),
        post_form(&format!("/calls/status?contact_id={id}"), ""),
        Request::builder()
            .method(Method::POST)
            .uri(format!("/calls/status?contact_id={id}"))
            .body(Body::empty())
            .unwrap(),
    ];

    for request in requests {
        let (status, body) = send(dialer.system.router(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.is_empty());
    }

    assert_eq!(dialer.contact(id).await.status, ContactStatus::Pending);
    assert!(dialer.store.all_call_attempts().is_empty());
}

#[tokio::test]
async fn test_voice_prompt_is_xml() {
    let dialer = TestDialer::new();

    for method in [Method::GET, Method::POST] {
        let request = Request::builder()
            .method(method)
            .uri("/calls/twiml")
            .body(Body::empty())
            .unwrap();
        let response = dialer.system.router().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/xml; charset=utf-8"
        );
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(body.contains("<Response>"));
        assert!(body.contains("<Say"));
    }
}

#[tokio::test]
async fn test_contacts_snapshot() {
    let dialer = TestDialer::new();
    let ids = dialer.seed(&["+911111111111", "+912222222222"]);
    dialer.system.engine.dispatch(ids[0]).await.unwrap();

    let (status, body) = send(dialer.system.router(), get("/contacts")).await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    let contacts = json.as_array().unwrap();
    assert_eq!(contacts.len(), 2);
    assert_eq!(contacts[0]["phone_number"], "+911111111111");
    assert_eq!(contacts[0]["status"], "in_progress");
    assert_eq!(contacts[1]["status"], "pending");
}

#[tokio::test]
async fn test_call_log_snapshot_is_newest_first() {
    let dialer = TestDialer::new();
    let ids = dialer.seed(&["+911111111111", "+912222222222"]);
    dialer.client.push_failure("unverified number");
    dialer.system.trigger.start_batch().await.unwrap();
    dialer.drain().await;

    let (status, body) = send(dialer.system.router(), get("/call_logs")).await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    let entries = json.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["contact_id"], ids[1]);
    assert_eq!(entries[0]["status"], "started");
    assert_eq!(entries[0]["phone_number"], "+912222222222");
    assert_eq!(entries[1]["contact_id"], ids[0]);
    assert_eq!(entries[1]["status"], "error");
}

#[tokio::test]
async fn test_health() {
    let dialer = TestDialer::new();

    let (status, body) = send(dialer.system.router(), get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["store"], "healthy");
    assert_eq!(json["queue_depth"], 0);
    assert_eq!(json["environment"], "test");
}
