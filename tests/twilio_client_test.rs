use autodialer::config::{ProviderConfig, ProviderKind};
use autodialer::provider::{CallPlacementClient, PlaceCallRequest, TwilioCallClient};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CALLS_PATH: &str = "/2010-04-01/Accounts/AC123/Calls.json";

fn client(server: &MockServer) -> TwilioCallClient {
    TwilioCallClient::new(&ProviderConfig {
        kind: ProviderKind::Twilio,
        account_sid: "AC123".into(),
        auth_token: "token".into(),
        from_number: "+15005550006".into(),
        api_base_url: server.uri(),
        ..ProviderConfig::default()
    })
    .unwrap()
}

fn request() -> PlaceCallRequest {
    PlaceCallRequest {
        to: "+919876543210".into(),
        prompt_url: "https://dialer.test/calls/twiml".into(),
        status_callback_url: "https://dialer.test/calls/status?contact_id=7".into(),
        events: vec!["completed".into()],
    }
}

#[tokio::test]
async fn test_successful_placement_returns_call_sid() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CALLS_PATH))
        .and(header("authorization", "Basic QUMxMjM6dG9rZW4="))
        .and(body_string_contains("To=%2B919876543210"))
        .and(body_string_contains("StatusCallbackEvent=completed"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "sid": "CA42",
            "status": "queued"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let call_sid = client(&server).place(&request()).await.unwrap();

    assert_eq!(call_sid, "CA42");
}

#[tokio::test]
async fn test_rejected_placement_carries_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CALLS_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "code": 20003,
            "message": "Authenticate"
        })))
        .mount(&server)
        .await;

    let err = client(&server).place(&request()).await.unwrap_err();

    assert_eq!(err.http_status, Some(401));
    assert!(err.cause.contains("Authenticate (code 20003)"));
}

#[tokio::test]
async fn test_unreachable_provider_is_a_placement_error() {
    let client = TwilioCallClient::new(&ProviderConfig {
        kind: ProviderKind::Twilio,
        account_sid: "AC123".into(),
        auth_token: "token".into(),
        api_base_url: "http://127.0.0.1:1".into(),
        ..ProviderConfig::default()
    })
    .unwrap();

    let err = client.place(&request()).await.unwrap_err();

    assert_eq!(err.http_status, None);
    assert!(err.cause.starts_with("transport error"));
}
