//! External HTTP client tests
//!
//! Runs the FCM and generation clients against wiremock doubles to verify
//! outcome classification and the degrade-to-empty parsing contract.

use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use hisho::config::{GenerationConfig, PushConfig};
use hisho::models::{ChatMessage, Event};
use hisho::services::generation::GeminiClient;
use hisho::services::push::{FcmClient, PushProvider, TokenOutcome};

fn push_config(endpoint: String) -> PushConfig {
    PushConfig {
        endpoint,
        project_id: "test-project".to_string(),
        auth_token: "test-token".to_string(),
        timeout_seconds: 5,
    }
}

fn generation_config(endpoint: String) -> GenerationConfig {
    GenerationConfig {
        endpoint,
        model: "models/gemini-2.0-flash".to_string(),
        api_key: "test-key".to_string(),
        timeout_seconds: 5,
    }
}

fn sample_event() -> Event {
    let now = Utc::now();
    Event {
        id: Uuid::new_v4(),
        user_id: "user-1".to_string(),
        title: "キャンプ".to_string(),
        start_time: now + Duration::days(7),
        end_time: Some(now + Duration::days(8)),
        location: Some("長野".to_string()),
        address: None,
        weather_info: None,
        advice: None,
        next_check_due: None,
        notify_at: None,
        notification_sented: false,
        created_at: now,
        updated_at: now,
    }
}

#[tokio::test]
async fn test_fcm_outcomes_are_classified_per_token() {
    let server = MockServer::start().await;
    let send_path = "/v1/projects/test-project/messages:send";

    Mock::given(method("POST"))
        .and(path(send_path))
        .and(body_string_contains("good-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "projects/test-project/messages/123"
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(send_path))
        .and(body_string_contains("dead-token"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": { "status": "UNREGISTERED", "message": "Requested entity was not found." }
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(send_path))
        .and(body_string_contains("busy-token"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": { "status": "QUOTA_EXCEEDED", "message": "Quota exceeded." }
        })))
        .mount(&server)
        .await;

    let client = FcmClient::new(&push_config(server.uri())).unwrap();
    let tokens = vec![
        "good-token".to_string(),
        "dead-token".to_string(),
        "busy-token".to_string(),
    ];

    let outcomes = client
        .send_multicast(&tokens, "title", "body")
        .await
        .unwrap();

    assert_eq!(outcomes.len(), 3);
    assert_eq!(outcomes[0], TokenOutcome::Delivered);
    assert_eq!(outcomes[1], TokenOutcome::Unregistered);
    assert!(matches!(outcomes[2], TokenOutcome::Failed(_)));
}

#[tokio::test]
async fn test_fcm_unreachable_provider_is_an_error() {
    // Point the client at a server that is not listening. A bare (non-pooled)
    // server is required: pooled servers from `MockServer::start()` keep
    // their listener open after drop.
    let server = MockServer::builder().start().await;
    let uri = server.uri();
    drop(server);

    let client = FcmClient::new(&push_config(uri)).unwrap();
    let tokens = vec!["a".to_string(), "b".to_string()];

    let result = client.send_multicast(&tokens, "title", "body").await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_generation_parses_fenced_suggestions() {
    let server = MockServer::start().await;

    let model_text = "こちらが提案です。\n```json\n{\"required\": [{\"item\": \"テント\", \"prepare_before\": 3}], \"optional\": [{\"item\": \"カメラ\", \"prepare_before\": 1}]}\n```";
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [
                { "content": { "parts": [ { "text": model_text } ] } }
            ]
        })))
        .mount(&server)
        .await;

    let client = GeminiClient::new(&generation_config(server.uri())).unwrap();
    let suggestions = client
        .suggest_checklist(&sample_event(), &[])
        .await
        .unwrap();

    assert_eq!(suggestions.required.len(), 1);
    assert_eq!(suggestions.required[0].item, "テント");
    assert_eq!(suggestions.required[0].prepare_before, 3);
    assert_eq!(suggestions.optional.len(), 1);
}

#[tokio::test]
async fn test_generation_degrades_to_empty_on_prose() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [
                { "content": { "parts": [ { "text": "申し訳ありませんが、ご要望にお応えできません。" } ] } }
            ]
        })))
        .mount(&server)
        .await;

    let client = GeminiClient::new(&generation_config(server.uri())).unwrap();
    let suggestions = client
        .suggest_checklist(&sample_event(), &["テント".to_string()])
        .await
        .unwrap();

    assert!(suggestions.is_empty());
}

#[tokio::test]
async fn test_weather_advice_returns_model_text() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [
                { "content": { "parts": [ { "text": "  絶好のキャンプ日和ですね。日焼け対策と水分補給を忘れずに。\n" } ] } }
            ]
        })))
        .mount(&server)
        .await;

    let client = GeminiClient::new(&generation_config(server.uri())).unwrap();
    let mut event = sample_event();
    event.weather_info = Some("2026-08-25 12:00 晴れ 28°C".to_string());

    let advice = client.weather_advice(&event).await.unwrap();

    // Surrounding whitespace is stripped before the advice is stored
    assert_eq!(advice, "絶好のキャンプ日和ですね。日焼け対策と水分補給を忘れずに。");
}

#[tokio::test]
async fn test_schedule_extraction_parses_model_json() {
    let server = MockServer::start().await;

    let model_text = "```json\n{\"title\": \"バーベキュー\", \"start_time\": \"2026-08-30T11:00:00+09:00\", \"end_time\": \"2026-08-30T15:00:00+09:00\", \"location\": \"多摩川河川敷\"}\n```";
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
        .and(body_string_contains("チャット履歴"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [
                { "content": { "parts": [ { "text": model_text } ] } }
            ]
        })))
        .mount(&server)
        .await;

    let client = GeminiClient::new(&generation_config(server.uri())).unwrap();
    let messages = vec![
        ChatMessage {
            role: "user".to_string(),
            text: "今度の日曜、バーベキューしない？".to_string(),
        },
        ChatMessage {
            role: "friend".to_string(),
            text: "いいね、11時に多摩川で！".to_string(),
        },
    ];

    let schedule = client.extract_event_schedule(&messages, 9).await.unwrap();

    assert_eq!(schedule.title.as_deref(), Some("バーベキュー"));
    assert_eq!(
        schedule.start_time.as_deref(),
        Some("2026-08-30T11:00:00+09:00")
    );
    assert_eq!(schedule.location.as_deref(), Some("多摩川河川敷"));
}

#[tokio::test]
async fn test_generation_http_error_propagates() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = GeminiClient::new(&generation_config(server.uri())).unwrap();
    let result = client.suggest_checklist(&sample_event(), &[]).await;

    assert!(result.is_err());
}
