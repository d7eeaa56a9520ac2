use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode};
use axum::Router;
use hervival_api::{build_app, build_router, ApiConfig, ApiState};
use hervival_core::{FixedPicker, KeywordResponder, StarterPicker};
use serde_json::{json, Value};
use tower::ServiceExt;

fn app() -> Router {
    let responder = KeywordResponder::new(Arc::new(FixedPicker(0)));
    build_router(ApiState::new(&ApiConfig::default(), responder))
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn read_json(response: axum::response::Response) -> Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

async fn health_metrics(app: &Router) -> Value {
    let response = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    read_json(response).await["metrics"].clone()
}

fn limited_app(max: usize, trust_forwarded_for: bool) -> Router {
    let config = ApiConfig {
        rate_limit_window: Duration::from_secs(60),
        rate_limit_max: max,
        trust_forwarded_for,
        ..ApiConfig::default()
    };
    build_router(ApiState::new(&config, KeywordResponder::default()))
}

fn chat_from(forwarded_for: &str) -> Request<Body> {
    let mut request = post_json("/chat", json!({ "message": "hi" }));
    request
        .headers_mut()
        .insert("x-forwarded-for", forwarded_for.parse().unwrap());
    request
}

struct BrokenPicker;

impl StarterPicker for BrokenPicker {
    fn pick(&self, _len: usize) -> usize {
        panic!("starter pool unavailable")
    }
}

#[tokio::test]
async fn health_reports_metrics() {
    let app = build_app(&ApiConfig::default());

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let parsed = read_json(response).await;
    assert_eq!(parsed["status"], "ok");
    assert_eq!(parsed["metrics"]["requests_total"], 0);
}

#[tokio::test]
async fn crisis_message_returns_high_priority_with_resources() {
    let response = app()
        .oneshot(post_json(
            "/chat",
            json!({ "message": "I want to kill myself", "emotion": "sad", "confidence": 0.4 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let parsed = read_json(response).await;
    assert_eq!(parsed["priority"], "high");
    let resources = parsed["resources"].as_array().expect("resources present");
    assert_eq!(resources[0]["contact"], "988");
    assert!(parsed.get("error").is_none());
}

#[tokio::test]
async fn unmatched_message_falls_back_to_low_priority() {
    let response = app()
        .oneshot(post_json("/chat", json!({ "message": "what a plain afternoon" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let parsed = read_json(response).await;
    assert_eq!(parsed["priority"], "low");
    assert!(parsed["response"]
        .as_str()
        .unwrap()
        .starts_with("Thank you for sharing with me."));
    assert!(parsed.get("resources").is_none());
}

#[tokio::test]
async fn empty_message_prompts_regardless_of_other_fields() {
    for body in [
        json!({ "message": "" }),
        json!({}),
        json!({ "message": "", "emotion": "lonely", "confidence": 0.99 }),
        json!({ "message": null, "emotion": 12, "confidence": "high" }),
    ] {
        let response = app().oneshot(post_json("/chat", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let parsed = read_json(response).await;
        assert_eq!(parsed["priority"], "low");
        assert!(parsed["response"]
            .as_str()
            .unwrap()
            .contains("haven't shared anything yet"));
    }
}

#[tokio::test]
async fn falsy_message_values_prompt_for_input() {
    for message in [json!(false), json!(0), json!([]), json!({})] {
        let response = app()
            .oneshot(post_json("/chat", json!({ "message": message })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let parsed = read_json(response).await;
        assert_eq!(parsed["priority"], "low");
        assert!(parsed["response"]
            .as_str()
            .unwrap()
            .contains("haven't shared anything yet"));
    }
}

#[tokio::test]
async fn non_text_message_is_a_failure() {
    let app = app();
    let response = app
        .clone()
        .oneshot(post_json("/chat", json!({ "message": true })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let parsed = read_json(response).await;
    assert_eq!(parsed["priority"], "medium");
    assert!(parsed["error"].as_str().unwrap().contains("boolean"));
    assert_eq!(health_metrics(&app).await["failures_total"], 1);
}

#[tokio::test]
async fn panicking_chat_returns_apology_and_counts_failure() {
    let responder = KeywordResponder::new(Arc::new(BrokenPicker));
    let app = build_router(ApiState::new(&ApiConfig::default(), responder));

    let response = app
        .clone()
        .oneshot(post_json("/chat", json!({ "message": "the weather is mild" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let parsed = read_json(response).await;
    assert_eq!(parsed["priority"], "medium");
    assert!(parsed["response"]
        .as_str()
        .unwrap()
        .starts_with("I'm having a moment of difficulty"));
    assert!(parsed["error"]
        .as_str()
        .unwrap()
        .contains("starter pool unavailable"));

    let metrics = health_metrics(&app).await;
    assert_eq!(metrics["requests_total"], 1);
    assert_eq!(metrics["failures_total"], 1);
}

#[tokio::test]
async fn chat_outcomes_are_counted_by_rule() {
    let app = app();
    for message in ["what a plain afternoon", "I feel so alone", "he beats me", ""] {
        let response = app
            .clone()
            .oneshot(post_json("/chat", json!({ "message": message })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let metrics = health_metrics(&app).await;
    assert_eq!(metrics["requests_total"], 4);
    assert_eq!(metrics["fallback_replies_total"], 1);
    assert_eq!(metrics["emotion_replies_total"], 1);
    assert_eq!(metrics["crisis_replies_total"], 1);
    assert_eq!(metrics["empty_messages_total"], 1);
    assert_eq!(metrics["failures_total"], 0);
}

#[tokio::test]
async fn malformed_body_returns_apology_with_500() {
    let request = Request::builder()
        .method("POST")
        .uri("/chat")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let parsed = read_json(response).await;
    assert_eq!(parsed["priority"], "medium");
    assert!(parsed["response"]
        .as_str()
        .unwrap()
        .starts_with("I'm having a moment of difficulty"));
    assert!(parsed["error"].as_str().is_some());
}

#[tokio::test]
async fn crisis_check_reports_max_severity() {
    let response = app()
        .oneshot(post_json(
            "/crisis/check",
            json!({ "text": "I feel hopeless and I want to die" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let parsed = read_json(response).await;
    assert_eq!(parsed["is_crisis"], true);
    assert_eq!(parsed["severity"], 5);
    assert_eq!(parsed["matched_patterns"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn resources_filter_by_category_or_list_all() {
    let app = app();

    let single = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/resources?category=legal_aid")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let single = read_json(single).await;
    assert_eq!(single["category"], "legal_aid");
    assert_eq!(single["resources"].as_array().unwrap().len(), 2);

    let all = app
        .oneshot(
            Request::builder()
                .uri("/resources?category=unknown")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let all = read_json(all).await;
    assert!(all["category"].is_null());
    assert_eq!(all["resources"].as_array().unwrap().len(), 9);
}

#[tokio::test]
async fn near_miss_category_lists_everything() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/resources?category=legal")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let parsed = read_json(response).await;
    assert!(parsed["category"].is_null());
    assert_eq!(parsed["resources"].as_array().unwrap().len(), 9);
}

#[tokio::test]
async fn self_care_lists_exercises() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/self-care?kind=breathing")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let parsed = read_json(response).await;
    assert_eq!(parsed["kind"], "breathing");
    assert_eq!(parsed["exercises"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn user_activity_acknowledges() {
    let response = app()
        .oneshot(post_json("/user/activity", json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["status"], "success");
}

#[tokio::test]
async fn unknown_route_is_a_json_404() {
    let response = app()
        .oneshot(Request::builder().uri("/counselors").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(read_json(response).await["priority"], "low");
}

#[tokio::test]
async fn rate_limit_rejects_excess_requests() {
    let config = ApiConfig {
        rate_limit_window: Duration::from_secs(60),
        rate_limit_max: 2,
        ..ApiConfig::default()
    };
    let app = build_router(ApiState::new(&config, KeywordResponder::default()));

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(post_json("/chat", json!({ "message": "hi" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .oneshot(post_json("/chat", json!({ "message": "hi" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().get("retry-after").is_some());
}

#[tokio::test]
async fn forwarded_header_does_not_reset_the_limit() {
    let app = limited_app(1, false);

    let first = app.clone().oneshot(chat_from("198.51.100.1")).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app.oneshot(chat_from("198.51.100.2")).await.unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn trusted_forwarded_header_keys_the_limit() {
    let app = limited_app(1, true);

    let first = app.clone().oneshot(chat_from("198.51.100.1")).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app.oneshot(chat_from("198.51.100.2")).await.unwrap();
    assert_eq!(second.status(), StatusCode::OK);
}

#[tokio::test]
async fn peers_are_limited_separately() {
    let app = limited_app(1, false);

    for peer in ["192.0.2.10:40000", "192.0.2.11:40000"] {
        let mut request = post_json("/chat", json!({ "message": "hi" }));
        let addr: SocketAddr = peer.parse().unwrap();
        request.extensions_mut().insert(ConnectInfo(addr));

        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
