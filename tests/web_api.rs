// HTTP boundary tests — drive the axum router in-process with tower's
// `oneshot` and stub collaborators behind the pipeline.

mod helpers;

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use helpers::{pipeline, Reply, Screen, StubGenerator, StubModerator};
use sieve::web::{build_router, AppState};

fn app(moderator: &Arc<StubModerator>, generator: &Arc<StubGenerator>) -> Router {
    build_router(AppState {
        pipeline: pipeline(moderator, generator),
    })
}

fn post_json(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/completions")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

fn as_json(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).unwrap()
}

#[tokio::test]
async fn successful_completion() {
    let moderator = Arc::new(StubModerator::new(Screen::Clean));
    let generator = Arc::new(StubGenerator::new(Reply::Text(
        "Paris is the capital of France.",
    )));

    let (status, body) = send(
        app(&moderator, &generator),
        post_json(
            r#"{"prompt": "What is the capital of France?", "systemMessage": "Be brief."}"#,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        as_json(&body),
        json!({
            "isSuccess": true,
            "message": "Content processed successfully.",
            "llmResponse": "Paris is the capital of France."
        })
    );
    assert_eq!(
        generator.received(),
        vec![(
            "What is the capital of France?".to_string(),
            "Be brief.".to_string()
        )]
    );
}

#[tokio::test]
async fn system_message_is_optional() {
    let moderator = Arc::new(StubModerator::new(Screen::Clean));
    let generator = Arc::new(StubGenerator::new(Reply::Text("Hello!")));

    let (status, body) = send(app(&moderator, &generator), post_json(r#"{"prompt": "Hi"}"#)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(as_json(&body)["isSuccess"], json!(true));
    assert_eq!(generator.received(), vec![("Hi".to_string(), String::new())]);
}

#[tokio::test]
async fn empty_prompt_is_client_error() {
    let moderator = Arc::new(StubModerator::new(Screen::Clean));
    let generator = Arc::new(StubGenerator::new(Reply::Text("unused")));

    for payload in [
        r#"{"prompt": ""}"#,
        r#"{"prompt": "   "}"#,
        r#"{}"#,
        r#"{"prompt": null}"#,
    ] {
        let (status, body) = send(app(&moderator, &generator), post_json(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "payload {payload}");
        assert_eq!(as_json(&body)["error"], json!("Prompt is required."));
    }

    assert_eq!(moderator.calls(), 0);
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn malformed_json_is_client_error() {
    let moderator = Arc::new(StubModerator::new(Screen::Clean));
    let generator = Arc::new(StubGenerator::new(Reply::Text("unused")));

    let (status, _) = send(app(&moderator, &generator), post_json("{not json")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(moderator.calls(), 0);
}

#[tokio::test]
async fn flagged_input_is_handled_outcome() {
    let moderator = Arc::new(StubModerator::new(Screen::Flag("Hate", 6)));
    let generator = Arc::new(StubGenerator::new(Reply::Text("unused")));

    let (status, body) = send(
        app(&moderator, &generator),
        post_json(r#"{"prompt": "flagged content"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        as_json(&body),
        json!({
            "isSuccess": false,
            "message": "Input content violates content safety guidelines.",
            "llmResponse": null
        })
    );
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn upstream_failure_hides_detail() {
    let moderator = Arc::new(StubModerator::new(Screen::Clean));
    let generator = Arc::new(StubGenerator::new(Reply::Fail));

    let (status, body) = send(
        app(&moderator, &generator),
        post_json(r#"{"prompt": "What is the capital of France?"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let text = String::from_utf8(body.clone()).unwrap();
    assert!(!text.contains("overloaded"), "upstream detail leaked: {text}");
    assert_eq!(
        as_json(&body),
        json!({
            "isSuccess": false,
            "message": "Failed to get response from Claude API.",
            "llmResponse": null
        })
    );
}

#[tokio::test]
async fn flagged_output_is_handled_outcome() {
    let reply = "violent reply";
    let moderator =
        Arc::new(StubModerator::new(Screen::Clean).on(reply, Screen::Flag("Violence", 6)));
    let generator = Arc::new(StubGenerator::new(Reply::Text(reply)));

    let (status, body) = send(
        app(&moderator, &generator),
        post_json(r#"{"prompt": "tell me a story"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let json = as_json(&body);
    assert_eq!(json["isSuccess"], json!(false));
    assert_eq!(
        json["message"],
        json!("LLM response violates content safety guidelines.")
    );
    assert_eq!(json["llmResponse"], Value::Null);
}

#[tokio::test]
async fn panic_becomes_bare_500() {
    let moderator = Arc::new(StubModerator::new(Screen::Clean));
    let generator = Arc::new(StubGenerator::new(Reply::Panic));

    let (status, body) = send(
        app(&moderator, &generator),
        post_json(r#"{"prompt": "boom"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.is_empty());
}

#[tokio::test]
async fn health_check() {
    let moderator = Arc::new(StubModerator::new(Screen::Clean));
    let generator = Arc::new(StubGenerator::new(Reply::Text("unused")));

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app(&moderator, &generator), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(as_json(&body), json!({"status": "ok"}));
}
