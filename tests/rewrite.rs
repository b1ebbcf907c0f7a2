//! End-to-end tests for the rewrite middleware: the real stage wired into an
//! axum router, with an echo handler standing in for the downstream stage.

use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::http::{header, Request, StatusCode};
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::any;
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use model_route::proxy::events::NoopSink;
use model_route::proxy::rewrite::{rewrite_middleware, ModelRewriter};

fn rewriter(models: &[&str]) -> ModelRewriter {
    ModelRewriter::new(
        models.iter().map(|m| m.to_string()).collect(),
        Arc::new(NoopSink),
    )
}

/// Echo handler: reports the path, query, and declared content-length the
/// downstream stage observed, and returns the body bytes it could read.
async fn echo_handler(req: Request<Body>) -> impl IntoResponse {
    let path = req.uri().path().to_string();
    let query = req.uri().query().unwrap_or("").to_string();
    let declared = req
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    let body = axum::body::to_bytes(req.into_body(), usize::MAX)
        .await
        .expect("downstream body read");
    (
        [
            ("x-seen-path", path),
            ("x-seen-query", query),
            ("x-declared-length", declared),
        ],
        body,
    )
}

fn app(models: &[&str]) -> Router {
    Router::new()
        .fallback(any(echo_handler))
        .layer(middleware::from_fn_with_state(
            rewriter(models),
            rewrite_middleware,
        ))
}

struct Forwarded {
    path: String,
    query: String,
    declared_length: String,
    body: Bytes,
}

async fn send(app: Router, uri: &str, body: &str) -> Forwarded {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::from(body.to_string()))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let header_value = |name: &str| {
        resp.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string()
    };
    let path = header_value("x-seen-path");
    let query = header_value("x-seen-query");
    let declared_length = header_value("x-declared-length");
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    Forwarded {
        path,
        query,
        declared_length,
        body,
    }
}

#[tokio::test]
async fn non_matching_path_passes_through_byte_identical() {
    let body = r#"{"model":"m1","messages":[{"content":"hi"}]}"#;
    let out = send(app(&["m1"]), "/v1/messages", body).await;
    assert_eq!(out.path, "/v1/messages");
    assert_eq!(out.body.as_ref(), body.as_bytes());
}

#[tokio::test]
async fn invalid_json_forwarded_unchanged() {
    let body = "this is {not json";
    let out = send(app(&["m1"]), "/v1/chat/completions", body).await;
    assert_eq!(out.path, "/v1/chat/completions");
    assert_eq!(out.body.as_ref(), body.as_bytes());
    assert_eq!(out.declared_length, body.len().to_string());
}

#[tokio::test]
async fn non_object_json_forwarded_unchanged() {
    let body = r#"["model","m1"]"#;
    let out = send(app(&["m1"]), "/v1/chat/completions", body).await;
    assert_eq!(out.path, "/v1/chat/completions");
    assert_eq!(out.body.as_ref(), body.as_bytes());
}

#[tokio::test]
async fn matching_model_rewrites_path_and_schema() {
    let body = r#"{"model":"m1","messages":[{"role":"user","content":"hi"}]}"#;
    let out = send(app(&["m1"]), "/v1/chat/completions", body).await;
    assert_eq!(out.path, "/v1/responses");

    let payload: Value = serde_json::from_slice(&out.body).unwrap();
    assert_eq!(payload["model"], "m1");
    assert_eq!(payload["input"], "hi");
    assert!(payload.get("messages").is_none());
    assert_eq!(out.declared_length, out.body.len().to_string());
}

#[tokio::test]
async fn non_matching_model_forwarded_unchanged() {
    let body = r#"{"model":"m2","messages":[{"content":"hi"}]}"#;
    let out = send(app(&["m1"]), "/v1/chat/completions", body).await;
    assert_eq!(out.path, "/v1/chat/completions");
    assert_eq!(out.body.as_ref(), body.as_bytes());
}

#[tokio::test]
async fn model_match_is_case_sensitive() {
    let body = r#"{"model":"M1","messages":[{"content":"hi"}]}"#;
    let out = send(app(&["m1"]), "/v1/chat/completions", body).await;
    assert_eq!(out.path, "/v1/chat/completions");
    assert_eq!(out.body.as_ref(), body.as_bytes());
}

#[tokio::test]
async fn missing_model_field_forwarded_unchanged() {
    let body = r#"{"messages":[{"content":"hi"}]}"#;
    let out = send(app(&["m1"]), "/v1/chat/completions", body).await;
    assert_eq!(out.path, "/v1/chat/completions");
    assert_eq!(out.body.as_ref(), body.as_bytes());
}

#[tokio::test]
async fn second_target_model_also_matches() {
    let body = r#"{"model":"m2","messages":[{"content":"hi"}]}"#;
    let out = send(app(&["m1", "m2"]), "/v1/chat/completions", body).await;
    assert_eq!(out.path, "/v1/responses");
}

#[tokio::test]
async fn message_join_preserves_order_and_skips_unusable() {
    let body = json!({
        "model": "m1",
        "messages": [
            {"content": "a"},
            {"role": "x"},
            {"content": ""},
            {"content": "b"}
        ]
    })
    .to_string();
    let out = send(app(&["m1"]), "/v1/chat/completions", &body).await;

    let payload: Value = serde_json::from_slice(&out.body).unwrap();
    assert_eq!(payload["input"], "a\nb");
}

#[tokio::test]
async fn unknown_fields_survive_transform() {
    let body = json!({
        "model": "m1",
        "temperature": 0.5,
        "metadata": {"trace": "abc"},
        "messages": [{"content": "hi"}]
    })
    .to_string();
    let out = send(app(&["m1"]), "/v1/chat/completions", &body).await;

    let payload: Value = serde_json::from_slice(&out.body).unwrap();
    assert_eq!(payload["temperature"], 0.5);
    assert_eq!(payload["metadata"]["trace"], "abc");
    assert_eq!(payload["input"], "hi");
    assert!(payload.get("messages").is_none());
}

#[tokio::test]
async fn only_first_marker_occurrence_rewritten() {
    let body = r#"{"model":"m1","messages":[{"content":"hi"}]}"#;
    let out = send(
        app(&["m1"]),
        "/v1/chat/completions/v1/chat/completions",
        body,
    )
    .await;
    assert_eq!(out.path, "/v1/responses/v1/chat/completions");
}

#[tokio::test]
async fn api_prefix_form_preserved() {
    let body = r#"{"model":"m1","messages":[{"content":"hi"}]}"#;
    let out = send(app(&["m1"]), "/api/chat/completions", body).await;
    assert_eq!(out.path, "/api/responses");
}

#[tokio::test]
async fn query_string_preserved_across_rewrite() {
    let body = r#"{"model":"m1","messages":[{"content":"hi"}]}"#;
    let out = send(app(&["m1"]), "/v1/chat/completions?stream=true", body).await;
    assert_eq!(out.path, "/v1/responses");
    assert_eq!(out.query, "stream=true");
}

#[tokio::test]
async fn empty_messages_reverts_body_but_not_path() {
    let body = r#"{"model":"m1","messages":[]}"#;
    let out = send(app(&["m1"]), "/v1/chat/completions", body).await;
    assert_eq!(out.path, "/v1/responses");
    assert_eq!(out.body.as_ref(), body.as_bytes());
    assert_eq!(out.declared_length, body.len().to_string());
}

#[tokio::test]
async fn all_unusable_messages_revert_body_but_not_path() {
    let body = r#"{"model":"m1","messages":[{"content":""},{"role":"user"}]}"#;
    let out = send(app(&["m1"]), "/v1/chat/completions", body).await;
    assert_eq!(out.path, "/v1/responses");
    assert_eq!(out.body.as_ref(), body.as_bytes());
}

#[tokio::test]
async fn missing_messages_reverts_body_but_not_path() {
    let body = r#"{"model":"m1"}"#;
    let out = send(app(&["m1"]), "/v1/chat/completions", body).await;
    assert_eq!(out.path, "/v1/responses");
    assert_eq!(out.body.as_ref(), body.as_bytes());
}

#[tokio::test]
async fn content_length_matches_body_on_all_paths() {
    let cases = [
        // transform success
        r#"{"model":"m1","messages":[{"content":"hello world"}]}"#,
        // no match
        r#"{"model":"other","messages":[{"content":"hi"}]}"#,
        // transform failure
        r#"{"model":"m1","messages":[]}"#,
        // undecodable
        "not json at all",
    ];
    for body in cases {
        let out = send(app(&["m1"]), "/v1/chat/completions", body).await;
        assert_eq!(
            out.declared_length,
            out.body.len().to_string(),
            "content-length mismatch for body: {body}"
        );
    }
}

#[tokio::test]
async fn unreadable_body_rejected_with_bad_request() {
    use std::pin::Pin;
    use std::task::{Context, Poll};

    struct FailingStream;

    impl futures_core::Stream for FailingStream {
        type Item = Result<Bytes, std::io::Error>;

        fn poll_next(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
            Poll::Ready(Some(Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "client went away",
            ))))
        }
    }

    let req = Request::builder()
        .method("POST")
        .uri("/v1/chat/completions")
        .body(Body::from_stream(FailingStream))
        .unwrap();
    let resp = app(&["m1"]).oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let payload: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(payload["error"]["type"], "invalid_request");
}

#[tokio::test]
async fn default_model_list_targets_builtin_identifier() {
    use model_route::config::{RouteConfig, DEFAULT_TARGET_MODEL};

    let rewriter = ModelRewriter::from_config(&RouteConfig::default(), Arc::new(NoopSink));
    let router = Router::new()
        .fallback(any(echo_handler))
        .layer(middleware::from_fn_with_state(rewriter, rewrite_middleware));

    let body = json!({
        "model": DEFAULT_TARGET_MODEL,
        "messages": [{"content": "hi"}]
    })
    .to_string();
    let req = Request::builder()
        .method("POST")
        .uri("/v1/chat/completions")
        .body(Body::from(body))
        .unwrap();
    let resp = router.oneshot(req).await.unwrap();
    assert_eq!(
        resp.headers().get("x-seen-path").unwrap(),
        "/v1/responses"
    );
}
