//! Chat-completions → responses request rewriting.
//!
//! The rewriter runs as a middleware stage ahead of the proxy handler. For
//! requests whose path carries the chat-completions marker and whose JSON
//! body targets a configured model, it rewrites the path onto the responses
//! endpoint and collapses the `messages` list into a single `input` string.
//! Every precondition failure short of an unreadable body fails open: the
//! original bytes are forwarded unchanged.

use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::request::Parts;
use axum::http::uri::PathAndQuery;
use axum::http::{header, HeaderMap, HeaderValue, Request, Uri};
use axum::middleware::Next;
use axum::response::Response;
use http_body_util::BodyExt;
use serde_json::Value;
use uuid::Uuid;

use crate::config::RouteConfig;
use crate::proxy::error::{ErrorResponse, ProxyError};
use crate::proxy::events::{RewriteEvent, SharedSink, TransformFailure};

/// Path fragment identifying a chat-completions-style endpoint.
///
/// Matching is substring-based, not path-segment parsing; partial textual
/// overlaps elsewhere in the path also count as a match.
pub const CHAT_COMPLETIONS_MARKER: &str = "chat/completions";

/// Recognized marker forms and their responses counterparts, most specific
/// first. The generic form catches paths that carry the marker under
/// neither prefix.
const MARKER_FORMS: [(&str, &str); 3] = [
    ("v1/chat/completions", "v1/responses"),
    ("api/chat/completions", "api/responses"),
    (CHAT_COMPLETIONS_MARKER, "responses"),
];

/// Immutable rewrite stage shared across all in-flight requests.
#[derive(Clone)]
pub struct ModelRewriter {
    inner: Arc<RewriterInner>,
}

struct RewriterInner {
    /// Target model identifiers, compared for exact equality in order.
    models: Vec<String>,
    sink: SharedSink,
}

impl ModelRewriter {
    pub fn new(models: Vec<String>, sink: SharedSink) -> Self {
        Self {
            inner: Arc::new(RewriterInner { models, sink }),
        }
    }

    pub fn from_config(route: &RouteConfig, sink: SharedSink) -> Self {
        Self::new(route.target_models(), sink)
    }

    fn emit(&self, event: RewriteEvent<'_>) {
        self.inner.sink.emit(event);
    }

    fn is_target(&self, model: &str) -> bool {
        self.inner.models.iter().any(|target| target == model)
    }

    /// Run the rewrite decision sequence on one request.
    ///
    /// Returns the request to hand to the next stage, or a ready error
    /// response when the body could not be read (the only path that does
    /// not fail open).
    pub async fn apply(&self, req: Request<Body>) -> Result<Request<Body>, Response> {
        if !req.uri().path().contains(CHAT_COMPLETIONS_MARKER) {
            self.emit(RewriteEvent::PathSkipped {
                path: req.uri().path(),
            });
            return Ok(req);
        }

        let (mut parts, body) = req.into_parts();
        let original = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(err) => {
                self.emit(RewriteEvent::BodyReadFailed {
                    path: parts.uri.path(),
                });
                let error =
                    ProxyError::InvalidRequest(format!("Failed to read request body: {}", err));
                return Err(ErrorResponse::from_error(
                    &error,
                    &Uuid::new_v4().to_string(),
                ));
            }
        };

        let (final_bytes, transformed) = match self.transform(&mut parts, &original) {
            Some(bytes) => (bytes, true),
            None => (original, false),
        };

        set_content_length(&mut parts.headers, final_bytes.len());
        self.emit(RewriteEvent::Forwarded {
            path: parts.uri.path(),
            transformed,
        });
        Ok(Request::from_parts(parts, Body::from(final_bytes)))
    }

    /// Decide whether to rewrite and build the transformed body.
    ///
    /// Returns `Some(bytes)` with the re-serialized payload on success,
    /// `None` when the original bytes must be forwarded instead. The path
    /// in `parts` is rewritten as soon as the model matches; a transform
    /// failure after that point reverts only the body.
    fn transform(&self, parts: &mut Parts, original: &Bytes) -> Option<Bytes> {
        let payload: Value = match serde_json::from_slice(original) {
            Ok(value) => value,
            Err(_) => {
                self.emit(RewriteEvent::DecodeFailed {
                    path: parts.uri.path(),
                });
                return None;
            }
        };
        let Some(object) = payload.as_object() else {
            self.emit(RewriteEvent::DecodeFailed {
                path: parts.uri.path(),
            });
            return None;
        };

        let model = match object.get("model").and_then(Value::as_str) {
            Some(model) => model,
            None => {
                self.emit(RewriteEvent::NoModelMatch { model: None });
                return None;
            }
        };
        if !self.is_target(model) {
            self.emit(RewriteEvent::NoModelMatch {
                model: Some(model),
            });
            return None;
        }
        self.emit(RewriteEvent::ModelMatched { model });

        rewrite_request_path(parts);

        let Some(input) = join_messages(object.get("messages")) else {
            self.emit(RewriteEvent::TransformFailed {
                model,
                reason: TransformFailure::NoUsableMessages,
            });
            return None;
        };

        let mut transformed = object.clone();
        transformed.remove("messages");
        transformed.insert("input".to_string(), Value::String(input));

        match serde_json::to_vec(&Value::Object(transformed)) {
            Ok(bytes) => Some(Bytes::from(bytes)),
            Err(_) => {
                self.emit(RewriteEvent::TransformFailed {
                    model,
                    reason: TransformFailure::Encode,
                });
                None
            }
        }
    }
}

/// Middleware entry point: rewrite, then invoke the next stage exactly once.
pub async fn rewrite_middleware(
    State(rewriter): State<ModelRewriter>,
    req: Request<Body>,
    next: Next,
) -> Response {
    match rewriter.apply(req).await {
        Ok(req) => next.run(req).await,
        Err(response) => response,
    }
}

/// Replace the first marker occurrence in `path`, preserving whichever
/// recognized form was matched. Returns `None` when no marker is present.
pub fn rewrite_marker(path: &str) -> Option<String> {
    MARKER_FORMS
        .iter()
        .find(|(marker, _)| path.contains(marker))
        .map(|(marker, replacement)| path.replacen(marker, replacement, 1))
}

/// Rewrite the request path in place, keeping the query string.
///
/// The `Uri` is the single canonical path value; its escaped form is derived
/// by the `http` crate, so there is no second representation to keep in sync.
fn rewrite_request_path(parts: &mut Parts) {
    let Some(new_path) = rewrite_marker(parts.uri.path()) else {
        return;
    };
    let path_and_query = match parts.uri.query() {
        Some(query) => format!("{new_path}?{query}"),
        None => new_path,
    };
    let Ok(path_and_query) = path_and_query.parse::<PathAndQuery>() else {
        return;
    };
    let mut uri_parts = parts.uri.clone().into_parts();
    uri_parts.path_and_query = Some(path_and_query);
    if let Ok(uri) = Uri::from_parts(uri_parts) {
        parts.uri = uri;
    }
}

/// Join the non-empty string `content` values of `messages` with newlines,
/// preserving order. Entries that are not objects or lack a string content
/// are skipped. Returns `None` when nothing usable remains.
fn join_messages(messages: Option<&Value>) -> Option<String> {
    let items = messages?.as_array()?;
    let contents: Vec<&str> = items
        .iter()
        .filter_map(|item| item.get("content").and_then(Value::as_str))
        .filter(|content| !content.is_empty())
        .collect();
    if contents.is_empty() {
        None
    } else {
        Some(contents.join("\n"))
    }
}

fn set_content_length(headers: &mut HeaderMap, len: usize) {
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
}
