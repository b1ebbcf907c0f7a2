//! Rewrite decision events.
//!
//! The rewriter reports what it decided through an injected sink instead of
//! logging inline, keeping the decision logic free of observability calls
//! and testable with a no-op sink.

use std::sync::Arc;

/// Why a schema transform was abandoned after a model match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformFailure {
    /// `messages` was absent, not an array, or had no usable entries.
    NoUsableMessages,
    /// Re-encoding the transformed payload failed.
    Encode,
}

/// One decision point in the rewrite sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteEvent<'a> {
    /// Path lacks the chat-completions marker; request passed through.
    PathSkipped { path: &'a str },
    /// Request body could not be read; request rejected.
    BodyReadFailed { path: &'a str },
    /// Body is not a JSON object; request forwarded unchanged.
    DecodeFailed { path: &'a str },
    /// `model` missing, non-string, or not a configured target.
    NoModelMatch { model: Option<&'a str> },
    /// `model` matched a configured target.
    ModelMatched { model: &'a str },
    /// Transform abandoned after a match; original body forwarded.
    TransformFailed {
        model: &'a str,
        reason: TransformFailure,
    },
    /// Request handed to the next stage.
    Forwarded { path: &'a str, transformed: bool },
}

/// Structured sink for rewrite decisions.
pub trait RewriteSink: Send + Sync {
    fn emit(&self, event: RewriteEvent<'_>);
}

/// Shared handle to a sink.
pub type SharedSink = Arc<dyn RewriteSink>;

/// Sink that reports decisions through `tracing`.
pub struct TracingSink;

impl RewriteSink for TracingSink {
    fn emit(&self, event: RewriteEvent<'_>) {
        match event {
            RewriteEvent::PathSkipped { path } => {
                tracing::trace!(path, "Path lacks chat-completions marker, passing through");
            }
            RewriteEvent::BodyReadFailed { path } => {
                tracing::warn!(path, "Failed to read request body, rejecting request");
            }
            RewriteEvent::DecodeFailed { path } => {
                tracing::debug!(path, "Body is not a JSON object, forwarding unchanged");
            }
            RewriteEvent::NoModelMatch { model } => {
                tracing::trace!(model = model.unwrap_or("<none>"), "Model not targeted");
            }
            RewriteEvent::ModelMatched { model } => {
                tracing::debug!(model, "Model matched, rewriting to responses endpoint");
            }
            RewriteEvent::TransformFailed { model, reason } => {
                tracing::warn!(model, ?reason, "Schema transform failed, forwarding original body");
            }
            RewriteEvent::Forwarded { path, transformed } => {
                tracing::debug!(path, transformed, "Forwarding request");
            }
        }
    }
}

/// Sink that discards all events.
pub struct NoopSink;

impl RewriteSink for NoopSink {
    fn emit(&self, _event: RewriteEvent<'_>) {}
}
