use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use uuid::Uuid;

use crate::proxy::error::ErrorResponse;
use crate::proxy::health::HealthHandler;
use crate::proxy::rewrite::{rewrite_middleware, ModelRewriter};
use crate::proxy::upstream::UpstreamClient;

#[derive(Clone)]
pub struct RouterEngine {
    health: Arc<HealthHandler>,
    upstream: Arc<UpstreamClient>,
}

impl RouterEngine {
    pub fn new(upstream: UpstreamClient) -> Self {
        Self {
            health: Arc::new(HealthHandler::new()),
            upstream: Arc::new(upstream),
        }
    }
}

/// Assemble the middleware chain explicitly: the rewriter stage is handed in
/// by the caller rather than registering itself anywhere.
pub fn build_router(engine: RouterEngine, rewriter: ModelRewriter) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .fallback(proxy_handler)
        .with_state(engine)
        .layer(middleware::from_fn_with_state(rewriter, rewrite_middleware))
}

async fn health_handler(State(state): State<RouterEngine>) -> Response {
    state.health.handle().await
}

async fn proxy_handler(State(state): State<RouterEngine>, req: Request<Body>) -> Response {
    let request_id = Uuid::new_v4().to_string();
    tracing::debug!(
        method = %req.method(),
        path = %req.uri().path(),
        request_id = %request_id,
        "Incoming request"
    );

    match state.upstream.forward(req).await {
        Ok(resp) => resp,
        Err(e) => {
            tracing::error!(
                request_id = %request_id,
                error = %e,
                error_type = %e.error_type(),
                "Request failed"
            );

            ErrorResponse::from_error(&e, &request_id)
        }
    }
}
