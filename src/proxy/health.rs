use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
}

pub struct HealthHandler;

impl HealthHandler {
    pub fn new() -> Self {
        Self
    }

    pub async fn handle(&self) -> Response {
        Json(HealthStatus {
            status: "healthy".to_string(),
            service: "model-route".to_string(),
        })
        .into_response()
    }
}

impl Default for HealthHandler {
    fn default() -> Self {
        Self::new()
    }
}
