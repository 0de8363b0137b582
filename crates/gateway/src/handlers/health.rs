//! Health check handler

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub llm_connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub knowledge_base_ready: bool,
}

/// Health probe - issues a trivial completion against the language model
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let knowledge_base_ready = state.session.is_ready().await;

    match state.llm.complete("Hello").await {
        Ok(_) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy".to_string(),
                llm_connected: true,
                error: None,
                knowledge_base_ready,
            }),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "unhealthy".to_string(),
                llm_connected: false,
                error: Some(e.to_string()),
                knowledge_base_ready,
            }),
        ),
    }
}
