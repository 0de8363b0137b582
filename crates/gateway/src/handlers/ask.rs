//! Ask handler
//!
//! Answers a question against the current knowledge base.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use validator::Validate;

use crate::AppState;
use scholarrag_common::{
    errors::{AppError, Result},
    metrics,
};

/// Ask request
#[derive(Debug, Deserialize, Validate)]
pub struct AskRequest {
    #[validate(length(min = 1, max = 2000))]
    pub question: String,
}

/// Ask response
#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub answer: String,
    pub sources: Vec<String>,
}

/// Answer a question about the most recently searched papers
pub async fn ask(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>> {
    let start = Instant::now();

    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: Some("question".to_string()),
    })?;

    if request.question.trim().is_empty() {
        return Err(AppError::Validation {
            message: "Question must not be empty".to_string(),
            field: Some("question".to_string()),
        });
    }

    let result = state
        .session
        .ask(
            &request.question,
            state.embedder.as_ref(),
            state.llm.as_ref(),
            state.config.retrieval.top_k,
        )
        .await?;

    let elapsed = start.elapsed().as_secs_f64();
    metrics::record_ask(elapsed, result.sources.len());

    tracing::info!(
        question = %request.question,
        sources = result.sources.len(),
        latency_ms = (elapsed * 1000.0) as u64,
        "Question answered"
    );

    Ok(Json(AskResponse {
        answer: result.answer,
        sources: result.sources,
    }))
}
