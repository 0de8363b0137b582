//! Search handler
//!
//! Searches arXiv for papers and rebuilds the knowledge base from the
//! results in one request.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use validator::Validate;

use crate::AppState;
use scholarrag_common::{
    arxiv::Document,
    chunker::ChunkingConfig,
    errors::{AppError, Result},
    metrics,
    session::BuildOutcome,
};

/// Highest result count a caller may request
const MAX_RESULTS_CAP: usize = 25;

/// Search request
#[derive(Debug, Deserialize, Validate)]
pub struct SearchRequest {
    #[validate(length(min = 1, max = 1000))]
    pub query: String,

    pub max_results: Option<usize>,
}

/// Search response
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub papers: Vec<Document>,
    pub count: usize,
}

/// Search for papers and rebuild the knowledge base from the results
pub async fn search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>> {
    let start = Instant::now();

    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: Some("query".to_string()),
    })?;

    if request.query.trim().is_empty() {
        return Err(AppError::Validation {
            message: "Query must not be empty".to_string(),
            field: Some("query".to_string()),
        });
    }

    // An explicit zero is honored as "no results, no build": the session
    // keeps whatever state it had.
    let max_results = match request.max_results {
        Some(0) => {
            return Ok(Json(SearchResponse {
                papers: Vec::new(),
                count: 0,
            }));
        }
        Some(n) => n.min(MAX_RESULTS_CAP),
        None => state.config.arxiv.default_max_results,
    };

    let papers = state.search.search(&request.query, max_results).await?;

    let chunking = ChunkingConfig {
        chunk_size: state.config.retrieval.chunk_size,
        chunk_overlap: state.config.retrieval.chunk_overlap,
    };

    let outcome = state
        .session
        .build_from(&papers, state.embedder.as_ref(), &chunking)
        .await?;

    let elapsed = start.elapsed().as_secs_f64();
    metrics::record_search(elapsed, papers.len());

    match outcome {
        BuildOutcome::Built { papers, chunks } => {
            tracing::info!(
                query = %request.query,
                papers = papers,
                chunks = chunks,
                latency_ms = (elapsed * 1000.0) as u64,
                "Search completed and knowledge base rebuilt"
            );
        }
        BuildOutcome::Skipped => {
            tracing::info!(query = %request.query, "Search returned no papers");
        }
    }

    let count = papers.len();
    Ok(Json(SearchResponse { papers, count }))
}
