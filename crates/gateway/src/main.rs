//! ScholarRAG API Gateway
//!
//! The entry point for all external API requests. Handles:
//! - Paper search and knowledge-base builds (`/api/search`)
//! - Question answering over the current knowledge base (`/api/ask`)
//! - Health probing of the language model (`/api/health`)
//! - Observability (logging, metrics, request tracing)

mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use scholarrag_common::{
    arxiv::{ArxivClient, PaperSearch},
    config::AppConfig,
    embeddings::{create_embedder, Embedder},
    llm::{ChatClient, LanguageModel},
    metrics,
    session::KnowledgeBaseSession,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub session: Arc<KnowledgeBaseSession>,
    pub search: Arc<dyn PaperSearch>,
    pub embedder: Arc<dyn Embedder>,
    pub llm: Arc<dyn LanguageModel>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load and validate configuration; provider misconfiguration fails
    // the boot here rather than the first request
    let config = AppConfig::load()?;
    config.validate()?;
    let config = Arc::new(config);

    // Initialize tracing
    init_tracing(&config);

    info!("Starting ScholarRAG API Gateway v{}", scholarrag_common::VERSION);

    // Initialize metrics
    metrics::register_metrics();

    // Wire up the external collaborators
    let search: Arc<dyn PaperSearch> = Arc::new(ArxivClient::new(&config.arxiv)?);
    let embedder = create_embedder(&config.embedding)?;
    let llm: Arc<dyn LanguageModel> = Arc::new(ChatClient::new(&config.llm)?);

    // Create app state with a fresh (Empty) session
    let state = AppState {
        config: config.clone(),
        session: Arc::new(KnowledgeBaseSession::new()),
        search,
        embedder,
        llm,
    };

    // Build the router
    let app = create_router(state);

    // Start the server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level));

    if config.observability.json_logging {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    // API routes
    let api_routes = Router::new()
        .route("/search", post(handlers::search::search))
        .route("/ask", post(handlers::ask::ask))
        .route("/health", get(handlers::health::health));

    // Compose the app
    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(request_id)
        .layer(propagate_id)
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
