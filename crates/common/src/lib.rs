//! ScholarRAG Common Library
//!
//! Shared code for the ScholarRAG services including:
//! - arXiv search client and paper model
//! - Chunking, embedding, and vector-index pipeline
//! - Answer synthesis with source attribution
//! - Knowledge-base session lifecycle
//! - Error types and handling
//! - Configuration management
//! - Metrics and observability

pub mod arxiv;
pub mod chunker;
pub mod config;
pub mod embeddings;
pub mod errors;
pub mod index;
pub mod llm;
pub mod metrics;
pub mod session;
pub mod synthesizer;

// Re-export commonly used types
pub use arxiv::{ArxivClient, Document, PaperSearch};
pub use chunker::{Chunk, ChunkingConfig};
pub use config::AppConfig;
pub use embeddings::Embedder;
pub use errors::{AppError, Result};
pub use index::{ScoredChunk, VectorIndex};
pub use llm::LanguageModel;
pub use session::{BuildOutcome, KnowledgeBaseSession};
pub use synthesizer::SynthesizedAnswer;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default number of chunks retrieved per question
pub const DEFAULT_TOP_K: usize = 3;
