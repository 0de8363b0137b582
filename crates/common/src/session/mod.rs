//! Knowledge-base session
//!
//! Process-wide holder of the current paper batch and its vector index.
//! Two states: Empty (fresh) and Ready (index installed). A new search
//! rebuilds the whole index and swaps it in atomically; questions are
//! answered against whichever fully-built index is installed at the time.
//!
//! Builds are serialized by an async mutex held across the entire
//! chunk-embed-index pipeline, so state transitions are linearizable and
//! `ask` never observes a half-built index.

use crate::arxiv::Document;
use crate::chunker::{self, ChunkingConfig};
use crate::embeddings::Embedder;
use crate::errors::{AppError, Result};
use crate::index::VectorIndex;
use crate::llm::LanguageModel;
use crate::synthesizer::{SynthesizedAnswer, Synthesizer};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::info;

/// Result of a build attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    /// Knowledge base built and installed
    Built { papers: usize, chunks: usize },
    /// No documents supplied; prior state left untouched
    Skipped,
}

/// Papers and index, swapped together in one write
struct SessionState {
    papers: Vec<Document>,
    index: Option<Arc<VectorIndex>>,
}

/// Process-wide knowledge-base session
pub struct KnowledgeBaseSession {
    state: RwLock<SessionState>,
    build_lock: Mutex<()>,
}

impl KnowledgeBaseSession {
    /// Create an empty session
    pub fn new() -> Self {
        Self {
            state: RwLock::new(SessionState {
                papers: Vec::new(),
                index: None,
            }),
            build_lock: Mutex::new(()),
        }
    }

    /// Rebuild the knowledge base from a document batch.
    ///
    /// An empty batch is a benign no-op. Otherwise the full pipeline runs
    /// (chunk, embed, index) and the result replaces the prior index
    /// wholesale; the old index stays answerable until the swap.
    pub async fn build_from(
        &self,
        documents: &[Document],
        embedder: &dyn Embedder,
        config: &ChunkingConfig,
    ) -> Result<BuildOutcome> {
        // One builder at a time; completion order equals call order.
        let _guard = self.build_lock.lock().await;

        if documents.is_empty() {
            info!("No documents supplied, keeping existing knowledge base");
            return Ok(BuildOutcome::Skipped);
        }

        let chunks = chunker::split_documents(documents, config);
        let chunk_count = chunks.len();
        let index = VectorIndex::from_chunks(chunks, embedder).await?;

        let mut state = self.state.write().await;
        state.papers = documents.to_vec();
        state.index = Some(Arc::new(index));
        drop(state);

        info!(
            papers = documents.len(),
            chunks = chunk_count,
            "Knowledge base built"
        );

        Ok(BuildOutcome::Built {
            papers: documents.len(),
            chunks: chunk_count,
        })
    }

    /// Answer a question against the current knowledge base.
    ///
    /// Fails with `NoKnowledgeBase` while the session is Empty. The index
    /// snapshot is taken before the external calls, so a concurrent rebuild
    /// never mixes old and new chunks within one answer.
    pub async fn ask(
        &self,
        question: &str,
        embedder: &dyn Embedder,
        llm: &dyn LanguageModel,
        top_k: usize,
    ) -> Result<SynthesizedAnswer> {
        let index = {
            let state = self.state.read().await;
            state.index.clone().ok_or(AppError::NoKnowledgeBase)?
        };

        let query_vector = embedder.embed(question).await?;
        let retrieved = index.query(&query_vector, top_k)?;

        Synthesizer::new(llm).answer(question, &retrieved).await
    }

    /// Whether a knowledge base is installed
    pub async fn is_ready(&self) -> bool {
        self.state.read().await.index.is_some()
    }

    /// Number of papers in the current batch
    pub async fn paper_count(&self) -> usize {
        self.state.read().await.papers.len()
    }

    /// Number of chunks in the current index (0 while Empty)
    pub async fn chunk_count(&self) -> usize {
        self.state
            .read()
            .await
            .index
            .as_ref()
            .map(|i| i.len())
            .unwrap_or(0)
    }
}

impl Default for KnowledgeBaseSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::MockEmbedder;
    use crate::llm::StaticLanguageModel;

    fn doc(title: &str, summary: &str) -> Document {
        Document {
            title: title.to_string(),
            authors: vec!["A. Author".to_string()],
            summary: summary.to_string(),
            published: "2023-01-01".to_string(),
            source_url: "http://arxiv.org/pdf/0000.00000".to_string(),
            id: format!("http://arxiv.org/abs/{}", title),
        }
    }

    #[tokio::test]
    async fn test_ask_on_fresh_session_fails() {
        let session = KnowledgeBaseSession::new();
        let embedder = MockEmbedder::new(32);
        let llm = StaticLanguageModel::responding("answer");

        let err = session.ask("anything", &embedder, &llm, 3).await.unwrap_err();
        assert!(matches!(err, AppError::NoKnowledgeBase));
    }

    #[tokio::test]
    async fn test_empty_batch_is_a_noop() {
        let session = KnowledgeBaseSession::new();
        let embedder = MockEmbedder::new(32);

        let outcome = session
            .build_from(&[], &embedder, &ChunkingConfig::default())
            .await
            .unwrap();
        assert_eq!(outcome, BuildOutcome::Skipped);
        assert!(!session.is_ready().await);
        assert_eq!(session.paper_count().await, 0);
    }

    #[tokio::test]
    async fn test_build_then_ask() {
        let session = KnowledgeBaseSession::new();
        let embedder = MockEmbedder::new(64);
        let llm = StaticLanguageModel::responding("Grounded answer.");

        let outcome = session
            .build_from(
                &[doc("Paper A", "Quantum error correction with surface codes.")],
                &embedder,
                &ChunkingConfig::default(),
            )
            .await
            .unwrap();
        assert_eq!(
            outcome,
            BuildOutcome::Built {
                papers: 1,
                chunks: 1
            }
        );
        assert!(session.is_ready().await);

        let answer = session
            .ask("What about error correction?", &embedder, &llm, 3)
            .await
            .unwrap();
        assert_eq!(answer.answer, "Grounded answer.");
        assert_eq!(answer.sources, vec!["Paper A"]);
    }

    #[tokio::test]
    async fn test_rebuild_replaces_index_wholesale() {
        let session = KnowledgeBaseSession::new();
        let embedder = MockEmbedder::new(64);
        let llm = StaticLanguageModel::responding("answer");

        session
            .build_from(
                &[doc("Old Paper", "About superconductors.")],
                &embedder,
                &ChunkingConfig::default(),
            )
            .await
            .unwrap();

        session
            .build_from(
                &[doc("New Paper", "About reinforcement learning.")],
                &embedder,
                &ChunkingConfig::default(),
            )
            .await
            .unwrap();

        // Even a query aimed squarely at the old batch can only reach the
        // new chunks: the old index is gone.
        let answer = session
            .ask("About superconductors.", &embedder, &llm, 10)
            .await
            .unwrap();
        assert_eq!(answer.sources, vec!["New Paper"]);
        assert_eq!(session.paper_count().await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_builds_leave_consistent_state() {
        let session = Arc::new(KnowledgeBaseSession::new());
        let embedder = Arc::new(MockEmbedder::new(32));

        let mut handles = Vec::new();
        for i in 0..4 {
            let session = session.clone();
            let embedder = embedder.clone();
            handles.push(tokio::spawn(async move {
                let title = format!("Paper {}", i);
                session
                    .build_from(
                        &[doc(&title, "Some abstract text.")],
                        embedder.as_ref(),
                        &ChunkingConfig::default(),
                    )
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        // Builds are serialized: papers and index always describe the same
        // batch, whichever build won.
        assert!(session.is_ready().await);
        assert_eq!(session.paper_count().await, 1);
        assert_eq!(session.chunk_count().await, 1);
    }
}
