//! In-memory vector index
//!
//! Stores embedded chunks for one document batch and answers
//! nearest-neighbor queries by cosine similarity. An index is immutable
//! once built; a new search builds a fresh index and swaps it in wholesale.

use crate::chunker::Chunk;
use crate::embeddings::Embedder;
use crate::errors::{AppError, Result};

/// A chunk paired with its embedding vector
#[derive(Debug, Clone)]
pub struct EmbeddedChunk {
    pub chunk: Chunk,
    pub vector: Vec<f32>,
}

/// A chunk returned from a query, with its similarity score
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// Immutable nearest-neighbor index over one chunk batch
#[derive(Debug)]
pub struct VectorIndex {
    entries: Vec<EmbeddedChunk>,
    dimension: usize,
}

impl VectorIndex {
    /// Build an index from embedded chunks.
    ///
    /// All vectors must share one dimension. Zero chunks is an error:
    /// a question is about to be asked against this index, and an empty
    /// one could only ever produce fabricated answers.
    pub fn build(entries: Vec<EmbeddedChunk>) -> Result<Self> {
        let dimension = entries
            .first()
            .map(|e| e.vector.len())
            .ok_or_else(|| AppError::EmptyInput {
                message: "Cannot build a vector index from zero chunks".to_string(),
            })?;

        if let Some(bad) = entries.iter().find(|e| e.vector.len() != dimension) {
            return Err(AppError::Internal {
                message: format!(
                    "Embedding dimension mismatch: expected {}, got {} for chunk {}",
                    dimension,
                    bad.vector.len(),
                    bad.chunk.sequence
                ),
            });
        }

        Ok(Self { entries, dimension })
    }

    /// Embed and index a chunk batch in one pass.
    pub async fn from_chunks(chunks: Vec<Chunk>, embedder: &dyn Embedder) -> Result<Self> {
        if chunks.is_empty() {
            return Err(AppError::EmptyInput {
                message: "Cannot build a vector index from zero chunks".to_string(),
            });
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = embedder.embed_batch(&texts).await?;

        if vectors.len() != chunks.len() {
            return Err(AppError::embedding(format!(
                "Embedder returned {} vectors for {} chunks",
                vectors.len(),
                chunks.len()
            )));
        }

        let entries = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| EmbeddedChunk { chunk, vector })
            .collect();

        Self::build(entries)
    }

    /// Return the `min(k, len)` most similar chunks for a query vector.
    ///
    /// Results are ordered by descending cosine similarity; ties break by
    /// ascending chunk sequence so low-cardinality inputs stay deterministic.
    pub fn query(&self, query_vector: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        if query_vector.len() != self.dimension {
            return Err(AppError::Internal {
                message: format!(
                    "Query vector dimension mismatch: expected {}, got {}",
                    self.dimension,
                    query_vector.len()
                ),
            });
        }

        let mut scored: Vec<ScoredChunk> = self
            .entries
            .iter()
            .map(|entry| ScoredChunk {
                chunk: entry.chunk.clone(),
                score: cosine_similarity(query_vector, &entry.vector),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.chunk.sequence.cmp(&b.chunk.sequence))
        });
        scored.truncate(k);

        Ok(scored)
    }

    /// Number of chunks in the index
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Embedding dimension shared by every stored vector
    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Cosine similarity between two vectors of equal length.
///
/// A zero-magnitude vector scores 0.0 against everything.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::MockEmbedder;

    fn chunk(text: &str, sequence: usize) -> Chunk {
        Chunk {
            text: text.to_string(),
            source_title: format!("Paper {}", sequence),
            sequence,
        }
    }

    fn entry(vector: Vec<f32>, sequence: usize) -> EmbeddedChunk {
        EmbeddedChunk {
            chunk: chunk("content", sequence),
            vector,
        }
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_build_rejects_empty_batch() {
        let err = VectorIndex::build(Vec::new()).unwrap_err();
        assert!(matches!(err, AppError::EmptyInput { .. }));
    }

    #[test]
    fn test_build_rejects_dimension_mismatch() {
        let entries = vec![entry(vec![1.0, 0.0], 0), entry(vec![1.0, 0.0, 0.0], 1)];
        let err = VectorIndex::build(entries).unwrap_err();
        assert!(matches!(err, AppError::Internal { .. }));
    }

    #[test]
    fn test_query_orders_by_descending_score() {
        let entries = vec![
            entry(vec![1.0, 0.0], 0),
            entry(vec![0.0, 1.0], 1),
            entry(vec![0.7, 0.7], 2),
        ];
        let index = VectorIndex::build(entries).unwrap();

        let results = index.query(&[1.0, 0.0], 3).unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].chunk.sequence, 0);
        assert_eq!(results[1].chunk.sequence, 2);
        assert_eq!(results[2].chunk.sequence, 1);
        for pair in results.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn test_query_ties_break_by_sequence() {
        // Identical vectors tie exactly; order must follow sequence
        let entries = vec![
            entry(vec![1.0, 1.0], 2),
            entry(vec![1.0, 1.0], 0),
            entry(vec![1.0, 1.0], 1),
        ];
        let index = VectorIndex::build(entries).unwrap();

        let results = index.query(&[1.0, 1.0], 3).unwrap();
        let order: Vec<usize> = results.iter().map(|r| r.chunk.sequence).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn test_query_with_large_k_returns_all() {
        let entries = vec![entry(vec![1.0, 0.0], 0), entry(vec![0.0, 1.0], 1)];
        let index = VectorIndex::build(entries).unwrap();

        let results = index.query(&[1.0, 1.0], 100).unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_query_rejects_wrong_dimension() {
        let index = VectorIndex::build(vec![entry(vec![1.0, 0.0], 0)]).unwrap();
        assert!(index.query(&[1.0, 0.0, 0.0], 1).is_err());
    }

    #[tokio::test]
    async fn test_from_chunks_builds_and_retrieves() {
        let embedder = MockEmbedder::new(64);
        let chunks = vec![
            chunk("quantum error correction with surface codes", 0),
            chunk("a survey of convolutional neural networks", 1),
        ];
        let index = VectorIndex::from_chunks(chunks, &embedder).await.unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.dimension(), 64);

        let query = embedder.embed("quantum error correction").await.unwrap();
        let results = index.query(&query, 1).unwrap();
        assert_eq!(results[0].chunk.sequence, 0);
    }

    #[tokio::test]
    async fn test_from_chunks_rejects_empty() {
        let embedder = MockEmbedder::new(8);
        let err = VectorIndex::from_chunks(Vec::new(), &embedder)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::EmptyInput { .. }));
    }
}
