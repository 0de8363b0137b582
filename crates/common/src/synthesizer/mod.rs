//! Answer synthesizer
//!
//! Builds a context-grounded prompt from retrieved chunks, invokes the
//! language model once, and attaches cited source titles. Source
//! attribution is a pure metadata lookup on the retrieved chunks, never a
//! parse of the model's free text.

use crate::errors::Result;
use crate::index::ScoredChunk;
use crate::llm::LanguageModel;
use serde::{Deserialize, Serialize};

/// Maximum number of source titles attached to an answer
pub const MAX_SOURCES: usize = 3;

/// A synthesized answer with its cited sources
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesizedAnswer {
    /// Generated answer text
    pub answer: String,

    /// Titles of the papers behind the retrieved context, deduplicated,
    /// in first-retrieved order, at most [`MAX_SOURCES`] entries
    pub sources: Vec<String>,
}

/// Synthesizer for generating grounded answers
pub struct Synthesizer<'a> {
    llm: &'a dyn LanguageModel,
}

impl<'a> Synthesizer<'a> {
    pub fn new(llm: &'a dyn LanguageModel) -> Self {
        Self { llm }
    }

    /// Answer a question from retrieved context.
    ///
    /// One opaque request/response exchange with the model; a failed or
    /// timed-out call propagates as `ServiceUnavailable` and no partial
    /// answer is ever returned.
    pub async fn answer(
        &self,
        question: &str,
        retrieved: &[ScoredChunk],
    ) -> Result<SynthesizedAnswer> {
        let prompt = build_prompt(question, retrieved);
        let answer = self.llm.complete(&prompt).await?;
        let sources = extract_sources(retrieved);

        tracing::info!(
            question = %question,
            context_chunks = retrieved.len(),
            sources = sources.len(),
            "Answer synthesized"
        );

        Ok(SynthesizedAnswer { answer, sources })
    }
}

/// Build the grounded prompt: fixed instructions, the retrieved chunk
/// texts in retrieval order, then the question.
pub fn build_prompt(question: &str, retrieved: &[ScoredChunk]) -> String {
    let mut prompt = String::from(
        "Use the following context to answer the user's question. \
        Answer ONLY from the supplied context. If you do not know the \
        answer, say you do not know rather than making one up. \
        Name the titles of the papers you draw on.\n\nContext:\n",
    );

    for scored in retrieved {
        prompt.push_str(&scored.chunk.text);
        prompt.push_str("\n\n");
    }

    prompt.push_str(&format!("Question: {}\n\nAnswer, citing your sources:", question));
    prompt
}

/// Collect cited source titles from chunk metadata: exact-title
/// deduplication, first-seen order, truncated to [`MAX_SOURCES`].
pub fn extract_sources(retrieved: &[ScoredChunk]) -> Vec<String> {
    let mut sources: Vec<String> = Vec::new();

    for scored in retrieved {
        let title = &scored.chunk.source_title;
        if !sources.contains(title) {
            sources.push(title.clone());
        }
    }

    sources.truncate(MAX_SOURCES);
    sources
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunker::Chunk;
    use crate::errors::AppError;
    use crate::llm::StaticLanguageModel;

    fn scored(text: &str, title: &str, sequence: usize) -> ScoredChunk {
        ScoredChunk {
            chunk: Chunk {
                text: text.to_string(),
                source_title: title.to_string(),
                sequence,
            },
            score: 1.0 - sequence as f32 * 0.1,
        }
    }

    #[test]
    fn test_prompt_contains_context_and_question() {
        let retrieved = vec![scored("First chunk.", "Paper X", 0), scored("Second chunk.", "Paper Y", 1)];
        let prompt = build_prompt("What is studied?", &retrieved);

        assert!(prompt.contains("First chunk."));
        assert!(prompt.contains("Second chunk."));
        assert!(prompt.contains("Question: What is studied?"));
        // Context appears in retrieval order
        assert!(prompt.find("First chunk.").unwrap() < prompt.find("Second chunk.").unwrap());
    }

    #[test]
    fn test_sources_deduplicated_first_seen() {
        let retrieved = vec![
            scored("a", "Paper X", 0),
            scored("b", "Paper Y", 1),
            scored("c", "Paper X", 2),
        ];
        let sources = extract_sources(&retrieved);
        assert_eq!(sources, vec!["Paper X", "Paper Y"]);
    }

    #[test]
    fn test_sources_truncated_to_three() {
        let retrieved: Vec<ScoredChunk> = (0..5)
            .map(|i| scored("text", &format!("Paper {}", i), i))
            .collect();
        let sources = extract_sources(&retrieved);
        assert_eq!(sources.len(), MAX_SOURCES);
        assert_eq!(sources, vec!["Paper 0", "Paper 1", "Paper 2"]);
    }

    #[tokio::test]
    async fn test_answer_carries_sources() {
        let llm = StaticLanguageModel::responding("Grounded answer.");
        let synthesizer = Synthesizer::new(&llm);
        let retrieved = vec![scored("a", "Paper X", 0), scored("b", "Paper X", 1)];

        let result = synthesizer.answer("anything", &retrieved).await.unwrap();
        assert_eq!(result.answer, "Grounded answer.");
        assert_eq!(result.sources, vec!["Paper X"]);
    }

    #[tokio::test]
    async fn test_llm_failure_returns_no_partial_answer() {
        let llm = StaticLanguageModel::unavailable();
        let synthesizer = Synthesizer::new(&llm);
        let retrieved = vec![scored("a", "Paper X", 0)];

        let err = synthesizer.answer("anything", &retrieved).await.unwrap_err();
        assert!(matches!(err, AppError::ServiceUnavailable { .. }));
    }
}
