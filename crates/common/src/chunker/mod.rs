//! Text chunking module
//!
//! Renders paper metadata into labeled text blocks and splits them into
//! overlapping chunks for embedding. Boundaries are chosen recursively:
//! paragraph break, then sentence break, then word break, with a hard cut
//! only when a single token exceeds the chunk size.

use crate::arxiv::Document;
use tracing::debug;

/// Configuration for text chunking
#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    pub chunk_size: usize,
    /// Overlap between adjacent chunks in characters
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// A text chunk with source metadata
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// The chunk content
    pub text: String,
    /// Title of the paper this chunk came from, carried as structured
    /// metadata rather than re-parsed from the text
    pub source_title: String,
    /// Position in the batch, increasing within and across documents
    pub sequence: usize,
}

/// Render a document to a single labeled text block.
///
/// Field labels keep chunk boundaries unambiguous when a chunk straddles
/// the title/authors/summary transition.
pub fn render_document(document: &Document) -> String {
    format!(
        "Title: {}\nAuthors: {}\nSummary: {}",
        document.title,
        document.authors.join(", "),
        document.summary
    )
}

/// Split a batch of documents into overlapping chunks.
///
/// Every chunk carries the title of its owning document. An empty batch
/// yields an empty chunk list.
pub fn split_documents(documents: &[Document], config: &ChunkingConfig) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut sequence = 0;

    for document in documents {
        let text = render_document(document);

        for piece in split_text(&text, config) {
            chunks.push(Chunk {
                text: piece,
                source_title: document.title.clone(),
                sequence,
            });
            sequence += 1;
        }
    }

    debug!(
        documents = documents.len(),
        chunks = chunks.len(),
        chunk_size = config.chunk_size,
        chunk_overlap = config.chunk_overlap,
        "Documents chunked"
    );

    chunks
}

/// Split one text block into overlapping pieces.
pub fn split_text(text: &str, config: &ChunkingConfig) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let total = chars.len();

    if total == 0 {
        return Vec::new();
    }

    // Overlap must leave room to advance; a degenerate config falls back
    // to half-window overlap like a sliding window.
    let overlap = if config.chunk_overlap < config.chunk_size {
        config.chunk_overlap
    } else {
        config.chunk_size / 2
    };

    let mut pieces = Vec::new();
    let mut start = 0;

    loop {
        if total - start <= config.chunk_size {
            pieces.push(chars[start..].iter().collect());
            break;
        }

        let window_end = start + config.chunk_size;
        // The cut must land past the overlap region so the next chunk
        // starts after this one.
        let min_end = start + overlap + 1;
        let end = find_break(&chars, min_end, window_end);

        pieces.push(chars[start..end].iter().collect());
        start = end - overlap;
    }

    pieces
}

/// Find the best cut position in `(min_end..=window_end]`, preferring
/// paragraph breaks, then sentence breaks, then word breaks. Falls back
/// to a hard cut at the window end when a single token fills the window.
fn find_break(chars: &[char], min_end: usize, window_end: usize) -> usize {
    // Paragraph break: cut after "\n\n"
    let mut i = window_end;
    while i > min_end + 1 {
        if chars[i - 1] == '\n' && chars[i - 2] == '\n' {
            return i;
        }
        i -= 1;
    }

    // Sentence break: cut after ". ", "! ", "? " or a punctuation-newline
    let mut i = window_end;
    while i > min_end + 1 {
        let prev = chars[i - 2];
        let last = chars[i - 1];
        if matches!(prev, '.' | '!' | '?') && (last == ' ' || last == '\n') {
            return i;
        }
        i -= 1;
    }

    // Word break: cut after whitespace
    let mut i = window_end;
    while i > min_end {
        if chars[i - 1].is_whitespace() {
            return i;
        }
        i -= 1;
    }

    // Single token longer than the window: hard cut
    window_end
}
