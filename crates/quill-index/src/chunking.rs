//! Sentence-boundary text chunking with token budgets.

use serde::{Deserialize, Serialize};

/// A contiguous span of document text prepared for embedding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextChunk {
    /// Chunk text, exactly as it appears in the document.
    pub text: String,
    /// Estimated token count of the text.
    pub token_count: usize,
    /// Byte offset of the chunk start within the document.
    pub start_offset: usize,
    /// Byte offset one past the chunk end.
    pub end_offset: usize,
}

/// Estimate tokens from text (rough: ~4 chars per token)
pub fn estimate_tokens(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    (text.len() / 4).max(1)
}

/// Splits text into chunks under `max_tokens`, never breaking mid-sentence.
///
/// Sentences are detected on `.`, `!` and `?` boundaries. A single sentence
/// larger than the budget becomes its own oversized chunk rather than being
/// split. Empty or whitespace-only input yields no chunks.
pub fn chunk_text(content: &str, max_tokens: usize) -> Vec<TextChunk> {
    if content.trim().is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut buffer = String::new();
    let mut buffer_start = 0;
    let mut offset = 0;

    for sentence in content.split_inclusive(['.', '!', '?']) {
        let sentence_tokens = estimate_tokens(sentence);
        if !buffer.is_empty() && estimate_tokens(&buffer) + sentence_tokens > max_tokens {
            push_chunk(&mut chunks, &mut buffer, buffer_start, offset);
            buffer_start = offset;
        }
        buffer.push_str(sentence);
        offset += sentence.len();
    }

    push_chunk(&mut chunks, &mut buffer, buffer_start, offset);

    chunks
}

/// Flushes the buffered sentences into a chunk, skipping whitespace-only runs.
fn push_chunk(chunks: &mut Vec<TextChunk>, buffer: &mut String, start: usize, end: usize) {
    if buffer.trim().is_empty() {
        buffer.clear();
        return;
    }
    let text = core::mem::take(buffer);
    let token_count = estimate_tokens(&text);
    chunks.push(TextChunk {
        text,
        token_count,
        start_offset: start,
        end_offset: end,
    });
}
