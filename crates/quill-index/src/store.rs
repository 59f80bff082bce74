//! In-memory vector store over chunked document text.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::chunking::TextChunk;
use crate::render::SectionIter;

/// One embedded chunk held by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredChunk {
    /// Title of the owning document.
    pub title: String,
    /// Remote identifier of the owning document.
    pub document_id: String,
    /// Identifier of the vector record the chunk belongs to.
    pub vector_id: String,
    /// Position of the chunk within its document.
    pub position: usize,
    /// The chunk itself.
    pub chunk: TextChunk,
    /// Embedding vector for the chunk text.
    pub embedding: Vec<f32>,
}

/// A ranked document returned by a similarity query.
#[derive(Debug, Clone)]
pub struct ScoredDocument {
    /// Title of the matched document.
    pub title: String,
    /// Best chunk similarity score for the document.
    pub score: f32,
    /// Matched chunks in document order.
    pub chunks: Vec<TextChunk>,
}

impl ScoredDocument {
    /// Renders bounded excerpts of the matched chunks.
    ///
    /// The returned iterator is lazy and finite; it yields at most
    /// `max_sections` sections of at most `max_section_length` characters,
    /// merging adjacent chunks when `combine_adjacent` is set.
    pub fn render_sections(
        &self,
        max_section_length: usize,
        max_sections: usize,
        combine_adjacent: bool,
    ) -> SectionIter<'_> {
        SectionIter::new(&self.chunks, max_section_length, max_sections, combine_adjacent)
    }
}

/// In-memory store of embedded chunks with cosine-similarity queries.
#[derive(Debug, Default)]
pub struct VectorStore {
    /// All stored chunks, in insertion order.
    chunks: Vec<StoredChunk>,
}

impl VectorStore {
    /// Adds a chunk to the store.
    pub fn insert(&mut self, chunk: StoredChunk) {
        self.chunks.push(chunk);
    }

    /// Number of stored chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether the store holds no chunks.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// All stored chunks, in insertion order.
    pub fn entries(&self) -> &[StoredChunk] {
        &self.chunks
    }

    /// Ranks documents by best chunk similarity against `embedding`.
    ///
    /// Returns at most `max_documents` documents ordered by non-increasing
    /// score, each carrying at most `max_chunks` chunks in document order.
    pub fn query(
        &self,
        embedding: &[f32],
        max_documents: usize,
        max_chunks: usize,
    ) -> Vec<ScoredDocument> {
        let mut accum: HashMap<&str, (f32, Vec<(usize, &TextChunk)>)> = HashMap::new();

        for stored in &self.chunks {
            let score = cosine_similarity(embedding, &stored.embedding);
            let entry = accum
                .entry(stored.title.as_str())
                .or_insert((f32::NEG_INFINITY, Vec::new()));
            if score > entry.0 {
                entry.0 = score;
            }
            entry.1.push((stored.position, &stored.chunk));
        }

        let mut documents: Vec<ScoredDocument> = accum
            .into_iter()
            .map(|(title, (score, mut positioned))| {
                positioned.sort_by_key(|(position, _)| *position);
                positioned.truncate(max_chunks);
                ScoredDocument {
                    title: title.to_owned(),
                    score,
                    chunks: positioned
                        .into_iter()
                        .map(|(_, chunk)| chunk.clone())
                        .collect(),
                }
            })
            .collect();

        documents.sort_by(|first, second| {
            second
                .score
                .partial_cmp(&first.score)
                .unwrap_or(Ordering::Equal)
        });
        documents.truncate(max_documents);

        documents
    }
}

/// Calculate cosine similarity between two vectors
pub fn cosine_similarity(vector_a: &[f32], vector_b: &[f32]) -> f32 {
    if vector_a.len() != vector_b.len() {
        return 0.0;
    }

    let dot_product: f32 = vector_a
        .iter()
        .zip(vector_b.iter())
        .map(|(x, y)| x * y)
        .sum();
    let magnitude_a = vector_a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b = vector_b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    dot_product / (magnitude_a * magnitude_b)
}
