use serde::Serialize;

use crate::loader::DocumentMetadata;

/// A stored chunk returned by similarity search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedChunk {
    pub chunk_id: i64,
    pub content: String,
    pub metadata: DocumentMetadata,
    pub position: usize,
    pub char_offset: usize,
    /// `1 - cosine distance`; higher is closer.
    pub similarity: f64,
}
