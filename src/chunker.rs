//! Fixed-size sliding-window chunking over document text.
use thiserror::Error;

use crate::loader::{Document, DocumentMetadata};

pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ChunkerError {
    #[error("chunk size must be positive")]
    ZeroSize,

    #[error("overlap {overlap} must be smaller than chunk size {size}")]
    OverlapTooLarge { size: usize, overlap: usize },
}

/// A bounded text segment of one document.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub content: String,
    pub metadata: DocumentMetadata,
    /// Index of this chunk within its document.
    pub position: usize,
    /// Character (not byte) offset of the first character in the document.
    pub char_offset: usize,
}

/// Splits documents into windows of `size` characters advancing by
/// `size - overlap`, never crossing a document boundary.
#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    size: usize,
    overlap: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self {
            size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

impl Chunker {
    pub fn new(size: usize, overlap: usize) -> Result<Self, ChunkerError> {
        if size == 0 {
            return Err(ChunkerError::ZeroSize);
        }
        if overlap >= size {
            return Err(ChunkerError::OverlapTooLarge { size, overlap });
        }
        Ok(Self { size, overlap })
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    #[must_use]
    pub fn overlap(&self) -> usize {
        self.overlap
    }

    fn step(&self) -> usize {
        self.size - self.overlap
    }

    /// Chunk every document in order.
    pub fn split(&self, documents: &[Document]) -> Vec<Chunk> {
        documents
            .iter()
            .flat_map(|doc| self.split_document(doc))
            .collect()
    }

    /// Chunk a single document. Blank documents yield nothing.
    pub fn split_document(&self, doc: &Document) -> Vec<Chunk> {
        self.split_text(&doc.text)
            .into_iter()
            .enumerate()
            .map(|(position, (char_offset, content))| Chunk {
                content,
                metadata: doc.metadata.clone(),
                position,
                char_offset,
            })
            .collect()
    }

    /// Returns `(char_offset, text)` windows over `text`.
    pub fn split_text(&self, text: &str) -> Vec<(usize, String)> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        // Byte offset of every char boundary, plus the end of the string.
        let bounds: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let char_count = bounds.len() - 1;

        let mut windows = Vec::with_capacity(char_count / self.step() + 1);
        let mut start = 0;
        loop {
            let end = (start + self.size).min(char_count);
            windows.push((start, text[bounds[start]..bounds[end]].to_string()));
            if end == char_count {
                break;
            }
            start += self.step();
        }

        windows
    }
}
