/// Embedder trait and shared types for text embedding.
pub mod gemini;
pub mod mock;

use thiserror::Error;

use crate::gemini::GeminiError;

/// Errors that can occur during embedding operations.
#[derive(Error, Debug)]
pub enum EmbedderError {
    #[error("embedding service error: {0}")]
    Service(#[from] GeminiError),

    #[error("malformed embedding response: {0}")]
    MalformedResponse(String),

    #[error("expected {expected} embeddings, got {actual}")]
    CountMismatch { expected: usize, actual: usize },

    #[error("expected {expected}-dimensional vector, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Trait for text embedding implementations.
///
/// All implementations must be `Send + Sync` to allow concurrent use
/// behind `Arc`. Calls may block on network I/O.
pub trait Embedder: Send + Sync {
    /// Embed a single text string into a vector.
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedderError>;

    /// Embed a retrieval query. Defaults to [`Embedder::embed`].
    fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbedderError> {
        self.embed(text)
    }

    /// Embed multiple text strings into vectors, in order.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedderError>;

    /// Return the dimensionality of the embedding vectors.
    fn dimensions(&self) -> usize;
}

/// Check that `vector` has the expected dimensionality.
pub fn check_dimensions(vector: &[f32], expected: usize) -> Result<(), EmbedderError> {
    if vector.len() != expected {
        return Err(EmbedderError::DimensionMismatch {
            expected,
            actual: vector.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_dimensions() {
        assert!(check_dimensions(&[0.0; 4], 4).is_ok());
        assert!(matches!(
            check_dimensions(&[0.0; 3], 4),
            Err(EmbedderError::DimensionMismatch {
                expected: 4,
                actual: 3
            })
        ));
    }
}
