/// Language model trait and errors for answer generation.
pub mod gemini;
pub mod mock;

use thiserror::Error;

use crate::gemini::GeminiError;

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("generation service error: {0}")]
    Service(GeminiError),

    /// The service answered, but no text could be extracted.
    #[error("malformed generation response: {0}")]
    MalformedResponse(String),
}

impl From<GeminiError> for GenerationError {
    fn from(e: GeminiError) -> Self {
        match e {
            GeminiError::Decode(msg) => Self::MalformedResponse(msg),
            other => Self::Service(other),
        }
    }
}

/// A hosted (or fake) text generation model.
pub trait LanguageModel: Send + Sync {
    /// Complete `prompt` and return the model's text.
    fn generate(&self, prompt: &str) -> Result<String, GenerationError>;

    /// Model identifier, for logging.
    fn model(&self) -> &str;
}
