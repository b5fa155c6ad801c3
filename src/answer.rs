//! Retrieval-augmented answering over the vector store.
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::generator::{GenerationError, LanguageModel};
use crate::store::{RetrievedChunk, StoreError, VectorStore};

/// Returned when the model responds but no answer text can be extracted.
pub const FALLBACK_ANSWER: &str =
    "Sorry, I could not generate an answer from the model response. Please try again.";

/// Chunks retrieved per question unless configured otherwise.
pub const DEFAULT_TOP_K: usize = 4;

const PROMPT_INSTRUCTIONS: &str = "You are a helpful assistant that answers questions using only \
the provided context from the knowledge base.
Answer strictly from the context below. If the answer is not in the context, say that the \
information was not found in the knowledge base. Do not invent information.";

#[derive(Error, Debug)]
pub enum AnswerError {
    #[error("retrieval failed: {0}")]
    Store(#[from] StoreError),

    #[error("generation failed: {0}")]
    Generation(GenerationError),
}

/// Render the prompt for `question` over `chunks`, in retrieval order.
pub fn build_prompt(question: &str, chunks: &[RetrievedChunk]) -> String {
    let context = chunks
        .iter()
        .map(|c| c.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    format!("{PROMPT_INSTRUCTIONS}\n\nQuestion: {question}\n\nContext: {context}\n\nAnswer:")
}

pub struct AnswerGenerator {
    store: Arc<VectorStore>,
    model: Arc<dyn LanguageModel>,
    top_k: usize,
}

impl AnswerGenerator {
    pub fn new(store: Arc<VectorStore>, model: Arc<dyn LanguageModel>) -> Self {
        Self {
            store,
            model,
            top_k: DEFAULT_TOP_K,
        }
    }

    #[must_use]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Answer `question` from the stored chunks.
    ///
    /// An empty store still produces a prompt, with empty context.
    pub fn answer(&self, question: &str) -> Result<String, AnswerError> {
        let chunks = self.store.retrieve(question, self.top_k)?;
        info!(
            "Answering with {} context chunks via {}",
            chunks.len(),
            self.model.model()
        );

        let prompt = build_prompt(question, &chunks);
        debug!("Prompt is {} chars", prompt.len());

        match self.model.generate(&prompt) {
            Ok(text) => Ok(text),
            Err(GenerationError::MalformedResponse(reason)) => {
                warn!("Model response had no text ({reason}); returning fallback answer");
                Ok(FALLBACK_ANSWER.to_string())
            }
            Err(e) => Err(AnswerError::Generation(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::mock::MockEmbedder;
    use crate::gemini::GeminiError;
    use crate::generator::mock::MockModel;
    use crate::loader::DocumentMetadata;

    fn retrieved(content: &str) -> RetrievedChunk {
        RetrievedChunk {
            chunk_id: 1,
            content: content.to_string(),
            metadata: DocumentMetadata::new("a.txt"),
            position: 0,
            char_offset: 0,
            similarity: 1.0,
        }
    }

    fn empty_store() -> Arc<VectorStore> {
        Arc::new(VectorStore::open_in_memory(Arc::new(MockEmbedder::new(8))).unwrap())
    }

    #[test]
    fn test_build_prompt() {
        let prompt = build_prompt("Why?", &[retrieved("first"), retrieved("second")]);
        assert!(prompt.contains("Question: Why?"));
        assert!(prompt.contains("Context: first\n\nsecond"));
        assert!(prompt.ends_with("Answer:"));
        assert_eq!(prompt, build_prompt("Why?", &[retrieved("first"), retrieved("second")]));
    }

    #[test]
    fn test_build_prompt_keeps_placeholders_in_input() {
        let prompt = build_prompt("What does {context} mean?", &[retrieved("notes {question}")]);
        assert!(prompt.contains("Question: What does {context} mean?\n"));
        assert!(prompt.contains("Context: notes {question}\n"));
        assert_eq!(prompt.matches("notes").count(), 1);
    }

    #[test]
    fn test_build_prompt_empty_context() {
        let prompt = build_prompt("Why?", &[]);
        assert!(prompt.contains("Context: \n"));
    }

    #[test]
    fn test_answer_passes_model_text() {
        let model = Arc::new(MockModel::replying("42"));
        let generator = AnswerGenerator::new(empty_store(), model.clone());

        assert_eq!(generator.answer("What is it?").unwrap(), "42");
        let prompts = model.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("What is it?"));
    }

    #[test]
    fn test_malformed_response_falls_back() {
        let generator = AnswerGenerator::new(empty_store(), Arc::new(MockModel::malformed()));
        assert_eq!(generator.answer("anything").unwrap(), FALLBACK_ANSWER);
    }

    struct DownModel;

    impl LanguageModel for DownModel {
        fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
            Err(GeminiError::Status {
                status: 503,
                body: "unavailable".into(),
            }
            .into())
        }

        fn model(&self) -> &str {
            "down"
        }
    }

    #[test]
    fn test_service_error_propagates() {
        let generator = AnswerGenerator::new(empty_store(), Arc::new(DownModel));
        assert!(matches!(
            generator.answer("anything"),
            Err(AnswerError::Generation(GenerationError::Service(_)))
        ));
    }
}
