/// Scripted language model for tests and offline runs.
use std::sync::Mutex;

use super::{GenerationError, LanguageModel};

enum Reply {
    /// Report the size of the prompt.
    Echo,
    Fixed(String),
    Malformed,
}

/// A model that records every prompt it receives.
pub struct MockModel {
    reply: Reply,
    prompts: Mutex<Vec<String>>,
}

impl Default for MockModel {
    fn default() -> Self {
        Self::new(Reply::Echo)
    }
}

impl MockModel {
    fn new(reply: Reply) -> Self {
        Self {
            reply,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Always answer with `text`.
    #[must_use]
    pub fn replying(text: impl Into<String>) -> Self {
        Self::new(Reply::Fixed(text.into()))
    }

    /// Always fail as if the response carried no text.
    #[must_use]
    pub fn malformed() -> Self {
        Self::new(Reply::Malformed)
    }

    /// Prompts received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

impl LanguageModel for MockModel {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }

        match &self.reply {
            Reply::Fixed(text) => Ok(text.clone()),
            Reply::Malformed => Err(GenerationError::MalformedResponse(
                "mock response has no text".into(),
            )),
            Reply::Echo => {
                let lines = prompt.lines().count();
                Ok(format!("[mock] prompt received ({lines} lines, {} chars)", prompt.len()))
            }
        }
    }

    fn model(&self) -> &str {
        "mock"
    }
}
