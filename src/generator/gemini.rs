//! `generateContent` client for Gemini models.
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::{GenerationError, LanguageModel};
use crate::gemini::GeminiClient;

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

pub struct GeminiModel {
    client: Arc<GeminiClient>,
    model: String,
    temperature: Option<f32>,
}

impl GeminiModel {
    pub fn new(client: Arc<GeminiClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            temperature: None,
        }
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    fn request<'a>(&self, prompt: &'a str) -> GenerateRequest<'a> {
        GenerateRequest {
            contents: [Content {
                role: "user",
                parts: [Part { text: prompt }],
            }],
            generation_config: self.temperature.map(|temperature| GenerationConfig { temperature }),
        }
    }
}

/// Concatenate the text parts of the first candidate.
///
/// `None` when there is no candidate or none of its parts carry text,
/// which is what a blocked or truncated response looks like.
pub fn extract_text(resp: &Value) -> Option<String> {
    let parts = resp
        .get("candidates")?
        .as_array()?
        .first()?
        .get("content")?
        .get("parts")?
        .as_array()?;

    let texts: Vec<&str> = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect();
    if texts.is_empty() {
        return None;
    }
    Some(texts.concat())
}

impl LanguageModel for GeminiModel {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let resp = self
            .client
            .post(&self.model, "generateContent", &self.request(prompt))?;

        let text = extract_text(&resp).ok_or_else(|| {
            let reason = resp
                .get("promptFeedback")
                .and_then(|f| f.get("blockReason"))
                .and_then(Value::as_str)
                .unwrap_or("no candidate text");
            GenerationError::MalformedResponse(reason.to_string())
        })?;
        debug!("{} returned {} chars", self.model, text.len());
        Ok(text)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_text_joins_parts() {
        let resp = json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "Hello, "}, {"text": "world"}]}
            }]
        });
        assert_eq!(extract_text(&resp).as_deref(), Some("Hello, world"));
    }

    #[test]
    fn test_extract_text_missing() {
        assert_eq!(extract_text(&json!({})), None);
        assert_eq!(extract_text(&json!({"candidates": []})), None);
        assert_eq!(
            extract_text(&json!({"candidates": [{"finishReason": "SAFETY"}]})),
            None
        );
        assert_eq!(
            extract_text(&json!({"candidates": [{"content": {"parts": [{"inlineData": {}}]}}]})),
            None
        );
    }

    #[test]
    fn test_request_shape() {
        let client = Arc::new(GeminiClient::new("https://example.test", "k", None).unwrap());
        let model = GeminiModel::new(client, "gemini-pro");
        let body = serde_json::to_value(model.request("Q?")).unwrap();
        assert_eq!(
            body,
            json!({"contents": [{"role": "user", "parts": [{"text": "Q?"}]}]})
        );

        let model = model.with_temperature(Some(0.5));
        let body = serde_json::to_value(model.request("Q?")).unwrap();
        assert_eq!(body["generationConfig"]["temperature"], json!(0.5));
    }
}
