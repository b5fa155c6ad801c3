/// Hosted embeddings through the Generative Language API
/// (`embedContent` / `batchEmbedContents`).
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::{Embedder, EmbedderError, check_dimensions};
use crate::gemini::{GeminiClient, model_path};

/// Maximum requests accepted by one `batchEmbedContents` call.
const MAX_BATCH: usize = 100;

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum TaskType {
    RetrievalDocument,
    RetrievalQuery,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: String,
    content: Content<'a>,
    #[serde(rename = "taskType")]
    task_type: TaskType,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct BatchEmbedRequest<'a> {
    requests: Vec<EmbedRequest<'a>>,
}

pub struct GeminiEmbedder {
    client: Arc<GeminiClient>,
    model: String,
    dimensions: usize,
}

impl GeminiEmbedder {
    pub fn new(client: Arc<GeminiClient>, model: impl Into<String>, dimensions: usize) -> Self {
        Self {
            client,
            model: model.into(),
            dimensions,
        }
    }

    fn request<'a>(&self, text: &'a str, task_type: TaskType) -> EmbedRequest<'a> {
        EmbedRequest {
            model: model_path(&self.model),
            content: Content {
                parts: [Part { text }],
            },
            task_type,
        }
    }

    fn embed_one(&self, text: &str, task_type: TaskType) -> Result<Vec<f32>, EmbedderError> {
        let body = self.request(text, task_type);
        let resp = self.client.post(&self.model, "embedContent", &body)?;
        let vector = resp
            .get("embedding")
            .and_then(parse_values)
            .ok_or_else(|| EmbedderError::MalformedResponse("missing embedding.values".into()))?;
        check_dimensions(&vector, self.dimensions)?;
        Ok(vector)
    }
}

/// Parse `{"values": [..]}` into a vector.
fn parse_values(value: &Value) -> Option<Vec<f32>> {
    value
        .get("values")?
        .as_array()?
        .iter()
        .map(|v| v.as_f64().map(|f| f as f32))
        .collect()
}

/// Parse a `batchEmbedContents` response body.
fn parse_batch(resp: &Value) -> Option<Vec<Vec<f32>>> {
    resp.get("embeddings")?
        .as_array()?
        .iter()
        .map(parse_values)
        .collect()
}

/// Vectors of a batch response, checked against the request size and
/// the configured dimensions.
fn batch_vectors(
    resp: &Value,
    expected: usize,
    dimensions: usize,
) -> Result<Vec<Vec<f32>>, EmbedderError> {
    let vectors = parse_batch(resp)
        .ok_or_else(|| EmbedderError::MalformedResponse("missing embeddings[].values".into()))?;

    if vectors.len() != expected {
        return Err(EmbedderError::CountMismatch {
            expected,
            actual: vectors.len(),
        });
    }
    for v in &vectors {
        check_dimensions(v, dimensions)?;
    }
    Ok(vectors)
}

impl Embedder for GeminiEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedderError> {
        self.embed_one(text, TaskType::RetrievalDocument)
    }

    fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbedderError> {
        self.embed_one(text, TaskType::RetrievalQuery)
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedderError> {
        let mut all = Vec::with_capacity(texts.len());

        for group in texts.chunks(MAX_BATCH) {
            let body = BatchEmbedRequest {
                requests: group
                    .iter()
                    .map(|t| self.request(t, TaskType::RetrievalDocument))
                    .collect(),
            };
            let resp = self.client.post(&self.model, "batchEmbedContents", &body)?;
            let vectors = batch_vectors(&resp, group.len(), self.dimensions)?;
            debug!("Embedded batch of {}", group.len());
            all.extend(vectors);
        }

        Ok(all)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
