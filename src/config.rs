/// Configuration module for kbrag.
///
/// Handles loading, validating, and providing default configuration values.
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// ── Default value functions ──────────────────────────────────────────

fn default_upload_dir() -> String {
    "./uploads".to_string()
}

fn default_store_dir() -> String {
    "./vector_store".to_string()
}

fn default_documents_dir() -> String {
    "./docs".to_string()
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

fn default_search_top_k() -> usize {
    4
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_api_key_env() -> String {
    "GOOGLE_API_KEY".to_string()
}

fn default_embedding_model() -> String {
    "models/embedding-001".to_string()
}

fn default_dimensions() -> usize {
    768
}

fn default_embed_batch_size() -> usize {
    32
}

fn default_generation_model() -> String {
    "gemini-pro".to_string()
}

// ── Config structs ───────────────────────────────────────────────────

/// Which backend answers embedding and generation calls.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Gemini,
    /// Deterministic offline embedder and echo model, no network.
    Mock,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// Scratch area for uploads while a batch is being ingested.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,

    #[serde(default = "default_store_dir")]
    pub store_dir: String,

    /// Permanent copies of ingested files, listed by the catalog.
    #[serde(default = "default_documents_dir")]
    pub documents_dir: String,

    #[serde(default)]
    pub chunk: ChunkConfig,

    #[serde(default = "default_search_top_k")]
    pub search_top_k: usize,

    #[serde(default)]
    pub provider: Provider,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub generation: GenerationConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ChunkConfig {
    #[serde(default = "default_chunk_size")]
    pub size: usize,

    #[serde(default = "default_chunk_overlap")]
    pub overlap: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Per-request timeout. Unset means calls block until the service answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_model")]
    pub model: String,

    #[serde(default = "default_dimensions")]
    pub dimensions: usize,

    /// Chunks per embedding call during ingestion.
    #[serde(default = "default_embed_batch_size")]
    pub batch_size: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GenerationConfig {
    #[serde(default = "default_generation_model")]
    pub model: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

// ── Default impls ────────────────────────────────────────────────────

impl Default for Config {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            store_dir: default_store_dir(),
            documents_dir: default_documents_dir(),
            chunk: ChunkConfig::default(),
            search_top_k: default_search_top_k(),
            provider: Provider::default(),
            api: ApiConfig::default(),
            embedding: EmbeddingConfig::default(),
            generation: GenerationConfig::default(),
        }
    }
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            size: default_chunk_size(),
            overlap: default_chunk_overlap(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            request_timeout_secs: None,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            dimensions: default_dimensions(),
            batch_size: default_embed_batch_size(),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: default_generation_model(),
            temperature: None,
        }
    }
}

// ── Config implementation ────────────────────────────────────────────

impl Config {
    /// Load configuration from a JSON file.
    ///
    /// If `config_path` is empty, defaults to `"config.json"`.
    /// If the file does not exist, returns a default config and optionally
    /// generates a template file.
    pub fn load(config_path: &str) -> Result<Self> {
        let path = if config_path.is_empty() {
            "config.json"
        } else {
            config_path
        };

        if !Path::new(path).exists() {
            info!("{path} not found, using defaults");
            let cfg = Self::default();

            // Generate template only for the default path
            if path == "config.json" {
                match cfg.save(path) {
                    Ok(()) => info!("Generated config template: {path}"),
                    Err(e) => warn!("Failed to generate config template: {e}"),
                }
            }

            return Ok(cfg);
        }

        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {path}"))?;

        let cfg: Config = match serde_json::from_str(&data) {
            Ok(c) => c,
            Err(e) => {
                warn!("Invalid JSON in {path}: {e}");
                warn!("Using default configuration");
                return Ok(Self::default());
            }
        };

        info!("Loaded configuration from {path}");
        Ok(cfg)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &str) -> Result<()> {
        let data = serde_json::to_string_pretty(self).context("failed to marshal config")?;
        std::fs::write(path, data).with_context(|| format!("failed to write config: {path}"))?;
        Ok(())
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.chunk.size > 0, "chunk.size must be positive");
        anyhow::ensure!(
            self.chunk.overlap < self.chunk.size,
            "chunk.overlap ({}) must be smaller than chunk.size ({})",
            self.chunk.overlap,
            self.chunk.size
        );
        anyhow::ensure!(self.search_top_k > 0, "search_top_k must be positive");
        anyhow::ensure!(
            self.embedding.dimensions > 0,
            "embedding.dimensions must be positive"
        );
        anyhow::ensure!(
            self.embedding.batch_size > 0,
            "embedding.batch_size must be positive"
        );
        anyhow::ensure!(
            !self.upload_dir.is_empty() && !self.store_dir.is_empty(),
            "upload_dir and store_dir must be set"
        );
        Ok(())
    }

    /// Read the API key from the environment variable named in `api.api_key_env`.
    pub fn api_key(&self) -> Result<String> {
        let var = &self.api.api_key_env;
        let key = std::env::var(var).with_context(|| format!("{var} is not set"))?;
        anyhow::ensure!(!key.trim().is_empty(), "{var} is empty");
        Ok(key)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.api.request_timeout_secs.map(Duration::from_secs)
    }

    #[must_use]
    pub fn upload_path(&self) -> PathBuf {
        PathBuf::from(&self.upload_dir)
    }

    #[must_use]
    pub fn store_path(&self) -> PathBuf {
        PathBuf::from(&self.store_dir)
    }

    #[must_use]
    pub fn documents_path(&self) -> PathBuf {
        PathBuf::from(&self.documents_dir)
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.chunk.size, 1000);
        assert_eq!(config.chunk.overlap, 200);
        assert_eq!(config.search_top_k, 4);
        assert_eq!(config.embedding.dimensions, 768);
        assert_eq!(config.embedding.model, "models/embedding-001");
        assert_eq!(config.generation.model, "gemini-pro");
        assert_eq!(config.provider, Provider::Gemini);
        assert_eq!(config.api.api_key_env, "GOOGLE_API_KEY");
        assert!(config.request_timeout().is_none());
    }

    #[test]
    fn test_load_from_json() {
        let json = r#"{"chunk": {"size": 500}, "store_dir": "./test_store", "provider": "mock"}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.chunk.size, 500);
        assert_eq!(config.store_dir, "./test_store");
        assert_eq!(config.provider, Provider::Mock);
        // Other fields should have defaults
        assert_eq!(config.chunk.overlap, 200);
        assert_eq!(config.search_top_k, 4);
        assert_eq!(config.embedding.batch_size, 32);
    }

    #[test]
    fn test_validate_ok() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_bad_chunk_size() {
        let mut config = Config::default();
        config.chunk.size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_overlap_not_smaller_than_size() {
        let mut config = Config::default();
        config.chunk.overlap = config.chunk.size;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_top_k() {
        let mut config = Config::default();
        config.search_top_k = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_custom_path_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let config = Config::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.chunk.size, 1000);
        // No template is written for non-default paths
        assert!(!path.exists());
    }

    #[test]
    fn test_load_invalid_json_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        let config = Config::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.search_top_k, 4);
    }

    #[test]
    fn test_request_timeout() {
        let json = r#"{"api": {"request_timeout_secs": 45}}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(45)));
        assert_eq!(config.api.base_url, default_base_url());
    }

    #[test]
    fn test_serialization_roundtrip() {
        let config = Config::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.chunk.size, config.chunk.size);
        assert_eq!(parsed.store_dir, config.store_dir);
        assert_eq!(parsed.embedding.model, config.embedding.model);
    }
}
