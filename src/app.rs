//! Wiring shared by the CLI and the MCP server.
use std::io;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::answer::{AnswerError, AnswerGenerator};
use crate::catalog::{self, DocumentEntry};
use crate::chunker::Chunker;
use crate::config::{Config, Provider};
use crate::embedder::Embedder;
use crate::embedder::gemini::GeminiEmbedder;
use crate::embedder::mock::MockEmbedder;
use crate::gemini::GeminiClient;
use crate::generator::LanguageModel;
use crate::generator::gemini::GeminiModel;
use crate::generator::mock::MockModel;
use crate::ingest::{IngestError, IngestReport, Ingestor, UploadedFile};
use crate::store::VectorStore;

/// The service graph: one store shared by ingestion and answering.
#[derive(Clone)]
pub struct App {
    pub config: Arc<Config>,
    pub store: Arc<VectorStore>,
    ingestor: Arc<Ingestor>,
    answerer: Arc<AnswerGenerator>,
}

impl App {
    /// Build the embedder and model named by `config.provider`, then wire them.
    pub fn from_config(config: Config) -> Result<Self> {
        config.validate().context("invalid configuration")?;

        let embedder: Arc<dyn Embedder>;
        let model: Arc<dyn LanguageModel>;
        match config.provider {
            Provider::Gemini => {
                let client = Arc::new(
                    GeminiClient::new(
                        &config.api.base_url,
                        config.api_key()?,
                        config.request_timeout(),
                    )
                    .context("failed to build HTTP client")?,
                );
                embedder = Arc::new(GeminiEmbedder::new(
                    client.clone(),
                    &config.embedding.model,
                    config.embedding.dimensions,
                ));
                model = Arc::new(
                    GeminiModel::new(client, &config.generation.model)
                        .with_temperature(config.generation.temperature),
                );
            }
            Provider::Mock => {
                info!("Using mock provider (no network calls)");
                embedder = Arc::new(MockEmbedder::new(config.embedding.dimensions));
                model = Arc::new(MockModel::default());
            }
        }

        Self::with_services(config, embedder, model)
    }

    /// Wire the app around explicit embedding and generation backends.
    pub fn with_services(
        config: Config,
        embedder: Arc<dyn Embedder>,
        model: Arc<dyn LanguageModel>,
    ) -> Result<Self> {
        let store = VectorStore::open(config.store_path(), embedder)
            .with_context(|| format!("failed to open vector store at {}", config.store_dir))?
            .with_batch_size(config.embedding.batch_size);
        let store = Arc::new(store);

        let chunker = Chunker::new(config.chunk.size, config.chunk.overlap)?;
        let ingestor = Ingestor::new(store.clone(), chunker, config.upload_path());
        let answerer =
            AnswerGenerator::new(store.clone(), model).with_top_k(config.search_top_k);

        Ok(Self {
            config: Arc::new(config),
            store,
            ingestor: Arc::new(ingestor),
            answerer: Arc::new(answerer),
        })
    }

    /// Ingest `files`, then keep a copy of each in the documents directory.
    ///
    /// Archiving failures are logged; the ingest itself already succeeded.
    pub fn ingest(&self, files: &[UploadedFile]) -> Result<IngestReport, IngestError> {
        let report = self.ingestor.ingest(files)?;

        let dir = self.config.documents_path();
        for file in files {
            if let Err(e) = catalog::archive(&dir, &file.filename, &file.content) {
                warn!("Failed to archive {}: {e}", file.filename);
            }
        }
        Ok(report)
    }

    pub fn ask(&self, question: &str) -> Result<String, AnswerError> {
        self.answerer.answer(question)
    }

    pub fn documents(&self) -> io::Result<Vec<DocumentEntry>> {
        catalog::list(&self.config.documents_path())
    }
}
