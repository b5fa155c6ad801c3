//! Batch ingestion: stage uploads, load them in parallel, then chunk,
//! embed and store the extracted text.
pub mod uploads;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::chunker::Chunker;
use crate::loader::{self, Document};
use crate::store::{StoreError, VectorStore};
use uploads::UploadBatch;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("failed to stage upload: {0}")]
    Staging(#[from] std::io::Error),

    #[error("failed to start loader pool: {0}")]
    Pool(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A file received for ingestion.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content: Vec<u8>,
    /// Declared extension, without the dot. Decides the loader; when
    /// empty, the filename's extension is used.
    pub extension: String,
}

impl UploadedFile {
    /// Build an upload, taking the extension from `filename`.
    pub fn new(filename: impl Into<String>, content: Vec<u8>) -> Self {
        let filename = filename.into();
        let extension = Path::new(&filename)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_string();
        Self {
            filename,
            content,
            extension,
        }
    }

    /// Read an upload from a local path.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read(path)?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(filename, content))
    }
}

/// Outcome of one ingest call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub files: usize,
    pub documents: usize,
    pub chunks: usize,
}

pub struct Ingestor {
    store: Arc<VectorStore>,
    chunker: Chunker,
    upload_dir: PathBuf,
}

impl Ingestor {
    pub fn new(store: Arc<VectorStore>, chunker: Chunker, upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            chunker,
            upload_dir: upload_dir.into(),
        }
    }

    /// Ingest a batch of uploads into the vector store.
    ///
    /// Files that fail to load contribute nothing. A batch that yields no
    /// text succeeds with zero chunks. Staged files are removed on every
    /// path out of this function.
    pub fn ingest(&self, files: &[UploadedFile]) -> Result<IngestReport, IngestError> {
        let mut report = IngestReport {
            files: files.len(),
            ..IngestReport::default()
        };
        if files.is_empty() {
            return Ok(report);
        }

        let mut batch = UploadBatch::create(&self.upload_dir)?;
        for file in files {
            batch.stage(file)?;
        }

        let documents = self.load_all(&batch)?;
        report.documents = documents.len();
        if documents.is_empty() {
            info!("No text extracted from {} file(s)", files.len());
            return Ok(report);
        }

        let chunks = self.chunker.split(&documents);
        report.chunks = self.store.add(&chunks)?;
        self.store.persist()?;

        info!(
            "Ingested {} file(s): {} document(s), {} chunk(s)",
            report.files, report.documents, report.chunks
        );
        Ok(report)
    }

    /// Load every staged file on a pool sized to the batch.
    fn load_all(&self, batch: &UploadBatch) -> Result<Vec<Document>, IngestError> {
        let threads = batch.files().len().min(num_cpus::get()).max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("kbrag-loader-{i}"))
            .build()
            .map_err(|e| IngestError::Pool(e.to_string()))?;

        let per_file: Vec<Vec<Document>> = pool.install(|| {
            batch
                .files()
                .par_iter()
                .map(|f| loader::load(&f.path, &f.source, f.kind))
                .collect()
        });

        Ok(per_file.into_iter().flatten().collect())
    }
}
