//! Document loading: turns an uploaded file into plain-text [`Document`]s.
//!
//! Dispatch is by file extension over the closed [`DocumentKind`] set.
//! Anything unrecognised loads as nothing.
pub mod docx;
pub mod pdf;

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors raised while extracting text from a single file.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid UTF-8 text: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("PDF extraction failed: {0}")]
    Pdf(String),

    #[error("DOCX extraction failed: {0}")]
    Docx(String),
}

/// Where a piece of text came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Original upload filename (not the staging path).
    pub source: String,
    /// 1-based page number for paginated formats.
    pub page: Option<u32>,
}

impl DocumentMetadata {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            page: None,
        }
    }

    #[must_use]
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }
}

/// Extracted text of one file (or one page of it).
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub text: String,
    pub metadata: DocumentMetadata,
}

impl Document {
    pub fn new(text: impl Into<String>, metadata: DocumentMetadata) -> Self {
        Self {
            text: text.into(),
            metadata,
        }
    }
}

/// Supported input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
    PlainText,
    Unsupported,
}

impl DocumentKind {
    /// Map a file extension (with or without the leading dot) to a kind.
    #[must_use]
    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.trim().trim_start_matches('.').to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Self::Pdf,
            "docx" => Self::Docx,
            "txt" => Self::PlainText,
            _ => Self::Unsupported,
        }
    }

    /// Kind of a path, judged by its extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or(Self::Unsupported)
    }
}

/// Extract documents from `path`, surfacing extraction errors.
///
/// `source` is recorded in each document's metadata.
pub fn try_load(path: &Path, source: &str, kind: DocumentKind) -> Result<Vec<Document>, LoadError> {
    match kind {
        DocumentKind::Pdf => pdf::load(path, source),
        DocumentKind::Docx => docx::load(path, source),
        DocumentKind::PlainText => {
            let bytes = std::fs::read(path)?;
            let text = String::from_utf8(bytes)?;
            Ok(vec![Document::new(text, DocumentMetadata::new(source))])
        }
        DocumentKind::Unsupported => Ok(Vec::new()),
    }
}

/// Extract documents from `path`, containing any failure to this file.
///
/// Errors are logged and produce an empty result so a batch is never
/// aborted by one bad file.
pub fn load(path: &Path, source: &str, kind: DocumentKind) -> Vec<Document> {
    if kind == DocumentKind::Unsupported {
        debug!("Skipping unsupported file: {source}");
        return Vec::new();
    }

    match try_load(path, source, kind) {
        Ok(docs) => {
            debug!("Loaded {} document(s) from {source}", docs.len());
            docs
        }
        Err(e) => {
            warn!("Failed to load {source} ({}): {e}", path.display());
            Vec::new()
        }
    }
}
