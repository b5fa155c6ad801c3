//! Listing of the permanent documents directory.
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use indicatif::HumanBytes;
use serde::Serialize;
use tracing::{debug, info};

use crate::ingest::uploads::sanitize_filename;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentEntry {
    /// Display name derived from the filename.
    pub name: String,
    pub filename: String,
    pub size: u64,
    pub size_human: String,
    #[serde(rename = "type")]
    pub file_type: String,
}

impl DocumentEntry {
    fn from_file(filename: String, size: u64) -> Self {
        let path = Path::new(&filename);
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let file_type = path
            .extension()
            .map(|e| e.to_string_lossy().to_uppercase())
            .unwrap_or_default();

        Self {
            name: display_name(&stem),
            filename,
            size,
            size_human: HumanBytes(size).to_string(),
            file_type,
        }
    }
}

/// `quarterly_report-final` -> `Quarterly Report Final`
pub fn display_name(stem: &str) -> String {
    title_case(&stem.replace(['_', '-'], " "))
}

/// Uppercase the first letter of every alphabetic run, lowercase the rest.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for ch in s.chars() {
        if ch.is_alphabetic() {
            if in_word {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(ch);
            in_word = false;
        }
    }
    out
}

/// List regular files in `dir`, sorted by filename.
///
/// The directory is created if it does not exist yet.
pub fn list(dir: &Path) -> io::Result<Vec<DocumentEntry>> {
    fs::create_dir_all(dir)?;

    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let meta = entry.metadata()?;
        if !meta.is_file() {
            continue;
        }
        let filename = entry.file_name().to_string_lossy().into_owned();
        entries.push(DocumentEntry::from_file(filename, meta.len()));
    }
    entries.sort_by(|a, b| a.filename.cmp(&b.filename));

    debug!("Catalog {} lists {} documents", dir.display(), entries.len());
    Ok(entries)
}

/// Keep a copy of an ingested upload in `dir`, replacing any namesake.
pub fn archive(dir: &Path, filename: &str, content: &[u8]) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(sanitize_filename(filename));
    fs::write(&path, content)?;
    info!("Archived {}", path.display());
    Ok(path)
}
