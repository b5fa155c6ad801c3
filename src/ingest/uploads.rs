//! Per-batch staging of uploaded files on disk.
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use uuid::Uuid;

use super::UploadedFile;
use crate::loader::DocumentKind;

/// Reduce an uploaded filename to a safe single path component.
pub fn sanitize_filename(filename: &str) -> String {
    let name = filename
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or_default()
        .replace('\0', "");
    let name = name.trim();

    if name.is_empty() || name == "." || name == ".." {
        "upload".to_string()
    } else {
        name.to_string()
    }
}

/// An upload written to the staging directory.
#[derive(Debug)]
pub struct StagedFile {
    pub path: PathBuf,
    /// Sanitized original filename, recorded as the chunk source.
    pub source: String,
    pub kind: DocumentKind,
}

/// Staging directory for one ingest call.
///
/// Everything staged is removed when the batch is dropped, whatever the
/// outcome of the ingest.
pub struct UploadBatch {
    dir: PathBuf,
    files: Vec<StagedFile>,
}

impl UploadBatch {
    /// Create a fresh `batch-<uuid>` directory under `root`.
    pub fn create(root: &Path) -> io::Result<Self> {
        let dir = root.join(format!("batch-{}", Uuid::new_v4()));
        fs::create_dir_all(&dir)?;
        debug!("Staging uploads in {}", dir.display());
        Ok(Self {
            dir,
            files: Vec::new(),
        })
    }

    /// Write `file` into the batch directory.
    pub fn stage(&mut self, file: &UploadedFile) -> io::Result<&StagedFile> {
        let source = sanitize_filename(&file.filename);
        let path = self.dir.join(format!("{}-{source}", self.files.len()));
        let kind = if file.extension.trim().is_empty() {
            DocumentKind::from_path(Path::new(&source))
        } else {
            DocumentKind::from_extension(&file.extension)
        };

        // Tracked before writing so a partial write is still cleaned up.
        self.files.push(StagedFile {
            path: path.clone(),
            source,
            kind,
        });
        fs::write(&path, &file.content)?;

        Ok(&self.files[self.files.len() - 1])
    }

    pub fn files(&self) -> &[StagedFile] {
        &self.files
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Drop for UploadBatch {
    fn drop(&mut self) {
        for file in &self.files {
            match fs::remove_file(&file.path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to remove {}: {e}", file.path.display()),
            }
        }
        if let Err(e) = fs::remove_dir(&self.dir) {
            warn!("Failed to remove {}: {e}", self.dir.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("report.pdf"), "report.pdf");
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\Users\\me\\notes.txt"), "notes.txt");
        assert_eq!(sanitize_filename("dir/"), "upload");
        assert_eq!(sanitize_filename(".."), "upload");
        assert_eq!(sanitize_filename("  spaced.txt "), "spaced.txt");
    }

    #[test]
    fn test_stage_and_cleanup() {
        let root = tempdir().unwrap();
        let batch_dir;

        {
            let mut batch = UploadBatch::create(root.path()).unwrap();
            batch_dir = batch.dir().to_path_buf();

            let a = UploadedFile::new("same.txt", b"one".to_vec());
            let b = UploadedFile::new("same.txt", b"two".to_vec());
            let first = batch.stage(&a).unwrap().path.clone();
            let second = batch.stage(&b).unwrap().path.clone();

            assert_ne!(first, second);
            assert_eq!(fs::read(&first).unwrap(), b"one");
            assert_eq!(fs::read(&second).unwrap(), b"two");
            assert_eq!(batch.files()[1].source, "same.txt");
            assert_eq!(batch.files()[1].kind, DocumentKind::PlainText);
        }

        assert!(!batch_dir.exists());
        assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_empty_extension_falls_back_to_filename() {
        let root = tempdir().unwrap();
        let mut batch = UploadBatch::create(root.path()).unwrap();

        let undeclared = UploadedFile {
            filename: "notes.txt".into(),
            content: b"hello".to_vec(),
            extension: " ".into(),
        };
        assert_eq!(batch.stage(&undeclared).unwrap().kind, DocumentKind::PlainText);

        let declared = UploadedFile {
            filename: "notes.txt".into(),
            content: b"hello".to_vec(),
            extension: "csv".into(),
        };
        assert_eq!(batch.stage(&declared).unwrap().kind, DocumentKind::Unsupported);
    }

    #[test]
    fn test_batches_are_namespaced() {
        let root = tempdir().unwrap();
        let a = UploadBatch::create(root.path()).unwrap();
        let b = UploadBatch::create(root.path()).unwrap();
        assert_ne!(a.dir(), b.dir());
    }
}
