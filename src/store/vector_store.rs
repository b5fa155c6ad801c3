//! Persistent similarity index over embedded chunks.
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info};

use super::{Db, INDEX_FILENAME, RetrievedChunk, StoreError};
use crate::chunker::Chunk;
use crate::embedder::{Embedder, EmbedderError};

/// Chunks embedded per `embed_batch` call when adding.
pub const DEFAULT_BATCH_SIZE: usize = 32;

struct StoreState {
    db: Db,
    /// Chunks committed since the last checkpoint.
    pending: usize,
}

/// Embeds chunks on insert and answers nearest-neighbour queries.
///
/// Shared across threads behind `Arc`. Embedding runs outside the lock;
/// only the SQLite writes and reads are serialized.
pub struct VectorStore {
    inner: Mutex<StoreState>,
    embedder: Arc<dyn Embedder>,
    batch_size: usize,
}

impl VectorStore {
    /// Open the store rooted at `dir`, creating it if missing.
    pub fn open<P: AsRef<Path>>(dir: P, embedder: Arc<dyn Embedder>) -> Result<Self, StoreError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let db = Db::open(dir.join(INDEX_FILENAME), embedder.dimensions())?;
        info!("Vector store ready ({} chunks)", db.count()?);
        Ok(Self::from_db(db, embedder))
    }

    /// Open a store that lives only as long as this value.
    pub fn open_in_memory(embedder: Arc<dyn Embedder>) -> Result<Self, StoreError> {
        let db = Db::open_in_memory(embedder.dimensions())?;
        Ok(Self::from_db(db, embedder))
    }

    fn from_db(db: Db, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            inner: Mutex::new(StoreState { db, pending: 0 }),
            embedder,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>, StoreError> {
        self.inner
            .lock()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }

    /// Embed and insert `chunks`. Returns how many were added.
    ///
    /// Chunks are embedded in groups and each group is committed on its
    /// own, so a failure part-way leaves earlier groups in the store.
    pub fn add(&self, chunks: &[Chunk]) -> Result<usize, StoreError> {
        let mut added = 0;

        for group in chunks.chunks(self.batch_size) {
            let texts: Vec<&str> = group.iter().map(|c| c.content.as_str()).collect();
            let embeddings = self.embedder.embed_batch(&texts)?;
            if embeddings.len() != group.len() {
                return Err(EmbedderError::CountMismatch {
                    expected: group.len(),
                    actual: embeddings.len(),
                }
                .into());
            }

            let mut state = self.lock()?;
            state.db.insert_chunks(group, &embeddings)?;
            state.pending += group.len();
            added += group.len();
            debug!("Stored {} chunks ({added}/{})", group.len(), chunks.len());
        }

        Ok(added)
    }

    /// The `k` stored chunks closest to `query`, most similar first.
    pub fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievedChunk>, StoreError> {
        if k == 0 || self.is_empty()? {
            return Ok(Vec::new());
        }

        let query_vector = self.embedder.embed_query(query)?;
        let state = self.lock()?;
        let results = state.db.search(&query_vector, k)?;
        debug!("Retrieved {} chunks for query", results.len());
        Ok(results)
    }

    /// Make every added chunk durable on disk.
    pub fn persist(&self) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        if state.pending == 0 {
            return Ok(());
        }
        state.db.checkpoint()?;
        info!("Persisted {} new chunks", state.pending);
        state.pending = 0;
        Ok(())
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.db.count()?)
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    /// Distinct chunk sources, in the order they were first added.
    pub fn sources(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.lock()?.db.list_sources()?)
    }

    #[must_use]
    pub fn dimensions(&self) -> usize {
        self.embedder.dimensions()
    }
}
