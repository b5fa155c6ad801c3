//! Vector store backed by SQLite and sqlite-vec
use rusqlite::{Connection, OptionalExtension, params};
use sqlite_vec::sqlite3_vec_init;
use std::path::Path;
use std::sync::Once;
use thiserror::Error;
use tracing::{debug, info};

use crate::embedder::EmbedderError;

pub mod chunks;
pub mod models;
pub mod search;
pub mod vector_store;

pub use models::RetrievedChunk;
pub use vector_store::VectorStore;

/// Filename of the index inside the store directory.
pub const INDEX_FILENAME: &str = "index.sqlite3";

const META_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS store_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

const CHUNKS_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS chunks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    source TEXT NOT NULL,
    page INTEGER,
    position INTEGER NOT NULL,
    char_offset INTEGER NOT NULL,
    content TEXT NOT NULL,
    ingested_at DATETIME NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_chunks_source ON chunks(source);
"#;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbedderError),

    #[error("store holds {stored}-dimensional vectors but the embedder produces {requested}")]
    DimensionMismatch { stored: usize, requested: usize },

    #[error("{chunks} chunks but {embeddings} embeddings")]
    LengthMismatch { chunks: usize, embeddings: usize },

    #[error("failed to create store directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("store lock poisoned: {0}")]
    Poisoned(String),
}

static INIT_VEC: Once = Once::new();

/// Initialize the sqlite-vec extension. Safe to call multiple times.
fn init_sqlite_vec() {
    INIT_VEC.call_once(|| unsafe {
        rusqlite::ffi::sqlite3_auto_extension(Some(std::mem::transmute(
            sqlite3_vec_init as *const (),
        )));
    });
}

/// A SQLite connection initialized with sqlite-vec and the chunk schema.
pub struct Db {
    pub(crate) conn: Connection,
    dimensions: usize,
}

impl Db {
    /// Open (or create) the index at `path` for vectors of `dimensions`.
    pub fn open<P: AsRef<Path>>(path: P, dimensions: usize) -> Result<Self, StoreError> {
        let path = path.as_ref();
        info!("Opening vector index: {}", path.display());

        init_sqlite_vec();
        let conn = Connection::open(path)?;

        let mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        debug!("journal_mode = {mode}");

        Self::init(conn, dimensions)
    }

    /// Open an in-memory index (useful for testing).
    pub fn open_in_memory(dimensions: usize) -> Result<Self, StoreError> {
        init_sqlite_vec();
        let conn = Connection::open_in_memory()?;
        Self::init(conn, dimensions)
    }

    fn init(conn: Connection, dimensions: usize) -> Result<Self, StoreError> {
        let vec_version: String = conn.query_row("SELECT vec_version()", [], |row| row.get(0))?;
        debug!("sqlite-vec version: {vec_version}");

        conn.execute_batch(META_SQL)?;

        let stored: Option<String> = conn
            .query_row(
                "SELECT value FROM store_meta WHERE key = 'dimensions'",
                [],
                |row| row.get(0),
            )
            .optional()?;

        match stored.and_then(|s| s.parse::<usize>().ok()) {
            Some(stored) if stored != dimensions => {
                return Err(StoreError::DimensionMismatch {
                    stored,
                    requested: dimensions,
                });
            }
            Some(_) => {}
            None => {
                conn.execute(
                    "INSERT OR REPLACE INTO store_meta (key, value) VALUES ('dimensions', ?)",
                    params![dimensions.to_string()],
                )?;
            }
        }

        conn.execute_batch(CHUNKS_SQL)?;
        conn.execute_batch(&format!(
            "CREATE VIRTUAL TABLE IF NOT EXISTS vec_chunks USING vec0(embedding FLOAT[{dimensions}]);"
        ))?;

        Ok(Self { conn, dimensions })
    }

    #[must_use]
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Number of stored chunks.
    pub fn count(&self) -> rusqlite::Result<usize> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    /// Fold the write-ahead log into the main database file.
    pub fn checkpoint(&self) -> rusqlite::Result<()> {
        let (busy, log, checkpointed): (i64, i64, i64) = self.conn.query_row(
            "PRAGMA wal_checkpoint(TRUNCATE)",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;
        debug!("wal_checkpoint: busy={busy} log={log} checkpointed={checkpointed}");
        Ok(())
    }
}

/// Helper to serialize a float32 vector into bytes for vec0 virtual table
pub fn serialize_vector(vec: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vec.len() * 4);
    for v in vec {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}
