use super::{Db, StoreError, serialize_vector};
use crate::chunker::Chunk;
use chrono::Utc;
use rusqlite::{Result, params};

impl Db {
    /// Inserts chunks and their embeddings in a single transaction.
    ///
    /// Returns the new chunk ids in input order.
    pub fn insert_chunks(
        &mut self,
        chunks: &[Chunk],
        embeddings: &[Vec<f32>],
    ) -> Result<Vec<i64>, StoreError> {
        if chunks.len() != embeddings.len() {
            return Err(StoreError::LengthMismatch {
                chunks: chunks.len(),
                embeddings: embeddings.len(),
            });
        }

        let ingested_at = Utc::now();
        let tx = self.conn.transaction()?;
        let mut ids = Vec::with_capacity(chunks.len());

        {
            let mut chunk_stmt = tx.prepare(
                r#"
                INSERT INTO chunks (source, page, position, char_offset, content, ingested_at)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )?;
            let mut vec_stmt =
                tx.prepare("INSERT INTO vec_chunks (rowid, embedding) VALUES (?, ?)")?;

            for (chunk, embedding) in chunks.iter().zip(embeddings) {
                chunk_stmt.execute(params![
                    chunk.metadata.source,
                    chunk.metadata.page,
                    chunk.position as i64,
                    chunk.char_offset as i64,
                    chunk.content,
                    ingested_at,
                ])?;
                let chunk_id = tx.last_insert_rowid();
                vec_stmt.execute(params![chunk_id, serialize_vector(embedding)])?;
                ids.push(chunk_id);
            }
        }

        tx.commit()?;
        Ok(ids)
    }

    /// Distinct sources in insertion order.
    pub fn list_sources(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT source FROM chunks GROUP BY source ORDER BY MIN(id)")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        rows.collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::DocumentMetadata;

    fn chunk(source: &str, position: usize, content: &str) -> Chunk {
        Chunk {
            content: content.to_string(),
            metadata: DocumentMetadata::new(source),
            position,
            char_offset: position * 10,
        }
    }

    #[test]
    fn test_insert_chunks() {
        let mut db = Db::open_in_memory(3).unwrap();
        let chunks = vec![chunk("a.txt", 0, "first"), chunk("b.pdf", 0, "second")];
        let embeddings = vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]];

        let ids = db.insert_chunks(&chunks, &embeddings).unwrap();
        assert_eq!(ids.len(), 2);
        assert!(ids[0] < ids[1]);
        assert_eq!(db.count().unwrap(), 2);

        let vec_rows: i64 = db
            .conn
            .query_row("SELECT COUNT(*) FROM vec_chunks", [], |row| row.get(0))
            .unwrap();
        assert_eq!(vec_rows, 2);
        assert_eq!(db.list_sources().unwrap(), vec!["a.txt", "b.pdf"]);
    }

    #[test]
    fn test_insert_chunks_length_mismatch() {
        let mut db = Db::open_in_memory(3).unwrap();
        let result = db.insert_chunks(&[chunk("a.txt", 0, "x")], &[]);
        assert!(matches!(
            result,
            Err(StoreError::LengthMismatch {
                chunks: 1,
                embeddings: 0
            })
        ));
        assert_eq!(db.count().unwrap(), 0);
    }
}
