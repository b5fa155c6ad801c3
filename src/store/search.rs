use super::{Db, models::RetrievedChunk, serialize_vector};
use crate::loader::DocumentMetadata;
use rusqlite::{Result, params};

fn map_search_row(row: &rusqlite::Row<'_>) -> Result<RetrievedChunk> {
    let distance: f64 = row.get(6)?;

    Ok(RetrievedChunk {
        chunk_id: row.get(0)?,
        content: row.get(1)?,
        metadata: DocumentMetadata {
            source: row.get(2)?,
            page: row.get(3)?,
        },
        position: row.get::<_, i64>(4)? as usize,
        char_offset: row.get::<_, i64>(5)? as usize,
        similarity: 1.0 - distance,
    })
}

impl Db {
    /// Perform vector similarity search using cosine distance.
    ///
    /// Ties are broken by insertion order.
    pub fn search(&self, query_vector: &[f32], top_k: usize) -> Result<Vec<RetrievedChunk>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT
                c.id,
                c.content,
                c.source,
                c.page,
                c.position,
                c.char_offset,
                vec_distance_cosine(v.embedding, ?) AS distance
            FROM vec_chunks v
            JOIN chunks c ON v.rowid = c.id
            ORDER BY distance ASC, c.id ASC
            LIMIT ?
            "#,
        )?;

        let rows = stmt.query_map(
            params![serialize_vector(query_vector), top_k as i64],
            map_search_row,
        )?;
        rows.collect()
    }
}
