use super::{Db, models::SearchHit, serialize_vector};
use rusqlite::{Result, params};

impl Db {
    /// Perform vector similarity search using cosine distance
    pub fn search(
        &self,
        collection: &str,
        query_vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchHit>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let mut stmt = self.conn.prepare(
            r#"
            SELECT
                d.doc_id,
                p.content,
                p.position,
                vec_distance_cosine(v.embedding, ?) as distance
            FROM vec_passages v
            JOIN passages p ON v.rowid = p.id
            JOIN documents d ON p.document_id = d.id
            WHERE d.collection = ?
            ORDER BY distance ASC, d.doc_id ASC, p.position ASC
            LIMIT ?
            "#,
        )?;

        let rows = stmt.query_map(
            params![serialize_vector(query_vector), collection, top_k as i64],
            |row| {
                let distance: f64 = row.get(3)?;
                Ok(SearchHit {
                    doc_id: row.get(0)?,
                    content: row.get(1)?,
                    position: row.get::<_, i64>(2)? as usize,
                    similarity: 1.0 - distance,
                })
            },
        )?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }

        Ok(results)
    }
}
