use super::{Db, models::Passage, serialize_vector};
use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Result, params};
use std::collections::HashMap;

impl Db {
    /// Returns a map of doc_id -> modified_at for a collection
    pub fn list_documents(&self, collection: &str) -> Result<HashMap<String, DateTime<Utc>>> {
        let mut stmt = self
            .conn
            .prepare("SELECT doc_id, modified_at FROM documents WHERE collection = ?")?;
        let rows = stmt.query_map(params![collection], |row| {
            let doc_id: String = row.get(0)?;
            let modified_at: DateTime<Utc> = row.get(1)?;
            Ok((doc_id, modified_at))
        })?;

        let mut docs = HashMap::new();
        for row in rows {
            let (doc_id, modified_at) = row?;
            docs.insert(doc_id, modified_at);
        }

        Ok(docs)
    }

    /// Number of documents in a collection
    pub fn count_documents(&self, collection: &str) -> Result<usize> {
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE collection = ?",
            params![collection],
            |row| row.get(0),
        )?;
        Ok(n as usize)
    }

    /// Full stored text of a document
    pub fn get_document(&self, collection: &str, doc_id: &str) -> Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT content FROM documents WHERE collection = ? AND doc_id = ?",
                params![collection, doc_id],
                |row| row.get(0),
            )
            .optional()
    }

    /// Deletes a document and its passages
    pub fn delete_document(&mut self, collection: &str, doc_id: &str) -> Result<bool> {
        let tx = self.conn.transaction()?;

        let id: Option<i64> = tx
            .query_row(
                "SELECT id FROM documents WHERE collection = ? AND doc_id = ?",
                params![collection, doc_id],
                |row| row.get(0),
            )
            .optional()?;

        let Some(id) = id else {
            return Ok(false);
        };

        // vec0 tables do not take part in foreign-key cascades
        tx.execute(
            "DELETE FROM vec_passages WHERE rowid IN (SELECT id FROM passages WHERE document_id = ?)",
            params![id],
        )?;
        let rows = tx.execute("DELETE FROM documents WHERE id = ?", params![id])?;
        tx.commit()?;

        Ok(rows > 0)
    }

    /// Inserts or replaces a document by `doc_id`, with its passages and embeddings
    pub fn upsert_document(
        &mut self,
        collection: &str,
        doc_id: &str,
        content: &str,
        modified_at: DateTime<Utc>,
        passages: &[Passage<'_>],
        embeddings: &[Vec<f32>],
    ) -> Result<()> {
        if passages.len() != embeddings.len() {
            return Err(rusqlite::Error::InvalidParameterCount(
                embeddings.len(),
                passages.len(),
            ));
        }

        let tx = self.conn.transaction()?;

        let id: i64 = tx.query_row(
            r#"
            INSERT INTO documents (collection, doc_id, content, modified_at, indexed_at)
            VALUES (?, ?, ?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(collection, doc_id) DO UPDATE SET
                content = excluded.content,
                modified_at = excluded.modified_at,
                indexed_at = CURRENT_TIMESTAMP
            RETURNING id
            "#,
            params![collection, doc_id, content, modified_at],
            |row| row.get(0),
        )?;

        // Drop the previous passages if this is a re-index
        tx.execute(
            "DELETE FROM vec_passages WHERE rowid IN (SELECT id FROM passages WHERE document_id = ?)",
            params![id],
        )?;
        tx.execute("DELETE FROM passages WHERE document_id = ?", params![id])?;

        for (passage, embedding) in passages.iter().zip(embeddings) {
            tx.execute(
                "INSERT INTO passages (document_id, position, content) VALUES (?, ?, ?)",
                params![id, passage.position as i64, passage.content],
            )?;
            let passage_id = tx.last_insert_rowid();

            tx.execute(
                "INSERT INTO vec_passages (rowid, embedding) VALUES (?, ?)",
                params![passage_id, serialize_vector(embedding)],
            )?;
        }

        tx.commit()?;
        Ok(())
    }
}
