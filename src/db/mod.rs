//! Vector store using SQLite and sqlite-vec
use rusqlite::{Connection, Result};
use sqlite_vec::sqlite3_vec_init;
use std::path::Path;
use std::sync::Once;
use tracing::info;

pub mod documents;
pub mod models;
pub mod search;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    collection TEXT NOT NULL,
    doc_id TEXT NOT NULL,
    content TEXT NOT NULL,
    indexed_at DATETIME DEFAULT CURRENT_TIMESTAMP,
    modified_at DATETIME NOT NULL,
    UNIQUE(collection, doc_id)
);

CREATE INDEX IF NOT EXISTS idx_collection ON documents(collection);

CREATE TABLE IF NOT EXISTS passages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    document_id INTEGER NOT NULL,
    position INTEGER NOT NULL,
    content TEXT NOT NULL,
    FOREIGN KEY (document_id) REFERENCES documents(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_document_id ON passages(document_id);

CREATE TABLE IF NOT EXISTS index_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

static INIT_VEC: Once = Once::new();

/// Initialize the sqlite-vec extension. Safe to call multiple times.
fn init_sqlite_vec() {
    INIT_VEC.call_once(|| unsafe {
        rusqlite::ffi::sqlite3_auto_extension(Some(std::mem::transmute(
            sqlite3_vec_init as *const (),
        )));
    });
}

/// A SQLite connection initialized with sqlite-vec and the index schema.
///
/// The `vec_passages` table is created with a fixed vector width, so a
/// database file is tied to one embedding dimensionality.
pub struct Db {
    pub(crate) conn: Connection,
    dimensions: usize,
}

impl Db {
    /// Open a database at the given path and initialize the schema.
    pub fn open<P: AsRef<Path>>(path: P, dimensions: usize) -> Result<Self> {
        let path = path.as_ref();
        info!("Initializing vector store: {}", path.display());

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|_| rusqlite::Error::InvalidPath(parent.to_path_buf()))?;
            }
        }

        init_sqlite_vec();
        let conn = Connection::open(path)?;
        Self::init(conn, dimensions)
    }

    /// Open an in-memory database (useful for testing).
    pub fn open_in_memory(dimensions: usize) -> Result<Self> {
        init_sqlite_vec();
        let conn = Connection::open_in_memory()?;
        Self::init(conn, dimensions)
    }

    fn init(conn: Connection, dimensions: usize) -> Result<Self> {
        let vec_version: String = conn.query_row("SELECT vec_version()", [], |row| row.get(0))?;
        info!("sqlite-vec version: {}", vec_version);

        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA_SQL)?;
        conn.execute_batch(&format!(
            "CREATE VIRTUAL TABLE IF NOT EXISTS vec_passages USING vec0(embedding FLOAT[{dimensions}]);"
        ))?;

        Ok(Self { conn, dimensions })
    }

    /// Width of the stored vectors.
    #[must_use]
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Make sure stored vectors come from `model` with `dimensions` components.
    ///
    /// The first call records the model. If a different model or width was
    /// recorded earlier, all documents are dropped (and the vector table is
    /// rebuilt at the new width) so that the next indexing pass re-embeds
    /// everything. Returns `true` when the index was reset.
    pub fn check_embedding_model(&mut self, model: &str, dimensions: usize) -> Result<bool> {
        let stored = self.meta("embedding_model")?;
        let expected = format!("{model}:{dimensions}");

        let reset = match stored {
            Some(ref s) if *s == expected => false,
            Some(ref s) => {
                info!("Embedding model changed ({s} -> {expected}), clearing index");
                true
            }
            None => dimensions != self.dimensions,
        };

        let tx = self.conn.transaction()?;
        if reset {
            tx.execute("DELETE FROM passages", [])?;
            tx.execute("DELETE FROM documents", [])?;
            tx.execute_batch(&format!(
                "DROP TABLE IF EXISTS vec_passages;
                 CREATE VIRTUAL TABLE vec_passages USING vec0(embedding FLOAT[{dimensions}]);"
            ))?;
        }
        tx.execute(
            "INSERT INTO index_meta (key, value) VALUES ('embedding_model', ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            [&expected],
        )?;
        tx.commit()?;

        if reset {
            self.dimensions = dimensions;
        }
        Ok(reset)
    }

    fn meta(&self, key: &str) -> Result<Option<String>> {
        use rusqlite::OptionalExtension;
        self.conn
            .query_row("SELECT value FROM index_meta WHERE key = ?", [key], |row| {
                row.get(0)
            })
            .optional()
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::Passage;
    use chrono::Utc;

    #[test]
    fn test_db_init() {
        let db = Db::open_in_memory(8).expect("Failed to open in-memory DB");

        let tables: usize = db
            .conn
            .query_row(
                "SELECT count(*) FROM sqlite_master WHERE type='table' AND name IN ('documents', 'passages', 'vec_passages', 'index_meta');",
                [],
                |row| row.get(0),
            )
            .unwrap();

        assert_eq!(tables, 4);
        assert_eq!(db.dimensions(), 8);
    }

    #[test]
    fn test_open_file_creates_parent_and_persists() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("nested").join("index.db");

        {
            let mut db = Db::open(&path, 4).unwrap();
            db.upsert_document(
                "c",
                "about.txt",
                "hello",
                Utc::now(),
                &[Passage {
                    position: 0,
                    content: "hello",
                }],
                &[vec![1.0, 0.0, 0.0, 0.0]],
            )
            .unwrap();
        }

        let db = Db::open(&path, 4).unwrap();
        assert_eq!(db.count_documents("c").unwrap(), 1);
    }

    #[test]
    fn test_embedding_model_change_resets_index() {
        let mut db = Db::open_in_memory(4).unwrap();
        assert!(!db.check_embedding_model("m1", 4).unwrap());
        db.upsert_document(
            "c",
            "a.txt",
            "a",
            Utc::now(),
            &[Passage {
                position: 0,
                content: "a",
            }],
            &[vec![0.5; 4]],
        )
        .unwrap();

        // Same model: nothing happens
        assert!(!db.check_embedding_model("m1", 4).unwrap());
        assert_eq!(db.count_documents("c").unwrap(), 1);

        // New model with a different width: index cleared and rebuilt
        assert!(db.check_embedding_model("m2", 3).unwrap());
        assert_eq!(db.count_documents("c").unwrap(), 0);
        assert_eq!(db.dimensions(), 3);

        db.upsert_document(
            "c",
            "a.txt",
            "a",
            Utc::now(),
            &[Passage {
                position: 0,
                content: "a",
            }],
            &[vec![0.5; 3]],
        )
        .unwrap();
        assert_eq!(db.count_documents("c").unwrap(), 1);
    }

    #[test]
    fn test_serialize_vector() {
        let vec = vec![1.0, 2.0, -3.5];
        let bytes = serialize_vector(&vec);
        assert_eq!(bytes.len(), 12);

        // 1.0f32 in hex: 0x3f800000 -> little endian: 00 00 80 3f
        assert_eq!(&bytes[0..4], &[0x00, 0x00, 0x80, 0x3f]);
        // -3.5f32 in hex: 0xc0600000 -> little endian: 00 00 60 c0
        assert_eq!(&bytes[8..12], &[0x00, 0x00, 0x60, 0xc0]);
    }
}
