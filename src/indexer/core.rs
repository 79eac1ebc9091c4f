use crate::db::Db;
use crate::db::models::Passage;
use crate::embedder::Embedder;
use crate::indexer::passages::split_into_passages;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex as TokioMutex;
use tracing::{error, info, warn};

#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct IndexReport {
    pub indexed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub removed: usize,
}

pub struct Indexer<'a, E: Embedder + ?Sized> {
    pub db: Arc<TokioMutex<Db>>,
    pub embedder: &'a E,
    pub collection: &'a str,
    pub chunk_size: usize,
}

impl<'a, E: Embedder + ?Sized> Indexer<'a, E> {
    pub fn new(
        db: Arc<TokioMutex<Db>>,
        embedder: &'a E,
        collection: &'a str,
        chunk_size: usize,
    ) -> Self {
        Self {
            db,
            embedder,
            collection,
            chunk_size,
        }
    }

    /// Regular `*.txt` files directly inside `dir`, sorted by path.
    async fn content_files(dir: &Path) -> Result<Vec<PathBuf>> {
        let mut read_dir = tokio::fs::read_dir(dir)
            .await
            .with_context(|| format!("failed to read {}", dir.display()))?;

        let mut files = Vec::new();
        while let Some(entry) = read_dir.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("txt") {
                continue;
            }
            // metadata() follows symlinks, like Path::is_file
            match tokio::fs::metadata(&path).await {
                Ok(meta) if meta.is_file() => files.push(path),
                Ok(_) => {}
                Err(e) => warn!("Cannot stat {}: {e}", path.display()),
            }
        }
        files.sort();
        Ok(files)
    }

    /// Indexes the `*.txt` files directly inside `dir`.
    ///
    /// Unchanged files (same modification time) are skipped unless `force`.
    /// Documents whose file is gone are removed from the index. A directory
    /// with no content files leaves the index as it is.
    pub async fn index_directory<P: AsRef<Path>>(&self, dir: P, force: bool) -> Result<IndexReport> {
        let dir = dir.as_ref();
        let mut report = IndexReport::default();

        if !tokio::fs::try_exists(dir).await.unwrap_or(false) {
            warn!("Content directory {} does not exist, creating it", dir.display());
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("failed to create {}", dir.display()))?;
            warn!("Add content files (e.g. about.txt) to {}", dir.display());
            return Ok(report);
        }

        let files = Self::content_files(dir).await?;
        if files.is_empty() {
            warn!("No .txt files found in {}, index left unchanged", dir.display());
            return Ok(report);
        }
        info!("Indexing {} documents from {}", files.len(), dir.display());

        {
            let mut db = self.db.lock().await;
            db.check_embedding_model(self.embedder.model_name(), self.embedder.dimensions())?;
        }

        let existing = {
            let db = self.db.lock().await;
            db.list_documents(self.collection)?
        };

        let mut seen = HashSet::new();

        for path in files {
            let Some(doc_id) = path.file_name().and_then(|n| n.to_str()).map(str::to_string)
            else {
                continue;
            };
            seen.insert(doc_id.clone());

            let mod_time: DateTime<Utc> = match tokio::fs::metadata(&path)
                .await
                .and_then(|m| m.modified())
            {
                Ok(t) => t.into(),
                Err(e) => {
                    error!("Cannot stat {}: {e}", path.display());
                    report.failed += 1;
                    continue;
                }
            };

            if !force && existing.get(&doc_id) == Some(&mod_time) {
                report.skipped += 1;
                continue;
            }

            match self.index_file(&path, &doc_id, mod_time).await {
                Ok(()) => {
                    info!("Indexed: {doc_id}");
                    report.indexed += 1;
                }
                Err(e) => {
                    error!("Failed to index {doc_id}: {e:#}");
                    report.failed += 1;
                }
            }
        }

        // Drop documents whose file disappeared
        {
            let mut db = self.db.lock().await;
            for doc_id in existing.keys().filter(|id| !seen.contains(*id)) {
                if db.delete_document(self.collection, doc_id)? {
                    info!("Removed: {doc_id}");
                    report.removed += 1;
                }
            }
        }

        info!(
            "Indexing finished: {} indexed, {} unchanged, {} failed, {} removed",
            report.indexed, report.skipped, report.failed, report.removed
        );

        Ok(report)
    }

    async fn index_file(&self, path: &Path, doc_id: &str, mod_time: DateTime<Utc>) -> Result<()> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;

        let passages = split_into_passages(&content, self.chunk_size);
        let text_refs: Vec<&str> = passages.iter().map(String::as_str).collect();

        let vectors = if text_refs.is_empty() {
            Vec::new()
        } else {
            self.embedder.embed_batch(&text_refs).await?
        };

        let db_passages: Vec<Passage> = passages
            .iter()
            .enumerate()
            .map(|(position, content)| Passage {
                position,
                content: content.as_str(),
            })
            .collect();

        let mut db = self.db.lock().await;
        db.upsert_document(
            self.collection,
            doc_id,
            &content,
            mod_time,
            &db_passages,
            &vectors,
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::EmbedderError;
    use crate::embedder::mock::MockEmbedder;
    use async_trait::async_trait;
    use std::fs;
    use tempfile::tempdir;

    fn db() -> Arc<TokioMutex<Db>> {
        Arc::new(TokioMutex::new(Db::open_in_memory(768).unwrap()))
    }

    #[tokio::test]
    async fn test_indexer_differential_sync() {
        let temp_dir = tempdir().unwrap();
        let dir = temp_dir.path();
        fs::write(dir.join("about.txt"), "À propos").unwrap();
        fs::write(dir.join("skills.txt"), "Compétences").unwrap();

        let db = db();
        let embedder = MockEmbedder::default();
        let indexer = Indexer::new(db.clone(), &embedder, "portfolio_rag", 8000);

        // First sync
        let res1 = indexer.index_directory(dir, false).await.unwrap();
        assert_eq!(res1.indexed, 2);
        assert_eq!(res1.skipped, 0);

        // Second sync immediately - should skip both
        let res2 = indexer.index_directory(dir, false).await.unwrap();
        assert_eq!(res2.indexed, 0);
        assert_eq!(res2.skipped, 2);

        // Forced sync re-embeds everything
        let res3 = indexer.index_directory(dir, true).await.unwrap();
        assert_eq!(res3.indexed, 2);
        assert_eq!(res3.skipped, 0);

        let docs = db.lock().await.list_documents("portfolio_rag").unwrap();
        assert_eq!(docs.len(), 2);
        assert!(docs.contains_key("about.txt"));
    }

    #[tokio::test]
    async fn test_only_top_level_txt_files() {
        let temp_dir = tempdir().unwrap();
        let dir = temp_dir.path();
        fs::write(dir.join("about.txt"), "À propos").unwrap();
        fs::write(dir.join("notes.md"), "# ignored").unwrap();
        fs::create_dir(dir.join("nested")).unwrap();
        fs::write(dir.join("nested").join("deep.txt"), "ignored").unwrap();

        let db = db();
        let embedder = MockEmbedder::default();
        let indexer = Indexer::new(db.clone(), &embedder, "p", 8000);
        let report = indexer.index_directory(dir, false).await.unwrap();

        assert_eq!(report.indexed, 1);
        let docs = db.lock().await.list_documents("p").unwrap();
        assert_eq!(docs.keys().collect::<Vec<_>>(), vec!["about.txt"]);
    }

    #[tokio::test]
    async fn test_missing_directory_is_created() {
        let temp_dir = tempdir().unwrap();
        let dir = temp_dir.path().join("rag_content");

        let embedder = MockEmbedder::default();
        let indexer = Indexer::new(db(), &embedder, "p", 8000);
        let report = indexer.index_directory(&dir, false).await.unwrap();

        assert_eq!(report, IndexReport::default());
        assert!(dir.is_dir());
    }

    #[tokio::test]
    async fn test_deleted_file_is_removed() {
        let temp_dir = tempdir().unwrap();
        let dir = temp_dir.path();
        fs::write(dir.join("a.txt"), "A").unwrap();
        fs::write(dir.join("b.txt"), "B").unwrap();

        let db = db();
        let embedder = MockEmbedder::default();
        let indexer = Indexer::new(db.clone(), &embedder, "p", 8000);
        indexer.index_directory(dir, false).await.unwrap();

        fs::remove_file(dir.join("b.txt")).unwrap();
        let report = indexer.index_directory(dir, false).await.unwrap();
        assert_eq!(report.removed, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(db.lock().await.count_documents("p").unwrap(), 1);
    }

    fn set_mtime(path: &Path, t: std::time::SystemTime) {
        fs::OpenOptions::new()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(t)
            .unwrap();
    }

    #[tokio::test]
    async fn test_edit_within_same_second_is_reindexed() {
        use std::time::{Duration, UNIX_EPOCH};

        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("about.txt");
        let second = UNIX_EPOCH + Duration::from_secs(1_700_000_000);

        fs::write(&path, "old").unwrap();
        set_mtime(&path, second + Duration::from_millis(100));

        let db = db();
        let embedder = MockEmbedder::default();
        let indexer = Indexer::new(db.clone(), &embedder, "p", 8000);
        indexer.index_directory(temp_dir.path(), false).await.unwrap();

        fs::write(&path, "new content").unwrap();
        set_mtime(&path, second + Duration::from_millis(400));

        let report = indexer.index_directory(temp_dir.path(), false).await.unwrap();
        assert_eq!(report.indexed, 1);
        assert_eq!(report.skipped, 0);
        assert_eq!(
            db.lock().await.get_document("p", "about.txt").unwrap().as_deref(),
            Some("new content")
        );
    }

    #[tokio::test]
    async fn test_empty_directory_keeps_index() {
        let temp_dir = tempdir().unwrap();
        let dir = temp_dir.path();
        fs::write(dir.join("about.txt"), "À propos").unwrap();

        let db = db();
        let embedder = MockEmbedder::default();
        let indexer = Indexer::new(db.clone(), &embedder, "p", 8000);
        indexer.index_directory(dir, false).await.unwrap();

        fs::remove_file(dir.join("about.txt")).unwrap();
        fs::write(dir.join("README.md"), "not content").unwrap();
        let report = indexer.index_directory(dir, false).await.unwrap();

        assert_eq!(report, IndexReport::default());
        assert_eq!(db.lock().await.count_documents("p").unwrap(), 1);
    }

    #[tokio::test]
    async fn test_large_file_split_into_passages() {
        let temp_dir = tempdir().unwrap();
        let dir = temp_dir.path();
        let body = vec!["Un paragraphe assez long pour remplir.".repeat(3); 6].join("\n\n");
        fs::write(dir.join("projects.txt"), &body).unwrap();

        let db = db();
        let embedder = MockEmbedder::default();
        let indexer = Indexer::new(db.clone(), &embedder, "p", 200);
        indexer.index_directory(dir, false).await.unwrap();

        let guard = db.lock().await;
        let passages: i64 = guard
            .conn
            .query_row("SELECT COUNT(*) FROM passages", [], |row| row.get(0))
            .unwrap();
        assert!(passages > 1);
        assert_eq!(
            guard.get_document("p", "projects.txt").unwrap().as_deref(),
            Some(body.as_str())
        );
    }

    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbedderError> {
            Err(EmbedderError::Api {
                status: 429,
                body: "quota".to_string(),
            })
        }

        async fn embed_batch(&self, _texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedderError> {
            Err(EmbedderError::Api {
                status: 429,
                body: "quota".to_string(),
            })
        }

        fn dimensions(&self) -> usize {
            768
        }

        fn model_name(&self) -> &str {
            "failing"
        }
    }

    #[tokio::test]
    async fn test_embedding_failure_is_counted() {
        let temp_dir = tempdir().unwrap();
        let dir = temp_dir.path();
        fs::write(dir.join("a.txt"), "A").unwrap();
        fs::write(dir.join("b.txt"), "B").unwrap();

        let db = db();
        let indexer = Indexer::new(db.clone(), &FailingEmbedder, "p", 8000);
        let report = indexer.index_directory(dir, false).await.unwrap();

        assert_eq!(report.failed, 2);
        assert_eq!(report.indexed, 0);
        assert_eq!(db.lock().await.count_documents("p").unwrap(), 0);
    }
}
