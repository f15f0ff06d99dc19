//! Filesystem-backed `BookRepository`. The CLI's default: durable across
//! process invocations (unlike `InMemoryBookRepository`), which is what
//! makes the resume-after-partial-failure guarantee visible to an operator
//! running stage subcommands one at a time. Publishes use the same
//! tempfile-then-rename idiom as `folio_core::cache::CacheStore`.

use async_trait::async_trait;
use folio_core::repository::{BookRepository, RepositoryError};
use folio_core::types::{Book, ChapterArtifact, PageArtifact};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

#[derive(Debug)]
pub struct FileBookRepository {
    root: PathBuf,
    // Serializes writes; each write is read-modify-write over a whole file
    // so concurrent writers must not interleave.
    write_lock: Mutex<()>,
}

impl FileBookRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FileBookRepository {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn book_path(&self, book_id: &str) -> PathBuf {
        self.root.join("books").join(format!("{book_id}.json"))
    }

    fn pages_path(&self, book_id: &str) -> PathBuf {
        self.root.join("pages").join(format!("{book_id}.json"))
    }

    fn chapters_path(&self, book_id: &str) -> PathBuf {
        self.root.join("chapters").join(format!("{book_id}.json"))
    }

    fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>, RepositoryError> {
        match std::fs::read(path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| RepositoryError::Backend(format!("corrupt entry at {}: {e}", path.display()))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(RepositoryError::Backend(e.to_string())),
        }
    }

    fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), RepositoryError> {
        let dir = path.parent().ok_or_else(|| RepositoryError::Backend("path has no parent".to_string()))?;
        std::fs::create_dir_all(dir).map_err(|e| RepositoryError::Backend(e.to_string()))?;
        let payload = serde_json::to_vec_pretty(value).map_err(|e| RepositoryError::Backend(e.to_string()))?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| RepositoryError::Backend(e.to_string()))?;
        std::io::Write::write_all(&mut tmp, &payload).map_err(|e| RepositoryError::Backend(e.to_string()))?;
        tmp.persist(path).map_err(|e| RepositoryError::Backend(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl BookRepository for FileBookRepository {
    async fn get(&self, book_id: &str) -> Result<Option<Book>, RepositoryError> {
        Self::read_json(&self.book_path(book_id))
    }

    async fn put(&self, book: Book) -> Result<(), RepositoryError> {
        let _guard = self.write_lock.lock().await;
        Self::write_json(&self.book_path(&book.id), &book)
    }

    async fn delete(&self, book_id: &str) -> Result<(), RepositoryError> {
        let _guard = self.write_lock.lock().await;
        for path in [self.book_path(book_id), self.pages_path(book_id), self.chapters_path(book_id)] {
            match std::fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(RepositoryError::Backend(e.to_string())),
            }
        }
        Ok(())
    }

    async fn put_page_artifacts(&self, book_id: &str, artifacts: Vec<PageArtifact>) -> Result<(), RepositoryError> {
        let _guard = self.write_lock.lock().await;
        let path = self.pages_path(book_id);
        let mut existing: Vec<PageArtifact> = Self::read_json(&path)?.unwrap_or_default();
        for artifact in artifacts {
            if let Some(slot) = existing.iter_mut().find(|a| a.page_number == artifact.page_number) {
                *slot = artifact;
            } else {
                existing.push(artifact);
            }
        }
        Self::write_json(&path, &existing)
    }

    async fn list_page_artifacts(&self, book_id: &str) -> Result<Vec<PageArtifact>, RepositoryError> {
        Ok(Self::read_json(&self.pages_path(book_id))?.unwrap_or_default())
    }

    async fn put_chapter_artifact(&self, artifact: ChapterArtifact) -> Result<(), RepositoryError> {
        let _guard = self.write_lock.lock().await;
        let path = self.chapters_path(&artifact.book_id);
        let mut existing: Vec<ChapterArtifact> = Self::read_json(&path)?.unwrap_or_default();
        if let Some(slot) = existing
            .iter_mut()
            .find(|a| a.chapter_order_index == artifact.chapter_order_index)
        {
            *slot = artifact;
        } else {
            existing.push(artifact);
        }
        Self::write_json(&path, &existing)
    }

    async fn list_chapter_artifacts(&self, book_id: &str) -> Result<Vec<ChapterArtifact>, RepositoryError> {
        Ok(Self::read_json(&self.chapters_path(book_id))?.unwrap_or_default())
    }
}
