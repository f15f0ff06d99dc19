//! In-memory `BookRepository` reference implementation. Suitable for tests
//! and for the CLI's single-process, single-invocation usage; a durable
//! backend (e.g. a relational store, the way the teacher's `core-access`
//! crate sits in front of Turso) can implement the same trait without the
//! orchestrator changing at all.

use async_trait::async_trait;
use folio_core::repository::{BookRepository, RepositoryError};
use folio_core::types::{Book, ChapterArtifact, PageArtifact};
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct InMemoryBookRepository {
    books: RwLock<HashMap<String, Book>>,
    page_artifacts: RwLock<HashMap<String, Vec<PageArtifact>>>,
    chapter_artifacts: RwLock<HashMap<String, Vec<ChapterArtifact>>>,
}

impl InMemoryBookRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookRepository for InMemoryBookRepository {
    async fn get(&self, book_id: &str) -> Result<Option<Book>, RepositoryError> {
        Ok(self.books.read().await.get(book_id).cloned())
    }

    async fn put(&self, book: Book) -> Result<(), RepositoryError> {
        self.books.write().await.insert(book.id.clone(), book);
        Ok(())
    }

    async fn delete(&self, book_id: &str) -> Result<(), RepositoryError> {
        self.books.write().await.remove(book_id);
        self.page_artifacts.write().await.remove(book_id);
        self.chapter_artifacts.write().await.remove(book_id);
        Ok(())
    }

    async fn put_page_artifacts(&self, book_id: &str, artifacts: Vec<PageArtifact>) -> Result<(), RepositoryError> {
        let mut store = self.page_artifacts.write().await;
        let existing = store.entry(book_id.to_string()).or_default();
        for artifact in artifacts {
            if let Some(slot) = existing.iter_mut().find(|a| a.page_number == artifact.page_number) {
                *slot = artifact;
            } else {
                existing.push(artifact);
            }
        }
        Ok(())
    }

    async fn list_page_artifacts(&self, book_id: &str) -> Result<Vec<PageArtifact>, RepositoryError> {
        Ok(self.page_artifacts.read().await.get(book_id).cloned().unwrap_or_default())
    }

    async fn put_chapter_artifact(&self, artifact: ChapterArtifact) -> Result<(), RepositoryError> {
        let mut store = self.chapter_artifacts.write().await;
        let existing = store.entry(artifact.book_id.clone()).or_default();
        if let Some(slot) = existing
            .iter_mut()
            .find(|a| a.chapter_order_index == artifact.chapter_order_index)
        {
            *slot = artifact;
        } else {
            existing.push(artifact);
        }
        Ok(())
    }

    async fn list_chapter_artifacts(&self, book_id: &str) -> Result<Vec<ChapterArtifact>, RepositoryError> {
        Ok(self.chapter_artifacts.read().await.get(book_id).cloned().unwrap_or_default())
    }
}
