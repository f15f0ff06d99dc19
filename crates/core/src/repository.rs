//! # Durable-Store Contract
//!
//! Fixes the seam between the orchestrator and whatever relational store an
//! operator plugs in, mirroring the teacher's narrow `core-access` crate:
//! the core only ever talks to this trait, never to a concrete database.
//! The trait lives here (rather than in `folio-store`) because
//! `folio-store`'s in-memory implementation depends on `folio-core`'s
//! types; putting the contract where the orchestrator consumes it avoids a
//! dependency cycle. `folio-store::memory` provides the reference
//! implementation.

use crate::types::{Book, ChapterArtifact, PageArtifact};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// The durable store's contract. The core reads and writes only the fields
/// documented on `Book`/`PageArtifact`/`ChapterArtifact`; concrete schema is
/// explicitly out of scope here.
#[async_trait]
pub trait BookRepository: Send + Sync {
    async fn get(&self, book_id: &str) -> Result<Option<Book>, RepositoryError>;
    async fn put(&self, book: Book) -> Result<(), RepositoryError>;
    /// Deletes the book and cascades to its Structure (embedded on `Book`),
    /// PageArtifacts, ChapterArtifacts, and BookReport. Cache entries are
    /// never touched — they have no owner.
    async fn delete(&self, book_id: &str) -> Result<(), RepositoryError>;

    async fn put_page_artifacts(&self, book_id: &str, artifacts: Vec<PageArtifact>) -> Result<(), RepositoryError>;
    async fn list_page_artifacts(&self, book_id: &str) -> Result<Vec<PageArtifact>, RepositoryError>;

    async fn put_chapter_artifact(&self, artifact: ChapterArtifact) -> Result<(), RepositoryError>;
    async fn list_chapter_artifacts(&self, book_id: &str) -> Result<Vec<ChapterArtifact>, RepositoryError>;
}
