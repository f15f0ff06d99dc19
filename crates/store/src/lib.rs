//! Durable-store contract and reference implementations.

pub mod file;
pub mod memory;
pub mod repository;

pub use file::FileBookRepository;
pub use memory::InMemoryBookRepository;
pub use repository::{BookRepository, RepositoryError};
