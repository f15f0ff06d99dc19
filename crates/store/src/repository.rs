//! Re-exports the `BookRepository` contract. It is defined in `folio-core`
//! rather than here because the orchestrator (also in `folio-core`) is the
//! contract's primary consumer, and `folio-store` already depends on
//! `folio-core` for its types — defining it here instead would create a
//! dependency cycle.

pub use folio_core::repository::{BookRepository, RepositoryError};
