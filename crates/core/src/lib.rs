//! Content-addressed extraction pipeline for book-length PDFs.
//!
//! Modules are layered bottom-up: `cache` and `retry` are dependency-free
//! primitives; `digitize` and `layout` turn a PDF into normalized pages;
//! `structure` recovers chapter boundaries; `schema` and `llm` provide the
//! structured-output contract; `orchestrate` drives a book through its
//! status DAG using all of the above.

pub mod cache;
pub mod config;
pub mod digitize;
pub mod error;
pub mod layout;
pub mod llm;
pub mod orchestrate;
pub mod repository;
pub mod retry;
pub mod schema;
pub mod structure;
pub mod types;
