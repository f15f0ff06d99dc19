//! Top-level error aggregate. Every module exposes its own leaf error enum;
//! `FolioError` is what the orchestrator and the CLI consume.

use crate::types::BookStatus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("failed to read cache entry: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to publish cache entry: {0}")]
    Publish(String),
}

#[derive(Error, Debug)]
pub enum DigitizeError {
    #[error("failed to build reqwest client: {0}")]
    ClientBuild(reqwest::Error),
    #[error("request to digitization service failed: {0}")]
    Request(reqwest::Error),
    #[error("digitization service returned an error: {0}")]
    Api(String),
    #[error("failed to read or probe PDF: {0}")]
    Pdf(String),
    #[error("failed to split PDF into page windows: {0}")]
    Split(String),
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),
}

#[derive(Error, Debug)]
pub enum StructureError {
    #[error("no normalized pages supplied")]
    EmptyInput,
    #[error("invalid structure: {0}")]
    Invalid(String),
}

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("failed to build reqwest client: {0}")]
    ClientBuild(reqwest::Error),
    #[error("request to LLM service failed: {0}")]
    Request(reqwest::Error),
    #[error("LLM service returned an error: {0}")]
    Api(String),
    #[error("LLM response failed structured-output validation: {0}")]
    SchemaValidation(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("precondition violated: book was at {from:?}, operation required a different state for {attempted:?}")]
    PreconditionViolated {
        from: BookStatus,
        attempted: BookStatus,
    },
    #[error("book {0} not found")]
    NotFound(String),
    #[error("structure is invalid: {0}")]
    InvalidStructure(String),
    #[error("stage aborted: every task failed")]
    StageAborted,
    #[error("digitize error: {0}")]
    Digitize(#[from] DigitizeError),
    #[error("structure error: {0}")]
    Structure(#[from] StructureError),
    #[error("llm error: {0}")]
    Llm(#[from] LlmError),
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),
    #[error("repository error: {0}")]
    Repository(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    General(String),
    #[error("configuration file not found: {0}")]
    NotFound(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::General(err.to_string())
    }
}

/// The crate-wide error type. Component errors convert into it via `#[from]`
/// the same way the teacher aggregates `turso::Error`/`reqwest::Error`/
/// `PromptError` into `KnowledgeError`.
#[derive(Error, Debug)]
pub enum FolioError {
    #[error("cache: {0}")]
    Cache(#[from] CacheError),
    #[error("digitize: {0}")]
    Digitize(#[from] DigitizeError),
    #[error("structure: {0}")]
    Structure(#[from] StructureError),
    #[error("llm: {0}")]
    Llm(#[from] LlmError),
    #[error("orchestrator: {0}")]
    Orchestrator(#[from] OrchestratorError),
    #[error("config: {0}")]
    Config(#[from] ConfigError),
}
