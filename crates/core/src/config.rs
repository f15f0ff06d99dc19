//! # Pipeline Configuration
//!
//! Defines `PipelineConfig` and the logic for loading it from a `config.yml`
//! file layered with environment overrides, the way the teacher's
//! `server::config` module loads `AppConfig`.

use crate::error::ConfigError;
use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use serde::Deserialize;
use std::fs;
use tracing::info;

/// All configuration enumerated in the external-interfaces contract,
/// collected onto a single struct.
#[derive(Debug, Deserialize, Clone)]
pub struct PipelineConfig {
    #[serde(default = "default_digitization_endpoint")]
    pub digitization_endpoint: String,
    #[serde(default)]
    pub digitization_api_key: Option<String>,

    #[serde(default = "default_llm_endpoint")]
    pub llm_endpoint: String,
    #[serde(default)]
    pub llm_api_key: Option<String>,
    #[serde(default = "default_llm_model")]
    pub llm_model: String,
    #[serde(default = "default_llm_temperature")]
    pub llm_temperature: f32,
    #[serde(default = "default_llm_timeout_secs")]
    pub llm_timeout_secs: u64,
    #[serde(default = "default_llm_retry_max")]
    pub llm_retry_max: u32,

    #[serde(default = "default_digitization_page_cap")]
    pub digitization_page_cap: u32,
    #[serde(default = "default_digitization_timeout_secs")]
    pub digitization_timeout_secs: u64,

    #[serde(default = "default_worker_pool_size")]
    pub worker_pool_size: usize,
    #[serde(default = "default_commit_cadence_pages")]
    pub commit_cadence_pages: usize,
    #[serde(default = "default_page_text_truncation_length")]
    pub page_text_truncation_length: usize,
    #[serde(default = "default_chapter_skip_threshold")]
    pub chapter_skip_threshold_pages: u32,

    #[serde(default = "default_cache_root")]
    pub cache_root: String,
    #[serde(default = "default_reports_root")]
    pub reports_root: String,
}

fn default_digitization_endpoint() -> String {
    "http://localhost:8088/v1/digitize".to_string()
}
fn default_llm_endpoint() -> String {
    "http://localhost:8089/v1/chat/completions".to_string()
}
fn default_llm_model() -> String {
    "chat-completions-default".to_string()
}
fn default_llm_temperature() -> f32 {
    0.3
}
fn default_llm_timeout_secs() -> u64 {
    60
}
fn default_llm_retry_max() -> u32 {
    3
}
fn default_digitization_page_cap() -> u32 {
    100
}
fn default_digitization_timeout_secs() -> u64 {
    120
}
fn default_worker_pool_size() -> usize {
    3
}
fn default_commit_cadence_pages() -> usize {
    10
}
fn default_page_text_truncation_length() -> usize {
    4000
}
fn default_chapter_skip_threshold() -> u32 {
    3
}
fn default_cache_root() -> String {
    "./cache".to_string()
}
fn default_reports_root() -> String {
    "./reports".to_string()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            digitization_endpoint: default_digitization_endpoint(),
            digitization_api_key: None,
            llm_endpoint: default_llm_endpoint(),
            llm_api_key: None,
            llm_model: default_llm_model(),
            llm_temperature: default_llm_temperature(),
            llm_timeout_secs: default_llm_timeout_secs(),
            llm_retry_max: default_llm_retry_max(),
            digitization_page_cap: default_digitization_page_cap(),
            digitization_timeout_secs: default_digitization_timeout_secs(),
            worker_pool_size: default_worker_pool_size(),
            commit_cadence_pages: default_commit_cadence_pages(),
            page_text_truncation_length: default_page_text_truncation_length(),
            chapter_skip_threshold_pages: default_chapter_skip_threshold(),
            cache_root: default_cache_root(),
            reports_root: default_reports_root(),
        }
    }
}

fn read_and_substitute(path: &str) -> Result<Option<String>, ConfigError> {
    if !std::path::Path::new(path).exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)
        .map_err(|e| ConfigError::General(format!("failed to read config file '{path}': {e}")))?;
    Ok(Some(content))
}

/// Loads `PipelineConfig` layering programmatic defaults, an optional
/// `config.yml` file, and `FOLIO_`-prefixed environment overrides
/// (`FOLIO_LLM_MODEL`, nested keys separated by `__`), mirroring
/// `server::config::get_config`.
pub fn load_config(config_path_override: Option<&str>) -> Result<PipelineConfig, ConfigError> {
    let defaults = PipelineConfig::default();
    let mut builder = ConfigBuilder::builder()
        .set_default("digitization_endpoint", defaults.digitization_endpoint)?
        .set_default("llm_endpoint", defaults.llm_endpoint)?
        .set_default("llm_model", defaults.llm_model)?
        .set_default("llm_temperature", defaults.llm_temperature as f64)?
        .set_default("llm_timeout_secs", defaults.llm_timeout_secs)?
        .set_default("llm_retry_max", defaults.llm_retry_max)?
        .set_default("digitization_page_cap", defaults.digitization_page_cap)?
        .set_default(
            "digitization_timeout_secs",
            defaults.digitization_timeout_secs,
        )?
        .set_default("worker_pool_size", defaults.worker_pool_size as i64)?
        .set_default("commit_cadence_pages", defaults.commit_cadence_pages as i64)?
        .set_default(
            "page_text_truncation_length",
            defaults.page_text_truncation_length as i64,
        )?
        .set_default(
            "chapter_skip_threshold_pages",
            defaults.chapter_skip_threshold_pages,
        )?
        .set_default("cache_root", defaults.cache_root)?
        .set_default("reports_root", defaults.reports_root)?;

    if let Some(path) = config_path_override {
        if let Some(content) = read_and_substitute(path)? {
            info!("loading pipeline configuration from '{path}'");
            builder = builder.add_source(File::from_str(&content, FileFormat::Yaml));
        } else {
            return Err(ConfigError::NotFound(format!(
                "configuration file not found at '{path}'"
            )));
        }
    } else {
        let conventional = "config.yml";
        if let Some(content) = read_and_substitute(conventional)? {
            info!("loading pipeline configuration from '{conventional}'");
            builder = builder.add_source(File::from_str(&content, FileFormat::Yaml));
        }
    }

    let settings = builder
        .add_source(
            Environment::with_prefix("FOLIO")
                .prefix_separator("_")
                .try_parsing(true)
                .separator("__"),
        )
        .build()?;

    let config: PipelineConfig = settings.try_deserialize()?;

    Ok(config)
}
