//! # Digitization Client
//!
//! Turns a PDF file path into a single logical digitization response
//! regardless of page count: probes the page count locally, chunks oversize
//! PDFs into windows, retries each chunk with backoff, and merges the
//! results so chunking is transparent to every caller except for a
//! metadata flag.

pub mod pdfsplit;

use crate::cache::{CacheMeta, CacheStore, Namespace};
use crate::error::DigitizeError;
use crate::retry::{Classification, RetryPolicy};
use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// One raw layout element as the digitization service emits it: HTML text,
/// an inline style carrying font size, and the polygon points the layout
/// normalizer reduces to a bounding box.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawElement {
    pub id: String,
    pub category: String,
    pub text_html: String,
    #[serde(default)]
    pub style: Option<String>,
    pub points: Vec<(f64, f64)>,
    pub page: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub pages: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DigitizationMetadata {
    #[serde(default)]
    pub split_parsing: bool,
    #[serde(default)]
    pub total_chunks: u32,
}

/// The uniform response shape every caller of `digitize()` sees, whether it
/// came from a single request or was assembled from chunk merges.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigitizationResponse {
    pub elements: Vec<RawElement>,
    pub usage: Usage,
    pub model: String,
    pub api_version: String,
    #[serde(default)]
    pub metadata: DigitizationMetadata,
}

/// A layout-recognition provider. One production implementation
/// (`HttpDigitizationClient`); tests substitute a `wiremock`-backed server.
#[async_trait]
pub trait DigitizationClient: Send + Sync + Debug {
    async fn digitize_chunk(&self, path: &Path) -> Result<DigitizationResponse, (Classification, DigitizeError)>;
}

#[derive(Clone, Debug)]
pub struct HttpDigitizationClient {
    client: ReqwestClient,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpDigitizationClient {
    pub fn new(endpoint: String, api_key: Option<String>, timeout: Duration) -> Result<Self, DigitizeError> {
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(DigitizeError::ClientBuild)?;
        Ok(HttpDigitizationClient {
            client,
            endpoint,
            api_key,
        })
    }

    fn classify(status: StatusCode) -> Classification {
        if status == StatusCode::TOO_MANY_REQUESTS {
            Classification::RateLimited
        } else if status.is_server_error() {
            Classification::Transient
        } else {
            Classification::Permanent
        }
    }
}

#[async_trait]
impl DigitizationClient for HttpDigitizationClient {
    async fn digitize_chunk(&self, path: &Path) -> Result<DigitizationResponse, (Classification, DigitizeError)> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| (Classification::Permanent, DigitizeError::Pdf(e.to_string())))?;

        let mut builder = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/pdf");
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.body(bytes).send().await.map_err(|e| {
            let classification = if e.is_timeout() || e.is_connect() {
                Classification::Transient
            } else {
                Classification::Permanent
            };
            (classification, DigitizeError::Request(e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err((Self::classify(status), DigitizeError::Api(body)));
        }

        response
            .json::<DigitizationResponse>()
            .await
            .map_err(|e| (Classification::Transient, DigitizeError::Request(e)))
    }
}

const INTER_CHUNK_SPACING: Duration = Duration::from_secs(2);

/// Drives the full algorithm: probe, chunk, retry, merge, cache-through.
/// `client` performs a single chunk's request; this function owns chunking,
/// spacing, and merging.
pub struct DigitizationController<'a> {
    pub client: &'a dyn DigitizationClient,
    pub cache: &'a CacheStore,
    pub retry: RetryPolicy,
    pub page_cap: u32,
}

impl<'a> DigitizationController<'a> {
    pub fn new(client: &'a dyn DigitizationClient, cache: &'a CacheStore, retry: RetryPolicy, page_cap: u32) -> Self {
        DigitizationController {
            client,
            cache,
            retry,
            page_cap,
        }
    }

    /// Converts `path` into a single logical `DigitizationResponse`.
    /// Short-circuits on a cache hit keyed by the file's content
    /// fingerprint.
    pub async fn digitize(&self, path: &Path) -> Result<DigitizationResponse, DigitizeError> {
        let fingerprint = self.cache.file_fingerprint(path)?;
        if let Some(cached) = self.cache.lookup::<DigitizationResponse>(Namespace::Digitization, &fingerprint) {
            info!(fingerprint = %fingerprint, "digitization cache hit");
            return Ok(cached);
        }

        let total_pages = match pdfsplit::probe_page_count(path).await {
            Ok(n) => n,
            Err(e) => {
                warn!(error = %e, "page-count probe failed, falling back to single-request mode");
                0
            }
        };

        let response = if total_pages == 0 || total_pages <= self.page_cap {
            self.digitize_with_retry(path).await?
        } else {
            self.digitize_chunked(path, total_pages).await?
        };

        self.cache.store(
            Namespace::Digitization,
            &fingerprint,
            &response,
            CacheMeta {
                original_path: Some(path.display().to_string()),
                ..CacheMeta::now()
            },
        );

        Ok(response)
    }

    async fn digitize_with_retry(&self, path: &Path) -> Result<DigitizationResponse, DigitizeError> {
        self.retry
            .run(|_attempt| async move { self.client.digitize_chunk(path).await })
            .await
    }

    async fn digitize_chunked(&self, path: &Path, total_pages: u32) -> Result<DigitizationResponse, DigitizeError> {
        let ranges = pdfsplit::window_ranges(total_pages, self.page_cap);
        let mut chunks = Vec::with_capacity(ranges.len());

        for (i, &(start, end)) in ranges.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(INTER_CHUNK_SPACING).await;
            }
            let window = pdfsplit::extract_page_window(path, start, end)
                .map_err(DigitizeError::Split)?;
            let chunk_response = self.digitize_with_retry(window.path()).await?;
            chunks.push((start - 1, chunk_response));
        }

        Ok(merge_chunks(chunks, total_pages))
    }
}

/// Pure merge logic, independent of HTTP: rebases `page` fields by each
/// chunk's cumulative offset, renumbers element ids so they stay unique,
/// unions elements, sets `usage.pages` to the probed total, and stamps
/// `{split_parsing: true, total_chunks}`.
pub fn merge_chunks(chunks: Vec<(u32, DigitizationResponse)>, total_pages: u32) -> DigitizationResponse {
    let total_chunks = chunks.len() as u32;
    let mut elements = Vec::new();
    let mut model = String::new();
    let mut api_version = String::new();

    for (chunk_index, (offset, mut chunk)) in chunks.into_iter().enumerate() {
        if model.is_empty() {
            model = chunk.model.clone();
            api_version = chunk.api_version.clone();
        }
        for element in chunk.elements.iter_mut() {
            element.page += offset;
            element.id = format!("chunk{chunk_index}-{}", element.id);
        }
        elements.append(&mut chunk.elements);
    }

    DigitizationResponse {
        elements,
        usage: Usage { pages: total_pages },
        model,
        api_version,
        metadata: DigitizationMetadata {
            split_parsing: true,
            total_chunks,
        },
    }
}
