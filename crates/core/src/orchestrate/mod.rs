//! # Extraction Orchestrator
//!
//! Drives a `Book` through its status DAG: ingest, structure, page-level
//! extraction, chapter-level synthesis, and the final report. `transition`
//! is the single code path allowed to mutate `Book::status`; every stage
//! method funnels its status change through it, the way the teacher
//! confines `KnowledgeEntry` state changes to one helper in `ingest/mod.rs`.
//! Page-stage concurrency reuses the `stream::iter(...).buffer_unordered`
//! idiom from the teacher's `backfill_metadata` example.

use crate::cache::{CacheMeta, CacheStore, Namespace};
use crate::config::PipelineConfig;
use crate::digitize::{DigitizationClient, DigitizationController};
use crate::error::OrchestratorError;
use crate::layout;
use crate::llm::{self, LlmClient};
use crate::repository::BookRepository;
use crate::retry::RetryPolicy;
use crate::schema::{self, Registry};
use crate::structure;
use crate::types::*;
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

/// The only function allowed to mutate `Book::status`. `allowed_from` is
/// the edge set for the attempted transition; anything else is a
/// precondition violation rather than a silent no-op.
pub fn transition(book: &mut Book, allowed_from: &[BookStatus], to: BookStatus) -> Result<(), OrchestratorError> {
    if !allowed_from.contains(&book.status) {
        return Err(OrchestratorError::PreconditionViolated {
            from: book.status,
            attempted: to,
        });
    }
    book.status = to;
    Ok(())
}

/// Checks the output invariants the structure analyzer and
/// `apply_structure` both must uphold: chapters ordered by `order_index`
/// starting at 0, strictly increasing `start_page`, each range
/// non-degenerate and contiguous within the body bounds.
fn validate_structure(structure: &Structure) -> Result<(), OrchestratorError> {
    if structure.main_start_page > structure.main_end_page {
        return Err(OrchestratorError::InvalidStructure(
            "main_start_page must not exceed main_end_page".to_string(),
        ));
    }
    let mut previous_end: Option<u32> = None;
    for (i, chapter) in structure.chapters.iter().enumerate() {
        if chapter.order_index as usize != i {
            return Err(OrchestratorError::InvalidStructure(format!(
                "chapter at position {i} has order_index {}, expected {i}",
                chapter.order_index
            )));
        }
        if chapter.start_page > chapter.end_page {
            return Err(OrchestratorError::InvalidStructure(format!(
                "chapter {i} has start_page {} after end_page {}",
                chapter.start_page, chapter.end_page
            )));
        }
        if chapter.start_page < structure.main_start_page || chapter.end_page > structure.main_end_page {
            return Err(OrchestratorError::InvalidStructure(format!(
                "chapter {i} falls outside the body range [{}, {}]",
                structure.main_start_page, structure.main_end_page
            )));
        }
        if let Some(prev) = previous_end {
            if chapter.start_page <= prev {
                return Err(OrchestratorError::InvalidStructure(format!(
                    "chapter {i} starts at {} which does not follow the previous chapter's end {prev}",
                    chapter.start_page
                )));
            }
        }
        previous_end = Some(chapter.end_page);
    }
    Ok(())
}

fn page_system_prompt(category: Category) -> String {
    format!(
        "You are extracting structured page-level data from a {category:?} book. \
         Respond with a single JSON object matching the required schema for this domain. \
         Do not include any text outside the JSON object."
    )
}

fn page_user_prompt(book_title: &str, chapter_title: &str, chapter_number: u32, raw_text: &str) -> String {
    format!(
        "Book: {book_title}\nChapter {chapter_number}: {chapter_title}\n\nPage text:\n{raw_text}"
    )
}

fn chapter_system_prompt(category: Category) -> String {
    format!(
        "You are synthesizing a chapter-level summary for a {category:?} book from its \
         constituent page summaries. Respond with a single JSON object matching the \
         required schema for this domain. Do not include any text outside the JSON object."
    )
}

fn chapter_user_prompt(book_title: &str, chapter_title: &str, chapter_number: u32, digest: &str) -> String {
    format!(
        "Book: {book_title}\nChapter {chapter_number}: {chapter_title}\n\nConstituent page summaries:\n{digest}"
    )
}

/// A single page's contribution to a chapter's synthesis digest: bounded,
/// deterministic, and reproducible from stored `PageArtifact`s alone.
#[derive(serde::Serialize)]
struct PageDigestEntry {
    page_number: u32,
    function_tag: String,
    summary: String,
}

/// Coordinates the external LLM/digitization services, the cache, and the
/// durable repository across every extraction stage.
pub struct ExtractionOrchestrator {
    pub llm: Arc<dyn LlmClient>,
    pub digitization_client: Arc<dyn DigitizationClient>,
    pub cache: Arc<CacheStore>,
    pub repository: Arc<dyn BookRepository>,
    pub registry: Registry,
    pub config: PipelineConfig,
}

impl ExtractionOrchestrator {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        digitization_client: Arc<dyn DigitizationClient>,
        cache: Arc<CacheStore>,
        repository: Arc<dyn BookRepository>,
        config: PipelineConfig,
    ) -> Self {
        ExtractionOrchestrator {
            llm,
            digitization_client,
            cache,
            repository,
            registry: Registry,
            config,
        }
    }

    async fn require_book(&self, book_id: &str) -> Result<Book, OrchestratorError> {
        let book = self
            .repository
            .get(book_id)
            .await
            .map_err(|e| OrchestratorError::Repository(e.to_string()))?;
        book.ok_or_else(|| OrchestratorError::NotFound(book_id.to_string()))
    }

    async fn put_book(&self, book: Book) -> Result<(), OrchestratorError> {
        self.repository
            .put(book)
            .await
            .map_err(|e| OrchestratorError::Repository(e.to_string()))
    }

    /// Regenerates the normalized, cleaned page stream for `book` by
    /// re-running digitization (a cache hit after the first call) and the
    /// layout normalizer. Deterministic given the same source file, so
    /// nothing about a book's pages is persisted separately from the PDF
    /// itself.
    async fn normalized_pages(&self, book: &Book) -> Result<Vec<NormalizedPage>, OrchestratorError> {
        let retry = RetryPolicy::new(self.config.llm_retry_max);
        let controller = DigitizationController::new(
            self.digitization_client.as_ref(),
            self.cache.as_ref(),
            retry,
            self.config.digitization_page_cap,
        );
        let response = controller.digitize(Path::new(&book.source_path)).await?;
        let pages = layout::normalize(&response);
        Ok(layout::clean(&pages))
    }

    /// Registers a new book and immediately runs digitization far enough to
    /// learn its page count, advancing it from `uploaded` to `parsed`.
    pub async fn ingest(
        &self,
        source_path: &str,
        title: String,
        author: Option<String>,
        category: Category,
    ) -> Result<Book, OrchestratorError> {
        let mut book = Book {
            id: Uuid::new_v4().to_string(),
            title,
            author,
            category,
            source_path: source_path.to_string(),
            page_count: 0,
            status: BookStatus::Uploaded,
            structure: None,
        };

        let pages = self.normalized_pages(&book).await?;
        book.page_count = pages.len() as u32;
        transition(&mut book, &[BookStatus::Uploaded], BookStatus::Parsed)?;
        self.put_book(book.clone()).await?;
        Ok(book)
    }

    /// Computes a structure candidate without persisting it.
    pub async fn structure_candidates(&self, book_id: &str) -> Result<Structure, OrchestratorError> {
        let book = self.require_book(book_id).await?;
        if book.status == BookStatus::Uploaded {
            return Err(OrchestratorError::PreconditionViolated {
                from: book.status,
                attempted: BookStatus::Structured,
            });
        }
        let pages = self.normalized_pages(&book).await?;
        Ok(structure::analyze(&pages)?)
    }

    /// Replaces the book's structure and (re-)transitions it to
    /// `structured`. Unlike every other stage edge this one accepts several
    /// source states, since a structure may be revised after the fact.
    pub async fn apply_structure(&self, book_id: &str, structure: Structure) -> Result<Book, OrchestratorError> {
        let mut book = self.require_book(book_id).await?;
        validate_structure(&structure)?;
        book.structure = Some(structure);
        transition(
            &mut book,
            &[BookStatus::Parsed, BookStatus::Structured, BookStatus::ErrorStructuring],
            BookStatus::Structured,
        )?;
        self.put_book(book.clone()).await?;
        Ok(book)
    }

    /// Extracts structured data for every page inside every chapter,
    /// concurrently up to `worker_pool_size`, committing every
    /// `commit_cadence_pages` completions. Pages whose content hash is
    /// already cached or already stored are never re-sent to the LLM,
    /// which is what makes re-invocation after a partial failure resume
    /// instead of redo.
    pub async fn extract_pages(&self, book_id: &str) -> Result<StageProgress, OrchestratorError> {
        let mut book = self.require_book(book_id).await?;
        if book.status != BookStatus::Structured {
            return Err(OrchestratorError::PreconditionViolated {
                from: book.status,
                attempted: BookStatus::PageSummarized,
            });
        }
        let structure = book
            .structure
            .clone()
            .ok_or_else(|| OrchestratorError::InvalidStructure("book has no structure".to_string()))?;

        let pages = self.normalized_pages(&book).await?;
        let pages_by_number: HashMap<u32, &NormalizedPage> = pages.iter().map(|p| (p.page_number, p)).collect();

        let already_done: std::collections::HashSet<(u32, String)> = self
            .repository
            .list_page_artifacts(book_id)
            .await
            .map_err(|e| OrchestratorError::Repository(e.to_string()))?
            .into_iter()
            .map(|a| (a.page_number, a.content_hash))
            .collect();

        let mut work_items = Vec::new();
        for chapter in &structure.chapters {
            for page_number in chapter.start_page..=chapter.end_page {
                if let Some(page) = pages_by_number.get(&page_number) {
                    let content_hash = CacheStore::content_fingerprint(&page.raw_text);
                    if already_done.contains(&(page_number, content_hash)) {
                        continue;
                    }
                    work_items.push((chapter.clone(), (*page).clone()));
                }
            }
        }

        let mut progress = StageProgress {
            total: work_items.len() + already_done.len(),
            completed: already_done.len(),
            ..Default::default()
        };

        let pool_size = self.config.worker_pool_size.max(1);
        let truncate_len = self.config.page_text_truncation_length;
        let category = book.category;
        let book_title = book.title.clone();
        let book_id_owned = book_id.to_string();
        let retry = RetryPolicy::new(self.config.llm_retry_max);

        let start = Instant::now();
        let mut results = stream::iter(work_items.into_iter().map(|(chapter, page)| {
            let llm = self.llm.clone();
            let cache = self.cache.clone();
            let registry = self.registry;
            let retry = retry;
            let book_id_owned = book_id_owned.clone();
            let book_title = book_title.clone();
            let category = category;
            let truncate_len = truncate_len;
            async move {
                let content_hash = CacheStore::content_fingerprint(&page.raw_text);
                if let Some(existing) = cache.lookup::<PageArtifact>(Namespace::PageArtifact, &content_hash) {
                    return (page.page_number, Ok(existing));
                }

                let mut raw_text = page.raw_text.clone();
                if raw_text.len() > truncate_len {
                    let mut boundary = truncate_len;
                    while boundary > 0 && !raw_text.is_char_boundary(boundary) {
                        boundary -= 1;
                    }
                    raw_text.truncate(boundary);
                }
                let system_prompt = page_system_prompt(category);
                let user_prompt = page_user_prompt(&book_title, &chapter.title, chapter.order_index, &raw_text);

                let outcome: Result<PageArtifact, crate::error::LlmError> = async {
                    let raw: serde_json::Value =
                        llm::invoke_structured(llm.as_ref(), &retry, &system_prompt, &user_prompt).await?;
                    let record = registry
                        .parse_page_record(category, raw)
                        .map_err(crate::error::LlmError::SchemaValidation)?;
                    let artifact = PageArtifact {
                        book_id: book_id_owned.clone(),
                        page_number: page.page_number,
                        summary_text: record.common().summary.clone(),
                        structured_data: serde_json::to_value(&record).unwrap_or(serde_json::Value::Null),
                        content_hash: content_hash.clone(),
                        language: "auto".to_string(),
                    };
                    cache.store(Namespace::PageArtifact, &content_hash, &artifact, CacheMeta::now());
                    Ok(artifact)
                }
                .await
                .map_err(|e: crate::error::LlmError| e.to_string());

                (page.page_number, outcome)
            }
        }))
        .buffer_unordered(pool_size);

        let mut pending_batch = Vec::new();
        while let Some((page_number, outcome)) = results.next().await {
            match outcome {
                Ok(artifact) => {
                    pending_batch.push(artifact);
                    progress.completed += 1;
                }
                Err(e) => {
                    warn!(book_id, page_number, error = %e, "page extraction failed");
                    progress.failed += 1;
                }
            }
            if pending_batch.len() >= self.config.commit_cadence_pages {
                self.repository
                    .put_page_artifacts(book_id, std::mem::take(&mut pending_batch))
                    .await
                    .map_err(|e| OrchestratorError::Repository(e.to_string()))?;
            }
            progress.elapsed_secs = start.elapsed().as_secs_f64();
            progress.recompute_estimate();
        }
        if !pending_batch.is_empty() {
            self.repository
                .put_page_artifacts(book_id, pending_batch)
                .await
                .map_err(|e| OrchestratorError::Repository(e.to_string()))?;
        }

        if progress.completed == 0 {
            return Err(OrchestratorError::StageAborted);
        }

        transition(&mut book, &[BookStatus::Structured], BookStatus::PageSummarized)?;
        self.put_book(book).await?;
        info!(book_id, completed = progress.completed, failed = progress.failed, "page extraction complete");
        Ok(progress)
    }

    /// Synthesizes each chapter sequentially from its constituent page
    /// artifacts. Chapters with fewer than `chapter_skip_threshold_pages`
    /// recovered pages are skipped rather than sent to the LLM with too
    /// little material to ground a summary.
    pub async fn extract_chapters(&self, book_id: &str) -> Result<StageProgress, OrchestratorError> {
        let mut book = self.require_book(book_id).await?;
        if book.status != BookStatus::PageSummarized {
            return Err(OrchestratorError::PreconditionViolated {
                from: book.status,
                attempted: BookStatus::Summarized,
            });
        }
        let structure = book
            .structure
            .clone()
            .ok_or_else(|| OrchestratorError::InvalidStructure("book has no structure".to_string()))?;

        let page_artifacts = self
            .repository
            .list_page_artifacts(book_id)
            .await
            .map_err(|e| OrchestratorError::Repository(e.to_string()))?;
        let by_page: HashMap<u32, &PageArtifact> = page_artifacts.iter().map(|a| (a.page_number, a)).collect();

        let already_done: std::collections::HashSet<(u32, String)> = self
            .repository
            .list_chapter_artifacts(book_id)
            .await
            .map_err(|e| OrchestratorError::Repository(e.to_string()))?
            .into_iter()
            .map(|a| (a.chapter_order_index, a.content_hash))
            .collect();

        let mut progress = StageProgress {
            total: structure.chapters.len(),
            ..Default::default()
        };
        let start = Instant::now();
        let retry = RetryPolicy::new(self.config.llm_retry_max);

        for chapter in &structure.chapters {
            let constituent: Vec<&PageArtifact> = (chapter.start_page..=chapter.end_page)
                .filter_map(|n| by_page.get(&n).copied())
                .collect();

            if constituent.len() < self.config.chapter_skip_threshold_pages as usize {
                progress.skipped += 1;
                continue;
            }

            let digest_entries: Vec<PageDigestEntry> = constituent
                .iter()
                .map(|a| PageDigestEntry {
                    page_number: a.page_number,
                    function_tag: extract_function_tag(&a.structured_data),
                    summary: a.summary_text.clone(),
                })
                .collect();
            let digest = serde_json::to_string(&digest_entries).unwrap_or_default();
            let book_context = serde_json::json!({"title": book.title, "category": book.category}).to_string();
            let content_hash = CacheStore::content_fingerprint(&format!("{digest}\u{0}{book_context}"));

            if already_done.contains(&(chapter.order_index, content_hash.clone())) {
                progress.completed += 1;
                continue;
            }

            if let Some(existing) = self
                .cache
                .lookup::<ChapterArtifact>(Namespace::ChapterArtifact, &content_hash)
            {
                self.repository
                    .put_chapter_artifact(existing)
                    .await
                    .map_err(|e| OrchestratorError::Repository(e.to_string()))?;
                progress.completed += 1;
                continue;
            }

            let system_prompt = chapter_system_prompt(book.category);
            let user_prompt = chapter_user_prompt(&book.title, &chapter.title, chapter.order_index, &digest);

            let outcome: Result<ChapterArtifact, crate::error::LlmError> = async {
                let raw: serde_json::Value =
                    llm::invoke_structured(self.llm.as_ref(), &retry, &system_prompt, &user_prompt).await?;
                let record = self
                    .registry
                    .parse_chapter_record(book.category, raw)
                    .map_err(crate::error::LlmError::SchemaValidation)?;
                Ok(ChapterArtifact {
                    book_id: book_id.to_string(),
                    chapter_order_index: chapter.order_index,
                    summary_text: record.common().summary_3_5_sentences.clone(),
                    structured_data: serde_json::to_value(&record).unwrap_or(serde_json::Value::Null),
                    content_hash: content_hash.clone(),
                })
            }
            .await;

            match outcome {
                Ok(artifact) => {
                    self.cache.store(Namespace::ChapterArtifact, &content_hash, &artifact, CacheMeta::now());
                    self.repository
                        .put_chapter_artifact(artifact)
                        .await
                        .map_err(|e| OrchestratorError::Repository(e.to_string()))?;
                    progress.completed += 1;
                }
                Err(e) => {
                    warn!(book_id, chapter = chapter.order_index, error = %e, "chapter synthesis failed");
                    progress.failed += 1;
                }
            }
            progress.elapsed_secs = start.elapsed().as_secs_f64();
            progress.recompute_estimate();
        }

        if progress.completed == 0 {
            return Err(OrchestratorError::StageAborted);
        }

        transition(&mut book, &[BookStatus::PageSummarized], BookStatus::Summarized)?;
        self.put_book(book).await?;
        Ok(progress)
    }

    /// Aggregates the book's artifacts into a single `BookReport` and
    /// writes it to `config.reports_root`. Does not advance `status`: a
    /// report may be regenerated freely once a book is `summarized`.
    pub async fn write_report(&self, book_id: &str) -> Result<BookReport, OrchestratorError> {
        let book = self.require_book(book_id).await?;
        if book.status != BookStatus::Summarized {
            return Err(OrchestratorError::PreconditionViolated {
                from: book.status,
                attempted: BookStatus::Summarized,
            });
        }
        let structure = book
            .structure
            .clone()
            .ok_or_else(|| OrchestratorError::InvalidStructure("book has no structure".to_string()))?;

        let page_artifacts = self
            .repository
            .list_page_artifacts(book_id)
            .await
            .map_err(|e| OrchestratorError::Repository(e.to_string()))?;
        let chapter_artifacts = self
            .repository
            .list_chapter_artifacts(book_id)
            .await
            .map_err(|e| OrchestratorError::Repository(e.to_string()))?;
        let chapters_by_index: HashMap<u32, &ChapterArtifact> =
            chapter_artifacts.iter().map(|a| (a.chapter_order_index, a)).collect();

        let mut references: Vec<String> = page_artifacts
            .iter()
            .flat_map(|a| extract_references(&a.structured_data))
            .collect();
        references.sort();
        references.dedup();

        let mut chapter_entries = Vec::new();
        let mut skipped_chapter_count = 0usize;
        for chapter in &structure.chapters {
            match chapters_by_index.get(&chapter.order_index) {
                Some(artifact) => {
                    let common = chapter_common_of(&artifact.structured_data);
                    chapter_entries.push(ChapterEntry {
                        order_index: chapter.order_index,
                        title: chapter.title.clone(),
                        start_page: chapter.start_page,
                        end_page: chapter.end_page,
                        page_count: chapter.end_page - chapter.start_page + 1,
                        core_message: common.0,
                        summary_3_5_sentences: common.1,
                    });
                }
                None => skipped_chapter_count += 1,
            }
        }

        let retry = RetryPolicy::new(self.config.llm_retry_max);
        let combined_digest = serde_json::to_string(
            &chapter_entries
                .iter()
                .map(|c| (c.title.clone(), c.core_message.clone(), c.summary_3_5_sentences.clone()))
                .collect::<Vec<_>>(),
        )
        .unwrap_or_default();

        let book_summary_prompt = format!(
            "Synthesize a whole-book summary for \"{}\" from its chapter summaries:\n{combined_digest}",
            book.title
        );
        let book_summary: BookSummary = llm::invoke_structured(
            self.llm.as_ref(),
            &retry,
            "Respond with a single JSON object: core_message, summary_3_5_sentences, main_themes (array), argument_flow.",
            &book_summary_prompt,
        )
        .await?;

        let mut group_names = vec![
            "insights".to_string(),
            "key_events".to_string(),
            "key_examples".to_string(),
            "key_persons".to_string(),
            "key_concepts".to_string(),
            "key_arguments".to_string(),
        ];
        group_names.extend(self.registry.domain_group_names(book.category).iter().map(|s| s.to_string()));

        let group_results: Vec<(String, Vec<String>)> = stream::iter(group_names.into_iter().map(|group| {
            let llm = self.llm.clone();
            let retry = retry;
            let digest = combined_digest.clone();
            let title = book.title.clone();
            async move {
                let prompt = format!(
                    "From the following chapter summaries of \"{title}\", extract the \"{group}\" entity group. \
                     Respond with a single JSON object: {{\"items\": [ ... ]}}.\n{digest}"
                );
                let parsed: Result<ItemsEnvelope, _> =
                    llm::invoke_structured(llm.as_ref(), &retry, "Respond with a single JSON object: items (array of strings).", &prompt).await;
                (group, parsed.map(|p| p.items).unwrap_or_default())
            }
        }))
        .buffer_unordered(self.config.worker_pool_size.max(1))
        .collect()
        .await;

        let mut entity_synthesis = EntitySynthesis::default();
        let mut domain_groups = HashMap::new();
        for (group, items) in group_results {
            match group.as_str() {
                "insights" => entity_synthesis.insights = items,
                "key_events" => entity_synthesis.key_events = items,
                "key_examples" => entity_synthesis.key_examples = items,
                "key_persons" => entity_synthesis.key_persons = items,
                "key_concepts" => entity_synthesis.key_concepts = items,
                "key_arguments" => entity_synthesis.key_arguments = items,
                other => {
                    domain_groups.insert(other.to_string(), items);
                }
            }
        }
        entity_synthesis.domain_groups = domain_groups;

        let statistics = ReportStatistics {
            total_pages: page_artifacts.len(),
            total_chapters: structure.chapters.len(),
            skipped_chapters: skipped_chapter_count,
            reference_count: references.len(),
        };

        let report = BookReport {
            metadata: ReportMetadata {
                book_id: book.id.clone(),
                title: book.title.clone(),
                author: book.author.clone(),
                category: book.category,
                page_count: book.page_count,
                chapter_count: structure.chapters.len(),
                skipped_chapter_count,
            },
            book_summary,
            chapter_entries,
            entity_synthesis,
            references,
            statistics,
        };

        self.persist_report(&book.title, &report)?;
        Ok(report)
    }

    fn persist_report(&self, book_title: &str, report: &BookReport) -> Result<(), OrchestratorError> {
        let dir = Path::new(&self.config.reports_root);
        std::fs::create_dir_all(dir)?;
        let safe_title = sanitize_file_name(book_title);
        let path = dir.join(format!("{safe_title}.json"));
        let payload = serde_json::to_vec_pretty(report)
            .map_err(|e| OrchestratorError::Repository(format!("failed to serialize report: {e}")))?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        std::io::Write::write_all(&mut tmp, &payload)?;
        tmp.persist(&path)
            .map_err(|e| OrchestratorError::Repository(format!("failed to publish report: {e}")))?;
        Ok(())
    }
}

#[derive(serde::Deserialize)]
struct ItemsEnvelope {
    items: Vec<String>,
}

fn sanitize_file_name(title: &str) -> String {
    title
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

fn extract_function_tag(structured_data: &serde_json::Value) -> String {
    structured_data
        .get("function_tag")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}

fn chapter_common_of(structured_data: &serde_json::Value) -> (String, String) {
    let core_message = structured_data
        .get("core_message")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    let summary = structured_data
        .get("summary_3_5_sentences")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    (core_message, summary)
}

/// Pulls whatever citation-shaped field a domain record carries
/// (`citations` for humanities records today) out of a stored page's
/// structured data, for the report's de-duplicated references list.
fn extract_references(structured_data: &serde_json::Value) -> Vec<String> {
    structured_data
        .get("citations")
        .and_then(|v| v.as_array())
        .map(|arr| arr.iter().filter_map(|v| v.as_str().map(String::from)).collect())
        .unwrap_or_default()
}
