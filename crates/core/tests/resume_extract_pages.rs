//! Resume semantics: re-invoking `extract_pages` against a book that
//! already has some page artifacts persisted (simulating a process that
//! was interrupted after committing a batch but before the stage
//! transitioned the book's status) must only dispatch the LLM for the
//! pages still missing, never redo the ones already stored.

mod common;

use common::{CountingLlmClient, FixedDigitizationClient, TestRepository};
use folio_core::cache::CacheStore;
use folio_core::config::PipelineConfig;
use folio_core::digitize::{DigitizationMetadata, DigitizationResponse, RawElement, Usage};
use folio_core::layout;
use folio_core::orchestrate::ExtractionOrchestrator;
use folio_core::repository::BookRepository;
use folio_core::types::{Book, BookStatus, Category, Chapter, PageArtifact, Structure};
use std::sync::Arc;

fn fixed_response(pages: u32) -> DigitizationResponse {
    let elements = (1..=pages)
        .map(|p| RawElement {
            id: format!("e{p}"),
            category: "paragraph".to_string(),
            text_html: format!("<p>Page {p} content</p>"),
            style: None,
            points: vec![(0.1, 0.1), (0.2, 0.1), (0.2, 0.15), (0.1, 0.15)],
            page: p,
        })
        .collect();
    DigitizationResponse {
        elements,
        usage: Usage { pages },
        model: "test".to_string(),
        api_version: "v1".to_string(),
        metadata: DigitizationMetadata::default(),
    }
}

#[tokio::test]
async fn extract_pages_skips_pages_already_committed_by_a_prior_run() {
    let (_pdf_dir, pdf_path) = common::write_blank_pdf(6);
    let response = fixed_response(6);
    let normalized = layout::clean(&layout::normalize(&response));
    assert_eq!(normalized.len(), 6);

    let repository = Arc::new(TestRepository::new());
    let book = Book {
        id: "book1".to_string(),
        title: "Sample Book".to_string(),
        author: None,
        category: Category::Misc,
        source_path: pdf_path.to_string_lossy().to_string(),
        page_count: 6,
        status: BookStatus::Structured,
        structure: Some(Structure {
            main_start_page: 1,
            main_end_page: 6,
            chapters: vec![
                Chapter { order_index: 0, title: "Chapter One".into(), start_page: 1, end_page: 3 },
                Chapter { order_index: 1, title: "Chapter Two".into(), start_page: 4, end_page: 6 },
            ],
        }),
    };
    repository.put(book).await.unwrap();

    // Simulate a prior, partially-committed run: pages 1-3 already stored.
    let already_done: Vec<PageArtifact> = normalized[0..3]
        .iter()
        .map(|page| PageArtifact {
            book_id: "book1".to_string(),
            page_number: page.page_number,
            summary_text: "prior summary".to_string(),
            structured_data: serde_json::json!({}),
            content_hash: CacheStore::content_fingerprint(&page.raw_text),
            language: "auto".to_string(),
        })
        .collect();
    repository.put_page_artifacts("book1", already_done).await.unwrap();

    let llm = Arc::new(CountingLlmClient::new());
    let digitization_client = Arc::new(FixedDigitizationClient { response });
    let cache_dir = tempfile::tempdir().unwrap();
    let cache = Arc::new(CacheStore::new(cache_dir.path()));
    let orchestrator = ExtractionOrchestrator::new(llm.clone(), digitization_client, cache, repository.clone(), PipelineConfig::default());

    let progress = orchestrator.extract_pages("book1").await.unwrap();

    assert_eq!(llm.call_count(), 3, "only the 3 uncommitted pages should reach the LLM");
    assert_eq!(progress.completed, 6);

    let stored = repository.list_page_artifacts("book1").await.unwrap();
    assert_eq!(stored.len(), 6);
    let prior_untouched = stored.iter().find(|a| a.page_number == 1).unwrap();
    assert_eq!(prior_untouched.summary_text, "prior summary", "already-done pages must not be re-fetched or overwritten");

    let updated_book = repository.get("book1").await.unwrap().unwrap();
    assert_eq!(updated_book.status, BookStatus::PageSummarized);
}

#[tokio::test]
async fn extract_pages_rejects_a_book_that_is_not_in_the_structured_state() {
    let (_pdf_dir, pdf_path) = common::write_blank_pdf(1);
    let repository = Arc::new(TestRepository::new());
    let book = Book {
        id: "book1".to_string(),
        title: "Sample".to_string(),
        author: None,
        category: Category::Misc,
        source_path: pdf_path.to_string_lossy().to_string(),
        page_count: 1,
        status: BookStatus::Parsed,
        structure: None,
    };
    repository.put(book).await.unwrap();

    let llm = Arc::new(CountingLlmClient::new());
    let digitization_client = Arc::new(FixedDigitizationClient { response: fixed_response(1) });
    let cache_dir = tempfile::tempdir().unwrap();
    let cache = Arc::new(CacheStore::new(cache_dir.path()));
    let orchestrator = ExtractionOrchestrator::new(llm, digitization_client, cache, repository, PipelineConfig::default());

    let result = orchestrator.extract_pages("book1").await;
    assert!(result.is_err());
}
