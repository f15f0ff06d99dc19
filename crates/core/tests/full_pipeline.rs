//! Drives a small book end to end through every stage of the orchestrator
//! against in-memory stand-ins, the way the teacher's own `pdf_ingest_test`
//! drives its ingestor against a `MockAiProvider` rather than real services.

mod common;

use common::{CountingLlmClient, FixedDigitizationClient, TestRepository};
use folio_core::cache::CacheStore;
use folio_core::config::PipelineConfig;
use folio_core::digitize::{DigitizationMetadata, DigitizationResponse, RawElement, Usage};
use folio_core::orchestrate::ExtractionOrchestrator;
use folio_core::types::{BookStatus, Category, Structure};
use std::sync::Arc;

fn fixed_response(pages: u32) -> DigitizationResponse {
    let elements = (1..=pages)
        .map(|p| RawElement {
            id: format!("e{p}"),
            category: "paragraph".to_string(),
            text_html: format!("<p>Page {p} says something worth summarizing.</p>"),
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
async fn a_book_advances_from_upload_through_a_written_report() {
    let (_pdf_dir, pdf_path) = common::write_blank_pdf(4);
    let repository = Arc::new(TestRepository::new());
    let llm = Arc::new(CountingLlmClient::new());
    let digitization_client = Arc::new(FixedDigitizationClient { response: fixed_response(4) });
    let cache_dir = tempfile::tempdir().unwrap();
    let cache = Arc::new(CacheStore::new(cache_dir.path()));
    let reports_dir = tempfile::tempdir().unwrap();
    let mut config = PipelineConfig::default();
    config.reports_root = reports_dir.path().to_string_lossy().to_string();
    config.chapter_skip_threshold_pages = 1;

    let orchestrator =
        ExtractionOrchestrator::new(llm.clone(), digitization_client, cache, repository.clone(), config);

    let book = orchestrator
        .ingest(&pdf_path.to_string_lossy(), "Sample Book".to_string(), None, Category::Misc)
        .await
        .unwrap();
    assert_eq!(book.status, BookStatus::Parsed);
    assert_eq!(book.page_count, 4);

    let structure = Structure {
        main_start_page: 1,
        main_end_page: 4,
        chapters: vec![folio_core::types::Chapter {
            order_index: 0,
            title: "Whole Book".to_string(),
            start_page: 1,
            end_page: 4,
        }],
    };
    let book = orchestrator.apply_structure(&book.id, structure).await.unwrap();
    assert_eq!(book.status, BookStatus::Structured);

    let page_progress = orchestrator.extract_pages(&book.id).await.unwrap();
    assert_eq!(page_progress.completed, 4);
    assert_eq!(page_progress.failed, 0);

    let chapter_progress = orchestrator.extract_chapters(&book.id).await.unwrap();
    assert_eq!(chapter_progress.completed, 1);
    assert_eq!(chapter_progress.skipped, 0);

    let report = orchestrator.write_report(&book.id).await.unwrap();
    assert_eq!(report.metadata.chapter_count, 1);
    assert_eq!(report.chapter_entries.len(), 1);
    assert_eq!(report.statistics.total_pages, 4);
    assert_eq!(report.entity_synthesis.insights.len(), 1);
    assert_eq!(report.entity_synthesis.domain_groups.get("topics").map(Vec::len), Some(1));

    let published = std::fs::read_to_string(reports_dir.path().join("Sample_Book.json")).unwrap();
    assert!(published.contains("\"chapter_entries\""));
}
