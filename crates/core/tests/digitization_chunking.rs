//! End-to-end chunked digitization: a real multi-page PDF is windowed and
//! merged back into one logical response, exercising the same path as the
//! `237`-page scenario, just over a small real file.

mod common;

use common::StubDigitizationClient;
use folio_core::cache::CacheStore;
use folio_core::digitize::DigitizationController;
use folio_core::retry::RetryPolicy;

#[tokio::test]
async fn oversize_book_is_split_into_windows_and_merged_transparently() {
    let (_pdf_dir, pdf_path) = common::write_blank_pdf(7);
    let cache_dir = tempfile::tempdir().unwrap();
    let cache = CacheStore::new(cache_dir.path());
    let client = StubDigitizationClient::new();
    let controller = DigitizationController::new(&client, &cache, RetryPolicy::new(3), 3);

    let response = controller.digitize(&pdf_path).await.unwrap();

    assert_eq!(client.call_count(), 3, "7 pages at cap 3 should split into 3 windows");
    assert_eq!(response.usage.pages, 7);
    assert!(response.metadata.split_parsing);
    assert_eq!(response.metadata.total_chunks, 3);

    let mut pages: Vec<u32> = response.elements.iter().map(|e| e.page).collect();
    pages.sort();
    assert_eq!(pages, vec![1, 4, 7], "each window's single element should rebase to its window's start page");

    let ids: std::collections::HashSet<&str> = response.elements.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids.len(), 3, "element ids must stay unique across merged chunks");
}

#[tokio::test]
async fn book_under_the_page_cap_is_a_single_request() {
    let (_pdf_dir, pdf_path) = common::write_blank_pdf(4);
    let cache_dir = tempfile::tempdir().unwrap();
    let cache = CacheStore::new(cache_dir.path());
    let client = StubDigitizationClient::new();
    let controller = DigitizationController::new(&client, &cache, RetryPolicy::new(3), 100);

    let response = controller.digitize(&pdf_path).await.unwrap();

    assert_eq!(client.call_count(), 1);
    assert!(!response.metadata.split_parsing);
}

#[tokio::test]
async fn digitize_result_is_cached_across_calls_for_the_same_file() {
    let (_pdf_dir, pdf_path) = common::write_blank_pdf(7);
    let cache_dir = tempfile::tempdir().unwrap();
    let cache = CacheStore::new(cache_dir.path());
    let client = StubDigitizationClient::new();
    let controller = DigitizationController::new(&client, &cache, RetryPolicy::new(3), 3);

    controller.digitize(&pdf_path).await.unwrap();
    let calls_after_first = client.call_count();
    controller.digitize(&pdf_path).await.unwrap();

    assert_eq!(client.call_count(), calls_after_first, "second call should hit the cache, not re-dispatch");
}
