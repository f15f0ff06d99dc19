//! Shared fixtures for integration tests: a real multi-page PDF built with
//! `printpdf` (the same API the teacher's `test-utils::helpers::generate_test_pdf`
//! uses), plus in-memory stand-ins for the LLM and digitization clients.

use async_trait::async_trait;
use folio_core::digitize::{DigitizationClient, DigitizationMetadata, DigitizationResponse, RawElement, Usage};
use folio_core::error::{DigitizeError, LlmError};
use folio_core::repository::{BookRepository, RepositoryError};
use folio_core::retry::Classification;
use folio_core::types::{Book, ChapterArtifact, PageArtifact};
use printpdf::{BuiltinFont, Layer, Mm, Op, ParsedFont, PdfDocument, PdfPage, PdfSaveOptions, Pt, TextItem, TextMatrix, TextRenderingMode};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Writes a real `pages`-page PDF to a fresh temp file, one line of unique
/// text per page, and returns the guard plus its path.
pub fn write_blank_pdf(pages: u32) -> (tempfile::TempDir, PathBuf) {
    let mut doc = PdfDocument::new("Integration Fixture");
    let font_bytes = BuiltinFont::Helvetica.get_subset_font().bytes;
    let font = ParsedFont::from_bytes(&font_bytes, 0, &mut Vec::new()).expect("parse built-in font");
    let font_id = doc.add_font(&font);

    for n in 1..=pages {
        let mut page = PdfPage::new(Mm(210.0), Mm(297.0), vec![]);
        let layer_def = Layer::new(format!("page-{n}"));
        let layer_id = doc.add_layer(&layer_def);
        page.ops = vec![
            Op::BeginLayer { layer_id: layer_id.clone() },
            Op::SetFontSize { size: Pt(12.0), font: font_id.clone() },
            Op::StartTextSection,
            Op::SetTextMatrix {
                matrix: TextMatrix::Translate(Mm(10.0).into(), Mm(280.0).into()),
            },
            Op::SetTextRenderingMode { mode: TextRenderingMode::Fill },
            Op::WriteText {
                items: vec![TextItem::Text(format!("page {n}"))],
                font: font_id.clone(),
            },
            Op::EndTextSection,
            Op::EndLayer { layer_id },
        ];
        doc.pages.push(page);
    }

    let mut warnings = Vec::new();
    let bytes = doc.save(&PdfSaveOptions::default(), &mut warnings);

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("fixture.pdf");
    std::fs::write(&path, bytes).expect("write fixture pdf");
    (dir, path)
}

/// A `DigitizationClient` that ignores the request body (it can't see which
/// page window a chunk request carries — that's baked into the temp PDF a
/// real client would read) and hands back one element per call, labeled by
/// call count so a merged, multi-chunk response is distinguishable from a
/// single-chunk one.
#[derive(Debug, Clone, Default)]
pub struct StubDigitizationClient {
    pub calls: Arc<AtomicUsize>,
}

impl StubDigitizationClient {
    pub fn new() -> Self {
        StubDigitizationClient::default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DigitizationClient for StubDigitizationClient {
    async fn digitize_chunk(&self, _path: &std::path::Path) -> Result<DigitizationResponse, (Classification, DigitizeError)> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let elements = vec![RawElement {
            id: "e0".to_string(),
            category: "paragraph".to_string(),
            text_html: format!("<p>chunk {call}</p>"),
            style: None,
            points: vec![(0.1, 0.1), (0.4, 0.1), (0.4, 0.2), (0.1, 0.2)],
            page: 1,
        }];
        Ok(DigitizationResponse {
            elements,
            usage: Usage { pages: 1 },
            model: "stub".to_string(),
            api_version: "v1".to_string(),
            metadata: DigitizationMetadata::default(),
        })
    }
}

/// A `DigitizationClient` that always returns the full fixed set of
/// elements for the whole book in one response, for tests that don't care
/// about chunking.
#[derive(Debug, Clone)]
pub struct FixedDigitizationClient {
    pub response: DigitizationResponse,
}

#[async_trait]
impl DigitizationClient for FixedDigitizationClient {
    async fn digitize_chunk(&self, _path: &std::path::Path) -> Result<DigitizationResponse, (Classification, DigitizeError)> {
        Ok(self.response.clone())
    }
}

/// An `LlmClient` stub that counts calls and always returns a canned,
/// schema-valid response for the `Misc` domain.
#[derive(Debug, Clone)]
pub struct CountingLlmClient {
    pub calls: Arc<AtomicUsize>,
}

impl CountingLlmClient {
    pub fn new() -> Self {
        CountingLlmClient {
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl folio_core::llm::LlmClient for CountingLlmClient {
    async fn complete(&self, system_prompt: &str, _user_prompt: &str) -> Result<String, (Classification, LlmError)> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if system_prompt.contains("items (array of strings)") {
            return Ok(serde_json::json!({"items": [format!("item {n}")]}).to_string());
        }
        Ok(serde_json::json!({
            "summary": format!("summary {n}"),
            "function_tag": "narrative",
            "entities": [],
            "topics": [],
            "core_message": format!("core message {n}"),
            "summary_3_5_sentences": format!("chapter summary {n}"),
            "highlights": [],
            "main_themes": [],
            "argument_flow": "",
        })
        .to_string())
    }
}

/// A minimal in-memory `BookRepository`, local to the test binary so these
/// tests don't need a dependency from `folio-core` onto `folio-store`.
#[derive(Debug, Default)]
pub struct TestRepository {
    books: Mutex<HashMap<String, Book>>,
    pages: Mutex<HashMap<String, Vec<PageArtifact>>>,
    chapters: Mutex<HashMap<String, Vec<ChapterArtifact>>>,
}

impl TestRepository {
    pub fn new() -> Self {
        TestRepository::default()
    }
}

#[async_trait]
impl BookRepository for TestRepository {
    async fn get(&self, book_id: &str) -> Result<Option<Book>, RepositoryError> {
        Ok(self.books.lock().await.get(book_id).cloned())
    }

    async fn put(&self, book: Book) -> Result<(), RepositoryError> {
        self.books.lock().await.insert(book.id.clone(), book);
        Ok(())
    }

    async fn delete(&self, book_id: &str) -> Result<(), RepositoryError> {
        self.books.lock().await.remove(book_id);
        self.pages.lock().await.remove(book_id);
        self.chapters.lock().await.remove(book_id);
        Ok(())
    }

    async fn put_page_artifacts(&self, book_id: &str, artifacts: Vec<PageArtifact>) -> Result<(), RepositoryError> {
        let mut pages = self.pages.lock().await;
        let existing = pages.entry(book_id.to_string()).or_default();
        for artifact in artifacts {
            if let Some(slot) = existing.iter_mut().find(|a| a.page_number == artifact.page_number) {
                *slot = artifact;
            } else {
                existing.push(artifact);
            }
        }
        Ok(())
    }

    async fn list_page_artifacts(&self, book_id: &str) -> Result<Vec<PageArtifact>, RepositoryError> {
        Ok(self.pages.lock().await.get(book_id).cloned().unwrap_or_default())
    }

    async fn put_chapter_artifact(&self, artifact: ChapterArtifact) -> Result<(), RepositoryError> {
        let mut chapters = self.chapters.lock().await;
        let existing = chapters.entry(artifact.book_id.clone()).or_default();
        if let Some(slot) = existing.iter_mut().find(|a| a.chapter_order_index == artifact.chapter_order_index) {
            *slot = artifact;
        } else {
            existing.push(artifact);
        }
        Ok(())
    }

    async fn list_chapter_artifacts(&self, book_id: &str) -> Result<Vec<ChapterArtifact>, RepositoryError> {
        Ok(self.chapters.lock().await.get(book_id).cloned().unwrap_or_default())
    }
}
