//! Core data model shared by every stage of the pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The domain a book is classified under. Selects the structured-data schema
/// used for page and chapter extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    History,
    Economy,
    Humanities,
    Science,
    Misc,
}

impl Default for Category {
    fn default() -> Self {
        Category::Misc
    }
}

/// Status DAG a `Book` advances through. Mutated only by
/// `orchestrate::transition`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookStatus {
    Uploaded,
    Parsed,
    Structured,
    PageSummarized,
    Summarized,
    ErrorParsing,
    ErrorStructuring,
    ErrorSummarizing,
    Failed,
}

/// A book record. Owns its `Structure`, `PageArtifact`s, `ChapterArtifact`s
/// and `BookReport`; deletion cascades to all four (`folio_store`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    pub id: String,
    pub title: String,
    pub author: Option<String>,
    pub category: Category,
    pub source_path: String,
    pub page_count: u32,
    pub status: BookStatus,
    pub structure: Option<Structure>,
}

/// Which half of a two-up physical page a logical page came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
    Single,
}

/// An axis-aligned bounding box in normalized `[0,1]^2` page space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl BBox {
    /// Clamps coordinates into `[0,1]`. The digitization service is an
    /// untrusted boundary; out-of-range coordinates are clamped rather than
    /// rejected.
    pub fn clamped(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        let clamp = |v: f64| v.clamp(0.0, 1.0);
        let (x0, x1) = (clamp(x0.min(x1)), clamp(x0.max(x1)));
        let (y0, y1) = (clamp(y0.min(y1)), clamp(y0.max(y1)));
        debug_assert!((0.0..=1.0).contains(&x0) && (0.0..=1.0).contains(&x1));
        BBox { x0, y0, x1, y1 }
    }

    /// Axis-aligned minimum bounding rectangle over a set of points.
    pub fn from_points(points: &[(f64, f64)]) -> Self {
        if points.is_empty() {
            return BBox::clamped(0.0, 0.0, 0.0, 0.0);
        }
        let mut min_x = f64::MAX;
        let mut max_x = f64::MIN;
        let mut min_y = f64::MAX;
        let mut max_y = f64::MIN;
        for &(x, y) in points {
            min_x = min_x.min(x);
            max_x = max_x.max(x);
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }
        BBox::clamped(min_x, min_y, max_x, max_y)
    }
}

/// The kind of content an `Element` carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementCategory {
    Paragraph,
    Heading,
    Footer,
    Title,
    Other,
}

/// A single piece of recognized layout, as emitted by the digitization
/// service and normalized by the layout normalizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Element {
    pub id: String,
    pub category: ElementCategory,
    pub text: String,
    pub font_size: u32,
    pub bbox: BBox,
    /// The physical (pre-split) page this element was reported on.
    pub page: u32,
}

/// One logical page after two-up splitting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedPage {
    pub page_number: u32,
    pub original_page: u32,
    pub side: Side,
    pub elements: Vec<Element>,
    pub raw_text: String,
}

/// A single recovered chapter span.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chapter {
    pub order_index: u32,
    pub title: String,
    pub start_page: u32,
    pub end_page: u32,
}

/// The book-level structure produced by the structure analyzer, or supplied
/// by an operator via `apply_structure`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Structure {
    pub main_start_page: u32,
    pub main_end_page: u32,
    pub chapters: Vec<Chapter>,
}

/// The result of page-level extraction. Keyed by `content_hash` of the
/// page's raw text; never mutated once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageArtifact {
    pub book_id: String,
    pub page_number: u32,
    pub summary_text: String,
    pub structured_data: serde_json::Value,
    pub content_hash: String,
    pub language: String,
}

/// The result of chapter-level synthesis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapterArtifact {
    pub book_id: String,
    pub chapter_order_index: u32,
    pub summary_text: String,
    pub structured_data: serde_json::Value,
    pub content_hash: String,
}

/// Metadata section of a `BookReport`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub book_id: String,
    pub title: String,
    pub author: Option<String>,
    pub category: Category,
    pub page_count: u32,
    pub chapter_count: usize,
    pub skipped_chapter_count: usize,
}

/// One chapter's pass-through entry in the final report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapterEntry {
    pub order_index: u32,
    pub title: String,
    pub start_page: u32,
    pub end_page: u32,
    pub page_count: u32,
    pub core_message: String,
    pub summary_3_5_sentences: String,
}

/// A single LLM-synthesized book summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookSummary {
    pub core_message: String,
    pub summary_3_5_sentences: String,
    pub main_themes: Vec<String>,
    pub argument_flow: String,
}

/// Common + domain-specific entity groups synthesized from the whole book.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EntitySynthesis {
    pub insights: Vec<String>,
    pub key_events: Vec<String>,
    pub key_examples: Vec<String>,
    pub key_persons: Vec<String>,
    pub key_concepts: Vec<String>,
    pub key_arguments: Vec<String>,
    #[serde(default)]
    pub domain_groups: HashMap<String, Vec<String>>,
}

/// Bare cardinalities over the book's artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportStatistics {
    pub total_pages: usize,
    pub total_chapters: usize,
    pub skipped_chapters: usize,
    pub reference_count: usize,
}

/// The terminal, whole-book artifact. Written once to a single JSON file
/// named after the book title; its presence is the completion signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookReport {
    pub metadata: ReportMetadata,
    pub book_summary: BookSummary,
    pub chapter_entries: Vec<ChapterEntry>,
    pub entity_synthesis: EntitySynthesis,
    /// Union of every page record's citations/references, de-duplicated.
    /// Computed directly from stored artifacts, no LLM call involved.
    pub references: Vec<String>,
    pub statistics: ReportStatistics,
}

/// Structured progress observable by an operator while a stage runs.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StageProgress {
    pub completed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub total: usize,
    pub elapsed_secs: f64,
    pub avg_secs_per_item: f64,
    pub estimated_remaining_secs: f64,
}

impl StageProgress {
    pub fn recompute_estimate(&mut self) {
        let done = self.completed + self.failed;
        self.avg_secs_per_item = if done > 0 {
            self.elapsed_secs / done as f64
        } else {
            0.0
        };
        let remaining = self.total.saturating_sub(done + self.skipped);
        self.estimated_remaining_secs = self.avg_secs_per_item * remaining as f64;
    }
}
