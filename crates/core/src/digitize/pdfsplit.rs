//! PDF page-count probing and page-window extraction.
//!
//! Page-count probing mirrors the teacher's own `pdf::file::FileOptions`
//! read in `ingest/pdf.rs`. The teacher's `pdf` crate is read-only, so
//! window extraction (deleting every page outside the requested range and
//! saving the remainder to a temp file) uses `lopdf`, the crate the wider
//! corpus reaches for whenever PDF *writing* is needed.

use lopdf::Document as LopdfDocument;
use pdf::file::FileOptions;
use std::path::Path;
use tempfile::NamedTempFile;

/// Reads the page count of the PDF at `path`. Runs on a blocking thread
/// since PDF structure parsing is CPU-bound, matching the teacher's
/// `spawn_blocking` usage for the same crate.
pub async fn probe_page_count(path: &Path) -> Result<u32, String> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || -> Result<u32, String> {
        let file = FileOptions::cached()
            .open(&path)
            .map_err(|e| format!("failed to open PDF for page-count probing: {e}"))?;
        Ok(file.num_pages())
    })
    .await
    .map_err(|e| format!("page-count probe task panicked: {e}"))?
}

/// Writes a contiguous window `[start_page, end_page]` (1-based, inclusive)
/// of `path` to a fresh temporary PDF file and returns it.
pub fn extract_page_window(
    path: &Path,
    start_page: u32,
    end_page: u32,
) -> Result<NamedTempFile, String> {
    let mut doc =
        LopdfDocument::load(path).map_err(|e| format!("failed to load PDF for splitting: {e}"))?;

    let pages = doc.get_pages();
    let to_delete: Vec<u32> = pages
        .keys()
        .copied()
        .filter(|&page_num| page_num < start_page || page_num > end_page)
        .collect();
    doc.delete_pages(&to_delete);

    let tmp = NamedTempFile::new().map_err(|e| format!("failed to create temp file: {e}"))?;
    doc.save(tmp.path())
        .map_err(|e| format!("failed to save split PDF window: {e}"))?;
    Ok(tmp)
}

/// Splits `total_pages` into contiguous, 1-based windows no larger than
/// `cap`.
pub fn window_ranges(total_pages: u32, cap: u32) -> Vec<(u32, u32)> {
    if cap == 0 || total_pages == 0 {
        return Vec::new();
    }
    let mut ranges = Vec::new();
    let mut start = 1;
    while start <= total_pages {
        let end = (start + cap - 1).min(total_pages);
        ranges.push((start, end));
        start = end + 1;
    }
    ranges
}
