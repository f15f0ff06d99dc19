//! # Structure Analyzer
//!
//! Determines the body span and chapter partition from footers alone: the
//! design bet trades the reliability of body text (heterogeneous, possibly
//! multi-column) for the reliability of footers (position-constrained,
//! short, repeated across pages).

use crate::error::StructureError;
use crate::types::{Chapter, Element, NormalizedPage, Structure};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static CHAPTER_REGEXES: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"제\s*(\d+)\s*[장강부]").unwrap(),
        Regex::new(r"(?i)chapter\s*(\d+)").unwrap(),
        Regex::new(r"(?i)part\s*(\d+)").unwrap(),
        Regex::new(r"^(\d+)\s*[장강부]").unwrap(),
        Regex::new(r"^(\d+)\.\s*[가-힣]").unwrap(),
    ]
});

const FRONT_MATTER_KEYWORDS: &[&str] = &[
    "작가", "저자", "지은이", "추천", "서문", "머리말", "프롤로그", "들어가며", "차례", "목차",
    "author", "preface", "foreword", "prologue", "introduction", "contents", "dedication",
    "acknowledgment", "copyright",
];

/// Back-matter keywords, matched by naive case-insensitive substring
/// containment (not word-boundary aware). This can over-match — Korean
/// "자주" contains "주" — a known limitation preserved from the source
/// rather than silently fixed.
const BACK_MATTER_KEYWORDS: &[&str] = &[
    "맺음말", "에필로그", "참고문헌", "부록", "색인", "주", "미주", "각주", "epilogue",
    "conclusion", "references", "bibliography", "appendix", "index", "notes", "endnotes",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FooterTag {
    ChapterMarker,
    PageNumber,
    Other,
}

fn footer_set(page: &NormalizedPage) -> Vec<&Element> {
    let mut footers: Vec<&Element> = page
        .elements
        .iter()
        .filter(|e| matches!(e.category, crate::types::ElementCategory::Footer) || e.bbox.y0 > 0.9)
        .collect();
    footers.sort_by(|a, b| b.bbox.y0.partial_cmp(&a.bbox.y0).unwrap_or(std::cmp::Ordering::Equal));
    footers
}

fn classify_footer(element: &Element) -> (FooterTag, Option<u32>) {
    let text = element.text.trim();

    for re in CHAPTER_REGEXES.iter() {
        if let Some(caps) = re.captures(text) {
            let number = caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok());
            return (FooterTag::ChapterMarker, number);
        }
    }

    if element.bbox.x0 < 0.05 {
        if let Ok(n) = text.parse::<u32>() {
            if (1..=3).contains(&text.len()) && (1..=1000).contains(&n) {
                return (FooterTag::PageNumber, None);
            }
        }
    }

    if element.bbox.x0 > 0.05 && element.bbox.x0 < 0.5 {
        let lower = text.to_lowercase();
        let korean_hit = ["제", "장", "강", "부"].iter().any(|k| text.contains(k));
        let latin_hit = ["chapter", "part"].iter().any(|k| lower.contains(k));
        if korean_hit || latin_hit {
            return (FooterTag::ChapterMarker, None);
        }
    }

    (FooterTag::Other, None)
}

fn detect_body_start(pages: &[NormalizedPage]) -> u32 {
    for page in pages.iter().filter(|p| p.page_number >= 3 && p.page_number % 2 == 1) {
        let footers = footer_set(page);
        let has_marker = footers
            .iter()
            .any(|e| classify_footer(e).0 == FooterTag::ChapterMarker);
        let has_front_keyword = FRONT_MATTER_KEYWORDS
            .iter()
            .any(|k| page.raw_text.to_lowercase().contains(&k.to_lowercase()));
        if has_marker && !has_front_keyword {
            return page.page_number;
        }
    }
    3
}

fn detect_back_matter_start(pages: &[NormalizedPage], body_start: u32) -> Option<u32> {
    let total = pages.len() as u32;
    let scan_start = body_start.max((total as f64 * 0.5).floor() as u32);
    for page in pages
        .iter()
        .filter(|p| p.page_number >= scan_start && p.page_number % 2 == 1)
    {
        let footers = footer_set(page);
        let concatenated = footers
            .iter()
            .map(|e| e.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        if BACK_MATTER_KEYWORDS.iter().any(|k| concatenated.contains(&k.to_lowercase())) {
            return Some(page.page_number);
        }
    }
    None
}

/// Collects all chapter numbers and finds the longest strictly increasing
/// run of consecutive integers starting at some minimum; any page whose
/// extracted number falls outside that run is reset to `None`. Suppresses
/// isolated false positives (e.g. a footer reading "100") amidst an
/// otherwise clean `1..k` sequence.
fn continuity_filter(raw: &[Option<u32>]) -> Vec<Option<u32>> {
    let mut first_pos: HashMap<u32, usize> = HashMap::new();
    for (idx, num) in raw.iter().enumerate() {
        if let Some(n) = num {
            first_pos.entry(*n).or_insert(idx);
        }
    }
    if first_pos.is_empty() {
        return vec![None; raw.len()];
    }

    let mut values: Vec<u32> = first_pos.keys().copied().collect();
    values.sort_unstable();

    let mut chain_len: HashMap<u32, u32> = HashMap::new();
    let mut best_value = values[0];
    let mut best_len = 1u32;
    for &v in &values {
        let len = if v > 0 {
            match first_pos.get(&(v - 1)) {
                Some(&prev_pos) if prev_pos < first_pos[&v] => {
                    chain_len.get(&(v - 1)).copied().unwrap_or(1) + 1
                }
                _ => 1,
            }
        } else {
            1
        };
        chain_len.insert(v, len);
        if len > best_len {
            best_len = len;
            best_value = v;
        }
    }

    let run_start = best_value + 1 - best_len;
    let run_end = best_value;
    raw.iter()
        .map(|opt| opt.filter(|&n| n >= run_start && n <= run_end))
        .collect()
}

fn title_for(pages_by_number: &HashMap<u32, &NormalizedPage>, start_page: u32, chapter_number: u32) -> String {
    if let Some(page) = pages_by_number.get(&start_page) {
        let explicit = page.elements.iter().find(|e| {
            matches!(
                e.category,
                crate::types::ElementCategory::Title | crate::types::ElementCategory::Heading
            ) && !e.text.trim().is_empty()
        });
        if let Some(element) = explicit {
            return element.text.trim().to_string();
        }
    }
    format!("제{chapter_number}장")
}

struct RawBoundary {
    number: u32,
    start_idx: usize,
}

fn extract_chapters(pages: &[NormalizedPage], body_start: u32, body_end: u32) -> Vec<Chapter> {
    let odd_pages: Vec<&NormalizedPage> = pages
        .iter()
        .filter(|p| p.page_number >= body_start && p.page_number <= body_end && p.page_number % 2 == 1)
        .collect();
    if odd_pages.is_empty() {
        return Vec::new();
    }

    let raw_numbers: Vec<Option<u32>> = odd_pages
        .iter()
        .map(|page| {
            footer_set(page).iter().find_map(|e| {
                let (tag, number) = classify_footer(e);
                (tag == FooterTag::ChapterMarker).then_some(number).flatten()
            })
        })
        .collect();

    let filtered_numbers = continuity_filter(&raw_numbers);

    let mut boundaries = Vec::new();
    let mut last_num: Option<u32> = None;
    for (idx, num) in filtered_numbers.iter().enumerate() {
        if let Some(n) = num {
            if last_num != Some(*n) {
                boundaries.push(RawBoundary {
                    number: *n,
                    start_idx: idx,
                });
                last_num = Some(*n);
            }
        }
    }

    let pages_by_number: HashMap<u32, &NormalizedPage> = pages.iter().map(|p| (p.page_number, p)).collect();

    boundaries
        .iter()
        .enumerate()
        .map(|(i, boundary)| {
            let start_page = odd_pages[boundary.start_idx].page_number;
            let is_last = i + 1 == boundaries.len();
            let end_page = if is_last {
                body_end
            } else {
                let next_start_idx = boundaries[i + 1].start_idx;
                let raw_end_page = odd_pages[next_start_idx - 1].page_number;
                (raw_end_page + 1).min(body_end)
            };
            Chapter {
                order_index: i as u32,
                title: title_for(&pages_by_number, start_page, boundary.number),
                start_page,
                end_page,
            }
        })
        .collect()
}

/// Runs the full two-detector pipeline over a normalized page stream.
/// Returns an empty chapter list (never an error) if fewer than one
/// chapter can be recovered — the orchestrator treats that as recoverable
/// and lets the operator supply a structure via `apply_structure`.
pub fn analyze(pages: &[NormalizedPage]) -> Result<Structure, StructureError> {
    if pages.is_empty() {
        return Err(StructureError::EmptyInput);
    }

    let body_start = detect_body_start(pages);
    let body_end = match detect_back_matter_start(pages, body_start) {
        Some(back_start) => back_start.saturating_sub(1),
        None => pages.last().map(|p| p.page_number).unwrap_or(body_start),
    };

    let chapters = extract_chapters(pages, body_start, body_end);

    Ok(Structure {
        main_start_page: body_start,
        main_end_page: body_end,
        chapters,
    })
}
