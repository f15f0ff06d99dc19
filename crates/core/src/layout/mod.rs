//! # Layout Normalizer
//!
//! A deterministic, pure transformation from raw digitization elements to a
//! page-indexed normalized stream: HTML is stripped to plain text, font
//! size recovered from inline style, bounding boxes computed from polygon
//! points, and two-up physical pages split at the normalized horizontal
//! centerline into logical pages in reading order.

use crate::digitize::{DigitizationResponse, RawElement};
use crate::types::{BBox, Element, ElementCategory, NormalizedPage, Side};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;
use std::collections::BTreeMap;

const CENTERLINE: f64 = 0.5;

static FONT_SIZE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"font-size:\s*(\d+)px").unwrap());
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

fn strip_html(fragment: &str) -> String {
    let parsed = Html::parse_fragment(fragment);
    let text: String = parsed.root_element().text().collect::<Vec<_>>().join(" ");
    WHITESPACE_RE.replace_all(text.trim(), " ").to_string()
}

fn recover_font_size(style: &Option<String>) -> u32 {
    style
        .as_deref()
        .and_then(|s| FONT_SIZE_RE.captures(s))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .unwrap_or(12)
}

fn category_from_str(raw: &str) -> ElementCategory {
    match raw.to_ascii_lowercase().as_str() {
        "footer" => ElementCategory::Footer,
        "heading" => ElementCategory::Heading,
        "title" => ElementCategory::Title,
        "paragraph" => ElementCategory::Paragraph,
        _ => ElementCategory::Other,
    }
}

fn to_normalized_element(raw: &RawElement) -> Element {
    Element {
        id: raw.id.clone(),
        category: category_from_str(&raw.category),
        text: strip_html(&raw.text_html),
        font_size: recover_font_size(&raw.style),
        bbox: BBox::from_points(&raw.points),
        page: raw.page,
    }
}

fn reading_order(a: &Element, b: &Element) -> std::cmp::Ordering {
    a.bbox
        .y0
        .partial_cmp(&b.bbox.y0)
        .unwrap_or(std::cmp::Ordering::Equal)
        .then_with(|| a.bbox.x0.partial_cmp(&b.bbox.x0).unwrap_or(std::cmp::Ordering::Equal))
}

fn raw_text_of(elements: &[Element]) -> String {
    elements
        .iter()
        .map(|e| e.text.as_str())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Converts a digitization response into the page-indexed normalized
/// stream, splitting every two-up physical page into its left and right
/// logical pages.
pub fn normalize(response: &DigitizationResponse) -> Vec<NormalizedPage> {
    let mut by_physical_page: BTreeMap<u32, Vec<Element>> = BTreeMap::new();
    for raw in &response.elements {
        by_physical_page
            .entry(raw.page)
            .or_default()
            .push(to_normalized_element(raw));
    }

    let mut logical_pages = Vec::new();
    let mut next_page_number = 1u32;

    for (physical_page, elements) in by_physical_page {
        let (mut left, mut right): (Vec<Element>, Vec<Element>) =
            elements.into_iter().partition(|e| e.bbox.x0 < CENTERLINE);

        left.sort_by(reading_order);
        right.sort_by(reading_order);

        if right.is_empty() {
            logical_pages.push(build_page(next_page_number, physical_page, Side::Single, left));
            next_page_number += 1;
        } else if left.is_empty() {
            logical_pages.push(build_page(next_page_number, physical_page, Side::Single, right));
            next_page_number += 1;
        } else {
            logical_pages.push(build_page(next_page_number, physical_page, Side::Left, left));
            next_page_number += 1;
            logical_pages.push(build_page(next_page_number, physical_page, Side::Right, right));
            next_page_number += 1;
        }
    }

    logical_pages
}

fn build_page(page_number: u32, original_page: u32, side: Side, elements: Vec<Element>) -> NormalizedPage {
    NormalizedPage {
        page_number,
        original_page,
        side,
        raw_text: raw_text_of(&elements),
        elements,
    }
}

/// The view the structure analyzer and extractors consume: identical
/// content, but each element's `page` field is rewritten to the logical
/// page number so downstream code never has to reason about the pre-split
/// physical numbering.
pub fn clean(pages: &[NormalizedPage]) -> Vec<NormalizedPage> {
    pages
        .iter()
        .cloned()
        .map(|mut page| {
            for element in page.elements.iter_mut() {
                element.page = page.page_number;
            }
            page
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digitize::{DigitizationMetadata, Usage};

    fn element_at(id: &str, x0: f64) -> RawElement {
        RawElement {
            id: id.to_string(),
            category: "paragraph".to_string(),
            text_html: format!("<p>{id}</p>"),
            style: None,
            points: vec![(x0, 0.3), (x0 + 0.05, 0.3), (x0 + 0.05, 0.35), (x0, 0.35)],
            page: 1,
        }
    }

    fn response_with(elements: Vec<RawElement>) -> DigitizationResponse {
        DigitizationResponse {
            elements,
            usage: Usage { pages: 1 },
            model: "m".to_string(),
            api_version: "v1".to_string(),
            metadata: DigitizationMetadata::default(),
        }
    }

    #[test]
    fn two_up_page_splits_into_two_logical_pages() {
        // S2: centers [0.12, 0.18, 0.55, 0.60] -> two logical pages of 2 each.
        let response = response_with(vec![
            element_at("a", 0.12),
            element_at("b", 0.18),
            element_at("c", 0.55),
            element_at("d", 0.60),
        ]);
        let pages = normalize(&response);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].side, Side::Left);
        assert_eq!(pages[0].elements.len(), 2);
        assert_eq!(pages[1].side, Side::Right);
        assert_eq!(pages[1].elements.len(), 2);
    }

    #[test]
    fn single_sided_page_produces_exactly_one_logical_page() {
        // S2: centers [0.10, 0.20, 0.30] -> one logical page with all three.
        let response = response_with(vec![
            element_at("a", 0.10),
            element_at("b", 0.20),
            element_at("c", 0.30),
        ]);
        let pages = normalize(&response);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].side, Side::Single);
        assert_eq!(pages[0].elements.len(), 3);
    }

    #[test]
    fn split_partitions_elements_without_loss_or_duplication() {
        let mut elements = Vec::new();
        for i in 0..20 {
            let x0 = if i % 2 == 0 { 0.1 } else { 0.7 };
            elements.push(element_at(&format!("e{i}"), x0));
        }
        let response = response_with(elements);
        let pages = normalize(&response);
        let total: usize = pages.iter().map(|p| p.elements.len()).sum();
        assert_eq!(total, 20);
        let mut ids: Vec<&str> = pages.iter().flat_map(|p| p.elements.iter().map(|e| e.id.as_str())).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 20);
    }

    #[test]
    fn font_size_is_recovered_from_inline_style_or_defaults() {
        assert_eq!(recover_font_size(&Some("font-size:14px".to_string())), 14);
        assert_eq!(recover_font_size(&None), 12);
        assert_eq!(recover_font_size(&Some("color:red".to_string())), 12);
    }

    #[test]
    fn clean_view_rewrites_element_page_to_logical_number() {
        let response = response_with(vec![element_at("a", 0.12), element_at("b", 0.55)]);
        let pages = normalize(&response);
        let cleaned = clean(&pages);
        for page in &cleaned {
            for element in &page.elements {
                assert_eq!(element.page, page.page_number);
            }
        }
    }
}
