//! Heading extraction: body-size-relative filtering, line-height sanity
//! checks, and document-wide case-insensitive deduplication.

use std::collections::HashSet;

use crate::types::{BBox, HeadingLevel, OutlineEntry, PageText};

use super::normalize::{normalize_line, visible_span_sizes};
use super::stats::round_size;

/// A line must be at least this much larger than body text to be considered
/// heading-sized.
pub const HEADING_SIZE_FACTOR: f32 = 1.15;

/// Minimum ratio of glyph size to line-box height. Lines whose box is
/// disproportionately tall relative to the type are usually misdetected or
/// garbled regions.
pub const GLYPH_HEIGHT_RATIO: f32 = 0.7;

/// Minimum normalized length for a heading, in characters.
const MIN_HEADING_CHARS: usize = 3;

/// Texts that are never headings, compared lowercased.
const HEADING_STOPLIST: &[&str] = &["page", "of", "the", "and", "or", "copyright", "\u{00A9}"];

/// A retained heading line. `level` is attached later by the level
/// clusterer and the struct is immutable afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Heading {
    pub text: String,
    /// Average span size rounded to one decimal place; the clustering key.
    pub size: f32,
    /// 0-based page index.
    pub page: usize,
    pub bbox: BBox,
    pub level: Option<HeadingLevel>,
}

impl Heading {
    /// Project to the public outline entry, dropping the bounding box.
    pub fn into_entry(self) -> OutlineEntry {
        OutlineEntry {
            level: self.level.unwrap_or(HeadingLevel::H1),
            text: self.text,
            page: self.page,
        }
    }
}

/// Scan every page for heading-like lines.
///
/// The seen-set is scoped to this call: each document gets its own, so
/// per-document invocations stay independent. Note the reservation quirk:
/// a text that passes the lexical filters claims its seen-set slot *before*
/// the size and geometry checks run, so a first occurrence that is then
/// dropped still shadows every later occurrence of the same text.
pub fn extract_headings(pages: &[PageText], body_size: f32) -> Vec<Heading> {
    let mut headings: Vec<Heading> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for page in pages {
        for line in &page.lines {
            let Some(text) = normalize_line(line) else {
                continue;
            };

            if text.chars().count() < MIN_HEADING_CHARS
                || text.chars().all(char::is_numeric)
                || HEADING_STOPLIST.contains(&text.to_lowercase().as_str())
            {
                continue;
            }

            if !seen.insert(text.to_lowercase()) {
                continue;
            }

            let sizes = visible_span_sizes(line);
            if sizes.is_empty() {
                continue;
            }
            let max_size = sizes.iter().copied().fold(0.0, f32::max);
            let avg_size = sizes.iter().sum::<f32>() / sizes.len() as f32;

            if max_size < body_size * HEADING_SIZE_FACTOR {
                continue;
            }

            let line_height = line.bbox.height();
            if line_height > 0.0 && max_size / line_height < GLYPH_HEIGHT_RATIO {
                continue;
            }

            headings.push(Heading {
                text,
                size: round_size(avg_size),
                page: page.index,
                bbox: line.bbox,
                level: None,
            });
        }
    }

    headings
}
