//! Document-wide font statistics: the "body text" size baseline.

use std::collections::HashMap;

use crate::types::PageText;

/// Baseline used when a document contains no text spans at all.
pub const DEFAULT_BODY_SIZE: f32 = 12.0;

/// Round a font size to one decimal place.
///
/// This is the bucketing granularity used everywhere sizes are compared:
/// near-identical rendered sizes must land in the same bucket or level
/// clustering fragments on documents with many almost-equal sizes.
pub fn round_size(size: f32) -> f32 {
    (size * 10.0).round() / 10.0
}

/// Integer bucket key for a font size (tenths of a point).
pub(crate) fn size_key(size: f32) -> i32 {
    (size * 10.0).round() as i32
}

/// Estimate the body font size: the most frequent rounded span size across
/// the whole document.
///
/// Frequency ties resolve to the largest tied size, so the result is stable
/// across calls (the map's iteration order is not). A document with no
/// spans falls back to [`DEFAULT_BODY_SIZE`].
pub fn body_font_size(pages: &[PageText]) -> f32 {
    let mut counts: HashMap<i32, usize> = HashMap::new();

    for page in pages {
        for line in &page.lines {
            for span in &line.spans {
                *counts.entry(size_key(span.size)).or_insert(0) += 1;
            }
        }
    }

    counts
        .into_iter()
        .max_by_key(|&(key, count)| (count, key))
        .map(|(key, _)| key as f32 / 10.0)
        .unwrap_or(DEFAULT_BODY_SIZE)
}
