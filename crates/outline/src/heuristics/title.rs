//! Title extraction: score first-page lines against the body size and page
//! geometry, then merge the top-scoring band into one title string.

use crate::types::PageText;

use super::normalize::{normalize_line, visible_span_sizes};

/// A line must be at least this much larger than body text to be a title
/// candidate.
pub const TITLE_SIZE_FACTOR: f32 = 1.2;

/// Minimum normalized length for a title candidate, in characters.
const MIN_TITLE_CHARS: usize = 5;

/// A line is "centered" when its horizontal center lies within this fraction
/// of the page width from the page center.
const CENTER_TOLERANCE_RATIO: f32 = 0.15;

/// Top fraction of the page that earns the early-position bonus.
const TOP_REGION_RATIO: f32 = 0.3;

/// Score bonus for centered lines.
const CENTERED_BONUS: f32 = 2.0;

/// Score bonus for lines near the top of the page.
const TOP_BONUS: f32 = 1.0;

/// Candidates within this score distance of the best one are merged into
/// the title.
const SCORE_BAND: f32 = 1.0;

/// Texts that are never titles, compared lowercased.
const TITLE_STOPLIST: &[&str] = &["page", "of", "copyright", "\u{00A9}"];

/// A scored first-page line, consumed immediately during selection.
#[derive(Debug, Clone)]
struct TitleCandidate {
    text: String,
    score: f32,
    y: f32,
}

/// Extract the document title from the first page.
///
/// Returns an empty string when no line survives the filters. Only the
/// first page is ever considered.
pub fn extract_title(page: &PageText, body_size: f32) -> String {
    let mut candidates: Vec<TitleCandidate> = Vec::new();

    for line in &page.lines {
        let Some(text) = normalize_line(line) else {
            continue;
        };

        let char_count = text.chars().count();
        if char_count < MIN_TITLE_CHARS || TITLE_STOPLIST.contains(&text.to_lowercase().as_str()) {
            continue;
        }

        let max_size = visible_span_sizes(line).into_iter().fold(0.0, f32::max);
        if max_size < body_size * TITLE_SIZE_FACTOR {
            continue;
        }

        let mut score = max_size;

        let is_centered =
            (line.bbox.center_x() - page.width / 2.0).abs() < page.width * CENTER_TOLERANCE_RATIO;
        if is_centered {
            score += CENTERED_BONUS;
        }
        if line.bbox.y0 < page.height * TOP_REGION_RATIO {
            score += TOP_BONUS;
        }

        candidates.push(TitleCandidate {
            text,
            score,
            y: line.bbox.y0,
        });
    }

    if candidates.is_empty() {
        return String::new();
    }

    // Highest score first; earlier on the page wins ties.
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.y.partial_cmp(&b.y).unwrap_or(std::cmp::Ordering::Equal))
    });

    let best = candidates[0].score;
    let mut parts: Vec<&str> = Vec::new();
    for candidate in &candidates {
        // The list is sorted, so the first candidate below the band ends
        // the contiguous prefix.
        if candidate.score >= best - SCORE_BAND {
            parts.push(&candidate.text);
        } else {
            break;
        }
    }

    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BBox, TextLine, TextSpan};

    const PAGE_W: f32 = 612.0;
    const PAGE_H: f32 = 792.0;

    /// A line of one span, horizontally centered when `centered` is set.
    fn line(text: &str, size: f32, y: f32, centered: bool) -> TextLine {
        let width = text.chars().count() as f32 * size * 0.5;
        let x0 = if centered {
            (PAGE_W - width) / 2.0
        } else {
            36.0
        };
        TextLine {
            spans: vec![TextSpan {
                text: text.to_string(),
                size,
            }],
            bbox: BBox {
                x0,
                y0: y,
                x1: x0 + width,
                y1: y + size,
            },
        }
    }

    fn page(lines: Vec<TextLine>) -> PageText {
        PageText {
            index: 0,
            width: PAGE_W,
            height: PAGE_H,
            lines,
        }
    }

    #[test]
    fn single_centered_candidate() {
        let p = page(vec![
            line("Annual Report 2024", 24.0, 80.0, true),
            line("Some body text on the cover page.", 10.0, 400.0, false),
        ]);
        assert_eq!(extract_title(&p, 10.0), "Annual Report 2024");
    }

    #[test]
    fn empty_page_yields_empty_title() {
        assert_eq!(extract_title(&page(vec![]), 12.0), "");
    }

    #[test]
    fn body_sized_text_is_never_a_title() {
        // 11pt over a 10pt body is below the 1.2x cut.
        let p = page(vec![line("Large Enough Words", 11.0, 80.0, true)]);
        assert_eq!(extract_title(&p, 10.0), "");
    }

    #[test]
    fn short_text_rejected() {
        let p = page(vec![line("Hi", 30.0, 80.0, true)]);
        assert_eq!(extract_title(&p, 10.0), "");
    }

    #[test]
    fn stoplist_rejected_any_case() {
        let p = page(vec![
            // Padded to pass the length check; "page" alone is stoplisted
            // but "Page" is shorter than five characters anyway.
            line("Copyright", 30.0, 80.0, true),
        ]);
        // "copyright" is in the stoplist.
        assert_eq!(extract_title(&p, 10.0), "");
    }

    #[test]
    fn close_scores_merge_in_rank_order() {
        // Both centered and in the top region: scores 24+3 and 23.5+3,
        // within the 1.0 band, so both join the title.
        let p = page(vec![
            line("Second Part", 23.5, 120.0, true),
            line("First Part", 24.0, 80.0, true),
        ]);
        assert_eq!(extract_title(&p, 10.0), "First Part Second Part");
    }

    #[test]
    fn distant_scores_excluded() {
        // 18pt subtitle is more than 1.0 below the 24pt title score.
        let p = page(vec![
            line("Main Document Title", 24.0, 80.0, true),
            line("A Modest Subtitle", 18.0, 130.0, true),
        ]);
        assert_eq!(extract_title(&p, 10.0), "Main Document Title");
    }

    #[test]
    fn tie_broken_by_vertical_position() {
        let p = page(vec![
            line("Lower Line", 24.0, 150.0, true),
            line("Upper Line", 24.0, 80.0, true),
        ]);
        assert_eq!(extract_title(&p, 10.0), "Upper Line Lower Line");
    }

    #[test]
    fn centered_bonus_beats_margin_line() {
        // Same size, but the centered line collects +2 and wins; the margin
        // line (also in the top region) stays within the band and follows.
        let p = page(vec![
            line("Margin Heading", 20.0, 60.0, false),
            line("Centered Title", 20.0, 100.0, true),
        ]);
        let title = extract_title(&p, 10.0);
        assert!(title.starts_with("Centered Title"), "got {:?}", title);
    }

    #[test]
    fn top_bonus_applies_only_in_top_region() {
        // Two centered same-size lines: one at the top, one far down. The
        // +1 top bonus puts the lower line outside the band... exactly at
        // the band edge (inclusive), so both are kept, top first.
        let p = page(vec![
            line("Deep Line Here", 20.0, 500.0, true),
            line("Top Line Here", 20.0, 100.0, true),
        ]);
        assert_eq!(extract_title(&p, 10.0), "Top Line Here Deep Line Here");
    }
}
