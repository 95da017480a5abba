//! The heuristic classification core: a pure, sequential transformation
//! from one document's positioned text to a [`DocumentOutline`].
//!
//! # Pipeline
//!
//! ```text
//! PageText[]  ->  body size  ->  { title, headings }  ->  levels  ->  DocumentOutline
//!                  stats           title / headings       levels       (sorted)
//! ```
//!
//! All state (the dedup seen-set, candidate lists) is scoped to a single
//! call, so per-document invocations are independent.

pub mod headings;
pub mod levels;
pub mod normalize;
pub mod stats;
pub mod title;

pub use headings::Heading;

use crate::types::{DocumentOutline, PageText};

/// Run the full pipeline over a document's pages.
///
/// Pure function of its input: running it twice on the same pages produces
/// identical results.
pub fn build_outline(pages: &[PageText]) -> DocumentOutline {
    let body_size = stats::body_font_size(pages);

    let title = pages
        .first()
        .map(|first| title::extract_title(first, body_size))
        .unwrap_or_default();

    let mut headings = headings::extract_headings(pages, body_size);
    levels::assign_levels(&mut headings);

    // Final reading order across the whole document, independent of the
    // extraction scan order.
    headings.sort_by(|a, b| {
        a.page.cmp(&b.page).then(
            a.bbox
                .y0
                .partial_cmp(&b.bbox.y0)
                .unwrap_or(std::cmp::Ordering::Equal),
        )
    });

    DocumentOutline {
        title,
        outline: headings.into_iter().map(Heading::into_entry).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BBox, HeadingLevel, TextLine, TextSpan};

    fn line(text: &str, size: f32, y: f32) -> TextLine {
        let width = text.chars().count() as f32 * size * 0.5;
        let x0 = (612.0 - width) / 2.0;
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

    fn page(index: usize, lines: Vec<TextLine>) -> PageText {
        PageText {
            index,
            width: 612.0,
            height: 792.0,
            lines,
        }
    }

    /// A small two-page report: cover title, two section levels, body text.
    fn sample_pages() -> Vec<PageText> {
        vec![
            page(
                0,
                vec![
                    line("Annual Report 2024", 24.0, 80.0),
                    line("First Chapter", 18.0, 300.0),
                    line("This is ordinary body text for the report.", 10.0, 330.0),
                    line("Some Detail", 14.0, 420.0),
                    line("More ordinary body text follows here.", 10.0, 450.0),
                ],
            ),
            page(
                1,
                vec![
                    line("Second Chapter", 18.0, 90.0),
                    line("Further body text on the second page.", 10.0, 120.0),
                    line("And a closing body paragraph to finish.", 10.0, 140.0),
                ],
            ),
        ]
    }

    #[test]
    fn empty_document() {
        let result = build_outline(&[]);
        assert_eq!(result, DocumentOutline::default());
        assert_eq!(
            serde_json::to_string(&result).unwrap(),
            r#"{"title":"","outline":[]}"#
        );
    }

    #[test]
    fn full_pipeline_title_and_levels() {
        let result = build_outline(&sample_pages());
        assert_eq!(result.title, "Annual Report 2024");

        let entries: Vec<(&str, HeadingLevel, usize)> = result
            .outline
            .iter()
            .map(|e| (e.text.as_str(), e.level, e.page))
            .collect();

        // 24pt -> H1 (the title line also qualifies as a heading),
        // 18pt -> H2, 14pt -> H3.
        assert_eq!(
            entries,
            vec![
                ("Annual Report 2024", HeadingLevel::H1, 0),
                ("First Chapter", HeadingLevel::H2, 0),
                ("Some Detail", HeadingLevel::H3, 0),
                ("Second Chapter", HeadingLevel::H2, 1),
            ]
        );
    }

    #[test]
    fn idempotent() {
        let pages = sample_pages();
        assert_eq!(build_outline(&pages), build_outline(&pages));
    }

    #[test]
    fn no_duplicate_texts_in_output() {
        let mut pages = sample_pages();
        pages.push(page(2, vec![line("FIRST CHAPTER", 18.0, 90.0)]));

        let result = build_outline(&pages);
        let mut lowered: Vec<String> =
            result.outline.iter().map(|e| e.text.to_lowercase()).collect();
        let total = lowered.len();
        lowered.sort();
        lowered.dedup();
        assert_eq!(lowered.len(), total);
    }

    #[test]
    fn entries_sorted_by_page_then_vertical_position() {
        // Feed pages out of visual order within a page list to exercise the
        // final sort.
        let pages = vec![
            page(
                1,
                vec![
                    line("Later Section", 16.0, 400.0),
                    line("Earlier Section", 16.0, 90.0),
                    line("body text between the sections of page two", 10.0, 200.0),
                    line("and more of it further down the page", 10.0, 250.0),
                ],
            ),
            page(
                0,
                vec![
                    line("Opening Section", 16.0, 200.0),
                    line("opening body text below the first section", 10.0, 260.0),
                    line("with a second paragraph right after it", 10.0, 280.0),
                ],
            ),
        ];
        // Page indices come from PageText, not list position.
        let result = build_outline(&pages);
        let texts: Vec<&str> = result.outline.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["Opening Section", "Earlier Section", "Later Section"]
        );

        for pair in result.outline.windows(2) {
            assert!(pair[0].page <= pair[1].page);
        }
    }

    #[test]
    fn numeric_and_stoplist_lines_never_surface() {
        let pages = vec![page(
            0,
            vec![
                line("42", 30.0, 100.0),
                line("Page", 30.0, 140.0),
                line("Real Heading", 16.0, 200.0),
                line("plain body text keeps the baseline honest", 10.0, 260.0),
                line("a second body line below the first one", 10.0, 280.0),
                line("and a third body line for good measure", 10.0, 300.0),
            ],
        )];
        let result = build_outline(&pages);
        let texts: Vec<&str> = result.outline.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["Real Heading"]);
    }

    #[test]
    fn title_considers_first_page_only() {
        let pages = vec![
            page(
                0,
                vec![
                    line("tiny body text only on the cover", 10.0, 400.0),
                    line("and a second line of it for the baseline", 10.0, 420.0),
                ],
            ),
            page(1, vec![line("Huge Text On Page Two", 30.0, 80.0)]),
        ];
        let result = build_outline(&pages);
        assert_eq!(result.title, "");
        // ... but the page-two heading still lands in the outline.
        assert_eq!(result.outline.len(), 1);
        assert_eq!(result.outline[0].page, 1);
    }
}
