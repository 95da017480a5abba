//! Text-run extraction: content-stream walking and line assembly.
//!
//! This module turns raw PDF content-stream operators into the positioned
//! [`PageText`]/[`TextLine`]/[`TextSpan`] structures the outline heuristics
//! consume. Side effects (I/O) live behind the [`PdfBackend`] trait provided
//! by the caller.
//!
//! # Pipeline
//!
//! ```text
//! content ops  ->  RawSpan[]  ->  TextLine[]  ->  PageText
//!   (per page)     walk_page      group_spans
//! ```
//!
//! Bounding boxes are emitted in top-origin page coordinates (y grows
//! downward), which is the frame the heuristics reason in.

use std::sync::OnceLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use super::backend::{get_number_from_value, PageId, PdfBackend, PdfValue};
use crate::types::{BBox, PageText, TextLine, TextSpan};
use crate::OutlineError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Two spans whose baseline Y coordinates differ by less than this are
/// treated as belonging to the same line.
const Y_TOLERANCE: f32 = 1.0;

/// Approximate character width as a fraction of font size when no better
/// metric is available. 0.5 is a reasonable default for proportional fonts.
const APPROX_CHAR_WIDTH_RATIO: f32 = 0.5;

/// Minimum gap (in points) between adjacent spans before we insert a space.
const MIN_WORD_GAP: f32 = 1.5;

/// Two font sizes closer than this are treated as equal when merging
/// adjacent spans on a line.
const SIZE_MERGE_TOLERANCE: f32 = 0.05;

/// Fraction of the font size above the baseline covered by glyphs.
const ASCENT_RATIO: f32 = 0.8;

/// Fraction of the font size below the baseline covered by glyphs.
const DESCENT_RATIO: f32 = 0.2;

/// The identity 2x3 text matrix: [a, b, c, d, tx, ty].
const IDENTITY_MATRIX: [f32; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

// ---------------------------------------------------------------------------
// Internal types
// ---------------------------------------------------------------------------

/// A single show-text run in raw PDF coordinates (y is the baseline, growing
/// upward from the bottom of the page).
#[derive(Debug, Clone)]
struct RawSpan {
    text: String,
    x: f32,
    y: f32,
    width: f32,
    size: f32,
}

/// Mutable state tracked while walking a page's content stream.
#[derive(Debug, Clone)]
struct TextState {
    /// Current font resource name (the `/F1`-style key).
    font_key: Vec<u8>,
    /// Current font size in text-space units.
    font_size: f32,
    /// Elements [a, b, c, d, tx, ty] of the current text matrix.
    text_matrix: [f32; 6],
    /// Text line matrix -- set by BT and updated by Td/TD/T*/Tm.
    line_matrix: [f32; 6],
    /// Horizontal scaling factor (percent / 100). Default 1.0.
    horiz_scale: f32,
    /// Character spacing (Tc).
    char_spacing: f32,
    /// Word spacing (Tw).
    word_spacing: f32,
    /// Text rise (Ts).
    text_rise: f32,
    /// Leading (TL).
    leading: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font_key: Vec::new(),
            font_size: 0.0,
            text_matrix: IDENTITY_MATRIX,
            line_matrix: IDENTITY_MATRIX,
            horiz_scale: 1.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            text_rise: 0.0,
            leading: 0.0,
        }
    }
}

impl TextState {
    /// Current X position derived from the text matrix.
    fn x(&self) -> f32 {
        self.text_matrix[4]
    }

    /// Current Y position derived from the text matrix.
    fn y(&self) -> f32 {
        self.text_matrix[5]
    }

    /// Effective font size accounting for the text matrix vertical scale.
    ///
    /// The rendered size is `font_size * sqrt(b^2 + d^2)` where b and d are
    /// elements [1] and [3] of the text matrix respectively.
    fn effective_font_size(&self) -> f32 {
        let scale = (self.text_matrix[1].powi(2) + self.text_matrix[3].powi(2)).sqrt();
        (self.font_size * scale).abs()
    }

    /// Advance the text matrix horizontally by `dx` text-space units.
    fn advance_x(&mut self, dx: f32) {
        self.text_matrix[4] += dx * self.text_matrix[0];
        self.text_matrix[5] += dx * self.text_matrix[1];
    }

    /// Multiply the text line matrix by a translation (used by Td / TD).
    fn translate_line(&mut self, tx: f32, ty: f32) {
        let new_tx = self.line_matrix[0] * tx + self.line_matrix[2] * ty + self.line_matrix[4];
        let new_ty = self.line_matrix[1] * tx + self.line_matrix[3] * ty + self.line_matrix[5];
        self.line_matrix[4] = new_tx;
        self.line_matrix[5] = new_ty;
        self.text_matrix = self.line_matrix;
    }
}

// ---------------------------------------------------------------------------
// Decoded-text scrubbing
// ---------------------------------------------------------------------------

/// Scrub a decoded text fragment before it enters the pipeline: Unicode NFC
/// normalization, ligature expansion, and removal of U+FFFD replacement
/// characters. This is text-extraction hygiene on the source side, distinct
/// from the outline core's line normalizer.
fn scrub_text(text: &str) -> String {
    let mut result: String = text.nfc().collect();

    let ligatures = [
        ("\u{FB00}", "ff"),
        ("\u{FB01}", "fi"),
        ("\u{FB02}", "fl"),
        ("\u{FB03}", "ffi"),
        ("\u{FB04}", "ffl"),
    ];
    for (lig, replacement) in &ligatures {
        result = result.replace(lig, replacement);
    }

    result = result.replace('\u{FFFD}', "");

    // Control characters occasionally survive bad ToUnicode maps.
    static RE_CTRL: OnceLock<Regex> = OnceLock::new();
    let re_ctrl = RE_CTRL.get_or_init(|| Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F]").unwrap());
    re_ctrl.replace_all(&result, "").into_owned()
}

/// Decode a single [`PdfValue::Str`] operand into a scrubbed `String`, using
/// the backend's font-aware decoder.
fn decode_string(
    val: &PdfValue,
    backend: &dyn PdfBackend,
    page_id: PageId,
    font_key: &[u8],
) -> String {
    match val {
        PdfValue::Str(bytes) => {
            let decoded = backend.decode_text(page_id, font_key, bytes);
            if decoded.is_empty() {
                scrub_text(&super::backend::decode_text_simple(bytes))
            } else {
                scrub_text(&decoded)
            }
        }
        _ => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Content-stream walk
// ---------------------------------------------------------------------------

/// Estimate the rendered width of a text string given the current state.
///
/// Glyph metrics (the font's widths array) are not available here, so each
/// character contributes `font_size * APPROX_CHAR_WIDTH_RATIO * horiz_scale`.
fn estimate_text_width(text: &str, state: &TextState) -> f32 {
    let n = text.chars().count() as f32;
    n * state.font_size * APPROX_CHAR_WIDTH_RATIO * state.horiz_scale
}

/// Advance the text matrix after rendering `text`.
fn advance_after_show(text: &str, state: &mut TextState) {
    let mut total_dx: f32 = 0.0;
    for ch in text.chars() {
        let char_w = state.font_size * APPROX_CHAR_WIDTH_RATIO * state.horiz_scale;
        total_dx += char_w + state.char_spacing;
        if ch == ' ' {
            total_dx += state.word_spacing;
        }
    }
    state.advance_x(total_dx);
}

/// Walk a single page's content stream and produce a flat list of raw spans.
///
/// Implements a simplified PDF text-rendering state machine handling the
/// operators `BT ET Tf Tm Td TD T* TL Tc Tw Tz Ts Tj TJ ' "`. Everything
/// else (paths, images, color) is ignored.
fn walk_page(backend: &dyn PdfBackend, page_id: PageId) -> Result<Vec<RawSpan>, OutlineError> {
    let raw_content = backend.page_content(page_id)?;
    let ops = backend.decode_content(&raw_content)?;

    let mut state = TextState::default();
    let mut spans: Vec<RawSpan> = Vec::new();

    for op in &ops {
        match op.operator.as_str() {
            // -- Text object delimiters --------------------------------
            "BT" => {
                state.text_matrix = IDENTITY_MATRIX;
                state.line_matrix = IDENTITY_MATRIX;
            }
            "ET" => {
                // Font state is kept across text objects because some PDFs
                // reuse the font set earlier.
            }

            // -- Font ---------------------------------------------------
            "Tf" => {
                if op.operands.len() >= 2 {
                    if let PdfValue::Name(key) = &op.operands[0] {
                        state.font_key = key.clone();
                    }
                    state.font_size = get_number_from_value(&op.operands[1]).unwrap_or(0.0);
                }
            }

            // -- Text matrix / position ---------------------------------
            "Tm" => {
                let vals: Vec<f32> = op
                    .operands
                    .iter()
                    .take(6)
                    .filter_map(get_number_from_value)
                    .collect();
                if vals.len() == 6 {
                    state.text_matrix = [vals[0], vals[1], vals[2], vals[3], vals[4], vals[5]];
                    state.line_matrix = state.text_matrix;
                }
            }
            "Td" => {
                if op.operands.len() >= 2 {
                    let tx = get_number_from_value(&op.operands[0]).unwrap_or(0.0);
                    let ty = get_number_from_value(&op.operands[1]).unwrap_or(0.0);
                    state.translate_line(tx, ty);
                }
            }
            "TD" => {
                // TD is equivalent to: -ty TL ; tx ty Td
                if op.operands.len() >= 2 {
                    let tx = get_number_from_value(&op.operands[0]).unwrap_or(0.0);
                    let ty = get_number_from_value(&op.operands[1]).unwrap_or(0.0);
                    state.leading = -ty;
                    state.translate_line(tx, ty);
                }
            }
            "T*" => {
                state.translate_line(0.0, -state.leading);
            }
            "TL" => {
                if let Some(v) = op.operands.first().and_then(get_number_from_value) {
                    state.leading = v;
                }
            }

            // -- Spacing / scaling --------------------------------------
            "Tc" => {
                if let Some(v) = op.operands.first().and_then(get_number_from_value) {
                    state.char_spacing = v;
                }
            }
            "Tw" => {
                if let Some(v) = op.operands.first().and_then(get_number_from_value) {
                    state.word_spacing = v;
                }
            }
            "Tz" => {
                if let Some(v) = op.operands.first().and_then(get_number_from_value) {
                    state.horiz_scale = v / 100.0;
                }
            }
            "Ts" => {
                if let Some(v) = op.operands.first().and_then(get_number_from_value) {
                    state.text_rise = v;
                }
            }

            // -- Show text ----------------------------------------------
            "Tj" => {
                if let Some(first) = op.operands.first() {
                    emit_show_string(first, backend, page_id, &mut state, &mut spans);
                }
            }
            "TJ" => {
                if let Some(PdfValue::Array(arr)) = op.operands.first() {
                    handle_tj_array(arr, backend, page_id, &mut state, &mut spans);
                }
            }

            // -- Convenience show operators -----------------------------
            "'" => {
                state.translate_line(0.0, -state.leading);
                if let Some(first) = op.operands.first() {
                    emit_show_string(first, backend, page_id, &mut state, &mut spans);
                }
            }
            "\"" => {
                // " aw ac string  =>  set Tw, Tc, T*, Tj
                if op.operands.len() >= 3 {
                    if let Some(aw) = get_number_from_value(&op.operands[0]) {
                        state.word_spacing = aw;
                    }
                    if let Some(ac) = get_number_from_value(&op.operands[1]) {
                        state.char_spacing = ac;
                    }
                    state.translate_line(0.0, -state.leading);
                    emit_show_string(&op.operands[2], backend, page_id, &mut state, &mut spans);
                }
            }

            _ => { /* Ignore non-text operators */ }
        }
    }

    Ok(spans)
}

/// Decode an operand as a string, create a [`RawSpan`], and advance the text
/// position. Shared by `Tj`, `'`, and `"` operators.
fn emit_show_string(
    operand: &PdfValue,
    backend: &dyn PdfBackend,
    page_id: PageId,
    state: &mut TextState,
    spans: &mut Vec<RawSpan>,
) {
    let text = decode_string(operand, backend, page_id, &state.font_key);
    if text.is_empty() {
        return;
    }
    let span = RawSpan {
        text: text.clone(),
        x: state.x(),
        y: state.y() + state.text_rise,
        width: estimate_text_width(&text, state),
        size: state.effective_font_size(),
    };
    spans.push(span);
    advance_after_show(&text, state);
}

/// Process a `TJ` array: elements are either strings to render or numeric
/// kerning adjustments (in thousandths of a unit of text space).
fn handle_tj_array(
    arr: &[PdfValue],
    backend: &dyn PdfBackend,
    page_id: PageId,
    state: &mut TextState,
    spans: &mut Vec<RawSpan>,
) {
    let mut buf = String::new();
    let mut span_x = state.x();
    let span_y = state.y() + state.text_rise;

    for elem in arr {
        match elem {
            PdfValue::Str(_) => {
                let fragment = decode_string(elem, backend, page_id, &state.font_key);
                if buf.is_empty() {
                    span_x = state.x();
                }
                buf.push_str(&fragment);
                advance_after_show(&fragment, state);
            }
            val => {
                // Numeric kerning: negative value = move right, positive =
                // move left (in thousandths of a text-space unit).
                if let Some(adj) = get_number_from_value(val) {
                    let dx = -adj / 1000.0 * state.font_size * state.horiz_scale;

                    // A displacement large enough to look like a word gap
                    // becomes a space character in the accumulated buffer.
                    let gap_threshold =
                        state.font_size * APPROX_CHAR_WIDTH_RATIO * state.horiz_scale * 0.3;

                    if dx > gap_threshold && !buf.is_empty() {
                        buf.push(' ');
                    }

                    state.advance_x(dx);
                }
            }
        }
    }

    let trimmed = buf.trim_end();
    if !trimmed.is_empty() {
        spans.push(RawSpan {
            text: trimmed.to_string(),
            x: span_x,
            y: span_y,
            width: estimate_text_width(trimmed, state),
            size: state.effective_font_size(),
        });
    }
}

// ---------------------------------------------------------------------------
// Span -> line grouping
// ---------------------------------------------------------------------------

/// Group a flat list of raw spans into [`TextLine`]s with top-origin
/// bounding boxes.
///
/// Spans whose baselines lie within [`Y_TOLERANCE`] points of each other are
/// placed on the same line. Within a line, spans are sorted left-to-right;
/// same-sized spans that touch are concatenated, and a space is inserted
/// across word-sized gaps.
fn group_spans_into_lines(mut spans: Vec<RawSpan>, page_height: f32) -> Vec<TextLine> {
    if spans.is_empty() {
        return Vec::new();
    }

    // Sort by Y descending (top of page first in PDF coordinates), then X
    // ascending, so the emitted lines read top-to-bottom.
    spans.sort_by(|a, b| {
        b.y.partial_cmp(&a.y)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal))
    });

    let mut lines: Vec<TextLine> = Vec::new();
    let mut current: Vec<RawSpan> = vec![spans.remove(0)];
    let mut current_y = current[0].y;

    for span in spans {
        if (span.y - current_y).abs() <= Y_TOLERANCE {
            current.push(span);
        } else {
            lines.push(assemble_line(std::mem::take(&mut current), page_height));
            current_y = span.y;
            current.push(span);
        }
    }

    if !current.is_empty() {
        lines.push(assemble_line(current, page_height));
    }

    lines
}

/// Build a [`TextLine`] from spans known to share a baseline.
fn assemble_line(mut spans: Vec<RawSpan>, page_height: f32) -> TextLine {
    spans.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));

    // Merge spans that overlap or are very close, inserting spaces across
    // word gaps. Spans at different font sizes stay separate so the
    // heuristics can see per-size runs.
    let mut merged: Vec<RawSpan> = Vec::with_capacity(spans.len());

    for span in spans {
        if let Some(prev) = merged.last_mut() {
            let gap = span.x - (prev.x + prev.width);
            let same_size = (prev.size - span.size).abs() < SIZE_MERGE_TOLERANCE;

            if same_size && gap < MIN_WORD_GAP && gap > -prev.size {
                // Adjacent or overlapping -- concatenate directly.
                prev.text.push_str(&span.text);
                prev.width = (span.x + span.width) - prev.x;
                continue;
            }

            if same_size && gap >= MIN_WORD_GAP && gap < prev.size * 2.0 {
                prev.text.push(' ');
                prev.text.push_str(&span.text);
                prev.width = (span.x + span.width) - prev.x;
                continue;
            }
        }

        merged.push(span);
    }

    let baseline = merged.first().map(|s| s.y).unwrap_or(0.0);
    let max_size = merged.iter().map(|s| s.size).fold(0.0, f32::max);
    let x0 = merged.first().map(|s| s.x).unwrap_or(0.0);
    let x1 = merged
        .iter()
        .map(|s| s.x + s.width)
        .fold(x0, f32::max);

    // Flip into top-origin coordinates. The box covers the nominal ascent
    // and descent around the baseline, so its height tracks the font size.
    let bbox = BBox {
        x0,
        y0: page_height - (baseline + max_size * ASCENT_RATIO),
        x1,
        y1: page_height - (baseline - max_size * DESCENT_RATIO),
    };

    TextLine {
        spans: merged
            .into_iter()
            .map(|s| TextSpan {
                text: s.text,
                size: s.size,
            })
            .collect(),
        bbox,
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Extract positioned text from every page of the document.
///
/// Pages are returned in document order with 0-based indices; lines within a
/// page read top-to-bottom.
pub fn extract_pages(backend: &dyn PdfBackend) -> Result<Vec<PageText>, OutlineError> {
    let page_map = backend.pages();
    let mut pages: Vec<PageText> = Vec::with_capacity(page_map.len());

    for (index, (_page_num, page_id)) in page_map.into_iter().enumerate() {
        let (width, height) = backend.page_dimensions(page_id)?;
        let spans = walk_page(backend, page_id)?;
        let lines = group_spans_into_lines(spans, height);
        pages.push(PageText {
            index,
            width,
            height,
            lines,
        });
    }

    Ok(pages)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
