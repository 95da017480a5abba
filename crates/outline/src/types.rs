use std::fmt;

use serde::{Deserialize, Serialize};

/// Heading hierarchy level. Levels are capped at four: the fifth-largest
/// heading size (and anything below it) also maps to [`HeadingLevel::H4`].
///
/// Serializes as the strings `"H1"` through `"H4"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HeadingLevel {
    H1,
    H2,
    H3,
    H4,
}

impl HeadingLevel {
    /// Map a 0-based size rank (0 = largest distinct size) to a level.
    pub fn from_rank(rank: usize) -> Self {
        match rank {
            0 => HeadingLevel::H1,
            1 => HeadingLevel::H2,
            2 => HeadingLevel::H3,
            _ => HeadingLevel::H4,
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            HeadingLevel::H1 => 1,
            HeadingLevel::H2 => 2,
            HeadingLevel::H3 => 3,
            HeadingLevel::H4 => 4,
        }
    }
}

impl fmt::Display for HeadingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "H{}", self.as_u8())
    }
}

/// One entry of the document outline: a heading projected to its public
/// shape (the bounding box used during extraction is dropped).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineEntry {
    pub level: HeadingLevel,
    pub text: String,
    /// 0-based page index.
    pub page: usize,
}

/// The result of processing one document: a title (possibly empty) and the
/// outline entries in reading order (page ascending, then top-to-bottom).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DocumentOutline {
    pub title: String,
    pub outline: Vec<OutlineEntry>,
}

/// Axis-aligned bounding box in top-origin page coordinates: `y0` is the top
/// edge, `y1` the bottom edge, and `y0 <= y1` for any rendered line.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BBox {
    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    pub fn center_x(&self) -> f32 {
        (self.x0 + self.x1) / 2.0
    }
}

/// A run of text rendered at a single font size.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub text: String,
    pub size: f32,
}

/// A horizontal line of text: one or more spans sharing a baseline, plus the
/// line's bounding box.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub spans: Vec<TextSpan>,
    pub bbox: BBox,
}

/// All positioned text of one page, as produced by the text-run source.
#[derive(Debug, Clone, PartialEq)]
pub struct PageText {
    /// 0-based page index in document order.
    pub index: usize,
    pub width: f32,
    pub height: f32,
    /// Lines in top-to-bottom order.
    pub lines: Vec<TextLine>,
}
