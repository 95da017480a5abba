//! Heuristic PDF outline extraction.
//!
//! Extracts a structural outline (title + hierarchical headings) from a PDF
//! using only typographic cues -- font size, position, repetition -- rather
//! than embedded bookmarks. The result is one [`DocumentOutline`] per
//! document, serializable to `{"title": ..., "outline": [...]}`.
//!
//! Processing is all-or-nothing per document: any failure while opening or
//! walking the file surfaces as an [`OutlineError`] and no partial outline
//! is produced.

use std::path::Path;

use thiserror::Error;

pub mod heuristics;
pub mod parser;
pub mod types;

pub use heuristics::build_outline;
pub use types::*;

#[derive(Debug, Error)]
pub enum OutlineError {
    /// The file could not be parsed as a PDF (missing, corrupt, or
    /// unsupported).
    #[error("failed to open document: {0}")]
    Open(String),

    /// Encrypted documents are rejected at open time.
    #[error("document is encrypted")]
    Encrypted,

    /// A failure while walking pages or content streams.
    #[error("extraction error: {0}")]
    Extraction(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Extract the outline of a PDF supplied as an in-memory byte slice.
pub fn extract_outline(bytes: &[u8]) -> Result<DocumentOutline, OutlineError> {
    let backend = parser::LopdfBackend::load_bytes(bytes)?;
    let pages = parser::extract_pages(&backend)?;
    Ok(build_outline(&pages))
}

/// Extract the outline of a PDF file.
///
/// The document handle lives only for the duration of this call.
pub fn extract_outline_from_path(path: impl AsRef<Path>) -> Result<DocumentOutline, OutlineError> {
    let bytes = std::fs::read(path)?;
    extract_outline(&bytes)
}
