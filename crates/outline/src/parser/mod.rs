//! The text-run source: a thin wrapper over the PDF library that yields
//! positioned lines and spans per page.

pub mod backend;
pub mod layout;

pub use backend::{LopdfBackend, PdfBackend};
pub use layout::extract_pages;
