//! PDF Desk Core - page-level PDF editing
//!
//! This crate provides functionality for:
//! - Merging several PDFs into one document
//! - Extracting a page selection (`"1, 3-5, 8"`) into a new document
//! - Rotating pages by quarter turns
//! - Drawing image and text overlays placed in on-screen pixel coordinates
//!
//! Every operation takes raw PDF bytes and returns freshly serialized bytes.
//!
//! # Example
//!
//! ```ignore
//! use pdfdesk_core::{parse_page_range, extract_pages, page_count};
//!
//! let total = page_count(&bytes)?;
//! let selection = parse_page_range("1, 3-5", total);
//! let output = extract_pages(&bytes, &selection)?;
//! ```

mod coords;
mod document;
mod extract;
mod font;
mod image;
mod merge;
pub mod naming;
mod overlay;
mod pages;
mod range;
mod rotate;
mod text;

pub use coords::{CoordinateMapper, DocRect, PageSize, ScreenRect};
pub use document::{PageBox, PdfDocument, SaveOptions};
pub use extract::{extract_pages, extract_range};
pub use image::ImageKind;
pub use merge::merge_documents;
pub use overlay::{
    apply_overlays, apply_text_annotations, insert_overlay, ImageOverlay, Overlay, TextOverlay,
};
pub use range::{default_range_expression, parse_page_range, parse_page_range_report};
pub use range::{PageSelection, RangeReport};
pub use rotate::{normalize_rotation, rotate_pages, RotationDelta, RotationMap};
pub use text::Color;

use thiserror::Error;

/// Errors that can occur during PDF operations
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Failed to load PDF: {0}")]
    LoadError(String),

    #[error("Failed to save PDF: {0}")]
    SerializeError(String),

    #[error("Page index {0} not found (document has {1} pages)")]
    PageNotFound(usize, usize),

    #[error("Page selection is empty")]
    EmptySelection,

    #[error("No documents to merge")]
    NoDocuments,

    #[error("Invalid rotation: {0} degrees is not a multiple of 90")]
    InvalidRotation(i64),

    #[error("Invalid rendered width: {0}")]
    InvalidRenderedWidth(f64),

    #[error("Invalid placement on page {page}: {field} is {value}")]
    InvalidPlacement {
        page: usize,
        field: &'static str,
        value: f64,
    },

    #[error("Unsupported image type: {0}")]
    UnsupportedImageType(String),

    #[error("Image error: {0}")]
    ImageError(String),

    #[error("PDF parsing error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Lopdf error: {0}")]
    LopdfError(#[from] lopdf::Error),
}

/// Result type for PDF operations
pub type Result<T> = std::result::Result<T, PdfError>;

/// Count the pages of a PDF without modifying it
pub fn page_count(bytes: &[u8]) -> Result<usize> {
    Ok(PdfDocument::open_from_bytes(bytes)?.page_count())
}

/// Size in points of every page, in page order
///
/// The renderer collaborator uses this together with its own rendered width
/// to build overlay placements.
pub fn page_sizes(bytes: &[u8]) -> Result<Vec<PageSize>> {
    let doc = PdfDocument::open_from_bytes(bytes)?;
    (0..doc.page_count()).map(|page| doc.page_size(page)).collect()
}
