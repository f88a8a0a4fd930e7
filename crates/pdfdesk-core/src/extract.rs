//! Page extraction (split)

use crate::document::PdfDocument;
use crate::pages::PageTreeBuilder;
use crate::range::{parse_page_range_report, PageSelection};
use crate::{PdfError, Result};
use lopdf::Document;
use std::time::Instant;

/// Copy the selected pages into a new document
///
/// Fails with `EmptySelection` for an empty selection and with
/// `PageNotFound` if an index is past the end of the document.
pub fn extract_pages(bytes: &[u8], selection: &PageSelection) -> Result<Vec<u8>> {
    if selection.is_empty() {
        return Err(PdfError::EmptySelection);
    }

    let source = Document::load_mem(bytes).map_err(|e| PdfError::LoadError(e.to_string()))?;
    extract_from(source, selection)
}

/// Parse `expression` against the document and extract the result
///
/// Tokens that do not select anything are logged and skipped; the call only
/// fails if none of them does.
pub fn extract_range(bytes: &[u8], expression: &str) -> Result<Vec<u8>> {
    let source = Document::load_mem(bytes).map_err(|e| PdfError::LoadError(e.to_string()))?;
    let total = source.get_pages().len();

    let report = parse_page_range_report(expression, total);
    if !report.rejected.is_empty() {
        log::warn!(
            "Ignoring page range tokens {:?} (document has {total} pages)",
            report.rejected
        );
    }
    if report.selection.is_empty() {
        return Err(PdfError::EmptySelection);
    }

    extract_from(source, &report.selection)
}

fn extract_from(source: Document, selection: &PageSelection) -> Result<Vec<u8>> {
    let started = Instant::now();
    let total = source.get_pages().len();

    let mut builder = PageTreeBuilder::new();
    builder.append_pages(source, selection.as_slice())?;

    let output = PdfDocument::from_document(builder.finish()).to_bytes()?;
    log::info!(
        "Extracted {} of {total} pages in {:.1}ms",
        selection.len(),
        started.elapsed().as_secs_f64() * 1000.0
    );
    Ok(output)
}
