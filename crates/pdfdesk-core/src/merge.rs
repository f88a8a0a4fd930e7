//! PDF Merge
//!
//! Combines multiple PDFs into a single document, keeping input order and
//! page order within each input.

use crate::document::PdfDocument;
use crate::pages::PageTreeBuilder;
use crate::{PdfError, Result};
use lopdf::Document;
use std::time::Instant;

/// Merge multiple PDFs into one
///
/// Every input, including a lone one, goes through the same copy path so
/// the output is always a freshly built document.
pub fn merge_documents<B: AsRef<[u8]>>(documents: &[B]) -> Result<Vec<u8>> {
    if documents.is_empty() {
        return Err(PdfError::NoDocuments);
    }

    let started = Instant::now();
    let mut builder = PageTreeBuilder::new();

    for (i, bytes) in documents.iter().enumerate() {
        let source = Document::load_mem(bytes.as_ref())
            .map_err(|e| PdfError::LoadError(format!("document {i}: {e}")))?;
        let page_count = source.get_pages().len();
        let indices: Vec<usize> = (0..page_count).collect();

        builder.append_pages(source, &indices)?;
        log::debug!("Appended {page_count} pages from document {i}");
    }

    let page_count = builder.page_count();
    let output = PdfDocument::from_document(builder.finish()).to_bytes()?;
    log::info!(
        "Merged {} documents ({page_count} pages) in {:.1}ms",
        documents.len(),
        started.elapsed().as_secs_f64() * 1000.0
    );
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Dictionary, Object, Stream};

    /// Helper to create a simple PDF with N pages containing identifiable text
    fn create_test_pdf(num_pages: u32, content_prefix: &str) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut page_ids = Vec::new();
        for page_num in 0..num_pages {
            let content = format!(
                "BT /F1 12 Tf 50 700 Td ({}-Page-{}) Tj ET",
                content_prefix,
                page_num + 1
            );
            let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            });
            page_ids.push(Object::Reference(page_id));
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Count" => num_pages as i64,
                "Kids" => page_ids,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).unwrap();
        buffer
    }

    fn page_texts(bytes: &[u8]) -> Vec<String> {
        let doc = Document::load_mem(bytes).unwrap();
        doc.get_pages()
            .values()
            .map(|&page_id| String::from_utf8_lossy(&doc.get_page_content(page_id).unwrap()).into_owned())
            .collect()
    }

    #[test]
    fn test_merge_empty_fails() {
        let empty: Vec<Vec<u8>> = Vec::new();
        assert!(matches!(merge_documents(&empty), Err(PdfError::NoDocuments)));
    }

    #[test]
    fn test_merge_keeps_input_order() {
        let a = create_test_pdf(2, "A");
        let b = create_test_pdf(3, "B");

        let merged = merge_documents(&[a, b]).unwrap();
        let texts = page_texts(&merged);

        assert_eq!(texts.len(), 5);
        let expected = ["A-Page-1", "A-Page-2", "B-Page-1", "B-Page-2", "B-Page-3"];
        for (text, marker) in texts.iter().zip(expected) {
            assert!(text.contains(marker), "{text:?} should contain {marker}");
        }
    }

    #[test]
    fn test_merge_single_document_is_rebuilt() {
        let a = create_test_pdf(2, "A");
        let merged = merge_documents(&[a.as_slice()]).unwrap();
        assert_eq!(page_texts(&merged).len(), 2);
    }

    #[test]
    fn test_merge_same_document_twice() {
        let a = create_test_pdf(1, "A");
        let merged = merge_documents(&[&a, &a]).unwrap();
        assert_eq!(page_texts(&merged).len(), 2);
    }

    #[test]
    fn test_merge_reports_failing_input() {
        let a = create_test_pdf(1, "A");
        let result = merge_documents(&[a, b"garbage".to_vec()]);

        match result {
            Err(PdfError::LoadError(message)) => assert!(message.starts_with("document 1:")),
            other => panic!("expected LoadError, got {other:?}"),
        }
    }
}
