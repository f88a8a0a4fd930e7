//! WASM bindings for pdfdesk
//!
//! This crate provides JavaScript-friendly API for:
//! - Merging and splitting PDFs
//! - Rotating pages with accumulated quarter turns
//! - Applying image and text overlays placed on rendered pages
//!
//! # Example (JavaScript)
//!
//! ```javascript
//! import init, { mergePdfs, splitPdf, RotationPlan, OverlayBatch } from 'pdfdesk-wasm';
//!
//! await init();
//!
//! const merged = mergePdfs([firstBytes, secondBytes]);
//! const extracted = splitPdf(merged, "1, 3-5");
//!
//! const plan = new RotationPlan();
//! plan.rotatePage(0, 90);
//! const rotated = plan.apply(merged);
//!
//! const batch = new OverlayBatch(canvas.width);
//! batch.addText({ page: 0, x: 40, y: 60, size: 16, text: "Approved" });
//! batch.addImage(0, { x: 10, y: 10, width: 120, height: 40 }, "image/png", pngBytes);
//! const edited = batch.apply(rotated);
//! ```

use js_sys::{Array, Uint8Array};
use pdfdesk_core::naming::{output_file_name, Operation};
use pdfdesk_core::{
    apply_overlays, default_range_expression, extract_range, merge_documents, page_count,
    page_sizes, parse_page_range, rotate_pages, ImageOverlay, Overlay, RotationDelta, RotationMap,
    ScreenRect, TextOverlay,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

fn js_error<E: ToString>(err: E) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Merge PDFs in array order
///
/// @param files - Array of Uint8Array
/// @returns PDF bytes (Uint8Array)
#[wasm_bindgen(js_name = mergePdfs)]
pub fn merge_pdfs(files: Array) -> Result<Vec<u8>, JsValue> {
    let documents = files
        .iter()
        .enumerate()
        .map(|(i, value)| {
            value
                .dyn_into::<Uint8Array>()
                .map(|bytes| bytes.to_vec())
                .map_err(|_| JsValue::from_str(&format!("Item {i} is not a Uint8Array")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    merge_documents(&documents).map_err(js_error)
}

/// Extract the pages of a range expression such as "1, 3-5"
///
/// @param data - PDF file bytes (Uint8Array)
/// @param range - 1-based page range expression
/// @returns PDF bytes (Uint8Array)
#[wasm_bindgen(js_name = splitPdf)]
pub fn split_pdf(data: &[u8], range: &str) -> Result<Vec<u8>, JsValue> {
    extract_range(data, range).map_err(js_error)
}

/// @param data - PDF file bytes (Uint8Array)
/// @returns Number of pages
#[wasm_bindgen(js_name = pageCount)]
pub fn page_count_js(data: &[u8]) -> Result<u32, JsValue> {
    page_count(data).map(|count| count as u32).map_err(js_error)
}

/// Page sizes in points
///
/// @param data - PDF file bytes (Uint8Array)
/// @returns Array of { width, height }
#[wasm_bindgen(js_name = pageSizes)]
pub fn page_sizes_js(data: &[u8]) -> Result<JsValue, JsValue> {
    let sizes = page_sizes(data).map_err(js_error)?;
    Ok(serde_wasm_bindgen::to_value(&sizes)?)
}

/// Parse a page range expression
///
/// Unusable tokens are dropped; an empty result means the range is invalid.
///
/// @param range - 1-based page range expression
/// @param totalPages - Page count of the document
/// @returns Zero-based page indices (Uint32Array)
#[wasm_bindgen(js_name = parseRange)]
pub fn parse_range(range: &str, total_pages: u32) -> Vec<u32> {
    parse_page_range(range, total_pages as usize)
        .iter()
        .map(|page| page as u32)
        .collect()
}

/// Range expression covering every page, e.g. "1-12"
#[wasm_bindgen(js_name = defaultRange)]
pub fn default_range(total_pages: u32) -> String {
    default_range_expression(total_pages as usize)
}

/// Conventional download name for an operation's output
///
/// @param operation - "merge", "split", "rotate", "overlay" or "annotate"
/// @param original - Name of the source file, if known
#[wasm_bindgen(js_name = outputFileName)]
pub fn output_file_name_js(operation: &str, original: Option<String>) -> Result<String, JsValue> {
    let operation: Operation = serde_wasm_bindgen::from_value(JsValue::from_str(operation))?;
    Ok(output_file_name(operation, original.as_deref()))
}

/// Pending page rotations, accumulated from UI clicks
#[wasm_bindgen]
pub struct RotationPlan {
    inner: RotationMap,
}

#[wasm_bindgen]
impl RotationPlan {
    #[wasm_bindgen(constructor)]
    pub fn new() -> RotationPlan {
        RotationPlan {
            inner: RotationMap::new(),
        }
    }

    /// Add a rotation to one page
    ///
    /// @param page - Zero-based page index
    /// @param degrees - Multiple of 90, negative for counter-clockwise
    #[wasm_bindgen(js_name = rotatePage)]
    pub fn rotate_page(&mut self, page: u32, degrees: i32) -> Result<(), JsValue> {
        let delta = RotationDelta::new(degrees).map_err(js_error)?;
        self.inner.rotate_page(page as usize, delta);
        Ok(())
    }

    /// Add a rotation to every page
    #[wasm_bindgen(js_name = rotateAll)]
    pub fn rotate_all(&mut self, page_count: u32, degrees: i32) -> Result<(), JsValue> {
        let delta = RotationDelta::new(degrees).map_err(js_error)?;
        self.inner.rotate_all(page_count as usize, delta);
        Ok(())
    }

    /// Net pending rotation of a page in [0, 360)
    pub fn pending(&self, page: u32) -> u16 {
        self.inner.get(page as usize).unwrap_or(0)
    }

    pub fn clear(&mut self) {
        self.inner = RotationMap::new();
    }

    /// Apply the pending rotations
    ///
    /// @param data - PDF file bytes (Uint8Array)
    /// @returns PDF bytes (Uint8Array)
    pub fn apply(&self, data: &[u8]) -> Result<Vec<u8>, JsValue> {
        rotate_pages(data, &self.inner).map_err(js_error)
    }
}

impl Default for RotationPlan {
    fn default() -> Self {
        Self::new()
    }
}

/// Overlays placed on pages rendered at one width, applied in one pass
#[wasm_bindgen]
pub struct OverlayBatch {
    rendered_width: f64,
    overlays: Vec<Overlay>,
}

#[wasm_bindgen]
impl OverlayBatch {
    /// @param renderedWidth - Pixel width the pages are rendered at
    #[wasm_bindgen(constructor)]
    pub fn new(rendered_width: f64) -> OverlayBatch {
        OverlayBatch {
            rendered_width,
            overlays: Vec::new(),
        }
    }

    /// Queue an image
    ///
    /// @param page - Zero-based page index
    /// @param rect - { x, y, width, height } in rendered pixels
    /// @param mime - "image/png" or "image/jpeg"
    /// @param data - Image bytes (Uint8Array)
    #[wasm_bindgen(js_name = addImage)]
    pub fn add_image(
        &mut self,
        page: u32,
        rect: JsValue,
        mime: &str,
        data: &[u8],
    ) -> Result<(), JsValue> {
        let rect: ScreenRect = serde_wasm_bindgen::from_value(rect)?;
        let overlay =
            ImageOverlay::from_mime(page as usize, rect, mime, data.to_vec()).map_err(js_error)?;
        self.overlays.push(Overlay::Image(overlay));
        Ok(())
    }

    /// Queue a text annotation
    ///
    /// @param annotation - { page, x, y, size, text, color? }
    #[wasm_bindgen(js_name = addText)]
    pub fn add_text(&mut self, annotation: JsValue) -> Result<(), JsValue> {
        let text: TextOverlay = serde_wasm_bindgen::from_value(annotation)?;
        self.overlays.push(Overlay::Text(text));
        Ok(())
    }

    #[wasm_bindgen(getter)]
    pub fn length(&self) -> u32 {
        self.overlays.len() as u32
    }

    pub fn clear(&mut self) {
        self.overlays.clear();
    }

    /// Draw every queued overlay
    ///
    /// Overlays on pages the document does not have are skipped. With nothing
    /// queued the input is returned unchanged.
    ///
    /// @param data - PDF file bytes (Uint8Array)
    /// @returns PDF bytes (Uint8Array)
    pub fn apply(&self, data: &[u8]) -> Result<Vec<u8>, JsValue> {
        apply_overlays(data, &self.overlays, self.rendered_width).map_err(js_error)
    }
}
