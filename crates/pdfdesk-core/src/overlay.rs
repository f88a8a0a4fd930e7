//! Image and text overlays placed in screen coordinates
//!
//! A placement is recorded against a page rendered `rendered_width` pixels
//! wide. Each one is mapped into the target page's own space before drawing,
//! so pages of different sizes in one document are handled correctly.

use crate::coords::{CoordinateMapper, ScreenRect};
use crate::document::PdfDocument;
use crate::image::ImageKind;
use crate::text::Color;
use crate::{PdfError, Result};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Text placement
///
/// `(x, y)` is the top-left corner of the text box in pixels and
/// `font_size` is the on-screen size in pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextOverlay {
    pub page: usize,
    pub x: f64,
    pub y: f64,
    #[serde(alias = "size")]
    pub font_size: f64,
    pub text: String,
    #[serde(default)]
    pub color: Color,
}

/// Image placement
#[derive(Debug, Clone, PartialEq)]
pub struct ImageOverlay {
    pub page: usize,
    /// Top-left anchored box in pixels
    pub rect: ScreenRect,
    pub kind: ImageKind,
    pub data: Vec<u8>,
}

impl ImageOverlay {
    pub fn new(page: usize, rect: ScreenRect, kind: ImageKind, data: Vec<u8>) -> Self {
        Self {
            page,
            rect,
            kind,
            data,
        }
    }

    /// Build an overlay from bytes and their declared MIME type
    pub fn from_mime(page: usize, rect: ScreenRect, mime: &str, data: Vec<u8>) -> Result<Self> {
        Ok(Self::new(page, rect, ImageKind::from_mime(mime)?, data))
    }
}

/// A single placement on a page
#[derive(Debug, Clone, PartialEq)]
pub enum Overlay {
    Image(ImageOverlay),
    Text(TextOverlay),
}

impl Overlay {
    /// Target page (zero-based)
    pub fn page(&self) -> usize {
        match self {
            Overlay::Image(image) => image.page,
            Overlay::Text(text) => text.page,
        }
    }
}

impl From<ImageOverlay> for Overlay {
    fn from(image: ImageOverlay) -> Self {
        Overlay::Image(image)
    }
}

impl From<TextOverlay> for Overlay {
    fn from(text: TextOverlay) -> Self {
        Overlay::Text(text)
    }
}

/// What to do with a placement whose page does not exist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageMiss {
    Fail,
    Skip,
}

/// Draws placements onto one loaded document
struct OverlayApplier {
    doc: PdfDocument,
    rendered_width: f64,
    on_miss: PageMiss,
    applied: usize,
    skipped: usize,
}

impl OverlayApplier {
    fn open(bytes: &[u8], rendered_width: f64, on_miss: PageMiss) -> Result<Self> {
        if !rendered_width.is_finite() || rendered_width <= 0.0 {
            return Err(PdfError::InvalidRenderedWidth(rendered_width));
        }

        Ok(Self {
            doc: PdfDocument::open_from_bytes(bytes)?,
            rendered_width,
            on_miss,
            applied: 0,
            skipped: 0,
        })
    }

    fn apply(&mut self, overlay: &Overlay) -> Result<()> {
        let page = overlay.page();
        let page_count = self.doc.page_count();
        if page >= page_count {
            return match self.on_miss {
                PageMiss::Fail => Err(PdfError::PageNotFound(page, page_count)),
                PageMiss::Skip => {
                    log::warn!("Skipping overlay for page index {page} (document has {page_count} pages)");
                    self.skipped += 1;
                    Ok(())
                }
            };
        }

        check_placement(overlay)?;
        let mapper = CoordinateMapper::new(self.doc.page_size(page)?, self.rendered_width)?;
        match overlay {
            Overlay::Image(image) => {
                let rect = mapper.to_document(image.rect);
                self.doc.draw_image(page, image.kind, &image.data, rect)?;
            }
            Overlay::Text(text) => {
                if text.text.is_empty() {
                    log::debug!("Skipping empty text overlay on page {page}");
                    return Ok(());
                }
                // The text box is as tall as the font size; its bottom is the baseline
                let rect = mapper.to_document(ScreenRect::new(text.x, text.y, 0.0, text.font_size));
                let font_size = mapper.to_points(text.font_size);
                self.doc
                    .draw_text(page, &text.text, rect.x, rect.y, font_size, text.color)?;
            }
        }

        self.applied += 1;
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<u8>> {
        let output = self.doc.to_bytes()?;
        log::info!(
            "Applied {} overlays ({} skipped), output {} bytes",
            self.applied,
            self.skipped,
            output.len()
        );
        Ok(output)
    }
}

/// Reject NaN and infinite positions or sizes before they reach a content stream
fn check_placement(overlay: &Overlay) -> Result<()> {
    let fields = match overlay {
        Overlay::Image(image) => vec![
            ("x", image.rect.x),
            ("y", image.rect.y),
            ("width", image.rect.width),
            ("height", image.rect.height),
        ],
        Overlay::Text(text) => vec![
            ("x", text.x),
            ("y", text.y),
            ("font_size", text.font_size),
        ],
    };

    match fields.iter().find(|(_, value)| !value.is_finite()) {
        Some(&(field, value)) => Err(PdfError::InvalidPlacement {
            page: overlay.page(),
            field,
            value,
        }),
        None => Ok(()),
    }
}

/// Draw one overlay and return the new document
///
/// Fails with `PageNotFound` if the target page does not exist.
pub fn insert_overlay(bytes: &[u8], overlay: &Overlay, rendered_width: f64) -> Result<Vec<u8>> {
    let mut applier = OverlayApplier::open(bytes, rendered_width, PageMiss::Fail)?;
    applier.apply(overlay)?;
    applier.finish()
}

/// Draw a batch of overlays in one load/save pass
///
/// Overlays targeting missing pages are skipped with a warning. An empty
/// batch returns the input unchanged without parsing it.
pub fn apply_overlays(bytes: &[u8], overlays: &[Overlay], rendered_width: f64) -> Result<Vec<u8>> {
    if !rendered_width.is_finite() || rendered_width <= 0.0 {
        return Err(PdfError::InvalidRenderedWidth(rendered_width));
    }
    if overlays.is_empty() {
        log::debug!("No overlays to apply, returning input unchanged");
        return Ok(bytes.to_vec());
    }

    let started = Instant::now();
    let mut applier = OverlayApplier::open(bytes, rendered_width, PageMiss::Skip)?;
    for overlay in overlays {
        applier.apply(overlay)?;
    }
    let output = applier.finish()?;

    log::debug!(
        "Overlay batch of {} took {:.1}ms",
        overlays.len(),
        started.elapsed().as_secs_f64() * 1000.0
    );
    Ok(output)
}

/// Text-only variant of [`apply_overlays`]
pub fn apply_text_annotations(
    bytes: &[u8],
    annotations: &[TextOverlay],
    rendered_width: f64,
) -> Result<Vec<u8>> {
    let overlays: Vec<Overlay> = annotations.iter().cloned().map(Overlay::Text).collect();
    apply_overlays(bytes, &overlays, rendered_width)
}
