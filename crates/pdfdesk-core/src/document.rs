//! PDF Document wrapper

use crate::coords::{DocRect, PageSize};
use crate::font::{baseline_font_dictionary, encode_win_ansi};
use crate::image::{generate_image_operators, ImageKind, ImageXObject};
use crate::pages::{deref, number, resolve_inherited};
use crate::rotate::normalize_rotation;
use crate::text::{generate_text_operators, Color, TextRenderContext};
use crate::{PdfError, Result};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashMap};
use std::hash::{Hash, Hasher};

/// A4 in points, used when a page has no usable MediaBox
const DEFAULT_PAGE_BOX: PageBox = PageBox {
    x0: 0.0,
    y0: 0.0,
    width: 595.28,
    height: 841.89,
};

/// Visible area of a page in default user space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBox {
    /// Lower-left corner
    pub x0: f64,
    pub y0: f64,
    pub width: f64,
    pub height: f64,
}

impl PageBox {
    fn from_array(items: &[Object]) -> Option<Self> {
        if items.len() != 4 {
            return None;
        }
        let values: Vec<f64> = items.iter().filter_map(number).collect();
        let [llx, lly, urx, ury] = <[f64; 4]>::try_from(values).ok()?;

        Some(Self {
            x0: llx.min(urx),
            y0: lly.min(ury),
            width: (urx - llx).abs(),
            height: (ury - lly).abs(),
        })
    }

    pub fn size(&self) -> PageSize {
        PageSize::new(self.width, self.height)
    }
}

/// Output settings applied when a document is serialized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveOptions {
    /// Flate-compress streams that carry no filter yet
    pub compress: bool,
    /// Drop objects no longer reachable from the trailer
    pub prune: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            compress: true,
            prune: true,
        }
    }
}

/// PDF Document wrapper providing page-level editing
///
/// Page numbers are zero-based indices in document order. Drawing calls
/// are buffered per page and written as one content stream per page when
/// the document is serialized.
pub struct PdfDocument {
    /// The underlying lopdf document
    inner: Document,
    /// Page object ids in document order
    page_ids: Vec<ObjectId>,
    /// Embedded images (kind + data hash -> PDF object ID)
    embedded_images: HashMap<u64, ObjectId>,
    /// Baseline font dictionary, added on first use
    baseline_font: Option<ObjectId>,
    /// Buffered content operators per page (page index -> operators)
    page_content_buffer: BTreeMap<usize, Vec<u8>>,
}

impl PdfDocument {
    /// Open a PDF document from bytes
    ///
    /// # Arguments
    /// * `data` - PDF file bytes
    pub fn open_from_bytes(data: &[u8]) -> Result<Self> {
        let inner = Document::load_mem(data).map_err(|e| PdfError::LoadError(e.to_string()))?;
        Ok(Self::from_document(inner))
    }

    pub(crate) fn from_document(inner: Document) -> Self {
        let page_ids = inner.get_pages().into_values().collect();
        Self {
            inner,
            page_ids,
            embedded_images: HashMap::new(),
            baseline_font: None,
            page_content_buffer: BTreeMap::new(),
        }
    }

    /// Get the number of pages in the document
    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    fn page_id(&self, page: usize) -> Result<ObjectId> {
        self.page_ids
            .get(page)
            .copied()
            .ok_or(PdfError::PageNotFound(page, self.page_ids.len()))
    }

    /// Visible box of a page
    ///
    /// Uses the MediaBox (inherited if needed), then the CropBox, and falls
    /// back to A4 when neither is usable.
    pub fn page_box(&self, page: usize) -> Result<PageBox> {
        let page_id = self.page_id(page)?;

        for key in [b"MediaBox".as_slice(), b"CropBox".as_slice()] {
            let Some(value) = resolve_inherited(&self.inner, page_id, key) else {
                continue;
            };
            let resolved = deref(&self.inner, value)?;
            if let Some(page_box) = resolved.as_array().ok().and_then(|a| PageBox::from_array(a)) {
                return Ok(page_box);
            }
        }

        log::warn!("Page {page} has no usable MediaBox, assuming A4");
        Ok(DEFAULT_PAGE_BOX)
    }

    /// Page size in points
    pub fn page_size(&self, page: usize) -> Result<PageSize> {
        Ok(self.page_box(page)?.size())
    }

    /// Current `/Rotate` angle of a page, normalized into `[0, 360)`
    ///
    /// Stored angles that are not quarter turns are snapped to the nearest
    /// one.
    pub fn page_rotation(&self, page: usize) -> Result<u16> {
        let page_id = self.page_id(page)?;
        let Some(value) = resolve_inherited(&self.inner, page_id, b"Rotate") else {
            return Ok(0);
        };

        let Some(degrees) = number(deref(&self.inner, value)?) else {
            log::warn!("Page {page} has a non-numeric /Rotate, treating it as 0");
            return Ok(0);
        };

        if !degrees.is_finite() {
            log::warn!("Page {page} has /Rotate {degrees}, treating it as 0");
            return Ok(0);
        }

        // Reduce to a quarter turn count in [0, 4) before leaving f64
        let quarters = (degrees / 90.0).round().rem_euclid(4.0) as i64;
        let snapped = normalize_rotation(quarters * 90);
        if degrees.rem_euclid(90.0) != 0.0 {
            log::warn!("Page {page} has /Rotate {degrees}, snapping to {snapped}");
        }
        Ok(snapped)
    }

    /// Set the absolute `/Rotate` angle of a page
    pub fn set_page_rotation(&mut self, page: usize, angle: u16) -> Result<()> {
        let page_id = self.page_id(page)?;
        let angle = normalize_rotation(angle as i64);
        let page_dict = self.inner.get_object_mut(page_id)?.as_dict_mut()?;
        page_dict.set("Rotate", Object::Integer(angle as i64));
        Ok(())
    }

    /// Draw an image into `rect`, given in points relative to the page box
    pub fn draw_image(
        &mut self,
        page: usize,
        kind: ImageKind,
        data: &[u8],
        rect: DocRect,
    ) -> Result<()> {
        let page_box = self.page_box(page)?;
        let image_id = self.get_or_create_image(kind, data)?;
        let resource_name = self.add_page_resource(page, b"XObject", "Im", image_id)?;

        let operators = generate_image_operators(
            &resource_name,
            page_box.x0 + rect.x,
            page_box.y0 + rect.y,
            rect.width,
            rect.height,
        );
        self.buffer_content(page, &operators);
        Ok(())
    }

    /// Draw text with its first baseline at `(x, y)`, relative to the page box
    ///
    /// Lines are separated by `\n`. Characters the baseline font cannot
    /// encode are drawn as `?`.
    pub fn draw_text(
        &mut self,
        page: usize,
        text: &str,
        x: f64,
        y: f64,
        font_size: f64,
        color: Color,
    ) -> Result<()> {
        let page_box = self.page_box(page)?;

        let mut replaced = 0;
        let lines: Vec<String> = text
            .split('\n')
            .map(|line| {
                let encoded = encode_win_ansi(line.trim_end_matches('\r'));
                replaced += encoded.replaced;
                encoded.to_hex()
            })
            .collect();
        if replaced > 0 {
            log::warn!("{replaced} characters on page {page} are not in WinAnsiEncoding, drawn as '?'");
        }

        let font_id = self.baseline_font_id();
        let ctx = TextRenderContext {
            font_name: self.add_page_resource(page, b"Font", "F", font_id)?,
            font_size,
            color,
        };

        let operators =
            generate_text_operators(&lines, page_box.x0 + x, page_box.y0 + y, &ctx);
        self.buffer_content(page, &operators);
        Ok(())
    }

    /// Save the document to bytes with default options
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        self.to_bytes_with(SaveOptions::default())
    }

    /// Save the document to bytes
    pub fn to_bytes_with(&mut self, options: SaveOptions) -> Result<Vec<u8>> {
        self.flush_content_buffers()?;

        if options.prune {
            let pruned = self.inner.prune_objects();
            if !pruned.is_empty() {
                log::debug!("Pruned {} unreachable objects", pruned.len());
            }
        }
        if options.compress {
            self.inner.compress();
        }

        let mut buffer = Vec::new();
        self.inner
            .save_to(&mut buffer)
            .map_err(|e| PdfError::SerializeError(e.to_string()))?;

        Ok(buffer)
    }

    /// Get a reference to the underlying lopdf document
    pub fn inner(&self) -> &Document {
        &self.inner
    }

    fn baseline_font_id(&mut self) -> ObjectId {
        match self.baseline_font {
            Some(id) => id,
            None => {
                let id = self.inner.add_object(baseline_font_dictionary());
                self.baseline_font = Some(id);
                id
            }
        }
    }

    /// Get or create the image XObject for `data`
    ///
    /// Images are deduplicated by hash of their kind and data.
    fn get_or_create_image(&mut self, kind: ImageKind, data: &[u8]) -> Result<ObjectId> {
        let mut hasher = DefaultHasher::new();
        kind.hash(&mut hasher);
        data.hash(&mut hasher);
        let data_hash = hasher.finish();

        if let Some(&object_id) = self.embedded_images.get(&data_hash) {
            return Ok(object_id);
        }

        let xobject = ImageXObject::from_kind(kind, data)?;
        let smask = xobject
            .to_smask_stream()
            .map(|stream| self.inner.add_object(stream));
        let object_id = self.inner.add_object(xobject.to_pdf_stream(smask));

        self.embedded_images.insert(data_hash, object_id);
        Ok(object_id)
    }

    /// The page's own Resources dictionary, resolved to a direct copy
    ///
    /// Inherited or indirect resources are copied so that new entries never
    /// leak into other pages sharing the same dictionary.
    fn resolved_resources(&self, page_id: ObjectId) -> Result<Dictionary> {
        match resolve_inherited(&self.inner, page_id, b"Resources") {
            Some(value) => match deref(&self.inner, value)? {
                Object::Dictionary(dict) => Ok(dict.clone()),
                _ => Ok(Dictionary::new()),
            },
            None => Ok(Dictionary::new()),
        }
    }

    /// Register `target` under `category` in a page's resources
    ///
    /// Returns the existing name if the page already references `target`,
    /// otherwise the first `{prefix}{n}` not yet taken.
    fn add_page_resource(
        &mut self,
        page: usize,
        category: &[u8],
        prefix: &str,
        target: ObjectId,
    ) -> Result<String> {
        let page_id = self.page_id(page)?;
        let mut resources = self.resolved_resources(page_id)?;

        let mut entries = match resources.get(category) {
            Ok(value) => match deref(&self.inner, value)? {
                Object::Dictionary(dict) => dict.clone(),
                _ => Dictionary::new(),
            },
            Err(_) => Dictionary::new(),
        };

        let existing = entries.iter().find_map(|(name, value)| match value {
            Object::Reference(id) if *id == target => Some(String::from_utf8_lossy(name).into_owned()),
            _ => None,
        });
        if let Some(name) = existing {
            return Ok(name);
        }

        let resource_name = (1..)
            .map(|n| format!("{prefix}{n}"))
            .find(|name| !entries.has(name.as_bytes()))
            .unwrap_or_else(|| prefix.to_string());

        entries.set(resource_name.as_bytes(), Object::Reference(target));
        resources.set(category, Object::Dictionary(entries));

        let page_dict = self.inner.get_object_mut(page_id)?.as_dict_mut()?;
        page_dict.set("Resources", Object::Dictionary(resources));

        Ok(resource_name)
    }

    /// Buffer content operators for a page (written at save time)
    fn buffer_content(&mut self, page: usize, content: &[u8]) {
        self.page_content_buffer
            .entry(page)
            .or_default()
            .extend_from_slice(content);
    }

    /// Flush all buffered content to page streams
    fn flush_content_buffers(&mut self) -> Result<()> {
        let buffers = std::mem::take(&mut self.page_content_buffer);

        for (page, content) in buffers {
            if !content.is_empty() {
                self.append_to_content_stream(page, content)?;
            }
        }

        Ok(())
    }

    /// Append content to a page
    ///
    /// Existing streams are left as they are: the page's Contents becomes
    /// `[q-stream, existing..., Q-and-overlay-stream]`, so the overlay is
    /// drawn with the graphics state restored to its initial value.
    fn append_to_content_stream(&mut self, page: usize, content: Vec<u8>) -> Result<()> {
        let page_id = self.page_id(page)?;

        let existing = {
            let page_dict = self.inner.get_object(page_id)?.as_dict()?;
            match page_dict.get(b"Contents") {
                Ok(contents) => contents.clone(),
                Err(_) => Object::Null,
            }
        };

        let mut streams = Vec::new();
        match existing {
            Object::Reference(id) => match self.inner.get_object(id)? {
                Object::Array(items) => streams.extend(items.iter().cloned()),
                _ => streams.push(Object::Reference(id)),
            },
            Object::Array(items) => streams.extend(items),
            Object::Stream(stream) => streams.push(Object::Reference(self.inner.add_object(stream))),
            _ => {}
        }

        let prefix_id = self
            .inner
            .add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
        let mut suffix = b"Q\n".to_vec();
        suffix.extend_from_slice(&content);
        let suffix_id = self.inner.add_object(Stream::new(Dictionary::new(), suffix));

        let mut contents = Vec::with_capacity(streams.len() + 2);
        contents.push(Object::Reference(prefix_id));
        contents.extend(streams);
        contents.push(Object::Reference(suffix_id));

        let page_dict = self.inner.get_object_mut(page_id)?.as_dict_mut()?;
        page_dict.set("Contents", Object::Array(contents));

        Ok(())
    }
}
