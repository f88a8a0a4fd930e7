//! Page tree helpers shared by merge and extract
//!
//! Pages are copied between documents by renumbering every object of the
//! source past the destination's highest object id, then hanging the copied
//! page dictionaries under one fresh `/Pages` node.

use crate::{PdfError, Result};
use lopdf::{dictionary, Document, Object, ObjectId};
use std::collections::HashSet;

/// Attributes a page may inherit from its ancestors in the page tree
pub(crate) const INHERITABLE_KEYS: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

/// Parent chains deeper than this are treated as broken
const MAX_TREE_DEPTH: usize = 32;

/// Look up `key` on a page, walking up the `/Parent` chain when needed
///
/// Returns the stored object as-is, which may still be a reference.
pub(crate) fn resolve_inherited<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Option<&'a Object> {
    let mut current = page_id;
    for _ in 0..MAX_TREE_DEPTH {
        let dict = doc.get_object(current).ok()?.as_dict().ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(value);
        }
        current = dict.get(b"Parent").ok()?.as_reference().ok()?;
    }
    None
}

/// Follow a reference to the object it points at
pub(crate) fn deref<'a>(doc: &'a Document, object: &'a Object) -> Result<&'a Object> {
    match object {
        Object::Reference(id) => Ok(doc.get_object(*id)?),
        other => Ok(other),
    }
}

/// Numeric value of an integer or real object
pub(crate) fn number(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(value) => Some(*value as f64),
        Object::Real(value) => Some(*value as f64),
        _ => None,
    }
}

/// Copy inherited attributes onto the page dictionary itself
///
/// A copied page loses its original ancestors, so anything it inherited has
/// to live on the page before the copy.
pub(crate) fn materialize_inherited(doc: &mut Document, page_id: ObjectId) -> Result<()> {
    let mut inherited = Vec::new();
    {
        let page = doc.get_object(page_id)?.as_dict()?;
        for key in INHERITABLE_KEYS {
            if page.has(key) {
                continue;
            }
            if let Some(value) = resolve_inherited(doc, page_id, key) {
                inherited.push((key, value.clone()));
            }
        }
    }

    if inherited.is_empty() {
        return Ok(());
    }

    let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
    for (key, value) in inherited {
        page.set(key, value);
    }
    Ok(())
}

/// Recursively shift every reference in an object by `offset`
fn remap_object_refs(object: &mut Object, offset: u32) {
    match object {
        Object::Reference(id) => id.0 += offset,
        Object::Array(items) => {
            for item in items {
                remap_object_refs(item, offset);
            }
        }
        Object::Dictionary(dict) => {
            for (_, value) in dict.iter_mut() {
                remap_object_refs(value, offset);
            }
        }
        Object::Stream(stream) => {
            for (_, value) in stream.dict.iter_mut() {
                remap_object_refs(value, offset);
            }
        }
        _ => {}
    }
}

/// Builds a new document out of pages copied from other documents
pub(crate) struct PageTreeBuilder {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
}

impl PageTreeBuilder {
    pub(crate) fn new() -> Self {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            kids: Vec::new(),
        }
    }

    /// Number of pages appended so far
    pub(crate) fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Append the pages at `indices` (zero-based, in the given order)
    ///
    /// Every index is checked before anything is copied, so a failing call
    /// leaves the builder untouched.
    pub(crate) fn append_pages(&mut self, mut source: Document, indices: &[usize]) -> Result<()> {
        let source_pages: Vec<ObjectId> = source.get_pages().into_values().collect();
        let total = source_pages.len();

        let selected = indices
            .iter()
            .map(|&index| {
                source_pages
                    .get(index)
                    .copied()
                    .ok_or(PdfError::PageNotFound(index, total))
            })
            .collect::<Result<Vec<_>>>()?;

        for &page_id in &selected {
            materialize_inherited(&mut source, page_id)?;
        }

        let offset = self.doc.max_id;
        let source_max = source
            .objects
            .keys()
            .map(|id| id.0)
            .max()
            .unwrap_or(0)
            .max(source.max_id);

        for (id, mut object) in std::mem::take(&mut source.objects) {
            remap_object_refs(&mut object, offset);
            self.doc.objects.insert((id.0 + offset, id.1), object);
        }
        self.doc.max_id = offset + source_max;

        let mut seen = HashSet::new();
        for page_id in selected {
            let mut new_id = (page_id.0 + offset, page_id.1);
            // The same page may be selected twice; the tree needs distinct nodes
            if !seen.insert(new_id) {
                let copy = self.doc.get_object(new_id)?.clone();
                new_id = self.doc.add_object(copy);
            }

            let page = self.doc.get_object_mut(new_id)?.as_dict_mut()?;
            page.set("Parent", Object::Reference(self.pages_id));
            self.kids.push(Object::Reference(new_id));
        }

        Ok(())
    }

    /// Write the page tree root and catalog, and return the document
    pub(crate) fn finish(mut self) -> Document {
        let count = self.kids.len() as i64;
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => self.kids,
                "Count" => count,
            }),
        );

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);
        self.doc
    }
}
