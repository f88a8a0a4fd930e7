//! Page rotation
//!
//! Pages store an absolute `/Rotate` angle. Requested changes arrive as
//! deltas which are composed with the current angle and normalized into
//! `[0, 360)`.

use crate::document::PdfDocument;
use crate::{PdfError, Result};
use std::collections::BTreeMap;
use std::time::Instant;

/// Normalize any angle into `[0, 360)`
///
/// Uses the Euclidean remainder, so `-90` becomes `270` instead of staying
/// negative.
pub fn normalize_rotation(angle: i64) -> u16 {
    angle.rem_euclid(360) as u16
}

/// A rotation delta that is guaranteed to be a multiple of 90 degrees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RotationDelta(i32);

impl RotationDelta {
    pub const CLOCKWISE: RotationDelta = RotationDelta(90);
    pub const COUNTER_CLOCKWISE: RotationDelta = RotationDelta(-90);

    /// Validate a delta at the boundary
    pub fn new(degrees: i32) -> Result<Self> {
        if degrees % 90 != 0 {
            return Err(PdfError::InvalidRotation(degrees as i64));
        }
        Ok(Self(degrees))
    }

    pub fn degrees(self) -> i32 {
        self.0
    }
}

impl TryFrom<i32> for RotationDelta {
    type Error = PdfError;

    fn try_from(degrees: i32) -> Result<Self> {
        Self::new(degrees)
    }
}

/// Pending rotations keyed by zero-based page index
///
/// Sparse: pages without an entry are left untouched. Deltas recorded for
/// the same page compose, and the stored net delta is kept in `[0, 360)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RotationMap {
    deltas: BTreeMap<usize, u16>,
}

impl RotationMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compose `delta` into the pending rotation of one page
    pub fn rotate_page(&mut self, page: usize, delta: RotationDelta) -> &mut Self {
        let entry = self.deltas.entry(page).or_insert(0);
        *entry = normalize_rotation(*entry as i64 + delta.degrees() as i64);
        self
    }

    /// Compose `delta` into every page of a document with `page_count` pages
    pub fn rotate_all(&mut self, page_count: usize, delta: RotationDelta) -> &mut Self {
        for page in 0..page_count {
            self.rotate_page(page, delta);
        }
        self
    }

    /// Net pending delta for a page, if any was recorded
    pub fn get(&self, page: usize) -> Option<u16> {
        self.deltas.get(&page).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, u16)> + '_ {
        self.deltas.iter().map(|(&page, &delta)| (page, delta))
    }

    pub fn len(&self) -> usize {
        self.deltas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }
}

impl FromIterator<(usize, RotationDelta)> for RotationMap {
    fn from_iter<I: IntoIterator<Item = (usize, RotationDelta)>>(iter: I) -> Self {
        let mut map = RotationMap::new();
        for (page, delta) in iter {
            map.rotate_page(page, delta);
        }
        map
    }
}

/// Apply a rotation map to a PDF and return the re-serialized bytes
///
/// Entries pointing past the end of the document are ignored with a warning.
pub fn rotate_pages(bytes: &[u8], rotations: &RotationMap) -> Result<Vec<u8>> {
    let started = Instant::now();
    let mut doc = PdfDocument::open_from_bytes(bytes)?;
    let page_count = doc.page_count();

    let mut rotated = 0;
    for (page, delta) in rotations.iter() {
        if page >= page_count {
            log::warn!("Ignoring rotation for page index {page} (document has {page_count} pages)");
            continue;
        }

        let current = doc.page_rotation(page)?;
        let angle = normalize_rotation(current as i64 + delta as i64);
        doc.set_page_rotation(page, angle)?;
        rotated += 1;
    }

    let output = doc.to_bytes()?;
    log::info!(
        "Rotated {rotated} of {page_count} pages in {:.1}ms (output {} bytes)",
        started.elapsed().as_secs_f64() * 1000.0,
        output.len()
    );
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_normalize_rotation() {
        assert_eq!(normalize_rotation(0), 0);
        assert_eq!(normalize_rotation(360), 0);
        assert_eq!(normalize_rotation(450), 90);
        assert_eq!(normalize_rotation(-90), 270);
        assert_eq!(normalize_rotation(-450), 270);
    }

    #[test]
    fn test_delta_validation() {
        assert!(RotationDelta::new(90).is_ok());
        assert!(RotationDelta::new(-270).is_ok());
        assert!(RotationDelta::new(0).is_ok());
        assert!(matches!(
            RotationDelta::new(45),
            Err(PdfError::InvalidRotation(45))
        ));
        assert!(RotationDelta::try_from(100).is_err());
    }

    #[test]
    fn test_rotation_map_composes_per_page() {
        let mut map = RotationMap::new();
        map.rotate_page(1, RotationDelta::CLOCKWISE)
            .rotate_page(1, RotationDelta::CLOCKWISE)
            .rotate_page(2, RotationDelta::COUNTER_CLOCKWISE);

        assert_eq!(map.get(0), None);
        assert_eq!(map.get(1), Some(180));
        assert_eq!(map.get(2), Some(270));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_rotate_all_covers_every_page() {
        let mut map = RotationMap::new();
        map.rotate_page(0, RotationDelta::CLOCKWISE);
        map.rotate_all(3, RotationDelta::COUNTER_CLOCKWISE);

        assert_eq!(
            map.iter().collect::<Vec<_>>(),
            vec![(0, 0), (1, 270), (2, 270)]
        );
    }

    #[test]
    fn test_rotation_map_from_iter() {
        let map: RotationMap = [
            (0, RotationDelta::CLOCKWISE),
            (0, RotationDelta::CLOCKWISE),
            (4, RotationDelta::COUNTER_CLOCKWISE),
        ]
        .into_iter()
        .collect();

        assert_eq!(map.get(0), Some(180));
        assert_eq!(map.get(4), Some(270));
    }

    proptest! {
        #[test]
        fn prop_composition_is_associative(
            start in -8i64..8,
            a in -8i32..8,
            b in -8i32..8,
        ) {
            let start = start * 90;
            let (a, b) = (a * 90, b * 90);
            let stepwise = normalize_rotation(normalize_rotation(start + a as i64) as i64 + b as i64);
            let combined = normalize_rotation(start + normalize_rotation((a + b) as i64) as i64);
            prop_assert_eq!(stepwise, combined);
            prop_assert!(stepwise < 360 && stepwise % 90 == 0);
        }
    }
}
