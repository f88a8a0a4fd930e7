//! JSON overlay plans for the `overlay` command
//!
//! A plan records the width the pages were rendered at and the placements
//! made on them. Page indices are zero-based and positions are in rendered
//! pixels, exactly as the engine takes them. Images are referenced by path,
//! resolved against the directory containing the plan.
//!
//! ```json
//! {
//!   "rendered_width": 800,
//!   "overlays": [
//!     { "type": "image", "page": 0, "x": 40, "y": 40, "width": 120, "height": 60, "path": "logo.png" },
//!     { "type": "text", "page": 1, "x": 50, "y": 700, "size": 14, "text": "Approved",
//!       "color": { "r": 0.8, "g": 0.0, "b": 0.0 } }
//!   ]
//! }
//! ```

use anyhow::{bail, Context, Result};
use pdfdesk_core::{ImageKind, ImageOverlay, Overlay, ScreenRect, TextOverlay};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Overlay plan as stored on disk
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OverlayPlan {
    /// Pixel width the pages were rendered at when placing overlays
    pub rendered_width: f64,
    #[serde(default)]
    pub overlays: Vec<PlacementSpec>,
}

/// One placement in a plan
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PlacementSpec {
    Image {
        page: usize,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        path: PathBuf,
        /// Declared MIME type; guessed from the extension or content if absent
        #[serde(default)]
        mime: Option<String>,
    },
    Text(TextOverlay),
}

/// Parse an overlay plan from JSON
pub fn parse_overlay_plan(json: &str) -> Result<OverlayPlan> {
    let plan: OverlayPlan = serde_json::from_str(json).context("Invalid overlay plan")?;
    if !plan.rendered_width.is_finite() || plan.rendered_width <= 0.0 {
        bail!(
            "Overlay plan rendered_width must be positive, got {}",
            plan.rendered_width
        );
    }
    Ok(plan)
}

impl OverlayPlan {
    /// Load image payloads and build engine overlays
    pub fn into_overlays(self, base_dir: &Path) -> Result<Vec<Overlay>> {
        self.overlays
            .into_iter()
            .map(|spec| spec.into_overlay(base_dir))
            .collect()
    }
}

impl PlacementSpec {
    fn into_overlay(self, base_dir: &Path) -> Result<Overlay> {
        match self {
            PlacementSpec::Text(text) => Ok(Overlay::Text(text)),
            PlacementSpec::Image {
                page,
                x,
                y,
                width,
                height,
                path,
                mime,
            } => {
                let path = base_dir.join(path);
                let data = fs::read(&path)
                    .with_context(|| format!("Failed to read image {}", path.display()))?;
                let kind = image_kind(&path, mime.as_deref(), &data)?;
                log::debug!(
                    "Loaded {} as {} ({} bytes)",
                    path.display(),
                    kind.mime(),
                    data.len()
                );

                Ok(Overlay::Image(ImageOverlay::new(
                    page,
                    ScreenRect::new(x, y, width, height),
                    kind,
                    data,
                )))
            }
        }
    }
}

/// Pick the image kind from the declared MIME type, the extension, or the
/// file signature, in that order
fn image_kind(path: &Path, mime: Option<&str>, data: &[u8]) -> Result<ImageKind> {
    if let Some(mime) = mime {
        return Ok(ImageKind::from_mime(mime)?);
    }

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("png") => Ok(ImageKind::Png),
        Some("jpg" | "jpeg") => Ok(ImageKind::Jpeg),
        _ => ImageKind::detect(data)
            .with_context(|| format!("Cannot tell the image type of {}", path.display())),
    }
}
