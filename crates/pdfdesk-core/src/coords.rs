//! Screen space to PDF space mapping
//!
//! The UI renders a page at an arbitrary pixel width with the origin at the
//! top-left corner and Y growing downward. PDF user space has the origin at
//! the bottom-left corner, Y growing upward, and is measured in points. The
//! only link between the two is the ratio `page_width / rendered_width`.

use crate::{PdfError, Result};
use serde::{Deserialize, Serialize};

/// Page size in PDF points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Rectangle in rendered pixels, anchored at its top-left corner
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScreenRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ScreenRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Rectangle in PDF points, anchored at its bottom-left corner
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DocRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Maps placements between screen space and the space of one page
///
/// Holds no state beyond the scale factor and page height, so a mapper can be
/// built per placement without cost.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    scale: f64,
    page_height: f64,
}

impl CoordinateMapper {
    /// Create a mapper for a page rendered `rendered_width` pixels wide
    ///
    /// Fails with `InvalidRenderedWidth` for zero, negative or non-finite
    /// widths, which would otherwise produce infinite or NaN coordinates.
    pub fn new(page: PageSize, rendered_width: f64) -> Result<Self> {
        if !rendered_width.is_finite() || rendered_width <= 0.0 {
            return Err(PdfError::InvalidRenderedWidth(rendered_width));
        }

        Ok(Self {
            scale: page.width / rendered_width,
            page_height: page.height,
        })
    }

    /// Points per rendered pixel
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Convert a length (font size, width, height) from pixels to points
    pub fn to_points(&self, pixels: f64) -> f64 {
        pixels * self.scale
    }

    /// Map a top-left anchored screen rectangle to a bottom-left anchored
    /// page rectangle
    ///
    /// For text the rectangle height is the on-screen font size; the glyph
    /// box is approximated by the font size rather than real ascent/descent.
    pub fn to_document(&self, rect: ScreenRect) -> DocRect {
        let width = rect.width * self.scale;
        let height = rect.height * self.scale;

        DocRect {
            x: rect.x * self.scale,
            y: self.page_height - (rect.y * self.scale) - height,
            width,
            height,
        }
    }

    /// Inverse of [`CoordinateMapper::to_document`]
    pub fn to_screen(&self, rect: DocRect) -> ScreenRect {
        ScreenRect {
            x: rect.x / self.scale,
            y: (self.page_height - rect.y - rect.height) / self.scale,
            width: rect.width / self.scale,
            height: rect.height / self.scale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LETTER: PageSize = PageSize {
        width: 612.0,
        height: 792.0,
    };

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn test_identity_scale_flips_y() {
        let mapper = CoordinateMapper::new(LETTER, 612.0).unwrap();
        let doc = mapper.to_document(ScreenRect::new(100.0, 50.0, 200.0, 100.0));

        assert_eq!(mapper.scale(), 1.0);
        assert_eq!(doc.x, 100.0);
        assert_eq!(doc.y, 792.0 - 50.0 - 100.0);
        assert_eq!(doc.width, 200.0);
        assert_eq!(doc.height, 100.0);
    }

    #[test]
    fn test_half_size_render_doubles_lengths() {
        // Page rendered at 306px wide: every pixel is two points
        let mapper = CoordinateMapper::new(LETTER, 306.0).unwrap();
        let doc = mapper.to_document(ScreenRect::new(10.0, 20.0, 30.0, 40.0));

        assert_eq!(doc.x, 20.0);
        assert_eq!(doc.width, 60.0);
        assert_eq!(doc.height, 80.0);
        assert_eq!(doc.y, 792.0 - 40.0 - 80.0);
    }

    #[test]
    fn test_text_box_uses_font_size_as_height() {
        let mapper = CoordinateMapper::new(LETTER, 800.0).unwrap();
        let font_size = 24.0;
        let doc = mapper.to_document(ScreenRect::new(0.0, 0.0, 0.0, font_size));

        let scale = 612.0 / 800.0;
        assert_close(doc.y, 792.0 - font_size * scale);
        assert_close(mapper.to_points(font_size), font_size * scale);
    }

    #[test]
    fn test_round_trip() {
        let mapper = CoordinateMapper::new(PageSize::new(595.28, 841.89), 917.0).unwrap();
        let screen = ScreenRect::new(123.4, 567.8, 90.1, 23.4);
        let back = mapper.to_screen(mapper.to_document(screen));

        assert_close(back.x, screen.x);
        assert_close(back.y, screen.y);
        assert_close(back.width, screen.width);
        assert_close(back.height, screen.height);
    }

    #[test]
    fn test_rejects_bad_rendered_width() {
        for width in [0.0, -10.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                CoordinateMapper::new(LETTER, width),
                Err(PdfError::InvalidRenderedWidth(_))
            ));
        }
    }
}
