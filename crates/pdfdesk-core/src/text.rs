//! Text rendering utilities

use serde::{Deserialize, Serialize};

/// RGB Color (values 0.0 - 1.0)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    /// Create a new RGB color (values 0.0 - 1.0)
    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Black color
    pub fn black() -> Self {
        Self::rgb(0.0, 0.0, 0.0)
    }

    /// Red color
    pub fn red() -> Self {
        Self::rgb(1.0, 0.0, 0.0)
    }

    /// Copy with every channel clamped into `[0, 1]` (NaN becomes 0)
    pub fn clamped(self) -> Self {
        fn clamp(channel: f32) -> f32 {
            if channel.is_nan() {
                0.0
            } else {
                channel.clamp(0.0, 1.0)
            }
        }
        Self::rgb(clamp(self.r), clamp(self.g), clamp(self.b))
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::black()
    }
}

/// Context for rendering text
pub struct TextRenderContext {
    /// PDF font resource name (e.g., "F1")
    pub font_name: String,
    /// Font size in points
    pub font_size: f64,
    /// Text color (RGB)
    pub color: Color,
}

impl TextRenderContext {
    /// Distance between consecutive baselines
    pub fn leading(&self) -> f64 {
        self.font_size * 1.2
    }
}

/// Generate PDF operators for text insertion
///
/// Each entry of `lines_hex` is one already-encoded hex string (e.g.
/// `"<48656C6C6F>"`). The first baseline sits at `(x, y)`; following lines
/// step down by the context's leading.
pub fn generate_text_operators(
    lines_hex: &[String],
    x: f64,
    y: f64,
    ctx: &TextRenderContext,
) -> Vec<u8> {
    let mut ops = String::new();
    let color = ctx.color.clamped();

    ops.push_str("q\n");
    ops.push_str("BT\n");

    // Non-stroking color
    ops.push_str(&format!("{} {} {} rg\n", color.r, color.g, color.b));

    ops.push_str(&format!("/{} {} Tf\n", ctx.font_name, ctx.font_size));
    ops.push_str(&format!("{} TL\n", ctx.leading()));
    ops.push_str(&format!("{x} {y} Td\n"));

    for (i, line) in lines_hex.iter().enumerate() {
        if i > 0 {
            ops.push_str("T*\n");
        }
        ops.push_str(&format!("{line} Tj\n"));
    }

    ops.push_str("ET\n");
    ops.push_str("Q\n");

    ops.into_bytes()
}
