//! Drawing-surface abstraction.
//!
//! No graphics backend here.
//! The renderer issues a small set of 2D primitives against [`Surface`];
//! backends decide how (or whether) those become pixels.

use crate::math::{Rect, Vec2};

/// sRGB color with straight alpha in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn is_opaque(&self) -> bool {
        self.a >= 1.0
    }
}

/// Minimal 2D drawing API, in surface pixels.
pub trait Surface: Send {
    fn width(&self) -> f32;
    fn height(&self) -> f32;
    /// Erases the whole surface to transparent.
    fn clear(&mut self);
    fn fill_rect(&mut self, rect: Rect, color: Color);
    /// One-pixel outline.
    fn stroke_rect(&mut self, rect: Rect, color: Color);
    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color);
    /// One-pixel outline.
    fn stroke_circle(&mut self, center: Vec2, radius: f32, color: Color);
    /// `at` is the left end of the text baseline.
    fn fill_text(&mut self, text: &str, at: Vec2, size_px: f32, color: Color);
}

/// One recorded primitive.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Clear,
    FillRect { rect: Rect, color: Color },
    StrokeRect { rect: Rect, color: Color },
    FillCircle { center: Vec2, radius: f32, color: Color },
    StrokeCircle { center: Vec2, radius: f32, color: Color },
    Text { text: String, at: Vec2, size_px: f32, color: Color },
}

/// Surface that records the current frame's primitives. Headless tests and
/// diagnostics use it to inspect exactly what a render pass produced.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    width: f32,
    height: f32,
    ops: Vec<DrawOp>,
}

impl RecordingSurface {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            ops: Vec::new(),
        }
    }

    /// Primitives since the last `clear`, starting with the `Clear` itself.
    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn fills(&self) -> impl Iterator<Item = (&Rect, &Color)> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::FillRect { rect, color } => Some((rect, color)),
            _ => None,
        })
    }
}

impl Surface for RecordingSurface {
    fn width(&self) -> f32 {
        self.width
    }

    fn height(&self) -> f32 {
        self.height
    }

    fn clear(&mut self) {
        self.ops.clear();
        self.ops.push(DrawOp::Clear);
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.ops.push(DrawOp::FillRect { rect, color });
    }

    fn stroke_rect(&mut self, rect: Rect, color: Color) {
        self.ops.push(DrawOp::StrokeRect { rect, color });
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color) {
        self.ops.push(DrawOp::FillCircle {
            center,
            radius,
            color,
        });
    }

    fn stroke_circle(&mut self, center: Vec2, radius: f32, color: Color) {
        self.ops.push(DrawOp::StrokeCircle {
            center,
            radius,
            color,
        });
    }

    fn fill_text(&mut self, text: &str, at: Vec2, size_px: f32, color: Color) {
        self.ops.push(DrawOp::Text {
            text: text.to_string(),
            at,
            size_px,
            color,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_starts_a_new_frame() {
        let mut s = RecordingSurface::new(800.0, 600.0);
        s.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), Color::BLACK);
        s.clear();
        s.fill_text("hi", Vec2::ZERO, 10.0, Color::WHITE);
        assert_eq!(s.ops().len(), 2);
        assert_eq!(s.ops()[0], DrawOp::Clear);
        assert_eq!(s.texts().collect::<Vec<_>>(), vec!["hi"]);
        assert_eq!(s.fills().count(), 0);
    }
}
