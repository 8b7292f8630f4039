//! Software RGBA surface.
//!
//! Shapes are rasterized with straight-alpha blending and a pixel-center
//! coverage test. Text is not rasterized; spans are kept so callers can
//! read back what was written and where.

use std::path::Path;

use anyhow::Context;
use arena_shared::{
    math::{Rect, Vec2},
    render::{Color, Surface},
};

/// Text written in the current frame.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub text: String,
    pub at: Vec2,
    pub size_px: f32,
    pub color: Color,
}

#[derive(Debug, Clone)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    pixels: Vec<[u8; 4]>,
    texts: Vec<TextSpan>,
}

impl Framebuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![[0; 4]; width as usize * height as usize],
            texts: Vec::new(),
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(self.index(x, y)).copied()
    }

    pub fn texts(&self) -> &[TextSpan] {
        &self.texts
    }

    /// Binary PPM (P6), composited over black.
    pub fn to_ppm(&self) -> Vec<u8> {
        let mut out = format!("P6\n{} {}\n255\n", self.width, self.height).into_bytes();
        out.reserve(self.pixels.len() * 3);
        for [r, g, b, a] in &self.pixels {
            let k = *a as f32 / 255.0;
            out.extend([r, g, b].map(|c| (*c as f32 * k).round() as u8));
        }
        out
    }

    pub fn save_ppm(&self, path: &Path) -> anyhow::Result<()> {
        std::fs::write(path, self.to_ppm())
            .with_context(|| format!("write frame to {}", path.display()))
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    fn blend(&mut self, x: u32, y: u32, color: Color) {
        let i = self.index(x, y);
        let Some(dst) = self.pixels.get_mut(i) else {
            return;
        };
        let a = color.a.clamp(0.0, 1.0);
        if a >= 1.0 {
            *dst = [color.r, color.g, color.b, 255];
            return;
        }
        let mix = |src: u8, dst: u8| (src as f32 * a + dst as f32 * (1.0 - a)).round() as u8;
        let dst_a = dst[3] as f32 / 255.0;
        *dst = [
            mix(color.r, dst[0]),
            mix(color.g, dst[1]),
            mix(color.b, dst[2]),
            ((a + dst_a * (1.0 - a)) * 255.0).round() as u8,
        ];
    }

    /// Pixel columns and rows whose centers fall inside `[lo, hi)`.
    fn span(lo: f32, hi: f32, limit: u32) -> (u32, u32) {
        let clamp = |v: f32| v.round().clamp(0.0, limit as f32) as u32;
        (clamp(lo), clamp(hi))
    }

    fn each_in_circle(
        &mut self,
        center: Vec2,
        radius: f32,
        color: Color,
        hit: impl Fn(f32) -> bool,
    ) {
        let reach = radius + 1.0;
        let (x0, x1) = Self::span(center.x - reach, center.x + reach, self.width);
        let (y0, y1) = Self::span(center.y - reach, center.y + reach, self.height);
        for y in y0..y1 {
            for x in x0..x1 {
                let d = Vec2::new(x as f32 + 0.5, y as f32 + 0.5) - center;
                if hit(d.len()) {
                    self.blend(x, y, color);
                }
            }
        }
    }
}

impl Surface for Framebuffer {
    fn width(&self) -> f32 {
        self.width as f32
    }

    fn height(&self) -> f32 {
        self.height as f32
    }

    fn clear(&mut self) {
        self.pixels.fill([0; 4]);
        self.texts.clear();
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        let (x0, x1) = Self::span(rect.pos.x, rect.right(), self.width);
        let (y0, y1) = Self::span(rect.pos.y, rect.bottom(), self.height);
        for y in y0..y1 {
            for x in x0..x1 {
                self.blend(x, y, color);
            }
        }
    }

    fn stroke_rect(&mut self, rect: Rect, color: Color) {
        let (x0, x1) = Self::span(rect.pos.x, rect.right(), self.width);
        let (y0, y1) = Self::span(rect.pos.y, rect.bottom(), self.height);
        if x0 >= x1 || y0 >= y1 {
            return;
        }
        for x in x0..x1 {
            self.blend(x, y0, color);
            if y1 - 1 > y0 {
                self.blend(x, y1 - 1, color);
            }
        }
        for y in (y0 + 1)..(y1 - 1).max(y0 + 1) {
            self.blend(x0, y, color);
            if x1 - 1 > x0 {
                self.blend(x1 - 1, y, color);
            }
        }
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color) {
        self.each_in_circle(center, radius, color, |d| d <= radius);
    }

    fn stroke_circle(&mut self, center: Vec2, radius: f32, color: Color) {
        if radius <= 0.0 {
            return;
        }
        self.each_in_circle(center, radius, color, |d| (d - radius).abs() <= 0.5);
    }

    fn fill_text(&mut self, text: &str, at: Vec2, size_px: f32, color: Color) {
        self.texts.push(TextSpan {
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

    const RED: Color = Color::rgb(255, 0, 0);

    #[test]
    fn fill_rect_covers_exact_pixels() {
        let mut fb = Framebuffer::new(8, 8);
        fb.fill_rect(Rect::new(2.0, 3.0, 3.0, 2.0), RED);
        assert_eq!(fb.pixel(2, 3), Some([255, 0, 0, 255]));
        assert_eq!(fb.pixel(4, 4), Some([255, 0, 0, 255]));
        assert_eq!(fb.pixel(5, 4), Some([0, 0, 0, 0]));
        assert_eq!(fb.pixel(2, 5), Some([0, 0, 0, 0]));
        assert_eq!(fb.pixel(8, 0), None);
    }

    #[test]
    fn rect_off_surface_is_clipped() {
        let mut fb = Framebuffer::new(4, 4);
        fb.fill_rect(Rect::new(-10.0, -10.0, 100.0, 100.0), RED);
        fb.stroke_rect(Rect::new(50.0, 50.0, 10.0, 10.0), Color::WHITE);
        assert!(fb.pixels.iter().all(|p| *p == [255, 0, 0, 255]));
    }

    #[test]
    fn translucent_fill_blends() {
        let mut fb = Framebuffer::new(1, 1);
        fb.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), Color::WHITE);
        fb.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), Color::rgba(0, 0, 0, 0.5));
        assert_eq!(fb.pixel(0, 0), Some([128, 128, 128, 255]));
    }

    #[test]
    fn stroke_rect_leaves_interior() {
        let mut fb = Framebuffer::new(6, 6);
        fb.stroke_rect(Rect::new(1.0, 1.0, 4.0, 4.0), RED);
        assert_eq!(fb.pixel(1, 1), Some([255, 0, 0, 255]));
        assert_eq!(fb.pixel(4, 4), Some([255, 0, 0, 255]));
        assert_eq!(fb.pixel(1, 3), Some([255, 0, 0, 255]));
        assert_eq!(fb.pixel(2, 2), Some([0, 0, 0, 0]));
    }

    #[test]
    fn circles_fill_and_ring() {
        let mut fb = Framebuffer::new(20, 20);
        fb.fill_circle(Vec2::new(10.0, 10.0), 3.0, RED);
        assert_eq!(fb.pixel(10, 10), Some([255, 0, 0, 255]));
        assert_eq!(fb.pixel(15, 10), Some([0, 0, 0, 0]));

        fb.clear();
        fb.stroke_circle(Vec2::new(10.0, 10.0), 5.0, RED);
        assert_eq!(fb.pixel(10, 10), Some([0, 0, 0, 0]));
        assert_eq!(fb.pixel(14, 9), Some([255, 0, 0, 255]));
    }

    #[test]
    fn clear_drops_text() {
        let mut fb = Framebuffer::new(2, 2);
        fb.fill_text("hi", Vec2::new(1.0, 1.0), 10.0, Color::WHITE);
        assert_eq!(fb.texts().len(), 1);
        fb.clear();
        assert!(fb.texts().is_empty());
    }

    #[test]
    fn ppm_header_and_body() {
        let mut fb = Framebuffer::new(2, 1);
        fb.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), RED);
        let ppm = fb.to_ppm();
        let header = b"P6\n2 1\n255\n";
        assert_eq!(&ppm[..header.len()], header);
        assert_eq!(&ppm[header.len()..], &[255, 0, 0, 0, 0, 0]);
    }
}
