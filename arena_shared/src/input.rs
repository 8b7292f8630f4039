//! Input vocabulary.
//!
//! Raw signals as delivered by a windowing layer (or a terminal, or a test),
//! and the movement-key set the predictor integrates.

use bitflags::bitflags;

use crate::math::{Rect, Vec2};

bitflags! {
    /// Movement keys currently held.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MoveKeys: u8 {
        const UP = 1 << 0;
        const DOWN = 1 << 1;
        const LEFT = 1 << 2;
        const RIGHT = 1 << 3;
    }
}

impl MoveKeys {
    /// `w`/`s`/`a`/`d` to their movement flag.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "w" => Some(MoveKeys::UP),
            "s" => Some(MoveKeys::DOWN),
            "a" => Some(MoveKeys::LEFT),
            "d" => Some(MoveKeys::RIGHT),
            _ => None,
        }
    }

    /// Unnormalized direction: each held key adds one unit on its axis.
    /// Opposite keys cancel.
    pub fn direction(self) -> Vec2 {
        let mut d = Vec2::ZERO;
        if self.contains(MoveKeys::UP) {
            d.y -= 1.0;
        }
        if self.contains(MoveKeys::DOWN) {
            d.y += 1.0;
        }
        if self.contains(MoveKeys::LEFT) {
            d.x -= 1.0;
        }
        if self.contains(MoveKeys::RIGHT) {
            d.x += 1.0;
        }
        d
    }
}

/// One raw input event. Pointer coordinates are in window (client) space.
#[derive(Debug, Clone, PartialEq)]
pub enum InputSignal {
    KeyDown(String),
    KeyUp(String),
    PointerMove { x: f32, y: f32 },
    /// Right click.
    SecondaryClick { x: f32, y: f32 },
}

/// Where the drawing surface sits on screen and how big it is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceRect(pub Rect);

impl SurfaceRect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self(Rect::new(left, top, width, height))
    }

    /// Window coordinates to surface-local coordinates.
    pub fn to_local(&self, client: Vec2) -> Vec2 {
        client - self.0.pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_sums_axes_independently() {
        assert_eq!(MoveKeys::empty().direction(), Vec2::ZERO);
        assert_eq!((MoveKeys::UP | MoveKeys::RIGHT).direction(), Vec2::new(1.0, -1.0));
        assert_eq!((MoveKeys::LEFT | MoveKeys::RIGHT).direction(), Vec2::ZERO);
        assert_eq!(MoveKeys::all().direction(), Vec2::ZERO);
        assert_eq!(MoveKeys::from_key("a"), Some(MoveKeys::LEFT));
        assert_eq!(MoveKeys::from_key("q"), None);
    }

    #[test]
    fn pointer_translates_by_surface_origin() {
        let s = SurfaceRect::new(100.0, 50.0, 800.0, 600.0);
        assert_eq!(s.to_local(Vec2::new(150.0, 80.0)), Vec2::new(50.0, 30.0));
    }
}
