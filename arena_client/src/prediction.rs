//! Local movement prediction.
//!
//! The local actor moves as soon as keys are held; the server is told where
//! the actor now is rather than asked for permission. The movement rule sits
//! behind [`MovementModel`] so a server-reconciling model can replace it
//! without touching input or rendering.

use arena_shared::{
    input::MoveKeys,
    math::Vec2,
    world::{Actor, ACTOR_SIZE},
};

/// Advances the local actor by one tick.
pub trait MovementModel: Send {
    /// Moves `actor` according to `keys` inside a `bounds` (width, height)
    /// surface. Returns the displacement actually applied.
    fn step(&mut self, actor: &mut Actor, keys: MoveKeys, bounds: Vec2) -> Vec2;
}

/// Client-authoritative integrator: fixed speed in the held direction,
/// clamped to the surface.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalPredictor;

impl LocalPredictor {
    /// Per-tick displacement for `keys` at `speed`. Any non-zero direction,
    /// diagonals included, has magnitude exactly `speed`.
    pub fn displacement(keys: MoveKeys, speed: f32) -> Vec2 {
        keys.direction().with_len(speed)
    }

    /// Keeps the actor's box fully on the surface.
    pub fn clamp_to_bounds(pos: Vec2, bounds: Vec2) -> Vec2 {
        let max_x = (bounds.x - ACTOR_SIZE).max(0.0);
        let max_y = (bounds.y - ACTOR_SIZE).max(0.0);
        Vec2::new(pos.x.clamp(0.0, max_x), pos.y.clamp(0.0, max_y))
    }
}

impl MovementModel for LocalPredictor {
    fn step(&mut self, actor: &mut Actor, keys: MoveKeys, bounds: Vec2) -> Vec2 {
        let before = actor.pos();
        let delta = Self::displacement(keys, actor.effective_speed());
        let after = Self::clamp_to_bounds(before + delta, bounds);
        actor.set_pos(after);
        after - before
    }
}
