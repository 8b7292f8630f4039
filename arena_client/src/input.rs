//! Input handling.
//!
//! Tracks which keys are held and where the pointer is on the drawing
//! surface, and turns discrete signals into action triggers. Triggers carry
//! everything the command layer needs; rate limiting happens there, not here.

use std::collections::HashMap;

use arena_shared::{
    input::{InputSignal, MoveKeys, SurfaceRect},
    math::Vec2,
    protocol::SkillKey,
    world::Actor,
};

/// A discrete action produced by input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Trigger {
    /// Fire towards `angle` from the actor's center.
    Shoot { origin: Vec2, angle: f32 },
    /// Use a skill along the actor's stored facing.
    Skill {
        skill: SkillKey,
        origin: Vec2,
        angle: f32,
    },
}

/// Held-key map plus pointer position in surface space.
#[derive(Debug, Clone)]
pub struct InputController {
    held: HashMap<String, bool>,
    pointer: Vec2,
    surface: SurfaceRect,
}

impl InputController {
    pub fn new(surface: SurfaceRect) -> Self {
        Self {
            held: HashMap::new(),
            pointer: Vec2::ZERO,
            surface,
        }
    }

    /// Applies one signal. `local` is the local actor if the session has one;
    /// pointer movement updates its facing.
    pub fn handle(&mut self, signal: InputSignal, local: Option<&mut Actor>) -> Option<Trigger> {
        match signal {
            InputSignal::KeyDown(key) => {
                let skill = SkillKey::from_key(&key);
                self.held.insert(key, true);
                let actor = local?;
                skill.map(|skill| Trigger::Skill {
                    skill,
                    origin: actor.center(),
                    angle: actor.angle,
                })
            }
            InputSignal::KeyUp(key) => {
                self.held.insert(key, false);
                None
            }
            InputSignal::PointerMove { x, y } => {
                self.pointer = self.surface.to_local(Vec2::new(x, y));
                if let Some(actor) = local {
                    let angle = actor.center().angle_to(self.pointer);
                    actor.set_angle(angle);
                }
                None
            }
            InputSignal::SecondaryClick { x, y } => {
                self.pointer = self.surface.to_local(Vec2::new(x, y));
                let actor = local?;
                let origin = actor.center();
                Some(Trigger::Shoot {
                    origin,
                    angle: origin.angle_to(self.pointer),
                })
            }
        }
    }

    pub fn is_held(&self, key: &str) -> bool {
        self.held.get(key).copied().unwrap_or(false)
    }

    /// Held movement keys as a flag set.
    pub fn move_keys(&self) -> MoveKeys {
        self.held
            .iter()
            .filter(|(_, down)| **down)
            .filter_map(|(key, _)| MoveKeys::from_key(key))
            .fold(MoveKeys::empty(), |acc, k| acc | k)
    }

    /// Last pointer position, surface-local.
    pub fn pointer(&self) -> Vec2 {
        self.pointer
    }

    /// Forgets all held keys, e.g. when the session is torn down.
    pub fn release_all(&mut self) {
        self.held.clear();
    }
}
