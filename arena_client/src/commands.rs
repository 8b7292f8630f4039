//! Command emission.
//!
//! Turns predicted state and input triggers into outbound protocol events.
//! The only rate limit is the shot cooldown; position updates go out every
//! tick and skills are not gated on the client.

use std::time::{Duration, Instant};

use arena_shared::{
    math::Vec2,
    protocol::{
        ChatSend, ClientEvent, GameMode, JoinRequest, PlayerUpdate, ShotCommand, SkillCommand,
        SkillKey,
    },
    world::Actor,
};
use tracing::trace;

use crate::input::Trigger;

/// Default minimum gap between two emitted shots.
pub const SHOT_COOLDOWN: Duration = Duration::from_millis(500);

/// Destination for outbound events. Sending never blocks and never fails
/// from the caller's point of view.
pub trait EventSink {
    fn send(&mut self, event: ClientEvent);
}

/// Collects events in memory; handy for driving a session without a peer.
impl EventSink for Vec<ClientEvent> {
    fn send(&mut self, event: ClientEvent) {
        self.push(event);
    }
}

#[derive(Debug, Clone)]
pub struct CommandEmitter {
    shot_cooldown: Duration,
    last_shot: Option<Instant>,
}

impl Default for CommandEmitter {
    fn default() -> Self {
        Self::new(SHOT_COOLDOWN)
    }
}

impl CommandEmitter {
    pub fn new(shot_cooldown: Duration) -> Self {
        Self {
            shot_cooldown,
            last_shot: None,
        }
    }

    pub fn join(&self, sink: &mut dyn EventSink, name: &str, mode: GameMode) {
        sink.send(ClientEvent::Join(JoinRequest {
            name: name.to_string(),
            mode,
        }));
    }

    /// Reports the local actor's position and facing. Sent every tick.
    pub fn player_update(&self, sink: &mut dyn EventSink, actor: &Actor) {
        sink.send(ClientEvent::PlayerUpdate(PlayerUpdate {
            x: actor.x,
            y: actor.y,
            angle: actor.angle,
        }));
    }

    /// Whether a shot at `now` would pass the cooldown gate.
    pub fn can_shoot(&self, now: Instant) -> bool {
        match self.last_shot {
            Some(last) => now.saturating_duration_since(last) >= self.shot_cooldown,
            None => true,
        }
    }

    /// Emits a shot unless one went out less than the cooldown ago. Dropped
    /// shots are not queued. Returns whether the shot was sent.
    pub fn shoot(
        &mut self,
        sink: &mut dyn EventSink,
        origin: Vec2,
        angle: f32,
        now: Instant,
    ) -> bool {
        if !self.can_shoot(now) {
            trace!("shot dropped by cooldown");
            return false;
        }
        self.last_shot = Some(now);
        sink.send(ClientEvent::Shoot(ShotCommand {
            x: origin.x,
            y: origin.y,
            angle,
        }));
        true
    }

    /// Emits a skill immediately; no client-side cooldown.
    pub fn skill(&self, sink: &mut dyn EventSink, skill: SkillKey, origin: Vec2, angle: f32) {
        sink.send(ClientEvent::Skill(SkillCommand {
            skill,
            x: origin.x,
            y: origin.y,
            angle,
        }));
    }

    /// Routes an input trigger. Returns whether an event was sent.
    pub fn trigger(&mut self, sink: &mut dyn EventSink, trigger: Trigger, now: Instant) -> bool {
        match trigger {
            Trigger::Shoot { origin, angle } => self.shoot(sink, origin, angle, now),
            Trigger::Skill {
                skill,
                origin,
                angle,
            } => {
                self.skill(sink, skill, origin, angle);
                true
            }
        }
    }

    /// Sends a chat line. Empty messages are not sent.
    pub fn chat(&self, sink: &mut dyn EventSink, message: &str) -> bool {
        if message.is_empty() {
            return false;
        }
        sink.send(ClientEvent::Chat(ChatSend {
            message: message.to_string(),
        }));
        true
    }

    /// Forgets the last shot time.
    pub fn reset(&mut self) {
        self.last_shot = None;
    }
}
