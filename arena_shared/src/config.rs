//! Configuration system.
//!
//! Loads client configuration from JSON strings/files. Every field has a
//! default, so a partial file only overrides what it names.

use serde::{Deserialize, Serialize};

use crate::protocol::GameMode;

/// Which source the local actor's sprite is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocalSprite {
    /// Locally predicted position and angle, matched by actor id.
    #[default]
    Predicted,
    /// Whatever the latest snapshot says.
    Snapshot,
}

/// Root client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Server address, e.g. `127.0.0.1:5000`.
    pub server_addr: String,
    /// Render/tick rate of the local loop.
    pub tick_hz: u32,
    /// Drawing surface size in pixels. Bounds the local actor.
    pub surface_width: u32,
    pub surface_height: u32,
    /// On-screen origin of the surface; pointer input is translated by it.
    pub surface_left: f32,
    pub surface_top: f32,
    /// Default display name when none is given at join time.
    pub player_name: String,
    pub mode: GameMode,
    /// Minimum time between two emitted shots.
    pub shot_cooldown_ms: u64,
    pub local_sprite: LocalSprite,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_addr: "127.0.0.1:5000".to_string(),
            tick_hz: 60,
            surface_width: 800,
            surface_height: 600,
            surface_left: 0.0,
            surface_top: 0.0,
            player_name: DEFAULT_PLAYER_NAME.to_string(),
            mode: GameMode::Pve,
            shot_cooldown_ms: 500,
            local_sprite: LocalSprite::Predicted,
        }
    }
}

/// Fallback display name.
pub const DEFAULT_PLAYER_NAME: &str = "Player";

impl ClientConfig {
    /// Parses config from JSON.
    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    pub fn shot_cooldown(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.shot_cooldown_ms)
    }

    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(1.0 / self.tick_hz.max(1) as f64)
    }
}
