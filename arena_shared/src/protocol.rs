//! Named events exchanged with the game server.
//!
//! On the wire every event is an envelope `{"event": <name>, "data": <payload>}`
//! (see [`crate::net::Envelope`]). The enums below are the typed views of
//! those envelopes in each direction.

use serde::{Deserialize, Serialize};

use crate::world::{Actor, ChatLine, LobbyEntry, Snapshot};

/// Event names, client -> server.
pub mod outbound {
    pub const JOIN: &str = "join";
    pub const PLAYER_UPDATE: &str = "player_update";
    pub const SHOOT: &str = "shoot";
    pub const SKILL: &str = "skill";
    pub const CHAT: &str = "chat";
}

/// Event names, server -> client.
pub mod inbound {
    pub const JOINED: &str = "joined";
    pub const GAME_STATE: &str = "game_state";
    pub const GAME_OVER: &str = "game_over";
    pub const LOBBY_UPDATE: &str = "lobby_update";
    pub const CHAT: &str = "chat";
}

/// Match type chosen from the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    /// Against other players.
    Pvp,
    /// Against the computer.
    #[default]
    Pve,
}

impl std::str::FromStr for GameMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pvp" => Ok(GameMode::Pvp),
            "pve" => Ok(GameMode::Pve),
            other => Err(format!("unknown game mode: {other}")),
        }
    }
}

impl std::fmt::Display for GameMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameMode::Pvp => f.write_str("pvp"),
            GameMode::Pve => f.write_str("pve"),
        }
    }
}

/// Skill bound to one of the three skill keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillKey {
    Q,
    E,
    R,
}

impl SkillKey {
    /// Maps a key identifier to a skill, if it is one of the skill keys.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "q" => Some(SkillKey::Q),
            "e" => Some(SkillKey::E),
            "r" => Some(SkillKey::R),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinRequest {
    pub name: String,
    pub mode: GameMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerUpdate {
    pub x: f32,
    pub y: f32,
    pub angle: f32,
}

/// Basic shot. `x`/`y` is the shooter's center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShotCommand {
    pub x: f32,
    pub y: f32,
    pub angle: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillCommand {
    pub skill: SkillKey,
    pub x: f32,
    pub y: f32,
    pub angle: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSend {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameOver {
    pub winner: String,
}

/// Client -> server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    Join(JoinRequest),
    PlayerUpdate(PlayerUpdate),
    Shoot(ShotCommand),
    Skill(SkillCommand),
    Chat(ChatSend),
}

impl ClientEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::Join(_) => outbound::JOIN,
            ClientEvent::PlayerUpdate(_) => outbound::PLAYER_UPDATE,
            ClientEvent::Shoot(_) => outbound::SHOOT,
            ClientEvent::Skill(_) => outbound::SKILL,
            ClientEvent::Chat(_) => outbound::CHAT,
        }
    }
}

/// Server -> client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    Joined(Actor),
    GameState(Snapshot),
    GameOver(GameOver),
    LobbyUpdate(Vec<LobbyEntry>),
    Chat(ChatLine),
}

impl ServerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::Joined(_) => inbound::JOINED,
            ServerEvent::GameState(_) => inbound::GAME_STATE,
            ServerEvent::GameOver(_) => inbound::GAME_OVER,
            ServerEvent::LobbyUpdate(_) => inbound::LOBBY_UPDATE,
            ServerEvent::Chat(_) => inbound::CHAT,
        }
    }
}
