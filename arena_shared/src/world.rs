//! World model as broadcast by the server.
//!
//! Every type here deserializes straight from the wire payloads. Numeric
//! fields the server may send as floats (health after fractional damage,
//! explosion timers) are read leniently and clamped into their documented
//! ranges, so a decoded value always satisfies the model invariants.

use serde::{Deserialize, Deserializer, Serialize};

use crate::math::{wrap_angle, Rect, Vec2};

/// Side length of the square actor bounding box.
pub const ACTOR_SIZE: f32 = 40.0;
/// Offset from an actor's top-left corner to its center.
pub const ACTOR_CENTER_OFFSET: Vec2 = Vec2::new(ACTOR_SIZE / 2.0, ACTOR_SIZE / 2.0);
/// Movement speed used when the server does not send one.
pub const DEFAULT_SPEED: f32 = 3.0;
pub const MAX_HEALTH: u8 = 100;
/// Obstacles below this health draw a damage overlay.
pub const OBSTACLE_DAMAGED_BELOW: i32 = 50;
/// Explosion radius at timer zero.
pub const EXPLOSION_START_RADIUS: u32 = 30;

/// Server-assigned actor identity (socket id, or `AI_xxxx` for bots).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(pub String);

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The two factions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    Blue,
    Red,
}

impl std::fmt::Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Team::Blue => f.write_str("blue"),
            Team::Red => f.write_str("red"),
        }
    }
}

/// A player avatar, local or remote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    #[serde(default)]
    pub sid: ActorId,
    pub name: String,
    pub team: Team,
    /// Top-left corner of the bounding box.
    pub x: f32,
    pub y: f32,
    #[serde(default, deserialize_with = "de_angle")]
    pub angle: f32,
    #[serde(default = "full_health", deserialize_with = "de_health")]
    pub health: u8,
    #[serde(default = "default_speed")]
    pub speed: f32,
    #[serde(default)]
    pub lives: i32,
    #[serde(default)]
    pub xp: u32,
    #[serde(default = "first_level")]
    pub level: u32,
}

impl Actor {
    pub fn new(sid: &str, name: &str, team: Team, pos: Vec2) -> Self {
        Self {
            sid: ActorId(sid.to_string()),
            name: name.to_string(),
            team,
            x: pos.x,
            y: pos.y,
            angle: 0.0,
            health: MAX_HEALTH,
            speed: DEFAULT_SPEED,
            lives: 3,
            xp: 0,
            level: 1,
        }
    }

    pub fn pos(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn set_pos(&mut self, pos: Vec2) {
        self.x = pos.x;
        self.y = pos.y;
    }

    /// Geometric center of the bounding box; origin for aim and projectiles.
    pub fn center(&self) -> Vec2 {
        self.pos() + ACTOR_CENTER_OFFSET
    }

    /// Speed to integrate with. Non-positive or non-finite values fall back
    /// to the default.
    pub fn effective_speed(&self) -> f32 {
        if self.speed.is_finite() && self.speed > 0.0 {
            self.speed
        } else {
            DEFAULT_SPEED
        }
    }

    pub fn set_angle(&mut self, angle: f32) {
        self.angle = wrap_angle(angle);
    }
}

/// Destructible terrain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(deserialize_with = "de_int")]
    pub health: i32,
}

impl Obstacle {
    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    pub fn is_damaged(&self) -> bool {
        self.health < OBSTACLE_DAMAGED_BELOW
    }
}

/// Visual cover, drawn translucent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bush {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bush {
    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

/// Powerup flavours. Unknown wire names are kept as `Unknown` rather than
/// rejecting the whole snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PowerupKind {
    Speed,
    Shield,
    Damage,
    Health,
    Experience,
    Unknown,
}

impl From<String> for PowerupKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "speed" => PowerupKind::Speed,
            "shield" => PowerupKind::Shield,
            "damage" => PowerupKind::Damage,
            "health" => PowerupKind::Health,
            "xp" | "experience" => PowerupKind::Experience,
            _ => PowerupKind::Unknown,
        }
    }
}

impl From<PowerupKind> for String {
    fn from(kind: PowerupKind) -> Self {
        match kind {
            PowerupKind::Speed => "speed",
            PowerupKind::Shield => "shield",
            PowerupKind::Damage => "damage",
            PowerupKind::Health => "health",
            PowerupKind::Experience => "xp",
            PowerupKind::Unknown => "unknown",
        }
        .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Powerup {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(rename = "type")]
    pub kind: PowerupKind,
}

impl Powerup {
    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bullet {
    pub x: f32,
    pub y: f32,
    /// Set for projectiles fired by a skill. The server sends the skill key
    /// or `null`; any truthy value counts.
    #[serde(default, deserialize_with = "de_truthy")]
    pub skill: bool,
}

impl Bullet {
    pub fn pos(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explosion {
    pub x: f32,
    pub y: f32,
    /// Elapsed ticks since creation.
    #[serde(deserialize_with = "de_ticks")]
    pub timer: u32,
}

impl Explosion {
    pub fn pos(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// `max(0, 30 - timer)`; non-increasing in `timer`.
    pub fn radius(&self) -> f32 {
        EXPLOSION_START_RADIUS.saturating_sub(self.timer) as f32
    }
}

/// One complete server broadcast. Absent or `null` layers decode as empty.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default, deserialize_with = "de_layer")]
    pub obstacles: Vec<Obstacle>,
    #[serde(default, deserialize_with = "de_layer")]
    pub bushes: Vec<Bush>,
    #[serde(default, deserialize_with = "de_layer")]
    pub powerups: Vec<Powerup>,
    #[serde(default, deserialize_with = "de_layer")]
    pub bullets: Vec<Bullet>,
    #[serde(default, deserialize_with = "de_layer")]
    pub explosions: Vec<Explosion>,
    #[serde(default, deserialize_with = "de_layer")]
    pub players: Vec<Actor>,
    /// Remaining match time in seconds.
    #[serde(default)]
    pub time_left: Option<f32>,
}

impl Snapshot {
    pub fn entity_count(&self) -> usize {
        self.obstacles.len()
            + self.bushes.len()
            + self.powerups.len()
            + self.bullets.len()
            + self.explosions.len()
            + self.players.len()
    }
}

/// One row of the lobby roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LobbyEntry {
    pub name: String,
    pub team: Team,
}

/// One broadcast chat line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatLine {
    pub name: String,
    pub message: String,
    /// Unix seconds.
    #[serde(default)]
    pub timestamp: i64,
}

impl ChatLine {
    /// `[HH:MM:SS] name: message`, time in UTC.
    pub fn display(&self) -> String {
        let time = chrono::DateTime::from_timestamp(self.timestamp, 0)
            .map(|t| t.format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "--:--:--".to_string());
        format!("[{}] {}: {}", time, self.name, self.message)
    }
}

fn full_health() -> u8 {
    MAX_HEALTH
}

fn default_speed() -> f32 {
    DEFAULT_SPEED
}

fn first_level() -> u32 {
    1
}

fn de_layer<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(d)?.unwrap_or_default())
}

fn de_angle<'de, D: Deserializer<'de>>(d: D) -> Result<f32, D::Error> {
    Ok(wrap_angle(f32::deserialize(d)?))
}

fn de_health<'de, D: Deserializer<'de>>(d: D) -> Result<u8, D::Error> {
    let raw = f64::deserialize(d)?;
    if raw.is_nan() {
        return Ok(0);
    }
    Ok(raw.clamp(0.0, MAX_HEALTH as f64).floor() as u8)
}

fn de_int<'de, D: Deserializer<'de>>(d: D) -> Result<i32, D::Error> {
    let raw = f64::deserialize(d)?;
    if raw.is_nan() {
        return Ok(0);
    }
    Ok(raw.clamp(i32::MIN as f64, i32::MAX as f64).floor() as i32)
}

fn de_ticks<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    let raw = f64::deserialize(d)?;
    if raw.is_nan() {
        return Ok(0);
    }
    Ok(raw.clamp(0.0, u32::MAX as f64).floor() as u32)
}

fn de_truthy<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    use serde_json::Value;

    Ok(match Value::deserialize(d)? {
        Value::Null => false,
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().map_or(false, |v| v != 0.0 && !v.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn actor_decodes_server_dict() {
        let actor: Actor = serde_json::from_value(json!({
            "sid": "abc", "name": "Ann", "x": 10, "y": 20, "angle": 0,
            "health": 70.0, "lives": 3, "xp": 0, "level": 1, "damage": 20,
            "speed": 3, "mode": "human", "last_shot": 0,
            "cooldowns": {"q": 0, "e": 0, "r": 0}, "inBush": false, "team": "blue"
        }))
        .unwrap();
        assert_eq!(actor.sid, ActorId("abc".into()));
        assert_eq!(actor.team, Team::Blue);
        assert_eq!(actor.pos(), Vec2::new(10.0, 20.0));
        assert_eq!(actor.health, 70);
        assert_eq!(actor.center(), Vec2::new(30.0, 40.0));
    }

    #[test]
    fn actor_health_is_clamped_and_floored() {
        let base = json!({"name": "a", "team": "red", "x": 0, "y": 0});
        let with = |h: f64| {
            let mut v = base.clone();
            v["health"] = json!(h);
            serde_json::from_value::<Actor>(v).unwrap().health
        };
        assert_eq!(with(-30.0), 0);
        assert_eq!(with(45.5), 45);
        assert_eq!(with(250.0), 100);

        let missing: Actor = serde_json::from_value(base).unwrap();
        assert_eq!(missing.health, 100);
        assert_eq!(missing.speed, DEFAULT_SPEED);
        assert_eq!(missing.level, 1);
    }

    #[test]
    fn actor_rejects_unknown_team() {
        let res = serde_json::from_value::<Actor>(
            json!({"name": "a", "team": "green", "x": 0, "y": 0}),
        );
        assert!(res.is_err());
    }

    #[test]
    fn effective_speed_falls_back() {
        let mut a = Actor::new("s", "n", Team::Blue, Vec2::ZERO);
        a.speed = 0.0;
        assert_eq!(a.effective_speed(), DEFAULT_SPEED);
        a.speed = f32::INFINITY;
        assert_eq!(a.effective_speed(), DEFAULT_SPEED);
        a.speed = 4.0;
        assert_eq!(a.effective_speed(), 4.0);
    }

    #[test]
    fn powerup_kind_names() {
        let p: Powerup = serde_json::from_value(
            json!({"x": 1, "y": 2, "width": 20, "height": 20, "type": "xp", "duration": 5000}),
        )
        .unwrap();
        assert_eq!(p.kind, PowerupKind::Experience);
        assert_eq!(PowerupKind::from("experience".to_string()), PowerupKind::Experience);
        assert_eq!(PowerupKind::from("mystery".to_string()), PowerupKind::Unknown);
    }

    #[test]
    fn bullet_skill_flag_is_truthy() {
        let b = |skill: serde_json::Value| {
            serde_json::from_value::<Bullet>(json!({"x": 0, "y": 0, "skill": skill}))
                .unwrap()
                .skill
        };
        assert!(!b(json!(null)));
        assert!(!b(json!("")));
        assert!(!b(json!(false)));
        assert!(b(json!("q")));
        assert!(b(json!(true)));
        let absent: Bullet = serde_json::from_value(json!({"x": 0, "y": 0})).unwrap();
        assert!(!absent.skill);
    }

    #[test]
    fn explosion_radius_shrinks_to_zero() {
        let r = |timer| Explosion { x: 0.0, y: 0.0, timer }.radius();
        assert_eq!(r(0), 30.0);
        assert_eq!(r(12), 18.0);
        assert_eq!(r(30), 0.0);
        assert_eq!(r(31), 0.0);
        assert_eq!(r(u32::MAX), 0.0);
        let mut prev = r(0);
        for t in 1..64 {
            assert!(r(t) <= prev);
            prev = r(t);
        }
    }

    #[test]
    fn chat_line_display() {
        let line = ChatLine {
            name: "Ann".into(),
            message: "gg".into(),
            timestamp: 3_723,
        };
        assert_eq!(line.display(), "[01:02:03] Ann: gg");
    }

    #[test]
    fn snapshot_missing_layers_are_empty() {
        let snap: Snapshot = serde_json::from_value(json!({
            "obstacles": [{"x": 10, "y": 10, "width": 20, "height": 20, "health": 40}]
        }))
        .unwrap();
        assert_eq!(snap.obstacles.len(), 1);
        assert!(snap.obstacles[0].is_damaged());
        assert!(snap.players.is_empty());
        assert_eq!(snap.time_left, None);
    }

    #[test]
    fn snapshot_null_layers_are_empty() {
        let snap: Snapshot = serde_json::from_value(json!({
            "obstacles": [{"x": 10, "y": 10, "width": 20, "height": 20, "health": 40}],
            "bullets": null,
            "players": null,
            "time_left": 12
        }))
        .unwrap();
        assert_eq!(snap.obstacles.len(), 1);
        assert!(snap.bullets.is_empty());
        assert!(snap.players.is_empty());
        assert_eq!(snap.time_left, Some(12.0));
    }
}
