//! Scene rendering.
//!
//! Every pass clears the surface and redraws the whole scene from the
//! latest snapshot plus the local actor, in a fixed layer order:
//! obstacles, bushes, powerups, actors, bullets, explosions, HUD, and the
//! game-over overlay when the session has ended. Rendering never mutates
//! session state.

use arena_shared::{
    config::LocalSprite,
    math::{Rect, Vec2},
    render::{Color, Surface},
    world::{
        Actor, Bullet, Bush, Explosion, Obstacle, Powerup, PowerupKind, Snapshot, Team,
        ACTOR_SIZE, MAX_HEALTH,
    },
};

/// Fixed colors.
pub mod palette {
    use arena_shared::render::Color;

    pub const OBSTACLE: Color = Color::rgb(0x65, 0x43, 0x21);
    pub const OBSTACLE_DAMAGE: Color = Color::rgba(0, 0, 0, 0.5);
    pub const BUSH: Color = Color::rgba(34, 139, 34, 0.6);

    pub const POWERUP_SPEED: Color = Color::rgb(0, 0, 255);
    pub const POWERUP_SHIELD: Color = Color::rgb(0x87, 0xCE, 0xFA);
    pub const POWERUP_DAMAGE: Color = Color::rgb(0xFF, 0xA5, 0x00);
    pub const POWERUP_HEALTH: Color = Color::rgb(255, 0, 0);
    pub const POWERUP_EXPERIENCE: Color = Color::rgb(255, 255, 0);
    pub const POWERUP_UNKNOWN: Color = Color::WHITE;

    pub const TEAM_BLUE: Color = Color::rgb(0, 0, 255);
    pub const TEAM_RED: Color = Color::rgb(255, 0, 0);
    pub const ACTOR_OUTLINE: Color = Color::BLACK;
    pub const HEALTH_BACK: Color = Color::rgb(255, 0, 0);
    pub const HEALTH_FRONT: Color = Color::rgb(0, 255, 0);
    pub const LABEL: Color = Color::WHITE;

    pub const BULLET: Color = Color::rgb(255, 255, 0);
    pub const SKILL_BULLET: Color = Color::rgb(0xFF, 0xA5, 0x00);
    pub const EXPLOSION: Color = Color::rgb(0xFF, 0xA5, 0x00);

    pub const HUD: Color = Color::WHITE;
    pub const GAME_OVER_SHADE: Color = Color::rgba(0, 0, 0, 0.7);
}

pub const BULLET_RADIUS: f32 = 5.0;
/// Health bar sits this far above the actor box.
pub const HEALTH_BAR_RISE: f32 = 10.0;
pub const HEALTH_BAR_HEIGHT: f32 = 5.0;
/// Name baseline sits this far above the actor box.
pub const NAME_RISE: f32 = 15.0;
pub const NAME_FONT_PX: f32 = 10.0;
pub const HUD_POS: Vec2 = Vec2::new(600.0, 30.0);
pub const HUD_FONT_PX: f32 = 16.0;
const TITLE_FONT_PX: f32 = 32.0;
const WINNER_FONT_PX: f32 = 20.0;

/// Everything one pass draws from.
#[derive(Debug, Clone, Copy, Default)]
pub struct Scene<'a> {
    pub snapshot: Option<&'a Snapshot>,
    pub local: Option<&'a Actor>,
    /// Set once the session is over.
    pub winner: Option<&'a str>,
}

/// Green part of the health bar, linear in health.
pub fn health_bar_width(health: u8) -> f32 {
    ACTOR_SIZE * health.min(MAX_HEALTH) as f32 / MAX_HEALTH as f32
}

/// Remaining time, rounded down to whole seconds.
pub fn hud_text(time_left: f32) -> String {
    format!("Time: {}s", time_left.max(0.0).floor() as u64)
}

pub fn winner_text(winner: &str) -> String {
    format!("Winner: {winner}")
}

pub fn powerup_color(kind: PowerupKind) -> Color {
    match kind {
        PowerupKind::Speed => palette::POWERUP_SPEED,
        PowerupKind::Shield => palette::POWERUP_SHIELD,
        PowerupKind::Damage => palette::POWERUP_DAMAGE,
        PowerupKind::Health => palette::POWERUP_HEALTH,
        PowerupKind::Experience => palette::POWERUP_EXPERIENCE,
        PowerupKind::Unknown => palette::POWERUP_UNKNOWN,
    }
}

pub fn team_color(team: Team) -> Color {
    match team {
        Team::Blue => palette::TEAM_BLUE,
        Team::Red => palette::TEAM_RED,
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Renderer {
    local_sprite: LocalSprite,
}

impl Renderer {
    pub fn new(local_sprite: LocalSprite) -> Self {
        Self { local_sprite }
    }

    /// One full pass.
    pub fn render(&self, surface: &mut dyn Surface, scene: &Scene<'_>) {
        surface.clear();

        if let Some(snap) = scene.snapshot {
            draw_obstacles(surface, &snap.obstacles);
            draw_bushes(surface, &snap.bushes);
            draw_powerups(surface, &snap.powerups);
            for actor in &snap.players {
                draw_actor(surface, actor, self.sprite_pos(actor, scene.local));
            }
            draw_bullets(surface, &snap.bullets);
            draw_explosions(surface, &snap.explosions);
            if let Some(t) = snap.time_left {
                surface.fill_text(&hud_text(t), HUD_POS, HUD_FONT_PX, palette::HUD);
            }
        }

        if let Some(winner) = scene.winner {
            draw_game_over(surface, winner);
        }
    }

    /// Where to draw `actor`: the predicted position for our own avatar
    /// under `Predicted`, the snapshot position otherwise.
    fn sprite_pos(&self, actor: &Actor, local: Option<&Actor>) -> Vec2 {
        match (self.local_sprite, local) {
            (LocalSprite::Predicted, Some(me)) if !me.sid.0.is_empty() && me.sid == actor.sid => {
                me.pos()
            }
            _ => actor.pos(),
        }
    }
}

fn draw_obstacles(surface: &mut dyn Surface, obstacles: &[Obstacle]) {
    for obs in obstacles {
        surface.fill_rect(obs.bounds(), palette::OBSTACLE);
        if obs.is_damaged() {
            surface.fill_rect(obs.bounds(), palette::OBSTACLE_DAMAGE);
        }
    }
}

fn draw_bushes(surface: &mut dyn Surface, bushes: &[Bush]) {
    for bush in bushes {
        surface.fill_rect(bush.bounds(), palette::BUSH);
    }
}

fn draw_powerups(surface: &mut dyn Surface, powerups: &[Powerup]) {
    for p in powerups {
        surface.fill_rect(p.bounds(), powerup_color(p.kind));
    }
}

fn draw_actor(surface: &mut dyn Surface, actor: &Actor, pos: Vec2) {
    let body = Rect::new(pos.x, pos.y, ACTOR_SIZE, ACTOR_SIZE);
    surface.fill_rect(body, team_color(actor.team));
    surface.stroke_rect(body, palette::ACTOR_OUTLINE);

    let bar_y = pos.y - HEALTH_BAR_RISE;
    surface.fill_rect(
        Rect::new(pos.x, bar_y, ACTOR_SIZE, HEALTH_BAR_HEIGHT),
        palette::HEALTH_BACK,
    );
    surface.fill_rect(
        Rect::new(pos.x, bar_y, health_bar_width(actor.health), HEALTH_BAR_HEIGHT),
        palette::HEALTH_FRONT,
    );

    surface.fill_text(
        &actor.name,
        Vec2::new(pos.x, pos.y - NAME_RISE),
        NAME_FONT_PX,
        palette::LABEL,
    );
}

fn draw_bullets(surface: &mut dyn Surface, bullets: &[Bullet]) {
    for b in bullets {
        let color = if b.skill {
            palette::SKILL_BULLET
        } else {
            palette::BULLET
        };
        surface.fill_circle(b.pos(), BULLET_RADIUS, color);
    }
}

fn draw_explosions(surface: &mut dyn Surface, explosions: &[Explosion]) {
    for e in explosions {
        surface.stroke_circle(e.pos(), e.radius(), palette::EXPLOSION);
    }
}

fn draw_game_over(surface: &mut dyn Surface, winner: &str) {
    let (w, h) = (surface.width(), surface.height());
    surface.fill_rect(Rect::new(0.0, 0.0, w, h), palette::GAME_OVER_SHADE);

    let title = "Game Over";
    let winner = winner_text(winner);
    surface.fill_text(
        title,
        Vec2::new(centered_x(w, title, TITLE_FONT_PX), h / 2.0 - 20.0),
        TITLE_FONT_PX,
        palette::LABEL,
    );
    surface.fill_text(
        &winner,
        Vec2::new(centered_x(w, &winner, WINNER_FONT_PX), h / 2.0 + 20.0),
        WINNER_FONT_PX,
        palette::LABEL,
    );
}

/// Rough horizontal centering for a monospace-ish font.
fn centered_x(width: f32, text: &str, size_px: f32) -> f32 {
    let est = text.chars().count() as f32 * size_px * 0.6;
    ((width - est) / 2.0).max(0.0)
}
