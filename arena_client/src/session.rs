//! Session controller.
//!
//! Owns the whole client-side session: phase, local actor, latest snapshot,
//! input state and sidebar. Inbound events go through a dispatch table built
//! once at construction; ticks and input are applied directly. Everything
//! here runs on one task, so nothing is shared and nothing is locked.
//!
//! Phases: `Menu -> Joining -> Playing -> GameOver -> Menu`.

use std::time::Instant;

use arena_shared::{
    config::{ClientConfig, DEFAULT_PLAYER_NAME},
    event::{DispatchError, EventTable},
    input::{InputSignal, SurfaceRect},
    math::Vec2,
    net::Envelope,
    protocol::{inbound, GameMode, GameOver},
    render::Surface,
    world::{Actor, ChatLine, LobbyEntry, Snapshot},
};
use tracing::{debug, info, trace, warn};

use crate::{
    commands::{CommandEmitter, EventSink},
    input::InputController,
    prediction::{LocalPredictor, MovementModel},
    render::{Renderer, Scene},
    sidebar::Sidebar,
    state::StateStore,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    /// Waiting for the player to pick a mode.
    Menu,
    /// `join` sent, no `joined` yet.
    Joining,
    Playing,
    /// Gameplay frozen; only the overlay and sidebar change.
    GameOver { winner: String },
}

impl SessionPhase {
    pub fn name(&self) -> &'static str {
        match self {
            SessionPhase::Menu => "menu",
            SessionPhase::Joining => "joining",
            SessionPhase::Playing => "playing",
            SessionPhase::GameOver { .. } => "game_over",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("cannot {action} in the {phase} phase")]
    InvalidTransition {
        action: &'static str,
        phase: &'static str,
    },
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// State the inbound handlers operate on.
#[derive(Debug)]
pub struct SessionContext {
    phase: SessionPhase,
    local: Option<Actor>,
    store: StateStore,
    input: InputController,
    sidebar: Sidebar,
    /// Set by handlers that changed what is on screen.
    redraw: bool,
}

impl SessionContext {
    fn new(surface: SurfaceRect) -> Self {
        Self {
            phase: SessionPhase::Menu,
            local: None,
            store: StateStore::new(),
            input: InputController::new(surface),
            sidebar: Sidebar::new(),
            redraw: false,
        }
    }
}

fn on_joined(ctx: &mut SessionContext, actor: Actor) {
    if ctx.phase != SessionPhase::Joining {
        debug!(phase = ctx.phase.name(), "Ignoring joined");
        return;
    }
    info!(sid = %actor.sid, name = %actor.name, team = %actor.team, "Joined game");
    ctx.local = Some(actor);
    ctx.phase = SessionPhase::Playing;
}

fn on_game_state(ctx: &mut SessionContext, snap: Snapshot) {
    match ctx.phase {
        SessionPhase::Joining | SessionPhase::Playing => {
            ctx.store.replace(snap);
            ctx.redraw = true;
        }
        SessionPhase::Menu | SessionPhase::GameOver { .. } => {
            trace!(phase = ctx.phase.name(), "Snapshot ignored");
        }
    }
}

fn on_game_over(ctx: &mut SessionContext, over: GameOver) {
    match ctx.phase {
        SessionPhase::Joining | SessionPhase::Playing => {
            info!(winner = %over.winner, "Game over");
            ctx.phase = SessionPhase::GameOver {
                winner: over.winner,
            };
            ctx.input.release_all();
            ctx.redraw = true;
        }
        _ => debug!(phase = ctx.phase.name(), "Ignoring game_over"),
    }
}

fn on_lobby_update(ctx: &mut SessionContext, roster: Vec<LobbyEntry>) {
    debug!(players = roster.len(), "Lobby update");
    ctx.sidebar.set_roster(roster);
}

fn on_chat(ctx: &mut SessionContext, line: ChatLine) {
    info!(name = %line.name, message = %line.message, "Chat");
    ctx.sidebar.push_chat(&line);
}

fn build_table() -> Result<EventTable<SessionContext>, DispatchError> {
    let mut table = EventTable::new();
    table.on(inbound::JOINED, on_joined)?;
    table.on(inbound::GAME_STATE, on_game_state)?;
    table.on(inbound::GAME_OVER, on_game_over)?;
    table.on(inbound::LOBBY_UPDATE, on_lobby_update)?;
    table.on(inbound::CHAT, on_chat)?;
    Ok(table)
}

pub struct SessionController<S: Surface> {
    ctx: SessionContext,
    table: EventTable<SessionContext>,
    predictor: Box<dyn MovementModel>,
    emitter: CommandEmitter,
    renderer: Renderer,
    surface: S,
    frames: u64,
}

impl<S: Surface> SessionController<S> {
    pub fn new(cfg: &ClientConfig, surface: S) -> Result<Self, SessionError> {
        let rect = SurfaceRect::new(
            cfg.surface_left,
            cfg.surface_top,
            surface.width(),
            surface.height(),
        );
        Ok(Self {
            ctx: SessionContext::new(rect),
            table: build_table()?,
            predictor: Box::new(LocalPredictor),
            emitter: CommandEmitter::new(cfg.shot_cooldown()),
            renderer: Renderer::new(cfg.local_sprite),
            surface,
            frames: 0,
        })
    }

    /// Swaps the movement rule, e.g. for a server-reconciling model.
    pub fn with_movement_model(mut self, model: Box<dyn MovementModel>) -> Self {
        self.predictor = model;
        self
    }

    /// Menu choice: sends `join` and waits for `joined`. A blank name falls
    /// back to the default.
    pub fn select_mode(
        &mut self,
        sink: &mut dyn EventSink,
        mode: GameMode,
        name: Option<&str>,
    ) -> Result<(), SessionError> {
        self.expect_phase("select a mode", |p| *p == SessionPhase::Menu)?;
        let name = match name.map(str::trim) {
            Some(n) if !n.is_empty() => n,
            _ => DEFAULT_PLAYER_NAME,
        };
        info!(player = %name, mode = %mode, "Joining");
        self.emitter.join(sink, name, mode);
        self.ctx.phase = SessionPhase::Joining;
        Ok(())
    }

    /// Routes one inbound envelope. Bad payloads and unknown events are
    /// logged and dropped.
    pub fn handle_envelope(&mut self, env: Envelope) {
        match self.table.dispatch(&mut self.ctx, env) {
            Ok(()) => {}
            Err(DispatchError::Unhandled(event)) => debug!(event = %event, "Unhandled event"),
            Err(e) => warn!(error = %e, "Dropping inbound event"),
        }
        if self.ctx.redraw {
            self.render();
        }
    }

    /// Applies one input signal. Held keys are always tracked; aiming and
    /// triggers only apply while playing. Returns whether an event was sent.
    pub fn handle_input(
        &mut self,
        sink: &mut dyn EventSink,
        signal: InputSignal,
        now: Instant,
    ) -> bool {
        let local = match self.ctx.phase {
            SessionPhase::Playing => self.ctx.local.as_mut(),
            _ => None,
        };
        match self.ctx.input.handle(signal, local) {
            Some(trigger) => self.emitter.trigger(sink, trigger, now),
            None => false,
        }
    }

    /// One frame: predictor step then `player_update`. No-op unless playing.
    pub fn tick(&mut self, sink: &mut dyn EventSink) -> bool {
        if self.ctx.phase != SessionPhase::Playing {
            return false;
        }
        let Some(local) = self.ctx.local.as_mut() else {
            return false;
        };
        let bounds = Vec2::new(self.surface.width(), self.surface.height());
        let keys = self.ctx.input.move_keys();
        self.predictor.step(local, keys, bounds);
        self.emitter.player_update(sink, local);
        true
    }

    pub fn send_chat(&mut self, sink: &mut dyn EventSink, message: &str) -> bool {
        self.emitter.chat(sink, message.trim())
    }

    /// Leaves a finished game: drops the local actor and the snapshot.
    pub fn return_to_menu(&mut self) -> Result<(), SessionError> {
        self.expect_phase("return to the menu", |p| {
            matches!(p, SessionPhase::GameOver { .. })
        })?;
        self.ctx.local = None;
        self.ctx.store.clear();
        self.ctx.input.release_all();
        self.emitter.reset();
        self.ctx.phase = SessionPhase::Menu;
        info!("Back in menu");
        self.render();
        Ok(())
    }

    /// Full redraw from the current state.
    pub fn render(&mut self) {
        let winner = match &self.ctx.phase {
            SessionPhase::GameOver { winner } => Some(winner.as_str()),
            _ => None,
        };
        let scene = Scene {
            snapshot: self.ctx.store.current(),
            local: self.ctx.local.as_ref(),
            winner,
        };
        self.renderer.render(&mut self.surface, &scene);
        self.frames += 1;
        self.ctx.redraw = false;
    }

    fn expect_phase(
        &self,
        action: &'static str,
        allowed: impl Fn(&SessionPhase) -> bool,
    ) -> Result<(), SessionError> {
        if allowed(&self.ctx.phase) {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition {
                action,
                phase: self.ctx.phase.name(),
            })
        }
    }

    pub fn phase(&self) -> &SessionPhase {
        &self.ctx.phase
    }

    pub fn local(&self) -> Option<&Actor> {
        self.ctx.local.as_ref()
    }

    pub fn store(&self) -> &StateStore {
        &self.ctx.store
    }

    pub fn input(&self) -> &InputController {
        &self.ctx.input
    }

    pub fn sidebar(&self) -> &Sidebar {
        &self.ctx.sidebar
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Render passes so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}
