//! `arena_client`
//!
//! Client-side systems:
//! - Connection channel (framed TCP, reader/writer tasks)
//! - Input capture and action triggers
//! - Client-authoritative movement prediction
//! - Command emission with the shot cooldown
//! - Latest-snapshot store and layered rendering
//! - Session phases and the async driver

pub mod channel;
pub mod client;
pub mod commands;
pub mod framebuffer;
pub mod input;
pub mod prediction;
pub mod render;
pub mod session;
pub mod sidebar;
pub mod state;

pub use client::{ClientInput, GameClient};
pub use session::{SessionController, SessionError, SessionPhase};
