//! `arena_shared`
//!
//! Libraries shared by the arena client and its test harness.
//!
//! Design goals:
//! - Wire types decode into values that already satisfy the model invariants.
//! - Clear separation of concerns (net, protocol, world, math, render).
//! - Traits at the seams so the client can be driven headless.
//! - No `unsafe`.

pub mod config;
pub mod event;
pub mod input;
pub mod math;
pub mod net;
pub mod protocol;
pub mod render;
pub mod world;
