//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - One tick per frame, timers counted in ticks
//! - Seeded RNG only
//! - Stable iteration order (creation order)
//! - No rendering or platform dependencies

pub mod collision;
pub mod rules;
pub mod state;
pub mod tick;

pub use collision::{Aabb, Contact, resolve_platform, within_box, within_radius};
pub use state::{
    ActiveEffects, Checkpoint, Drag, Effect, GameEvent, GamePhase, InteractiveObject, Motion,
    ObjectKind, Particle, Platform, PlatformKind, Player, PowerUpEffect, Session, world_bounds,
};
pub use tick::{TickInput, tick, tick_second};
