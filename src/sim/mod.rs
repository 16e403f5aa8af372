//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Time comes in as frame timestamps, never read from a clock
//! - Seeded RNG only
//! - Stable iteration order (spawn order)
//! - No rendering or platform dependencies

pub mod collision;
pub mod effects;
pub mod phase;
pub mod registry;
pub mod spawner;
pub mod state;
pub mod tick;

pub use collision::{Bounds, Collider, intersects};
pub use effects::{Effect, EffectQueue};
pub use phase::Command;
pub use registry::{Entity, Registries, Registry};
pub use state::{
    Bullet, Enemy, Explosion, GameEvent, GamePhase, GameState, Player, PowerUp, Renderable,
    SpriteKind, Star, VisualState,
};
pub use tick::{FrameInput, StepFault, step};
