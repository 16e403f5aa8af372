//! Star Shooter - A pointer-driven browser space shooter
//!
//! Core modules:
//! - `sim`: Deterministic simulation (spawning, movement, collisions, game state)
//! - `game`: Frame driver wrapping the simulation for the platform loop
//! - `highscores` / `score_client`: Leaderboard and high-score API client
//! - `platform`: Browser/native platform abstraction
//! - `tuning`: Data-driven game balance

pub mod game;
pub mod highscores;
pub mod platform;
pub mod score_client;
pub mod sim;
pub mod tuning;

pub use game::{Game, HudSnapshot};
pub use highscores::{Leaderboard, ScoreEntry, ScoreError};
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Reference frame duration; per-frame speeds are expressed at 60 Hz
    pub const FRAME_MS: f64 = 1000.0 / 60.0;
    /// Largest frame delta (in 60 Hz frames) applied in one step, so a long
    /// stall does not teleport entities across the screen
    pub const MAX_FRAME_FACTOR: f32 = 4.0;

    /// Default playfield dimensions
    pub const SCREEN_WIDTH: f32 = 800.0;
    pub const SCREEN_HEIGHT: f32 = 600.0;

    /// Player defaults
    pub const PLAYER_MAX_HEALTH: u32 = 10;
    pub const PLAYER_SIZE: f32 = 48.0;

    /// Bullet defaults (pixels per frame, upward)
    pub const BULLET_SPEED: f32 = 5.0;
    pub const BULLET_WIDTH: f32 = 8.0;
    pub const BULLET_HEIGHT: f32 = 16.0;
    pub const FIRE_COOLDOWN_MS: f64 = 250.0;

    /// Enemy spawn cadence and difficulty ramp
    pub const ENEMY_CADENCE_MS: f64 = 2000.0;
    pub const ENEMY_CADENCE_FLOOR_MS: f64 = 250.0;
    pub const ENEMY_RAMP_INTERVAL_MS: f64 = 10_000.0;
    pub const ENEMY_RAMP_STEP_MS: f64 = 250.0;
    /// Attempts at finding a free column before falling back to x = 0
    pub const ENEMY_PLACEMENT_ATTEMPTS: u32 = 10;
    /// Upper bound on the chance of spawning a large enemy
    pub const MAX_LARGE_ENEMY_CHANCE: f64 = 0.2;

    /// Power-up defaults
    pub const POWER_UP_CHANCE: f64 = 0.05;
    pub const POWER_UP_SPEED: f32 = 2.0;
    pub const POWER_UP_SIZE: f32 = 24.0;

    /// Background stars
    pub const STAR_CADENCE_MS: f64 = 250.0;
    pub const INITIAL_STARS: u32 = 20;
    pub const STAR_MIN_RADIUS: f32 = 2.0;
    pub const STAR_MAX_RADIUS: f32 = 5.0;
    pub const STAR_MAX_SPEED: u32 = 3;
    pub const STAR_SPAWN_Y: f32 = -5.0;

    /// Transient effect durations
    pub const EXPLOSION_LIFETIME_MS: f64 = 1000.0;
    pub const ENEMY_FLASH_MS: f64 = 150.0;
    pub const PLAYER_FLASH_MS: f64 = 1500.0;
}
