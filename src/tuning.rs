//! Data-driven game balance
//!
//! Everything that differed between the hand-written variants of the game
//! (fire mode, enemy table, spawn cadence ramp, breach damage) is a field
//! here instead of a separate code path. Persisted as JSON.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Enemy types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    Standard,
    Large,
}

/// One row of the enemy type table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnemyStats {
    /// Hits needed to destroy a fresh enemy
    pub hp: u32,
    /// Speed is rolled in `1..=max_speed` pixels per frame
    pub max_speed: u32,
    /// Score awarded on kill
    pub points: u64,
    pub width: f32,
    pub height: f32,
}

/// The enemy type table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnemyTable {
    pub standard: EnemyStats,
    pub large: EnemyStats,
}

impl EnemyTable {
    pub fn stats(&self, kind: EnemyKind) -> &EnemyStats {
        match kind {
            EnemyKind::Standard => &self.standard,
            EnemyKind::Large => &self.large,
        }
    }
}

impl Default for EnemyTable {
    fn default() -> Self {
        Self {
            standard: EnemyStats {
                hp: 1,
                max_speed: 3,
                points: 1,
                width: 40.0,
                height: 40.0,
            },
            large: EnemyStats {
                hp: 3,
                max_speed: 2,
                points: 5,
                width: 64.0,
                height: 64.0,
            },
        }
    }
}

/// How the player's gun is rate-limited
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FireMode {
    /// Fixed minimum interval between shots
    Cooldown { cooldown_ms: f64 },
    /// Each shot spends one unit; one unit comes back per `recharge_ms`
    Energy { max_energy: u32, recharge_ms: f64 },
}

impl Default for FireMode {
    fn default() -> Self {
        FireMode::Cooldown {
            cooldown_ms: FIRE_COOLDOWN_MS,
        }
    }
}

/// Enemy spawn cadence with an optional difficulty ramp
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cadence {
    pub initial_ms: f64,
    /// Cadence never shrinks below this
    pub floor_ms: f64,
    /// Gameplay time between ramp steps
    pub ramp_interval_ms: f64,
    /// How much each ramp step removes (0 disables the ramp)
    pub ramp_step_ms: f64,
}

impl Default for Cadence {
    fn default() -> Self {
        Self {
            initial_ms: ENEMY_CADENCE_MS,
            floor_ms: ENEMY_CADENCE_FLOOR_MS,
            ramp_interval_ms: ENEMY_RAMP_INTERVAL_MS,
            ramp_step_ms: ENEMY_RAMP_STEP_MS,
        }
    }
}

/// Reasons a tuning file is refused
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("invalid tuning JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("screen size must be positive, got {width}x{height}")]
    Screen { width: f32, height: f32 },
    #[error("player max health must be at least 1")]
    MaxHealth,
    #[error("enemy stats for {0:?} need hp >= 1 and max_speed >= 1")]
    EnemyStats(EnemyKind),
    #[error("large enemies must be tougher and slower than standard ones")]
    EnemyOrdering,
    #[error("probability `{name}` out of range: {value}")]
    Probability { name: &'static str, value: f64 },
    #[error("cadence floor {floor_ms} ms must be positive and at most the initial {initial_ms} ms")]
    Cadence { initial_ms: f64, floor_ms: f64 },
    #[error("fire mode parameters must be positive")]
    FireMode,
}

/// Game balance parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub screen_width: f32,
    pub screen_height: f32,

    // === Player ===
    pub player_max_health: u32,
    pub player_size: f32,
    /// Shield is up when a round starts
    pub start_with_shield: bool,

    // === Weapons ===
    pub fire_mode: FireMode,
    pub bullet_speed: f32,
    pub bullet_width: f32,
    pub bullet_height: f32,

    // === Enemies ===
    pub enemies: EnemyTable,
    pub cadence: Cadence,
    /// Chance that a spawned enemy is `Large`
    pub large_chance: f64,
    /// Enemies leaving the bottom of the screen cost one health
    pub enemy_breach_damages: bool,

    // === Pickups ===
    pub power_up_chance: f64,
    pub power_up_speed: f32,
    pub power_up_size: f32,

    // === Background ===
    pub star_cadence_ms: f64,
    pub initial_stars: u32,

    // === Effects ===
    pub explosion_lifetime_ms: f64,
    pub enemy_flash_ms: f64,
    pub player_flash_ms: f64,

    /// Prefix for the high-score endpoints
    pub score_api_base: String,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            screen_width: SCREEN_WIDTH,
            screen_height: SCREEN_HEIGHT,

            player_max_health: PLAYER_MAX_HEALTH,
            player_size: PLAYER_SIZE,
            start_with_shield: true,

            fire_mode: FireMode::default(),
            bullet_speed: BULLET_SPEED,
            bullet_width: BULLET_WIDTH,
            bullet_height: BULLET_HEIGHT,

            enemies: EnemyTable::default(),
            cadence: Cadence::default(),
            large_chance: 0.15,
            enemy_breach_damages: false,

            power_up_chance: POWER_UP_CHANCE,
            power_up_speed: POWER_UP_SPEED,
            power_up_size: POWER_UP_SIZE,

            star_cadence_ms: STAR_CADENCE_MS,
            initial_stars: INITIAL_STARS,

            explosion_lifetime_ms: EXPLOSION_LIFETIME_MS,
            enemy_flash_ms: ENEMY_FLASH_MS,
            player_flash_ms: PLAYER_FLASH_MS,

            score_api_base: "/api".to_string(),
        }
    }
}

impl Tuning {
    /// The energy-based variant: five charges, one back every half second
    pub fn energy_variant() -> Self {
        Self {
            fire_mode: FireMode::Energy {
                max_energy: 5,
                recharge_ms: 500.0,
            },
            ..Self::default()
        }
    }

    /// Check internal consistency
    pub fn validate(&self) -> Result<(), TuningError> {
        if !(self.screen_width > 0.0 && self.screen_height > 0.0) {
            return Err(TuningError::Screen {
                width: self.screen_width,
                height: self.screen_height,
            });
        }
        if self.player_max_health == 0 {
            return Err(TuningError::MaxHealth);
        }
        for kind in [EnemyKind::Standard, EnemyKind::Large] {
            let stats = self.enemies.stats(kind);
            if stats.hp == 0 || stats.max_speed == 0 {
                return Err(TuningError::EnemyStats(kind));
            }
        }
        let (standard, large) = (&self.enemies.standard, &self.enemies.large);
        if large.hp <= standard.hp || large.max_speed >= standard.max_speed {
            return Err(TuningError::EnemyOrdering);
        }
        for (name, value, max) in [
            ("large_chance", self.large_chance, MAX_LARGE_ENEMY_CHANCE),
            ("power_up_chance", self.power_up_chance, 1.0),
        ] {
            if !(0.0..=max).contains(&value) {
                return Err(TuningError::Probability { name, value });
            }
        }
        let cadence = &self.cadence;
        if !(cadence.floor_ms > 0.0 && cadence.floor_ms <= cadence.initial_ms) {
            return Err(TuningError::Cadence {
                initial_ms: cadence.initial_ms,
                floor_ms: cadence.floor_ms,
            });
        }
        let fire_ok = match self.fire_mode {
            FireMode::Cooldown { cooldown_ms } => cooldown_ms > 0.0,
            FireMode::Energy {
                max_energy,
                recharge_ms,
            } => max_energy > 0 && recharge_ms > 0.0,
        };
        if !fire_ok {
            return Err(TuningError::FireMode);
        }
        Ok(())
    }

    /// Parse and validate a JSON tuning document
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Parse a tuning document, falling back to defaults on any problem
    pub fn from_json_or_default(json: &str) -> Self {
        match Self::from_json(json) {
            Ok(tuning) => tuning,
            Err(e) => {
                log::warn!("Ignoring tuning: {}", e);
                Self::default()
            }
        }
    }

    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "star_shooter_tuning";

    /// Environment variable naming a tuning file (native only)
    #[allow(dead_code)]
    const ENV_VAR: &'static str = "STAR_SHOOTER_TUNING";

    /// Load tuning from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        match crate::platform::web::storage_get(Self::STORAGE_KEY) {
            Some(json) => {
                log::info!("Loaded tuning from LocalStorage");
                Self::from_json_or_default(&json)
            }
            None => {
                log::info!("Using default tuning");
                Self::default()
            }
        }
    }

    /// Load tuning from the file named by `STAR_SHOOTER_TUNING`
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        let Ok(path) = std::env::var(Self::ENV_VAR) else {
            log::info!("Using default tuning");
            return Self::default();
        };
        match std::fs::read_to_string(&path) {
            Ok(json) => {
                log::info!("Loaded tuning from {}", path);
                Self::from_json_or_default(&json)
            }
            Err(e) => {
                log::warn!("Cannot read tuning file {}: {}", path, e);
                Self::default()
            }
        }
    }
}
