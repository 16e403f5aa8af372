//! Game state and core simulation types
//!
//! One owned `GameState` holds everything a round mutates. The presentation
//! layer only reads it through `Renderable` and the HUD snapshot.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::{Bounds, Collider};
use super::effects::EffectQueue;
use super::registry::{Entity, Registries};
use crate::tuning::{EnemyKind, FireMode, Tuning};

/// Current phase of play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Assets loading / start screen
    Loading,
    /// Active gameplay
    Running,
    /// Gameplay frozen, background still animates
    Paused,
    /// Health ran out
    GameOver,
}

/// What a sprite should look like this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisualState {
    Normal,
    /// Transient hit flash
    Damaged,
    /// Player with shield up
    Shielded,
}

/// Sprite families the renderer draws
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpriteKind {
    Player,
    Bullet,
    Enemy(EnemyKind),
    PowerUp,
    Star,
    Explosion,
}

/// Read-only view the rendering collaborator draws from
pub trait Renderable {
    fn sprite(&self) -> SpriteKind;
    /// Sprite centre
    fn position(&self) -> Vec2;
    fn size(&self) -> Vec2;
    fn visual_state(&self) -> VisualState {
        VisualState::Normal
    }
    fn is_destroyed(&self) -> bool;
}

macro_rules! registry_entity {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Entity for $ty {
                fn id(&self) -> u32 {
                    self.id
                }

                fn is_destroyed(&self) -> bool {
                    self.destroyed
                }

                fn mark_destroyed(&mut self) {
                    self.destroyed = true;
                }
            }

            impl Collider for $ty {
                fn bounds(&self) -> Option<Bounds> {
                    Bounds::centered(self.pos, Renderable::size(self))
                }
            }
        )*
    };
}

registry_entity!(Bullet, Enemy, PowerUp, Star, Explosion);

/// The player's ship
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    /// Where the pointer last was
    pub target: Vec2,
    pub size: Vec2,
    pub health: u32,
    pub shield_active: bool,
    /// Hit flash, cleared by a deferred effect
    pub damage_flash: bool,
    /// Frame time the latest flash runs until
    #[serde(default)]
    pub flash_until_ms: f64,
}

impl Player {
    pub fn new(tuning: &Tuning) -> Self {
        let start = Vec2::new(tuning.screen_width / 2.0, tuning.screen_height / 2.0);
        Self {
            pos: start,
            target: start,
            size: Vec2::splat(tuning.player_size),
            health: tuning.player_max_health,
            shield_active: tuning.start_with_shield,
            damage_flash: false,
            flash_until_ms: 0.0,
        }
    }

    /// Take one point of damage. Returns the remaining health.
    pub fn damage(&mut self) -> u32 {
        self.health = self.health.saturating_sub(1);
        self.health
    }
}

impl Renderable for Player {
    fn sprite(&self) -> SpriteKind {
        SpriteKind::Player
    }

    fn position(&self) -> Vec2 {
        self.pos
    }

    fn size(&self) -> Vec2 {
        self.size
    }

    fn visual_state(&self) -> VisualState {
        if self.damage_flash {
            VisualState::Damaged
        } else if self.shield_active {
            VisualState::Shielded
        } else {
            VisualState::Normal
        }
    }

    fn is_destroyed(&self) -> bool {
        false
    }
}

impl Collider for Player {
    fn bounds(&self) -> Option<Bounds> {
        Bounds::centered(self.pos, self.size)
    }
}

/// A player bullet, moving up
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bullet {
    pub id: u32,
    pub pos: Vec2,
    pub size: Vec2,
    /// Pixels per frame, upward
    pub speed: f32,
    pub destroyed: bool,
}

impl Bullet {
    pub fn new(id: u32, pos: Vec2, size: Vec2, speed: f32) -> Self {
        Self {
            id,
            pos,
            size,
            speed,
            destroyed: false,
        }
    }
}

impl Renderable for Bullet {
    fn sprite(&self) -> SpriteKind {
        SpriteKind::Bullet
    }

    fn position(&self) -> Vec2 {
        self.pos
    }

    fn size(&self) -> Vec2 {
        self.size
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

/// An enemy ship, moving down
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: u32,
    pub kind: EnemyKind,
    pub pos: Vec2,
    pub size: Vec2,
    pub hp: u32,
    /// Pixels per frame, downward
    pub speed: f32,
    pub points: u64,
    pub damage_flash: bool,
    #[serde(default)]
    pub flash_until_ms: f64,
    pub destroyed: bool,
}

impl Enemy {
    /// Fresh enemy from the type table
    pub fn new(id: u32, kind: EnemyKind, pos: Vec2, speed: f32, tuning: &Tuning) -> Self {
        let stats = tuning.enemies.stats(kind);
        Self {
            id,
            kind,
            pos,
            size: Vec2::new(stats.width, stats.height),
            hp: stats.hp,
            speed,
            points: stats.points,
            damage_flash: false,
            flash_until_ms: 0.0,
            destroyed: false,
        }
    }
}

impl Renderable for Enemy {
    fn sprite(&self) -> SpriteKind {
        SpriteKind::Enemy(self.kind)
    }

    fn position(&self) -> Vec2 {
        self.pos
    }

    fn size(&self) -> Vec2 {
        self.size
    }

    fn visual_state(&self) -> VisualState {
        if self.damage_flash {
            VisualState::Damaged
        } else {
            VisualState::Normal
        }
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

/// Shield pickup dropped by a killed enemy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerUp {
    pub id: u32,
    pub pos: Vec2,
    pub size: Vec2,
    pub speed: f32,
    pub destroyed: bool,
}

impl Renderable for PowerUp {
    fn sprite(&self) -> SpriteKind {
        SpriteKind::PowerUp
    }

    fn position(&self) -> Vec2 {
        self.pos
    }

    fn size(&self) -> Vec2 {
        self.size
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

/// Background star (never collides)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Star {
    pub id: u32,
    pub pos: Vec2,
    pub radius: f32,
    pub speed: f32,
    pub rotation: f32,
    pub destroyed: bool,
}

impl Star {
    pub fn new(id: u32, pos: Vec2, radius: f32, speed: f32, rotation: f32) -> Self {
        Self {
            id,
            pos,
            radius,
            speed,
            rotation,
            destroyed: false,
        }
    }

    /// Fainter for smaller stars
    pub fn alpha(&self) -> f32 {
        (self.radius / crate::consts::STAR_MAX_RADIUS).min(1.0)
    }
}

impl Renderable for Star {
    fn sprite(&self) -> SpriteKind {
        SpriteKind::Star
    }

    fn position(&self) -> Vec2 {
        self.pos
    }

    fn size(&self) -> Vec2 {
        Vec2::splat(self.radius * 2.0)
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

/// Explosion animation placeholder, expired by a deferred effect
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Explosion {
    pub id: u32,
    pub pos: Vec2,
    pub size: Vec2,
    pub destroyed: bool,
}

impl Renderable for Explosion {
    fn sprite(&self) -> SpriteKind {
        SpriteKind::Explosion
    }

    fn position(&self) -> Vec2 {
        self.pos
    }

    fn size(&self) -> Vec2 {
        self.size
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

/// Something that happened during a step, for audio/presentation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    BulletFired { id: u32 },
    EnemySpawned { id: u32, kind: EnemyKind },
    EnemyHit { id: u32, hp_left: u32 },
    EnemyDestroyed { id: u32, points: u64 },
    /// An enemy left the bottom of the screen
    EnemyEscaped { id: u32 },
    PowerUpDropped { id: u32 },
    ShieldGained,
    ShieldConsumed,
    PlayerHit { health: u32 },
    Explosion { pos: Vec2 },
    GameOver { score: u64 },
}

/// Frame and gameplay time keeping
#[derive(Debug, Clone, Default)]
pub struct Clock {
    /// Milliseconds of Running time this round
    pub gameplay_ms: f64,
    /// Timestamp of the previous frame
    pub last_frame_ms: Option<f64>,
}

impl Clock {
    /// Frame clock reading, zero before the first frame
    pub fn frame_ms(&self) -> f64 {
        self.last_frame_ms.unwrap_or(0.0)
    }
}

/// Spawner bookkeeping
#[derive(Debug, Clone)]
pub struct SpawnTimers {
    /// Gameplay time of the last enemy spawn
    pub last_enemy_ms: f64,
    /// Current enemy cadence (shrinks with the ramp)
    pub enemy_cadence_ms: f64,
    /// Gameplay time of the last ramp step
    pub last_ramp_ms: f64,
    /// Gameplay time of the last shot
    pub last_shot_ms: Option<f64>,
    /// Gameplay time of the last energy recharge
    pub last_recharge_ms: f64,
    /// Frame timestamp of the last star spawn
    pub last_star_ms: Option<f64>,
}

impl SpawnTimers {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            last_enemy_ms: 0.0,
            enemy_cadence_ms: tuning.cadence.initial_ms,
            last_ramp_ms: 0.0,
            last_shot_ms: None,
            last_recharge_ms: 0.0,
            last_star_ms: None,
        }
    }
}

/// Complete game state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub phase: GamePhase,
    /// Generation counter, bumped on every restart
    pub round: u32,
    pub score: u64,
    pub player: Player,
    /// Gun energy (energy fire mode only)
    pub energy: u32,
    pub world: Registries,
    pub clock: Clock,
    pub timers: SpawnTimers,
    pub effects: EffectQueue,
    /// Events from the most recent step
    pub events: Vec<GameEvent>,
    /// Next entity ID (never reset, so ids stay unique across rounds)
    next_id: u32,
}

impl GameState {
    /// Create a new game with the given seed, waiting on the start screen
    pub fn new(seed: u64, tuning: &Tuning) -> Self {
        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            phase: GamePhase::Loading,
            round: 1,
            score: 0,
            player: Player::new(tuning),
            energy: initial_energy(tuning),
            world: Registries::default(),
            clock: Clock::default(),
            timers: SpawnTimers::new(tuning),
            effects: EffectQueue::default(),
            events: Vec::new(),
            next_id: 1,
        };

        super::spawner::seed_starfield(&mut state, tuning);

        state
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Wipe everything a round owns and start a new generation
    ///
    /// Stars, the RNG stream and the frame clock carry over. Pending deferred
    /// effects belong to the old round and are dropped.
    pub fn reset_round(&mut self, tuning: &Tuning) {
        self.round += 1;
        self.score = 0;
        self.player = Player::new(tuning);
        self.energy = initial_energy(tuning);
        self.world.clear_gameplay();
        self.clock.gameplay_ms = 0.0;
        let last_star_ms = self.timers.last_star_ms;
        self.timers = SpawnTimers::new(tuning);
        self.timers.last_star_ms = last_star_ms;
        self.effects = EffectQueue::default();
        self.events.clear();
    }

    pub fn is_running(&self) -> bool {
        self.phase == GamePhase::Running
    }

    pub fn is_paused(&self) -> bool {
        self.phase == GamePhase::Paused
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    /// Everything the renderer should draw, back to front
    pub fn renderables(&self) -> Vec<&dyn Renderable> {
        let world = &self.world;
        let mut out: Vec<&dyn Renderable> = Vec::new();
        out.extend(world.stars.iter_active().map(|s| s as &dyn Renderable));
        out.extend(world.power_ups.iter_active().map(|p| p as &dyn Renderable));
        out.extend(world.enemies.iter_active().map(|e| e as &dyn Renderable));
        out.extend(world.bullets.iter_active().map(|b| b as &dyn Renderable));
        if self.phase != GamePhase::Loading {
            out.push(&self.player);
        }
        out.extend(world.explosions.iter_active().map(|x| x as &dyn Renderable));
        out
    }
}

fn initial_energy(tuning: &Tuning) -> u32 {
    match tuning.fire_mode {
        FireMode::Energy { max_energy, .. } => max_energy,
        FireMode::Cooldown { .. } => 0,
    }
}
