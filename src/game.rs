//! Frame driver
//!
//! Owns the simulation state between frames. Platform event handlers only
//! record input here; `frame` consumes it once per animation frame.

use glam::Vec2;
use serde::Serialize;

use crate::highscores::{Leaderboard, ScoreEntry, ScoreError};
use crate::score_client::ScoreClient;
use crate::sim::phase::{self, Command};
use crate::sim::{FrameInput, GameEvent, GamePhase, GameState, Renderable, step};
use crate::tuning::{FireMode, Tuning};

/// Everything the HUD shows, read once per frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HudSnapshot {
    pub score: u64,
    pub health: u32,
    pub max_health: u32,
    pub shield: bool,
    /// Gun energy, energy fire mode only
    pub energy: Option<u32>,
    pub max_energy: Option<u32>,
    pub running: bool,
    pub paused: bool,
    pub game_over: bool,
    pub round: u32,
}

/// Game instance holding all state
pub struct Game {
    state: GameState,
    tuning: Tuning,
    /// Input gathered since the last frame
    input: FrameInput,
    fire_held: bool,
    leaderboard: Leaderboard,
    /// Final score awaiting a name, if it made the board
    score_offer: Option<u64>,
    /// Events from the most recent frame
    events: Vec<GameEvent>,
    faults: u32,
}

impl Game {
    pub fn new(seed: u64, tuning: Tuning) -> Self {
        log::info!("Game initialized with seed: {}", seed);
        Self {
            state: GameState::new(seed, &tuning),
            tuning,
            input: FrameInput::default(),
            fire_held: false,
            leaderboard: Leaderboard::new(),
            score_offer: None,
            events: Vec::new(),
            faults: 0,
        }
    }

    /// Pointer or touch position in playfield coordinates
    pub fn pointer_move(&mut self, x: f32, y: f32) {
        self.input.pointer = Some(Vec2::new(x, y));
    }

    pub fn fire_down(&mut self) {
        if !self.fire_held {
            self.input.fire_pressed = true;
        }
        self.fire_held = true;
    }

    pub fn fire_up(&mut self) {
        self.fire_held = false;
    }

    /// Apply a phase command. Returns whether it did anything.
    pub fn command(&mut self, command: Command) -> bool {
        let applied = phase::apply(&mut self.state, &self.tuning, command);
        if applied && command == Command::Restart {
            self.score_offer = None;
            self.input = FrameInput::default();
            self.fire_held = false;
            self.events.clear();
        }
        applied
    }

    /// The "Enter" action: start, resume or restart depending on phase
    pub fn confirm(&mut self) -> bool {
        let command = match self.state.phase {
            GamePhase::Loading => Command::Start,
            GamePhase::Paused => Command::Resume,
            GamePhase::GameOver => Command::Restart,
            GamePhase::Running => return false,
        };
        self.command(command)
    }

    /// Run one frame at the animation timestamp `now_ms`
    ///
    /// A faulty step is logged and the loop carries on with the next frame.
    pub fn frame(&mut self, now_ms: f64) -> &[GameEvent] {
        let input = FrameInput {
            pointer: self.input.pointer.take(),
            fire_pressed: std::mem::take(&mut self.input.fire_pressed),
            fire_held: self.fire_held,
        };

        if let Err(fault) = step(&mut self.state, &input, &self.tuning, now_ms) {
            self.faults += 1;
            log::error!("Frame skipped: {}", fault);
        }
        self.events = std::mem::take(&mut self.state.events);

        if let Some(score) = self.events.iter().find_map(|e| match e {
            GameEvent::GameOver { score } => Some(*score),
            _ => None,
        }) {
            if self.leaderboard.qualifies(score) {
                log::info!("Score {} qualifies for the high score board", score);
                self.score_offer = Some(score);
            }
        }

        &self.events
    }

    pub fn hud(&self) -> HudSnapshot {
        let (energy, max_energy) = match self.tuning.fire_mode {
            FireMode::Energy { max_energy, .. } => (Some(self.state.energy), Some(max_energy)),
            FireMode::Cooldown { .. } => (None, None),
        };
        HudSnapshot {
            score: self.state.score,
            health: self.state.player.health,
            max_health: self.tuning.player_max_health,
            shield: self.state.player.shield_active,
            energy,
            max_energy,
            running: self.state.is_running(),
            paused: self.state.is_paused(),
            game_over: self.state.is_game_over(),
            round: self.state.round,
        }
    }

    pub fn renderables(&self) -> Vec<&dyn Renderable> {
        self.state.renderables()
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Events produced by the last frame
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    /// Number of frames skipped because of a step fault
    pub fn fault_count(&self) -> u32 {
        self.faults
    }

    pub fn score_client(&self) -> ScoreClient {
        ScoreClient::new(self.tuning.score_api_base.as_str())
    }

    pub fn leaderboard(&self) -> &Leaderboard {
        &self.leaderboard
    }

    /// Replace the board with a freshly fetched one
    pub fn set_leaderboard(&mut self, board: Leaderboard) {
        log::info!("Leaderboard updated ({} entries)", board.len());
        self.leaderboard = board;
    }

    /// Final score awaiting a name, if any
    pub fn score_offer(&self) -> Option<u64> {
        self.score_offer
    }

    /// Turn the pending offer into a submittable entry
    pub fn submission(&self, name: &str) -> Result<ScoreEntry, ScoreError> {
        let score = self.score_offer.ok_or(ScoreError::NothingToSubmit)?;
        ScoreEntry::new(name, score)
    }

    /// Record a submission the service accepted
    pub fn submitted(&mut self, entry: ScoreEntry) {
        if self.score_offer == Some(entry.score) {
            self.score_offer = None;
        }
        self.leaderboard.insert(entry);
        self.leaderboard.save_cached();
    }

    /// Player declined to submit
    pub fn dismiss_offer(&mut self) {
        self.score_offer = None;
    }
}
