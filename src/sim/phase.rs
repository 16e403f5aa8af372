//! Game phase transitions driven by player/platform commands
//!
//! `Loading -> Running <-> Paused`, `Running -> GameOver` (inside the step),
//! `GameOver -> Running` via restart.

use super::state::{GamePhase, GameState};
use crate::tuning::Tuning;

/// Commands from the UI and platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Leave the start screen, or resume from pause
    Start,
    Pause,
    Resume,
    TogglePause,
    /// Page/tab lost visibility
    Hidden,
    /// Page/tab became visible again (stays paused)
    Visible,
    /// New round after game over
    Restart,
}

/// Apply a command. Returns false if it does nothing in the current phase.
pub fn apply(state: &mut GameState, tuning: &Tuning, command: Command) -> bool {
    use GamePhase::*;

    let next = match (state.phase, command) {
        (Loading | Paused, Command::Start) => Running,
        (Paused, Command::Resume | Command::TogglePause) => Running,
        (Running, Command::Pause | Command::TogglePause | Command::Hidden) => Paused,
        (GameOver, Command::Restart) => {
            state.reset_round(tuning);
            log::info!("Round {} started", state.round);
            Running
        }
        (phase, command) => {
            log::debug!("Ignoring {:?} while {:?}", command, phase);
            return false;
        }
    };

    if state.phase == Loading {
        log::info!("Game started");
    }
    if command == Command::Hidden {
        log::info!("Auto-paused (page hidden)");
    }
    state.phase = next;
    true
}
