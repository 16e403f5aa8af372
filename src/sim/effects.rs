//! Deferred one-shot effects (hit flashes, explosion expiry)
//!
//! Effects are presentation only, so they run on the frame clock and keep
//! expiring while paused or after game over. Each effect remembers the round
//! it was scheduled in. A restart, the target entity being gone, or a newer
//! hit extending a flash turns it into a no-op when it comes due.

use super::state::GameState;

/// What to do when the timer fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    ClearEnemyFlash { enemy_id: u32 },
    ClearPlayerFlash,
    ExpireExplosion { explosion_id: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Deferred {
    /// Frame time at which the effect fires
    pub due_ms: f64,
    pub round: u32,
    pub effect: Effect,
}

/// Pending effects, in scheduling order
#[derive(Debug, Clone, Default)]
pub struct EffectQueue {
    pending: Vec<Deferred>,
}

impl EffectQueue {
    pub fn schedule(&mut self, due_ms: f64, round: u32, effect: Effect) {
        self.pending.push(Deferred {
            due_ms,
            round,
            effect,
        });
    }

    /// Remove and return every effect due at `now_ms`
    pub fn take_due(&mut self, now_ms: f64) -> Vec<Deferred> {
        let (due, rest): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|d| d.due_ms <= now_ms);
        self.pending = rest;
        due
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Schedule an effect `delay_ms` from the current frame, in the current round.
/// Returns the due time.
pub fn schedule_after(state: &mut GameState, delay_ms: f64, effect: Effect) -> f64 {
    let due = state.clock.frame_ms() + delay_ms;
    let round = state.round;
    state.effects.schedule(due, round, effect);
    due
}

/// Apply every effect that has come due. Returns how many actually applied.
pub fn run_due(state: &mut GameState) -> usize {
    let due = state.effects.take_due(state.clock.frame_ms());
    let mut applied = 0;
    for deferred in due {
        if deferred.round != state.round {
            log::debug!("Dropping stale {:?} from round {}", deferred.effect, deferred.round);
            continue;
        }
        if apply(state, &deferred) {
            applied += 1;
        }
    }
    applied
}

/// Liveness-checked mutation. A flash is only cleared by the timer of the
/// latest hit.
fn apply(state: &mut GameState, deferred: &Deferred) -> bool {
    match deferred.effect {
        Effect::ClearEnemyFlash { enemy_id } => match state.world.enemies.get_mut(enemy_id) {
            Some(enemy) if enemy.flash_until_ms <= deferred.due_ms => {
                enemy.damage_flash = false;
                true
            }
            _ => false,
        },
        Effect::ClearPlayerFlash => {
            if state.player.flash_until_ms > deferred.due_ms {
                return false;
            }
            state.player.damage_flash = false;
            true
        }
        Effect::ExpireExplosion { explosion_id } => {
            state.world.explosions.mark_destroyed(explosion_id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{Enemy, Explosion};
    use crate::tuning::{EnemyKind, Tuning};
    use glam::Vec2;

    fn state_with_enemy() -> (GameState, u32) {
        let tuning = Tuning::default();
        let mut state = GameState::new(1, &tuning);
        let id = state.next_entity_id();
        let mut enemy = Enemy::new(id, EnemyKind::Large, Vec2::new(100.0, 100.0), 1.0, &tuning);
        enemy.damage_flash = true;
        state.world.enemies.spawn(enemy);
        (state, id)
    }

    fn set_frame(state: &mut GameState, now_ms: f64) {
        state.clock.last_frame_ms = Some(now_ms);
    }

    #[test]
    fn test_take_due_keeps_future_effects() {
        let mut queue = EffectQueue::default();
        queue.schedule(100.0, 1, Effect::ClearPlayerFlash);
        queue.schedule(300.0, 1, Effect::ClearPlayerFlash);
        assert_eq!(queue.take_due(150.0).len(), 1);
        assert_eq!(queue.len(), 1);
        assert!(queue.take_due(150.0).is_empty());
        assert_eq!(queue.take_due(300.0).len(), 1);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_enemy_flash_clears_when_due() {
        let (mut state, id) = state_with_enemy();
        let until = schedule_after(&mut state, 150.0, Effect::ClearEnemyFlash { enemy_id: id });
        assert_eq!(until, 150.0);
        state.world.enemies.get_mut(id).unwrap().flash_until_ms = until;

        set_frame(&mut state, 100.0);
        assert_eq!(run_due(&mut state), 0);
        assert!(state.world.enemies.get(id).unwrap().damage_flash);

        set_frame(&mut state, 150.0);
        assert_eq!(run_due(&mut state), 1);
        assert!(!state.world.enemies.get(id).unwrap().damage_flash);
    }

    #[test]
    fn test_flash_on_destroyed_enemy_is_noop() {
        let (mut state, id) = state_with_enemy();
        schedule_after(&mut state, 10.0, Effect::ClearEnemyFlash { enemy_id: id });
        state.world.enemies.mark_destroyed(id);
        set_frame(&mut state, 20.0);
        assert_eq!(run_due(&mut state), 0);
        assert!(state.effects.is_empty());
    }

    #[test]
    fn test_earlier_flash_timer_leaves_newer_flash() {
        let (mut state, id) = state_with_enemy();
        let first = schedule_after(&mut state, 150.0, Effect::ClearEnemyFlash { enemy_id: id });
        state.world.enemies.get_mut(id).unwrap().flash_until_ms = first;

        // Second hit 100 ms later
        set_frame(&mut state, 100.0);
        let second = schedule_after(&mut state, 150.0, Effect::ClearEnemyFlash { enemy_id: id });
        state.world.enemies.get_mut(id).unwrap().flash_until_ms = second;

        set_frame(&mut state, 160.0);
        assert_eq!(run_due(&mut state), 0);
        assert!(state.world.enemies.get(id).unwrap().damage_flash);

        set_frame(&mut state, 250.0);
        assert_eq!(run_due(&mut state), 1);
        assert!(!state.world.enemies.get(id).unwrap().damage_flash);
    }

    #[test]
    fn test_effect_from_previous_round_is_dropped() {
        let tuning = Tuning::default();
        let mut state = GameState::new(1, &tuning);
        set_frame(&mut state, 1000.0);
        state.player.damage_flash = true;
        schedule_after(&mut state, 1500.0, Effect::ClearPlayerFlash);

        // A restart empties the queue; an effect carried over anyway is
        // still ignored by its round
        let round = state.round;
        state.reset_round(&tuning);
        assert!(state.effects.is_empty());
        state.effects.schedule(2500.0, round, Effect::ClearPlayerFlash);

        state.player.damage_flash = true;
        set_frame(&mut state, 3000.0);
        assert_eq!(run_due(&mut state), 0);
        assert!(state.player.damage_flash);
    }

    #[test]
    fn test_explosion_expires() {
        let tuning = Tuning::default();
        let mut state = GameState::new(1, &tuning);
        let id = state.next_entity_id();
        state.world.explosions.spawn(Explosion {
            id,
            pos: Vec2::ZERO,
            size: Vec2::splat(40.0),
            destroyed: false,
        });
        schedule_after(&mut state, 1000.0, Effect::ExpireExplosion { explosion_id: id });
        set_frame(&mut state, 1000.0);
        assert_eq!(run_due(&mut state), 1);
        assert_eq!(state.world.explosions.active_count(), 0);
    }
}
