//! Per-frame simulation step
//!
//! Runs once per animation frame with the frame timestamp. Stage order:
//! prune, deferred effects, stars, then (Running only) movement, collisions,
//! spawning and the game-over check.

use glam::Vec2;
use thiserror::Error;

use super::collision::{Collider, intersects};
use super::effects::{Effect, run_due, schedule_after};
use super::spawner;
use super::state::{GameEvent, GamePhase, GameState};
use crate::consts::*;
use crate::tuning::Tuning;

/// Input sampled for a single frame
#[derive(Debug, Clone, Default)]
pub struct FrameInput {
    /// Latest pointer/touch position, if it moved
    pub pointer: Option<Vec2>,
    /// Fire pressed since the previous frame
    pub fire_pressed: bool,
    /// Fire button currently down
    pub fire_held: bool,
}

/// A step aborted part-way; the frame's remaining stages were skipped
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StepFault {
    #[error("frame timestamp is not finite: {0}")]
    NonFiniteTime(f64),
    #[error("frame timestamp went backwards: {now_ms} < {last_ms}")]
    ClockWentBackwards { now_ms: f64, last_ms: f64 },
    #[error("{kind} {id} has a non-finite position")]
    NonFinitePosition { kind: &'static str, id: u32 },
}

/// Advance the game by one frame at timestamp `now_ms`
pub fn step(
    state: &mut GameState,
    input: &FrameInput,
    tuning: &Tuning,
    now_ms: f64,
) -> Result<(), StepFault> {
    state.events.clear();

    let frames = frame_factor(state, now_ms)?;

    state.world.prune_all();
    run_due(state);

    // Background always animates
    move_stars(state, tuning, frames);
    spawner::try_spawn_star(state, tuning, now_ms);

    if state.phase != GamePhase::Running {
        return Ok(());
    }

    state.clock.gameplay_ms += frames as f64 * FRAME_MS;

    track_pointer(state, tuning, input.pointer);
    advance_entities(state, tuning, frames);
    check_positions(state)?;

    resolve_bullet_hits(state, tuning);
    resolve_player_enemy_hits(state, tuning);
    resolve_power_up_pickups(state);

    spawner::ramp_difficulty(state, tuning);
    spawner::try_spawn_enemy(state, tuning);
    spawner::try_fire(state, tuning, input.fire_pressed, input.fire_held);
    spawner::recharge_energy(state, tuning);

    if state.player.health == 0 {
        state.phase = GamePhase::GameOver;
        state.events.push(GameEvent::GameOver { score: state.score });
        log::info!("Game over - score {} (round {})", state.score, state.round);
    }

    Ok(())
}

/// Elapsed time since the previous frame, in 60 Hz frames
fn frame_factor(state: &mut GameState, now_ms: f64) -> Result<f32, StepFault> {
    if !now_ms.is_finite() {
        return Err(StepFault::NonFiniteTime(now_ms));
    }
    let last = state.clock.last_frame_ms.replace(now_ms);
    let Some(last_ms) = last else {
        return Ok(1.0);
    };
    if now_ms < last_ms {
        return Err(StepFault::ClockWentBackwards { now_ms, last_ms });
    }
    Ok((((now_ms - last_ms) / FRAME_MS) as f32).min(MAX_FRAME_FACTOR))
}

fn move_stars(state: &mut GameState, tuning: &Tuning, frames: f32) {
    let bottom = tuning.screen_height;
    state.world.stars.for_each_active_mut(|star| {
        star.pos.y += star.speed * frames;
        if star.pos.y - star.radius > bottom {
            star.destroyed = true;
        }
    });
}

/// Snap the player to the pointer, kept on screen
fn track_pointer(state: &mut GameState, tuning: &Tuning, pointer: Option<Vec2>) {
    let player = &mut state.player;
    if let Some(target) = pointer.filter(|p| p.is_finite()) {
        let max = Vec2::new(tuning.screen_width, tuning.screen_height);
        player.target = target.clamp(Vec2::ZERO, max);
    }
    player.pos = player.target;
}

/// Move everything and cull what left the screen
fn advance_entities(state: &mut GameState, tuning: &Tuning, frames: f32) {
    let bottom = tuning.screen_height;
    let world = &mut state.world;
    let mut escaped = Vec::new();

    world.enemies.for_each_active_mut(|enemy| {
        enemy.pos.y += enemy.speed * frames;
        if top_edge(&*enemy) >= bottom {
            enemy.destroyed = true;
            escaped.push(enemy.id);
        }
    });
    world.power_ups.for_each_active_mut(|power_up| {
        power_up.pos.y += power_up.speed * frames;
        if top_edge(&*power_up) >= bottom {
            power_up.destroyed = true;
        }
    });
    world.bullets.for_each_active_mut(|bullet| {
        bullet.pos.y -= bullet.speed * frames;
        let bottom_edge = bullet.bounds().map_or(bullet.pos.y, |b| b.bottom());
        if bottom_edge <= 0.0 {
            bullet.destroyed = true;
        }
    });

    for id in escaped {
        state.events.push(GameEvent::EnemyEscaped { id });
        if tuning.enemy_breach_damages {
            damage_player(state, tuning);
        }
    }
}

fn top_edge<C: Collider>(entity: &C) -> f32 {
    entity.bounds().map_or(f32::NEG_INFINITY, |b| b.top)
}

/// Anything that moved to a non-finite position is removed and reported
fn check_positions(state: &mut GameState) -> Result<(), StepFault> {
    let world = &mut state.world;
    let bad_enemy = world
        .enemies
        .iter_active()
        .find(|e| !e.pos.is_finite())
        .map(|e| ("enemy", e.id));
    let bad_bullet = world
        .bullets
        .iter_active()
        .find(|b| !b.pos.is_finite())
        .map(|b| ("bullet", b.id));
    let bad_power_up = world
        .power_ups
        .iter_active()
        .find(|p| !p.pos.is_finite())
        .map(|p| ("power-up", p.id));

    match bad_enemy.or(bad_bullet).or(bad_power_up) {
        Some((kind, id)) => {
            world.enemies.mark_destroyed(id);
            world.bullets.mark_destroyed(id);
            world.power_ups.mark_destroyed(id);
            Err(StepFault::NonFinitePosition { kind, id })
        }
        None => Ok(()),
    }
}

/// Outcome of one bullet hitting one enemy
struct Hit {
    enemy_id: u32,
    hp_left: u32,
    pos: Vec2,
    size: Vec2,
    points: u64,
}

/// Bullets against enemies: each pair is tested at most once per step
fn resolve_bullet_hits(state: &mut GameState, tuning: &Tuning) {
    let world = &mut state.world;
    let mut hits = Vec::new();

    for bullet in world.bullets.iter_active_mut() {
        for enemy in world.enemies.iter_active_mut() {
            if !intersects(&*bullet, &*enemy) {
                continue;
            }
            bullet.destroyed = true;
            enemy.hp = enemy.hp.saturating_sub(1);
            if enemy.hp == 0 {
                enemy.destroyed = true;
            } else {
                enemy.damage_flash = true;
            }
            hits.push(Hit {
                enemy_id: enemy.id,
                hp_left: enemy.hp,
                pos: enemy.pos,
                size: enemy.size,
                points: enemy.points,
            });
            break;
        }
    }

    for hit in hits {
        if hit.hp_left > 0 {
            state.events.push(GameEvent::EnemyHit {
                id: hit.enemy_id,
                hp_left: hit.hp_left,
            });
            let until = schedule_after(
                state,
                tuning.enemy_flash_ms,
                Effect::ClearEnemyFlash {
                    enemy_id: hit.enemy_id,
                },
            );
            if let Some(enemy) = state.world.enemies.get_mut(hit.enemy_id) {
                enemy.flash_until_ms = until;
            }
            continue;
        }
        state.score += hit.points;
        state.events.push(GameEvent::EnemyDestroyed {
            id: hit.enemy_id,
            points: hit.points,
        });
        spawner::spawn_explosion(state, tuning, hit.pos, hit.size);
        spawner::maybe_drop_power_up(state, tuning, hit.pos);
    }
}

/// Enemies ramming the player
fn resolve_player_enemy_hits(state: &mut GameState, tuning: &Tuning) {
    let rammed: Vec<u32> = state
        .world
        .enemies
        .iter_active()
        .filter(|enemy| intersects(&state.player, *enemy))
        .map(|enemy| enemy.id)
        .collect();

    for id in rammed {
        state.world.enemies.mark_destroyed(id);
        let (pos, size) = (state.player.pos, state.player.size);
        spawner::spawn_explosion(state, tuning, pos, size);

        if state.player.shield_active {
            state.player.shield_active = false;
            state.events.push(GameEvent::ShieldConsumed);
        } else {
            damage_player(state, tuning);
        }
    }
}

/// Shield pickups
fn resolve_power_up_pickups(state: &mut GameState) {
    let collected: Vec<u32> = state
        .world
        .power_ups
        .iter_active()
        .filter(|power_up| intersects(&state.player, *power_up))
        .map(|power_up| power_up.id)
        .collect();

    for id in collected {
        state.world.power_ups.mark_destroyed(id);
        state.player.shield_active = true;
        state.events.push(GameEvent::ShieldGained);
    }
}

/// One point of damage plus the hit flash; health never drops below zero
fn damage_player(state: &mut GameState, tuning: &Tuning) {
    if state.player.health == 0 {
        return;
    }
    let health = state.player.damage();
    state.events.push(GameEvent::PlayerHit { health });
    if health > 0 {
        state.player.damage_flash = true;
        state.player.flash_until_ms =
            schedule_after(state, tuning.player_flash_ms, Effect::ClearPlayerFlash);
    }
}
