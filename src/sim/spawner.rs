//! Time-gated entity creation
//!
//! Enemies, bullets and power-ups run on the gameplay clock; stars run on the
//! frame clock so the background keeps moving while paused.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::collision::Collider;
use super::effects::{Effect, schedule_after};
use super::registry::Registry;
use super::state::{Bullet, Enemy, Explosion, GameEvent, GameState, PowerUp, Star};
use crate::consts::*;
use crate::tuning::{EnemyKind, FireMode, Tuning};

/// Weighted pick between the enemy types
pub fn choose_enemy_kind(rng: &mut Pcg32, large_chance: f64) -> EnemyKind {
    let chance = large_chance.clamp(0.0, MAX_LARGE_ENEMY_CHANCE);
    if rng.random_bool(chance) {
        EnemyKind::Large
    } else {
        EnemyKind::Standard
    }
}

/// Pick a spawn column that does not overlap an enemy still near the top,
/// meaning its top edge is within twice its height of the screen top
///
/// Tries a fixed number of random columns, then gives up and returns 0.
pub fn pick_spawn_x(rng: &mut Pcg32, enemies: &Registry<Enemy>, width: f32, screen_width: f32) -> f32 {
    for _ in 0..ENEMY_PLACEMENT_ATTEMPTS {
        let x = rng.random_range(0.0..screen_width);
        let occupied = enemies.iter_active().any(|other| {
            let near_top = other.bounds().is_some_and(|b| b.top < b.height * 2.0);
            let overlaps = (other.pos.x - x).abs() < (other.size.x + width) / 2.0;
            near_top && overlaps
        });
        if !occupied {
            return x;
        }
    }
    log::debug!("No free spawn column after {} attempts", ENEMY_PLACEMENT_ATTEMPTS);
    0.0
}

/// Create one enemy at the top of the screen
pub fn spawn_enemy(state: &mut GameState, tuning: &Tuning) -> u32 {
    let kind = choose_enemy_kind(&mut state.rng, tuning.large_chance);
    let stats = *tuning.enemies.stats(kind);
    let x = pick_spawn_x(&mut state.rng, &state.world.enemies, stats.width, tuning.screen_width);
    let speed = state.rng.random_range(1..=stats.max_speed) as f32;

    let id = state.next_entity_id();
    let enemy = Enemy::new(id, kind, Vec2::new(x, 0.0), speed, tuning);
    state.world.enemies.spawn(enemy);
    state.events.push(GameEvent::EnemySpawned { id, kind });
    id
}

/// Shrink the enemy cadence once per ramp interval, down to the floor
pub fn ramp_difficulty(state: &mut GameState, tuning: &Tuning) {
    let cadence = &tuning.cadence;
    if cadence.ramp_step_ms <= 0.0 || cadence.ramp_interval_ms <= 0.0 {
        return;
    }
    let timers = &mut state.timers;
    if state.clock.gameplay_ms - timers.last_ramp_ms >= cadence.ramp_interval_ms {
        timers.last_ramp_ms += cadence.ramp_interval_ms;
        if timers.enemy_cadence_ms > cadence.floor_ms {
            timers.enemy_cadence_ms = (timers.enemy_cadence_ms - cadence.ramp_step_ms).max(cadence.floor_ms);
            log::debug!("Enemy cadence now {} ms", timers.enemy_cadence_ms);
        }
    }
}

/// Spawn an enemy if the cadence has elapsed
pub fn try_spawn_enemy(state: &mut GameState, tuning: &Tuning) -> Option<u32> {
    let now = state.clock.gameplay_ms;
    if now - state.timers.last_enemy_ms < state.timers.enemy_cadence_ms {
        return None;
    }
    state.timers.last_enemy_ms = now;
    Some(spawn_enemy(state, tuning))
}

/// Fire a bullet from the player's position if the gun allows it
///
/// `pressed` is a fresh press this frame, `held` a button kept down. Cooldown
/// guns auto-fire while held; energy guns fire once per press.
pub fn try_fire(state: &mut GameState, tuning: &Tuning, pressed: bool, held: bool) -> Option<u32> {
    let now = state.clock.gameplay_ms;
    match tuning.fire_mode {
        FireMode::Cooldown { cooldown_ms } => {
            if !(pressed || held) {
                return None;
            }
            if let Some(last) = state.timers.last_shot_ms {
                if now - last < cooldown_ms {
                    return None;
                }
            }
        }
        FireMode::Energy { .. } => {
            if !pressed || state.energy == 0 {
                return None;
            }
            state.energy -= 1;
        }
    }
    state.timers.last_shot_ms = Some(now);

    let id = state.next_entity_id();
    let size = Vec2::new(tuning.bullet_width, tuning.bullet_height);
    state
        .world
        .bullets
        .spawn(Bullet::new(id, state.player.pos, size, tuning.bullet_speed));
    state.events.push(GameEvent::BulletFired { id });
    Some(id)
}

/// Give back one unit of gun energy per recharge interval
pub fn recharge_energy(state: &mut GameState, tuning: &Tuning) {
    let FireMode::Energy {
        max_energy,
        recharge_ms,
    } = tuning.fire_mode
    else {
        return;
    };
    let now = state.clock.gameplay_ms;
    if state.energy >= max_energy {
        state.energy = max_energy;
        state.timers.last_recharge_ms = now;
    } else if now - state.timers.last_recharge_ms >= recharge_ms {
        state.energy += 1;
        state.timers.last_recharge_ms = now;
    }
}

/// Roll for a shield drop where an enemy died
pub fn maybe_drop_power_up(state: &mut GameState, tuning: &Tuning, pos: Vec2) -> Option<u32> {
    if !state.rng.random_bool(tuning.power_up_chance.clamp(0.0, 1.0)) {
        return None;
    }
    let id = state.next_entity_id();
    state.world.power_ups.spawn(PowerUp {
        id,
        pos,
        size: Vec2::splat(tuning.power_up_size),
        speed: tuning.power_up_speed,
        destroyed: false,
    });
    state.events.push(GameEvent::PowerUpDropped { id });
    Some(id)
}

/// Spawn an explosion and schedule its removal
pub fn spawn_explosion(state: &mut GameState, tuning: &Tuning, pos: Vec2, size: Vec2) -> u32 {
    let id = state.next_entity_id();
    state.world.explosions.spawn(Explosion {
        id,
        pos,
        size,
        destroyed: false,
    });
    schedule_after(
        state,
        tuning.explosion_lifetime_ms,
        Effect::ExpireExplosion { explosion_id: id },
    );
    state.events.push(GameEvent::Explosion { pos });
    id
}

/// One star at a random column
pub fn spawn_star(state: &mut GameState, tuning: &Tuning, y: f32) -> u32 {
    let rng = &mut state.rng;
    let x = rng.random_range(0.0..tuning.screen_width).floor();
    let radius = rng.random_range(STAR_MIN_RADIUS..STAR_MAX_RADIUS);
    let rotation = rng.random_range(0.0..std::f32::consts::TAU);
    let speed = rng.random_range(1..=STAR_MAX_SPEED) as f32;

    let id = state.next_entity_id();
    state
        .world
        .stars
        .spawn(Star::new(id, Vec2::new(x, y), radius, speed, rotation));
    id
}

/// Initial star field spread over the screen height
pub fn seed_starfield(state: &mut GameState, tuning: &Tuning) {
    for index in 0..tuning.initial_stars {
        let y = if index == 0 {
            STAR_SPAWN_Y
        } else {
            (index as f32 * 0.9382 * tuning.screen_height) % tuning.screen_height
        };
        spawn_star(state, tuning, y);
    }
}

/// Spawn a star at the top if the star cadence has elapsed
pub fn try_spawn_star(state: &mut GameState, tuning: &Tuning, now_ms: f64) -> Option<u32> {
    if let Some(last) = state.timers.last_star_ms {
        if now_ms - last < tuning.star_cadence_ms {
            return None;
        }
    }
    state.timers.last_star_ms = Some(now_ms);
    Some(spawn_star(state, tuning, STAR_SPAWN_Y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn running_state(tuning: &Tuning) -> GameState {
        let mut state = GameState::new(42, tuning);
        state.phase = crate::sim::state::GamePhase::Running;
        state
    }

    #[test]
    fn test_choose_enemy_kind_extremes() {
        let mut rng = Pcg32::seed_from_u64(1);
        for _ in 0..50 {
            assert_eq!(choose_enemy_kind(&mut rng, 0.0), EnemyKind::Standard);
        }
        // Requested chance above the cap is clamped, so both kinds appear
        let large = (0..2000)
            .filter(|_| choose_enemy_kind(&mut rng, 1.0) == EnemyKind::Large)
            .count();
        assert!(large > 200 && large < 600, "large count {large}");
    }

    #[test]
    fn test_pick_spawn_x_avoids_enemies_near_top() {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(9);
        let mut enemies = Registry::new();
        // Block everything except the right edge
        for (id, x) in [(1, 100.0), (2, 300.0), (3, 500.0)] {
            let mut e = Enemy::new(id, EnemyKind::Standard, Vec2::new(x, 0.0), 1.0, &tuning);
            e.size = Vec2::new(200.0, 40.0);
            enemies.spawn(e);
        }
        for _ in 0..20 {
            let x = pick_spawn_x(&mut rng, &enemies, 40.0, 800.0);
            assert!(x == 0.0 || x >= 620.0, "picked occupied column {x}");
        }
    }

    #[test]
    fn test_pick_spawn_x_falls_back_to_zero() {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(3);
        let mut enemies = Registry::new();
        let mut wall = Enemy::new(1, EnemyKind::Large, Vec2::new(400.0, 10.0), 1.0, &tuning);
        wall.size = Vec2::new(2000.0, 40.0);
        enemies.spawn(wall);
        assert_eq!(pick_spawn_x(&mut rng, &enemies, 40.0, 800.0), 0.0);
    }

    #[test]
    fn test_pick_spawn_x_measures_from_top_edge() {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(3);
        let mut enemies = Registry::new();
        // Centre at 90 is past twice the height, the top edge at 70 is not
        let mut wall = Enemy::new(1, EnemyKind::Large, Vec2::new(400.0, 90.0), 1.0, &tuning);
        wall.size = Vec2::new(2000.0, 40.0);
        enemies.spawn(wall);
        assert_eq!(pick_spawn_x(&mut rng, &enemies, 40.0, 800.0), 0.0);
    }

    #[test]
    fn test_pick_spawn_x_ignores_enemies_further_down() {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(3);
        let mut enemies = Registry::new();
        let mut low = Enemy::new(1, EnemyKind::Large, Vec2::new(400.0, 300.0), 1.0, &tuning);
        low.size = Vec2::new(2000.0, 40.0);
        enemies.spawn(low);
        let x = pick_spawn_x(&mut rng, &enemies, 40.0, 800.0);
        assert!((0.0..800.0).contains(&x));
    }

    #[test]
    fn test_spawned_enemy_speed_within_type_max() {
        let tuning = Tuning::default();
        let mut state = running_state(&tuning);
        for _ in 0..100 {
            spawn_enemy(&mut state, &tuning);
        }
        for enemy in state.world.enemies.iter_active() {
            let max = tuning.enemies.stats(enemy.kind).max_speed as f32;
            assert!(enemy.speed >= 1.0 && enemy.speed <= max);
            assert_eq!(enemy.pos.y, 0.0);
        }
    }

    #[test]
    fn test_enemy_cadence_gate() {
        let tuning = Tuning::default();
        let mut state = running_state(&tuning);
        state.clock.gameplay_ms = 1999.0;
        assert!(try_spawn_enemy(&mut state, &tuning).is_none());
        state.clock.gameplay_ms = 2000.0;
        assert!(try_spawn_enemy(&mut state, &tuning).is_some());
        state.clock.gameplay_ms = 2500.0;
        assert!(try_spawn_enemy(&mut state, &tuning).is_none());
        state.clock.gameplay_ms = 4000.0;
        assert!(try_spawn_enemy(&mut state, &tuning).is_some());
    }

    #[test]
    fn test_ramp_stops_at_floor() {
        let tuning = Tuning::default();
        let mut state = running_state(&tuning);
        for step in 1..=20 {
            state.clock.gameplay_ms = step as f64 * tuning.cadence.ramp_interval_ms;
            ramp_difficulty(&mut state, &tuning);
        }
        assert_eq!(state.timers.enemy_cadence_ms, tuning.cadence.floor_ms);
    }

    #[test]
    fn test_ramp_disabled_with_zero_step() {
        let mut tuning = Tuning::default();
        tuning.cadence.ramp_step_ms = 0.0;
        let mut state = running_state(&tuning);
        state.clock.gameplay_ms = 60_000.0;
        ramp_difficulty(&mut state, &tuning);
        assert_eq!(state.timers.enemy_cadence_ms, tuning.cadence.initial_ms);
    }

    #[test]
    fn test_cooldown_fire_rate() {
        let tuning = Tuning::default();
        let mut state = running_state(&tuning);
        state.player.pos = Vec2::new(123.0, 456.0);

        let first = try_fire(&mut state, &tuning, true, false).unwrap();
        assert_eq!(state.world.bullets.get(first).unwrap().pos, Vec2::new(123.0, 456.0));

        state.clock.gameplay_ms = 100.0;
        assert!(try_fire(&mut state, &tuning, false, true).is_none());
        state.clock.gameplay_ms = 250.0;
        assert!(try_fire(&mut state, &tuning, false, true).is_some());
        state.clock.gameplay_ms = 600.0;
        assert!(try_fire(&mut state, &tuning, false, false).is_none());
    }

    #[test]
    fn test_energy_fire_and_recharge() {
        let tuning = Tuning::energy_variant();
        let mut state = running_state(&tuning);
        assert_eq!(state.energy, 5);
        for _ in 0..5 {
            assert!(try_fire(&mut state, &tuning, true, false).is_some());
        }
        assert!(try_fire(&mut state, &tuning, true, false).is_none());
        // Holding does nothing in energy mode
        state.energy = 1;
        assert!(try_fire(&mut state, &tuning, false, true).is_none());

        state.energy = 0;
        state.timers.last_recharge_ms = 0.0;
        state.clock.gameplay_ms = 499.0;
        recharge_energy(&mut state, &tuning);
        assert_eq!(state.energy, 0);
        state.clock.gameplay_ms = 500.0;
        recharge_energy(&mut state, &tuning);
        assert_eq!(state.energy, 1);
    }

    #[test]
    fn test_power_up_chance_bounds() {
        let mut tuning = Tuning::default();
        let mut state = running_state(&tuning);
        tuning.power_up_chance = 0.0;
        assert!(maybe_drop_power_up(&mut state, &tuning, Vec2::ZERO).is_none());
        tuning.power_up_chance = 1.0;
        let id = maybe_drop_power_up(&mut state, &tuning, Vec2::new(5.0, 6.0)).unwrap();
        assert_eq!(state.world.power_ups.get(id).unwrap().pos, Vec2::new(5.0, 6.0));
    }

    #[test]
    fn test_star_cadence() {
        let tuning = Tuning::default();
        let mut state = GameState::new(5, &tuning);
        let before = state.world.stars.len();
        assert!(try_spawn_star(&mut state, &tuning, 1000.0).is_some());
        assert!(try_spawn_star(&mut state, &tuning, 1100.0).is_none());
        assert!(try_spawn_star(&mut state, &tuning, 1250.0).is_some());
        assert_eq!(state.world.stars.len(), before + 2);
        for star in state.world.stars.iter_active() {
            assert!(star.radius >= STAR_MIN_RADIUS && star.radius < STAR_MAX_RADIUS);
            assert!(star.speed >= 1.0 && star.speed <= STAR_MAX_SPEED as f32);
        }
    }
}
