//! Entity collections
//!
//! One ordered collection per entity kind. Destruction is a flag; the entity
//! stays in place (invisible to the active iterators) until the next prune.

use super::state::{Bullet, Enemy, Explosion, PowerUp, Star};

/// Lifecycle hooks every registry entity provides
pub trait Entity {
    fn id(&self) -> u32;
    fn is_destroyed(&self) -> bool;
    fn mark_destroyed(&mut self);
}

/// Ordered collection of one entity kind (spawn order)
#[derive(Debug, Clone)]
pub struct Registry<T> {
    items: Vec<T>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Entity> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity, returning its id
    pub fn spawn(&mut self, entity: T) -> u32 {
        let id = entity.id();
        self.items.push(entity);
        id
    }

    /// Flag an entity for removal. Returns true only on the first call.
    pub fn mark_destroyed(&mut self, id: u32) -> bool {
        match self.items.iter_mut().find(|e| e.id() == id) {
            Some(entity) if !entity.is_destroyed() => {
                entity.mark_destroyed();
                true
            }
            _ => false,
        }
    }

    /// Drop all destroyed entities; returns how many were removed
    pub fn prune(&mut self) -> usize {
        let before = self.items.len();
        self.items.retain(|e| !e.is_destroyed());
        before - self.items.len()
    }

    pub fn for_each_active(&self, mut f: impl FnMut(&T)) {
        self.iter_active().for_each(|e| f(e));
    }

    pub fn for_each_active_mut(&mut self, mut f: impl FnMut(&mut T)) {
        self.iter_active_mut().for_each(|e| f(e));
    }

    pub fn iter_active(&self) -> impl Iterator<Item = &T> {
        self.items.iter().filter(|e| !e.is_destroyed())
    }

    pub fn iter_active_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.items.iter_mut().filter(|e| !e.is_destroyed())
    }

    /// Active entity by id
    pub fn get(&self, id: u32) -> Option<&T> {
        self.iter_active().find(|e| e.id() == id)
    }

    /// Active entity by id
    pub fn get_mut(&mut self, id: u32) -> Option<&mut T> {
        self.iter_active_mut().find(|e| e.id() == id)
    }

    pub fn active_count(&self) -> usize {
        self.iter_active().count()
    }

    /// Number of stored entities, destroyed ones included
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Every stored entity, destroyed ones included
    pub fn all(&self) -> &[T] {
        &self.items
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

/// All entity collections of a game
#[derive(Debug, Clone, Default)]
pub struct Registries {
    pub bullets: Registry<Bullet>,
    pub enemies: Registry<Enemy>,
    pub power_ups: Registry<PowerUp>,
    pub stars: Registry<Star>,
    pub explosions: Registry<Explosion>,
}

impl Registries {
    /// Prune every collection; returns the total removed
    pub fn prune_all(&mut self) -> usize {
        self.bullets.prune()
            + self.enemies.prune()
            + self.power_ups.prune()
            + self.stars.prune()
            + self.explosions.prune()
    }

    /// Remove everything a round owns. Stars are cosmetic and survive.
    pub fn clear_gameplay(&mut self) {
        self.bullets.clear();
        self.enemies.clear();
        self.power_ups.clear();
        self.explosions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn bullet(id: u32) -> Bullet {
        Bullet::new(id, Vec2::new(10.0, 100.0), Vec2::new(8.0, 16.0), 5.0)
    }

    #[test]
    fn test_spawn_and_lookup() {
        let mut reg = Registry::new();
        assert_eq!(reg.spawn(bullet(1)), 1);
        assert_eq!(reg.spawn(bullet(2)), 2);
        assert_eq!(reg.active_count(), 2);
        assert!(reg.get(2).is_some());
        assert!(reg.get(3).is_none());
    }

    #[test]
    fn test_mark_destroyed_is_idempotent() {
        let mut reg = Registry::new();
        reg.spawn(bullet(1));
        assert!(reg.mark_destroyed(1));
        assert!(!reg.mark_destroyed(1));
        assert!(!reg.mark_destroyed(99));
        // Still stored until prune, but no longer active
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.active_count(), 0);
        assert!(reg.get(1).is_none());
    }

    #[test]
    fn test_prune_removes_only_destroyed() {
        let mut reg = Registry::new();
        for id in 1..=5 {
            reg.spawn(bullet(id));
        }
        reg.mark_destroyed(2);
        reg.mark_destroyed(4);
        assert_eq!(reg.prune(), 2);
        assert!(reg.all().iter().all(|b| !b.is_destroyed()));
        let ids: Vec<u32> = reg.all().iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![1, 3, 5]);
    }

    #[test]
    fn test_for_each_active_skips_destroyed() {
        let mut reg = Registry::new();
        reg.spawn(bullet(1));
        reg.spawn(bullet(2));
        reg.mark_destroyed(1);
        let mut seen = Vec::new();
        reg.for_each_active(|b| seen.push(b.id));
        assert_eq!(seen, vec![2]);

        reg.for_each_active_mut(|b| b.pos.y = 0.0);
        assert_eq!(reg.all()[0].pos.y, 100.0);
        assert_eq!(reg.all()[1].pos.y, 0.0);
    }

    #[test]
    fn test_prune_all_and_clear_gameplay() {
        let mut world = Registries::default();
        world.bullets.spawn(bullet(1));
        world.bullets.spawn(bullet(2));
        world.stars.spawn(Star::new(3, Vec2::ZERO, 2.0, 1.0, 0.0));
        world.bullets.mark_destroyed(1);
        assert_eq!(world.prune_all(), 1);

        world.clear_gameplay();
        assert!(world.bullets.is_empty());
        assert_eq!(world.stars.len(), 1);
    }
}
