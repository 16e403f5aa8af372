//! Axis-aligned bounding-box collision
//!
//! Entities are positioned by their centre. A box that cannot be computed
//! yet (sprite not measured, position not finite) never collides.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in screen space (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    /// Box of `size` centred on `center`; `None` if either is unusable
    pub fn centered(center: Vec2, size: Vec2) -> Option<Self> {
        if !center.is_finite() || !size.is_finite() || size.x <= 0.0 || size.y <= 0.0 {
            return None;
        }
        Some(Self {
            left: center.x - size.x / 2.0,
            top: center.y - size.y / 2.0,
            width: size.x,
            height: size.y,
        })
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    /// Open-interval overlap: touching edges do not intersect
    #[inline]
    pub fn overlaps(&self, other: &Bounds) -> bool {
        self.left < other.right()
            && self.right() > other.left
            && self.top < other.bottom()
            && self.bottom() > other.top
    }
}

/// Anything that can report a bounding box
pub trait Collider {
    fn bounds(&self) -> Option<Bounds>;
}

impl Collider for Bounds {
    fn bounds(&self) -> Option<Bounds> {
        Some(*self)
    }
}

impl Collider for Option<Bounds> {
    fn bounds(&self) -> Option<Bounds> {
        *self
    }
}

/// Check whether two colliders overlap
///
/// Missing boxes count as a miss rather than an error.
pub fn intersects<A: Collider + ?Sized, B: Collider + ?Sized>(a: &A, b: &B) -> bool {
    match (a.bounds(), b.bounds()) {
        (Some(a), Some(b)) => a.overlaps(&b),
        _ => false,
    }
}
