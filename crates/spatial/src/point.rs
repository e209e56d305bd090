//! Point abstraction consumed by the quadtree.
//!
//! The tree never stores points. It keeps the position of each point in the
//! caller's slice and reads coordinates back through this trait.

use glam::{DVec2, Vec2};

/// Anything with a planar position.
pub trait Point {
    fn x(&self) -> f64;
    fn y(&self) -> f64;

    /// Both coordinates are finite (no NaN, no infinity).
    #[inline]
    fn is_finite(&self) -> bool {
        self.x().is_finite() && self.y().is_finite()
    }
}

impl Point for DVec2 {
    #[inline]
    fn x(&self) -> f64 {
        self.x
    }

    #[inline]
    fn y(&self) -> f64 {
        self.y
    }
}

impl Point for Vec2 {
    #[inline]
    fn x(&self) -> f64 {
        self.x as f64
    }

    #[inline]
    fn y(&self) -> f64 {
        self.y as f64
    }
}

impl Point for (f64, f64) {
    #[inline]
    fn x(&self) -> f64 {
        self.0
    }

    #[inline]
    fn y(&self) -> f64 {
        self.1
    }
}

impl Point for [f64; 2] {
    #[inline]
    fn x(&self) -> f64 {
        self[0]
    }

    #[inline]
    fn y(&self) -> f64 {
        self[1]
    }
}

impl<T: Point + ?Sized> Point for &T {
    #[inline]
    fn x(&self) -> f64 {
        (**self).x()
    }

    #[inline]
    fn y(&self) -> f64 {
        (**self).y()
    }
}
