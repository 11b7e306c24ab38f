use crate::{Interval, Vec3};

/// A ray in 3D space with origin, direction, and time.
///
/// Rays start at `origin` and travel along `direction`, which is not required
/// to be normalized. The `time` field selects the shutter instant used by
/// moving geometry (motion blur).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    pub time: f32,
}

impl Ray {
    /// Smallest accepted hit distance. Keeps secondary rays from
    /// re-hitting the surface they were spawned on (shadow acne).
    pub const MIN_LENGTH: f32 = 0.001;

    /// Largest accepted hit distance.
    pub const MAX_LENGTH: f32 = f32::INFINITY;

    /// Create a new ray.
    pub fn new(origin: Vec3, direction: Vec3, time: f32) -> Self {
        Self {
            origin,
            direction,
            time,
        }
    }

    /// Create a ray at time 0.
    #[inline]
    pub fn new_simple(origin: Vec3, direction: Vec3) -> Self {
        Self::new(origin, direction, 0.0)
    }

    /// The interval of distances a hit must fall into to count.
    #[inline]
    pub fn valid_range() -> Interval {
        Interval::new(Self::MIN_LENGTH, Self::MAX_LENGTH)
    }

    #[inline]
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    #[inline]
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    #[inline]
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Get the point along the ray at parameter t.
    ///
    /// Returns: origin + t * direction
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

impl Default for Ray {
    fn default() -> Self {
        Self {
            origin: Vec3::ZERO,
            direction: Vec3::Z,
            time: 0.0,
        }
    }
}
