//! Point and bounding-box types for the 3D voxel map.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

/// A 3D point in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point3 {
    /// X coordinate in meters
    pub x: f32,
    /// Y coordinate in meters
    pub y: f32,
    /// Z coordinate in meters
    pub z: f32,
}

impl Point3 {
    /// Origin point.
    pub const ZERO: Point3 = Point3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// Create a new point.
    #[inline]
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Squared distance to another point (avoids sqrt).
    #[inline]
    pub fn distance_squared(&self, other: &Point3) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }

    /// Distance to another point.
    #[inline]
    pub fn distance(&self, other: &Point3) -> f32 {
        self.distance_squared(other).sqrt()
    }
}

impl Default for Point3 {
    fn default() -> Self {
        Self::ZERO
    }
}

impl Add for Point3 {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Point3::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl Sub for Point3 {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Point3::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

/// Axis-aligned bounding box in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds3 {
    /// Minimum corner
    pub min: Point3,
    /// Maximum corner
    pub max: Point3,
}

impl Bounds3 {
    /// The degenerate zero box, reported for maps without points.
    pub const ZERO: Bounds3 = Bounds3 {
        min: Point3::ZERO,
        max: Point3::ZERO,
    };

    /// A box containing exactly one point.
    #[inline]
    pub fn from_point(p: Point3) -> Self {
        Self { min: p, max: p }
    }

    /// Grow the box to contain `p`.
    #[inline]
    pub fn expand_to(&mut self, p: Point3) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    /// Whether `p` lies inside the box (inclusive on all faces).
    #[inline]
    pub fn contains(&self, p: Point3) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }
}

impl Default for Bounds3 {
    fn default() -> Self {
        Self::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_squared() {
        let a = Point3::new(1.0, 2.0, 3.0);
        let b = Point3::new(1.0, 2.0, 5.0);
        assert_eq!(a.distance_squared(&b), 4.0);
        assert_eq!(a.distance(&b), 2.0);
    }

    #[test]
    fn test_bounds_expand() {
        let mut b = Bounds3::from_point(Point3::new(1.0, 1.0, 1.0));
        b.expand_to(Point3::new(-1.0, 2.0, 0.5));
        assert_eq!(b.min, Point3::new(-1.0, 1.0, 0.5));
        assert_eq!(b.max, Point3::new(1.0, 2.0, 1.0));
        assert!(b.contains(Point3::new(0.0, 1.5, 0.75)));
        assert!(!b.contains(Point3::new(0.0, 3.0, 0.75)));
    }
}
