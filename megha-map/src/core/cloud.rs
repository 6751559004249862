//! SoA point cloud storage.

use serde::{Deserialize, Serialize};

use super::point::Point3;

/// A 3D point cloud in Struct-of-Arrays layout.
///
/// Coordinates are stored as three parallel arrays so bulk transforms and
/// insertions stream through memory linearly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointCloud3 {
    /// X coordinates in meters
    pub xs: Vec<f32>,
    /// Y coordinates in meters
    pub ys: Vec<f32>,
    /// Z coordinates in meters
    pub zs: Vec<f32>,
}

impl PointCloud3 {
    /// Create an empty cloud.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty cloud with reserved capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            xs: Vec::with_capacity(capacity),
            ys: Vec::with_capacity(capacity),
            zs: Vec::with_capacity(capacity),
        }
    }

    /// Build a cloud from a point slice.
    pub fn from_points(points: &[Point3]) -> Self {
        let mut cloud = Self::with_capacity(points.len());
        for p in points {
            cloud.push(*p);
        }
        cloud
    }

    /// Append one point.
    #[inline]
    pub fn push(&mut self, p: Point3) {
        self.xs.push(p.x);
        self.ys.push(p.y);
        self.zs.push(p.z);
    }

    /// Number of points.
    #[inline]
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    /// Whether the cloud has no points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    /// Point at index `i`.
    #[inline]
    pub fn point(&self, i: usize) -> Point3 {
        Point3::new(self.xs[i], self.ys[i], self.zs[i])
    }

    /// Iterate over all points.
    pub fn iter(&self) -> impl Iterator<Item = Point3> + '_ {
        (0..self.len()).map(move |i| self.point(i))
    }

    /// Remove all points, keeping allocations.
    pub fn clear(&mut self) {
        self.xs.clear();
        self.ys.clear();
        self.zs.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_iter() {
        let mut cloud = PointCloud3::new();
        assert!(cloud.is_empty());
        cloud.push(Point3::new(1.0, 2.0, 3.0));
        cloud.push(Point3::new(-1.0, 0.0, 0.5));
        assert_eq!(cloud.len(), 2);
        let pts: Vec<Point3> = cloud.iter().collect();
        assert_eq!(pts[0], Point3::new(1.0, 2.0, 3.0));
        assert_eq!(pts[1], Point3::new(-1.0, 0.0, 0.5));
    }

    #[test]
    fn test_from_points_round_trip() {
        let pts = [Point3::new(0.0, 1.0, 2.0), Point3::new(3.0, 4.0, 5.0)];
        let cloud = PointCloud3::from_points(&pts);
        assert_eq!(cloud.point(1), pts[1]);
    }
}
