//! SE(3) rigid transforms.

use serde::{Deserialize, Serialize};

use super::point::Point3;

/// A rigid transform in 3D: rotation matrix plus translation.
///
/// Maps points from a local (sensor/vehicle) frame into a parent frame:
/// `p_parent = R * p_local + t`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose3 {
    /// Row-major 3x3 rotation matrix
    pub rot: [[f32; 3]; 3],
    /// Translation in meters
    pub translation: Point3,
}

impl Pose3 {
    /// Identity transform.
    #[inline]
    pub fn identity() -> Self {
        Self {
            rot: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            translation: Point3::ZERO,
        }
    }

    /// Pure translation.
    #[inline]
    pub fn from_translation(x: f32, y: f32, z: f32) -> Self {
        Self {
            translation: Point3::new(x, y, z),
            ..Self::identity()
        }
    }

    /// Build from translation and Z-Y-X Euler angles.
    ///
    /// `yaw` rotates about +Z, `pitch` about +Y, `roll` about +X, applied
    /// in that order (the usual vehicle-frame convention). Angles in radians.
    pub fn from_yaw_pitch_roll(x: f32, y: f32, z: f32, yaw: f32, pitch: f32, roll: f32) -> Self {
        let (sy, cy) = yaw.sin_cos();
        let (sp, cp) = pitch.sin_cos();
        let (sr, cr) = roll.sin_cos();

        let rot = [
            [cy * cp, cy * sp * sr - sy * cr, cy * sp * cr + sy * sr],
            [sy * cp, sy * sp * sr + cy * cr, sy * sp * cr - cy * sr],
            [-sp, cp * sr, cp * cr],
        ];

        Self {
            rot,
            translation: Point3::new(x, y, z),
        }
    }

    /// Compose two transforms: `self ⊕ other`.
    ///
    /// The result maps a point first through `other`, then through `self`.
    pub fn compose(&self, other: &Pose3) -> Pose3 {
        let a = &self.rot;
        let b = &other.rot;
        let mut rot = [[0.0f32; 3]; 3];
        for (i, row) in rot.iter_mut().enumerate() {
            for (j, out) in row.iter_mut().enumerate() {
                *out = a[i][0] * b[0][j] + a[i][1] * b[1][j] + a[i][2] * b[2][j];
            }
        }
        Pose3 {
            rot,
            translation: self.transform_point(other.translation),
        }
    }

    /// Inverse transform: `self.inverse().compose(&self)` is the identity.
    pub fn inverse(&self) -> Pose3 {
        let r = &self.rot;
        // transpose of an orthonormal matrix is its inverse
        let rot = [
            [r[0][0], r[1][0], r[2][0]],
            [r[0][1], r[1][1], r[2][1]],
            [r[0][2], r[1][2], r[2][2]],
        ];
        let t = self.translation;
        let translation = Point3::new(
            -(rot[0][0] * t.x + rot[0][1] * t.y + rot[0][2] * t.z),
            -(rot[1][0] * t.x + rot[1][1] * t.y + rot[1][2] * t.z),
            -(rot[2][0] * t.x + rot[2][1] * t.y + rot[2][2] * t.z),
        );
        Pose3 { rot, translation }
    }

    /// Transform a point from the local frame into the parent frame.
    #[inline]
    pub fn transform_point(&self, p: Point3) -> Point3 {
        let r = &self.rot;
        let t = self.translation;
        Point3::new(
            r[0][0] * p.x + r[0][1] * p.y + r[0][2] * p.z + t.x,
            r[1][0] * p.x + r[1][1] * p.y + r[1][2] * p.z + t.y,
            r[2][0] * p.x + r[2][1] * p.y + r[2][2] * p.z + t.z,
        )
    }

    /// Transform a point from the parent frame into the local frame.
    #[inline]
    pub fn inverse_transform_point(&self, p: Point3) -> Point3 {
        let r = &self.rot;
        let d = p - self.translation;
        Point3::new(
            r[0][0] * d.x + r[1][0] * d.y + r[2][0] * d.z,
            r[0][1] * d.x + r[1][1] * d.y + r[2][1] * d.z,
            r[0][2] * d.x + r[1][2] * d.y + r[2][2] * d.z,
        )
    }
}

impl Default for Pose3 {
    fn default() -> Self {
        Self::identity()
    }
}
