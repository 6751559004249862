//! Integer-lattice voxel indexing.
//!
//! 3D space is partitioned into cubic voxels of side `decimation_size`.
//! A [`VoxelIndex`] identifies one cell; conversion from world coordinates
//! uses half-away-from-zero rounding, so voxel `(i, j, k)` is centered on
//! `(i, j, k) * decimation_size`.

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

use super::point::Point3;

/// Index of one voxel on the decimation lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VoxelIndex {
    /// X cell index
    pub x: i32,
    /// Y cell index
    pub y: i32,
    /// Z cell index
    pub z: i32,
}

impl VoxelIndex {
    /// Create a new index.
    #[inline]
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Index of the voxel containing `p`, given `inv_size = 1 / decimation_size`.
    #[inline]
    pub fn from_point(p: Point3, inv_size: f32) -> Self {
        Self {
            x: coord_to_index(p.x, inv_size),
            y: coord_to_index(p.y, inv_size),
            z: coord_to_index(p.z, inv_size),
        }
    }

    /// World coordinates of this voxel's center.
    #[inline]
    pub fn center(&self, size: f32) -> Point3 {
        Point3::new(
            index_to_coord(self.x, size),
            index_to_coord(self.y, size),
            index_to_coord(self.z, size),
        )
    }

    /// This index shifted by `(dx, dy, dz)` cells.
    #[inline]
    pub fn offset(&self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }
}

// Order-sensitive triple hash: each axis is mixed with its own large prime
// before folding, so permuted triples land in different buckets.
impl Hash for VoxelIndex {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        let mixed = (self.x as i64).wrapping_mul(73_856_093)
            ^ (self.y as i64).wrapping_mul(19_349_663)
            ^ (self.z as i64).wrapping_mul(83_492_791);
        state.write_i64(mixed);
    }
}

/// World coordinate to cell index along one axis.
///
/// Rounds half away from zero; a point exactly on the ±`size/2` boundary
/// therefore lands in the cell farther from the origin, consistently
/// across runs.
#[inline]
pub fn coord_to_index(v: f32, inv_size: f32) -> i32 {
    (v * inv_size).round() as i32
}

/// Cell index to the world coordinate of the voxel center along one axis.
#[inline]
pub fn index_to_coord(i: i32, size: f32) -> f32 {
    i as f32 * size
}

/// Iterate the cubic neighborhood of `center` with Chebyshev radius `radius`.
///
/// Yields all `(2*radius + 1)^3` indices, including `center` itself, in
/// lexicographic `(dx, dy, dz)` order.
pub fn neighborhood_cube(center: VoxelIndex, radius: i32) -> impl Iterator<Item = VoxelIndex> {
    debug_assert!(radius >= 0);
    (-radius..=radius).flat_map(move |dx| {
        (-radius..=radius)
            .flat_map(move |dy| (-radius..=radius).map(move |dz| center.offset(dx, dy, dz)))
    })
}
