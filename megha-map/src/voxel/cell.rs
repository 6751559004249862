//! Per-voxel point storage with neighbor adjacency.

use fnv::FnvHashMap;
use smallvec::SmallVec;
use std::sync::OnceLock;

use crate::core::{Point3, VoxelIndex};
use crate::error::{MapError, Result};

/// Inline point capacity per voxel; most voxels in a decimated map stay
/// under this, avoiding a heap allocation per cell.
pub const INLINE_POINTS: usize = 16;

/// One voxel of the dual map: stored points, a lazy centroid, and links to
/// every cell in its search neighborhood.
///
/// Neighbor links are arena slots into the owning map. The key set always
/// covers the full `(2r+1)^3` neighborhood cube (self included); an entry
/// is `None` while that neighbor voxel has never been populated.
#[derive(Debug, Default)]
pub struct VoxelCell {
    points: SmallVec<[Point3; INLINE_POINTS]>,
    centroid: OnceLock<Point3>,
    neighbors: FnvHashMap<VoxelIndex, Option<u32>>,
}

impl VoxelCell {
    /// Stored points, in insertion order.
    #[inline]
    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    /// Number of stored points.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the cell holds no points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Append `p` unless the cell is at capacity.
    ///
    /// With `max_points > 0` a full cell silently drops the incoming point:
    /// decimation keeps the oldest samples. Returns whether the point was
    /// stored; a successful insert invalidates the centroid cache.
    pub fn insert_point(&mut self, p: Point3, max_points: u32) -> bool {
        if max_points > 0 && self.points.len() >= max_points as usize {
            return false;
        }
        self.points.push(p);
        self.centroid = OnceLock::new();
        true
    }

    /// Mean of all stored points, cached until the next insert.
    ///
    /// Fails with [`MapError::EmptyVoxel`] on a cell without points.
    pub fn centroid(&self) -> Result<Point3> {
        if self.points.is_empty() {
            return Err(MapError::EmptyVoxel);
        }
        Ok(*self.centroid.get_or_init(|| {
            let mut sum = Point3::ZERO;
            for p in &self.points {
                sum = sum + *p;
            }
            let n = self.points.len() as f32;
            Point3::new(sum.x / n, sum.y / n, sum.z / n)
        }))
    }

    /// Neighbor adjacency: neighborhood index -> arena slot of that cell,
    /// `None` while the neighbor voxel is unpopulated.
    #[inline]
    pub fn neighbors(&self) -> &FnvHashMap<VoxelIndex, Option<u32>> {
        &self.neighbors
    }

    #[inline]
    pub(crate) fn neighbors_mut(&mut self) -> &mut FnvHashMap<VoxelIndex, Option<u32>> {
        &mut self.neighbors
    }
}
