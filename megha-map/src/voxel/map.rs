//! The dual-resolution voxel point-cloud map.

use fnv::FnvHashMap;
use std::sync::OnceLock;

use crate::core::{neighborhood_cube, Bounds3, Point3, Pose3, VoxelIndex};
use crate::error::{MapError, Result};
use crate::likelihood::LikelihoodOptions;
use crate::render::RenderOptions;

use super::cell::VoxelCell;

/// A point cloud stored as a dual-resolution voxel map.
///
/// The fine lattice (side `decimation_size`) bounds point density: each
/// voxel keeps at most `max_points_per_voxel` points (0 = unlimited),
/// dropping late arrivals. On top of that lattice, every cell eagerly
/// maintains links to all cells within `nn_to_decim_ratio` voxels (the
/// coarse neighborhood covering `max_nn_radius`), so bounded
/// nearest-neighbor queries touch a fixed-size adjacency set instead of
/// probing the main table per candidate.
///
/// Cells live in an arena (`Vec`); neighbor links are arena slots, which
/// stay valid for the life of the map since cells are never individually
/// removed. Voxel iteration order is creation order.
///
/// # Concurrency
///
/// Single-writer / multi-reader: `&self` queries may run concurrently on a
/// quiescent map, mutations require `&mut self`. Callers coordinating
/// across threads should wrap the map in an external `RwLock`.
#[derive(Debug)]
pub struct DualVoxelMap {
    decimation_size: f32,
    max_nn_radius: f32,
    max_points_per_voxel: u32,

    // derived in set_voxel_properties()
    inv_decimation: f32,
    max_nn_radius_sq: f32,
    nn_to_decim_ratio: i32,

    cells: Vec<VoxelCell>,
    indices: Vec<VoxelIndex>,
    slot_of: FnvHashMap<VoxelIndex, u32>,

    cached_bbox: OnceLock<Bounds3>,

    /// Parameters of the Gaussian observation-likelihood model.
    pub likelihood_options: LikelihoodOptions,
    /// Serialized visualization preferences; never interpreted here.
    pub render_options: RenderOptions,
}

impl DualVoxelMap {
    /// Create a map.
    ///
    /// * `decimation_size`: voxel side in meters, must be positive.
    /// * `max_nn_radius`: upper bound for NN search in meters, must be at
    ///   least `decimation_size`.
    /// * `max_points_per_voxel`: per-voxel cap; 0 means unlimited.
    pub fn new(decimation_size: f32, max_nn_radius: f32, max_points_per_voxel: u32) -> Result<Self> {
        validate_properties(decimation_size, max_nn_radius)?;
        Ok(Self::with_validated(
            decimation_size,
            max_nn_radius,
            max_points_per_voxel,
        ))
    }

    fn with_validated(decimation_size: f32, max_nn_radius: f32, max_points_per_voxel: u32) -> Self {
        Self {
            decimation_size,
            max_nn_radius,
            max_points_per_voxel,
            inv_decimation: 1.0 / decimation_size,
            max_nn_radius_sq: max_nn_radius * max_nn_radius,
            nn_to_decim_ratio: (max_nn_radius / decimation_size).ceil() as i32,
            cells: Vec::new(),
            indices: Vec::new(),
            slot_of: FnvHashMap::default(),
            cached_bbox: OnceLock::new(),
            likelihood_options: LikelihoodOptions::default(),
            render_options: RenderOptions::default(),
        }
    }

    /// Replace the voxel parameters and clear all current map contents.
    ///
    /// No rebinning is attempted; existing points are dropped.
    pub fn set_voxel_properties(
        &mut self,
        decimation_size: f32,
        max_nn_radius: f32,
        max_points_per_voxel: u32,
    ) -> Result<()> {
        validate_properties(decimation_size, max_nn_radius)?;
        self.decimation_size = decimation_size;
        self.max_nn_radius = max_nn_radius;
        self.max_points_per_voxel = max_points_per_voxel;
        self.inv_decimation = 1.0 / decimation_size;
        self.max_nn_radius_sq = max_nn_radius * max_nn_radius;
        self.nn_to_decim_ratio = (max_nn_radius / decimation_size).ceil() as i32;
        log::debug!(
            "voxel properties set: decimation_size={decimation_size}, \
             max_nn_radius={max_nn_radius}, max_points_per_voxel={max_points_per_voxel}, \
             nn_to_decim_ratio={}; clearing map",
            self.nn_to_decim_ratio
        );
        self.clear();
        Ok(())
    }

    // === Basic properties ===

    /// Voxel side in meters.
    #[inline]
    pub fn decimation_size(&self) -> f32 {
        self.decimation_size
    }

    /// NN search radius bound in meters.
    #[inline]
    pub fn max_nn_radius(&self) -> f32 {
        self.max_nn_radius
    }

    /// Per-voxel point cap (0 = unlimited).
    #[inline]
    pub fn max_points_per_voxel(&self) -> u32 {
        self.max_points_per_voxel
    }

    /// Neighborhood radius in voxels: `ceil(max_nn_radius / decimation_size)`.
    #[inline]
    pub fn nn_to_decim_ratio(&self) -> i32 {
        self.nn_to_decim_ratio
    }

    /// Number of populated voxels.
    #[inline]
    pub fn voxel_count(&self) -> usize {
        self.cells.len()
    }

    /// Cell at a lattice index, if populated.
    pub fn voxel(&self, index: VoxelIndex) -> Option<&VoxelCell> {
        self.slot_of
            .get(&index)
            .map(|&slot| &self.cells[slot as usize])
    }

    /// Lattice index of the voxel containing `p`.
    #[inline]
    pub fn index_of(&self, p: Point3) -> VoxelIndex {
        VoxelIndex::from_point(p, self.inv_decimation)
    }

    /// True iff the map holds no points at all.
    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|c| c.is_empty())
    }

    // === Mutation ===

    /// Insert one map-frame point.
    ///
    /// First touch of a voxel creates its cell and materializes the full
    /// neighborhood adjacency in both directions, so any existing cell
    /// within `nn_to_decim_ratio` voxels immediately sees the newcomer.
    pub fn insert_point(&mut self, p: Point3) {
        let v = self.index_of(p);
        let slot = match self.slot_of.get(&v) {
            Some(&slot) => slot,
            None => self.create_cell(v),
        };
        if self.cells[slot as usize].insert_point(p, self.max_points_per_voxel) {
            self.cached_bbox = OnceLock::new();
        }
    }

    /// Insert a sensor-frame point cloud given the sensor pose in the map
    /// frame. The three slices must have equal length.
    pub fn insert_point_cloud(&mut self, pose_in_map: &Pose3, xs: &[f32], ys: &[f32], zs: &[f32]) {
        debug_assert!(xs.len() == ys.len() && ys.len() == zs.len());
        let n = xs.len().min(ys.len()).min(zs.len());
        for i in 0..n {
            let p = pose_in_map.transform_point(Point3::new(xs[i], ys[i], zs[i]));
            self.insert_point(p);
        }
    }

    /// Drop all voxels and reset caches. Configuration is preserved.
    pub fn clear(&mut self) {
        if !self.cells.is_empty() {
            log::debug!("clearing map: dropping {} voxels", self.cells.len());
        }
        self.cells.clear();
        self.indices.clear();
        self.slot_of.clear();
        self.cached_bbox = OnceLock::new();
    }

    /// Create the cell for `v` and wire its neighborhood links.
    fn create_cell(&mut self, v: VoxelIndex) -> u32 {
        log::trace!("creating voxel {:?}", v);
        let slot = self.cells.len() as u32;
        self.cells.push(VoxelCell::default());
        self.indices.push(v);
        self.slot_of.insert(v, slot);

        for n in neighborhood_cube(v, self.nn_to_decim_ratio) {
            let neighbor_slot = self.slot_of.get(&n).copied();
            self.cells[slot as usize].neighbors_mut().insert(n, neighbor_slot);
            if let Some(ns) = neighbor_slot {
                if ns != slot {
                    self.cells[ns as usize].neighbors_mut().insert(v, Some(slot));
                }
            }
        }
        slot
    }

    // === Query ===

    /// Nearest stored point to `q` within `max_nn_radius`.
    ///
    /// Returns the point and its squared distance, or `None` when nothing
    /// lies within the bound. Equal distances resolve to the candidate seen
    /// first in neighborhood-then-insertion order.
    pub fn nn_find_nearest(&self, q: Point3) -> Option<(Point3, f32)> {
        let vq = self.index_of(q);
        let mut best = Point3::ZERO;
        let mut best_d = f32::INFINITY;

        match self.slot_of.get(&vq) {
            // the query voxel exists: its adjacency already covers the
            // whole search neighborhood
            Some(&slot) => {
                for neighbor_slot in self.cells[slot as usize].neighbors().values() {
                    if let Some(ns) = neighbor_slot {
                        self.scan_cell(*ns, q, &mut best, &mut best_d);
                    }
                }
            }
            // query outside the map: synthesize the neighborhood against
            // the main table
            None => {
                for n in neighborhood_cube(vq, self.nn_to_decim_ratio) {
                    if let Some(&ns) = self.slot_of.get(&n) {
                        self.scan_cell(ns, q, &mut best, &mut best_d);
                    }
                }
            }
        }

        (best_d <= self.max_nn_radius_sq).then_some((best, best_d))
    }

    #[inline]
    fn scan_cell(&self, slot: u32, q: Point3, best: &mut Point3, best_d: &mut f32) {
        for p in self.cells[slot as usize].points() {
            let d = p.distance_squared(&q);
            if d < *best_d {
                *best_d = d;
                *best = *p;
            }
        }
    }

    /// Axis-aligned bounding box of all stored points.
    ///
    /// The zero box for an empty map. Cached until the next mutation; a
    /// cold call walks every point.
    pub fn bounding_box(&self) -> Bounds3 {
        *self.cached_bbox.get_or_init(|| {
            let mut bbox: Option<Bounds3> = None;
            self.visit_all_points(|p| match &mut bbox {
                Some(b) => b.expand_to(p),
                None => bbox = Some(Bounds3::from_point(p)),
            });
            bbox.unwrap_or(Bounds3::ZERO)
        })
    }

    /// Visit every stored point. Voxels are visited in creation order,
    /// points within a voxel in insertion order.
    pub fn visit_all_points<F: FnMut(Point3)>(&self, mut f: F) {
        for cell in &self.cells {
            for p in cell.points() {
                f(*p);
            }
        }
    }

    /// Visit every voxel with its lattice index, in creation order.
    pub fn visit_all_voxels<F: FnMut(VoxelIndex, &VoxelCell)>(&self, mut f: F) {
        for (cell, &index) in self.cells.iter().zip(&self.indices) {
            f(index, cell);
        }
    }

    // === Persistence hooks (see io module) ===

    /// Materialize a voxel with its stored points, deferring link setup.
    ///
    /// Returns false when the index is already populated. Used by the
    /// binary reader; [`Self::rebuild_neighbor_links`] must run afterwards.
    pub(crate) fn restore_voxel(&mut self, v: VoxelIndex, points: &[Point3]) -> bool {
        if self.slot_of.contains_key(&v) {
            return false;
        }
        let slot = self.cells.len() as u32;
        self.cells.push(VoxelCell::default());
        self.indices.push(v);
        self.slot_of.insert(v, slot);
        let cell = &mut self.cells[slot as usize];
        for &p in points {
            cell.insert_point(p, self.max_points_per_voxel);
        }
        true
    }

    /// Recompute every cell's neighborhood adjacency from scratch.
    pub(crate) fn rebuild_neighbor_links(&mut self) {
        let radius = self.nn_to_decim_ratio;
        for slot in 0..self.cells.len() {
            let v = self.indices[slot];
            let links: FnvHashMap<VoxelIndex, Option<u32>> = neighborhood_cube(v, radius)
                .map(|n| (n, self.slot_of.get(&n).copied()))
                .collect();
            *self.cells[slot].neighbors_mut() = links;
        }
    }
}

impl Default for DualVoxelMap {
    /// Defaults: 0.20 m voxels, 0.60 m NN radius, unlimited points.
    fn default() -> Self {
        Self::with_validated(0.20, 0.60, 0)
    }
}

fn validate_properties(decimation_size: f32, max_nn_radius: f32) -> Result<()> {
    if !(decimation_size > 0.0) {
        return Err(MapError::InvalidConfig(format!(
            "decimation_size must be positive, got {decimation_size}"
        )));
    }
    if max_nn_radius < decimation_size {
        return Err(MapError::InvalidConfig(format!(
            "max_nn_radius ({max_nn_radius}) must be >= decimation_size ({decimation_size})"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_config_rejected() {
        assert!(matches!(
            DualVoxelMap::new(0.0, 1.0, 0),
            Err(MapError::InvalidConfig(_))
        ));
        assert!(matches!(
            DualVoxelMap::new(1.0, 0.5, 0),
            Err(MapError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_nn_ratio_is_ceiling() {
        let map = DualVoxelMap::new(0.2, 0.6, 0).unwrap();
        assert_eq!(map.nn_to_decim_ratio(), 3);
        let map = DualVoxelMap::new(0.2, 0.7, 0).unwrap();
        assert_eq!(map.nn_to_decim_ratio(), 4);
    }

    #[test]
    fn test_insert_creates_full_neighborhood() {
        let mut map = DualVoxelMap::new(1.0, 2.0, 0).unwrap();
        map.insert_point(Point3::new(0.1, 0.1, 0.1));
        let v = VoxelIndex::new(0, 0, 0);
        let cell = map.voxel(v).unwrap();
        let r = map.nn_to_decim_ratio();
        let expected = ((2 * r + 1) as usize).pow(3);
        assert_eq!(cell.neighbors().len(), expected);
        // self-link present and populated
        assert!(cell.neighbors()[&v].is_some());
        // everything else still empty
        let populated = cell.neighbors().values().filter(|s| s.is_some()).count();
        assert_eq!(populated, 1);
    }

    #[test]
    fn test_bidirectional_links() {
        let mut map = DualVoxelMap::new(1.0, 3.0, 0).unwrap();
        map.insert_point(Point3::new(0.0, 0.0, 0.0));
        map.insert_point(Point3::new(2.5, 0.0, 0.0));
        let a = VoxelIndex::new(0, 0, 0);
        let b = VoxelIndex::new(3, 0, 0);
        // reciprocal entries both resolve
        assert!(map.voxel(a).unwrap().neighbors()[&b].is_some());
        assert!(map.voxel(b).unwrap().neighbors()[&a].is_some());
        assert!(map.voxel(a).unwrap().neighbors()[&a].is_some());
        assert!(map.voxel(b).unwrap().neighbors()[&b].is_some());
    }

    #[test]
    fn test_nn_finds_inserted_point() {
        let mut map = DualVoxelMap::new(1.0, 2.0, 0).unwrap();
        map.insert_point(Point3::new(0.1, 0.1, 0.1));
        map.insert_point(Point3::new(2.9, 0.0, 0.0));

        let (p, d) = map.nn_find_nearest(Point3::new(0.0, 0.0, 0.0)).unwrap();
        assert_eq!(p, Point3::new(0.1, 0.1, 0.1));
        assert!((d - 0.03).abs() < 1e-6);

        let (p, d) = map.nn_find_nearest(Point3::new(3.0, 0.0, 0.0)).unwrap();
        assert_eq!(p, Point3::new(2.9, 0.0, 0.0));
        assert!((d - 0.01).abs() < 1e-6);
    }

    #[test]
    fn test_nn_outside_radius_is_none() {
        let mut map = DualVoxelMap::new(0.5, 0.5, 0).unwrap();
        map.insert_point(Point3::new(0.0, 0.0, 0.0));
        assert!(map.nn_find_nearest(Point3::new(10.0, 10.0, 10.0)).is_none());
    }

    #[test]
    fn test_nn_from_unpopulated_voxel() {
        let mut map = DualVoxelMap::new(1.0, 2.0, 0).unwrap();
        map.insert_point(Point3::new(0.0, 0.0, 0.0));
        // query voxel (2,0,0) was never created; transient scan still finds it
        let (p, d) = map.nn_find_nearest(Point3::new(1.6, 0.0, 0.0)).unwrap();
        assert_eq!(p, Point3::new(0.0, 0.0, 0.0));
        assert!((d - 2.56).abs() < 1e-5);
    }

    #[test]
    fn test_decimation_cap() {
        let mut map = DualVoxelMap::new(1.0, 1.0, 2).unwrap();
        map.insert_point(Point3::new(0.1, 0.0, 0.0));
        map.insert_point(Point3::new(0.2, 0.0, 0.0));
        map.insert_point(Point3::new(0.3, 0.0, 0.0));
        let cell = map.voxel(VoxelIndex::new(0, 0, 0)).unwrap();
        assert_eq!(cell.len(), 2);
    }

    #[test]
    fn test_bounding_box_cached_and_invalidated() {
        let mut map = DualVoxelMap::new(1.0, 1.0, 0).unwrap();
        assert_eq!(map.bounding_box(), Bounds3::ZERO);
        map.insert_point(Point3::new(1.0, 2.0, 3.0));
        map.insert_point(Point3::new(-1.0, 0.0, 5.0));
        let b = map.bounding_box();
        assert_eq!(b.min, Point3::new(-1.0, 0.0, 3.0));
        assert_eq!(b.max, Point3::new(1.0, 2.0, 5.0));
        // cache returns the same thing
        assert_eq!(map.bounding_box(), b);
        map.insert_point(Point3::new(0.0, -4.0, 0.0));
        assert_eq!(map.bounding_box().min, Point3::new(-1.0, -4.0, 0.0));
    }

    #[test]
    fn test_clear_empties_everything() {
        let mut map = DualVoxelMap::new(1.0, 1.0, 0).unwrap();
        map.insert_point(Point3::new(0.0, 0.0, 0.0));
        assert!(!map.is_empty());
        map.clear();
        assert!(map.is_empty());
        assert_eq!(map.voxel_count(), 0);
        assert!(map.nn_find_nearest(Point3::new(0.0, 0.0, 0.0)).is_none());
        assert_eq!(map.bounding_box(), Bounds3::ZERO);
    }

    #[test]
    fn test_set_voxel_properties_clears() {
        let mut map = DualVoxelMap::new(1.0, 1.0, 0).unwrap();
        map.insert_point(Point3::new(0.0, 0.0, 0.0));
        map.set_voxel_properties(0.5, 1.5, 4).unwrap();
        assert!(map.is_empty());
        assert_eq!(map.decimation_size(), 0.5);
        assert_eq!(map.nn_to_decim_ratio(), 3);
        assert_eq!(map.max_points_per_voxel(), 4);
    }

    #[test]
    fn test_insert_point_cloud_applies_pose() {
        let mut map = DualVoxelMap::new(0.5, 1.0, 0).unwrap();
        let pose = Pose3::from_translation(10.0, 0.0, 0.0);
        map.insert_point_cloud(&pose, &[1.0], &[0.0], &[0.0]);
        let (p, d) = map.nn_find_nearest(Point3::new(11.0, 0.0, 0.0)).unwrap();
        assert_eq!(p, Point3::new(11.0, 0.0, 0.0));
        assert!(d < 1e-6);
    }

    #[test]
    fn test_link_invariant_after_many_inserts() {
        let mut map = DualVoxelMap::new(1.0, 2.0, 0).unwrap();
        for i in 0..5 {
            for j in 0..5 {
                map.insert_point(Point3::new(i as f32, j as f32, 0.0));
            }
        }
        let r = map.nn_to_decim_ratio();
        let cube = ((2 * r + 1) as usize).pow(3);
        map.visit_all_voxels(|v, cell| {
            assert_eq!(cell.neighbors().len(), cube);
            for (n, link) in cell.neighbors() {
                let exists = map.voxel(*n).map(|c| !c.is_empty()).unwrap_or(false);
                assert_eq!(link.is_some(), exists, "link mismatch at {:?} -> {:?}", v, n);
            }
        });
    }
}
