//! # Megha-Map: Dual-Resolution Voxel Point-Cloud Map
//!
//! A metric map for 3D SLAM scan registration: a point cloud stored on a
//! voxel lattice that simultaneously bounds point density (decimation) and
//! answers bounded-radius nearest-neighbor queries through precomputed
//! links between voxels.
//!
//! ## How the dual resolution works
//!
//! Points are binned into cubic voxels of side `decimation_size`; each
//! voxel keeps at most `max_points_per_voxel` points, silently dropping
//! late arrivals. When a voxel is first populated, the map eagerly links it
//! to every voxel within `ceil(max_nn_radius / decimation_size)` cells, in
//! both directions. A nearest-neighbor query bounded by `max_nn_radius`
//! then walks one cell's adjacency table instead of hashing into the main
//! map once per candidate voxel.
//!
//! ```text
//!             insert_point(p)
//!                   │
//!                   ▼
//!      ┌───────────────────────────┐
//!      │ bin p on the fine lattice │  round(p / decimation_size)
//!      └────────────┬──────────────┘
//!                   │ first touch?
//!                   ▼
//!      ┌───────────────────────────┐     bidirectional
//!      │ create cell, link the     │◄──── adjacency with
//!      │ (2r+1)³ neighborhood      │────► existing cells
//!      └────────────┬──────────────┘
//!                   ▼
//!      ┌───────────────────────────┐
//!      │ append p (or drop at cap) │
//!      └───────────────────────────┘
//! ```
//!
//! ## Quick start
//!
//! ```rust
//! use megha_map::{DualVoxelMap, Point3};
//!
//! let mut map = DualVoxelMap::new(0.2, 0.6, 0).unwrap();
//! map.insert_point(Point3::new(1.0, 2.0, 0.5));
//!
//! let (nearest, dist_sq) = map.nn_find_nearest(Point3::new(1.1, 2.0, 0.5)).unwrap();
//! assert_eq!(nearest, Point3::new(1.0, 2.0, 0.5));
//! assert!(dist_sq < 0.011);
//! ```
//!
//! ## Modules
//!
//! - [`core`]: points, SE(3) poses, SoA clouds, lattice indexing,
//!   observation variants
//! - [`voxel`]: [`VoxelCell`] and [`DualVoxelMap`]
//! - [`likelihood`]: Gaussian observation-likelihood scoring for particle
//!   filters and pose evaluation
//! - [`metric_map`]: the abstract [`MetricMap`] capability trait
//! - [`io`]: binary persistence and text export
//!
//! ## Concurrency
//!
//! The map is a single-writer / multi-reader structure with no internal
//! locking; wrap it in an external `RwLock` to share across threads.

pub mod core;
pub mod error;
pub mod io;
pub mod likelihood;
pub mod metric_map;
pub mod render;
pub mod voxel;

pub use self::core::{
    Bounds3, Observation, Point3, PointCloud3, PointCloudObservation, Pose3,
    RobotPoseObservation, RotatingScanObservation, VoxelIndex,
};
pub use error::MapError;
pub use likelihood::LikelihoodOptions;
pub use metric_map::MetricMap;
pub use render::RenderOptions;
pub use voxel::{DualVoxelMap, VoxelCell};
