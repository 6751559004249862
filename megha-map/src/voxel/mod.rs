//! The dual-resolution voxel map and its per-voxel cells.

pub mod cell;
pub mod map;

pub use cell::{VoxelCell, INLINE_POINTS};
pub use map::DualVoxelMap;
