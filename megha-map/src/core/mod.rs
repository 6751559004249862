//! Foundation types: points, poses, clouds, lattice indices, observations.

pub mod cloud;
pub mod index;
pub mod observation;
pub mod point;
pub mod pose;

pub use cloud::PointCloud3;
pub use index::{coord_to_index, index_to_coord, neighborhood_cube, VoxelIndex};
pub use observation::{
    Observation, PointCloudObservation, RobotPoseObservation, RotatingScanObservation,
};
pub use point::{Bounds3, Point3};
pub use pose::Pose3;
