//! The abstract metric-map capability set.

use std::path::Path;

use crate::core::{Bounds3, Observation, Pose3};
use crate::error::Result;
use crate::voxel::DualVoxelMap;

/// Capabilities shared by every concrete metric map kind.
///
/// One level of dispatch: a map can ingest observations, score them,
/// reset itself, and persist a human-readable representation. Which
/// observation shapes a map understands is the map's own business;
/// unsupported shapes are ignored on insert and unscoreable on query.
pub trait MetricMap {
    /// Integrate one observation. Returns whether anything was inserted.
    fn insert_observation(&mut self, obs: &Observation) -> bool;

    /// Whether [`Self::observation_likelihood`] can evaluate `obs` at all.
    fn can_compute_likelihood(&self, obs: &Observation) -> bool;

    /// Log-likelihood of observing `obs` from `pose_in_map` (vehicle pose
    /// in the map frame). `None` for unsupported observation shapes.
    fn observation_likelihood(&self, obs: &Observation, pose_in_map: &Pose3) -> Option<f64>;

    /// Drop all map contents.
    fn clear(&mut self);

    /// Whether the map holds no data.
    fn is_empty(&self) -> bool;

    /// Axis-aligned bounds of the mapped area.
    fn bounding_box(&self) -> Bounds3;

    /// Short human-readable description.
    fn summary(&self) -> String;

    /// Persist a representation of the map next to `path_prefix`.
    fn save_representation(&self, path_prefix: &Path) -> Result<()>;
}

impl MetricMap for DualVoxelMap {
    fn insert_observation(&mut self, obs: &Observation) -> bool {
        match obs {
            Observation::PointCloud(o) => {
                self.insert_point_cloud(&o.sensor_pose, &o.cloud.xs, &o.cloud.ys, &o.cloud.zs);
                !o.cloud.is_empty()
            }
            Observation::RotatingScan(o) => {
                let cloud = o.to_point_cloud();
                self.insert_point_cloud(&o.sensor_pose, &cloud.xs, &cloud.ys, &cloud.zs);
                !cloud.is_empty()
            }
            Observation::RobotPose(_) => false,
        }
    }

    fn can_compute_likelihood(&self, obs: &Observation) -> bool {
        !matches!(obs, Observation::RobotPose(_))
    }

    fn observation_likelihood(&self, obs: &Observation, pose_in_map: &Pose3) -> Option<f64> {
        let (sensor_pose, cloud) = obs.as_point_cloud()?;
        let pose = pose_in_map.compose(sensor_pose);
        Some(self.point_cloud_likelihood(&pose, &cloud.xs, &cloud.ys, &cloud.zs))
    }

    fn clear(&mut self) {
        DualVoxelMap::clear(self);
    }

    fn is_empty(&self) -> bool {
        DualVoxelMap::is_empty(self)
    }

    fn bounding_box(&self) -> Bounds3 {
        DualVoxelMap::bounding_box(self)
    }

    fn summary(&self) -> String {
        let mut points = 0usize;
        self.visit_all_points(|_| points += 1);
        format!(
            "DualVoxelMap: {} voxels, {} points, decimation_size={:.3}",
            self.voxel_count(),
            points,
            self.decimation_size()
        )
    }

    fn save_representation(&self, path_prefix: &Path) -> Result<()> {
        let mut path = path_prefix.as_os_str().to_owned();
        path.push("_points.txt");
        self.save_to_text_file(Path::new(&path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Point3, PointCloud3, PointCloudObservation, RobotPoseObservation};

    fn cloud_obs(points: &[Point3]) -> Observation {
        Observation::PointCloud(PointCloudObservation {
            timestamp: 0.0,
            sensor_label: "lidar".into(),
            sensor_pose: Pose3::identity(),
            cloud: PointCloud3::from_points(points),
        })
    }

    #[test]
    fn test_insert_observation_point_cloud() {
        let mut map = DualVoxelMap::new(0.5, 1.0, 0).unwrap();
        let inserted = map.insert_observation(&cloud_obs(&[Point3::new(1.0, 0.0, 0.0)]));
        assert!(inserted);
        assert!(!MetricMap::is_empty(&map));
    }

    #[test]
    fn test_pose_observation_not_insertable() {
        let mut map = DualVoxelMap::new(0.5, 1.0, 0).unwrap();
        let obs = Observation::RobotPose(RobotPoseObservation {
            timestamp: 0.0,
            sensor_label: "ground_truth".into(),
            pose: Pose3::identity(),
        });
        assert!(!map.insert_observation(&obs));
        assert!(!map.can_compute_likelihood(&obs));
        assert!(map.observation_likelihood(&obs, &Pose3::identity()).is_none());
    }

    #[test]
    fn test_likelihood_composes_sensor_pose() {
        let mut map = DualVoxelMap::new(0.2, 0.6, 0).unwrap();
        map.insert_point(Point3::new(3.0, 0.0, 0.0));
        map.likelihood_options.decimation = 1;

        // sensor 1 m ahead of the vehicle, target 2 m ahead of the sensor
        let obs = Observation::PointCloud(PointCloudObservation {
            timestamp: 0.0,
            sensor_label: "lidar".into(),
            sensor_pose: Pose3::from_translation(1.0, 0.0, 0.0),
            cloud: PointCloud3::from_points(&[Point3::new(2.0, 0.0, 0.0)]),
        });
        let l = map
            .observation_likelihood(&obs, &Pose3::identity())
            .unwrap();
        // exact hit: zero penalty
        assert!(l.abs() < 1e-9, "{}", l);
    }
}
