//! Mapping module: drains an observation stream into a voxel map.

use crossbeam_channel::Receiver;
use serde::Deserialize;
use std::path::Path;

use megha_map::{DualVoxelMap, MetricMap, Observation, Pose3};

use crate::error::{Result, RuntimeError};
use crate::module::{ModuleContext, RuntimeModule};

/// Optional configuration block: overrides of the map's voxel parameters.
#[derive(Debug, Clone, Default, Deserialize)]
struct MappingConfig {
    #[serde(default)]
    decimation_size: Option<f32>,
    #[serde(default)]
    max_nn_radius: Option<f32>,
    #[serde(default)]
    max_points_per_voxel: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct ConfigRoot {
    #[serde(default)]
    params: MappingConfig,
}

/// Builds a [`DualVoxelMap`] from a stream of observations.
///
/// Vehicle-pose observations update the pose applied to subsequent clouds;
/// geometric observations are inserted at the latest known vehicle pose
/// composed with their own sensor pose.
pub struct VoxelMappingModule {
    map: DualVoxelMap,
    rx: Receiver<Observation>,
    vehicle_pose: Pose3,
    observations_integrated: usize,
}

impl VoxelMappingModule {
    /// Create a mapping module around an existing map.
    pub fn new(map: DualVoxelMap, rx: Receiver<Observation>) -> Self {
        Self {
            map,
            rx,
            vehicle_pose: Pose3::identity(),
            observations_integrated: 0,
        }
    }

    /// The map under construction.
    pub fn map(&self) -> &DualVoxelMap {
        &self.map
    }

    /// Number of geometric observations integrated so far.
    pub fn observations_integrated(&self) -> usize {
        self.observations_integrated
    }

    /// Latest vehicle pose seen on the stream.
    pub fn vehicle_pose(&self) -> &Pose3 {
        &self.vehicle_pose
    }

    /// Persist the map's representation next to `path_prefix`.
    pub fn save(&self, path_prefix: &Path) -> Result<()> {
        self.map.save_representation(path_prefix)?;
        Ok(())
    }
}

impl RuntimeModule for VoxelMappingModule {
    fn name(&self) -> &str {
        "voxel_mapping"
    }

    fn interfaces(&self) -> &'static [&'static str] {
        &["metric-map"]
    }

    fn initialize_common(&mut self, _ctx: &ModuleContext, cfg_block: &str) -> Result<()> {
        if cfg_block.trim().is_empty() {
            return Ok(());
        }
        let root: ConfigRoot = serde_yaml::from_str(cfg_block)
            .map_err(|e| RuntimeError::Config(format!("mapping config: {e}")))?;
        let params = root.params;
        if params.decimation_size.is_some()
            || params.max_nn_radius.is_some()
            || params.max_points_per_voxel.is_some()
        {
            let decimation = params.decimation_size.unwrap_or(self.map.decimation_size());
            let radius = params.max_nn_radius.unwrap_or(self.map.max_nn_radius());
            let cap = params
                .max_points_per_voxel
                .unwrap_or(self.map.max_points_per_voxel());
            self.map
                .set_voxel_properties(decimation, radius, cap)
                .map_err(|e| RuntimeError::Config(e.to_string()))?;
        }
        Ok(())
    }

    fn spin_once(&mut self) -> Result<()> {
        while let Ok(obs) = self.rx.try_recv() {
            match &obs {
                Observation::RobotPose(o) => {
                    self.vehicle_pose = o.pose;
                }
                Observation::PointCloud(_) | Observation::RotatingScan(_) => {
                    // rebase the observation's sensor pose onto the vehicle
                    if let Some((sensor_pose, cloud)) = obs.as_point_cloud() {
                        let pose = self.vehicle_pose.compose(sensor_pose);
                        self.map
                            .insert_point_cloud(&pose, &cloud.xs, &cloud.ys, &cloud.zs);
                        self.observations_integrated += 1;
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;
    use megha_map::{Point3, PointCloud3, PointCloudObservation, RobotPoseObservation};

    fn module() -> (crossbeam_channel::Sender<Observation>, VoxelMappingModule) {
        let (tx, rx) = unbounded();
        let map = DualVoxelMap::new(0.5, 1.0, 0).unwrap();
        (tx, VoxelMappingModule::new(map, rx))
    }

    #[test]
    fn test_cloud_inserted_at_vehicle_pose() {
        let (tx, mut module) = module();
        tx.send(Observation::RobotPose(RobotPoseObservation {
            timestamp: 0.1,
            sensor_label: "ground_truth".into(),
            pose: Pose3::from_translation(10.0, 0.0, 0.0),
        }))
        .unwrap();
        tx.send(Observation::PointCloud(PointCloudObservation {
            timestamp: 0.1,
            sensor_label: "lidar".into(),
            sensor_pose: Pose3::identity(),
            cloud: PointCloud3::from_points(&[Point3::new(1.0, 0.0, 0.0)]),
        }))
        .unwrap();

        module.spin_once().unwrap();
        assert_eq!(module.observations_integrated(), 1);
        let (p, _) = module
            .map()
            .nn_find_nearest(Point3::new(11.0, 0.0, 0.0))
            .unwrap();
        assert_eq!(p, Point3::new(11.0, 0.0, 0.0));
    }

    #[test]
    fn test_config_overrides_voxel_properties() {
        let (_tx, mut module) = module();
        let ctx = crate::runtime::Runtime::new().context();
        module
            .initialize_common(&ctx, "params:\n  decimation_size: 0.25\n  max_nn_radius: 2.0\n")
            .unwrap();
        assert_eq!(module.map().decimation_size(), 0.25);
        assert_eq!(module.map().max_nn_radius(), 2.0);
    }

    #[test]
    fn test_empty_config_keeps_map() {
        let (_tx, mut module) = module();
        let ctx = crate::runtime::Runtime::new().context();
        module.initialize_common(&ctx, "").unwrap();
        assert_eq!(module.map().decimation_size(), 0.5);
    }
}
