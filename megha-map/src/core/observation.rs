//! Sensor observation variants.
//!
//! Observations arrive from data sources in a few shapes; metric maps only
//! ever consume the point-cloud projection, so every geometric variant can
//! lower itself to `(sensor_pose, PointCloud3)`.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use super::cloud::PointCloud3;
use super::pose::Pose3;

/// A timestamped point cloud in the sensor frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointCloudObservation {
    /// Observation time in seconds
    pub timestamp: f64,
    /// Label of the producing sensor (e.g. "lidar")
    pub sensor_label: String,
    /// Pose of the sensor in the vehicle frame
    pub sensor_pose: Pose3,
    /// Points in the sensor frame
    pub cloud: PointCloud3,
}

/// A rotating-scanner sweep in polar form.
///
/// Parallel arrays: one `(azimuth, elevation, range)` triple per return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RotatingScanObservation {
    /// Observation time in seconds
    pub timestamp: f64,
    /// Label of the producing sensor
    pub sensor_label: String,
    /// Pose of the sensor in the vehicle frame
    pub sensor_pose: Pose3,
    /// Horizontal beam angles in radians
    pub azimuths: Vec<f32>,
    /// Vertical beam angles in radians
    pub elevations: Vec<f32>,
    /// Measured ranges in meters (<= 0 or non-finite = invalid return)
    pub ranges: Vec<f32>,
}

impl RotatingScanObservation {
    /// Convert the sweep to Cartesian sensor-frame coordinates.
    ///
    /// Invalid returns (non-positive or non-finite ranges) are skipped.
    pub fn to_point_cloud(&self) -> PointCloud3 {
        let n = self.ranges.len().min(self.azimuths.len()).min(self.elevations.len());
        let mut cloud = PointCloud3::with_capacity(n);
        for i in 0..n {
            let r = self.ranges[i];
            if !r.is_finite() || r <= 0.0 {
                continue;
            }
            let (sin_az, cos_az) = self.azimuths[i].sin_cos();
            let (sin_el, cos_el) = self.elevations[i].sin_cos();
            cloud.push(crate::core::Point3::new(
                r * cos_el * cos_az,
                r * cos_el * sin_az,
                r * sin_el,
            ));
        }
        cloud
    }
}

/// A direct vehicle-pose measurement (ground truth or external localization).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotPoseObservation {
    /// Observation time in seconds
    pub timestamp: f64,
    /// Label of the producing source (e.g. "ground_truth")
    pub sensor_label: String,
    /// Vehicle pose in the map frame
    pub pose: Pose3,
}

/// Any sensor observation a data source can publish.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Observation {
    /// Raw point cloud
    PointCloud(PointCloudObservation),
    /// Rotating-scanner sweep
    RotatingScan(RotatingScanObservation),
    /// Vehicle pose measurement
    RobotPose(RobotPoseObservation),
}

impl Observation {
    /// Observation time in seconds.
    pub fn timestamp(&self) -> f64 {
        match self {
            Observation::PointCloud(o) => o.timestamp,
            Observation::RotatingScan(o) => o.timestamp,
            Observation::RobotPose(o) => o.timestamp,
        }
    }

    /// Label of the producing sensor.
    pub fn sensor_label(&self) -> &str {
        match self {
            Observation::PointCloud(o) => &o.sensor_label,
            Observation::RotatingScan(o) => &o.sensor_label,
            Observation::RobotPose(o) => &o.sensor_label,
        }
    }

    /// The point-cloud projection consumed by metric maps.
    ///
    /// Returns the sensor pose and the sensor-frame cloud, converting polar
    /// sweeps on the fly; `None` for observations without geometry.
    pub fn as_point_cloud(&self) -> Option<(&Pose3, Cow<'_, PointCloud3>)> {
        match self {
            Observation::PointCloud(o) => Some((&o.sensor_pose, Cow::Borrowed(&o.cloud))),
            Observation::RotatingScan(o) => {
                Some((&o.sensor_pose, Cow::Owned(o.to_point_cloud())))
            }
            Observation::RobotPose(_) => None,
        }
    }
}
