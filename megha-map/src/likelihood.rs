//! Gaussian observation-likelihood model over the voxel map.

use serde::{Deserialize, Serialize};

use crate::core::{Point3, Pose3};
use crate::voxel::DualVoxelMap;

/// Parameters of the observation likelihood evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LikelihoodOptions {
    /// Standard deviation (meters) of the Gaussian distance model.
    pub sigma_dist: f64,

    /// Correspondence distances are clamped to this bound (meters), so
    /// every ray contributes a bounded floor and outliers cannot dominate.
    pub max_corr_distance: f64,

    /// Evaluate only one out of every N rays.
    pub decimation: u32,
}

impl Default for LikelihoodOptions {
    fn default() -> Self {
        Self {
            sigma_dist: 0.5,
            max_corr_distance: 1.0,
            decimation: 10,
        }
    }
}

impl DualVoxelMap {
    /// Unnormalized log-likelihood of a sensor-frame point cloud observed
    /// from `pose_in_map`.
    ///
    /// Each evaluated ray contributes `-d² / (2σ²)` where `d²` is the
    /// squared distance to its nearest map point, clamped to
    /// `max_corr_distance²` (also used when no neighbor lies within the
    /// NN search bound). Rays are decimated per
    /// [`LikelihoodOptions::decimation`]. Returns 0.0 for an empty cloud.
    pub fn point_cloud_likelihood(
        &self,
        pose_in_map: &Pose3,
        xs: &[f32],
        ys: &[f32],
        zs: &[f32],
    ) -> f64 {
        let opts = &self.likelihood_options;
        let clamp_sq = opts.max_corr_distance * opts.max_corr_distance;
        let inv_two_sigma_sq = 1.0 / (2.0 * opts.sigma_dist * opts.sigma_dist);
        let step = opts.decimation.max(1) as usize;
        let num_pts = xs.len().min(ys.len()).min(zs.len());

        let mut log_lik = 0.0f64;
        let mut i = 0;
        while i < num_pts {
            let p = pose_in_map.transform_point(Point3::new(xs[i], ys[i], zs[i]));
            let d_sq = match self.nn_find_nearest(p) {
                Some((_, d)) => f64::from(d),
                None => clamp_sq,
            };
            log_lik -= d_sq.min(clamp_sq) * inv_two_sigma_sq;
            i += step;
        }
        log_lik
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wall_map() -> DualVoxelMap {
        let mut map = DualVoxelMap::new(0.2, 0.6, 0).unwrap();
        for i in 0..20 {
            map.insert_point(Point3::new(2.0, -1.0 + i as f32 * 0.1, 0.0));
        }
        map
    }

    #[test]
    fn test_empty_cloud_is_neutral() {
        let map = wall_map();
        assert_eq!(
            map.point_cloud_likelihood(&Pose3::identity(), &[], &[], &[]),
            0.0
        );
    }

    #[test]
    fn test_correct_pose_scores_higher() {
        let mut map = wall_map();
        map.likelihood_options.decimation = 1;

        // a scan that sees the wall at 2 m straight ahead
        let xs = [2.0, 2.0, 2.0];
        let ys = [-0.2, 0.0, 0.2];
        let zs = [0.0, 0.0, 0.0];

        let at_origin = map.point_cloud_likelihood(&Pose3::identity(), &xs, &ys, &zs);
        let shifted = map.point_cloud_likelihood(
            &Pose3::from_translation(0.5, 0.0, 0.0),
            &xs,
            &ys,
            &zs,
        );
        assert!(at_origin > shifted, "{} vs {}", at_origin, shifted);
    }

    #[test]
    fn test_unmatched_rays_hit_the_clamp_floor() {
        let mut map = wall_map();
        map.likelihood_options.decimation = 1;
        let opts = map.likelihood_options;

        // far away from any map point: every ray contributes the clamp
        let l = map.point_cloud_likelihood(&Pose3::from_translation(50.0, 0.0, 0.0), &[0.0], &[0.0], &[0.0]);
        let floor = -(opts.max_corr_distance * opts.max_corr_distance)
            / (2.0 * opts.sigma_dist * opts.sigma_dist);
        assert!((l - floor).abs() < 1e-12);
    }

    #[test]
    fn test_decimation_skips_rays() {
        let mut map = wall_map();
        map.likelihood_options.decimation = 2;
        // four identical far rays, every other one evaluated
        let xs = [0.0; 4];
        let l = map.point_cloud_likelihood(&Pose3::from_translation(50.0, 0.0, 0.0), &xs, &xs, &xs);
        map.likelihood_options.decimation = 1;
        let l_all = map.point_cloud_likelihood(&Pose3::from_translation(50.0, 0.0, 0.0), &xs, &xs, &xs);
        assert!((l_all - 2.0 * l).abs() < 1e-12);
    }
}
