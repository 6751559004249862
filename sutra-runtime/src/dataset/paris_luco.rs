//! Replayer for Paris-Luco-style lidar sequences.
//!
//! A sequence directory holds `frames/*.xyz` (one `"x y z"` text row per
//! point, the same format the map's text export writes) and optionally
//! `gt_traj_lidar.txt` with one ground-truth translation row per frame.
//! Frame timestamps are synthesized at the fixed scanner period; replay
//! runs against the wall clock, scaled by `time_warp_scale`.

use crossbeam_channel::Sender;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use megha_map::{
    Observation, Point3, PointCloud3, PointCloudObservation, Pose3, RobotPoseObservation,
};

use crate::error::{Result, RuntimeError};
use crate::module::{ModuleContext, RuntimeModule};

/// Seconds between consecutive scanner frames.
const LIDAR_PERIOD: f64 = 0.1;

/// Log replay progress every this many frames.
const PROGRESS_LOG_EVERY: usize = 50;

/// Configuration block of the replayer module.
#[derive(Debug, Clone, Deserialize)]
pub struct LucoReplayerConfig {
    /// Root directory holding the dataset sequences.
    pub base_dir: PathBuf,
    /// Sequence name under `base_dir`.
    #[serde(default)]
    pub sequence: String,
    /// Wall-clock multiplier for replay speed.
    #[serde(default = "default_time_warp")]
    pub time_warp_scale: f64,
}

fn default_time_warp() -> f64 {
    1.0
}

#[derive(Debug, Deserialize)]
struct ConfigRoot {
    params: LucoReplayerConfig,
}

/// Dataset replay module publishing timestamped observations.
///
/// Each due frame yields the ground-truth vehicle pose first (when the
/// trajectory file exists) and then the frame's point cloud, with equal
/// timestamps, so consumers always hold the pose matching a cloud before
/// they see it.
pub struct LucoReplayer {
    out: Sender<Observation>,
    config: Option<LucoReplayerConfig>,
    frame_files: Vec<PathBuf>,
    timestamps: Vec<f64>,
    gt_translations: Option<Vec<Point3>>,
    next_index: usize,
    replay_start: Option<Instant>,
    read_ahead: Option<(usize, PointCloud3)>,
    end_logged: bool,
}

impl LucoReplayer {
    /// Create a replayer that publishes into `out`.
    pub fn new(out: Sender<Observation>) -> Self {
        Self {
            out,
            config: None,
            frame_files: Vec::new(),
            timestamps: Vec::new(),
            gt_translations: None,
            next_index: 0,
            replay_start: None,
            read_ahead: None,
            end_logged: false,
        }
    }

    /// Number of frames in the loaded sequence.
    pub fn dataset_len(&self) -> usize {
        self.frame_files.len()
    }

    /// Load the observations of one frame without advancing replay:
    /// ground-truth pose (if present) followed by the point cloud.
    pub fn observations_at(&self, step: usize) -> Result<Vec<Observation>> {
        if step >= self.frame_files.len() {
            return Err(RuntimeError::Dataset(format!(
                "frame index {} out of range ({} frames)",
                step,
                self.frame_files.len()
            )));
        }
        let cloud = load_xyz_frame(&self.frame_files[step])?;
        Ok(self.frame_observations(step, cloud))
    }

    fn frame_observations(&self, step: usize, cloud: PointCloud3) -> Vec<Observation> {
        let timestamp = self.timestamps[step];
        let mut out = Vec::with_capacity(2);
        if let Some(gt) = &self.gt_translations {
            let t = gt[step];
            out.push(Observation::RobotPose(RobotPoseObservation {
                timestamp,
                sensor_label: "ground_truth".to_string(),
                pose: Pose3::from_translation(t.x, t.y, t.z),
            }));
        }
        out.push(Observation::PointCloud(PointCloudObservation {
            timestamp,
            sensor_label: "lidar".to_string(),
            // scanner sits at the vehicle origin in this dataset
            sensor_pose: Pose3::identity(),
            cloud,
        }));
        out
    }

    fn read_ahead_some(&mut self) -> Result<()> {
        if self.next_index >= self.frame_files.len() {
            return Ok(());
        }
        if self
            .read_ahead
            .as_ref()
            .map(|(i, _)| *i == self.next_index)
            .unwrap_or(false)
        {
            return Ok(());
        }
        let cloud = load_xyz_frame(&self.frame_files[self.next_index])?;
        self.read_ahead = Some((self.next_index, cloud));
        Ok(())
    }

    fn take_frame(&mut self, step: usize) -> Result<PointCloud3> {
        match self.read_ahead.take() {
            Some((i, cloud)) if i == step => Ok(cloud),
            other => {
                self.read_ahead = other;
                load_xyz_frame(&self.frame_files[step])
            }
        }
    }
}

impl RuntimeModule for LucoReplayer {
    fn name(&self) -> &str {
        "paris_luco_replayer"
    }

    fn interfaces(&self) -> &'static [&'static str] {
        &["raw-data-source"]
    }

    fn initialize_common(&mut self, _ctx: &ModuleContext, cfg_block: &str) -> Result<()> {
        let root: ConfigRoot = serde_yaml::from_str(cfg_block)
            .map_err(|e| RuntimeError::Config(format!("replayer config: {e}")))?;
        let config = root.params;

        let seq_dir = config.base_dir.join(&config.sequence);
        if !seq_dir.is_dir() {
            return Err(RuntimeError::Dataset(format!(
                "sequence directory not found: {}",
                seq_dir.display()
            )));
        }

        self.frame_files = list_sorted_frames(&seq_dir.join("frames"), "xyz")?;
        log::info!(
            "loading Paris-Luco sequence from {}: {} lidar frames",
            seq_dir.display(),
            self.frame_files.len()
        );

        self.timestamps = (0..self.frame_files.len())
            .map(|i| (i as f64 + 1.0) * LIDAR_PERIOD)
            .collect();

        let gt_file = seq_dir.join("gt_traj_lidar.txt");
        if gt_file.is_file() {
            let translations = load_translation_table(&gt_file)?;
            if translations.len() != self.frame_files.len() {
                return Err(RuntimeError::Dataset(format!(
                    "ground truth rows ({}) do not match frame count ({})",
                    translations.len(),
                    self.frame_files.len()
                )));
            }
            log::info!("ground truth translations: found");
            self.gt_translations = Some(translations);
        } else {
            log::warn!(
                "ground truth translations not found, expected file: {}",
                gt_file.display()
            );
        }

        self.next_index = 0;
        self.replay_start = None;
        self.read_ahead = None;
        self.end_logged = false;
        self.config = Some(config);
        self.read_ahead_some()
    }

    fn spin_once(&mut self) -> Result<()> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| RuntimeError::Module("replayer spun before initialize".to_string()))?;
        let warp = config.time_warp_scale;

        let start = *self.replay_start.get_or_insert_with(Instant::now);
        let replay_time = start.elapsed().as_secs_f64() * warp;

        if self.next_index >= self.timestamps.len() {
            if !self.end_logged {
                log::info!("end of dataset reached, nothing else to publish");
                self.end_logged = true;
            }
            return Ok(());
        }

        while self.next_index < self.timestamps.len()
            && replay_time >= self.timestamps[self.next_index]
        {
            let step = self.next_index;
            let cloud = self.take_frame(step)?;
            for obs in self.frame_observations(step, cloud) {
                self.out.send(obs).map_err(|_| {
                    RuntimeError::Module("observation channel disconnected".to_string())
                })?;
            }
            self.next_index += 1;

            if self.next_index % PROGRESS_LOG_EVERY == 0 {
                log::info!(
                    "dataset replay progress: {} / {}",
                    self.next_index,
                    self.timestamps.len()
                );
            }
        }

        self.read_ahead_some()
    }
}

/// Files in `dir` with the given extension, sorted by file name.
fn list_sorted_frames(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().map(|e| e == extension).unwrap_or(false))
        .collect();
    files.sort();
    Ok(files)
}

/// Parse an `.xyz` frame: one `"x y z"` row per point.
fn load_xyz_frame(path: &Path) -> Result<PointCloud3> {
    let text = fs::read_to_string(path)?;
    let mut cloud = PointCloud3::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        cloud.push(parse_triple(line).ok_or_else(|| {
            RuntimeError::Dataset(format!(
                "malformed point row at {}:{}",
                path.display(),
                lineno + 1
            ))
        })?);
    }
    Ok(cloud)
}

/// Parse a translation table: one `"x y z"` row per frame.
fn load_translation_table(path: &Path) -> Result<Vec<Point3>> {
    let text = fs::read_to_string(path)?;
    let mut rows = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        rows.push(parse_triple(line).ok_or_else(|| {
            RuntimeError::Dataset(format!(
                "malformed trajectory row at {}:{}",
                path.display(),
                lineno + 1
            ))
        })?);
    }
    Ok(rows)
}

fn parse_triple(line: &str) -> Option<Point3> {
    let mut parts = line.split_whitespace();
    let x = parts.next()?.parse().ok()?;
    let y = parts.next()?.parse().ok()?;
    let z = parts.next()?.parse().ok()?;
    Some(Point3::new(x, y, z))
}
