//! Visualization preferences carried in the map's persistent form.
//!
//! The map itself never interprets these; they exist so serialized maps
//! keep their display settings when opened by viewer tooling.

use serde::{Deserialize, Serialize};

/// Serialized rendering preferences.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderOptions {
    /// Point sprite size in pixels.
    pub point_size: f32,
    /// Render only the per-voxel mean instead of all contained points.
    pub show_mean_only: bool,
    /// Flat point color (r, g, b in [0, 1]); superseded by `colormap`.
    pub color: [f32; 3],
    /// Colormap selector: 0 = none, 1 = grayscale, 2 = hot.
    pub colormap: u8,
    /// Coordinate driving the colormap: 0 = x, 1 = y, 2 = z.
    pub recolor_axis: u8,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            point_size: 1.0,
            show_mean_only: true,
            color: [0.0, 0.0, 1.0],
            colormap: 2,
            recolor_axis: 2,
        }
    }
}
