//! Binary persistence of the voxel map.
//!
//! Stream layout (little-endian), schema version 1:
//! - Version: u8
//! - `decimation_size`: f32, `max_nn_radius`: f32, `max_points_per_voxel`: u32
//! - Likelihood options: `sigma_dist`: f64, `max_corr_distance`: f64,
//!   `decimation`: u32
//! - Render options: `point_size`: f32, `show_mean_only`: u8,
//!   `color`: f32 x 3, `colormap`: u8, `recolor_axis`: u8
//! - `voxel_count`: u64, then per voxel: `(ix, iy, iz)`: i32 x 3,
//!   `point_count`: u32, `point_count` triples of f32 x 3
//!
//! Neighbor links are not serialized; the reader materializes every cell
//! and then rebuilds the full adjacency in one pass. Voxels are written in
//! creation order, which makes load-then-save byte-identical.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::core::{Point3, VoxelIndex};
use crate::error::{MapError, Result};
use crate::voxel::DualVoxelMap;

/// Current schema version.
pub const SCHEMA_VERSION: u8 = 1;

/// Write `map` to `writer` in binary form.
pub fn write_map<W: Write>(map: &DualVoxelMap, writer: &mut W) -> io::Result<()> {
    writer.write_all(&[SCHEMA_VERSION])?;

    writer.write_all(&map.decimation_size().to_le_bytes())?;
    writer.write_all(&map.max_nn_radius().to_le_bytes())?;
    writer.write_all(&map.max_points_per_voxel().to_le_bytes())?;

    let lk = &map.likelihood_options;
    writer.write_all(&lk.sigma_dist.to_le_bytes())?;
    writer.write_all(&lk.max_corr_distance.to_le_bytes())?;
    writer.write_all(&lk.decimation.to_le_bytes())?;

    let rd = &map.render_options;
    writer.write_all(&rd.point_size.to_le_bytes())?;
    writer.write_all(&[rd.show_mean_only as u8])?;
    for c in rd.color {
        writer.write_all(&c.to_le_bytes())?;
    }
    writer.write_all(&[rd.colormap, rd.recolor_axis])?;

    writer.write_all(&(map.voxel_count() as u64).to_le_bytes())?;
    let mut result = Ok(());
    map.visit_all_voxels(|index, cell| {
        if result.is_err() {
            return;
        }
        result = write_voxel(writer, index, cell.points());
    });
    result
}

fn write_voxel<W: Write>(writer: &mut W, index: VoxelIndex, points: &[Point3]) -> io::Result<()> {
    writer.write_all(&index.x.to_le_bytes())?;
    writer.write_all(&index.y.to_le_bytes())?;
    writer.write_all(&index.z.to_le_bytes())?;
    writer.write_all(&(points.len() as u32).to_le_bytes())?;
    for p in points {
        writer.write_all(&p.x.to_le_bytes())?;
        writer.write_all(&p.y.to_le_bytes())?;
        writer.write_all(&p.z.to_le_bytes())?;
    }
    Ok(())
}

/// Read a map from `reader`, replacing nothing until the whole stream
/// decodes; errors report the byte offset of the failure.
pub fn read_map<R: Read>(reader: &mut R) -> Result<DualVoxelMap> {
    let mut r = OffsetReader::new(reader);

    let version = r.read_u8()?;
    if version != SCHEMA_VERSION {
        return Err(MapError::Corrupt {
            offset: 0,
            reason: format!("unknown schema version {version}"),
        });
    }

    let config_offset = r.offset;
    let decimation_size = r.read_f32()?;
    let max_nn_radius = r.read_f32()?;
    let max_points_per_voxel = r.read_u32()?;

    let mut map = DualVoxelMap::new(decimation_size, max_nn_radius, max_points_per_voxel)
        .map_err(|e| MapError::Corrupt {
            offset: config_offset,
            reason: e.to_string(),
        })?;

    map.likelihood_options.sigma_dist = r.read_f64()?;
    map.likelihood_options.max_corr_distance = r.read_f64()?;
    map.likelihood_options.decimation = r.read_u32()?;

    map.render_options.point_size = r.read_f32()?;
    map.render_options.show_mean_only = r.read_bool()?;
    for c in &mut map.render_options.color {
        *c = r.read_f32()?;
    }
    map.render_options.colormap = r.read_u8()?;
    map.render_options.recolor_axis = r.read_u8()?;

    let voxel_count = r.read_u64()?;
    let mut points = Vec::new();
    for _ in 0..voxel_count {
        let voxel_offset = r.offset;
        let index = VoxelIndex::new(r.read_i32()?, r.read_i32()?, r.read_i32()?);
        let point_count = r.read_u32()?;
        points.clear();
        // count is untrusted input; truncation will surface point-by-point
        points.reserve((point_count as usize).min(1 << 16));
        for _ in 0..point_count {
            points.push(Point3::new(r.read_f32()?, r.read_f32()?, r.read_f32()?));
        }
        if !map.restore_voxel(index, &points) {
            return Err(MapError::Corrupt {
                offset: voxel_offset,
                reason: format!("duplicate voxel index {:?}", index),
            });
        }
    }

    map.rebuild_neighbor_links();
    Ok(map)
}

/// Save to a file in binary form.
pub fn save_binary_file(map: &DualVoxelMap, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| MapError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    write_map(map, &mut writer).map_err(|e| MapError::io(path, e))?;
    writer.flush().map_err(|e| MapError::io(path, e))?;
    log::debug!(
        "saved map to {}: {} voxels",
        path.display(),
        map.voxel_count()
    );
    Ok(())
}

/// Load from a binary file.
pub fn load_binary_file(path: &Path) -> Result<DualVoxelMap> {
    let file = File::open(path).map_err(|e| MapError::io(path, e))?;
    let map = read_map(&mut BufReader::new(file))?;
    log::debug!(
        "loaded map from {}: {} voxels",
        path.display(),
        map.voxel_count()
    );
    Ok(map)
}

/// Reader wrapper tracking the current byte offset so decode failures can
/// point at the exact spot.
struct OffsetReader<'a, R: Read> {
    inner: &'a mut R,
    offset: u64,
}

impl<'a, R: Read> OffsetReader<'a, R> {
    fn new(inner: &'a mut R) -> Self {
        Self { inner, offset: 0 }
    }

    fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
        self.inner.read_exact(buf).map_err(|e| MapError::Corrupt {
            offset: self.offset,
            reason: if e.kind() == io::ErrorKind::UnexpectedEof {
                "truncated stream".to_string()
            } else {
                e.to_string()
            },
        })?;
        self.offset += buf.len() as u64;
        Ok(())
    }

    fn read_u8(&mut self) -> Result<u8> {
        let mut b = [0u8; 1];
        self.fill(&mut b)?;
        Ok(b[0])
    }

    fn read_bool(&mut self) -> Result<bool> {
        let offset = self.offset;
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(MapError::Corrupt {
                offset,
                reason: format!("invalid boolean byte {other}"),
            }),
        }
    }

    fn read_u32(&mut self) -> Result<u32> {
        let mut b = [0u8; 4];
        self.fill(&mut b)?;
        Ok(u32::from_le_bytes(b))
    }

    fn read_i32(&mut self) -> Result<i32> {
        let mut b = [0u8; 4];
        self.fill(&mut b)?;
        Ok(i32::from_le_bytes(b))
    }

    fn read_u64(&mut self) -> Result<u64> {
        let mut b = [0u8; 8];
        self.fill(&mut b)?;
        Ok(u64::from_le_bytes(b))
    }

    fn read_f32(&mut self) -> Result<f32> {
        let mut b = [0u8; 4];
        self.fill(&mut b)?;
        Ok(f32::from_le_bytes(b))
    }

    fn read_f64(&mut self) -> Result<f64> {
        let mut b = [0u8; 8];
        self.fill(&mut b)?;
        Ok(f64::from_le_bytes(b))
    }
}
