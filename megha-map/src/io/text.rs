//! Plain-text export of the map's points.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{MapError, Result};
use crate::voxel::DualVoxelMap;

impl DualVoxelMap {
    /// Save all points to a text file, one `"x y z"` line per point, no
    /// header. Voxels are written in creation order.
    pub fn save_to_text_file(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| MapError::io(path, e))?;
        let mut writer = BufWriter::new(file);

        let mut io_result = Ok(());
        self.visit_all_points(|p| {
            if io_result.is_ok() {
                io_result = writeln!(writer, "{} {} {}", p.x, p.y, p.z);
            }
        });
        io_result.map_err(|e| MapError::io(path, e))?;
        writer.flush().map_err(|e| MapError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Point3;

    #[test]
    fn test_text_export_one_line_per_point() {
        let mut map = DualVoxelMap::new(1.0, 1.0, 0).unwrap();
        map.insert_point(Point3::new(0.5, -1.25, 2.0));
        map.insert_point(Point3::new(3.0, 0.0, 0.0));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("points.txt");
        map.save_to_text_file(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "0.5 -1.25 2");
        assert_eq!(lines[1], "3 0 0");
    }

    #[test]
    fn test_text_export_empty_map() {
        let map = DualVoxelMap::new(1.0, 1.0, 0).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.txt");
        map.save_to_text_file(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }
}
