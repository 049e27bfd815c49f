//! File readers for radarview
//!
//! Radar sequences are read from delimited text tables, one detection per
//! row. Triangle meshes (the vehicle model) are read from OBJ files.

pub mod error;
pub mod mesh;
pub mod sequence;

pub use error::*;
pub use mesh::{read_mesh, ObjReader};
pub use sequence::{
    parse_sequence, read_sequence, Column, Delimiter, FrameWindow, Scan, Sequence, SequenceSchema,
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("radarview_io_{}_{}", std::process::id(), name))
    }

    #[test]
    fn test_sequence_file_roundtrip_through_disk() {
        let path = temp_path("drive_01.csv");
        fs::write(
            &path,
            "# recorded drive\ntimestamp,sensor_id,range_sc,azimuth_sc,rcs,vr_compensated\n10,1,5,0,1,0\n20,2,6,0,1,0\n",
        )
        .unwrap();

        let sequence = read_sequence(&path).unwrap();
        assert_eq!(sequence.name(), format!("radarview_io_{}_drive_01", std::process::id()));
        assert_eq!(sequence.timestamps(), &[10, 20]);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_mesh_file_through_disk() {
        let path = temp_path("triangle.obj");
        fs::write(&path, "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();

        let mesh = read_mesh(&path).unwrap();
        assert_eq!(mesh.face_count(), 1);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_missing_files() {
        assert!(read_sequence(temp_path("missing.csv")).is_err());
        assert!(read_mesh(temp_path("missing.obj")).is_err());
    }
}
