//! Triangle mesh import
//!
//! OBJ files are parsed with the `obj` crate. Polygons with more than three
//! corners are split into a triangle fan around their first corner.

use crate::IoError;
use obj::ObjData;
use radarview_core::{Error, Result, TriangleMesh, Vector3f, Point3f};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Read a triangle mesh, choosing the format from the file extension
pub fn read_mesh<P: AsRef<Path>>(path: P) -> Result<TriangleMesh> {
    let path = path.as_ref();
    match path.extension().and_then(|s| s.to_str()).map(|s| s.to_ascii_lowercase()).as_deref() {
        Some("obj") => ObjReader::read_mesh(path),
        _ => Err(Error::UnsupportedFormat(format!("Unsupported mesh format: {:?}", path.extension()))),
    }
}

pub struct ObjReader;

impl ObjReader {
    pub fn read_mesh<P: AsRef<Path>>(path: P) -> Result<TriangleMesh> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(IoError::FileNotFound { path: path.display().to_string() }.into());
        }
        let file = File::open(path)?;
        let mesh = Self::read_from(BufReader::new(file))?;
        log::info!(
            "Loaded mesh {} ({} vertices, {} faces)",
            path.display(),
            mesh.vertex_count(),
            mesh.face_count()
        );
        Ok(mesh)
    }

    /// Parse OBJ data from any reader and validate the result
    pub fn read_from<R: Read>(reader: R) -> Result<TriangleMesh> {
        let data = ObjData::load_buf(reader).map_err(|e| IoError::InvalidFormat { format: format!("OBJ: {}", e) })?;

        let vertices: Vec<Point3f> = data.position.iter().map(|p| Point3f::new(p[0], p[1], p[2])).collect();
        let mut faces = Vec::new();
        // Per-position normal sums; None once a corner without normal is seen
        let mut normal_sums = Some(vec![Vector3f::zeros(); vertices.len()]);

        for polygon in data.objects.iter().flat_map(|o| o.groups.iter()).flat_map(|g| g.polys.iter()) {
            let corners = &polygon.0;
            if corners.len() < 3 {
                return Err(Error::MalformedMesh(format!("polygon with {} corners", corners.len())));
            }

            for corner in corners {
                let Some(sums) = normal_sums.as_mut() else { break };
                match corner.2 {
                    Some(n) => {
                        let normal = data
                            .normal
                            .get(n)
                            .ok_or_else(|| Error::MalformedMesh(format!("normal index {} out of range", n)))?;
                        if let Some(sum) = sums.get_mut(corner.0) {
                            *sum += Vector3f::new(normal[0], normal[1], normal[2]);
                        }
                    }
                    None => normal_sums = None,
                }
            }

            for i in 1..corners.len() - 1 {
                faces.push([corners[0].0, corners[i].0, corners[i + 1].0]);
            }
        }

        let mut mesh = TriangleMesh::from_vertices_and_faces(vertices, faces);
        if let Some(sums) = normal_sums.filter(|_| !mesh.faces.is_empty()) {
            let normals = sums
                .into_iter()
                .map(|n| n.try_normalize(f32::EPSILON).unwrap_or_else(Vector3f::zeros))
                .collect();
            mesh.set_normals(normals)?;
        }
        mesh.validate()?;
        Ok(mesh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const QUAD: &str = "\
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vn 0 0 1
f 1//1 2//1 3//1 4//1
";

    #[test]
    fn test_quad_is_fan_triangulated() {
        let mesh = ObjReader::read_from(QUAD.as_bytes()).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.faces, vec![[0, 1, 2], [0, 2, 3]]);
        let normals = mesh.normals.as_ref().unwrap();
        assert_relative_eq!(normals[2], Vector3f::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_missing_normals_fall_back_to_none() {
        let mesh = ObjReader::read_from("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n".as_bytes()).unwrap();
        assert!(mesh.normals.is_none());
        assert_eq!(mesh.flat_vertex_count(), 3);
    }

    #[test]
    fn test_out_of_range_face_fails() {
        let result = ObjReader::read_from("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 7\n".as_bytes());
        assert!(result.is_err());
    }

    #[test]
    fn test_unsupported_extension() {
        assert!(matches!(read_mesh("car.stl"), Err(Error::UnsupportedFormat(_))));
    }

    #[test]
    fn test_missing_file() {
        assert!(read_mesh("does/not/exist.obj").is_err());
    }
}
