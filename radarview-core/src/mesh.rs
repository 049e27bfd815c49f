//! Triangle mesh data and flattening into non-indexed vertex buffers

use crate::error::{Error, Result};
use crate::vertex::*;
use serde::{Deserialize, Serialize};

/// An indexed triangle mesh with optional per-vertex normals
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriangleMesh {
    pub vertices: Vec<Point3f>,
    pub faces: Vec<[usize; 3]>,
    pub normals: Option<Vec<Vector3f>>,
}

impl TriangleMesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
            normals: None,
        }
    }

    /// Create a mesh from vertices and faces
    pub fn from_vertices_and_faces(vertices: Vec<Point3f>, faces: Vec<[usize; 3]>) -> Self {
        Self {
            vertices,
            faces,
            normals: None,
        }
    }

    /// Get the number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of faces
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Number of vertices after flattening (three per face)
    pub fn flat_vertex_count(&self) -> usize {
        self.faces.len() * 3
    }

    /// Check if the mesh is empty
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.faces.is_empty()
    }

    /// Calculate face normals. Degenerate faces get a zero normal; faces that
    /// reference missing vertices fail with `MalformedMesh`.
    pub fn calculate_face_normals(&self) -> Result<Vec<Vector3f>> {
        self.validate()?;
        Ok(self
            .faces
            .iter()
            .map(|face| {
                let v0 = self.vertices[face[0]];
                let edge1 = self.vertices[face[1]] - v0;
                let edge2 = self.vertices[face[2]] - v0;

                edge1.cross(&edge2).try_normalize(f32::EPSILON).unwrap_or_else(Vector3f::zeros)
            })
            .collect())
    }

    /// Set vertex normals, rejecting arrays whose length does not match the vertices
    pub fn set_normals(&mut self, normals: Vec<Vector3f>) -> Result<()> {
        if normals.len() != self.vertices.len() {
            return Err(Error::MalformedMesh(format!(
                "{} normals for {} vertices",
                normals.len(),
                self.vertices.len()
            )));
        }
        self.normals = Some(normals);
        Ok(())
    }

    /// Check face indices and normal counts
    pub fn validate(&self) -> Result<()> {
        if let Some(normals) = &self.normals {
            if normals.len() != self.vertices.len() {
                return Err(Error::MalformedMesh(format!(
                    "{} normals for {} vertices",
                    normals.len(),
                    self.vertices.len()
                )));
            }
        }

        for (i, face) in self.faces.iter().enumerate() {
            if let Some(&index) = face.iter().find(|&&index| index >= self.vertices.len()) {
                return Err(Error::MalformedMesh(format!(
                    "face {} references vertex {} but the mesh has {} vertices",
                    i,
                    index,
                    self.vertices.len()
                )));
            }
        }

        Ok(())
    }

    /// Expand the indexed faces into a flat vertex list, three vertices per face
    /// in face order. Vertex normals are used when present, face normals otherwise.
    pub fn flatten(&self, color: Color) -> Result<Vec<MeshVertex>> {
        let face_normals = match self.normals {
            Some(_) => {
                self.validate()?;
                Vec::new()
            }
            None => self.calculate_face_normals()?,
        };

        let mut flat = Vec::with_capacity(self.flat_vertex_count());
        for (i, face) in self.faces.iter().enumerate() {
            for &index in face {
                let normal = match &self.normals {
                    Some(normals) => normals[index],
                    None => face_normals[i],
                };
                flat.push(MeshVertex::new(self.vertices[index], normal, color));
            }
        }
        Ok(flat)
    }
}

impl Default for TriangleMesh {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> TriangleMesh {
        TriangleMesh::from_vertices_and_faces(
            vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(1.0, 1.0, 0.0),
                Point3f::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        )
    }

    #[test]
    fn test_flatten_duplicates_face_corners() {
        let mesh = quad();
        let flat = mesh.flatten([0.9, 0.9, 0.9, 1.0]).unwrap();

        assert_eq!(flat.len(), 6);
        assert_eq!(flat[0].position, [0.0, 0.0, 0.0]);
        assert_eq!(flat[2].position, [1.0, 1.0, 0.0]);
        assert_eq!(flat[3].position, [0.0, 0.0, 0.0]);
        assert_eq!(flat[5].position, [0.0, 1.0, 0.0]);
        for v in &flat {
            assert_eq!(v.normal, [0.0, 0.0, 1.0]);
            assert_eq!(v.color, [0.9, 0.9, 0.9, 1.0]);
        }
    }

    #[test]
    fn test_flatten_uses_vertex_normals() {
        let mut mesh = quad();
        mesh.set_normals(vec![Vector3f::x(); 4]).unwrap();
        let flat = mesh.flatten([1.0; 4]).unwrap();
        assert!(flat.iter().all(|v| v.normal == [1.0, 0.0, 0.0]));
    }

    #[test]
    fn test_mismatched_normals_rejected() {
        let mut mesh = quad();
        assert!(mesh.set_normals(vec![Vector3f::z(); 3]).is_err());

        mesh.normals = Some(vec![Vector3f::z(); 2]);
        assert!(matches!(mesh.flatten([1.0; 4]), Err(Error::MalformedMesh(_))));
    }

    #[test]
    fn test_out_of_range_face_rejected() {
        let mut mesh = quad();
        mesh.faces.push([0, 1, 7]);
        assert!(matches!(mesh.validate(), Err(Error::MalformedMesh(_))));
        assert!(matches!(mesh.calculate_face_normals(), Err(Error::MalformedMesh(_))));
        assert!(matches!(mesh.flatten([1.0; 4]), Err(Error::MalformedMesh(_))));
    }
}
