//! GPU binding seam used by scene nodes
//!
//! A [`RenderBackend`] owns the actual GPU objects. Scene nodes only hold the
//! opaque handles it hands out and push uniforms and draw calls through it.

use crate::kind::{Primitive, ShaderSet, VertexLayout};
use nalgebra::Matrix4;
use radarview_core::{Error, Result};

/// Opaque handle to a linked shader program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub u32);

/// Opaque handle to a vertex buffer bound to a program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u32);

/// Uniform values a node pushes to its program
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Uniform {
    Model(Matrix4<f32>),
    View(Matrix4<f32>),
    Projection(Matrix4<f32>),
    Scale(f32),
    LineWidth(f32),
    Antialias(f32),
}

impl Uniform {
    /// Name of the uniform in the shader sources
    pub fn name(&self) -> &'static str {
        match self {
            Uniform::Model(_) => "u_model",
            Uniform::View(_) => "u_view",
            Uniform::Projection(_) => "u_projection",
            Uniform::Scale(_) => "u_scale",
            Uniform::LineWidth(_) => "u_linewidth",
            Uniform::Antialias(_) => "u_antialias",
        }
    }
}

/// GPU operations required by the scene graph
pub trait RenderBackend {
    /// Compile and link a program for the given shader set
    fn compile_program(
        &mut self,
        shaders: &ShaderSet,
        layout: VertexLayout,
        primitive: Primitive,
    ) -> Result<ProgramHandle>;

    /// Allocate a vertex buffer of `capacity` vertices bound to `program`,
    /// initialised with `data`
    fn create_vertex_buffer(
        &mut self,
        program: ProgramHandle,
        layout: VertexLayout,
        capacity: usize,
        data: &[u8],
    ) -> Result<BufferHandle>;

    /// Replace the contents of a vertex buffer
    fn upload(&mut self, buffer: BufferHandle, data: &[u8]) -> Result<()>;

    /// Set a uniform on a program
    fn set_uniform(&mut self, program: ProgramHandle, uniform: Uniform);

    /// Draw `count` vertices of `buffer` with `program`
    fn draw(&mut self, program: ProgramHandle, buffer: BufferHandle, primitive: Primitive, count: u32);

    fn release_buffer(&mut self, buffer: BufferHandle);

    fn release_program(&mut self, program: ProgramHandle);
}

/// A call observed by [`RecordingBackend`]
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    CompileProgram { program: ProgramHandle, shaders: ShaderSet, primitive: Primitive },
    CreateBuffer { buffer: BufferHandle, program: ProgramHandle, capacity: usize },
    Upload { buffer: BufferHandle, data: Vec<u8> },
    SetUniform { program: ProgramHandle, uniform: Uniform },
    Draw { program: ProgramHandle, buffer: BufferHandle, primitive: Primitive, count: u32 },
    ReleaseBuffer(BufferHandle),
    ReleaseProgram(ProgramHandle),
}

/// Headless backend that records every call instead of touching a GPU.
///
/// Used by tests and by the viewer's headless mode.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    calls: Vec<BackendCall>,
    next_program: u32,
    next_buffer: u32,
    failing_shaders: Vec<String>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make compilation fail for any shader set containing `name`
    pub fn fail_shader(&mut self, name: &str) {
        self.failing_shaders.push(name.to_string());
    }

    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }

    /// Uploads issued to `buffer`, oldest first
    pub fn uploads_to(&self, buffer: BufferHandle) -> Vec<&[u8]> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                BackendCall::Upload { buffer: b, data } if *b == buffer => Some(data.as_slice()),
                _ => None,
            })
            .collect()
    }

    pub fn upload_count(&self) -> usize {
        self.calls.iter().filter(|c| matches!(c, BackendCall::Upload { .. })).count()
    }

    /// Programs drawn, in draw order
    pub fn draws(&self) -> Vec<ProgramHandle> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                BackendCall::Draw { program, .. } => Some(*program),
                _ => None,
            })
            .collect()
    }

    /// Most recent value set for the uniform named `name` on `program`
    pub fn last_uniform(&self, program: ProgramHandle, name: &str) -> Option<Uniform> {
        self.calls.iter().rev().find_map(|call| match call {
            BackendCall::SetUniform { program: p, uniform } if *p == program && uniform.name() == name => {
                Some(*uniform)
            }
            _ => None,
        })
    }
}

impl RenderBackend for RecordingBackend {
    fn compile_program(
        &mut self,
        shaders: &ShaderSet,
        _layout: VertexLayout,
        primitive: Primitive,
    ) -> Result<ProgramHandle> {
        if let Some(name) = shaders.names().find(|n| self.failing_shaders.iter().any(|f| f == n)) {
            return Err(Error::Shader {
                name: name.to_string(),
                message: "rejected by recording backend".to_string(),
            });
        }
        let program = ProgramHandle(self.next_program);
        self.next_program += 1;
        self.calls.push(BackendCall::CompileProgram { program, shaders: shaders.clone(), primitive });
        Ok(program)
    }

    fn create_vertex_buffer(
        &mut self,
        program: ProgramHandle,
        _layout: VertexLayout,
        capacity: usize,
        _data: &[u8],
    ) -> Result<BufferHandle> {
        let buffer = BufferHandle(self.next_buffer);
        self.next_buffer += 1;
        self.calls.push(BackendCall::CreateBuffer { buffer, program, capacity });
        Ok(buffer)
    }

    fn upload(&mut self, buffer: BufferHandle, data: &[u8]) -> Result<()> {
        self.calls.push(BackendCall::Upload { buffer, data: data.to_vec() });
        Ok(())
    }

    fn set_uniform(&mut self, program: ProgramHandle, uniform: Uniform) {
        self.calls.push(BackendCall::SetUniform { program, uniform });
    }

    fn draw(&mut self, program: ProgramHandle, buffer: BufferHandle, primitive: Primitive, count: u32) {
        self.calls.push(BackendCall::Draw { program, buffer, primitive, count });
    }

    fn release_buffer(&mut self, buffer: BufferHandle) {
        self.calls.push(BackendCall::ReleaseBuffer(buffer));
    }

    fn release_program(&mut self, program: ProgramHandle) {
        self.calls.push(BackendCall::ReleaseProgram(program));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::LINE_SHADERS;

    #[test]
    fn test_recording_backend_hands_out_fresh_handles() {
        let mut backend = RecordingBackend::new();
        let a = backend.compile_program(&LINE_SHADERS, VertexLayout::Line, Primitive::Lines).unwrap();
        let b = backend.compile_program(&LINE_SHADERS, VertexLayout::Line, Primitive::Lines).unwrap();
        assert_ne!(a, b);

        let buffer = backend.create_vertex_buffer(a, VertexLayout::Line, 4, &[]).unwrap();
        backend.upload(buffer, &[1, 2, 3]).unwrap();
        backend.upload(buffer, &[4]).unwrap();
        assert_eq!(backend.uploads_to(buffer), vec![&[1u8, 2, 3][..], &[4u8][..]]);
        assert_eq!(backend.upload_count(), 2);

        backend.draw(a, buffer, Primitive::Lines, 4);
        backend.draw(b, buffer, Primitive::Lines, 4);
        assert_eq!(backend.draws(), vec![a, b]);
    }

    #[test]
    fn test_last_uniform_by_name() {
        let mut backend = RecordingBackend::new();
        let program = backend.compile_program(&LINE_SHADERS, VertexLayout::Line, Primitive::Lines).unwrap();
        backend.set_uniform(program, Uniform::Scale(1.0));
        backend.set_uniform(program, Uniform::LineWidth(2.0));
        backend.set_uniform(program, Uniform::Scale(0.5));

        assert_eq!(backend.last_uniform(program, "u_scale"), Some(Uniform::Scale(0.5)));
        assert_eq!(backend.last_uniform(program, "u_model"), None);
        backend.clear();
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn test_failing_shader_rejected() {
        let mut backend = RecordingBackend::new();
        backend.fail_shader("line_vertex");
        let err = backend.compile_program(&LINE_SHADERS, VertexLayout::Line, Primitive::Lines).unwrap_err();
        assert!(matches!(err, Error::Shader { ref name, .. } if name == "line_vertex"));
        assert!(backend.calls().is_empty());
    }
}
