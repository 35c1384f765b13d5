//! GPU abstraction used by the render passes.
//!
//! [`RenderBackend`] is the seam between the rendering code and the graphics
//! API. Resources are referred to by small copyable handles that the backend
//! maps to its own objects, so a surface can hold them without borrowing the
//! device. The wgpu implementation lives in [`crate::context`]; tests drive
//! the passes through a recording implementation instead.
//!
//! Drawing follows a bind-then-set model: [`RenderBackend::use_shader`]
//! selects a shader, [`RenderBackend::set_uniform`] writes into that shader's
//! uniform block, and every draw call snapshots the block as it is at that
//! moment.

pub mod uniform;

use std::fmt;

use crate::backend::uniform::{UniformError, UniformLayout, UniformValue};

/// Opaque reference to a shader program owned by a backend. Only valid on
/// the backend that issued it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShaderHandle(pub u32);

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshHandle(pub u32);

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferHandle(pub u32);

impl fmt::Debug for ShaderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Shader#{}", self.0)
    }
}

impl fmt::Debug for MeshHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mesh#{}", self.0)
    }
}

impl fmt::Debug for BufferHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Buffer#{}", self.0)
    }
}

/// Primitive assembly of a pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Topology {
    Triangles,
    Lines,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DepthMode {
    /// Depth-tested and depth-writing (opaque geometry, the grid plane).
    TestAndWrite,
    /// Always passes and leaves the depth buffer untouched (overlays).
    Overlay,
}

/// Fixed-function state baked into a shader's pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PipelineState {
    pub topology: Topology,
    pub alpha_blend: bool,
    pub depth: DepthMode,
    pub cull_back_faces: bool,
}

impl Default for PipelineState {
    fn default() -> Self {
        Self {
            topology: Topology::Triangles,
            alpha_blend: false,
            depth: DepthMode::TestAndWrite,
            cull_back_faces: true,
        }
    }
}

/// Everything a backend needs to build a shader program besides its source.
#[derive(Clone, Debug, PartialEq)]
pub struct ShaderDescriptor {
    pub label: String,
    pub layout: UniformLayout,
    pub state: PipelineState,
}

/// Why a shader program could not be built.
///
/// # Variants
///
/// - `Io`: a source file is missing or unreadable; carries its full path
/// - `Compile`: the backend rejected the source; carries the compiler log
#[derive(Debug, thiserror::Error)]
pub enum ShaderError {
    #[error("failed to read shader source {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("shader `{label}` failed to compile:\n{message}")]
    Compile { label: String, message: String },
}

/// Misuse of a backend or a failure of the device underneath it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GpuError {
    #[error("unknown shader handle {0:?}")]
    UnknownShader(ShaderHandle),
    #[error("unknown mesh handle {0:?}")]
    UnknownMesh(MeshHandle),
    #[error("unknown buffer handle {0:?}")]
    UnknownBuffer(BufferHandle),
    #[error("no shader is bound")]
    NoShaderBound,
    #[error("draw issued outside of a frame")]
    FrameNotStarted,
    #[error("vertex data length {0} is not a multiple of 3")]
    MalformedVertices(usize),
    #[error(transparent)]
    Uniform(#[from] UniformError),
    #[error("surface error: {0}")]
    Surface(String),
}

/// A graphics device bound to one drawable surface.
///
/// Every method must be called while the backend's own context is current,
/// which holds trivially for backends that own their device and surface.
pub trait RenderBackend {
    /// Compiles both stages and builds the pipeline described by `descriptor`.
    fn create_shader(
        &mut self,
        descriptor: &ShaderDescriptor,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<ShaderHandle, ShaderError>;

    /// Fails with [`GpuError::UnknownShader`] if the handle was already deleted.
    fn delete_shader(&mut self, shader: ShaderHandle) -> Result<(), GpuError>;

    /// Uploads a triangle list given as flat `x, y, z` position triples.
    fn create_mesh(&mut self, label: &str, positions: &[f32]) -> Result<MeshHandle, GpuError>;

    fn delete_mesh(&mut self, mesh: MeshHandle) -> Result<(), GpuError>;

    /// Allocates a dynamic line-list vertex buffer with room for `capacity` vertices.
    fn create_line_buffer(&mut self, label: &str, capacity: usize)
    -> Result<BufferHandle, GpuError>;

    /// Replaces the buffer's contents, growing it if needed.
    fn write_line_buffer(
        &mut self,
        buffer: BufferHandle,
        vertices: &[[f32; 3]],
    ) -> Result<(), GpuError>;

    fn delete_buffer(&mut self, buffer: BufferHandle) -> Result<(), GpuError>;

    fn resize(&mut self, width: u32, height: u32);

    /// Starts a frame cleared to `clear_colour`.
    ///
    /// Returns `Ok(false)` when the frame should be skipped, e.g. while the
    /// surface is being reconfigured.
    fn begin_frame(&mut self, clear_colour: [f32; 4]) -> Result<bool, GpuError>;

    /// Binds `shader` for the following uniform writes and draws.
    fn use_shader(&mut self, shader: ShaderHandle) -> Result<(), GpuError>;

    /// Writes a uniform of the currently bound shader.
    fn set_uniform(&mut self, name: &str, value: UniformValue) -> Result<(), GpuError>;

    /// Draws with the bound shader and a snapshot of its current uniforms.
    fn draw_mesh(&mut self, mesh: MeshHandle) -> Result<(), GpuError>;

    fn draw_lines(&mut self, buffer: BufferHandle, vertex_count: u32) -> Result<(), GpuError>;

    /// Submits and presents everything recorded since [`Self::begin_frame`].
    fn end_frame(&mut self) -> Result<(), GpuError>;

    /// Forwards device validation messages to the log until stopped.
    fn start_debug_logging(&mut self);

    fn stop_debug_logging(&mut self);

    fn is_debug_logging(&self) -> bool;
}
