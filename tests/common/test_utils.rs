#![allow(dead_code)]

use std::{
    cell::RefCell,
    collections::{HashMap, HashSet},
    path::PathBuf,
    rc::Rc,
};

use flow_viewer::{
    backend::{
        BufferHandle, GpuError, MeshHandle, RenderBackend, ShaderDescriptor, ShaderError,
        ShaderHandle,
        uniform::{UniformBlock, UniformValue},
    },
    camera::Camera,
    config::ViewerConfig,
    data_structures::{registry::Entity, scene::Scene},
};

/// Every call a [`RecordingBackend`] received, in order.
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    CreateShader(String),
    DeleteShader(ShaderHandle),
    CreateMesh(String, usize),
    DeleteMesh(MeshHandle),
    CreateLineBuffer(String),
    WriteLineBuffer(BufferHandle, usize),
    DeleteBuffer(BufferHandle),
    Resize(u32, u32),
    BeginFrame,
    UseShader(String),
    SetUniform(String, UniformValue),
    DrawMesh(MeshHandle),
    DrawLines(BufferHandle, u32),
    EndFrame,
    StartDebugLogging,
    StopDebugLogging,
}

/// In-memory backend that validates usage like a real device would and
/// records every call for later inspection.
///
/// The call log is shared through an `Rc` so it stays readable after the
/// backend itself has been handed to (and dropped by) a surface.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub calls: Rc<RefCell<Vec<Call>>>,
    /// Labels of shaders whose compilation fails.
    pub failing_shaders: HashSet<String>,
    /// When set, `begin_frame` asks the caller to skip the frame.
    pub skip_frames: bool,
    next_id: u32,
    shaders: HashMap<ShaderHandle, (String, UniformBlock)>,
    meshes: HashSet<MeshHandle>,
    buffers: HashMap<BufferHandle, usize>,
    bound: Option<ShaderHandle>,
    in_frame: bool,
    debug_logging: bool,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(labels: &[&str]) -> Self {
        Self {
            failing_shaders: labels.iter().map(|label| label.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn log(&self) -> Rc<RefCell<Vec<Call>>> {
        Rc::clone(&self.calls)
    }

    pub fn live_resources(&self) -> usize {
        self.shaders.len() + self.meshes.len() + self.buffers.len()
    }

    /// Current uniform block contents of the shader labelled `label`.
    pub fn uniform_bytes(&self, label: &str) -> Option<Vec<u8>> {
        self.shaders
            .values()
            .find(|(l, _)| l == label)
            .map(|(_, block)| block.bytes().to_vec())
    }

    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn push(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }
}

impl RenderBackend for RecordingBackend {
    fn create_shader(
        &mut self,
        descriptor: &ShaderDescriptor,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<ShaderHandle, ShaderError> {
        self.push(Call::CreateShader(descriptor.label.clone()));
        if self.failing_shaders.contains(&descriptor.label)
            || vertex_source.trim().is_empty()
            || fragment_source.trim().is_empty()
        {
            return Err(ShaderError::Compile {
                label: descriptor.label.clone(),
                message: "forced failure".to_string(),
            });
        }
        let handle = ShaderHandle(self.next_id());
        self.shaders.insert(
            handle,
            (
                descriptor.label.clone(),
                UniformBlock::new(descriptor.layout.clone()),
            ),
        );
        Ok(handle)
    }

    fn delete_shader(&mut self, shader: ShaderHandle) -> Result<(), GpuError> {
        self.push(Call::DeleteShader(shader));
        self.shaders
            .remove(&shader)
            .map(|_| ())
            .ok_or(GpuError::UnknownShader(shader))?;
        if self.bound == Some(shader) {
            self.bound = None;
        }
        Ok(())
    }

    fn create_mesh(&mut self, label: &str, positions: &[f32]) -> Result<MeshHandle, GpuError> {
        if positions.len() % 3 != 0 {
            return Err(GpuError::MalformedVertices(positions.len()));
        }
        self.push(Call::CreateMesh(label.to_string(), positions.len() / 3));
        let handle = MeshHandle(self.next_id());
        self.meshes.insert(handle);
        Ok(handle)
    }

    fn delete_mesh(&mut self, mesh: MeshHandle) -> Result<(), GpuError> {
        self.push(Call::DeleteMesh(mesh));
        if self.meshes.remove(&mesh) {
            Ok(())
        } else {
            Err(GpuError::UnknownMesh(mesh))
        }
    }

    fn create_line_buffer(
        &mut self,
        label: &str,
        capacity: usize,
    ) -> Result<BufferHandle, GpuError> {
        self.push(Call::CreateLineBuffer(label.to_string()));
        let handle = BufferHandle(self.next_id());
        self.buffers.insert(handle, capacity);
        Ok(handle)
    }

    fn write_line_buffer(
        &mut self,
        buffer: BufferHandle,
        vertices: &[[f32; 3]],
    ) -> Result<(), GpuError> {
        self.push(Call::WriteLineBuffer(buffer, vertices.len()));
        let capacity = self
            .buffers
            .get_mut(&buffer)
            .ok_or(GpuError::UnknownBuffer(buffer))?;
        *capacity = (*capacity).max(vertices.len());
        Ok(())
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) -> Result<(), GpuError> {
        self.push(Call::DeleteBuffer(buffer));
        self.buffers
            .remove(&buffer)
            .map(|_| ())
            .ok_or(GpuError::UnknownBuffer(buffer))
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.push(Call::Resize(width, height));
    }

    fn begin_frame(&mut self, _clear_colour: [f32; 4]) -> Result<bool, GpuError> {
        self.push(Call::BeginFrame);
        if self.skip_frames {
            return Ok(false);
        }
        self.in_frame = true;
        Ok(true)
    }

    fn use_shader(&mut self, shader: ShaderHandle) -> Result<(), GpuError> {
        let (label, _) = self
            .shaders
            .get(&shader)
            .ok_or(GpuError::UnknownShader(shader))?;
        self.push(Call::UseShader(label.clone()));
        self.bound = Some(shader);
        Ok(())
    }

    fn set_uniform(&mut self, name: &str, value: UniformValue) -> Result<(), GpuError> {
        let shader = self.bound.ok_or(GpuError::NoShaderBound)?;
        let (_, block) = self
            .shaders
            .get_mut(&shader)
            .ok_or(GpuError::UnknownShader(shader))?;
        block.set(name, value)?;
        self.push(Call::SetUniform(name.to_string(), value));
        Ok(())
    }

    fn draw_mesh(&mut self, mesh: MeshHandle) -> Result<(), GpuError> {
        if !self.in_frame {
            return Err(GpuError::FrameNotStarted);
        }
        if self.bound.is_none() {
            return Err(GpuError::NoShaderBound);
        }
        if !self.meshes.contains(&mesh) {
            return Err(GpuError::UnknownMesh(mesh));
        }
        self.push(Call::DrawMesh(mesh));
        Ok(())
    }

    fn draw_lines(&mut self, buffer: BufferHandle, vertex_count: u32) -> Result<(), GpuError> {
        if !self.in_frame {
            return Err(GpuError::FrameNotStarted);
        }
        if self.bound.is_none() {
            return Err(GpuError::NoShaderBound);
        }
        if !self.buffers.contains_key(&buffer) {
            return Err(GpuError::UnknownBuffer(buffer));
        }
        self.push(Call::DrawLines(buffer, vertex_count));
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), GpuError> {
        if !self.in_frame {
            return Err(GpuError::FrameNotStarted);
        }
        self.in_frame = false;
        self.push(Call::EndFrame);
        Ok(())
    }

    fn start_debug_logging(&mut self) {
        self.debug_logging = true;
        self.push(Call::StartDebugLogging);
    }

    fn stop_debug_logging(&mut self) {
        self.debug_logging = false;
        self.push(Call::StopDebugLogging);
    }

    fn is_debug_logging(&self) -> bool {
        self.debug_logging
    }
}

/// Shaders shipped with the crate.
pub fn asset_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets")
}

pub fn test_config() -> ViewerConfig {
    ViewerConfig::default()
        .with_resource_root(asset_root())
        .with_debug_logging(false)
}

/// A scene holding one default camera, shared the way the host shares it.
pub fn scene_with_camera() -> (Rc<RefCell<Scene>>, Entity) {
    let mut scene = Scene::new();
    let camera = scene.spawn_camera("camera", Camera::default());
    (Rc::new(RefCell::new(scene)), camera)
}

pub fn count(calls: &[Call], predicate: impl Fn(&Call) -> bool) -> usize {
    calls.iter().filter(|call| predicate(call)).count()
}

pub fn is_delete(call: &Call) -> bool {
    matches!(
        call,
        Call::DeleteShader(_) | Call::DeleteMesh(_) | Call::DeleteBuffer(_)
    )
}
