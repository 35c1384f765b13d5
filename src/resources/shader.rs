//! A compiled vertex/fragment shader pair.

use std::path::Path;

use crate::{
    backend::{GpuError, RenderBackend, ShaderDescriptor, ShaderError, ShaderHandle, uniform::UniformValue},
    resources::load_string,
};

/// Handle to a shader program plus typed uniform setters.
///
/// Setters write into the uniforms of whichever shader is bound, so call
/// [`Shader::bind`] first.
#[derive(Debug)]
pub struct Shader {
    handle: ShaderHandle,
    label: String,
}

impl Shader {
    /// Loads both stages from `resource_root` and compiles them.
    pub fn new<B: RenderBackend + ?Sized>(
        gpu: &mut B,
        resource_root: &Path,
        descriptor: &ShaderDescriptor,
        vertex_path: &str,
        fragment_path: &str,
    ) -> Result<Self, ShaderError> {
        let vertex_source = load_string(resource_root, vertex_path)?;
        let fragment_source = load_string(resource_root, fragment_path)?;
        let handle = gpu.create_shader(descriptor, &vertex_source, &fragment_source)?;
        log::debug!("compiled shader `{}` as {:?}", descriptor.label, handle);
        Ok(Self {
            handle,
            label: descriptor.label.clone(),
        })
    }

    pub fn handle(&self) -> ShaderHandle {
        self.handle
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn bind<B: RenderBackend + ?Sized>(&self, gpu: &mut B) -> Result<(), GpuError> {
        gpu.use_shader(self.handle)
    }

    pub fn set_mat4<B: RenderBackend + ?Sized>(
        &self,
        gpu: &mut B,
        name: &str,
        value: cgmath::Matrix4<f32>,
    ) -> Result<(), GpuError> {
        gpu.set_uniform(name, UniformValue::Mat4(value))
    }

    pub fn set_vec3<B: RenderBackend + ?Sized>(
        &self,
        gpu: &mut B,
        name: &str,
        value: impl Into<cgmath::Vector3<f32>>,
    ) -> Result<(), GpuError> {
        gpu.set_uniform(name, UniformValue::Vec3(value.into()))
    }

    pub fn set_vec4<B: RenderBackend + ?Sized>(
        &self,
        gpu: &mut B,
        name: &str,
        value: [f32; 4],
    ) -> Result<(), GpuError> {
        gpu.set_uniform(name, UniformValue::Vec4(value))
    }

    pub fn set_float<B: RenderBackend + ?Sized>(
        &self,
        gpu: &mut B,
        name: &str,
        value: f32,
    ) -> Result<(), GpuError> {
        gpu.set_uniform(name, UniformValue::Float(value))
    }

    pub fn set_int<B: RenderBackend + ?Sized>(
        &self,
        gpu: &mut B,
        name: &str,
        value: i32,
    ) -> Result<(), GpuError> {
        gpu.set_uniform(name, UniformValue::Int(value))
    }

    pub fn set_bool<B: RenderBackend + ?Sized>(
        &self,
        gpu: &mut B,
        name: &str,
        value: bool,
    ) -> Result<(), GpuError> {
        gpu.set_uniform(name, UniformValue::Bool(value))
    }

    /// Destroys the program. Must run under the context that created it.
    pub fn release<B: RenderBackend + ?Sized>(self, gpu: &mut B) -> Result<(), GpuError> {
        log::debug!("releasing shader `{}`", self.label);
        gpu.delete_shader(self.handle)
    }
}
