//! Flat-shaded Blinn-Phong for the mesh pass. Face normals are derived from
//! screen-space derivatives, so meshes only carry positions.

use crate::backend::{
    PipelineState, ShaderDescriptor,
    uniform::{UniformKind, UniformLayout},
};

pub const VERTEX_SHADER: &str = "shaders/phong.vert.wgsl";
pub const FRAGMENT_SHADER: &str = "shaders/phong.frag.wgsl";

pub fn layout() -> UniformLayout {
    UniformLayout::builder()
        .field("u_model", UniformKind::Mat4)
        .field("u_view", UniformKind::Mat4)
        .field("u_projection", UniformKind::Mat4)
        .field("u_color", UniformKind::Vec3)
        .field("u_light_dir", UniformKind::Vec3)
        .field("u_camera_pos", UniformKind::Vec3)
        .build()
}

pub fn descriptor() -> ShaderDescriptor {
    ShaderDescriptor {
        label: "phong".to_string(),
        layout: layout(),
        state: PipelineState::default(),
    }
}
