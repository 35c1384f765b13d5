//! Unlit line overlay for intersection outlines. Drawn last, blended, and
//! never occluded.

use crate::backend::{
    DepthMode, PipelineState, ShaderDescriptor, Topology,
    uniform::{UniformKind, UniformLayout},
};

pub const VERTEX_SHADER: &str = "shaders/outline.vert.wgsl";
pub const FRAGMENT_SHADER: &str = "shaders/outline.frag.wgsl";

pub fn layout() -> UniformLayout {
    UniformLayout::builder()
        .field("u_view", UniformKind::Mat4)
        .field("u_projection", UniformKind::Mat4)
        .field("u_color", UniformKind::Vec4)
        .build()
}

pub fn descriptor() -> ShaderDescriptor {
    ShaderDescriptor {
        label: "outline".to_string(),
        layout: layout(),
        state: PipelineState {
            topology: Topology::Lines,
            alpha_blend: true,
            depth: DepthMode::Overlay,
            cull_back_faces: false,
        },
    }
}
