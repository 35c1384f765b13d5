//! Procedural multi-level grid on the XZ plane.
//!
//! The grid is a single large quad; line placement, per-level distance fade,
//! axis highlighting and fog all happen in the fragment shader.

use crate::backend::{
    DepthMode, PipelineState, ShaderDescriptor, Topology,
    uniform::{UniformKind, UniformLayout},
};

pub const VERTEX_SHADER: &str = "shaders/grid.vert.wgsl";
pub const FRAGMENT_SHADER: &str = "shaders/grid.frag.wgsl";

/// Length of the `levels` array in the shader. Extra levels are not drawn.
pub const MAX_GRID_LEVELS: usize = 4;

pub fn layout() -> UniformLayout {
    UniformLayout::builder()
        .field("u_model", UniformKind::Mat4)
        .field("u_view", UniformKind::Mat4)
        .field("u_projection", UniformKind::Mat4)
        .field("u_camera_pos", UniformKind::Vec3)
        .field("u_camera_distance", UniformKind::Float)
        .field("u_fog_color", UniformKind::Vec3)
        .field("u_fog_enabled", UniformKind::Bool)
        .field("u_fog_start", UniformKind::Float)
        .field("u_fog_end", UniformKind::Float)
        .field("u_level_count", UniformKind::Int)
        .field("u_line_width", UniformKind::Float)
        .field("u_axis_line_width", UniformKind::Float)
        .field("u_axis_x_color", UniformKind::Vec4)
        .field("u_axis_z_color", UniformKind::Vec4)
        .array(
            "u_levels",
            MAX_GRID_LEVELS,
            &[
                ("color", UniformKind::Vec4),
                ("spacing", UniformKind::Float),
                ("fade_start", UniformKind::Float),
                ("fade_end", UniformKind::Float),
            ],
        )
        .build()
}

pub fn descriptor() -> ShaderDescriptor {
    ShaderDescriptor {
        label: "grid".to_string(),
        layout: layout(),
        state: PipelineState {
            topology: Topology::Triangles,
            alpha_blend: true,
            depth: DepthMode::TestAndWrite,
            // visible from below the plane too
            cull_back_faces: false,
        },
    }
}
