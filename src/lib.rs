//! flow-viewer
//!
//! A desktop 3D viewer core: an entity/component scene rendered through one
//! or more viewport surfaces, each with its own orbit camera and GPU context.
//! Every surface draws a procedural grid, the scene's meshes with flat Phong
//! shading, and outlines wherever meshes intersect.
//!
//! High-level modules
//! - `backend`: the GPU abstraction (handles, uniform blocks, the `RenderBackend` trait)
//! - `camera`: orbit camera with perspective and orthographic projection
//! - `config`: viewer configuration and environment overrides
//! - `context`: wgpu implementation of the backend for one window or offscreen target
//! - `data_structures`: entities, components, the scene and transform resolution
//! - `flow`: the winit event loop hosting one window per camera
//! - `input`: toolkit-independent input events
//! - `intersection`: per-frame overlap detection producing outline geometry
//! - `logging`: logger setup
//! - `pipelines`: pipeline state and uniform layouts of the grid, mesh and outline passes
//! - `render`: pass resources and the per-frame draw passes
//! - `resources`: shader and mesh resources
//! - `viewport`: the surface lifecycle, frame cycle and input handling
//!

pub mod backend;
pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod flow;
pub mod input;
pub mod intersection;
pub mod logging;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod viewport;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath;
