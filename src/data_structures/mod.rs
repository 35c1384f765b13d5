//! Scene data model: entities, components, and hierarchy resolution.
//!
//! - `registry` is the entity arena with per-type sparse component maps
//! - `components` holds the plain data records (transform, parent, tag, camera, grid, mesh)
//! - `scene` wraps the registry together with the scene-wide properties
//! - `scene_graph` resolves world transforms along parent chains

pub mod components;
pub mod registry;
pub mod scene;
pub mod scene_graph;
