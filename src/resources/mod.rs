//! GPU resources owned by a viewport surface and the files they are built from.
//!
//! - `shader` compiles a vertex/fragment pair and sets its uniforms by name
//! - `mesh` uploads position-only triangle lists and provides the built-in primitives

use std::path::Path;

use crate::backend::ShaderError;

pub mod mesh;
pub mod shader;

/// Reads `file_name` relative to the resource root.
pub fn load_string(resource_root: &Path, file_name: &str) -> Result<String, ShaderError> {
    let path = resource_root.join(file_name);
    std::fs::read_to_string(&path).map_err(|source| ShaderError::Io { path, source })
}
