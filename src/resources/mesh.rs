//! Position-only triangle meshes and the built-in primitives.

use crate::backend::{GpuError, MeshHandle, RenderBackend};

#[derive(Debug)]
pub struct Mesh {
    handle: MeshHandle,
    vertex_count: usize,
}

impl Mesh {
    /// Uploads a triangle list given as flat `x, y, z` triples.
    pub fn new<B: RenderBackend + ?Sized>(
        gpu: &mut B,
        label: &str,
        positions: &[f32],
    ) -> Result<Self, GpuError> {
        if positions.len() % 3 != 0 {
            return Err(GpuError::MalformedVertices(positions.len()));
        }
        let handle = gpu.create_mesh(label, positions)?;
        Ok(Self {
            handle,
            vertex_count: positions.len() / 3,
        })
    }

    pub fn handle(&self) -> MeshHandle {
        self.handle
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn draw<B: RenderBackend + ?Sized>(&self, gpu: &mut B) -> Result<(), GpuError> {
        gpu.draw_mesh(self.handle)
    }

    pub fn release<B: RenderBackend + ?Sized>(self, gpu: &mut B) -> Result<(), GpuError> {
        gpu.delete_mesh(self.handle)
    }
}

/// Unit cube centred on the origin, 36 vertices, counter-clockwise outward faces.
pub fn cube_positions() -> Vec<f32> {
    // (normal, u, v) with u x v = normal
    const FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        ([1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ([0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, -1.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]),
    ];
    let mut positions = Vec::with_capacity(36 * 3);
    for (normal, u, v) in FACES {
        let corner = |su: f32, sv: f32| -> [f32; 3] {
            [0, 1, 2].map(|i| 0.5 * (normal[i] + su * u[i] + sv * v[i]))
        };
        let quad = [corner(-1.0, -1.0), corner(1.0, -1.0), corner(1.0, 1.0), corner(-1.0, 1.0)];
        for index in [0, 1, 2, 0, 2, 3] {
            positions.extend_from_slice(&quad[index]);
        }
    }
    positions
}

/// Quad on the XZ plane spanning `-1..1`, facing +Y.
pub fn plane_positions() -> Vec<f32> {
    #[rustfmt::skip]
    let positions = vec![
        -1.0, 0.0, -1.0,
        -1.0, 0.0,  1.0,
         1.0, 0.0,  1.0,
        -1.0, 0.0, -1.0,
         1.0, 0.0,  1.0,
         1.0, 0.0, -1.0,
    ];
    positions
}
