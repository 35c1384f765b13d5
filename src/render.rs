//! Per-frame draw passes.
//!
//! [`RenderingContext`] holds the GPU resources one surface needs for its
//! passes; every resource is optional so a failed shader only disables its
//! own pass. [`RenderingSystem::render`] runs the passes in a fixed order:
//!
//! 1. grid: every visible [`GridComponent`], alpha-blended and depth-tested
//! 2. mesh: every [`RenderableMesh`] drawn with the shared cube and the Phong shader
//! 3. outline: the intersection outline, blended on top of everything
//!
//! Each pass binds its own shader and sets every uniform it reads.

use std::{collections::HashSet, path::Path};

use cgmath::{InnerSpace, Matrix4, Point3, Vector3};

use crate::{
    backend::{BufferHandle, GpuError, RenderBackend, ShaderDescriptor},
    data_structures::{
        components::{GridComponent, RenderableMesh},
        registry::{Entity, Registry},
        scene::Scene,
        scene_graph::{HierarchyError, resolve_world_transform},
    },
    intersection::OutlineGeometry,
    pipelines::{grid, outline, phong},
    resources::{
        mesh::{Mesh, cube_positions, plane_positions},
        shader::Shader,
    },
};

/// Line vertices the outline buffer starts with. It grows on demand.
const OUTLINE_INITIAL_CAPACITY: usize = 24 * 16;

/// Camera state shared by every pass of one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameParams {
    pub view: Matrix4<f32>,
    pub projection: Matrix4<f32>,
    pub camera_position: Point3<f32>,
    pub camera_distance: f32,
}

/// What one call to [`RenderingSystem::render`] submitted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub grid_draws: u32,
    pub mesh_draws: u32,
    pub outline_vertices: u32,
}

/// GPU resources backing the passes of one surface.
#[derive(Debug, Default)]
pub struct RenderingContext {
    grid_shader: Option<Shader>,
    phong_shader: Option<Shader>,
    outline_shader: Option<Shader>,
    plane: Option<Mesh>,
    cube: Option<Mesh>,
    outline_lines: Option<BufferHandle>,
}

impl RenderingContext {
    /// Creates every resource independently. Failures are logged and leave
    /// the resource unset, which disables the pass that needs it.
    pub fn initialize<B: RenderBackend + ?Sized>(gpu: &mut B, resource_root: &Path) -> Self {
        let load = |gpu: &mut B, descriptor: ShaderDescriptor, vertex: &str, fragment: &str| {
            Shader::new(gpu, resource_root, &descriptor, vertex, fragment)
                .map_err(|e| log::error!("{}", e))
                .ok()
        };
        let grid_shader = load(gpu, grid::descriptor(), grid::VERTEX_SHADER, grid::FRAGMENT_SHADER);
        let phong_shader = load(gpu, phong::descriptor(), phong::VERTEX_SHADER, phong::FRAGMENT_SHADER);
        let outline_shader = load(
            gpu,
            outline::descriptor(),
            outline::VERTEX_SHADER,
            outline::FRAGMENT_SHADER,
        );

        let plane = Mesh::new(gpu, "grid plane", &plane_positions())
            .map_err(|e| log::error!("failed to create grid plane: {}", e))
            .ok();
        let cube = Mesh::new(gpu, "unit cube", &cube_positions())
            .map_err(|e| log::error!("failed to create cube mesh: {}", e))
            .ok();
        let outline_lines = gpu
            .create_line_buffer("intersection outline", OUTLINE_INITIAL_CAPACITY)
            .map_err(|e| log::error!("failed to create outline buffer: {}", e))
            .ok();

        let context = Self {
            grid_shader,
            phong_shader,
            outline_shader,
            plane,
            cube,
            outline_lines,
        };
        log::debug!(
            "rendering context ready (grid: {}, mesh: {}, outline: {})",
            context.has_grid_pass(),
            context.has_mesh_pass(),
            context.has_outline_pass()
        );
        context
    }

    pub fn has_grid_pass(&self) -> bool {
        self.grid_shader.is_some() && self.plane.is_some()
    }

    pub fn has_mesh_pass(&self) -> bool {
        self.phong_shader.is_some() && self.cube.is_some()
    }

    pub fn has_outline_pass(&self) -> bool {
        self.outline_shader.is_some() && self.outline_lines.is_some()
    }

    /// Releases every resource still held. A failing deletion is logged and
    /// the remaining ones still run. Returns the number of failures.
    pub fn shutdown<B: RenderBackend + ?Sized>(&mut self, gpu: &mut B) -> usize {
        let mut results = Vec::new();
        for shader in [
            self.grid_shader.take(),
            self.phong_shader.take(),
            self.outline_shader.take(),
        ]
        .into_iter()
        .flatten()
        {
            results.push(shader.release(gpu));
        }
        for mesh in [self.plane.take(), self.cube.take()].into_iter().flatten() {
            results.push(mesh.release(gpu));
        }
        if let Some(buffer) = self.outline_lines.take() {
            results.push(gpu.delete_buffer(buffer));
        }

        let mut failures = 0;
        for result in results {
            if let Err(e) = result {
                log::error!("failed to release GPU resource: {}", e);
                failures += 1;
            }
        }
        failures
    }
}

/// Draws a scene through the passes of a [`RenderingContext`].
///
/// Entities that cannot be drawn are reported once per distinct error; the
/// record is dropped when the entity is destroyed.
#[derive(Debug)]
pub struct RenderingSystem {
    /// Direction towards the light, in world space.
    pub light_direction: Vector3<f32>,
    /// Colour of the intersection outline, RGBA.
    pub outline_color: [f32; 4],
    warned: HashSet<(Entity, HierarchyError)>,
    truncated_grids: HashSet<Entity>,
}

impl Default for RenderingSystem {
    fn default() -> Self {
        Self {
            light_direction: Vector3::new(0.4, 1.0, 0.6).normalize(),
            outline_color: [1.0, 0.6, 0.1, 1.0],
            warned: HashSet::new(),
            truncated_grids: HashSet::new(),
        }
    }
}

impl RenderingSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Errors already reported for `entity` while it is alive.
    pub fn reported_errors(&self, entity: Entity) -> Vec<HierarchyError> {
        self.warned
            .iter()
            .filter(|(warned, _)| *warned == entity)
            .map(|(_, error)| *error)
            .collect()
    }

    /// Runs the grid, mesh and outline passes in that order. A pass whose
    /// resources are missing is skipped; a pass that hits a GPU error is
    /// abandoned and logged without affecting the others.
    pub fn render<B: RenderBackend + ?Sized>(
        &mut self,
        gpu: &mut B,
        context: &RenderingContext,
        scene: &Scene,
        frame: &FrameParams,
        outline: &OutlineGeometry,
    ) -> FrameStats {
        let registry = scene.registry();
        self.warned.retain(|(entity, _)| registry.valid(*entity));
        self.truncated_grids.retain(|entity| registry.valid(*entity));

        let mut stats = FrameStats::default();
        match self.grid_pass(gpu, context, scene, frame) {
            Ok(draws) => stats.grid_draws = draws,
            Err(e) => log::error!("grid pass failed: {}", e),
        }
        match self.mesh_pass(gpu, context, scene, frame) {
            Ok(draws) => stats.mesh_draws = draws,
            Err(e) => log::error!("mesh pass failed: {}", e),
        }
        match self.outline_pass(gpu, context, frame, outline) {
            Ok(vertices) => stats.outline_vertices = vertices,
            Err(e) => log::error!("outline pass failed: {}", e),
        }
        stats
    }

    fn grid_pass<B: RenderBackend + ?Sized>(
        &mut self,
        gpu: &mut B,
        context: &RenderingContext,
        scene: &Scene,
        frame: &FrameParams,
    ) -> Result<u32, GpuError> {
        let (Some(shader), Some(plane)) = (&context.grid_shader, &context.plane) else {
            return Ok(0);
        };
        let registry = scene.registry();
        let grids: Vec<(Entity, &GridComponent)> = registry
            .iter::<GridComponent>()
            .filter(|(_, grid)| grid.visible)
            .collect();
        if grids.is_empty() {
            return Ok(0);
        }

        let properties = scene.properties();
        shader.bind(gpu)?;
        shader.set_mat4(gpu, "u_view", frame.view)?;
        shader.set_mat4(gpu, "u_projection", frame.projection)?;
        shader.set_vec3(gpu, "u_camera_pos", point_to_vec(frame.camera_position))?;
        shader.set_float(gpu, "u_camera_distance", frame.camera_distance)?;
        shader.set_bool(gpu, "u_fog_enabled", properties.fog_enabled)?;
        shader.set_vec3(gpu, "u_fog_color", properties.fog_color)?;
        shader.set_float(gpu, "u_fog_start", properties.fog_start)?;
        shader.set_float(gpu, "u_fog_end", properties.fog_end)?;

        let mut draws = 0;
        for (entity, grid) in grids {
            let Some(model) = self.world_transform(registry, entity) else {
                continue;
            };
            if grid.levels.len() > grid::MAX_GRID_LEVELS && self.truncated_grids.insert(entity) {
                log::warn!(
                    "grid {:?} has {} levels, only the first {} are drawn",
                    entity,
                    grid.levels.len(),
                    grid::MAX_GRID_LEVELS
                );
            }
            let levels = &grid.levels[..grid.levels.len().min(grid::MAX_GRID_LEVELS)];

            shader.set_mat4(gpu, "u_model", model)?;
            shader.set_float(gpu, "u_line_width", grid.line_width)?;
            shader.set_float(gpu, "u_axis_line_width", grid.axis_line_width)?;
            shader.set_vec4(gpu, "u_axis_x_color", grid.axis_x_color)?;
            shader.set_vec4(gpu, "u_axis_z_color", grid.axis_z_color)?;
            shader.set_int(gpu, "u_level_count", levels.len() as i32)?;
            for (i, level) in levels.iter().enumerate() {
                shader.set_float(gpu, &format!("u_levels[{}].spacing", i), level.spacing)?;
                shader.set_vec4(gpu, &format!("u_levels[{}].color", i), level.color)?;
                shader.set_float(gpu, &format!("u_levels[{}].fade_start", i), level.fade_start)?;
                shader.set_float(gpu, &format!("u_levels[{}].fade_end", i), level.fade_end)?;
            }
            plane.draw(gpu)?;
            draws += 1;
        }
        Ok(draws)
    }

    fn mesh_pass<B: RenderBackend + ?Sized>(
        &mut self,
        gpu: &mut B,
        context: &RenderingContext,
        scene: &Scene,
        frame: &FrameParams,
    ) -> Result<u32, GpuError> {
        let (Some(shader), Some(cube)) = (&context.phong_shader, &context.cube) else {
            return Ok(0);
        };
        let registry = scene.registry();
        let meshes: Vec<(Entity, &RenderableMesh)> = registry.iter::<RenderableMesh>().collect();
        if meshes.is_empty() {
            return Ok(0);
        }

        shader.bind(gpu)?;
        shader.set_mat4(gpu, "u_view", frame.view)?;
        shader.set_mat4(gpu, "u_projection", frame.projection)?;
        shader.set_vec3(gpu, "u_light_dir", self.light_direction)?;
        shader.set_vec3(gpu, "u_camera_pos", point_to_vec(frame.camera_position))?;

        let mut draws = 0;
        for (entity, mesh) in meshes {
            let Some(model) = self.world_transform(registry, entity) else {
                continue;
            };
            shader.set_mat4(gpu, "u_model", model)?;
            shader.set_vec3(gpu, "u_color", mesh.color)?;
            cube.draw(gpu)?;
            draws += 1;
        }
        Ok(draws)
    }

    fn outline_pass<B: RenderBackend + ?Sized>(
        &mut self,
        gpu: &mut B,
        context: &RenderingContext,
        frame: &FrameParams,
        outline: &OutlineGeometry,
    ) -> Result<u32, GpuError> {
        let (Some(shader), Some(lines)) = (&context.outline_shader, context.outline_lines) else {
            return Ok(0);
        };
        if outline.is_empty() {
            return Ok(0);
        }

        gpu.write_line_buffer(lines, &outline.vertices)?;
        shader.bind(gpu)?;
        shader.set_mat4(gpu, "u_view", frame.view)?;
        shader.set_mat4(gpu, "u_projection", frame.projection)?;
        shader.set_vec4(gpu, "u_color", self.outline_color)?;
        gpu.draw_lines(lines, outline.vertex_count())?;
        Ok(outline.vertex_count())
    }

    /// World matrix of `entity`, warning once per entity and error when it cannot be resolved.
    fn world_transform(&mut self, registry: &Registry, entity: Entity) -> Option<Matrix4<f32>> {
        match resolve_world_transform(registry, entity) {
            Ok(world) => Some(world),
            Err(e) => {
                if self.warned.insert((entity, e)) {
                    log::warn!("not drawing {:?}: {}", entity, e);
                }
                None
            }
        }
    }
}

fn point_to_vec(point: Point3<f32>) -> Vector3<f32> {
    Vector3::new(point.x, point.y, point.z)
}
