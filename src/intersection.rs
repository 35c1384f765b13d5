//! Per-frame intersection detection feeding the outline pass.
//!
//! The default [`AabbIntersection`] treats every renderable mesh as the unit
//! cube transformed into world space, wraps it in an axis-aligned box, and for
//! every overlapping pair emits the twelve edges of the overlap region.

use std::collections::BTreeSet;

use cgmath::{Point3, Transform as _};

use crate::data_structures::{
    components::RenderableMesh, registry::Entity, scene::Scene, scene_graph::resolve_world_transform,
};

/// Highlight data for one frame. Rebuilt from scratch on every update.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OutlineGeometry {
    /// Line-list vertices in world space, two per segment.
    pub vertices: Vec<[f32; 3]>,
    /// Entities involved in at least one intersection.
    pub highlighted: BTreeSet<Entity>,
}

impl OutlineGeometry {
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }
}

pub trait IntersectionSystem {
    fn update(&mut self, scene: &Scene) -> OutlineGeometry;
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Aabb {
    /// World-space bounds of the unit cube `[-0.5, 0.5]^3` under `world`.
    pub fn of_unit_cube(world: &cgmath::Matrix4<f32>) -> Self {
        let mut min = Point3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY);
        let mut max = Point3::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY);
        for corner in 0..8 {
            let local = Point3::new(
                if corner & 1 == 0 { -0.5 } else { 0.5 },
                if corner & 2 == 0 { -0.5 } else { 0.5 },
                if corner & 4 == 0 { -0.5 } else { 0.5 },
            );
            let p = world.transform_point(local);
            min = Point3::new(min.x.min(p.x), min.y.min(p.y), min.z.min(p.z));
            max = Point3::new(max.x.max(p.x), max.y.max(p.y), max.z.max(p.z));
        }
        Self { min, max }
    }

    /// The shared region, if the boxes overlap with positive volume.
    pub fn intersection(&self, other: &Aabb) -> Option<Aabb> {
        let min = Point3::new(
            self.min.x.max(other.min.x),
            self.min.y.max(other.min.y),
            self.min.z.max(other.min.z),
        );
        let max = Point3::new(
            self.max.x.min(other.max.x),
            self.max.y.min(other.max.y),
            self.max.z.min(other.max.z),
        );
        (min.x < max.x && min.y < max.y && min.z < max.z).then_some(Aabb { min, max })
    }

    /// The 12 edges as 24 line-list vertices.
    pub fn edges(&self) -> [[f32; 3]; 24] {
        let (lo, hi) = (self.min, self.max);
        let c = |x: bool, y: bool, z: bool| -> [f32; 3] {
            [
                if x { hi.x } else { lo.x },
                if y { hi.y } else { lo.y },
                if z { hi.z } else { lo.z },
            ]
        };
        #[rustfmt::skip]
        let edges = [
            // bottom
            c(false, false, false), c(true, false, false),
            c(true, false, false), c(true, false, true),
            c(true, false, true), c(false, false, true),
            c(false, false, true), c(false, false, false),
            // top
            c(false, true, false), c(true, true, false),
            c(true, true, false), c(true, true, true),
            c(true, true, true), c(false, true, true),
            c(false, true, true), c(false, true, false),
            // verticals
            c(false, false, false), c(false, true, false),
            c(true, false, false), c(true, true, false),
            c(true, false, true), c(true, true, true),
            c(false, false, true), c(false, true, true),
        ];
        edges
    }
}

#[derive(Debug, Default)]
pub struct AabbIntersection;

impl IntersectionSystem for AabbIntersection {
    fn update(&mut self, scene: &Scene) -> OutlineGeometry {
        let registry = scene.registry();
        let boxes: Vec<(Entity, Aabb)> = registry
            .iter::<RenderableMesh>()
            .filter_map(|(entity, _)| match resolve_world_transform(registry, entity) {
                Ok(world) => Some((entity, Aabb::of_unit_cube(&world))),
                Err(e) => {
                    log::trace!("skipping {:?} for intersection: {}", entity, e);
                    None
                }
            })
            .collect();

        let mut outline = OutlineGeometry::default();
        for (i, (a, a_box)) in boxes.iter().enumerate() {
            for (b, b_box) in &boxes[i + 1..] {
                if let Some(overlap) = a_box.intersection(b_box) {
                    outline.vertices.extend_from_slice(&overlap.edges());
                    outline.highlighted.insert(*a);
                    outline.highlighted.insert(*b);
                }
            }
        }
        outline
    }
}
