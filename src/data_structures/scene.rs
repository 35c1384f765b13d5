//! The scene shared by every viewport surface.

use crate::{
    camera::Camera,
    data_structures::{
        components::{CameraComponent, Parent, Tag, Transform},
        registry::{Entity, Registry},
        scene_graph::{HierarchyError, would_create_cycle},
    },
};

/// Scene-wide rendering settings read by the grid pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneProperties {
    pub fog_enabled: bool,
    pub fog_color: [f32; 3],
    pub fog_start: f32,
    pub fog_end: f32,
}

impl Default for SceneProperties {
    fn default() -> Self {
        Self {
            fog_enabled: true,
            // matches the default clear colour so the grid fades into the background
            fog_color: [0.1, 0.1, 0.1],
            fog_start: 50.0,
            fog_end: 400.0,
        }
    }
}

/// Owns the entity/component registry. [`SceneProperties`] is attached to the
/// registry as a context value.
#[derive(Debug)]
pub struct Scene {
    registry: Registry,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        let mut registry = Registry::new();
        registry.set_context(SceneProperties::default());
        Self { registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn properties(&self) -> SceneProperties {
        self.registry
            .context::<SceneProperties>()
            .copied()
            .unwrap_or_default()
    }

    pub fn properties_mut(&mut self) -> &mut SceneProperties {
        if self.registry.context::<SceneProperties>().is_none() {
            self.registry.set_context(SceneProperties::default());
        }
        self.registry
            .context_mut::<SceneProperties>()
            .unwrap_or_else(|| unreachable!("scene properties were just inserted"))
    }

    /// Creates an entity with a tag and an identity transform.
    pub fn spawn(&mut self, tag: impl Into<String>) -> Entity {
        let entity = self.registry.create();
        self.registry.insert(entity, Tag::new(tag));
        self.registry.insert(entity, Transform::identity());
        entity
    }

    /// Creates a camera entity.
    pub fn spawn_camera(&mut self, tag: impl Into<String>, camera: Camera) -> Entity {
        let entity = self.spawn(tag);
        self.registry.insert(entity, CameraComponent { camera });
        entity
    }

    /// Links `child` under `parent`, refusing links that would form a cycle.
    pub fn set_parent(&mut self, child: Entity, parent: Entity) -> Result<(), HierarchyError> {
        for entity in [child, parent] {
            if !self.registry.valid(entity) {
                return Err(HierarchyError::InvalidEntity(entity));
            }
        }
        if child == parent {
            return Err(HierarchyError::SelfParent(child));
        }
        if would_create_cycle(&self.registry, child, parent) {
            return Err(HierarchyError::CyclicParent(child));
        }
        self.registry.insert(child, Parent(parent));
        Ok(())
    }

    pub fn destroy(&mut self, entity: Entity) -> bool {
        self.registry.destroy(entity)
    }
}
