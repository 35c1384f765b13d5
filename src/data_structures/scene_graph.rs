//! Hierarchical transform resolution (forward kinematics).
//!
//! An entity's world matrix is the product of the local transforms along its
//! parent chain, applied root-to-leaf: `world = parent_world * local`. The
//! chain ends at the first entity without a [`Parent`] or whose parent handle
//! is no longer live. A visited set turns cyclic chains into
//! [`HierarchyError::CyclicParent`] instead of unbounded recursion.

use std::collections::HashSet;

use cgmath::SquareMatrix;

use crate::data_structures::{
    components::{Parent, Tag, Transform},
    registry::{Entity, Registry},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum HierarchyError {
    #[error("entity {0:?} is not alive")]
    InvalidEntity(Entity),
    #[error("entity {0:?} has no transform")]
    MissingTransform(Entity),
    #[error("entity {0:?} cannot be its own parent")]
    SelfParent(Entity),
    #[error("cyclic parent graph detected at entity {0:?}")]
    CyclicParent(Entity),
}

/// World matrix of `entity`.
///
/// Ancestors that are alive but carry no [`Transform`] contribute identity.
pub fn resolve_world_transform(
    registry: &Registry,
    entity: Entity,
) -> Result<cgmath::Matrix4<f32>, HierarchyError> {
    if !registry.valid(entity) {
        return Err(HierarchyError::InvalidEntity(entity));
    }
    let local = registry
        .get::<Transform>(entity)
        .ok_or(HierarchyError::MissingTransform(entity))?
        .to_matrix();

    log::trace!("[FK] resolving {:?} tagged as {}", entity, tag_of(registry, entity));

    let mut world = local;
    let mut visited = HashSet::from([entity]);
    let mut current = entity;
    let mut depth = 1;
    while let Some(parent) = live_parent(registry, current) {
        if !visited.insert(parent) {
            return Err(HierarchyError::CyclicParent(parent));
        }
        log::trace!(
            "[FK] {:indent$}-> parent {:?} tagged as {}",
            "",
            parent,
            tag_of(registry, parent),
            indent = depth * 2
        );
        let parent_local = registry
            .get::<Transform>(parent)
            .map(Transform::to_matrix)
            .unwrap_or_else(cgmath::Matrix4::identity);
        // Walking leaf-to-root, so each ancestor multiplies on the left.
        world = parent_local * world;
        current = parent;
        depth += 1;
    }
    Ok(world)
}

/// Whether linking `child` under `parent` would close a loop.
pub fn would_create_cycle(registry: &Registry, child: Entity, parent: Entity) -> bool {
    if child == parent {
        return true;
    }
    let mut visited = HashSet::new();
    let mut current = parent;
    while visited.insert(current) {
        if current == child {
            return true;
        }
        match live_parent(registry, current) {
            Some(next) => current = next,
            None => return false,
        }
    }
    // The existing chain above `parent` already loops.
    true
}

/// Parent handle of `entity` if it points to a live entity.
fn live_parent(registry: &Registry, entity: Entity) -> Option<Entity> {
    registry
        .get::<Parent>(entity)
        .map(|parent| parent.0)
        .filter(|parent| registry.valid(*parent))
}

fn tag_of(registry: &Registry, entity: Entity) -> &str {
    registry
        .get::<Tag>(entity)
        .map(|tag| tag.0.as_str())
        .unwrap_or("NO_TAG")
}
