//! Entity/component store.
//!
//! Entities are generational handles into an arena. Components live in one
//! sparse map per component type, keyed by the handle, so a dangling handle
//! simply finds nothing. Scene-wide singletons (such as
//! [`SceneProperties`](crate::data_structures::scene::SceneProperties)) are
//! stored as context values next to the component maps.

use std::{
    any::{Any, TypeId},
    collections::{BTreeMap, HashMap},
    fmt,
};

/// Opaque entity identifier.
///
/// The generation is bumped every time a slot is recycled, so a handle to a
/// destroyed entity never aliases a newer one.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity {
    index: u32,
    generation: u32,
}

impl Entity {
    /// Arena slot. Shared by every entity that ever lived in that slot.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// How often the slot had been recycled when this handle was issued.
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({}v{})", self.index, self.generation)
    }
}

/// Marker for plain data records that can be attached to an entity.
pub trait Component: Any {}

trait ComponentStorage: Any {
    fn remove_entity(&mut self, entity: Entity);
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

struct Storage<T> {
    // BTreeMap keeps iteration (and therefore draw order) stable across frames
    entries: BTreeMap<Entity, T>,
}

impl<T: Component> ComponentStorage for Storage<T> {
    fn remove_entity(&mut self, entity: Entity) {
        self.entries.remove(&entity);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    generation: u32,
    alive: bool,
}

/// Owns every entity of a scene and the components attached to them.
///
/// # Key operations
///
/// - [`Registry::create`] / [`Registry::destroy`]: entity lifetime
/// - [`Registry::insert`], [`Registry::get`], [`Registry::remove`]: one
///   component type at a time
/// - [`Registry::iter`]: all entities carrying a component type
/// - [`Registry::set_context`] / [`Registry::context`]: scene-wide singletons
#[derive(Default)]
pub struct Registry {
    slots: Vec<Slot>,
    free: Vec<u32>,
    storages: HashMap<TypeId, Box<dyn ComponentStorage>>,
    context: HashMap<TypeId, Box<dyn Any>>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("alive", &self.len())
            .field("component_types", &self.storages.len())
            .finish()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a new entity without components, reusing a free slot
    /// under a bumped generation when one is available.
    pub fn create(&mut self) -> Entity {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.alive = true;
            Entity {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                alive: true,
            });
            Entity {
                index,
                generation: 0,
            }
        }
    }

    /// Removes the entity and every component attached to it.
    ///
    /// Returns `false` if the handle was already dead.
    pub fn destroy(&mut self, entity: Entity) -> bool {
        if !self.valid(entity) {
            return false;
        }
        for storage in self.storages.values_mut() {
            storage.remove_entity(entity);
        }
        let slot = &mut self.slots[entity.index as usize];
        slot.alive = false;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(entity.index);
        true
    }

    /// Whether the handle still refers to a live entity.
    pub fn valid(&self, entity: Entity) -> bool {
        self.slots
            .get(entity.index as usize)
            .is_some_and(|slot| slot.alive && slot.generation == entity.generation)
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.alive).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Attaches `component`, returning the value it replaced.
    ///
    /// # Panics
    ///
    /// Attaching to a dead entity is a programming error.
    pub fn insert<T: Component>(&mut self, entity: Entity, component: T) -> Option<T> {
        assert!(
            self.valid(entity),
            "cannot attach {} to dead entity {:?}",
            std::any::type_name::<T>(),
            entity
        );
        self.storage_mut::<T>().entries.insert(entity, component)
    }

    pub fn remove<T: Component>(&mut self, entity: Entity) -> Option<T> {
        self.storages
            .get_mut(&TypeId::of::<T>())
            .and_then(|storage| storage.as_any_mut().downcast_mut::<Storage<T>>())
            .and_then(|storage| storage.entries.remove(&entity))
    }

    pub fn get<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.storage::<T>()?.entries.get(&entity)
    }

    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.storages
            .get_mut(&TypeId::of::<T>())
            .and_then(|storage| storage.as_any_mut().downcast_mut::<Storage<T>>())
            .and_then(|storage| storage.entries.get_mut(&entity))
    }

    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        self.get::<T>(entity).is_some()
    }

    /// Every entity carrying a `T`, in handle order.
    pub fn iter<T: Component>(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.storage::<T>()
            .into_iter()
            .flat_map(|storage| storage.entries.iter().map(|(entity, c)| (*entity, c)))
    }

    /// Stores a scene-wide singleton, replacing any previous value of that type.
    pub fn set_context<T: Any>(&mut self, value: T) {
        self.context.insert(TypeId::of::<T>(), Box::new(value));
    }

    pub fn context<T: Any>(&self) -> Option<&T> {
        self.context
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref::<T>())
    }

    pub fn context_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.context
            .get_mut(&TypeId::of::<T>())
            .and_then(|value| value.downcast_mut::<T>())
    }

    fn storage<T: Component>(&self) -> Option<&Storage<T>> {
        self.storages
            .get(&TypeId::of::<T>())
            .and_then(|storage| storage.as_any().downcast_ref::<Storage<T>>())
    }

    fn storage_mut<T: Component>(&mut self) -> &mut Storage<T> {
        self.storages
            .entry(TypeId::of::<T>())
            .or_insert_with(|| {
                Box::new(Storage::<T> {
                    entries: BTreeMap::new(),
                })
            })
            .as_any_mut()
            .downcast_mut::<Storage<T>>()
            .unwrap_or_else(|| unreachable!("storage registered under a foreign TypeId"))
    }
}
