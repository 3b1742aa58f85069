//! # World: the archetype graph
//!
//! The `World` owns every archetype table and coordinates entity movement
//! between them, keeping one authoritative index from entity ID to
//! `(archetype, row)`.
//!
//! ## Structural mutation model
//!
//! Adding or removing a component moves the entity between archetypes:
//! the source row is **extracted** (ownership of its cells transfers to a
//! transit bundle), the bundle is adjusted, and the row is appended to the
//! destination table. The `(source archetype, component type)` pair is
//! cached as a graph edge in **both** directions on first use, so repeat
//! transitions over the same pair resolve the destination with a single
//! map lookup.
//!
//! ## Invariants
//! - Every alive entity appears in exactly one archetype; entities created
//!   without components live in the empty archetype.
//! - `entity_index[e] == (a, r)` iff `archetypes[a].entities[r] == e`.
//!   The per-archetype `entity_to_row` map is a denormalisation of this
//!   index and both are patched together after every swap-remove.
//!
//! ## Error policy
//! Entity-level operations report expected failures (stale handle,
//! duplicate component, unregistered type) as `false`/`None`. Only
//! registration and spawn-with-components return `Result`, since those
//! failures indicate misconfiguration the caller must handle.

use fnv::FnvHashMap;
use log::{debug, trace};

use crate::engine::archetype::{Archetype, RowMove};
use crate::engine::component::{ComponentData, TypeRegistry};
use crate::engine::entity::EntityManager;
use crate::engine::error::{EcsError, EcsResult};
use crate::engine::query::{collect_rows, QueryFilter, QueryResult};
use crate::engine::storage::Bundle;
use crate::engine::types::{archetype_id_for, ArchetypeID, ComponentTypeID, EntityHandle, EntityID};


/// In-memory entity store indexed by archetype.
#[derive(Default)]
pub struct World {
    entities: EntityManager,
    registry: TypeRegistry,
    archetypes: FnvHashMap<ArchetypeID, Archetype>,
    entity_index: FnvHashMap<EntityID, (ArchetypeID, usize)>,
}

impl World {
    /// Creates an empty world.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers component type `T`, returning its runtime ID.
    ///
    /// Idempotent; delegates to the world-owned type registry.
    pub fn register<T: 'static + Send + Sync>(&mut self) -> EcsResult<ComponentTypeID> {
        Ok(self.registry.register::<T>()?)
    }

    /// Returns the world's type registry.
    #[inline]
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Bundles a value with its registered type ID for
    /// [`create_with_components`](Self::create_with_components).
    ///
    /// Fails if `T` was never registered.
    pub fn component<T: 'static + Send + Sync>(&self, value: T) -> EcsResult<ComponentData> {
        let type_id = self.registry.get::<T>()?;
        let info = self
            .registry
            .info(type_id)
            .copied()
            .ok_or_else(|| EcsError::Internal(format!("missing descriptor for type {type_id}")))?;
        Ok(ComponentData::new(info, value))
    }

    /// Looks up an archetype table by ID.
    #[inline]
    pub fn archetype(&self, id: ArchetypeID) -> Option<&Archetype> {
        self.archetypes.get(&id)
    }

    /// Iterates over all archetype tables.
    pub fn archetypes(&self) -> impl Iterator<Item = &Archetype> {
        self.archetypes.values()
    }

    /// Returns the number of archetype tables (including empty ones;
    /// tables are never garbage-collected).
    #[inline]
    pub fn archetype_count(&self) -> usize {
        self.archetypes.len()
    }

    /// Returns the number of live entities.
    #[inline]
    pub fn entity_count(&self) -> usize {
        self.entities.alive_count()
    }

    /// Returns `true` if the handle refers to a live entity.
    #[inline]
    pub fn is_alive(&self, handle: EntityHandle) -> bool {
        self.entities.is_alive(handle)
    }

    /// Returns the current valid handle for a bare entity ID.
    #[inline]
    pub(crate) fn handle_for(&self, id: EntityID) -> Option<EntityHandle> {
        self.entities.handle_for(id)
    }

    /// Finds or creates the archetype for a sorted type set.
    fn ensure_archetype(&mut self, sorted_types: &[ComponentTypeID]) -> EcsResult<ArchetypeID> {
        let id = archetype_id_for(sorted_types);
        if self.archetypes.contains_key(&id) {
            return Ok(id);
        }

        let mut infos = Vec::with_capacity(sorted_types.len());
        for &type_id in sorted_types {
            let info = self
                .registry
                .info(type_id)
                .copied()
                .ok_or_else(|| EcsError::Internal(format!("missing descriptor for type {type_id}")))?;
            infos.push(info);
        }

        debug!("creating archetype {id:#018x} for types {sorted_types:?}");
        self.archetypes.insert(id, Archetype::new(infos));
        Ok(id)
    }

    /// Creates a component-less entity in the empty archetype.
    pub fn create(&mut self) -> EntityHandle {
        let handle = self.entities.create();

        // The empty set has no descriptors to resolve, so this cannot fail.
        let archetype_id = self
            .ensure_archetype(&[])
            .expect("empty archetype creation is infallible");

        let archetype = self
            .archetypes
            .get_mut(&archetype_id)
            .expect("empty archetype was just ensured");
        let _ = archetype.add(handle.id(), Bundle::new());

        let row = archetype.row_of(handle.id()).unwrap_or(0);
        self.entity_index.insert(handle.id(), (archetype_id, row));
        handle
    }

    /// Creates an entity with an initial component set in one step.
    ///
    /// ## Errors
    /// Fails if any component type is unregistered or appears twice.

    pub fn create_with_components(
        &mut self,
        components: Vec<ComponentData>,
    ) -> EcsResult<EntityHandle> {
        let mut sorted_types: Vec<ComponentTypeID> =
            components.iter().map(|c| c.type_id()).collect();
        sorted_types.sort_unstable();
        if sorted_types.windows(2).any(|w| w[0] == w[1]) {
            return Err(EcsError::Internal(
                "duplicate component type in spawn bundle".into(),
            ));
        }

        let archetype_id = self.ensure_archetype(&sorted_types)?;
        let handle = self.entities.create();

        let mut bundle = Bundle::new();
        for component in components {
            bundle.insert_cell(component.cell);
        }

        let archetype = self
            .archetypes
            .get_mut(&archetype_id)
            .ok_or_else(|| EcsError::Internal("archetype vanished during spawn".into()))?;

        if let Err(error) = archetype.add(handle.id(), bundle) {
            self.entities.destroy(handle);
            return Err(error.into());
        }

        let row = archetype.row_of(handle.id()).unwrap_or(0);
        self.entity_index.insert(handle.id(), (archetype_id, row));
        Ok(handle)
    }

    fn patch_moved(&mut self, archetype_id: ArchetypeID, row_move: RowMove) {
        if let Some(moved) = row_move.moved {
            self.entity_index.insert(moved, (archetype_id, row_move.row));
        }
    }

    /// Adds component `T` to a live entity, moving it to the neighbouring
    /// archetype.
    ///
    /// Returns `false` (with no side effects) if the handle is stale, the
    /// type is unregistered, or the entity already has `T`.

    pub fn add<T: 'static + Send + Sync>(&mut self, handle: EntityHandle, value: T) -> bool {
        if !self.entities.is_alive(handle) {
            return false;
        }
        let Some(type_id) = self.registry.id_of::<T>() else {
            return false;
        };
        let info = match self.registry.info(type_id) {
            Some(info) => *info,
            None => return false,
        };
        let Some(&(source_id, _)) = self.entity_index.get(&handle.id()) else {
            return false;
        };

        let Some(source) = self.archetypes.get(&source_id) else {
            return false;
        };
        if source.has_component_type(type_id) {
            return false;
        }

        let target_id = match source.get_add_edge(type_id) {
            Some(target) => target,
            None => {
                let mut types = source.component_types().to_vec();
                types.push(type_id);
                types.sort_unstable();

                let Ok(target) = self.ensure_archetype(&types) else {
                    return false;
                };

                // Cache the transition in both directions.
                if let Some(source) = self.archetypes.get_mut(&source_id) {
                    source.set_add_edge(type_id, target);
                }
                if let Some(target_archetype) = self.archetypes.get_mut(&target) {
                    target_archetype.set_remove_edge(type_id, source_id);
                }
                target
            }
        };

        let Some((mut bundle, row_move)) = self
            .archetypes
            .get_mut(&source_id)
            .and_then(|a| a.extract_row(handle.id()))
        else {
            return false;
        };
        self.patch_moved(source_id, row_move);
        bundle.insert(info, value);

        let Some(target) = self.archetypes.get_mut(&target_id) else {
            return false;
        };
        if target.add(handle.id(), bundle).is_err() {
            return false;
        }

        let row = target.row_of(handle.id()).unwrap_or(0);
        self.entity_index.insert(handle.id(), (target_id, row));
        true
    }

    /// Removes component `T` from a live entity, destroying the value and
    /// moving the entity to the neighbouring archetype.
    ///
    /// Returns `false` if the handle is stale, the type is unregistered,
    /// or the entity does not have `T`. Removing the last component moves
    /// the entity to the empty archetype; it stays alive.

    pub fn remove<T: 'static + Send + Sync>(&mut self, handle: EntityHandle) -> bool {
        if !self.entities.is_alive(handle) {
            return false;
        }
        let Some(type_id) = self.registry.id_of::<T>() else {
            return false;
        };
        let Some(&(source_id, _)) = self.entity_index.get(&handle.id()) else {
            return false;
        };

        let Some(source) = self.archetypes.get(&source_id) else {
            return false;
        };
        if !source.has_component_type(type_id) {
            return false;
        }

        let target_id = match source.get_remove_edge(type_id) {
            Some(target) => target,
            None => {
                let types: Vec<ComponentTypeID> = source
                    .component_types()
                    .iter()
                    .copied()
                    .filter(|&t| t != type_id)
                    .collect();

                let Ok(target) = self.ensure_archetype(&types) else {
                    return false;
                };

                if let Some(source) = self.archetypes.get_mut(&source_id) {
                    source.set_remove_edge(type_id, target);
                }
                if let Some(target_archetype) = self.archetypes.get_mut(&target) {
                    target_archetype.set_add_edge(type_id, source_id);
                }
                target
            }
        };

        let Some((mut bundle, row_move)) = self
            .archetypes
            .get_mut(&source_id)
            .and_then(|a| a.extract_row(handle.id()))
        else {
            return false;
        };
        self.patch_moved(source_id, row_move);

        // Dropping the extracted cell runs the component's destructor.
        drop(bundle.take(type_id));

        let Some(target) = self.archetypes.get_mut(&target_id) else {
            return false;
        };
        if target.add(handle.id(), bundle).is_err() {
            return false;
        }

        let row = target.row_of(handle.id()).unwrap_or(0);
        self.entity_index.insert(handle.id(), (target_id, row));
        true
    }

    /// Returns a reference to a live entity's component `T`.
    pub fn get<T: 'static>(&self, handle: EntityHandle) -> Option<&T> {
        if !self.entities.is_alive(handle) {
            return None;
        }
        let type_id = self.registry.id_of::<T>()?;
        let &(archetype_id, _) = self.entity_index.get(&handle.id())?;
        self.archetypes.get(&archetype_id)?.get(handle.id(), type_id)
    }

    /// Returns a mutable reference to a live entity's component `T`.
    pub fn get_mut<T: 'static>(&mut self, handle: EntityHandle) -> Option<&mut T> {
        if !self.entities.is_alive(handle) {
            return None;
        }
        let type_id = self.registry.id_of::<T>()?;
        let &(archetype_id, _) = self.entity_index.get(&handle.id())?;
        self.archetypes
            .get_mut(&archetype_id)?
            .get_mut(handle.id(), type_id)
    }

    /// Returns `true` if the entity is alive and has component `T`.
    pub fn has<T: 'static>(&self, handle: EntityHandle) -> bool {
        if !self.entities.is_alive(handle) {
            return false;
        }
        let Some(type_id) = self.registry.id_of::<T>() else {
            return false;
        };
        let Some(&(archetype_id, _)) = self.entity_index.get(&handle.id()) else {
            return false;
        };
        self.archetypes
            .get(&archetype_id)
            .is_some_and(|a| a.has_component_type(type_id))
    }

    /// Destroys a live entity: its row is removed, its component values
    /// are dropped, and the handle's generation is invalidated.

    pub fn despawn(&mut self, handle: EntityHandle) -> bool {
        if !self.entities.is_alive(handle) {
            return false;
        }
        let Some((archetype_id, _)) = self.entity_index.remove(&handle.id()) else {
            return false;
        };

        if let Some(row_move) = self
            .archetypes
            .get_mut(&archetype_id)
            .and_then(|a| a.remove_row(handle.id()))
        {
            self.patch_moved(archetype_id, row_move);
        }

        trace!("despawned entity {handle}");
        self.entities.destroy(handle)
    }

    /// One-shot scan: every row whose archetype stores all `required`
    /// types.
    ///
    /// Result pointers are valid only until the next structural mutation.

    pub fn query(&self, required: &[ComponentTypeID]) -> Vec<QueryResult> {
        self.query_filtered(required, &[])
    }

    /// One-shot scan with `with`/`without` filters applied per archetype.
    pub fn query_filtered(
        &self,
        required: &[ComponentTypeID],
        filters: &[QueryFilter],
    ) -> Vec<QueryResult> {
        let mut results = Vec::new();
        for archetype in self.archetypes.values() {
            if archetype.matches(required) && QueryFilter::all_match(filters, archetype) {
                collect_rows(self, archetype, required, &mut results);
            }
        }
        results
    }

    /// Drops every archetype and entity and resets the index.
    ///
    /// Registered component types are retained; the registry is
    /// append-only.

    pub fn clear(&mut self) {
        debug!(
            "clearing world: {} entities, {} archetypes",
            self.entity_count(),
            self.archetype_count()
        );
        self.archetypes.clear();
        self.entity_index.clear();
        self.entities.invalidate_all();
    }

    /// Returns the `(archetype, row)` location of a live entity.
    pub fn location_of(&self, handle: EntityHandle) -> Option<(ArchetypeID, usize)> {
        if !self.entities.is_alive(handle) {
            return None;
        }
        self.entity_index.get(&handle.id()).copied()
    }
}
