//! # Archetype Tables
//!
//! An archetype stores every entity that currently has exactly the same
//! set of component types, one column per type, rows packed densely.
//!
//! ## Design
//! - Component data is columnar: `columns[type]` holds the value of that
//!   component for every row, in row order.
//! - Rows are removed with swap-remove, so removal is O(1) amortised and
//!   observers must not assume row stability across mutations.
//! - Each archetype caches **transition edges**: for a component type `T`,
//!   the archetype reached by adding or removing exactly `T`. The world
//!   populates an edge the first time a transition happens; every later
//!   transition over the same pair is a single map lookup.
//! - A monotonic `version` counter advances on every structural mutation
//!   (add, remove, extract, clear). It is the sole staleness signal
//!   consumed by cached queries.
//!
//! ## Invariants
//! - `entities.len() == entity_to_row.len() == column.len()` for every
//!   column.
//! - `entity_to_row[entities[r]] == r` for every row `r`.
//! - `id == archetype_id_for(component_types)` with `component_types`
//!   sorted ascending.

use fnv::FnvHashMap;
use std::ptr::NonNull;

use crate::engine::component::ComponentInfo;
use crate::engine::error::ArchetypeError;
use crate::engine::storage::{Bundle, Column};
use crate::engine::types::{
    archetype_id_for, ArchetypeID, ArchetypeVersion, ComponentTypeID, EntityID,
};


/// Cached transitions to neighbouring archetypes.
///
/// `add[T]` is the archetype whose type set is this one's plus `T`;
/// `remove[T]` is this one's minus `T`. Both maps are populated lazily by
/// the world, in both directions at once, so the second structural
/// mutation over the same `(archetype, type)` pair never recomputes the
/// target set.

#[derive(Default)]
pub struct ArchetypeEdges {
    add: FnvHashMap<ComponentTypeID, ArchetypeID>,
    remove: FnvHashMap<ComponentTypeID, ArchetypeID>,
}

/// Reports how a swap-remove reshaped the table.
///
/// When the removed row was not last, the previous tail entity now lives
/// at `row` and the world must repoint its entity index entry.

#[derive(Clone, Copy, Debug)]
pub(crate) struct RowMove {
    /// Row vacated by the removed entity (and refilled by `moved`).
    pub row: usize,
    /// Entity relocated into `row`, if the removed row was not the tail.
    pub moved: Option<EntityID>,
}

/// Columnar table of all entities sharing one component type set.
pub struct Archetype {
    id: ArchetypeID,
    component_types: Vec<ComponentTypeID>,
    entities: Vec<EntityID>,
    columns: FnvHashMap<ComponentTypeID, Column>,
    entity_to_row: FnvHashMap<EntityID, usize>,
    edges: ArchetypeEdges,
    version: ArchetypeVersion,
}

impl Archetype {
    /// Creates an empty archetype for the given component descriptors.
    ///
    /// ## Invariants
    /// `component_infos` must be sorted ascending by type ID and free of
    /// duplicates; the archetype's identity is derived from that order.

    pub fn new(component_infos: Vec<ComponentInfo>) -> Self {
        debug_assert!(
            component_infos.windows(2).all(|w| w[0].type_id < w[1].type_id),
            "archetype component descriptors must be sorted and unique"
        );

        let component_types: Vec<ComponentTypeID> =
            component_infos.iter().map(|info| info.type_id).collect();
        let id = archetype_id_for(&component_types);

        let mut columns = FnvHashMap::default();
        for info in component_infos {
            columns.insert(info.type_id, Column::new(info));
        }

        Self {
            id,
            component_types,
            entities: Vec::new(),
            columns,
            entity_to_row: FnvHashMap::default(),
            edges: ArchetypeEdges::default(),
            version: 0,
        }
    }

    /// Returns the archetype identifier (FNV-1a of the sorted type set).
    #[inline]
    pub fn id(&self) -> ArchetypeID {
        self.id
    }

    /// Returns the sorted component type set stored by this archetype.
    #[inline]
    pub fn component_types(&self) -> &[ComponentTypeID] {
        &self.component_types
    }

    /// Returns the structural version counter.
    #[inline]
    pub fn version(&self) -> ArchetypeVersion {
        self.version
    }

    /// Returns the number of rows (entities) in the table.
    #[inline]
    pub fn size(&self) -> usize {
        self.entities.len()
    }

    /// Returns `true` if the table holds no rows.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Returns the dense entity row order.
    #[inline]
    pub fn entities(&self) -> &[EntityID] {
        &self.entities
    }

    /// Returns `true` if this archetype stores the given component type.
    #[inline]
    pub fn has_component_type(&self, type_id: ComponentTypeID) -> bool {
        self.component_types.binary_search(&type_id).is_ok()
    }

    /// Returns `true` if every type in `required` is stored here.
    #[inline]
    pub fn matches(&self, required: &[ComponentTypeID]) -> bool {
        required.iter().all(|&type_id| self.has_component_type(type_id))
    }

    /// Returns the row index of `entity`, if present.
    #[inline]
    pub fn row_of(&self, entity: EntityID) -> Option<usize> {
        self.entity_to_row.get(&entity).copied()
    }

    /// Appends a row for `entity`, consuming one value per stored type.
    ///
    /// ## Behavior
    /// Validation happens before any column is touched, so a failed call
    /// leaves the table unchanged (the bundle's cells are destroyed by its
    /// drop).
    ///
    /// ## Errors
    /// - `AlreadyPresent` if the entity occupies a row here.
    /// - `MissingComponent` if the bundle lacks a stored type.
    /// - `UnexpectedComponent` if the bundle carries a type with no column.

    pub fn add(&mut self, entity: EntityID, mut bundle: Bundle) -> Result<(), ArchetypeError> {
        if self.entity_to_row.contains_key(&entity) {
            return Err(ArchetypeError::AlreadyPresent { entity });
        }

        let mut cells = Vec::with_capacity(self.component_types.len());
        for &type_id in &self.component_types {
            match bundle.take(type_id) {
                Some(cell) => cells.push((type_id, cell)),
                None => return Err(ArchetypeError::MissingComponent { type_id }),
            }
        }

        if let Some(type_id) = bundle.type_ids().next() {
            return Err(ArchetypeError::UnexpectedComponent { type_id });
        }

        let row = self.entities.len();
        self.entities.push(entity);
        self.entity_to_row.insert(entity, row);

        for (type_id, cell) in cells {
            // Column presence is guaranteed: one column per stored type.
            if let Some(column) = self.columns.get_mut(&type_id) {
                column.push_cell(cell);
            }
        }

        self.version += 1;
        Ok(())
    }

    pub(crate) fn remove_row(&mut self, entity: EntityID) -> Option<RowMove> {
        let row = self.entity_to_row.remove(&entity)?;

        for column in self.columns.values_mut() {
            column.swap_remove_drop(row);
        }

        self.entities.swap_remove(row);
        let moved = if row < self.entities.len() {
            let moved_entity = self.entities[row];
            self.entity_to_row.insert(moved_entity, row);
            Some(moved_entity)
        } else {
            None
        };

        self.version += 1;
        Some(RowMove { row, moved })
    }

    pub(crate) fn extract_row(&mut self, entity: EntityID) -> Option<(Bundle, RowMove)> {
        let row = self.entity_to_row.remove(&entity)?;

        let mut bundle = Bundle::new();
        for column in self.columns.values_mut() {
            bundle.insert_cell(column.swap_remove_extract(row));
        }

        self.entities.swap_remove(row);
        let moved = if row < self.entities.len() {
            let moved_entity = self.entities[row];
            self.entity_to_row.insert(moved_entity, row);
            Some(moved_entity)
        } else {
            None
        };

        self.version += 1;
        Some((bundle, RowMove { row, moved }))
    }

    /// Removes `entity`'s row, destroying its component values.
    ///
    /// Returns `false` if the entity has no row here.

    pub fn remove(&mut self, entity: EntityID) -> bool {
        self.remove_row(entity).is_some()
    }

    /// Removes `entity`'s row, transferring ownership of its component
    /// values to the caller.
    ///
    /// Used during cross-archetype moves; nothing is destroyed.

    pub fn extract(&mut self, entity: EntityID) -> Option<Bundle> {
        self.extract_row(entity).map(|(bundle, _)| bundle)
    }

    /// Destroys every row and component value.
    pub fn clear(&mut self) {
        for column in self.columns.values_mut() {
            column.clear();
        }
        self.entities.clear();
        self.entity_to_row.clear();
        self.version += 1;
    }

    /// Returns a raw pointer to `entity`'s cell for `type_id`.
    ///
    /// The pointer is valid only until the next structural mutation of
    /// this archetype.

    pub fn get_component(&self, entity: EntityID, type_id: ComponentTypeID) -> Option<NonNull<u8>> {
        let row = self.row_of(entity)?;
        self.columns.get(&type_id)?.get_ptr(row)
    }

    /// Returns a typed reference to `entity`'s value of component `T`.
    pub fn get<T: 'static>(&self, entity: EntityID, type_id: ComponentTypeID) -> Option<&T> {
        let row = self.row_of(entity)?;
        self.columns.get(&type_id)?.get(row)
    }

    /// Returns a typed mutable reference to `entity`'s value of `T`.
    pub fn get_mut<T: 'static>(
        &mut self,
        entity: EntityID,
        type_id: ComponentTypeID,
    ) -> Option<&mut T> {
        let row = self.row_of(entity)?;
        self.columns.get_mut(&type_id)?.get_mut(row)
    }

    /// Returns the full column for a component type, if stored here.
    #[inline]
    pub fn component_column(&self, type_id: ComponentTypeID) -> Option<&Column> {
        self.columns.get(&type_id)
    }

    /// Caches the archetype reached by adding `type_id`.
    #[inline]
    pub fn set_add_edge(&mut self, type_id: ComponentTypeID, target: ArchetypeID) {
        self.edges.add.insert(type_id, target);
    }

    /// Caches the archetype reached by removing `type_id`.
    #[inline]
    pub fn set_remove_edge(&mut self, type_id: ComponentTypeID, target: ArchetypeID) {
        self.edges.remove.insert(type_id, target);
    }

    /// Returns the cached add transition for `type_id`, if known.
    #[inline]
    pub fn get_add_edge(&self, type_id: ComponentTypeID) -> Option<ArchetypeID> {
        self.edges.add.get(&type_id).copied()
    }

    /// Returns the cached remove transition for `type_id`, if known.
    #[inline]
    pub fn get_remove_edge(&self, type_id: ComponentTypeID) -> Option<ArchetypeID> {
        self.edges.remove.get(&type_id).copied()
    }
}
