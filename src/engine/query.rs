//! Query construction and execution over archetype storage.
//!
//! Two query forms are provided:
//!
//! * **Immediate** — `World::query` / `World::query_filtered` scan every
//!   archetype on each call.
//! * **Cached** — [`QuerySystem`] remembers which archetypes matched and a
//!   per-archetype version snapshot, rebuilding only when the snapshot
//!   goes stale. This is the form systems hold across frames.
//!
//! ## Staleness model
//!
//! A cached query is stale when any of the following holds:
//! 1. its dirty flag was set explicitly,
//! 2. the world's archetype count differs from the count seen at the last
//!    rebuild (a new archetype may match),
//! 3. a cached archetype is gone or its structural version moved past the
//!    snapshot.
//!
//! Archetype versions advance on every structural mutation, so clause 3
//! catches row insertion/removal and entity migration without any
//! per-entity bookkeeping.
//!
//! ## Pointer validity
//!
//! Results carry raw per-component cell pointers. A pointer is valid only
//! until the **next structural mutation** of the archetype it came from;
//! holding results across a spawn, despawn, or component add/remove is a
//! use-after-free. Typed access is therefore `unsafe`, casting locally
//! with the caller's knowledge of which Rust type a `ComponentTypeID`
//! denotes.

use std::ptr::NonNull;

use fnv::FnvHashMap;

use crate::engine::archetype::Archetype;
use crate::engine::types::{ArchetypeID, ArchetypeVersion, ComponentTypeID, EntityHandle};
use crate::engine::world::World;


/// Filter operators applied per archetype during matching.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterOp {
    /// The archetype must contain the component type.
    With,
    /// The archetype must not contain the component type.
    Without,
    /// Reserved for change detection. Currently a stub that matches every
    /// archetype; it narrows nothing but must not break matching.
    Changed,
}

/// A single `(component type, operator)` filter clause.
#[derive(Clone, Copy, Debug)]
pub struct QueryFilter {
    /// Component type the operator applies to.
    pub component_type: ComponentTypeID,
    /// Matching operator.
    pub op: FilterOp,
}

impl QueryFilter {
    /// Requires the archetype to contain `component_type`.
    pub fn with(component_type: ComponentTypeID) -> Self {
        Self { component_type, op: FilterOp::With }
    }

    /// Excludes archetypes containing `component_type`.
    pub fn without(component_type: ComponentTypeID) -> Self {
        Self { component_type, op: FilterOp::Without }
    }

    /// Reserved change-detection clause (currently matches everything).
    pub fn changed(component_type: ComponentTypeID) -> Self {
        Self { component_type, op: FilterOp::Changed }
    }

    /// Evaluates this clause against an archetype.
    #[inline]
    pub fn matches(&self, archetype: &Archetype) -> bool {
        match self.op {
            FilterOp::With => archetype.has_component_type(self.component_type),
            FilterOp::Without => !archetype.has_component_type(self.component_type),
            FilterOp::Changed => true,
        }
    }

    /// Evaluates every clause against an archetype.
    #[inline]
    pub fn all_match(filters: &[QueryFilter], archetype: &Archetype) -> bool {
        filters.iter().all(|filter| filter.matches(archetype))
    }
}

/// One matched row: the entity's handle plus a cell pointer for each
/// requested component type.
///
/// Only the requested types appear; lookup is positional over the small
/// per-query type list.

pub struct QueryResult {
    entity: EntityHandle,
    columns: Vec<(ComponentTypeID, NonNull<u8>)>,
}

impl QueryResult {
    /// Returns the matched entity's handle.
    #[inline]
    pub fn entity(&self) -> EntityHandle {
        self.entity
    }

    /// Returns the raw cell pointer for a requested component type.
    #[inline]
    pub fn component_ptr(&self, type_id: ComponentTypeID) -> Option<NonNull<u8>> {
        self.columns
            .iter()
            .find(|(id, _)| *id == type_id)
            .map(|(_, ptr)| *ptr)
    }

    /// Casts the cell for `type_id` to a shared reference.
    ///
    /// ## Safety
    /// * `T` must be the Rust type registered under `type_id`.
    /// * No structural mutation of the source archetype may have happened
    ///   since this result was produced.
    /// * The caller must not hold a mutable reference to the same cell.

    #[inline]
    pub unsafe fn get<T: 'static>(&self, type_id: ComponentTypeID) -> Option<&T> {
        self.component_ptr(type_id)
            .map(|ptr| unsafe { &*ptr.as_ptr().cast::<T>() })
    }

    /// Casts the cell for `type_id` to a mutable reference.
    ///
    /// ## Safety
    /// As [`get`](Self::get), and additionally no other reference to the
    /// same cell may exist for the returned borrow's lifetime.

    #[inline]
    pub unsafe fn get_mut<T: 'static>(&self, type_id: ComponentTypeID) -> Option<&mut T> {
        self.component_ptr(type_id)
            .map(|ptr| unsafe { &mut *ptr.as_ptr().cast::<T>() })
    }
}

/// Emits one [`QueryResult`] per row of `archetype`.
///
/// Rows whose entity can no longer be resolved to a live handle are
/// skipped defensively.

pub(crate) fn collect_rows(
    world: &World,
    archetype: &Archetype,
    required: &[ComponentTypeID],
    out: &mut Vec<QueryResult>,
) {
    for (row, &entity_id) in archetype.entities().iter().enumerate() {
        let Some(entity) = world.handle_for(entity_id) else {
            continue;
        };

        let mut columns = Vec::with_capacity(required.len());
        let mut complete = true;
        for &type_id in required {
            match archetype
                .component_column(type_id)
                .and_then(|column| column.get_ptr(row))
            {
                Some(ptr) => columns.push((type_id, ptr)),
                None => {
                    complete = false;
                    break;
                }
            }
        }

        if complete {
            out.push(QueryResult { entity, columns });
        }
    }
}

/// A contiguous slice of a cached query's most recent result buffer.
///
/// Chunks are independent read-only views used to seed chunked iteration;
/// `start..end` are indices into the full buffer. Mutating component data
/// goes through the per-row cell pointers, never through the chunk
/// structure itself.

pub struct QueryChunk<'a> {
    results: &'a [QueryResult],
    /// Index of the first row of this chunk in the full result buffer.
    pub start: usize,
    /// One past the index of the last row of this chunk.
    pub end: usize,
}

impl<'a> QueryChunk<'a> {
    /// Returns the rows of this chunk.
    #[inline]
    pub fn results(&self) -> &'a [QueryResult] {
        self.results
    }

    /// Returns the number of rows in this chunk.
    #[inline]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Returns `true` if the chunk holds no rows.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// A stateful query with a version-snapshot archetype cache.
///
/// Construct once (typically inside a system), then call
/// [`query`](Self::query) each frame; the archetype match list is only
/// recomputed when the staleness predicate fires.

pub struct QuerySystem {
    component_types: Vec<ComponentTypeID>,
    filters: Vec<QueryFilter>,
    cached_archetypes: Vec<ArchetypeID>,
    archetype_versions: FnvHashMap<ArchetypeID, ArchetypeVersion>,
    known_archetype_count: usize,
    cache_dirty: bool,
    query_buffer: Vec<QueryResult>,
}

impl QuerySystem {
    /// Creates a cached query over the given required component types.
    pub fn new(component_types: Vec<ComponentTypeID>) -> Self {
        Self::with_filters(component_types, Vec::new())
    }

    /// Creates a cached query with additional filter clauses.
    pub fn with_filters(component_types: Vec<ComponentTypeID>, filters: Vec<QueryFilter>) -> Self {
        Self {
            component_types,
            filters,
            cached_archetypes: Vec::new(),
            archetype_versions: FnvHashMap::default(),
            known_archetype_count: 0,
            cache_dirty: true,
            query_buffer: Vec::new(),
        }
    }

    /// Returns the required component types, in request order.
    #[inline]
    pub fn component_types(&self) -> &[ComponentTypeID] {
        &self.component_types
    }

    /// Forces a cache rebuild on the next use.
    #[inline]
    pub fn mark_dirty(&mut self) {
        self.cache_dirty = true;
    }

    fn is_stale(&self, world: &World) -> bool {
        if self.cache_dirty {
            return true;
        }
        if world.archetype_count() != self.known_archetype_count {
            return true;
        }
        self.cached_archetypes.iter().any(|&id| {
            match world.archetype(id) {
                Some(archetype) => {
                    self.archetype_versions.get(&id).copied() != Some(archetype.version())
                }
                None => true,
            }
        })
    }

    fn rebuild(&mut self, world: &World) {
        self.cached_archetypes.clear();
        self.archetype_versions.clear();

        for archetype in world.archetypes() {
            if archetype.matches(&self.component_types)
                && QueryFilter::all_match(&self.filters, archetype)
            {
                self.cached_archetypes.push(archetype.id());
                self.archetype_versions.insert(archetype.id(), archetype.version());
            }
        }

        self.known_archetype_count = world.archetype_count();
        self.cache_dirty = false;
    }

    /// Refreshes the cache if stale and refills the result buffer.
    fn run(&mut self, world: &World) {
        if self.is_stale(world) {
            self.rebuild(world);
        }

        self.query_buffer.clear();
        for &id in &self.cached_archetypes {
            if let Some(archetype) = world.archetype(id) {
                collect_rows(world, archetype, &self.component_types, &mut self.query_buffer);
            }
        }
    }

    /// Runs the query, returning one result per matching row.
    ///
    /// Row order is stable between calls only while no structural change
    /// happens in between. Pointer validity rules are described at the
    /// module level.

    pub fn query(&mut self, world: &World) -> &[QueryResult] {
        self.run(world);
        &self.query_buffer
    }

    /// Returns the number of matching rows without emitting results.
    pub fn count(&mut self, world: &World) -> usize {
        if self.is_stale(world) {
            self.rebuild(world);
        }

        self.cached_archetypes
            .iter()
            .filter_map(|id| world.archetype(*id))
            .map(|archetype| archetype.size())
            .sum()
    }

    /// Runs the query and splits the result buffer into `⌈n / chunk_size⌉`
    /// contiguous chunks.
    ///
    /// The final chunk holds the remainder. `chunk_size` must be nonzero.

    pub fn query_chunked(&mut self, world: &World, chunk_size: usize) -> Vec<QueryChunk<'_>> {
        assert!(chunk_size > 0, "chunk_size must be nonzero");
        self.run(world);

        let total = self.query_buffer.len();
        let mut chunks = Vec::with_capacity(total.div_ceil(chunk_size));
        let mut start = 0;
        while start < total {
            let end = (start + chunk_size).min(total);
            chunks.push(QueryChunk {
                results: &self.query_buffer[start..end],
                start,
                end,
            });
            start = end;
        }
        chunks
    }
}
