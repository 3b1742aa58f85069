//! # Entity Management
//!
//! This module defines entity identity and lifecycle tracking for the ECS.
//!
//! ## Purpose
//! Entities are lightweight, opaque identifiers that reference rows in
//! archetype storage. This module is responsible for:
//!
//! - Allocating stable entity identifiers
//! - Tracking entity liveness via generation counters
//! - Recycling identifiers safely after despawn
//!
//! ## Entity model
//! An [`EntityHandle`] packs a 32-bit **ID** and a 32-bit **generation**.
//! The manager keeps one generation counter per ID; a handle is alive iff
//! its generation matches the stored counter. Despawning increments the
//! counter, which invalidates every outstanding handle for that ID before
//! the ID is returned to the free list.
//!
//! ## Invariants
//! - An ID is reused only after its previous owner was destroyed, and
//!   reuse always pairs the ID with the incremented generation.
//! - `alive_count` equals the number of IDs whose current generation has
//!   an outstanding valid handle.
//! - Generation wrap-around after 2³² destroys of a single ID is an
//!   accepted far-future risk; the counter wraps rather than panicking.

use crate::engine::types::{EntityGeneration, EntityHandle, EntityID};


/// Allocates and validates generational entity handles.
///
/// ## Design
/// - IDs are allocated from a LIFO free list, falling back to a monotonic
///   counter when the list is empty.
/// - Generations start at zero for fresh IDs and are bumped on destroy.
/// - Storage is dense and indexed directly by ID.
///
/// ## Invariants
/// - `generations.len()` equals the number of IDs ever allocated.
/// - Every ID on the free list is dead (its generation has no valid
///   outstanding handle).

#[derive(Default)]
pub struct EntityManager {
    generations: Vec<EntityGeneration>,
    free_entities: Vec<EntityID>,
    next_id: EntityID,
    alive_count: usize,
}

impl EntityManager {
    /// Creates an empty entity manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a new entity and returns its handle.
    ///
    /// ## Behavior
    /// - Reuses the most recently freed ID if one is available, pairing it
    ///   with its current (already incremented) generation.
    /// - Otherwise allocates the next monotonic ID at generation zero.

    pub fn create(&mut self) -> EntityHandle {
        let id = match self.free_entities.pop() {
            Some(id) => id,
            None => {
                let id = self.next_id;
                self.next_id += 1;
                self.generations.push(0);
                id
            }
        };

        self.alive_count += 1;
        EntityHandle::pack(id, self.generations[id as usize])
    }

    /// Destroys an entity and invalidates its handle.
    ///
    /// ## Behavior
    /// - Rejects handles that are stale or out of range.
    /// - Increments the ID's generation and returns the ID to the free
    ///   list for reuse.
    ///
    /// ## Returns
    /// `true` if the entity was alive and is now destroyed.

    pub fn destroy(&mut self, handle: EntityHandle) -> bool {
        if !self.is_alive(handle) {
            return false;
        }

        let id = handle.id();
        self.generations[id as usize] = self.generations[id as usize].wrapping_add(1);
        self.free_entities.push(id);
        self.alive_count -= 1;
        true
    }

    /// Returns `true` if the handle refers to a live entity.
    ///
    /// This check is pure; it never mutates manager state.
    #[inline]
    pub fn is_alive(&self, handle: EntityHandle) -> bool {
        let (id, generation) = handle.split();
        (id as usize) < self.generations.len() && self.generations[id as usize] == generation
    }

    /// Returns the number of currently live entities.
    #[inline]
    pub fn alive_count(&self) -> usize {
        self.alive_count
    }

    /// Returns the current handle for an ID.
    ///
    /// Used by the world when it holds a bare ID (archetype rows store IDs,
    /// not full handles) and needs the authoritative handle back. Rows only
    /// ever reference live entities, so pairing the ID with its current
    /// generation reconstructs the valid handle.

    #[inline]
    pub fn handle_for(&self, id: EntityID) -> Option<EntityHandle> {
        let generation = *self.generations.get(id as usize)?;
        Some(EntityHandle::pack(id, generation))
    }

    /// Invalidates every entity at once.
    ///
    /// ## Behavior
    /// Bumps every generation counter (so all outstanding handles fail the
    /// liveness check) and rebuilds the free list from the full ID range.
    /// Used by `World::clear`.

    pub fn invalidate_all(&mut self) {
        self.free_entities.clear();
        for id in 0..self.generations.len() as EntityID {
            self.generations[id as usize] = self.generations[id as usize].wrapping_add(1);
            self.free_entities.push(id);
        }
        self.alive_count = 0;
    }
}
