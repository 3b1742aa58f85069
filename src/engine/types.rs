//! Core ECS identifiers and bit-level layouts.
//!
//! This module defines the **fundamental identifier types** shared across all
//! subsystems of the engine: entity handles, component type identifiers, and
//! archetype identifiers.
//!
//! ## Entity representation
//!
//! Entities are encoded as a packed 64-bit integer:
//!
//! ```text
//! | generation (32) | id (32) |
//! ```
//!
//! - **ID** indexes into the entity manager's generation table.
//! - **Generation** enables stale-handle detection after despawning.
//!
//! Two handles with the same `id` but different generations are distinct;
//! handle equality is equality of the packed 64-bit value.
//!
//! ## Archetype identity
//!
//! An archetype is identified by the FNV-1a 64 hash of its **sorted**
//! component type set, making the identifier a pure function of the set.
//! Distinct sorted sets colliding under FNV-1a is accepted as a practical
//! impossibility for the component counts this engine targets.

use std::hash::Hasher;

use fnv::FnvHasher;


/// Bit-width type used for compile-time layout calculations.
pub type Bits = u8;

/// Index half of an entity handle.
pub type EntityID = u32;
/// Generation half of an entity handle, incremented on destroy.
pub type EntityGeneration = u32;

/// Dense runtime identifier assigned to a component type on registration.
pub type ComponentTypeID = u32;

/// Identifier of an archetype table: FNV-1a 64 over the sorted type set.
pub type ArchetypeID = u64;
/// Monotonic per-archetype counter advanced on every structural mutation.
pub type ArchetypeVersion = u64;

/// Total number of bits in a packed entity handle.
pub const HANDLE_BITS: Bits = 64;
/// Number of bits reserved for the entity ID.
pub const ID_BITS: Bits = 32;
/// Number of bits reserved for the generation.
pub const GENERATION_BITS: Bits = HANDLE_BITS - ID_BITS;

const _: [(); 1] = [(); (ID_BITS + GENERATION_BITS == HANDLE_BITS) as usize];
const _: [(); 1] = [(); (ID_BITS > 0 && GENERATION_BITS > 0) as usize];

/// Mask selecting the ID portion of a packed handle.
pub const ID_MASK: u64 = (1u64 << ID_BITS) - 1;

/// Opaque, versioned identifier for an ECS entity.
///
/// ## Representation
/// Packs the entity ID into the low 32 bits and the generation into the high
/// 32 bits. Handles are cheap to copy, hash, and compare, and are safe to
/// pass across threads.
///
/// ## Invariants
/// - A handle is valid iff the entity manager still stores the same
///   generation for its ID.
/// - Despawning an entity invalidates all previously issued handles for it.

#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct EntityHandle(pub u64);

impl EntityHandle {
    /// Packs an ID and a generation into a handle.
    #[inline]
    pub const fn pack(id: EntityID, generation: EntityGeneration) -> Self {
        Self(((generation as u64) << ID_BITS) | (id as u64))
    }

    /// Returns the ID component of this handle.
    #[inline]
    pub const fn id(self) -> EntityID {
        (self.0 & ID_MASK) as EntityID
    }

    /// Returns the generation component of this handle.
    #[inline]
    pub const fn generation(self) -> EntityGeneration {
        (self.0 >> ID_BITS) as EntityGeneration
    }

    /// Returns the `(id, generation)` components of this handle.
    #[inline]
    pub const fn split(self) -> (EntityID, EntityGeneration) {
        (self.id(), self.generation())
    }
}

impl std::fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}v{}", self.id(), self.generation())
    }
}

/// Computes the archetype identifier for a **sorted** component type set.
///
/// ## Purpose
/// Archetype identity is a pure function of the type set, so two independent
/// lookups of the same set always resolve to the same table.
///
/// ## Invariants
/// `sorted_types` must be sorted ascending and free of duplicates; the empty
/// set is valid and identifies the empty archetype.

pub fn archetype_id_for(sorted_types: &[ComponentTypeID]) -> ArchetypeID {
    debug_assert!(
        sorted_types.windows(2).all(|w| w[0] < w[1]),
        "archetype_id_for requires a sorted, duplicate-free type set"
    );

    let mut hasher = FnvHasher::default();
    for &type_id in sorted_types {
        hasher.write(&type_id.to_le_bytes());
    }
    hasher.finish()
}
