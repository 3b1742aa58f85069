//! # Component Type Registry
//!
//! This module assigns dense runtime [`ComponentTypeID`] values to Rust
//! component types and records the per-type metadata that drives the
//! type-erased column storage.
//!
//! ## Purpose
//! The registry decouples component type information (`TypeId`, name, size,
//! alignment, drop glue) from runtime storage, enabling archetypes to store
//! heterogeneous component columns behind a uniform byte-level interface.
//!
//! ## Design
//! - Components are registered once and assigned sequential IDs starting
//!   at zero; re-registering a type returns the existing ID.
//! - A [`ComponentInfo`] descriptor is captured at registration time via
//!   monomorphisation; all column operations are driven by the descriptor,
//!   never by runtime type introspection.
//! - The registry is append-only and owned by its world. Two worlds may
//!   assign different IDs to the same Rust type.
//!
//! ## Invariants
//! - `ComponentTypeID` values are unique and stable for the lifetime of
//!   the owning world.
//! - `infos[id]` is the descriptor of the type that was assigned `id`.
//! - Zero-sized types are rejected: every column cell occupies at least
//!   one byte.

use std::any::{type_name, TypeId};
use std::mem::{align_of, needs_drop, size_of};

use fnv::FnvHashMap;

use crate::engine::error::RegistryError;
use crate::engine::storage::CellBuffer;
use crate::engine::types::ComponentTypeID;


/// Erased drop glue for a single component cell.
pub type DropFn = unsafe fn(*mut u8);

unsafe fn drop_cell<T>(ptr: *mut u8) {
    unsafe { std::ptr::drop_in_place(ptr.cast::<T>()) }
}

/// Describes a registered component type.
///
/// ## Purpose
/// Provides the metadata needed to allocate, copy, and destroy component
/// cells without knowing the concrete Rust type, plus diagnostics fields.
///
/// ## Fields
/// - `type_id`: runtime identifier assigned by the registry.
/// - `name`: the Rust type name (`type_name::<T>()`).
/// - `rust_type`: the `TypeId` used for registry lookups and cast checks.
/// - `size` / `align`: cell layout in bytes.
/// - `drop_fn`: erased destructor, `None` for plain-data types.

#[derive(Clone, Copy, Debug)]
pub struct ComponentInfo {
    /// Runtime identifier assigned to this component type.
    pub type_id: ComponentTypeID,

    /// Rust type name for diagnostics.
    pub name: &'static str,

    /// Runtime `TypeId` of the component.
    pub rust_type: TypeId,

    /// Size of the component type in bytes.
    pub size: usize,

    /// Alignment of the component type in bytes.
    pub align: usize,

    /// Erased destructor, if the type needs one.
    pub drop_fn: Option<DropFn>,
}

impl ComponentInfo {
    /// Constructs a descriptor for type `T` under the given runtime ID.
    #[inline]
    pub fn of<T: 'static + Send + Sync>(type_id: ComponentTypeID) -> Self {
        Self {
            type_id,
            name: type_name::<T>(),
            rust_type: TypeId::of::<T>(),
            size: size_of::<T>(),
            align: align_of::<T>(),
            drop_fn: if needs_drop::<T>() {
                Some(drop_cell::<T> as DropFn)
            } else {
                None
            },
        }
    }

    /// Returns `true` if this descriptor refers to type `T`.
    #[inline]
    pub fn matches_type<T: 'static>(&self) -> bool {
        self.rust_type == TypeId::of::<T>()
    }
}

impl std::fmt::Display for ComponentInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ComponentInfo {{ id: {}, name: {}, size: {}, align: {} }}",
            self.type_id, self.name, self.size, self.align
        )
    }
}

/// World-owned mapping between Rust component types and runtime IDs.
///
/// ## Design
/// - `by_type` maps `TypeId -> ComponentTypeID`.
/// - `infos` stores descriptors indexed by `ComponentTypeID`.
/// - IDs are assigned sequentially in registration order.

#[derive(Default)]
pub struct TypeRegistry {
    by_type: FnvHashMap<TypeId, ComponentTypeID>,
    infos: Vec<ComponentInfo>,
}

impl TypeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers component type `T` and returns its assigned ID.
    ///
    /// ## Behavior
    /// - If `T` is already registered, returns the existing ID.
    /// - Otherwise assigns the next sequential ID and records the
    ///   descriptor used by column storage.
    ///
    /// ## Errors
    /// `RegistryError::ZeroSized` if `T` carries no data.

    pub fn register<T: 'static + Send + Sync>(&mut self) -> Result<ComponentTypeID, RegistryError> {
        let rust_type = TypeId::of::<T>();
        if let Some(&existing) = self.by_type.get(&rust_type) {
            return Ok(existing);
        }

        if size_of::<T>() == 0 {
            return Err(RegistryError::ZeroSized { name: type_name::<T>() });
        }

        let type_id = self.infos.len() as ComponentTypeID;
        self.by_type.insert(rust_type, type_id);
        self.infos.push(ComponentInfo::of::<T>(type_id));
        Ok(type_id)
    }

    /// Returns the ID for `T`, failing if it was never registered.
    pub fn get<T: 'static>(&self) -> Result<ComponentTypeID, RegistryError> {
        self.id_of::<T>()
            .ok_or(RegistryError::NotRegistered { name: type_name::<T>() })
    }

    /// Returns the ID for `T`, if registered.
    #[inline]
    pub fn id_of<T: 'static>(&self) -> Option<ComponentTypeID> {
        self.by_type.get(&TypeId::of::<T>()).copied()
    }

    /// Returns the descriptor for a runtime ID, if registered.
    #[inline]
    pub fn info(&self, type_id: ComponentTypeID) -> Option<&ComponentInfo> {
        self.infos.get(type_id as usize)
    }

    /// Returns the number of registered component types.
    #[inline]
    pub fn len(&self) -> usize {
        self.infos.len()
    }

    /// Returns `true` if no component types are registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }
}

/// A component value paired with its runtime type ID, ready for insertion.
///
/// Produced by `World::component` and consumed by
/// `World::create_with_components`; the value lives in an owned erased
/// cell until the target archetype copies it into a column.

pub struct ComponentData {
    pub(crate) type_id: ComponentTypeID,
    pub(crate) cell: CellBuffer,
}

impl ComponentData {
    /// Bundles a value with its registered type descriptor.
    #[inline]
    pub fn new<T: 'static + Send + Sync>(info: ComponentInfo, value: T) -> Self {
        Self {
            type_id: info.type_id,
            cell: CellBuffer::from_value(info, value),
        }
    }

    /// Returns the runtime type ID of the carried value.
    #[inline]
    pub fn type_id(&self) -> ComponentTypeID {
        self.type_id
    }
}
