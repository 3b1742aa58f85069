//! Error types for registration, storage, scheduling, and plugin wiring.
//!
//! This module declares focused, composable error types used across the
//! engine. Each error carries enough context to make failures actionable
//! while remaining small and cheap to pass around or convert into the
//! crate-level [`EcsError`].
//!
//! ## Goals
//! * **Specificity:** Each variant models a single failure mode (duplicate
//!   system name, missing plugin dependency, unregistered component type).
//! * **Ergonomics:** All errors implement [`std::error::Error`] and
//!   [`fmt::Display`], and provide `From<T>` conversions into [`EcsError`]
//!   so call sites can use `?` throughout.
//! * **Actionability:** Structured fields (offending names, type IDs,
//!   stages) make logs useful without reproducing the issue.
//!
//! ## Typical flow
//! Subsystem operations return their own narrow error type (for example
//! [`ScheduleError`] from dependency resolution). Orchestration code uses
//! `?` to bubble failures into [`EcsError`], which hosts can match on for
//! control flow or log with user-readable messages.
//!
//! Entity-level operations on the world (`add`, `remove`, `despawn`, `get`)
//! deliberately do **not** use these types: a stale handle or a duplicate
//! component is an expected outcome reported as `false`/`None`, not a fault.
//!
//! ## Display vs. Debug
//! * [`fmt::Display`] is optimized for operator logs (short, imperative
//!   phrasing).
//! * [`fmt::Debug`] (derived) retains full structure for diagnostics.

use std::fmt;

use crate::engine::systems::Stage;
use crate::engine::types::{ComponentTypeID, EntityID};


/// Result alias used across the engine.
pub type EcsResult<T> = Result<T, EcsError>;

/// Returned by the type registry when a component type cannot be
/// registered or resolved.
///
/// ### Variants
/// * `NotRegistered` — a lookup ran before the type's first registration.
/// * `ZeroSized` — the type has no data; columns store fixed-size cells,
///   so marker components must carry at least one byte.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    /// The component type was never registered with this world.
    NotRegistered {
        /// Rust type name of the offending component.
        name: &'static str,
    },

    /// The component type is zero-sized and cannot occupy a column cell.
    ZeroSized {
        /// Rust type name of the offending component.
        name: &'static str,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::NotRegistered { name } => {
                write!(f, "component type {name} is not registered")
            }
            RegistryError::ZeroSized { name } => {
                write!(f, "component type {name} is zero-sized")
            }
        }
    }
}

impl std::error::Error for RegistryError {}

/// Returned by archetype table mutations that violate the table contract.
///
/// These indicate either a caller error (inserting an entity twice) or an
/// internal invariant violation (a bundle missing a column the archetype
/// requires); the world-level migration paths construct bundles that cannot
/// trigger the latter.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchetypeError {
    /// The entity already occupies a row in this archetype.
    AlreadyPresent {
        /// Offending entity ID.
        entity: EntityID,
    },

    /// The supplied bundle lacks a component the archetype stores.
    MissingComponent {
        /// Component type absent from the bundle.
        type_id: ComponentTypeID,
    },

    /// The supplied bundle contains a component the archetype does not store.
    UnexpectedComponent {
        /// Component type with no matching column.
        type_id: ComponentTypeID,
    },
}

impl fmt::Display for ArchetypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchetypeError::AlreadyPresent { entity } => {
                write!(f, "entity {entity} is already present in this archetype")
            }
            ArchetypeError::MissingComponent { type_id } => {
                write!(f, "bundle is missing required component type {type_id}")
            }
            ArchetypeError::UnexpectedComponent { type_id } => {
                write!(f, "bundle contains component type {type_id} not stored by this archetype")
            }
        }
    }
}

impl std::error::Error for ArchetypeError {}

/// Returned during system registration or execution-order resolution.
///
/// ### Variants (typical)
/// * `DuplicateSystem` — a second system registered under an existing name.
/// * `UnknownDependency` — `depends_on` names a system that is not
///   registered in the same stage (nonexistent or cross-stage).
/// * `CircularDependency` — the intra-stage dependency graph has a cycle.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// A system with this name is already registered.
    DuplicateSystem {
        /// Colliding system name.
        name: String,
    },

    /// A declared dependency does not exist in the dependent's stage.
    UnknownDependency {
        /// System declaring the dependency.
        system: String,
        /// Name that could not be resolved within the stage.
        dependency: String,
        /// Stage in which resolution was attempted.
        stage: Stage,
    },

    /// The intra-stage dependency graph contains a cycle.
    CircularDependency {
        /// Stage whose graph failed topological ordering.
        stage: Stage,
    },
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleError::DuplicateSystem { name } => {
                write!(f, "system name collision: {name}")
            }
            ScheduleError::UnknownDependency { system, dependency, stage } => {
                write!(
                    f,
                    "system {system} depends on {dependency}, which is not registered in stage {stage}"
                )
            }
            ScheduleError::CircularDependency { stage } => {
                write!(f, "circular system dependency in stage {stage}")
            }
        }
    }
}

impl std::error::Error for ScheduleError {}

/// Returned by the plugin manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginError {
    /// A plugin with this name is already registered.
    DuplicatePlugin {
        /// Colliding plugin name.
        name: String,
    },

    /// A declared plugin dependency has not been added yet.
    MissingDependency {
        /// Plugin declaring the dependency.
        plugin: String,
        /// Dependency that must be added first.
        dependency: String,
    },

    /// No plugin with this name is registered.
    UnknownPlugin {
        /// Requested plugin name.
        name: String,
    },

    /// `build` was called a second time.
    AlreadyBuilt,

    /// A structural plugin operation ran after `build`.
    MutatedAfterBuild {
        /// Plugin the operation targeted.
        name: String,
    },
}

impl fmt::Display for PluginError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PluginError::DuplicatePlugin { name } => {
                write!(f, "plugin name collision: {name}")
            }
            PluginError::MissingDependency { plugin, dependency } => {
                write!(f, "plugin {plugin} requires {dependency}, which must be added first")
            }
            PluginError::UnknownPlugin { name } => {
                write!(f, "no plugin named {name}")
            }
            PluginError::AlreadyBuilt => f.write_str("plugin set was already built"),
            PluginError::MutatedAfterBuild { name } => {
                write!(f, "cannot modify plugin {name} after build")
            }
        }
    }
}

impl std::error::Error for PluginError {}

/// Returned when a system's `update` fails during a frame.
///
/// Systems typically construct this through [`EcsError::system_failure`];
/// the scheduler records the failure in the system's stats and propagates
/// it, aborting the remainder of the frame.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemFailure {
    /// Name of the failing system.
    pub system: String,

    /// Human-readable failure description.
    pub message: String,
}

impl fmt::Display for SystemFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "system {} failed: {}", self.system, self.message)
    }
}

impl std::error::Error for SystemFailure {}

/// Crate-level aggregate error.
///
/// `From<T>` conversions are implemented for every subsystem error so
/// orchestration code can use `?` and still return a single type.

#[derive(Debug)]
pub enum EcsError {
    /// Component type registration or lookup failed.
    Registry(RegistryError),

    /// An archetype table mutation violated its contract.
    Archetype(ArchetypeError),

    /// System registration or ordering failed.
    Schedule(ScheduleError),

    /// Plugin registration or build failed.
    Plugin(PluginError),

    /// A system reported a failure during `update`.
    System(SystemFailure),

    /// An internal invariant was violated. This indicates a bug in the
    /// engine rather than a recoverable runtime condition.
    Internal(String),
}

impl EcsError {
    /// Builds a [`EcsError::System`] from a system name and message.
    pub fn system_failure(system: impl Into<String>, message: impl Into<String>) -> Self {
        EcsError::System(SystemFailure {
            system: system.into(),
            message: message.into(),
        })
    }
}

impl fmt::Display for EcsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EcsError::Registry(e) => write!(f, "{e}"),
            EcsError::Archetype(e) => write!(f, "{e}"),
            EcsError::Schedule(e) => write!(f, "{e}"),
            EcsError::Plugin(e) => write!(f, "{e}"),
            EcsError::System(e) => write!(f, "{e}"),
            EcsError::Internal(message) => write!(f, "internal invariant violated: {message}"),
        }
    }
}

impl std::error::Error for EcsError {}

impl From<RegistryError> for EcsError {
    fn from(e: RegistryError) -> Self { EcsError::Registry(e) }
}
impl From<ArchetypeError> for EcsError {
    fn from(e: ArchetypeError) -> Self { EcsError::Archetype(e) }
}
impl From<ScheduleError> for EcsError {
    fn from(e: ScheduleError) -> Self { EcsError::Schedule(e) }
}
impl From<PluginError> for EcsError {
    fn from(e: PluginError) -> Self { EcsError::Plugin(e) }
}
impl From<SystemFailure> for EcsError {
    fn from(e: SystemFailure) -> Self { EcsError::System(e) }
}
