//! # Lattice ECS
//!
//! Archetype-indexed entity-component-system engine with cached queries
//! and a staged plugin scheduler.
//!
//! ## Design Goals
//! - Archetype storage grouped by exact component type set, columnar per
//!   type, for cache-friendly iteration
//! - O(1)-lookup structural transitions via cached archetype graph edges
//! - Version-tracked query caches that rebuild only when storage changed
//! - Deterministic staged scheduling with declared dependencies
//!
//! The engine is a library: hosts own the frame loop, the window, and the
//! graphics context, and drive the [`App`] once per frame.

#![forbid(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]
#![allow(clippy::module_inception)]

pub mod engine;

// ─────────────────────────────────────────────────────────────────────────────
// Re-exports (Public API)
// ─────────────────────────────────────────────────────────────────────────────

// Core ECS types

pub use engine::world::World;

pub use engine::entity::EntityManager;

pub use engine::component::{
    ComponentData,
    ComponentInfo,
    TypeRegistry,
};

pub use engine::archetype::Archetype;

pub use engine::query::{
    FilterOp,
    QueryChunk,
    QueryFilter,
    QueryResult,
    QuerySystem,
};

pub use engine::resources::ResourceStore;

pub use engine::systems::{FnSystem, Stage, System, SystemStats};
pub use engine::scheduler::Scheduler;

pub use engine::plugin::{Plugin, PluginManager};
pub use engine::app::App;

pub use engine::time::{Time, TimePlugin, TIME_SYSTEM};
pub use engine::input::{
    CursorPosition,
    Input,
    InputManager,
    InputPlugin,
    KeyCode,
    MouseButton,
    INPUT_SYSTEM,
};

pub use engine::error::{
    ArchetypeError,
    EcsError,
    EcsResult,
    PluginError,
    RegistryError,
    ScheduleError,
    SystemFailure,
};

pub use engine::types::{
    archetype_id_for,
    ArchetypeID,
    ArchetypeVersion,
    ComponentTypeID,
    EntityGeneration,
    EntityHandle,
    EntityID,
};

// ─────────────────────────────────────────────────────────────────────────────
// Prelude (Optional but recommended)
// ─────────────────────────────────────────────────────────────────────────────

/// Commonly used engine types.
///
/// Import with:
/// ```rust
/// use lattice_ecs::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        App,
        EcsError,
        EcsResult,
        EntityHandle,
        FnSystem,
        InputManager,
        InputPlugin,
        Plugin,
        QueryFilter,
        QuerySystem,
        Stage,
        System,
        Time,
        TimePlugin,
        World,
    };
}
