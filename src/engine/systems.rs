//! ECS system abstractions.
//!
//! A **system** is a unit of logic executed once per frame within a fixed
//! [`Stage`]. Systems:
//! - expose a stable name used for dependency declarations,
//! - may declare intra-stage ordering via `depends_on` and `priority`,
//! - may opt into parallel grouping via `can_run_parallel`,
//! - receive the whole [`App`](crate::engine::app::App) as an explicit
//!   context parameter rather than reaching for globals.
//!
//! ## Scheduling model
//!
//! Within a stage the scheduler orders systems by topological level of
//! the declared dependency graph, breaking ties by priority (higher runs
//! earlier) and then by registration order. Consecutive parallel-eligible
//! systems form a parallel group; the current contract executes group
//! members sequentially on the scheduler thread, preserving the stated
//! ordering guarantees either way.
//!
//! ## Function-backed systems
//!
//! [`FnSystem`] defines a system from a closure without a dedicated type,
//! which is the preferred mechanism for plugin-contributed and test
//! systems.

use crate::engine::app::App;
use crate::engine::error::EcsResult;


/// Fixed scheduling buckets, executed in declaration order every frame.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Stage {
    /// Frame setup: timing, input rollover preparation.
    PreUpdate,
    /// Main simulation logic.
    Update,
    /// Reactions to the main update (collision response, cleanup marks).
    PostUpdate,
    /// Drawing via the externally owned graphics context.
    Render,
    /// End-of-frame bookkeeping.
    Cleanup,
}

impl Stage {
    /// Every stage, in fixed execution order.
    pub const ALL: [Stage; 5] = [
        Stage::PreUpdate,
        Stage::Update,
        Stage::PostUpdate,
        Stage::Render,
        Stage::Cleanup,
    ];

    /// Returns the canonical lowercase stage name.
    pub fn name(self) -> &'static str {
        match self {
            Stage::PreUpdate => "pre_update",
            Stage::Update => "update",
            Stage::PostUpdate => "post_update",
            Stage::Render => "render",
            Stage::Cleanup => "cleanup",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-system execution counters recorded by the scheduler.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemStats {
    /// Total wall-clock time spent in `update`, in nanoseconds.
    pub total_time_ns: u64,

    /// Number of `update` invocations.
    pub call_count: u64,

    /// Number of `update` invocations that returned an error.
    pub error_count: u64,
}

impl SystemStats {
    /// Returns the mean `update` duration in nanoseconds.
    pub fn average_time_ns(&self) -> u64 {
        if self.call_count == 0 {
            0
        } else {
            self.total_time_ns / self.call_count
        }
    }
}

/// A unit of executable logic registered into a stage.
pub trait System {
    /// Returns the unique name of this system.
    fn name(&self) -> &str;

    /// Executes one frame of this system's logic.
    fn update(&mut self, app: &mut App, dt: f64) -> EcsResult<()>;

    /// Tiebreaker within a topological level: higher runs earlier.
    fn priority(&self) -> i32 {
        0
    }

    /// Names of same-stage systems that must update before this one.
    fn depends_on(&self) -> &[&'static str] {
        &[]
    }

    /// Opts into parallel grouping. Group members currently still execute
    /// sequentially on the scheduler thread.
    fn can_run_parallel(&self) -> bool {
        false
    }

    /// One-time setup hook, invoked during `App::build` for systems
    /// registered at that point. Must not register further systems.
    fn init(&mut self, app: &mut App) -> EcsResult<()> {
        let _ = app;
        Ok(())
    }

    /// Teardown hook, invoked by `App::finalize` in reverse registration
    /// order.
    fn finalize(&mut self, app: &mut App) -> EcsResult<()> {
        let _ = app;
        Ok(())
    }
}

/// A [`System`] backed by a function or closure.
///
/// Stores a name, optional ordering metadata, and the executable itself.
///
/// ## Example
/// ```ignore
/// app.add_system(
///     FnSystem::new("physics::integrate", |app, dt| {
///         // move things
///         Ok(())
///     })
///     .after("time::advance"),
///     Stage::Update,
/// )?;
/// ```

pub struct FnSystem<F>
where
    F: FnMut(&mut App, f64) -> EcsResult<()>,
{
    name: &'static str,
    priority: i32,
    dependencies: Vec<&'static str>,
    parallel: bool,
    f: F,
}

impl<F> FnSystem<F>
where
    F: FnMut(&mut App, f64) -> EcsResult<()>,
{
    /// Creates a function-backed system with the given name.
    pub fn new(name: &'static str, f: F) -> Self {
        Self {
            name,
            priority: 0,
            dependencies: Vec::new(),
            parallel: false,
            f,
        }
    }

    /// Sets the intra-level priority (higher runs earlier).
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Declares that this system runs after the named same-stage system.
    pub fn after(mut self, dependency: &'static str) -> Self {
        self.dependencies.push(dependency);
        self
    }

    /// Marks this system as parallel-eligible.
    pub fn parallel(mut self) -> Self {
        self.parallel = true;
        self
    }
}

impl<F> System for FnSystem<F>
where
    F: FnMut(&mut App, f64) -> EcsResult<()>,
{
    fn name(&self) -> &str {
        self.name
    }

    fn update(&mut self, app: &mut App, dt: f64) -> EcsResult<()> {
        (self.f)(app, dt)
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn depends_on(&self) -> &[&'static str] {
        &self.dependencies
    }

    fn can_run_parallel(&self) -> bool {
        self.parallel
    }
}
