//! System scheduling and per-frame execution.
//!
//! This module is responsible for:
//! * grouping registered systems into the five fixed stages,
//! * resolving intra-stage `depends_on` graphs into an execution order,
//! * partitioning ordered systems into parallel-eligible runs,
//! * recording per-system timing and error statistics.
//!
//! ## Ordering model
//!
//! Per stage, the declared dependencies form a DAG that is ordered with
//! Kahn's algorithm. Each system's order key is
//!
//! ```text
//! execution_order = topo_level * 1000 - priority
//! ```
//!
//! so dependencies always run first, higher priority wins inside a
//! topological level, and remaining ties fall back to registration order
//! (the sort is stable).
//!
//! ## Parallel runs
//!
//! Consecutive parallel-eligible systems form a group; a sequential
//! system flushes the group before running. Groups are a preparation for
//! future multi-threaded execution — the current contract executes every
//! member on the scheduler thread, which trivially preserves the ordering
//! guarantees above.
//!
//! ## Failure semantics
//!
//! A system error is recorded in its stats, logged, and propagated; the
//! remaining systems of the frame do not execute. The scheduler never
//! swallows an error.

use std::time::Instant;

use log::{debug, trace, warn};

use crate::engine::app::App;
use crate::engine::error::{EcsResult, ScheduleError};
use crate::engine::systems::{Stage, System, SystemStats};


struct SystemWrapper {
    system: Box<dyn System>,
    stage: Stage,
    enabled: bool,
    stats: SystemStats,
    execution_order: i64,
}

/// Stage-bucketed system registry and frame executor.
pub struct Scheduler {
    systems: Vec<SystemWrapper>,
    needs_order: bool,
    stats_enabled: bool,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self {
            systems: Vec::new(),
            needs_order: false,
            stats_enabled: true,
        }
    }
}

impl Scheduler {
    /// Creates an empty scheduler with stats recording enabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of registered systems.
    #[inline]
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    /// Returns `true` if no systems are registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// Enables or disables timing/error recording.
    pub fn set_stats_enabled(&mut self, enabled: bool) {
        self.stats_enabled = enabled;
    }

    /// Registers a system into a stage.
    ///
    /// ## Errors
    /// `ScheduleError::DuplicateSystem` if the name is taken.

    pub fn add<S: System + 'static>(&mut self, system: S, stage: Stage) -> Result<(), ScheduleError> {
        self.add_boxed(Box::new(system), stage)
    }

    /// Registers a boxed system into a stage.
    pub fn add_boxed(
        &mut self,
        system: Box<dyn System>,
        stage: Stage,
    ) -> Result<(), ScheduleError> {
        if self.systems.iter().any(|w| w.system.name() == system.name()) {
            return Err(ScheduleError::DuplicateSystem {
                name: system.name().to_string(),
            });
        }

        self.systems.push(SystemWrapper {
            system,
            stage,
            enabled: true,
            stats: SystemStats::default(),
            execution_order: 0,
        });
        self.needs_order = true;
        Ok(())
    }

    /// Unregisters a system by name.
    pub fn remove(&mut self, name: &str) -> bool {
        let Some(position) = self.systems.iter().position(|w| w.system.name() == name) else {
            return false;
        };
        self.systems.remove(position);
        self.needs_order = true;
        true
    }

    /// Removes every system.
    pub fn clear(&mut self) {
        self.systems.clear();
        self.needs_order = false;
    }

    /// Enables or disables a system by name. Disabled systems keep their
    /// registration (and participate in dependency validation) but do not
    /// execute.

    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> bool {
        match self.systems.iter_mut().find(|w| w.system.name() == name) {
            Some(wrapper) => {
                wrapper.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Returns `true` if the named system exists and is enabled.
    pub fn is_enabled(&self, name: &str) -> bool {
        self.systems
            .iter()
            .find(|w| w.system.name() == name)
            .is_some_and(|w| w.enabled)
    }

    /// Returns the recorded stats for a system.
    pub fn stats_of(&self, name: &str) -> Option<SystemStats> {
        self.systems
            .iter()
            .find(|w| w.system.name() == name)
            .map(|w| w.stats)
    }

    /// Iterates over `(name, stats)` for every registered system.
    pub fn stats(&self) -> impl Iterator<Item = (&str, SystemStats)> {
        self.systems.iter().map(|w| (w.system.name(), w.stats))
    }

    /// Recomputes execution order for every stage.
    ///
    /// ## Errors
    /// - `UnknownDependency` when `depends_on` names a system that is not
    ///   registered in the dependent's stage.
    /// - `CircularDependency` when a stage's graph has a cycle.

    fn compute_execution_order(&mut self) -> Result<(), ScheduleError> {
        for stage in Stage::ALL {
            let indices: Vec<usize> = self
                .systems
                .iter()
                .enumerate()
                .filter(|(_, w)| w.stage == stage)
                .map(|(i, _)| i)
                .collect();
            if indices.is_empty() {
                continue;
            }

            let count = indices.len();
            let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); count];
            let mut indegree: Vec<usize> = vec![0; count];
            let mut priorities: Vec<i32> = Vec::with_capacity(count);

            for (local, &index) in indices.iter().enumerate() {
                priorities.push(self.systems[index].system.priority());

                for &dependency in self.systems[index].system.depends_on() {
                    let dep_local = indices
                        .iter()
                        .position(|&i| self.systems[i].system.name() == dependency);

                    let Some(dep_local) = dep_local else {
                        return Err(ScheduleError::UnknownDependency {
                            system: self.systems[index].system.name().to_string(),
                            dependency: dependency.to_string(),
                            stage,
                        });
                    };

                    dependents[dep_local].push(local);
                    indegree[local] += 1;
                }
            }

            // Kahn's algorithm, tracking each node's topological level.
            let mut level_of = vec![0usize; count];
            let mut queue: Vec<usize> = (0..count).filter(|&l| indegree[l] == 0).collect();
            let mut head = 0;
            while head < queue.len() {
                let local = queue[head];
                head += 1;

                for &next in &dependents[local] {
                    level_of[next] = level_of[next].max(level_of[local] + 1);
                    indegree[next] -= 1;
                    if indegree[next] == 0 {
                        queue.push(next);
                    }
                }
            }

            if queue.len() != count {
                return Err(ScheduleError::CircularDependency { stage });
            }

            for (local, &index) in indices.iter().enumerate() {
                self.systems[index].execution_order =
                    level_of[local] as i64 * 1000 - priorities[local] as i64;
            }

            debug!("stage {stage}: execution order recomputed for {count} systems");
        }

        Ok(())
    }

    fn run_system(&mut self, index: usize, app: &mut App, dt: f64) -> EcsResult<()> {
        let wrapper = &mut self.systems[index];

        if !self.stats_enabled {
            if let Err(error) = wrapper.system.update(app, dt) {
                warn!("system {} failed: {error}", wrapper.system.name());
                return Err(error);
            }
            return Ok(());
        }

        let start = Instant::now();
        let result = wrapper.system.update(app, dt);
        wrapper.stats.total_time_ns += start.elapsed().as_nanos() as u64;
        wrapper.stats.call_count += 1;

        if let Err(error) = result {
            wrapper.stats.error_count += 1;
            warn!("system {} failed: {error}", wrapper.system.name());
            return Err(error);
        }
        Ok(())
    }

    fn flush_group(&mut self, group: &mut Vec<usize>, app: &mut App, dt: f64) -> EcsResult<()> {
        if group.is_empty() {
            return Ok(());
        }

        // Parallel-eligible run; executed sequentially on this thread.
        trace!("running parallel group of {} systems", group.len());
        for &index in group.iter() {
            self.run_system(index, app, dt)?;
        }
        group.clear();
        Ok(())
    }

    /// Executes every enabled system of one stage in execution order.
    pub fn update_stage(&mut self, app: &mut App, stage: Stage, dt: f64) -> EcsResult<()> {
        if self.needs_order {
            self.compute_execution_order()?;
            self.needs_order = false;
        }

        let mut order: Vec<usize> = self
            .systems
            .iter()
            .enumerate()
            .filter(|(_, w)| w.stage == stage && w.enabled)
            .map(|(i, _)| i)
            .collect();
        order.sort_by_key(|&i| self.systems[i].execution_order);

        let mut parallel_group: Vec<usize> = Vec::new();
        for &index in &order {
            if self.systems[index].system.can_run_parallel() {
                parallel_group.push(index);
                continue;
            }

            // A sequential system flushes the pending group first.
            self.flush_group(&mut parallel_group, app, dt)?;
            self.run_system(index, app, dt)?;
        }
        self.flush_group(&mut parallel_group, app, dt)
    }

    /// Executes every stage in fixed order.
    pub fn update_all(&mut self, app: &mut App, dt: f64) -> EcsResult<()> {
        for stage in Stage::ALL {
            self.update_stage(app, stage, dt)?;
        }
        Ok(())
    }

    /// Runs `init` on every system in registration order.
    pub(crate) fn init_all(&mut self, app: &mut App) -> EcsResult<()> {
        for wrapper in &mut self.systems {
            wrapper.system.init(app)?;
        }
        Ok(())
    }

    /// Runs `finalize` on every system in reverse registration order.
    pub(crate) fn finalize_all(&mut self, app: &mut App) -> EcsResult<()> {
        for wrapper in self.systems.iter_mut().rev() {
            wrapper.system.finalize(app)?;
        }
        Ok(())
    }

    /// Adopts systems that were registered into `other` while this
    /// scheduler was detached from the app (mid-frame registrations land
    /// in the app's placeholder scheduler). Name collisions are dropped
    /// with a warning.

    pub(crate) fn absorb(&mut self, other: Scheduler) {
        for wrapper in other.systems {
            if self
                .systems
                .iter()
                .any(|w| w.system.name() == wrapper.system.name())
            {
                warn!(
                    "dropping mid-frame system registration with duplicate name {}",
                    wrapper.system.name()
                );
                continue;
            }
            self.systems.push(wrapper);
            self.needs_order = true;
        }
    }
}
