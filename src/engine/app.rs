//! Application container: the single mutable owner handed to systems.
//!
//! `App` bundles the world, the resource store, the scheduler, and the
//! plugin registry. It is passed explicitly to every system and plugin
//! hook — there is no process-global state.
//!
//! During a frame the scheduler is temporarily moved out of the app so
//! that systems can receive `&mut App` while the scheduler iterates them;
//! systems registered mid-frame land in the placeholder and are adopted
//! back afterwards.

use std::mem;

use log::warn;

use crate::engine::error::EcsResult;
use crate::engine::plugin::{Plugin, PluginManager};
use crate::engine::resources::ResourceStore;
use crate::engine::scheduler::Scheduler;
use crate::engine::systems::{Stage, System};
use crate::engine::world::World;


/// Top-level engine state: world, resources, scheduler, and plugins.
#[derive(Default)]
pub struct App {
    /// Entity and component storage.
    pub world: World,
    /// Shared singleton values.
    pub resources: ResourceStore,
    scheduler: Scheduler,
    plugins: PluginManager,
}

impl App {
    /// Creates an empty app.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a plugin at the end of the build order.
    pub fn add_plugin<P: Plugin + 'static>(&mut self, plugin: P) -> EcsResult<()> {
        Ok(self.plugins.add(Box::new(plugin))?)
    }

    /// Registers a plugin immediately before an existing one.
    pub fn add_plugin_before<P: Plugin + 'static>(
        &mut self,
        plugin: P,
        existing_name: &str,
    ) -> EcsResult<()> {
        Ok(self.plugins.add_before(Box::new(plugin), existing_name)?)
    }

    /// Registers a plugin immediately after an existing one.
    pub fn add_plugin_after<P: Plugin + 'static>(
        &mut self,
        plugin: P,
        existing_name: &str,
    ) -> EcsResult<()> {
        Ok(self.plugins.add_after(Box::new(plugin), existing_name)?)
    }

    /// Returns the plugin registry.
    #[inline]
    pub fn plugins(&self) -> &PluginManager {
        &self.plugins
    }

    /// Registers a system into a stage.
    pub fn add_system<S: System + 'static>(&mut self, system: S, stage: Stage) -> EcsResult<()> {
        Ok(self.scheduler.add(system, stage)?)
    }

    /// Returns the scheduler.
    #[inline]
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Returns the scheduler mutably (for enabling/disabling systems).
    #[inline]
    pub fn scheduler_mut(&mut self) -> &mut Scheduler {
        &mut self.scheduler
    }

    /// Inserts an owned resource.
    pub fn insert_resource<T: 'static + Send + Sync>(&mut self, value: T) {
        self.resources.insert(value);
    }

    /// Builds every registered plugin, then runs each system's `init`
    /// hook.
    ///
    /// Call once after assembling plugins and systems; a second call
    /// fails.

    pub fn build(&mut self) -> EcsResult<()> {
        let mut plugins = mem::take(&mut self.plugins);
        let result = plugins.build(self);

        let stray = mem::replace(&mut self.plugins, plugins);
        if !stray.is_empty() {
            warn!(
                "dropping {} plugin(s) registered during build; add plugins before App::build",
                stray.len()
            );
        }
        result?;

        self.with_scheduler(|scheduler, app| scheduler.init_all(app))
    }

    /// Advances one frame: every stage in fixed order.
    pub fn update(&mut self, dt: f64) -> EcsResult<()> {
        self.with_scheduler(|scheduler, app| scheduler.update_all(app, dt))
    }

    /// Advances a single stage.
    pub fn update_stage(&mut self, stage: Stage, dt: f64) -> EcsResult<()> {
        self.with_scheduler(|scheduler, app| scheduler.update_stage(app, stage, dt))
    }

    /// Runs every system's `finalize` hook in reverse registration order.
    pub fn finalize(&mut self) -> EcsResult<()> {
        self.with_scheduler(|scheduler, app| scheduler.finalize_all(app))
    }

    fn with_scheduler<R>(
        &mut self,
        f: impl FnOnce(&mut Scheduler, &mut App) -> EcsResult<R>,
    ) -> EcsResult<R> {
        let mut scheduler = mem::take(&mut self.scheduler);
        let result = f(&mut scheduler, self);

        // Mid-frame registrations landed in the placeholder scheduler.
        let added = mem::take(&mut self.scheduler);
        self.scheduler = scheduler;
        self.scheduler.absorb(added);

        result
    }
}
