//! Plugin registration and ordered build.
//!
//! A **plugin** bundles related components, resources, and systems and
//! contributes them to the [`App`] in one `build` call. Plugins are built
//! in registration order exactly once; declared dependencies must be
//! added before their dependents, which keeps the build order a valid
//! linearisation without any graph solving.

use log::debug;

use crate::engine::app::App;
use crate::engine::error::{EcsResult, PluginError};


/// A registrar contributing components, resources, and systems.
pub trait Plugin {
    /// Returns the unique name of this plugin.
    fn name(&self) -> &str;

    /// Contributes this plugin's registrations to the app.
    fn build(&mut self, app: &mut App) -> EcsResult<()>;

    /// Names of plugins that must be added before this one.
    fn dependencies(&self) -> &[&'static str] {
        &[]
    }

    /// Invoked right after `build` succeeds.
    fn on_enable(&mut self, app: &mut App) -> EcsResult<()> {
        let _ = app;
        Ok(())
    }

    /// Invoked when the plugin is deactivated by the host.
    fn on_disable(&mut self, app: &mut App) -> EcsResult<()> {
        let _ = app;
        Ok(())
    }
}

/// Ordered plugin registry with a single build pass.
#[derive(Default)]
pub struct PluginManager {
    plugins: Vec<Box<dyn Plugin>>,
    built: bool,
}

impl PluginManager {
    /// Creates an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` once `build` has run.
    #[inline]
    pub fn is_built(&self) -> bool {
        self.built
    }

    /// Returns the number of registered plugins.
    #[inline]
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Returns `true` if no plugins are registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    fn position_of(&self, name: &str) -> Option<usize> {
        self.plugins.iter().position(|p| p.name() == name)
    }

    fn validate_insert(&self, plugin: &dyn Plugin) -> Result<(), PluginError> {
        if self.built {
            return Err(PluginError::MutatedAfterBuild {
                name: plugin.name().to_string(),
            });
        }
        if self.position_of(plugin.name()).is_some() {
            return Err(PluginError::DuplicatePlugin {
                name: plugin.name().to_string(),
            });
        }
        for &dependency in plugin.dependencies() {
            if self.position_of(dependency).is_none() {
                return Err(PluginError::MissingDependency {
                    plugin: plugin.name().to_string(),
                    dependency: dependency.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Appends a plugin.
    ///
    /// ## Errors
    /// Duplicate name, unmet dependency, or registration after build.

    pub fn add(&mut self, plugin: Box<dyn Plugin>) -> Result<(), PluginError> {
        self.validate_insert(plugin.as_ref())?;
        self.plugins.push(plugin);
        Ok(())
    }

    /// Inserts a plugin immediately before `existing_name`.
    pub fn add_before(
        &mut self,
        plugin: Box<dyn Plugin>,
        existing_name: &str,
    ) -> Result<(), PluginError> {
        self.validate_insert(plugin.as_ref())?;
        let position = self
            .position_of(existing_name)
            .ok_or_else(|| PluginError::UnknownPlugin {
                name: existing_name.to_string(),
            })?;
        self.plugins.insert(position, plugin);
        Ok(())
    }

    /// Inserts a plugin immediately after `existing_name`.
    pub fn add_after(
        &mut self,
        plugin: Box<dyn Plugin>,
        existing_name: &str,
    ) -> Result<(), PluginError> {
        self.validate_insert(plugin.as_ref())?;
        let position = self
            .position_of(existing_name)
            .ok_or_else(|| PluginError::UnknownPlugin {
                name: existing_name.to_string(),
            })?;
        self.plugins.insert(position + 1, plugin);
        Ok(())
    }

    /// Builds every plugin in order, then runs its `on_enable` hook.
    ///
    /// ## Errors
    /// `PluginError::AlreadyBuilt` on a second call; plugin hook errors
    /// propagate and abort the pass.

    pub fn build(&mut self, app: &mut App) -> EcsResult<()> {
        if self.built {
            return Err(PluginError::AlreadyBuilt.into());
        }

        for plugin in &mut self.plugins {
            debug!("building plugin {}", plugin.name());
            plugin.build(app)?;
            plugin.on_enable(app)?;
        }

        self.built = true;
        Ok(())
    }

    /// Returns `true` if a plugin with this name is registered.
    pub fn has(&self, name: &str) -> bool {
        self.position_of(name).is_some()
    }

    /// Returns the registered plugin names in build order.
    pub fn list(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    /// Returns a registered plugin by name.
    pub fn get(&self, name: &str) -> Option<&dyn Plugin> {
        self.position_of(name).map(|i| self.plugins[i].as_ref())
    }

    /// Removes a plugin by name. Only permitted before build.
    pub fn remove(&mut self, name: &str) -> Result<(), PluginError> {
        if self.built {
            return Err(PluginError::MutatedAfterBuild {
                name: name.to_string(),
            });
        }
        let position = self
            .position_of(name)
            .ok_or_else(|| PluginError::UnknownPlugin { name: name.to_string() })?;
        self.plugins.remove(position);
        Ok(())
    }
}
