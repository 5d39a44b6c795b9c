use std::collections::{HashMap, HashSet};

use axum::Router;
use plugin_api::{Plugin, PluginError};
use thiserror::Error;

#[derive(Debug, PartialEq, Error)]
pub enum PluginContainerError {
    #[error("duplicate entry in plugin registry")]
    DuplicateEntry,
    #[error("plugin container is not loaded")]
    Unloaded,
    #[error("plugin errors: {0:?}")]
    PluginErrorMap(HashMap<String, PluginError>),
}

pub struct PluginContainer {
    loaded: bool,
    collected_routes: Vec<Router>,
    plugins: Vec<Box<dyn Plugin>>,
}

impl PluginContainer {
    /// Instantiate a container over the given plugins
    pub fn new(plugins: Vec<Box<dyn Plugin>>) -> Self {
        Self {
            loaded: false,
            collected_routes: vec![],
            plugins,
        }
    }

    /// Search plugin based on name string
    pub fn find_plugin(&self, name: &str) -> Option<usize> {
        self.plugins.iter().position(|plugin| name == plugin.name())
    }

    /// Load referenced plugins
    ///
    /// This entails mounting them and merging their routes internally (only
    /// upon successful initialization). An error is returned if plugins
    /// bearing the same name are found. Also, all plugins failing to be
    /// initialized are returned in a map with respectively raised errors.
    pub fn load(&mut self) -> Result<(), PluginContainerError> {
        tracing::debug!("loading plugin container");

        // Checking for duplicates
        let mut seen_names = HashSet::new();
        for plugin in self.plugins.iter() {
            if !seen_names.insert(plugin.name()) {
                tracing::error!("found duplicate entry in plugin registry: {}", plugin.name());
                return Err(PluginContainerError::DuplicateEntry);
            }
        }

        // Reset collection of routes
        self.collected_routes.clear();

        // Mount plugins and collect routes on successful status
        let mut errors = HashMap::new();
        for plugin in self.plugins.iter_mut() {
            match plugin.mount().and_then(|_| plugin.routes()) {
                Ok(routes) => {
                    tracing::info!("mounted plugin {}", plugin.name());
                    self.collected_routes.push(routes);
                }
                Err(err) => {
                    tracing::error!("error mounting plugin {}: {err}", plugin.name());
                    errors.insert(plugin.name().to_string(), err);
                }
            }
        }

        // Flag as loaded
        self.loaded = true;

        // Return state of completion
        if errors.is_empty() {
            tracing::debug!("plugin container loaded");
            Ok(())
        } else {
            Err(PluginContainerError::PluginErrorMap(errors))
        }
    }

    /// Unmount all plugins, collecting the errors they raise.
    pub fn unload(&mut self) -> Result<(), PluginContainerError> {
        if !self.loaded {
            return Err(PluginContainerError::Unloaded);
        }

        let errors: HashMap<_, _> = self
            .plugins
            .iter()
            .filter_map(|plugin| match plugin.unmount() {
                Ok(_) => {
                    tracing::info!("unmounted plugin {}", plugin.name());
                    None
                }
                Err(err) => {
                    tracing::error!("error unmounting plugin {}: {err}", plugin.name());
                    Some((plugin.name().to_string(), err))
                }
            })
            .collect();

        self.collected_routes.clear();
        self.loaded = false;

        if errors.is_empty() {
            Ok(())
        } else {
            Err(PluginContainerError::PluginErrorMap(errors))
        }
    }

    /// Merge collected routes from all plugins successfully initialized.
    pub fn routes(&self) -> Result<Router, PluginContainerError> {
        if self.loaded {
            Ok(self
                .collected_routes
                .iter()
                .fold(Router::new(), |acc, e| acc.merge(e.clone())))
        } else {
            Err(PluginContainerError::Unloaded)
        }
    }
}
