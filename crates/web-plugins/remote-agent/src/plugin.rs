use axum::Router;
use plugin_api::{Plugin, PluginError};

use crate::{
    dispatch::{self, AgentRouterOptions},
    schema::{self, ApiSchemaOptions},
};

#[derive(Clone, Debug, Default)]
pub struct RemoteAgentOptions {
    pub base_path: String,
    pub exposed_methods: Vec<String>,
    pub api_key: String,
    pub security_scheme: Option<String>,
    pub api_name: Option<String>,
    pub api_version: Option<String>,
}

/// Serves the agent methods and their schema under one base path.
pub struct RemoteAgentPlugin {
    options: RemoteAgentOptions,
    mounted: bool,
}

impl RemoteAgentPlugin {
    pub fn new(options: RemoteAgentOptions) -> Self {
        Self {
            options,
            mounted: false,
        }
    }
}

impl Plugin for RemoteAgentPlugin {
    fn name(&self) -> &'static str {
        "remote_agent"
    }

    fn mount(&mut self) -> Result<(), PluginError> {
        if self.options.api_key.is_empty() {
            return Err(PluginError::InitError(
                "an API key is required to expose agent methods".to_owned(),
            ));
        }

        if !self.options.base_path.starts_with('/') {
            return Err(PluginError::InitError(format!(
                "base path must start with '/': {}",
                self.options.base_path
            )));
        }

        tracing::debug!(
            "exposing {} agent methods under {}",
            self.options.exposed_methods.len(),
            self.options.base_path
        );
        self.mounted = true;

        Ok(())
    }

    fn unmount(&self) -> Result<(), PluginError> {
        Ok(())
    }

    fn routes(&self) -> Result<Router, PluginError> {
        if !self.mounted {
            return Err(PluginError::Other(
                "plugin not mounted, no routes to serve".to_owned(),
            ));
        }

        let options = &self.options;
        let agent_routes = dispatch::routes(&AgentRouterOptions {
            base_path: options.base_path.clone(),
            exposed_methods: options.exposed_methods.clone(),
            api_key: Some(options.api_key.clone()),
        });
        let schema_routes = schema::routes(ApiSchemaOptions {
            base_path: options.base_path.clone(),
            exposed_methods: Some(options.exposed_methods.clone()),
            security_scheme: options.security_scheme.clone(),
            api_name: options.api_name.clone(),
            api_version: options.api_version.clone(),
        });

        Ok(agent_routes.merge(schema_routes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> RemoteAgentOptions {
        RemoteAgentOptions {
            base_path: "/api".to_owned(),
            exposed_methods: vec!["resolveDid".to_owned()],
            api_key: "secret".to_owned(),
            ..Default::default()
        }
    }

    #[test]
    fn routes_require_mounting() {
        let mut plugin = RemoteAgentPlugin::new(options());
        assert!(plugin.routes().is_err());

        plugin.mount().unwrap();
        assert!(plugin.routes().is_ok());
    }

    #[test]
    fn mount_rejects_missing_api_key() {
        let mut plugin = RemoteAgentPlugin::new(RemoteAgentOptions {
            api_key: String::new(),
            ..options()
        });

        assert!(matches!(plugin.mount(), Err(PluginError::InitError(_))));
    }

    #[test]
    fn mount_rejects_relative_base_path() {
        let mut plugin = RemoteAgentPlugin::new(RemoteAgentOptions {
            base_path: "api".to_owned(),
            ..options()
        });

        assert!(matches!(plugin.mount(), Err(PluginError::InitError(_))));
    }
}
