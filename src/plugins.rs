pub(crate) mod handler;
#[cfg(feature = "plugin-index")]
pub(crate) mod index;

pub use handler::{PluginContainer, PluginContainerError};

use plugin_api::Plugin;

use crate::AppConfig;

/// Base path of the agent methods and their schema.
pub const API_BASE_PATH: &str = "/api";

/// Plugins enabled by the build features, configured from `config`.
pub(crate) fn registry(config: &AppConfig) -> Vec<Box<dyn Plugin>> {
    let mut plugins: Vec<Box<dyn Plugin>> = Vec::new();

    #[cfg(feature = "plugin-index")]
    plugins.push(Box::new(index::IndexPlugin::new(
        &config.default_did_provider,
    )));

    #[cfg(feature = "plugin-remote_agent")]
    plugins.push(Box::new(remote_agent::RemoteAgentPlugin::new(
        remote_agent::RemoteAgentOptions {
            base_path: API_BASE_PATH.to_owned(),
            exposed_methods: config.exposed_methods.clone(),
            api_key: config.api_key.clone(),
            security_scheme: config.api_security_scheme.clone(),
            api_name: None,
            api_version: None,
        },
    )));

    #[cfg(feature = "plugin-did_endpoint")]
    plugins.push(Box::new(did_endpoint::DidEndpoint::new(
        did_endpoint::DidEndpointOptions {
            create_missing_identifier: config.web_did_create_missing,
            services: vec![],
        },
    )));

    plugins
}
