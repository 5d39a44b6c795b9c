mod web;

use axum::Router;
use plugin_api::{Plugin, PluginError};
use std::sync::Arc;

/// Serves the default identifier at `/`.
pub(crate) struct IndexPlugin {
    provider: Arc<str>,
}

impl IndexPlugin {
    pub(crate) fn new(provider: &str) -> Self {
        Self {
            provider: Arc::from(provider),
        }
    }
}

impl Plugin for IndexPlugin {
    fn name(&self) -> &'static str {
        "index"
    }

    fn mount(&mut self) -> Result<(), PluginError> {
        Ok(())
    }

    fn unmount(&self) -> Result<(), PluginError> {
        Ok(())
    }

    fn routes(&self) -> Result<Router, PluginError> {
        Ok(web::routes(self.provider.clone()))
    }
}
