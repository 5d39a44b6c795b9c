use super::web;
use axum::Router;
use plugin_api::{Plugin, PluginError};
use serde_json::Value;
use std::sync::Arc;

#[derive(Clone, Debug, Default)]
pub struct DidEndpointOptions {
    /// Create the host identifier on first request instead of answering 404
    pub create_missing_identifier: bool,
    /// Services listed ahead of the identifier's own
    pub services: Vec<Value>,
}

pub struct DidEndpoint {
    options: Arc<DidEndpointOptions>,
}

impl DidEndpoint {
    pub fn new(options: DidEndpointOptions) -> Self {
        Self {
            options: Arc::new(options),
        }
    }
}

impl Plugin for DidEndpoint {
    fn name(&self) -> &'static str {
        "did_endpoint"
    }

    fn mount(&mut self) -> Result<(), PluginError> {
        if let Some(service) = self
            .options
            .services
            .iter()
            .find(|service| service.get("id").and_then(Value::as_str).is_none())
        {
            return Err(PluginError::InitError(format!(
                "service without an id: {service}"
            )));
        }

        Ok(())
    }

    fn unmount(&self) -> Result<(), PluginError> {
        Ok(())
    }

    fn routes(&self) -> Result<Router, PluginError> {
        Ok(web::routes(self.options.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn mount_rejects_services_without_id() {
        let mut plugin = DidEndpoint::new(DidEndpointOptions {
            create_missing_identifier: true,
            services: vec![json!({ "type": "LinkedDomains", "serviceEndpoint": "https://example.com" })],
        });

        assert!(matches!(plugin.mount(), Err(PluginError::InitError(_))));
    }

    #[test]
    fn mounts_with_defaults() {
        let mut plugin = DidEndpoint::new(DidEndpointOptions::default());

        assert!(plugin.mount().is_ok());
        assert!(plugin.routes().is_ok());
    }
}
