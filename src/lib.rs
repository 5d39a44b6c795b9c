pub mod config;
pub mod plugins;

pub use config::{AppConfig, AppConfigError};

use axum::{http::request::Parts, Router};
use eyre::{eyre, Result};
use futures::FutureExt;
use identity_agent::{AgentOptions, KvAgentFactory};
use keystore::SecretBox;
use kv_store::{FileNamespace, KvNamespace, MemoryNamespace};
use plugins::handler::PluginContainer;
use remote_agent::{with_request_agent, AgentFactory, RequestAgentOptions};
use std::sync::Arc;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};

/// Build the plugin container and the router serving it.
///
/// Every request gets its own agent over a fresh load of the identity
/// state, so the namespace is the only state shared between requests.
pub fn app(config: &AppConfig) -> Result<(PluginContainer, Router)> {
    let namespace: Arc<dyn KvNamespace> = match &config.storage_dirpath {
        Some(dirpath) => {
            tracing::info!("storing identity state under {}", dirpath.display());
            Arc::new(FileNamespace::new(dirpath)?)
        }
        None => {
            tracing::warn!("STORAGE_DIRPATH not set, identity state is kept in memory");
            Arc::new(MemoryNamespace::new())
        }
    };

    let factory = KvAgentFactory::new(
        namespace,
        AgentOptions {
            encryption: Arc::new(SecretBox::from_hex(&config.kms_secret_key)?),
            default_provider: config.default_did_provider.clone(),
        },
    );
    let agent_factory: AgentFactory = Arc::new(move |_: &Parts| {
        let factory = factory.clone();
        async move { factory.create().await }.boxed()
    });

    let mut container = PluginContainer::new(plugins::registry(config));
    container.load().map_err(|e| eyre!(e))?;

    let router = with_request_agent(
        container.routes()?,
        RequestAgentOptions {
            agent: None,
            agent_factory: Some(agent_factory),
        },
    )?
    .layer(CorsLayer::permissive())
    .layer(TraceLayer::new_for_http())
    .layer(CatchPanicLayer::new());

    Ok((container, router))
}
