use did_agent_server::{app, AppConfig};
use eyre::Result;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::Level;
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load dotenv-flow variables
    dotenv_flow::dotenv_flow().ok();

    // Enable logging
    config_tracing();

    let config = AppConfig::from_env()?;
    tracing::debug!("{config:?}");

    // Load plugins
    let (mut plugin_container, router) = app(&config)?;

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("listening on {addr}");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Err(err) = plugin_container.unload() {
        tracing::error!("{err}");
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("could not listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }

    tracing::info!("shutting down gracefully");
}

fn config_tracing() {
    let level = std::env::var("LOG_LEVEL")
        .ok()
        .and_then(|level| level.parse().ok())
        .unwrap_or(Level::DEBUG);

    let filter = filter::Targets::new()
        .with_target("hyper::proto", Level::INFO)
        .with_target("tower_http::trace", Level::DEBUG)
        .with_default(level);

    let registry = tracing_subscriber::registry();

    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => registry
            .with(tracing_subscriber::fmt::layer().json())
            .with(filter)
            .init(),
        _ => registry
            .with(tracing_subscriber::fmt::layer())
            .with(filter)
            .init(),
    }
}
