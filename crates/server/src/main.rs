mod api;
mod auth;
mod bootstrap;
mod health;
mod intake;
mod screening;
mod voice_admin;

use anyhow::Result;
use axum::Router;
use donorway_core::config::{AppConfig, LoadOptions};

fn init_logging(config: &AppConfig) {
    use donorway_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Load config and initialize logging before any other operations
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;

    let router = build_router(&app);
    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let grace = std::time::Duration::from_secs(app.config.server.graceful_shutdown_secs);
    let listener = tokio::net::TcpListener::bind(&address).await?;

    tracing::info!(
        event_name = "system.server.started",
        bind_address = %address,
        voice_configured = app.voice.is_some(),
        "donorway-server started"
    );

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
    });

    tokio::signal::ctrl_c().await?;
    tracing::info!(event_name = "system.server.stopping", "donorway-server stopping");
    let _ = shutdown_tx.send(());

    // Give in-flight requests the configured grace period, then exit anyway.
    match tokio::time::timeout(grace, server).await {
        Ok(result) => result??,
        Err(_) => {
            tracing::warn!(
                event_name = "system.server.shutdown_timeout",
                "grace period elapsed with requests still in flight"
            );
        }
    }

    Ok(())
}

fn build_router(app: &bootstrap::Application) -> Router {
    Router::new()
        .merge(health::router(app.db_pool.clone()))
        .merge(screening::router(
            app.db_pool.clone(),
            app.gateway.clone(),
            app.config.auth.clone(),
            app.config.llm.model.clone(),
        ))
        .merge(intake::router(
            app.db_pool.clone(),
            app.gateway.clone(),
            app.config.llm.model.clone(),
            app.config.voice.webhook_secret.clone(),
        ))
        .merge(voice_admin::router(
            app.voice.clone(),
            app.config.auth.clone(),
            app.config.voice.agent_name.clone(),
            app.config.voice.webhook_base_url.clone(),
        ))
}
