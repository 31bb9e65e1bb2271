use std::sync::Arc;

use donorway_core::config::{AppConfig, ConfigError, LoadOptions};
use donorway_db::{connect, migrations, DbPool};
use donorway_llm::{ChatGateway, GatewayError, HttpChatGateway};
use donorway_voice::{HttpVoiceApi, VoiceApi, VoiceError};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub gateway: Arc<dyn ChatGateway>,
    pub voice: Option<Arc<dyn VoiceApi>>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("language model gateway setup failed: {0}")]
    Gateway(#[source] GatewayError),
    #[error("voice provider setup failed: {0}")]
    Voice(#[source] VoiceError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let db_pool = connect(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(event_name = "system.bootstrap.database_connected", "database connection established");

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(event_name = "system.bootstrap.migrations_applied", "database migrations applied");

    let gateway: Arc<dyn ChatGateway> = Arc::new(
        HttpChatGateway::new(
            config.llm.base_url.clone(),
            config.llm.api_key.clone(),
            config.llm.timeout_secs,
        )
        .map_err(BootstrapError::Gateway)?,
    );

    // The voice stack is optional; a deployment without an API key still
    // serves intake webhooks and screening.
    let voice: Option<Arc<dyn VoiceApi>> = match config.voice.api_key.clone() {
        Some(api_key) => {
            let api = HttpVoiceApi::new(api_key).map_err(BootstrapError::Voice)?;
            Some(Arc::new(api) as Arc<dyn VoiceApi>)
        }
        None => {
            info!(
                event_name = "system.bootstrap.voice_disabled",
                "no voice API key configured; voice endpoints will report not configured"
            );
            None
        }
    };

    Ok(Application { config, db_pool, gateway, voice })
}

#[cfg(test)]
mod tests {
    use donorway_core::config::{ConfigOverrides, LoadOptions};

    use crate::bootstrap::bootstrap;

    fn valid_overrides(database_url: &str) -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some(database_url.to_string()),
                admin_token: Some("test-admin-token".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[tokio::test]
    async fn bootstrap_fails_fast_without_an_admin_token() {
        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("sqlite::memory:".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await;

        let message = result.err().expect("bootstrap should fail").to_string();
        assert!(message.contains("auth.admin_token"));
    }

    #[tokio::test]
    async fn bootstrap_applies_migrations_and_builds_the_gateway() {
        let app = bootstrap(valid_overrides("sqlite::memory:?cache=shared"))
            .await
            .expect("bootstrap should succeed with valid overrides");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master \
             WHERE type = 'table' AND name IN ('partner', 'donor', 'screening_guideline', \
             'screening_result', 'call_transcript', 'notification')",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("expected baseline tables to be available after bootstrap");
        assert_eq!(table_count, 6, "bootstrap should expose the baseline intake tables");

        assert!(app.voice.is_none(), "no API key means no voice client");

        app.db_pool.close().await;
    }
}
