use sqlx::migrate::{MigrateError, Migrator};

use crate::DbPool;

pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

pub async fn run_pending(pool: &DbPool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppliedMigration {
    pub version: i64,
    pub description: String,
}

/// Reads the migration ledger sqlx maintains, oldest first.
pub async fn applied(pool: &DbPool) -> Result<Vec<AppliedMigration>, sqlx::Error> {
    let rows: Vec<(i64, String)> =
        sqlx::query_as("SELECT version, description FROM _sqlx_migrations ORDER BY version")
            .fetch_all(pool)
            .await?;

    Ok(rows
        .into_iter()
        .map(|(version, description)| AppliedMigration { version, description })
        .collect())
}
