use crate::commands::CommandResult;
use donorway_core::config::{AppConfig, LoadOptions};
use donorway_db::connect;
use donorway_db::migrations::{self, AppliedMigration};

type StepFailure = (&'static str, String, u8);

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "migrate",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "migrate",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    match runtime.block_on(apply(&config)) {
        Ok(applied) => CommandResult::success("migrate", render_ledger(&applied)),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("migrate", error_class, message, exit_code)
        }
    }
}

async fn apply(config: &AppConfig) -> Result<Vec<AppliedMigration>, StepFailure> {
    let pool = connect(&config.database)
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

    let outcome = async {
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;
        migrations::applied(&pool)
            .await
            .map_err(|error| ("migration_ledger", error.to_string(), 5u8))
    }
    .await;

    pool.close().await;
    outcome
}

fn render_ledger(applied: &[AppliedMigration]) -> String {
    let names = applied
        .iter()
        .map(|m| format!("{:04} {}", m.version, m.description))
        .collect::<Vec<_>>()
        .join(", ");
    format!("database is up to date; {} migration(s) applied: {names}", applied.len())
}

#[cfg(test)]
mod tests {
    use donorway_db::migrations::AppliedMigration;

    use super::render_ledger;

    #[test]
    fn ledger_rendering_zero_pads_versions() {
        let applied =
            vec![AppliedMigration { version: 1, description: "baseline".to_string() }];
        assert_eq!(
            render_ledger(&applied),
            "database is up to date; 1 migration(s) applied: 0001 baseline"
        );
    }
}
