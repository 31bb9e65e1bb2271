use std::env;
use std::sync::{Mutex, OnceLock};

use donorway_cli::commands::{migrate, seed};
use serde_json::Value;

#[test]
fn migrate_returns_success_with_valid_env() {
    with_env(
        &[
            ("DONORWAY_AUTH_ADMIN_TOKEN", "operator-token"),
            ("DONORWAY_DATABASE_URL", "sqlite::memory:"),
            ("DONORWAY_DATABASE_MAX_CONNECTIONS", "1"),
        ],
        || {
            let result = migrate::run();
            assert_eq!(result.exit_code, 0, "expected successful migrate run");

            let payload = parse_payload(&result.output);
            assert_eq!(payload["command"], "migrate");
            assert_eq!(payload["status"], "ok");

            let message = payload["message"].as_str().unwrap_or_default();
            assert!(
                message.contains("0001 baseline"),
                "migrate should report the applied ledger, got: {message}"
            );
        },
    );
}

#[test]
fn migrate_returns_config_failure_without_admin_token() {
    with_env(&[("DONORWAY_DATABASE_URL", "sqlite::memory:")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn seed_reports_fixture_counts() {
    with_env(
        &[
            ("DONORWAY_AUTH_ADMIN_TOKEN", "operator-token"),
            ("DONORWAY_DATABASE_URL", "sqlite::memory:"),
            ("DONORWAY_DATABASE_MAX_CONNECTIONS", "1"),
        ],
        || {
            let result = seed::run();
            assert_eq!(result.exit_code, 0, "expected successful seed run");

            let payload = parse_payload(&result.output);
            assert_eq!(payload["command"], "seed");
            assert_eq!(payload["status"], "ok");

            let message = payload["message"].as_str().unwrap_or("");
            assert!(message.contains("2 partners"));
            assert!(message.contains("3 screening guidelines"));
        },
    );
}

#[test]
fn seed_is_idempotent_across_runs() {
    with_env(
        &[
            ("DONORWAY_AUTH_ADMIN_TOKEN", "operator-token"),
            ("DONORWAY_DATABASE_URL", "sqlite::memory:"),
            ("DONORWAY_DATABASE_MAX_CONNECTIONS", "1"),
        ],
        || {
            let first = seed::run();
            assert_eq!(first.exit_code, 0, "expected first seed invocation success");
            let second = seed::run();
            assert_eq!(second.exit_code, 0, "expected second seed invocation success");

            let first_payload = parse_payload(&first.output);
            let second_payload = parse_payload(&second.output);
            assert_eq!(first_payload["message"], second_payload["message"]);
        },
    );
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "DONORWAY_DATABASE_URL",
        "DONORWAY_DATABASE_MAX_CONNECTIONS",
        "DONORWAY_DATABASE_TIMEOUT_SECS",
        "DONORWAY_SERVER_BIND_ADDRESS",
        "DONORWAY_SERVER_PORT",
        "DONORWAY_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "DONORWAY_AUTH_ADMIN_TOKEN",
        "DONORWAY_AUTH_STAFF_TOKEN",
        "DONORWAY_LLM_BASE_URL",
        "DONORWAY_LLM_API_KEY",
        "DONORWAY_LLM_MODEL",
        "DONORWAY_LLM_TIMEOUT_SECS",
        "DONORWAY_VOICE_API_KEY",
        "DONORWAY_VOICE_WEBHOOK_SECRET",
        "DONORWAY_VOICE_WEBHOOK_BASE_URL",
        "DONORWAY_VOICE_AGENT_NAME",
        "DONORWAY_LOGGING_LEVEL",
        "DONORWAY_LOGGING_FORMAT",
        "DONORWAY_LOG_LEVEL",
        "DONORWAY_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, previous) in previous_values {
        match previous {
            Some(value) => env::set_var(key, value),
            None => env::remove_var(key),
        }
    }
}
