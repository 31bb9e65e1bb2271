use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use donorway_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_key: &str| {
        field_source(key_path, env_key, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "database.url",
        &config.database.url,
        source("database.url", "DONORWAY_DATABASE_URL"),
    ));
    lines.push(render_line(
        "database.max_connections",
        &config.database.max_connections.to_string(),
        source("database.max_connections", "DONORWAY_DATABASE_MAX_CONNECTIONS"),
    ));
    lines.push(render_line(
        "database.timeout_secs",
        &config.database.timeout_secs.to_string(),
        source("database.timeout_secs", "DONORWAY_DATABASE_TIMEOUT_SECS"),
    ));

    lines.push(render_line(
        "server.bind_address",
        &config.server.bind_address,
        source("server.bind_address", "DONORWAY_SERVER_BIND_ADDRESS"),
    ));
    lines.push(render_line(
        "server.port",
        &config.server.port.to_string(),
        source("server.port", "DONORWAY_SERVER_PORT"),
    ));

    let admin_token = redact_token(config.auth.admin_token.expose_secret());
    lines.push(render_line(
        "auth.admin_token",
        &admin_token,
        source("auth.admin_token", "DONORWAY_AUTH_ADMIN_TOKEN"),
    ));
    let staff_token = if config.auth.staff_token.is_some() { "<redacted>" } else { "<unset>" };
    lines.push(render_line(
        "auth.staff_token",
        staff_token,
        source("auth.staff_token", "DONORWAY_AUTH_STAFF_TOKEN"),
    ));

    lines.push(render_line(
        "llm.base_url",
        &config.llm.base_url,
        source("llm.base_url", "DONORWAY_LLM_BASE_URL"),
    ));
    lines.push(render_line("llm.model", &config.llm.model, source("llm.model", "DONORWAY_LLM_MODEL")));
    let llm_api_key = if config.llm.api_key.is_some() { "<redacted>" } else { "<unset>" };
    lines.push(render_line(
        "llm.api_key",
        llm_api_key,
        source("llm.api_key", "DONORWAY_LLM_API_KEY"),
    ));

    let voice_api_key = if config.voice.api_key.is_some() { "<redacted>" } else { "<unset>" };
    lines.push(render_line(
        "voice.api_key",
        voice_api_key,
        source("voice.api_key", "DONORWAY_VOICE_API_KEY"),
    ));
    let webhook_secret = if config.voice.webhook_secret.is_some() { "<redacted>" } else { "<unset>" };
    lines.push(render_line(
        "voice.webhook_secret",
        webhook_secret,
        source("voice.webhook_secret", "DONORWAY_VOICE_WEBHOOK_SECRET"),
    ));
    lines.push(render_line(
        "voice.webhook_base_url",
        config.voice.webhook_base_url.as_deref().unwrap_or("<unset>"),
        source("voice.webhook_base_url", "DONORWAY_VOICE_WEBHOOK_BASE_URL"),
    ));
    lines.push(render_line(
        "voice.agent_name",
        &config.voice.agent_name,
        source("voice.agent_name", "DONORWAY_VOICE_AGENT_NAME"),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", "DONORWAY_LOGGING_LEVEL"),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        source("logging.format", "DONORWAY_LOGGING_FORMAT"),
    ));

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from("donorway.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/donorway.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: &str,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if env::var_os(env_key).is_some() {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('-') {
        return format!("{prefix}-***");
    }

    "<redacted>".to_string()
}
