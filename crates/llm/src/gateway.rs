//! Chat-completion client that forces a single named tool call.
//!
//! Both screening and intake extraction speak the same wire shape: one
//! request, one forced function call, one JSON arguments object back. No
//! retries happen here; rate limits and quota exhaustion are surfaced as
//! distinct errors for the caller to report.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use thiserror::Error;

use donorway_core::tool::ToolSpec;

#[derive(Clone, Debug)]
pub struct ChatRequest {
    pub model: String,
    pub system_prompt: String,
    pub user_prompt: String,
    pub tool: ToolSpec,
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("provider rate limit hit; retry later")]
    RateLimited,
    #[error("provider quota exhausted; operator action required")]
    QuotaExhausted,
    #[error("malformed provider response: {0}")]
    Malformed(String),
    #[error("upstream failure (status {status}): {detail}")]
    Upstream { status: u16, detail: String },
    #[error("transport error: {0}")]
    Transport(String),
}

#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Issues one chat request and returns the forced tool call's parsed
    /// arguments object.
    async fn forced_tool_call(&self, request: &ChatRequest) -> Result<Value, GatewayError>;
}

pub struct HttpChatGateway {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<SecretString>,
}

impl HttpChatGateway {
    pub fn new(
        base_url: String,
        api_key: Option<SecretString>,
        timeout_secs: u64,
    ) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs.max(1)))
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        Ok(Self { client, base_url: base_url.trim_end_matches('/').to_string(), api_key })
    }

    fn request_body(request: &ChatRequest) -> Value {
        json!({
            "model": request.model,
            "messages": [
                { "role": "system", "content": request.system_prompt },
                { "role": "user", "content": request.user_prompt }
            ],
            "tools": [{
                "type": "function",
                "function": {
                    "name": request.tool.name,
                    "description": request.tool.description,
                    "parameters": request.tool.parameters
                }
            }],
            "tool_choice": {
                "type": "function",
                "function": { "name": request.tool.name }
            }
        })
    }
}

#[async_trait]
impl ChatGateway for HttpChatGateway {
    async fn forced_tool_call(&self, request: &ChatRequest) -> Result<Value, GatewayError> {
        let url = format!("{}/chat/completions", self.base_url);
        let mut builder = self.client.post(&url).json(&Self::request_body(request));
        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key.expose_secret());
        }

        let response =
            builder.send().await.map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                429 => GatewayError::RateLimited,
                402 => GatewayError::QuotaExhausted,
                code => GatewayError::Upstream { status: code, detail },
            });
        }

        let body: Value =
            response.json().await.map_err(|e| GatewayError::Malformed(e.to_string()))?;
        parse_tool_arguments(&body, request.tool.name)
    }
}

/// Pulls the forced tool call's arguments out of a chat-completion response.
/// The arguments field arrives as a JSON string and is parsed here.
pub fn parse_tool_arguments(body: &Value, tool_name: &str) -> Result<Value, GatewayError> {
    let tool_call = body
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("tool_calls"))
        .and_then(Value::as_array)
        .and_then(|calls| calls.first())
        .ok_or_else(|| GatewayError::Malformed("response contains no tool call".to_string()))?;

    let function = tool_call
        .get("function")
        .ok_or_else(|| GatewayError::Malformed("tool call has no function".to_string()))?;

    let name = function.get("name").and_then(Value::as_str).unwrap_or_default();
    if name != tool_name {
        return Err(GatewayError::Malformed(format!(
            "expected tool call `{tool_name}`, got `{name}`"
        )));
    }

    let arguments_raw = function
        .get("arguments")
        .and_then(Value::as_str)
        .ok_or_else(|| GatewayError::Malformed("tool call has no arguments".to_string()))?;

    serde_json::from_str(arguments_raw)
        .map_err(|e| GatewayError::Malformed(format!("unparsable tool arguments: {e}")))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{parse_tool_arguments, GatewayError};

    fn completion_response(name: &str, arguments: &str) -> serde_json::Value {
        json!({
            "choices": [{
                "message": {
                    "tool_calls": [{
                        "function": { "name": name, "arguments": arguments }
                    }]
                }
            }]
        })
    }

    #[test]
    fn parses_arguments_json_string() {
        let body = completion_response(
            "record_screening_evaluation",
            r#"{"verdict":"accept","confidence":0.9}"#,
        );

        let arguments = parse_tool_arguments(&body, "record_screening_evaluation").unwrap();
        assert_eq!(arguments["verdict"], "accept");
        assert_eq!(arguments["confidence"], 0.9);
    }

    #[test]
    fn missing_tool_call_is_malformed() {
        let body = json!({ "choices": [{ "message": { "content": "I cannot do that." } }] });

        assert!(matches!(
            parse_tool_arguments(&body, "record_screening_evaluation"),
            Err(GatewayError::Malformed(_))
        ));
    }

    #[test]
    fn wrong_tool_name_is_malformed() {
        let body = completion_response("something_else", "{}");

        assert!(matches!(
            parse_tool_arguments(&body, "record_screening_evaluation"),
            Err(GatewayError::Malformed(_))
        ));
    }

    #[test]
    fn unparsable_arguments_string_is_malformed() {
        let body = completion_response("record_screening_evaluation", "{not json");

        assert!(matches!(
            parse_tool_arguments(&body, "record_screening_evaluation"),
            Err(GatewayError::Malformed(_))
        ));
    }
}
