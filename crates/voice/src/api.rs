//! Client for the telephony provider's management API.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

/// Header the provider signs inbound webhooks with. The value must equal
/// the configured shared secret exactly.
pub const WEBHOOK_SIGNATURE_HEADER: &str = "x-retell-signature";

const DEFAULT_BASE_URL: &str = "https://api.retellai.com";

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct VoiceAgent {
    pub agent_id: String,
    pub agent_name: Option<String>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct VoicePhoneNumber {
    pub phone_number: String,
    pub agent_id: Option<String>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct WebCallSession {
    pub call_id: String,
    pub access_token: String,
}

#[derive(Debug, Error)]
pub enum VoiceError {
    #[error("voice provider is not configured: {0}")]
    NotConfigured(String),
    #[error("voice provider failure (status {status}): {detail}")]
    Upstream { status: u16, detail: String },
    #[error("malformed voice provider response: {0}")]
    Malformed(String),
    #[error("transport error: {0}")]
    Transport(String),
}

#[async_trait]
pub trait VoiceApi: Send + Sync {
    async fn list_agents(&self) -> Result<Vec<VoiceAgent>, VoiceError>;
    async fn list_phone_numbers(&self) -> Result<Vec<VoicePhoneNumber>, VoiceError>;
    /// Creates a reasoning backend for an agent, returning its id.
    async fn create_llm(&self, prompt: &str) -> Result<String, VoiceError>;
    async fn create_agent(
        &self,
        agent_name: &str,
        llm_id: &str,
        webhook_url: &str,
    ) -> Result<VoiceAgent, VoiceError>;
    async fn create_phone_number(&self, agent_id: &str)
        -> Result<VoicePhoneNumber, VoiceError>;
    /// Mints a short-lived browser call session for the agent.
    async fn create_web_call(&self, agent_id: &str) -> Result<WebCallSession, VoiceError>;
}

pub struct HttpVoiceApi {
    client: reqwest::Client,
    base_url: String,
    api_key: SecretString,
}

impl HttpVoiceApi {
    pub fn new(api_key: SecretString) -> Result<Self, VoiceError> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.to_string())
    }

    pub fn with_base_url(api_key: SecretString, base_url: String) -> Result<Self, VoiceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| VoiceError::Transport(e.to_string()))?;

        Ok(Self { client, base_url: base_url.trim_end_matches('/').to_string(), api_key })
    }

    async fn get(&self, path: &str) -> Result<Value, VoiceError> {
        let response = self
            .client
            .get(format!("{}{path}", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .send()
            .await
            .map_err(|e| VoiceError::Transport(e.to_string()))?;
        Self::decode(response).await
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value, VoiceError> {
        let response = self
            .client
            .post(format!("{}{path}", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| VoiceError::Transport(e.to_string()))?;
        Self::decode(response).await
    }

    async fn decode(response: reqwest::Response) -> Result<Value, VoiceError> {
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(VoiceError::Upstream { status: status.as_u16(), detail });
        }
        response.json().await.map_err(|e| VoiceError::Malformed(e.to_string()))
    }
}

fn decode_list<T: serde::de::DeserializeOwned>(body: Value, what: &str) -> Result<Vec<T>, VoiceError> {
    serde_json::from_value(body).map_err(|e| VoiceError::Malformed(format!("{what}: {e}")))
}

#[async_trait]
impl VoiceApi for HttpVoiceApi {
    async fn list_agents(&self) -> Result<Vec<VoiceAgent>, VoiceError> {
        let body = self.get("/list-agents").await?;
        decode_list(body, "agent list")
    }

    async fn list_phone_numbers(&self) -> Result<Vec<VoicePhoneNumber>, VoiceError> {
        let body = self.get("/list-phone-numbers").await?;
        decode_list(body, "phone number list")
    }

    async fn create_llm(&self, prompt: &str) -> Result<String, VoiceError> {
        let body = self
            .post("/create-retell-llm", json!({ "general_prompt": prompt }))
            .await?;
        body.get("llm_id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| VoiceError::Malformed("create-llm response has no llm_id".to_string()))
    }

    async fn create_agent(
        &self,
        agent_name: &str,
        llm_id: &str,
        webhook_url: &str,
    ) -> Result<VoiceAgent, VoiceError> {
        let body = self
            .post(
                "/create-agent",
                json!({
                    "agent_name": agent_name,
                    "response_engine": { "type": "retell-llm", "llm_id": llm_id },
                    "webhook_url": webhook_url,
                    "voice_id": "11labs-Adrian"
                }),
            )
            .await?;
        serde_json::from_value(body).map_err(|e| VoiceError::Malformed(format!("agent: {e}")))
    }

    async fn create_phone_number(
        &self,
        agent_id: &str,
    ) -> Result<VoicePhoneNumber, VoiceError> {
        let body = self
            .post("/create-phone-number", json!({ "inbound_agent_id": agent_id }))
            .await?;
        serde_json::from_value(body)
            .map_err(|e| VoiceError::Malformed(format!("phone number: {e}")))
    }

    async fn create_web_call(&self, agent_id: &str) -> Result<WebCallSession, VoiceError> {
        let body = self.post("/v2/create-web-call", json!({ "agent_id": agent_id })).await?;
        serde_json::from_value(body)
            .map_err(|e| VoiceError::Malformed(format!("web call session: {e}")))
    }
}
