//! Admin endpoints for the phone-intake voice stack.
//!
//! All three routes require the admin credential. When the deployment has no
//! voice API key, the handlers report that plainly instead of failing deep in
//! an HTTP client.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tracing::info;

use donorway_core::errors::ApiErrorKind;
use donorway_voice::{
    intake_status, mint_web_call, provision_intake_agent, IntakeStatus, ProvisionOutcome,
    VoiceApi, VoiceError,
};

use crate::api::{api_error, ApiFailure};
use crate::auth::{require_role, Role};

#[derive(Clone)]
pub struct VoiceState {
    voice: Option<Arc<dyn VoiceApi>>,
    auth: donorway_core::config::AuthConfig,
    agent_name: String,
    webhook_base_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WebCallResponse {
    pub call_id: String,
    pub access_token: String,
}

pub fn router(
    voice: Option<Arc<dyn VoiceApi>>,
    auth: donorway_core::config::AuthConfig,
    agent_name: String,
    webhook_base_url: Option<String>,
) -> Router {
    let state = VoiceState { voice, auth, agent_name, webhook_base_url };
    Router::new()
        .route("/api/v1/voice/status", get(status))
        .route("/api/v1/voice/setup", post(setup))
        .route("/api/v1/voice/web-call", post(web_call))
        .with_state(state)
}

fn voice_api(state: &VoiceState) -> Result<&Arc<dyn VoiceApi>, ApiFailure> {
    state.voice.as_ref().ok_or_else(|| {
        api_error(ApiErrorKind::InvalidInput, "voice provider is not configured; set an API key")
    })
}

fn voice_failure(error: &VoiceError) -> ApiFailure {
    match error {
        VoiceError::NotConfigured(detail) => api_error(ApiErrorKind::NotFound, detail.clone()),
        VoiceError::Malformed(detail) => {
            api_error(ApiErrorKind::UpstreamMalformed, format!("voice provider: {detail}"))
        }
        VoiceError::Upstream { status, detail } => api_error(
            ApiErrorKind::UpstreamFailure,
            format!("voice provider returned {status}: {detail}"),
        ),
        VoiceError::Transport(detail) => {
            api_error(ApiErrorKind::UpstreamFailure, format!("voice provider unreachable: {detail}"))
        }
    }
}

async fn status(
    State(state): State<VoiceState>,
    headers: HeaderMap,
) -> Result<Json<IntakeStatus>, ApiFailure> {
    require_role(&headers, &state.auth, Role::Admin)?;
    let api = voice_api(&state)?;
    let status =
        intake_status(api.as_ref(), &state.agent_name).await.map_err(|e| voice_failure(&e))?;
    Ok(Json(status))
}

async fn setup(
    State(state): State<VoiceState>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<ProvisionOutcome>), ApiFailure> {
    require_role(&headers, &state.auth, Role::Admin)?;
    let api = voice_api(&state)?;
    let base_url = state.webhook_base_url.as_deref().ok_or_else(|| {
        api_error(ApiErrorKind::InvalidInput, "webhook_base_url is not configured")
    })?;

    let outcome = provision_intake_agent(api.as_ref(), &state.agent_name, base_url)
        .await
        .map_err(|e| voice_failure(&e))?;

    info!(
        event_name = "voice.intake_provisioned",
        agent_id = %outcome.agent_id,
        phone_number = %outcome.phone_number,
        "intake agent provisioned"
    );

    Ok((StatusCode::CREATED, Json(outcome)))
}

async fn web_call(
    State(state): State<VoiceState>,
    headers: HeaderMap,
) -> Result<Json<WebCallResponse>, ApiFailure> {
    require_role(&headers, &state.auth, Role::Admin)?;
    let api = voice_api(&state)?;
    let session =
        mint_web_call(api.as_ref(), &state.agent_name).await.map_err(|e| voice_failure(&e))?;
    Ok(Json(WebCallResponse { call_id: session.call_id, access_token: session.access_token }))
}
