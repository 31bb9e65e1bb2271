//! Phone-intake webhook.
//!
//! The voice provider posts call lifecycle events here. Only `call_ended`
//! does any work: the transcript is run through the extraction tool, the
//! named partner is resolved, and a draft donor plus its transcript row are
//! created. Notification delivery is best effort and never fails the call.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use donorway_core::domain::donor::{Donor, DonorId, DonorStatus, IntakeMethod};
use donorway_core::domain::notification::{Notification, NotificationId};
use donorway_core::domain::transcript::{CallTranscript, TranscriptId};
use donorway_core::errors::ApiErrorKind;
use donorway_core::extraction::{
    build_transcript_text, extraction_prompt, extraction_tool, parse_extraction, TranscriptTurn,
    SYSTEM_PROMPT,
};
use donorway_db::repositories::{
    DonorRepository, NotificationRepository, PartnerRepository, SqlDonorRepository,
    SqlNotificationRepository, SqlPartnerRepository, SqlTranscriptRepository,
    TranscriptRepository,
};
use donorway_db::DbPool;
use donorway_llm::{ChatGateway, ChatRequest};
use donorway_voice::WEBHOOK_SIGNATURE_HEADER;

use crate::api::{api_error, gateway_failure, partner_not_found, persistence_failure, ApiFailure};

#[derive(Clone)]
pub struct IntakeState {
    db_pool: DbPool,
    gateway: Arc<dyn ChatGateway>,
    model: String,
    webhook_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    pub event: String,
    pub call: CallPayload,
}

#[derive(Debug, Deserialize)]
pub struct CallPayload {
    pub call_id: String,
    #[serde(default)]
    pub transcript: Option<String>,
    #[serde(default)]
    pub transcript_object: Option<Vec<TranscriptTurn>>,
    #[serde(default)]
    pub from_number: Option<String>,
    #[serde(default)]
    pub start_timestamp: Option<i64>,
    #[serde(default)]
    pub end_timestamp: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub donor_id: Option<String>,
}

pub fn router(
    db_pool: DbPool,
    gateway: Arc<dyn ChatGateway>,
    model: String,
    webhook_secret: Option<String>,
) -> Router {
    let state = IntakeState { db_pool, gateway, model, webhook_secret };
    Router::new().route("/api/v1/intake/webhook", post(handle_webhook)).with_state(state)
}

fn verify_signature(headers: &HeaderMap, secret: &Option<String>) -> Result<(), ApiFailure> {
    let Some(expected) = secret else {
        return Err(api_error(ApiErrorKind::Unauthorized, "webhook secret not configured"));
    };
    let presented = headers
        .get(WEBHOOK_SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if presented != expected {
        return Err(api_error(ApiErrorKind::Unauthorized, "invalid webhook signature"));
    }
    Ok(())
}

// Timestamps arrive as unix milliseconds.
fn call_duration_seconds(call: &CallPayload) -> Option<i64> {
    match (call.start_timestamp, call.end_timestamp) {
        (Some(start), Some(end)) if end >= start => Some((end - start) / 1000),
        _ => None,
    }
}

async fn handle_webhook(
    State(state): State<IntakeState>,
    headers: HeaderMap,
    Json(payload): Json<WebhookPayload>,
) -> Result<(StatusCode, Json<WebhookResponse>), ApiFailure> {
    verify_signature(&headers, &state.webhook_secret)?;

    if payload.event != "call_ended" {
        return Ok((StatusCode::OK, Json(WebhookResponse { success: true, donor_id: None })));
    }

    let call = payload.call;
    let transcript_text = build_transcript_text(
        call.transcript_object.as_deref(),
        call.transcript.as_deref(),
    )
    .ok_or_else(|| {
        api_error(ApiErrorKind::NoTranscript, format!("call `{}` has no transcript", call.call_id))
    })?;

    let request = ChatRequest {
        model: state.model.clone(),
        system_prompt: SYSTEM_PROMPT.to_string(),
        user_prompt: extraction_prompt(&transcript_text),
        tool: extraction_tool(),
    };
    let arguments =
        state.gateway.forced_tool_call(&request).await.map_err(|e| gateway_failure(&e))?;
    let extracted = parse_extraction(&arguments).map_err(|e| {
        api_error(ApiErrorKind::UpstreamMalformed, format!("unusable extraction: {e}"))
    })?;

    let partners = SqlPartnerRepository::new(state.db_pool.clone());
    let partner = partners
        .find_active_by_slug(&extracted.partner_code)
        .await
        .map_err(|e| persistence_failure(&e))?
        .ok_or_else(|| partner_not_found(&extracted.partner_code))?;

    let now = Utc::now();
    let donor = Donor {
        id: DonorId(Uuid::new_v4().to_string()),
        partner_id: partner.id.clone(),
        status: DonorStatus::Draft,
        intake_method: IntakeMethod::Phone,
        full_name: extracted.full_name,
        date_of_birth: extracted.date_of_birth,
        age_years: None,
        sex: extracted.sex,
        blood_type: extracted.blood_type,
        tissue_type: extracted.tissue_type,
        tissue_condition: extracted.tissue_condition,
        cause_of_death: extracted.cause_of_death,
        date_of_death: extracted.date_of_death,
        consent_obtained: None,
        notes: None,
        created_at: now,
        updated_at: now,
    };
    let donors = SqlDonorRepository::new(state.db_pool.clone());
    donors.save(donor.clone()).await.map_err(|e| persistence_failure(&e))?;

    let transcript = CallTranscript {
        id: TranscriptId(Uuid::new_v4().to_string()),
        donor_id: donor.id.clone(),
        partner_id: partner.id.clone(),
        call_id: call.call_id.clone(),
        transcript_text,
        duration_seconds: call_duration_seconds(&call),
        caller_number: call.from_number.clone(),
        extracted_data: arguments,
        created_at: now,
    };
    let transcripts = SqlTranscriptRepository::new(state.db_pool.clone());
    transcripts.insert(transcript).await.map_err(|e| persistence_failure(&e))?;

    notify_partner(&state.db_pool, &partner.id.0, &donor).await;

    info!(
        event_name = "intake.call_processed",
        call_id = %call.call_id,
        donor_id = %donor.id,
        partner_slug = %partner.slug,
        "phone intake created a draft donor"
    );

    Ok((StatusCode::OK, Json(WebhookResponse { success: true, donor_id: Some(donor.id.0) })))
}

// Failures are logged and swallowed; the donor and transcript already exist.
async fn notify_partner(pool: &DbPool, partner_id: &str, donor: &Donor) {
    let name = donor.full_name.as_deref().unwrap_or("an unnamed donor");
    let notification = Notification {
        id: NotificationId(Uuid::new_v4().to_string()),
        recipient: format!("partner:{partner_id}"),
        donor_id: Some(donor.id.clone()),
        title: "New phone intake".to_string(),
        body: format!("A draft donor record for {name} was created from a phone call."),
        is_read: false,
        created_at: Utc::now(),
    };
    let notifications = SqlNotificationRepository::new(pool.clone());
    if let Err(e) = notifications.insert(notification).await {
        warn!(
            event_name = "intake.notification_failed",
            donor_id = %donor.id,
            error = %e,
            "could not record intake notification"
        );
    }
}
