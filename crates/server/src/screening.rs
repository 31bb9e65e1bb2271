//! On-demand donor screening endpoints.
//!
//! `POST /api/v1/screening` runs one evaluation and persists the outcome;
//! `GET /api/v1/screening/{donor_id}` lists prior results, newest first.
//! A run never mutates the donor itself; the verdict is advisory.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use donorway_core::domain::donor::DonorId;
use donorway_core::domain::screening::{ScreeningResult, ScreeningResultId};
use donorway_core::errors::ApiErrorKind;
use donorway_core::screening::{
    compose_policy_document, donor_profile, evaluation_prompt, evaluation_tool, parse_evaluation,
    snapshot_json, GuidelineSection, SYSTEM_PROMPT,
};
use donorway_core::config::AuthConfig;
use donorway_db::repositories::{
    DonorRepository, GuidelineRepository, PartnerRepository, ScreeningResultRepository,
    SqlDonorRepository, SqlGuidelineRepository, SqlPartnerRepository,
    SqlScreeningResultRepository,
};
use donorway_db::DbPool;
use donorway_llm::{ChatGateway, ChatRequest};

use crate::api::{api_error, gateway_failure, persistence_failure, ApiFailure};
use crate::auth::{require_role, Role};

pub const MODEL_VERSION: &str = "donorway-screening-v1";

#[derive(Clone)]
pub struct ScreeningState {
    db_pool: DbPool,
    gateway: Arc<dyn ChatGateway>,
    auth: AuthConfig,
    model: String,
}

#[derive(Debug, Deserialize)]
pub struct RunScreeningRequest {
    pub donor_id: String,
}

pub fn router(
    db_pool: DbPool,
    gateway: Arc<dyn ChatGateway>,
    auth: AuthConfig,
    model: String,
) -> Router {
    let state = ScreeningState { db_pool, gateway, auth, model };
    Router::new()
        .route("/api/v1/screening", post(run_screening))
        .route("/api/v1/screening/{donor_id}", get(list_screenings))
        .with_state(state)
}

async fn run_screening(
    State(state): State<ScreeningState>,
    headers: HeaderMap,
    Json(request): Json<RunScreeningRequest>,
) -> Result<(StatusCode, Json<ScreeningResult>), ApiFailure> {
    require_role(&headers, &state.auth, Role::Admin)?;

    let donor_id = request.donor_id.trim();
    if donor_id.is_empty() {
        return Err(api_error(ApiErrorKind::InvalidInput, "donor_id is required"));
    }

    let donors = SqlDonorRepository::new(state.db_pool.clone());
    let donor = donors
        .find_by_id(&DonorId(donor_id.to_string()))
        .await
        .map_err(|e| persistence_failure(&e))?
        .ok_or_else(|| api_error(ApiErrorKind::NotFound, format!("donor `{donor_id}` not found")))?;

    let partners = SqlPartnerRepository::new(state.db_pool.clone());
    let partner_name = partners
        .find_by_id(&donor.partner_id)
        .await
        .map_err(|e| persistence_failure(&e))?
        .map(|partner| partner.name)
        .unwrap_or_else(|| "unknown partner".to_string());

    let guidelines = SqlGuidelineRepository::new(state.db_pool.clone());
    let sections: Vec<GuidelineSection> = guidelines
        .list_active()
        .await
        .map_err(|e| persistence_failure(&e))?
        .iter()
        .map(GuidelineSection::from)
        .collect();

    let policy_document = compose_policy_document(&sections);
    let profile = donor_profile(&donor, &partner_name);
    let request = ChatRequest {
        model: state.model.clone(),
        system_prompt: SYSTEM_PROMPT.to_string(),
        user_prompt: evaluation_prompt(&policy_document, &profile),
        tool: evaluation_tool(),
    };

    let arguments =
        state.gateway.forced_tool_call(&request).await.map_err(|e| gateway_failure(&e))?;
    let evaluation = parse_evaluation(&arguments).map_err(|e| {
        api_error(ApiErrorKind::UpstreamMalformed, format!("unusable evaluation: {e}"))
    })?;

    let result = ScreeningResult {
        id: ScreeningResultId(Uuid::new_v4().to_string()),
        donor_id: donor.id.clone(),
        verdict: evaluation.verdict,
        confidence: evaluation.confidence,
        reasoning: evaluation.reasoning,
        concerns: evaluation.concerns,
        missing_data: evaluation.missing_data,
        guidelines_snapshot: snapshot_json(&sections),
        model_version: MODEL_VERSION.to_string(),
        created_at: Utc::now(),
    };

    let results = SqlScreeningResultRepository::new(state.db_pool.clone());
    results.insert(result.clone()).await.map_err(|e| persistence_failure(&e))?;

    info!(
        event_name = "screening.completed",
        donor_id = %result.donor_id,
        verdict = result.verdict.as_str(),
        guideline_count = sections.len(),
        "screening evaluation persisted"
    );

    Ok((StatusCode::OK, Json(result)))
}

async fn list_screenings(
    State(state): State<ScreeningState>,
    headers: HeaderMap,
    Path(donor_id): Path<String>,
) -> Result<Json<Vec<ScreeningResult>>, ApiFailure> {
    require_role(&headers, &state.auth, Role::Staff)?;

    let donors = SqlDonorRepository::new(state.db_pool.clone());
    let donor_id = DonorId(donor_id);
    if donors.find_by_id(&donor_id).await.map_err(|e| persistence_failure(&e))?.is_none() {
        return Err(api_error(ApiErrorKind::NotFound, format!("donor `{}` not found", donor_id.0)));
    }

    let results = SqlScreeningResultRepository::new(state.db_pool.clone());
    let listed = results.list_for_donor(&donor_id).await.map_err(|e| persistence_failure(&e))?;
    Ok(Json(listed))
}
