//! Shared wire types for API error responses.

use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use donorway_core::errors::ApiErrorKind;
use donorway_db::repositories::RepositoryError;
use donorway_llm::GatewayError;

#[derive(Clone, Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub code: &'static str,
    /// Echoed only by the intake webhook when a spoken partner code fails
    /// to resolve, so operators can see the literal code from the call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partner_code: Option<String>,
}

pub type ApiFailure = (StatusCode, Json<ApiError>);

pub fn api_error(kind: ApiErrorKind, message: impl Into<String>) -> ApiFailure {
    (
        StatusCode::from_u16(kind.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(ApiError { error: message.into(), code: kind.code(), partner_code: None }),
    )
}

pub fn partner_not_found(submitted_code: &str) -> ApiFailure {
    let (status, Json(mut body)) = api_error(
        ApiErrorKind::PartnerNotFound,
        format!("no active partner matches code `{submitted_code}`"),
    );
    body.partner_code = Some(submitted_code.to_string());
    (status, Json(body))
}

/// Storage failures never leak driver details to the wire; the original
/// error is logged at the call site.
pub fn persistence_failure(error: &RepositoryError) -> ApiFailure {
    tracing::error!(event_name = "api.persistence_failure", error = %error, "storage operation failed");
    api_error(ApiErrorKind::PersistenceFailure, "storage operation failed")
}

/// Maps gateway failures onto the wire taxonomy. Nothing is retried; the
/// caller re-runs on demand.
pub fn gateway_failure(error: &GatewayError) -> ApiFailure {
    match error {
        GatewayError::RateLimited => api_error(
            ApiErrorKind::UpstreamRateLimited,
            "the language model provider is rate limiting requests; try again later",
        ),
        GatewayError::QuotaExhausted => api_error(
            ApiErrorKind::UpstreamQuotaExhausted,
            "the language model provider quota is exhausted; contact an operator",
        ),
        GatewayError::Malformed(detail) => {
            api_error(ApiErrorKind::UpstreamMalformed, format!("unusable model response: {detail}"))
        }
        GatewayError::Upstream { status, .. } => api_error(
            ApiErrorKind::UpstreamFailure,
            format!("language model provider returned status {status}"),
        ),
        GatewayError::Transport(detail) => {
            api_error(ApiErrorKind::UpstreamFailure, format!("provider unreachable: {detail}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use donorway_core::errors::ApiErrorKind;
    use donorway_llm::GatewayError;

    use super::{api_error, gateway_failure, partner_not_found};

    #[test]
    fn taxonomy_statuses_carry_through() {
        let (status, body) = api_error(ApiErrorKind::NotFound, "donor not found");
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.code, "not_found");
    }

    #[test]
    fn partner_not_found_echoes_submitted_code() {
        let (status, body) = partner_not_found("acme-tissue");
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.code, "partner_not_found");
        assert_eq!(body.partner_code.as_deref(), Some("acme-tissue"));
        assert!(body.error.contains("acme-tissue"));
    }

    #[test]
    fn gateway_errors_map_to_distinct_codes() {
        assert_eq!(gateway_failure(&GatewayError::RateLimited).1.code, "upstream_rate_limited");
        assert_eq!(
            gateway_failure(&GatewayError::QuotaExhausted).1.code,
            "upstream_quota_exhausted"
        );
        assert_eq!(
            gateway_failure(&GatewayError::Malformed("no tool call".to_string())).1.code,
            "upstream_malformed"
        );
        assert_eq!(
            gateway_failure(&GatewayError::Upstream { status: 503, detail: String::new() }).1.code,
            "upstream_failure"
        );
    }
}
