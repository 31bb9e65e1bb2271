use thiserror::Error;

use crate::domain::donor::DonorStatus;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid donor transition from {from:?} to {to:?}")]
    InvalidDonorTransition { from: DonorStatus, to: DonorStatus },
}

/// Wire-level error taxonomy. Every handler maps its internal failures onto
/// one of these before responding; the original error is logged server-side
/// and never escapes to the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApiErrorKind {
    Unauthorized,
    Forbidden,
    NotFound,
    InvalidInput,
    UpstreamRateLimited,
    UpstreamQuotaExhausted,
    UpstreamMalformed,
    UpstreamFailure,
    PartnerNotFound,
    NoTranscript,
    PersistenceFailure,
}

impl ApiErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::InvalidInput => "invalid_input",
            Self::UpstreamRateLimited => "upstream_rate_limited",
            Self::UpstreamQuotaExhausted => "upstream_quota_exhausted",
            Self::UpstreamMalformed => "upstream_malformed",
            Self::UpstreamFailure => "upstream_failure",
            Self::PartnerNotFound => "partner_not_found",
            Self::NoTranscript => "no_transcript",
            Self::PersistenceFailure => "persistence_failure",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            Self::Unauthorized => 401,
            Self::Forbidden => 403,
            Self::NotFound | Self::PartnerNotFound => 404,
            Self::InvalidInput | Self::NoTranscript => 400,
            Self::UpstreamRateLimited => 429,
            Self::UpstreamQuotaExhausted => 402,
            Self::UpstreamMalformed | Self::UpstreamFailure => 502,
            Self::PersistenceFailure => 500,
        }
    }
}
