use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::donor::DonorId;
use super::partner::PartnerId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TranscriptId(pub String);

impl std::fmt::Display for TranscriptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stored phone-intake call. `extracted_data` keeps the raw tool-call
/// payload as the model produced it, before any enum or date resolution,
/// so failed mappings can be audited later. `call_id` is the provider's
/// identifier and is kept for future replay detection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CallTranscript {
    pub id: TranscriptId,
    pub donor_id: DonorId,
    pub partner_id: PartnerId,
    pub call_id: String,
    pub transcript_text: String,
    pub duration_seconds: Option<i64>,
    pub caller_number: Option<String>,
    pub extracted_data: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
