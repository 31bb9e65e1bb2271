use chrono::{DateTime, Utc};
use sqlx::Row;

use donorway_core::domain::donor::DonorId;
use donorway_core::domain::partner::PartnerId;
use donorway_core::domain::transcript::{CallTranscript, TranscriptId};

use super::{RepositoryError, TranscriptRepository};
use crate::DbPool;

pub struct SqlTranscriptRepository {
    pool: DbPool,
}

impl SqlTranscriptRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_transcript(row: &sqlx::sqlite::SqliteRow) -> Result<CallTranscript, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let donor_id: String =
        row.try_get("donor_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let partner_id: String =
        row.try_get("partner_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let call_id: String =
        row.try_get("call_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let transcript_text: String =
        row.try_get("transcript_text").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let duration_seconds: Option<i64> =
        row.try_get("duration_seconds").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let caller_number: Option<String> =
        row.try_get("caller_number").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let extracted_data_json: String =
        row.try_get("extracted_data").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at_str: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let extracted_data = serde_json::from_str(&extracted_data_json)
        .map_err(|e| RepositoryError::Decode(format!("extracted_data: {e}")))?;
    let created_at = DateTime::parse_from_rfc3339(&created_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("created_at: {e}")))?;

    Ok(CallTranscript {
        id: TranscriptId(id),
        donor_id: DonorId(donor_id),
        partner_id: PartnerId(partner_id),
        call_id,
        transcript_text,
        duration_seconds,
        caller_number,
        extracted_data,
        created_at,
    })
}

#[async_trait::async_trait]
impl TranscriptRepository for SqlTranscriptRepository {
    async fn insert(&self, transcript: CallTranscript) -> Result<(), RepositoryError> {
        let extracted_data_json = serde_json::to_string(&transcript.extracted_data)
            .map_err(|e| RepositoryError::Decode(format!("extracted_data: {e}")))?;

        sqlx::query(
            "INSERT INTO call_transcript (id, donor_id, partner_id, call_id, transcript_text,
                                          duration_seconds, caller_number, extracted_data,
                                          created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&transcript.id.0)
        .bind(&transcript.donor_id.0)
        .bind(&transcript.partner_id.0)
        .bind(&transcript.call_id)
        .bind(&transcript.transcript_text)
        .bind(transcript.duration_seconds)
        .bind(&transcript.caller_number)
        .bind(&extracted_data_json)
        .bind(transcript.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_for_donor(
        &self,
        donor_id: &DonorId,
    ) -> Result<Vec<CallTranscript>, RepositoryError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT id, donor_id, partner_id, call_id, transcript_text, duration_seconds,
                    caller_number, extracted_data, created_at
             FROM call_transcript WHERE donor_id = ? ORDER BY created_at DESC",
        )
        .bind(&donor_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_transcript).collect::<Result<Vec<_>, _>>()
    }
}
