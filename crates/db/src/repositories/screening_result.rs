use chrono::{DateTime, Utc};
use sqlx::Row;

use donorway_core::domain::donor::DonorId;
use donorway_core::domain::screening::{
    Concern, ScreeningResult, ScreeningResultId, Verdict,
};

use super::{RepositoryError, ScreeningResultRepository};
use crate::DbPool;

pub struct SqlScreeningResultRepository {
    pool: DbPool,
}

impl SqlScreeningResultRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_result(row: &sqlx::sqlite::SqliteRow) -> Result<ScreeningResult, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let donor_id: String =
        row.try_get("donor_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let verdict_str: String =
        row.try_get("verdict").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let confidence: f64 =
        row.try_get("confidence").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let reasoning: String =
        row.try_get("reasoning").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let concerns_json: String =
        row.try_get("concerns").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let missing_data_json: String =
        row.try_get("missing_data").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let guidelines_snapshot: String =
        row.try_get("guidelines_snapshot").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let model_version: String =
        row.try_get("model_version").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at_str: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let verdict = Verdict::parse(&verdict_str).ok_or_else(|| {
        RepositoryError::Decode(format!("verdict: unknown value `{verdict_str}`"))
    })?;
    let concerns: Vec<Concern> = serde_json::from_str(&concerns_json)
        .map_err(|e| RepositoryError::Decode(format!("concerns: {e}")))?;
    let missing_data: Vec<String> = serde_json::from_str(&missing_data_json)
        .map_err(|e| RepositoryError::Decode(format!("missing_data: {e}")))?;
    let created_at = DateTime::parse_from_rfc3339(&created_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("created_at: {e}")))?;

    Ok(ScreeningResult {
        id: ScreeningResultId(id),
        donor_id: DonorId(donor_id),
        verdict,
        confidence,
        reasoning,
        concerns,
        missing_data,
        guidelines_snapshot,
        model_version,
        created_at,
    })
}

#[async_trait::async_trait]
impl ScreeningResultRepository for SqlScreeningResultRepository {
    async fn insert(&self, result: ScreeningResult) -> Result<(), RepositoryError> {
        let concerns_json = serde_json::to_string(&result.concerns)
            .map_err(|e| RepositoryError::Decode(format!("concerns: {e}")))?;
        let missing_data_json = serde_json::to_string(&result.missing_data)
            .map_err(|e| RepositoryError::Decode(format!("missing_data: {e}")))?;

        sqlx::query(
            "INSERT INTO screening_result (id, donor_id, verdict, confidence, reasoning,
                                           concerns, missing_data, guidelines_snapshot,
                                           model_version, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&result.id.0)
        .bind(&result.donor_id.0)
        .bind(result.verdict.as_str())
        .bind(result.confidence)
        .bind(&result.reasoning)
        .bind(&concerns_json)
        .bind(&missing_data_json)
        .bind(&result.guidelines_snapshot)
        .bind(&result.model_version)
        .bind(result.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_for_donor(
        &self,
        donor_id: &DonorId,
    ) -> Result<Vec<ScreeningResult>, RepositoryError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT id, donor_id, verdict, confidence, reasoning, concerns, missing_data,
                    guidelines_snapshot, model_version, created_at
             FROM screening_result WHERE donor_id = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(&donor_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_result).collect::<Result<Vec<_>, _>>()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use donorway_core::domain::donor::DonorId;
    use donorway_core::domain::screening::{
        Concern, ScreeningResult, ScreeningResultId, Severity, Verdict,
    };

    use super::SqlScreeningResultRepository;
    use crate::fixtures::{insert_donor, insert_partner};
    use crate::repositories::ScreeningResultRepository;
    use crate::{connect_with_settings, migrations};

    async fn setup() -> sqlx::SqlitePool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        insert_partner(&pool, "P-001", "acme-tissue", true).await;
        insert_donor(&pool, "D-001", "P-001").await;
        pool
    }

    fn sample_result(id: &str, donor_id: &str) -> ScreeningResult {
        ScreeningResult {
            id: ScreeningResultId(id.to_string()),
            donor_id: DonorId(donor_id.to_string()),
            verdict: Verdict::NeedsReview,
            confidence: 0.58,
            reasoning: "Key clinical fields are missing, so the record needs review.".to_string(),
            concerns: vec![Concern {
                concern: "No consent documentation".to_string(),
                severity: Severity::High,
                guideline_ref: Some("Consent".to_string()),
            }],
            missing_data: vec!["blood_type".to_string()],
            guidelines_snapshot: "[{\"title\":\"Consent\"}]".to_string(),
            model_version: "donorway-screening-v1".to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn insert_and_list_round_trips_structured_fields() {
        let pool = setup().await;
        let repo = SqlScreeningResultRepository::new(pool);

        repo.insert(sample_result("SR-001", "D-001")).await.expect("insert");

        let results = repo.list_for_donor(&DonorId("D-001".to_string())).await.expect("list");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].verdict, Verdict::NeedsReview);
        assert_eq!(results[0].concerns[0].severity, Severity::High);
        assert_eq!(results[0].missing_data, vec!["blood_type"]);
    }

    #[tokio::test]
    async fn repeated_runs_append_and_list_latest_first() {
        let pool = setup().await;
        let repo = SqlScreeningResultRepository::new(pool);

        let mut first = sample_result("SR-001", "D-001");
        first.created_at = Utc::now() - Duration::minutes(5);
        repo.insert(first).await.expect("insert first");

        let mut second = sample_result("SR-002", "D-001");
        second.verdict = Verdict::Accept;
        repo.insert(second).await.expect("insert second");

        let results = repo.list_for_donor(&DonorId("D-001".to_string())).await.expect("list");
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id.0, "SR-002");
        assert_eq!(results[0].verdict, Verdict::Accept);
        assert_eq!(results[1].id.0, "SR-001");
    }

    #[tokio::test]
    async fn duplicate_id_insert_fails_instead_of_overwriting() {
        let pool = setup().await;
        let repo = SqlScreeningResultRepository::new(pool);

        repo.insert(sample_result("SR-001", "D-001")).await.expect("insert");

        let mut replay = sample_result("SR-001", "D-001");
        replay.verdict = Verdict::Accept;
        assert!(repo.insert(replay).await.is_err());

        let results = repo.list_for_donor(&DonorId("D-001".to_string())).await.expect("list");
        assert_eq!(results[0].verdict, Verdict::NeedsReview);
    }
}
