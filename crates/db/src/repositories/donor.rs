use chrono::{DateTime, NaiveDate, Utc};
use sqlx::Row;

use donorway_core::domain::donor::{
    BloodType, Donor, DonorId, DonorStatus, IntakeMethod, Sex, TissueCondition, TissueType,
};
use donorway_core::domain::partner::PartnerId;

use super::{DonorRepository, RepositoryError};
use crate::DbPool;

pub struct SqlDonorRepository {
    pool: DbPool,
}

impl SqlDonorRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const DONOR_COLUMNS: &str = "id, partner_id, status, intake_method, full_name, date_of_birth,
    age_years, sex, blood_type, cause_of_death, date_of_death, tissue_type, tissue_condition,
    consent_obtained, notes, created_at, updated_at";

fn decode_timestamp(raw: &str, column: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("{column}: {e}")))
}

fn decode_date(raw: Option<String>, column: &str) -> Result<Option<NaiveDate>, RepositoryError> {
    raw.map(|value| {
        NaiveDate::parse_from_str(&value, "%Y-%m-%d")
            .map_err(|e| RepositoryError::Decode(format!("{column}: {e}")))
    })
    .transpose()
}

fn decode_enum<T>(
    raw: Option<String>,
    column: &str,
    parse: fn(&str) -> Option<T>,
) -> Result<Option<T>, RepositoryError> {
    raw.map(|value| {
        parse(&value)
            .ok_or_else(|| RepositoryError::Decode(format!("{column}: unknown value `{value}`")))
    })
    .transpose()
}

fn row_to_donor(row: &sqlx::sqlite::SqliteRow) -> Result<Donor, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let partner_id: String =
        row.try_get("partner_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let status_str: String =
        row.try_get("status").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let intake_method_str: String =
        row.try_get("intake_method").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let full_name: Option<String> =
        row.try_get("full_name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let date_of_birth: Option<String> =
        row.try_get("date_of_birth").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let age_years: Option<i64> =
        row.try_get("age_years").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let sex: Option<String> =
        row.try_get("sex").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let blood_type: Option<String> =
        row.try_get("blood_type").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let cause_of_death: Option<String> =
        row.try_get("cause_of_death").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let date_of_death: Option<String> =
        row.try_get("date_of_death").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let tissue_type: Option<String> =
        row.try_get("tissue_type").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let tissue_condition: Option<String> =
        row.try_get("tissue_condition").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let consent_obtained: Option<bool> =
        row.try_get("consent_obtained").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let notes: Option<String> =
        row.try_get("notes").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at_str: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let updated_at_str: String =
        row.try_get("updated_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let status = DonorStatus::parse(&status_str).ok_or_else(|| {
        RepositoryError::Decode(format!("status: unknown value `{status_str}`"))
    })?;
    let intake_method = IntakeMethod::parse(&intake_method_str).ok_or_else(|| {
        RepositoryError::Decode(format!("intake_method: unknown value `{intake_method_str}`"))
    })?;

    Ok(Donor {
        id: DonorId(id),
        partner_id: PartnerId(partner_id),
        status,
        intake_method,
        full_name,
        date_of_birth: decode_date(date_of_birth, "date_of_birth")?,
        age_years: age_years.map(|a| a as u16),
        sex: decode_enum(sex, "sex", Sex::parse)?,
        blood_type: decode_enum(blood_type, "blood_type", BloodType::parse)?,
        cause_of_death,
        date_of_death: decode_date(date_of_death, "date_of_death")?,
        tissue_type: decode_enum(tissue_type, "tissue_type", TissueType::parse)?,
        tissue_condition: decode_enum(tissue_condition, "tissue_condition", TissueCondition::parse)?,
        consent_obtained,
        notes,
        created_at: decode_timestamp(&created_at_str, "created_at")?,
        updated_at: decode_timestamp(&updated_at_str, "updated_at")?,
    })
}

#[async_trait::async_trait]
impl DonorRepository for SqlDonorRepository {
    async fn find_by_id(&self, id: &DonorId) -> Result<Option<Donor>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {DONOR_COLUMNS} FROM donor WHERE id = ?"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_donor(r)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, donor: Donor) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO donor (id, partner_id, status, intake_method, full_name, date_of_birth,
                                age_years, sex, blood_type, cause_of_death, date_of_death,
                                tissue_type, tissue_condition, consent_obtained, notes,
                                created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 status = excluded.status,
                 full_name = excluded.full_name,
                 date_of_birth = excluded.date_of_birth,
                 age_years = excluded.age_years,
                 sex = excluded.sex,
                 blood_type = excluded.blood_type,
                 cause_of_death = excluded.cause_of_death,
                 date_of_death = excluded.date_of_death,
                 tissue_type = excluded.tissue_type,
                 tissue_condition = excluded.tissue_condition,
                 consent_obtained = excluded.consent_obtained,
                 notes = excluded.notes,
                 updated_at = excluded.updated_at",
        )
        .bind(&donor.id.0)
        .bind(&donor.partner_id.0)
        .bind(donor.status.as_str())
        .bind(donor.intake_method.as_str())
        .bind(&donor.full_name)
        .bind(donor.date_of_birth.map(|d| d.format("%Y-%m-%d").to_string()))
        .bind(donor.age_years.map(|a| a as i64))
        .bind(donor.sex.map(|s| s.as_str()))
        .bind(donor.blood_type.map(|b| b.as_str()))
        .bind(&donor.cause_of_death)
        .bind(donor.date_of_death.map(|d| d.format("%Y-%m-%d").to_string()))
        .bind(donor.tissue_type.map(|t| t.as_str()))
        .bind(donor.tissue_condition.map(|c| c.as_str()))
        .bind(donor.consent_obtained)
        .bind(&donor.notes)
        .bind(donor.created_at.to_rfc3339())
        .bind(donor.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_for_partner(
        &self,
        partner_id: &PartnerId,
    ) -> Result<Vec<Donor>, RepositoryError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(&format!(
            "SELECT {DONOR_COLUMNS} FROM donor WHERE partner_id = ? ORDER BY created_at DESC"
        ))
        .bind(&partner_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_donor).collect::<Result<Vec<_>, _>>()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};

    use donorway_core::domain::donor::{
        BloodType, Donor, DonorId, DonorStatus, IntakeMethod, Sex,
    };
    use donorway_core::domain::partner::PartnerId;

    use super::SqlDonorRepository;
    use crate::fixtures::insert_partner;
    use crate::repositories::DonorRepository;
    use crate::{connect_with_settings, migrations};

    async fn setup() -> sqlx::SqlitePool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    fn sample_donor(id: &str, partner_id: &str) -> Donor {
        let now = Utc::now();
        Donor {
            id: DonorId(id.to_string()),
            partner_id: PartnerId(partner_id.to_string()),
            status: DonorStatus::Draft,
            intake_method: IntakeMethod::Manual,
            full_name: Some("Jordan Reyes".to_string()),
            date_of_birth: NaiveDate::from_ymd_opt(1961, 3, 14),
            age_years: Some(64),
            sex: Some(Sex::Female),
            blood_type: Some(BloodType::AbNegative),
            cause_of_death: Some("cardiac arrest".to_string()),
            date_of_death: NaiveDate::from_ymd_opt(2026, 8, 20),
            tissue_type: None,
            tissue_condition: None,
            consent_obtained: Some(true),
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn save_and_find_round_trips_all_fields() {
        let pool = setup().await;
        insert_partner(&pool, "P-001", "acme-tissue", true).await;

        let repo = SqlDonorRepository::new(pool);
        let donor = sample_donor("D-001", "P-001");
        repo.save(donor.clone()).await.expect("save");

        let found = repo
            .find_by_id(&DonorId("D-001".to_string()))
            .await
            .expect("find")
            .expect("should exist");

        assert_eq!(found.full_name, donor.full_name);
        assert_eq!(found.blood_type, Some(BloodType::AbNegative));
        assert_eq!(found.date_of_birth, donor.date_of_birth);
        assert_eq!(found.status, DonorStatus::Draft);
        assert_eq!(found.consent_obtained, Some(true));
    }

    #[tokio::test]
    async fn find_missing_donor_returns_none() {
        let pool = setup().await;
        let repo = SqlDonorRepository::new(pool);

        let found = repo.find_by_id(&DonorId("missing".to_string())).await.expect("find");
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn save_upserts_status_changes() {
        let pool = setup().await;
        insert_partner(&pool, "P-001", "acme-tissue", true).await;

        let repo = SqlDonorRepository::new(pool);
        let mut donor = sample_donor("D-001", "P-001");
        repo.save(donor.clone()).await.expect("save");

        donor.status = DonorStatus::Submitted;
        donor.updated_at = Utc::now();
        repo.save(donor).await.expect("upsert");

        let found = repo
            .find_by_id(&DonorId("D-001".to_string()))
            .await
            .expect("find")
            .expect("should exist");
        assert_eq!(found.status, DonorStatus::Submitted);
    }

    #[tokio::test]
    async fn list_for_partner_excludes_other_partners() {
        let pool = setup().await;
        insert_partner(&pool, "P-001", "acme-tissue", true).await;
        insert_partner(&pool, "P-002", "globex-organ", true).await;

        let repo = SqlDonorRepository::new(pool);
        repo.save(sample_donor("D-001", "P-001")).await.expect("save 1");
        repo.save(sample_donor("D-002", "P-001")).await.expect("save 2");
        repo.save(sample_donor("D-003", "P-002")).await.expect("save 3");

        let listed =
            repo.list_for_partner(&PartnerId("P-001".to_string())).await.expect("list");
        assert_eq!(listed.len(), 2);
    }
}
