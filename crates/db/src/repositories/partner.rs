use chrono::{DateTime, Utc};
use sqlx::Row;

use donorway_core::domain::partner::{Partner, PartnerId};

use super::{PartnerRepository, RepositoryError};
use crate::DbPool;

pub struct SqlPartnerRepository {
    pool: DbPool,
}

impl SqlPartnerRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_partner(row: &sqlx::sqlite::SqliteRow) -> Result<Partner, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let name: String = row.try_get("name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let slug: String = row.try_get("slug").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let contact_email: Option<String> =
        row.try_get("contact_email").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let is_active: bool =
        row.try_get("is_active").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at_str: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let created_at = DateTime::parse_from_rfc3339(&created_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("created_at: {e}")))?;

    Ok(Partner { id: PartnerId(id), name, slug, contact_email, is_active, created_at })
}

#[async_trait::async_trait]
impl PartnerRepository for SqlPartnerRepository {
    async fn find_by_id(&self, id: &PartnerId) -> Result<Option<Partner>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, name, slug, contact_email, is_active, created_at
             FROM partner WHERE id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_partner(r)?)),
            None => Ok(None),
        }
    }

    async fn find_active_by_slug(&self, slug: &str) -> Result<Option<Partner>, RepositoryError> {
        let normalized = Partner::normalize_slug(slug);
        let row = sqlx::query(
            "SELECT id, name, slug, contact_email, is_active, created_at
             FROM partner WHERE LOWER(slug) = ? AND is_active = 1",
        )
        .bind(&normalized)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_partner(r)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, partner: Partner) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO partner (id, name, slug, contact_email, is_active, created_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 slug = excluded.slug,
                 contact_email = excluded.contact_email,
                 is_active = excluded.is_active",
        )
        .bind(&partner.id.0)
        .bind(&partner.name)
        .bind(&partner.slug)
        .bind(&partner.contact_email)
        .bind(partner.is_active)
        .bind(partner.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use donorway_core::domain::partner::{Partner, PartnerId};

    use super::SqlPartnerRepository;
    use crate::repositories::PartnerRepository;
    use crate::{connect_with_settings, migrations};

    async fn setup() -> sqlx::SqlitePool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    fn sample_partner(id: &str, slug: &str, is_active: bool) -> Partner {
        Partner {
            id: PartnerId(id.to_string()),
            name: "Acme Tissue Recovery".to_string(),
            slug: slug.to_string(),
            contact_email: Some("ops@acme-tissue.example".to_string()),
            is_active,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn slug_lookup_is_case_insensitive() {
        let pool = setup().await;
        let repo = SqlPartnerRepository::new(pool);
        repo.save(sample_partner("P-001", "acme-tissue", true)).await.expect("save");

        let found = repo.find_active_by_slug("ACME-Tissue").await.expect("find");
        assert_eq!(found.expect("should match").id.0, "P-001");
    }

    #[tokio::test]
    async fn slug_lookup_skips_inactive_partners() {
        let pool = setup().await;
        let repo = SqlPartnerRepository::new(pool);
        repo.save(sample_partner("P-001", "acme-tissue", false)).await.expect("save");

        let found = repo.find_active_by_slug("acme-tissue").await.expect("find");
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn deactivation_round_trips() {
        let pool = setup().await;
        let repo = SqlPartnerRepository::new(pool);

        let mut partner = sample_partner("P-001", "acme-tissue", true);
        repo.save(partner.clone()).await.expect("save");

        partner.is_active = false;
        repo.save(partner).await.expect("deactivate");

        let found =
            repo.find_by_id(&PartnerId("P-001".to_string())).await.expect("find").expect("exists");
        assert!(!found.is_active);
    }
}
