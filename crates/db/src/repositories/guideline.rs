use chrono::{DateTime, Utc};
use sqlx::Row;

use donorway_core::domain::guideline::{GuidelineId, ScreeningGuideline};

use super::{GuidelineRepository, RepositoryError};
use crate::DbPool;

pub struct SqlGuidelineRepository {
    pool: DbPool,
}

impl SqlGuidelineRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn decode_timestamp(raw: &str, column: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("{column}: {e}")))
}

fn row_to_guideline(row: &sqlx::sqlite::SqliteRow) -> Result<ScreeningGuideline, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let title: String =
        row.try_get("title").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let category: String =
        row.try_get("category").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let content: String =
        row.try_get("content").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let is_active: bool =
        row.try_get("is_active").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let sort_order: i64 =
        row.try_get("sort_order").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at_str: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let updated_at_str: String =
        row.try_get("updated_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(ScreeningGuideline {
        id: GuidelineId(id),
        title,
        category,
        content,
        is_active,
        sort_order,
        created_at: decode_timestamp(&created_at_str, "created_at")?,
        updated_at: decode_timestamp(&updated_at_str, "updated_at")?,
    })
}

#[async_trait::async_trait]
impl GuidelineRepository for SqlGuidelineRepository {
    async fn list_active(&self) -> Result<Vec<ScreeningGuideline>, RepositoryError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT id, title, category, content, is_active, sort_order, created_at, updated_at
             FROM screening_guideline
             WHERE is_active = 1
             ORDER BY sort_order ASC, title ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_guideline).collect::<Result<Vec<_>, _>>()
    }

    async fn save(&self, guideline: ScreeningGuideline) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO screening_guideline (id, title, category, content, is_active,
                                              sort_order, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 title = excluded.title,
                 category = excluded.category,
                 content = excluded.content,
                 is_active = excluded.is_active,
                 sort_order = excluded.sort_order,
                 updated_at = excluded.updated_at",
        )
        .bind(&guideline.id.0)
        .bind(&guideline.title)
        .bind(&guideline.category)
        .bind(&guideline.content)
        .bind(guideline.is_active)
        .bind(guideline.sort_order)
        .bind(guideline.created_at.to_rfc3339())
        .bind(guideline.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
