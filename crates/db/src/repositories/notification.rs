use chrono::{DateTime, Utc};
use sqlx::Row;

use donorway_core::domain::donor::DonorId;
use donorway_core::domain::notification::{Notification, NotificationId};

use super::{NotificationRepository, RepositoryError};
use crate::DbPool;

pub struct SqlNotificationRepository {
    pool: DbPool,
}

impl SqlNotificationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_notification(row: &sqlx::sqlite::SqliteRow) -> Result<Notification, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let recipient: String =
        row.try_get("recipient").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let donor_id: Option<String> =
        row.try_get("donor_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let title: String =
        row.try_get("title").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let body: String = row.try_get("body").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let is_read: bool =
        row.try_get("is_read").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at_str: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let created_at = DateTime::parse_from_rfc3339(&created_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("created_at: {e}")))?;

    Ok(Notification {
        id: NotificationId(id),
        recipient,
        donor_id: donor_id.map(DonorId),
        title,
        body,
        is_read,
        created_at,
    })
}

#[async_trait::async_trait]
impl NotificationRepository for SqlNotificationRepository {
    async fn insert(&self, notification: Notification) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO notification (id, recipient, donor_id, title, body, is_read, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&notification.id.0)
        .bind(&notification.recipient)
        .bind(notification.donor_id.as_ref().map(|id| id.0.clone()))
        .bind(&notification.title)
        .bind(&notification.body)
        .bind(notification.is_read)
        .bind(notification.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_for_recipient(
        &self,
        recipient: &str,
    ) -> Result<Vec<Notification>, RepositoryError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT id, recipient, donor_id, title, body, is_read, created_at
             FROM notification WHERE recipient = ? ORDER BY created_at DESC",
        )
        .bind(recipient)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_notification).collect::<Result<Vec<_>, _>>()
    }
}
