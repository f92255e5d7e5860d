use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::notification::{NewNotification, Notification};
use crate::repositories::NotificationStore;
use crate::utils::errors::AppResult;

/// Implementación PostgreSQL del canal de notificaciones persistente
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationStore for NotificationRepository {
    async fn insert(&self, new: NewNotification) -> AppResult<Notification> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (id, user_id, mission_id, kind, message, is_read, created_at)
            VALUES ($1, $2, $3, $4, $5, FALSE, NOW())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.user_id)
        .bind(new.mission_id)
        .bind(new.kind)
        .bind(new.message)
        .fetch_one(&self.pool)
        .await?;

        Ok(notification)
    }

    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<Notification>> {
        let notifications = sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications WHERE user_id = $1 ORDER BY is_read ASC, created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }

    async fn mark_read(&self, id: Uuid, user_id: Uuid) -> AppResult<Option<Notification>> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            UPDATE notifications
            SET is_read = TRUE
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(notification)
    }
}
