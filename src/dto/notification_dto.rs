use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::notification::{Notification, NotificationKind};

/// Response de notificación para la API
#[derive(Debug, Clone, Serialize)]
pub struct NotificationResponse {
    pub id: Uuid,
    pub mission_id: Uuid,
    pub kind: NotificationKind,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Notification> for NotificationResponse {
    fn from(n: Notification) -> Self {
        Self {
            id: n.id,
            mission_id: n.mission_id,
            kind: n.kind,
            message: n.message,
            is_read: n.is_read,
            created_at: n.created_at,
        }
    }
}
