//! Modelo de Notification
//!
//! Las notificaciones las crea el orquestador como efecto secundario de cada
//! transición; la capa de UI las consume y marca como leídas.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Tipo de evento notificado
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    StatusChanged,
    DriverAssigned,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::StatusChanged => "status_changed",
            NotificationKind::DriverAssigned => "driver_assigned",
        }
    }
}

/// Notification - mapea a la tabla notifications
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub mission_id: Uuid,
    pub kind: NotificationKind,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Datos para crear una notificación (el store asigna id y timestamp)
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub mission_id: Uuid,
    pub kind: NotificationKind,
    pub message: String,
}
