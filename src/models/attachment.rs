//! Modelo de Attachment
//!
//! Solo metadatos: el binario vive en el almacén de adjuntos externo.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Attachment - mapea a la tabla mission_attachments
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Attachment {
    pub id: Uuid,
    pub mission_id: Uuid,
    pub filename: String,
    pub storage_path: String,
    pub size_bytes: i64,
    pub mime_type: String,
    pub uploaded_by: Uuid,
    pub uploaded_at: DateTime<Utc>,
}
