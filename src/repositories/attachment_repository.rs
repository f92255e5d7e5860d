use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::attachment::Attachment;
use crate::utils::errors::AppResult;

/// Repositorio de metadatos de adjuntos. El binario vive en el almacén de
/// adjuntos externo; aquí solo se registra su existencia.
pub struct AttachmentRepository {
    pool: PgPool,
}

impl AttachmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(
        &self,
        mission_id: Uuid,
        filename: String,
        storage_path: String,
        size_bytes: i64,
        mime_type: String,
        uploaded_by: Uuid,
    ) -> AppResult<Attachment> {
        let attachment = sqlx::query_as::<_, Attachment>(
            r#"
            INSERT INTO mission_attachments
                (id, mission_id, filename, storage_path, size_bytes, mime_type, uploaded_by, uploaded_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(mission_id)
        .bind(filename)
        .bind(storage_path)
        .bind(size_bytes)
        .bind(mime_type)
        .bind(uploaded_by)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(attachment)
    }

    pub async fn list_for_mission(&self, mission_id: Uuid) -> AppResult<Vec<Attachment>> {
        let attachments = sqlx::query_as::<_, Attachment>(
            "SELECT * FROM mission_attachments WHERE mission_id = $1 ORDER BY uploaded_at DESC",
        )
        .bind(mission_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(attachments)
    }
}
