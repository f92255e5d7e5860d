use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::user::{User, UserRole};
use crate::repositories::UserDirectory;
use crate::utils::errors::AppResult;

/// Implementación PostgreSQL del directorio de usuarios
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for UserRepository {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn admin_ids(&self) -> AppResult<Vec<Uuid>> {
        let rows: Vec<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE role = $1")
            .bind(UserRole::Admin)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}
