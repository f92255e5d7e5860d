use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

use crate::models::mission::{Mission, MissionStatus};
use crate::repositories::{MissionFilter, MissionStore, NewMission};
use crate::utils::errors::AppResult;

/// Implementación PostgreSQL del Mission Record Store
pub struct MissionRepository {
    pool: PgPool,
}

impl MissionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MissionStore for MissionRepository {
    async fn insert(&self, new: NewMission) -> AppResult<Mission> {
        let id = Uuid::new_v4();

        // mission_number sale de una secuencia del propio store: único por
        // construcción, asignado exactamente una vez.
        let mission = sqlx::query_as::<_, Mission>(
            r#"
            INSERT INTO missions (
                id, mission_number, mission_type, status,
                client_id, driver_id, admin_id,
                vehicle_category, vehicle_info,
                distance_km, price_excl_tax, price_incl_tax,
                pickup_address, pickup_contact, pickup_at,
                delivery_address, delivery_contact, delivery_at,
                notes, created_at, updated_at
            )
            VALUES (
                $1, nextval('mission_number_seq'), $2, $3,
                $4, NULL, $5,
                $6, $7,
                $8, $9, $10,
                $11, $12, $13,
                $14, $15, $16,
                $17, NOW(), NOW()
            )
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(new.mission_type)
        .bind(new.status)
        .bind(new.client_id)
        .bind(new.admin_id)
        .bind(new.vehicle_category)
        .bind(Json(new.vehicle_info))
        .bind(new.distance_km)
        .bind(new.price_excl_tax)
        .bind(new.price_incl_tax)
        .bind(new.pickup_address)
        .bind(Json(new.pickup_contact))
        .bind(new.pickup_at)
        .bind(new.delivery_address)
        .bind(Json(new.delivery_contact))
        .bind(new.delivery_at)
        .bind(new.notes)
        .fetch_one(&self.pool)
        .await?;

        Ok(mission)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Mission>> {
        let mission = sqlx::query_as::<_, Mission>("SELECT * FROM missions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(mission)
    }

    async fn list(&self, filter: MissionFilter) -> AppResult<Vec<Mission>> {
        let mut builder =
            QueryBuilder::<sqlx::Postgres>::new("SELECT * FROM missions WHERE 1 = 1");

        if let Some(status) = filter.status {
            builder.push(" AND status = ").push_bind(status);
        }
        if let Some(client_id) = filter.client_id {
            builder.push(" AND client_id = ").push_bind(client_id);
        }
        if let Some(driver_id) = filter.driver_id {
            builder.push(" AND driver_id = ").push_bind(driver_id);
        }
        builder.push(" ORDER BY created_at DESC");

        let missions = builder
            .build_query_as::<Mission>()
            .fetch_all(&self.pool)
            .await?;

        Ok(missions)
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected: MissionStatus,
        next: MissionStatus,
    ) -> AppResult<Option<Mission>> {
        // Concurrencia optimista: el update solo aplica si el estado sigue
        // siendo el que leyó el llamador. Sin fila devuelta = carrera perdida.
        let mission = sqlx::query_as::<_, Mission>(
            r#"
            UPDATE missions
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(expected)
        .bind(next)
        .fetch_optional(&self.pool)
        .await?;

        Ok(mission)
    }

    async fn update_status_and_driver(
        &self,
        id: Uuid,
        expected: MissionStatus,
        next: MissionStatus,
        driver_id: Uuid,
    ) -> AppResult<Option<Mission>> {
        let mission = sqlx::query_as::<_, Mission>(
            r#"
            UPDATE missions
            SET status = $3, driver_id = $4, updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(expected)
        .bind(next)
        .bind(driver_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(mission)
    }

    async fn update_terms(
        &self,
        id: Uuid,
        distance_km: Decimal,
        price_excl_tax: Decimal,
        price_incl_tax: Decimal,
    ) -> AppResult<Option<Mission>> {
        let mission = sqlx::query_as::<_, Mission>(
            r#"
            UPDATE missions
            SET distance_km = $2, price_excl_tax = $3, price_incl_tax = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(distance_km)
        .bind(price_excl_tax)
        .bind(price_incl_tax)
        .fetch_optional(&self.pool)
        .await?;

        Ok(mission)
    }
}
