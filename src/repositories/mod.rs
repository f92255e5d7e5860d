//! Repositorios y contratos de colaboradores externos
//!
//! El store de misiones, el directorio de usuarios y el store de
//! notificaciones son colaboradores externos del núcleo: aquí se definen sus
//! contratos como traits y sus implementaciones PostgreSQL. Los servicios
//! dependen de los traits, nunca de una implementación concreta.

pub mod attachment_repository;
pub mod mission_repository;
pub mod notification_repository;
pub mod user_repository;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::mission::{Contact, Mission, MissionStatus, MissionType, VehicleInfo};
use crate::models::notification::{NewNotification, Notification};
use crate::models::user::User;
use crate::utils::errors::AppResult;

/// Datos para crear una misión. El store asigna id, mission_number
/// (secuencia propia, único por construcción) y timestamps.
#[derive(Debug, Clone)]
pub struct NewMission {
    pub mission_type: MissionType,
    pub status: MissionStatus,
    pub client_id: Uuid,
    pub admin_id: Option<Uuid>,
    pub vehicle_category: String,
    pub vehicle_info: VehicleInfo,
    pub distance_km: Decimal,
    pub price_excl_tax: Decimal,
    pub price_incl_tax: Decimal,
    pub pickup_address: String,
    pub pickup_contact: Contact,
    pub pickup_at: DateTime<Utc>,
    pub delivery_address: String,
    pub delivery_contact: Contact,
    pub delivery_at: DateTime<Utc>,
    pub notes: Option<String>,
}

/// Filtros de consulta sobre el store de misiones
#[derive(Debug, Clone, Default)]
pub struct MissionFilter {
    pub status: Option<MissionStatus>,
    pub client_id: Option<Uuid>,
    pub driver_id: Option<Uuid>,
}

/// Contrato del Mission Record Store.
///
/// Los updates condicionales devuelven `None` cuando la fila ya no está en
/// el estado esperado: ese es el primitivo de concurrencia optimista sobre
/// el que el orquestador construye `Conflict`.
#[async_trait]
pub trait MissionStore: Send + Sync {
    async fn insert(&self, new: NewMission) -> AppResult<Mission>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Mission>>;

    async fn list(&self, filter: MissionFilter) -> AppResult<Vec<Mission>>;

    /// Cambio de estado condicionado al estado leído por el llamador.
    async fn update_status(
        &self,
        id: Uuid,
        expected: MissionStatus,
        next: MissionStatus,
    ) -> AppResult<Option<Mission>>;

    /// Asignación de chófer: driver_id y estado se escriben en la misma
    /// sentencia atómica, nunca por separado.
    async fn update_status_and_driver(
        &self,
        id: Uuid,
        expected: MissionStatus,
        next: MissionStatus,
        driver_id: Uuid,
    ) -> AppResult<Option<Mission>>;

    /// Edición explícita de los términos comerciales (único camino que los
    /// cambia después de la creación).
    async fn update_terms(
        &self,
        id: Uuid,
        distance_km: Decimal,
        price_excl_tax: Decimal,
        price_incl_tax: Decimal,
    ) -> AppResult<Option<Mission>>;
}

/// Contrato del directorio de usuarios (servicio de identidad externo)
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Ids de todos los admins, para el fan-out de notificaciones cuando la
    /// misión no tiene admin asignado.
    async fn admin_ids(&self) -> AppResult<Vec<Uuid>>;
}

/// Contrato del canal de notificaciones persistente
#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn insert(&self, new: NewNotification) -> AppResult<Notification>;

    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<Notification>>;

    /// Marca como leída; solo el destinatario puede hacerlo.
    async fn mark_read(&self, id: Uuid, user_id: Uuid) -> AppResult<Option<Notification>>;
}
