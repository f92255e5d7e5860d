use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::mission::{Contact, Mission, MissionStatus, MissionType, VehicleInfo};

/// Contacto de recogida/entrega tal como llega por la API
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ContactInput {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,

    #[validate(length(min = 1, max = 100))]
    pub last_name: String,

    #[validate(custom = "crate::utils::validation::validate_phone")]
    pub phone: String,

    #[validate(email)]
    pub email: Option<String>,
}

impl From<ContactInput> for Contact {
    fn from(input: ContactInput) -> Self {
        Self {
            first_name: input.first_name,
            last_name: input.last_name,
            phone: input.phone,
            email: input.email,
        }
    }
}

/// Descriptor del vehículo tal como llega por la API
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct VehicleInput {
    #[validate(custom = "crate::utils::validation::validate_not_empty")]
    pub brand: String,

    #[validate(custom = "crate::utils::validation::validate_not_empty")]
    pub model: String,

    #[validate(range(min = 1950, max = 2100))]
    pub year: i32,

    #[validate(custom = "crate::utils::validation::validate_not_empty")]
    pub fuel_type: String,

    #[validate(custom = "crate::utils::validation::validate_not_empty")]
    pub license_plate: String,
}

impl From<VehicleInput> for VehicleInfo {
    fn from(input: VehicleInput) -> Self {
        Self {
            brand: input.brand,
            model: input.model,
            year: input.year,
            fuel_type: input.fuel_type,
            license_plate: input.license_plate,
        }
    }
}

/// Request para crear una misión (cliente o admin)
#[derive(Debug, Deserialize, Validate)]
pub struct CreateMissionRequest {
    pub mission_type: MissionType,

    /// Requerido cuando crea un admin en nombre de un cliente;
    /// ignorado cuando crea el propio cliente.
    pub client_id: Option<Uuid>,

    #[validate(custom = "crate::utils::validation::validate_not_empty")]
    pub vehicle_category: String,

    #[validate]
    pub vehicle: VehicleInput,

    #[validate(length(min = 5, max = 300))]
    pub pickup_address: String,

    #[validate]
    pub pickup_contact: ContactInput,

    pub pickup_at: DateTime<Utc>,

    #[validate(length(min = 5, max = 300))]
    pub delivery_address: String,

    #[validate]
    pub delivery_contact: ContactInput,

    pub delivery_at: DateTime<Utc>,

    pub notes: Option<String>,
}

/// Request para solicitar una transición de estado
#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    pub target_status: MissionStatus,
}

/// Request para asignar un chófer
#[derive(Debug, Deserialize)]
pub struct AssignDriverRequest {
    pub driver_id: Uuid,
}

/// Request para registrar metadatos de un adjunto ya subido
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterAttachmentRequest {
    #[validate(length(min = 1, max = 255))]
    pub filename: String,

    #[validate(length(min = 1, max = 500))]
    pub storage_path: String,

    #[validate(range(min = 1))]
    pub size_bytes: i64,

    #[validate(length(min = 1, max = 100))]
    pub mime_type: String,
}

/// Filtros de listado de misiones
#[derive(Debug, Clone, Deserialize)]
pub struct MissionListQuery {
    pub status: Option<String>,
}

/// Response de misión para la API
#[derive(Debug, Clone, Serialize)]
pub struct MissionResponse {
    pub id: Uuid,
    pub mission_number: i64,
    pub mission_type: MissionType,
    pub status: MissionStatus,
    pub client_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub admin_id: Option<Uuid>,
    pub vehicle_category: String,
    pub vehicle: VehicleInfo,
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
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Mission> for MissionResponse {
    fn from(mission: Mission) -> Self {
        Self {
            id: mission.id,
            mission_number: mission.mission_number,
            mission_type: mission.mission_type,
            status: mission.status,
            client_id: mission.client_id,
            driver_id: mission.driver_id,
            admin_id: mission.admin_id,
            vehicle_category: mission.vehicle_category,
            vehicle: mission.vehicle_info.0,
            distance_km: mission.distance_km,
            price_excl_tax: mission.price_excl_tax,
            price_incl_tax: mission.price_incl_tax,
            pickup_address: mission.pickup_address,
            pickup_contact: mission.pickup_contact.0,
            pickup_at: mission.pickup_at,
            delivery_address: mission.delivery_address,
            delivery_contact: mission.delivery_contact.0,
            delivery_at: mission.delivery_at,
            notes: mission.notes,
            created_at: mission.created_at,
            updated_at: mission.updated_at,
        }
    }
}
