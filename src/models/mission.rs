//! Modelo de Mission
//!
//! La misión es la entidad central del sistema: un convoyage de un vehículo
//! desde una dirección de recogida hasta una de entrega. Su estado solo se
//! muta a través del orquestador de ciclo de vida.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Tipo de misión
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "mission_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MissionType {
    /// Convoyage hacia el cliente
    Delivery,
    /// Devolución del vehículo
    Return,
}

/// Estado del ciclo de vida de una misión
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "mission_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MissionStatus {
    /// Solicitud de presupuesto del cliente, pendiente de confirmación
    Pending,
    /// Confirmada por un admin, sin chófer todavía
    Confirmed,
    /// Chófer asignado
    Assigned,
    /// Vehículo en ruta
    InTransit,
    /// Vehículo entregado, pendiente de cierre administrativo
    Delivered,
    /// Cerrada. Terminal.
    Completed,
    /// Incidencia reportada por el chófer
    Incident,
    /// Anulada. Terminal.
    Cancelled,
}

impl MissionStatus {
    /// ¿Existe la arista self → to en la máquina de estados?
    pub fn can_transition_to(self, to: MissionStatus) -> bool {
        use MissionStatus::*;
        matches!(
            (self, to),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, Assigned)
                | (Assigned, InTransit)
                | (Assigned, Cancelled)
                | (InTransit, Delivered)
                | (InTransit, Incident)
                | (Incident, Assigned) // reanudación tras incidencia
                | (Incident, Cancelled)
                | (Delivered, Completed)
        )
    }

    /// ¿Es un estado terminal?
    pub fn is_terminal(self) -> bool {
        matches!(self, MissionStatus::Completed | MissionStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MissionStatus::Pending => "pending",
            MissionStatus::Confirmed => "confirmed",
            MissionStatus::Assigned => "assigned",
            MissionStatus::InTransit => "in_transit",
            MissionStatus::Delivered => "delivered",
            MissionStatus::Completed => "completed",
            MissionStatus::Incident => "incident",
            MissionStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(MissionStatus::Pending),
            "confirmed" => Some(MissionStatus::Confirmed),
            "assigned" => Some(MissionStatus::Assigned),
            "in_transit" => Some(MissionStatus::InTransit),
            "delivered" => Some(MissionStatus::Delivered),
            "completed" => Some(MissionStatus::Completed),
            "incident" => Some(MissionStatus::Incident),
            "cancelled" => Some(MissionStatus::Cancelled),
            _ => None,
        }
    }

    /// Todos los estados, para tests exhaustivos y listados
    pub fn all() -> [MissionStatus; 8] {
        [
            MissionStatus::Pending,
            MissionStatus::Confirmed,
            MissionStatus::Assigned,
            MissionStatus::InTransit,
            MissionStatus::Delivered,
            MissionStatus::Completed,
            MissionStatus::Incident,
            MissionStatus::Cancelled,
        ]
    }
}

impl std::fmt::Display for MissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Contacto de recogida o de entrega (objeto de valor, embebido en la misión)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: Option<String>,
}

/// Descriptor libre del vehículo a convoyar (sin catálogo canónico)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleInfo {
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub fuel_type: String,
    pub license_plate: String,
}

/// Mission - mapea a la tabla missions
///
/// `vehicle_info`, `pickup_contact` y `delivery_contact` se persisten como
/// JSONB pero siempre tipados: la deserialización en el límite del store es
/// la validación de forma.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Mission {
    pub id: Uuid,
    pub mission_number: i64,
    pub mission_type: MissionType,
    pub status: MissionStatus,
    pub client_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub admin_id: Option<Uuid>,
    pub vehicle_category: String,
    pub vehicle_info: Json<VehicleInfo>,
    pub distance_km: Decimal,
    pub price_excl_tax: Decimal,
    pub price_incl_tax: Decimal,
    pub pickup_address: String,
    pub pickup_contact: Json<Contact>,
    pub pickup_at: DateTime<Utc>,
    pub delivery_address: String,
    pub delivery_contact: Json<Contact>,
    pub delivery_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
