//! Sistema de manejo de errores
//!
//! Este módulo define todos los tipos de errores del sistema
//! y su conversión a respuestas HTTP apropiadas.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::models::mission::MissionStatus;
use crate::models::user::UserRole;

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Colisión de concurrencia optimista: el estado leído ya no es el actual.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// La arista (from → to) no existe en la tabla de transiciones.
    #[error("Invalid transition from '{from}' to '{to}' requested by role '{role}'")]
    InvalidTransition {
        from: MissionStatus,
        to: MissionStatus,
        role: UserRole,
    },

    #[error("Unknown vehicle category: {0}")]
    UnknownCategory(String),

    #[error("Unknown driver: {0}")]
    UnknownDriver(Uuid),

    #[error("Geocoding failed: {0}")]
    GeocodeFailed(String),

    #[error("Route unavailable: {0}")]
    RouteUnavailable(String),

    /// No fatal: se registra en logs y nunca aborta la transición padre.
    #[error("Notification delivery failed: {0}")]
    NotificationDelivery(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Respuesta de error para la API
#[derive(Debug, serde::Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_response) = match self {
            AppError::Database(e) => {
                log::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "Database Error".to_string(),
                        message: "An error occurred while accessing the database".to_string(),
                        details: Some(json!({ "sql_error": e.to_string() })),
                        code: Some("DB_ERROR".to_string()),
                    },
                )
            }

            AppError::Validation(e) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: "Validation Error".to_string(),
                    message: "The provided data is invalid".to_string(),
                    details: Some(json!(e)),
                    code: Some("VALIDATION_ERROR".to_string()),
                },
            ),

            AppError::Unauthorized(msg) => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse {
                    error: "Unauthorized".to_string(),
                    message: msg,
                    details: None,
                    code: Some("UNAUTHORIZED".to_string()),
                },
            ),

            AppError::Forbidden(msg) => (
                StatusCode::FORBIDDEN,
                ErrorResponse {
                    error: "Forbidden".to_string(),
                    message: msg,
                    details: None,
                    code: Some("FORBIDDEN".to_string()),
                },
            ),

            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorResponse {
                    error: "Not Found".to_string(),
                    message: msg,
                    details: None,
                    code: Some("NOT_FOUND".to_string()),
                },
            ),

            AppError::Conflict(msg) => (
                StatusCode::CONFLICT,
                ErrorResponse {
                    error: "Conflict".to_string(),
                    message: msg,
                    details: None,
                    code: Some("CONFLICT".to_string()),
                },
            ),

            AppError::InvalidTransition { from, to, role } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorResponse {
                    error: "Invalid Transition".to_string(),
                    message: format!(
                        "Cannot move a mission from '{}' to '{}' as role '{}'",
                        from, to, role
                    ),
                    details: Some(json!({
                        "current_status": from.as_str(),
                        "requested_status": to.as_str(),
                        "acting_role": role.as_str(),
                    })),
                    code: Some("INVALID_TRANSITION".to_string()),
                },
            ),

            AppError::UnknownCategory(category) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorResponse {
                    error: "Unknown Category".to_string(),
                    message: format!("No rate entry for vehicle category '{}'", category),
                    details: None,
                    code: Some("UNKNOWN_CATEGORY".to_string()),
                },
            ),

            AppError::UnknownDriver(driver_id) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorResponse {
                    error: "Unknown Driver".to_string(),
                    message: format!("No driver with id '{}'", driver_id),
                    details: None,
                    code: Some("UNKNOWN_DRIVER".to_string()),
                },
            ),

            AppError::GeocodeFailed(msg) => (
                StatusCode::BAD_GATEWAY,
                ErrorResponse {
                    error: "Geocode Failed".to_string(),
                    message: msg,
                    details: None,
                    code: Some("GEOCODE_FAILED".to_string()),
                },
            ),

            AppError::RouteUnavailable(msg) => (
                StatusCode::BAD_GATEWAY,
                ErrorResponse {
                    error: "Route Unavailable".to_string(),
                    message: msg,
                    details: None,
                    code: Some("ROUTE_UNAVAILABLE".to_string()),
                },
            ),

            AppError::NotificationDelivery(msg) => {
                // Nunca debería salir por HTTP: se traga en el orquestador.
                log::warn!("Notification delivery surfaced to HTTP layer: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "Notification Delivery Failed".to_string(),
                        message: msg,
                        details: None,
                        code: Some("NOTIFICATION_DELIVERY_FAILED".to_string()),
                    },
                )
            }

            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: "Bad Request".to_string(),
                    message: msg,
                    details: None,
                    code: Some("BAD_REQUEST".to_string()),
                },
            ),

            AppError::Internal(msg) => {
                log::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "Internal Server Error".to_string(),
                        message: "An unexpected error occurred".to_string(),
                        details: Some(json!({ "internal_error": msg })),
                        code: Some("INTERNAL_ERROR".to_string()),
                    },
                )
            }
        };

        (status, Json(error_response)).into_response()
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;

/// Función helper para crear errores de recurso no encontrado
pub fn not_found_error(resource: &str, id: &str) -> AppError {
    AppError::NotFound(format!("{} with id '{}' not found", resource, id))
}

/// Función helper para crear errores de acceso prohibido
pub fn forbidden_error(operation: &str, reason: &str) -> AppError {
    AppError::Forbidden(format!("Cannot {}: {}", operation, reason))
}

/// Función helper para crear errores de conflicto de concurrencia
pub fn conflict_error(resource: &str, id: &str) -> AppError {
    AppError::Conflict(format!(
        "{} '{}' was modified concurrently, retry with a fresh read",
        resource, id
    ))
}
