//! Selector de despacho
//!
//! Valida y ejecuta la asignación manual de un chófer a una misión. La
//! elección del chófer es una decisión humana del admin: aquí no hay ningún
//! algoritmo de selección automática.

use std::sync::Arc;

use uuid::Uuid;

use crate::models::mission::{Mission, MissionStatus};
use crate::models::user::UserRole;
use crate::repositories::{MissionStore, UserDirectory};
use crate::services::lifecycle_service::LifecycleService;
use crate::utils::errors::{forbidden_error, not_found_error, AppError, AppResult};

pub struct DispatchService {
    lifecycle: Arc<LifecycleService>,
    missions: Arc<dyn MissionStore>,
    users: Arc<dyn UserDirectory>,
}

impl DispatchService {
    pub fn new(
        lifecycle: Arc<LifecycleService>,
        missions: Arc<dyn MissionStore>,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            lifecycle,
            missions,
            users,
        }
    }

    /// Asigna un chófer a una misión confirmada (o la reasigna tras una
    /// incidencia). El cambio de estado y el driver_id se escriben juntos en
    /// el orquestador: nunca hay asignación parcial.
    pub async fn assign_driver(
        &self,
        mission_id: Uuid,
        driver_id: Uuid,
        acting_role: UserRole,
        acting_user_id: Uuid,
    ) -> AppResult<Mission> {
        if acting_role != UserRole::Admin {
            return Err(forbidden_error(
                "assign driver",
                "only an admin may dispatch missions",
            ));
        }

        let mission = self
            .missions
            .find_by_id(mission_id)
            .await?
            .ok_or_else(|| not_found_error("Mission", &mission_id.to_string()))?;

        match self.users.find_by_id(driver_id).await? {
            Some(user) if user.role == UserRole::Driver => {}
            _ => return Err(AppError::UnknownDriver(driver_id)),
        }

        if !matches!(
            mission.status,
            MissionStatus::Confirmed | MissionStatus::Incident
        ) {
            return Err(AppError::InvalidTransition {
                from: mission.status,
                to: MissionStatus::Assigned,
                role: acting_role,
            });
        }

        self.lifecycle
            .apply_assignment(&mission, driver_id, acting_user_id)
            .await
    }
}
