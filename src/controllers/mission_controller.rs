use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::dto::common::ApiResponse;
use crate::dto::mission_dto::{
    AssignDriverRequest, CreateMissionRequest, MissionListQuery, MissionResponse,
    RegisterAttachmentRequest, TransitionRequest,
};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::attachment::Attachment;
use crate::models::mission::{Mission, MissionStatus};
use crate::models::user::UserRole;
use crate::repositories::attachment_repository::AttachmentRepository;
use crate::repositories::{MissionFilter, MissionStore};
use crate::services::dispatch_service::DispatchService;
use crate::services::lifecycle_service::LifecycleService;
use crate::state::AppState;
use crate::utils::errors::{forbidden_error, not_found_error, AppError, AppResult};

pub struct MissionController {
    lifecycle: Arc<LifecycleService>,
    dispatch: Arc<DispatchService>,
    missions: Arc<dyn MissionStore>,
    attachments: AttachmentRepository,
}

impl MissionController {
    pub fn new(state: &AppState) -> Self {
        Self {
            lifecycle: state.lifecycle.clone(),
            dispatch: state.dispatch.clone(),
            missions: state.missions.clone(),
            attachments: AttachmentRepository::new(state.pool.clone()),
        }
    }

    pub async fn create(
        &self,
        user: AuthenticatedUser,
        request: CreateMissionRequest,
    ) -> AppResult<ApiResponse<MissionResponse>> {
        let mission = self
            .lifecycle
            .create_mission(request, user.role, user.user_id)
            .await?;

        Ok(ApiResponse::success_with_message(
            mission.into(),
            "Misión creada exitosamente".to_string(),
        ))
    }

    pub async fn get_by_id(
        &self,
        user: AuthenticatedUser,
        id: Uuid,
    ) -> AppResult<MissionResponse> {
        let mission = self.load_scoped(&user, id).await?;
        Ok(mission.into())
    }

    pub async fn list(
        &self,
        user: AuthenticatedUser,
        query: MissionListQuery,
    ) -> AppResult<Vec<MissionResponse>> {
        let status = match query.status {
            Some(raw) => Some(MissionStatus::from_str(&raw).ok_or_else(|| {
                AppError::BadRequest(format!("unknown status filter '{}'", raw))
            })?),
            None => None,
        };

        // El alcance del listado depende del rol: un admin lo ve todo, un
        // cliente sus misiones, un chófer las que tiene asignadas.
        let filter = match user.role {
            UserRole::Admin => MissionFilter {
                status,
                ..Default::default()
            },
            UserRole::Client => MissionFilter {
                status,
                client_id: Some(user.user_id),
                ..Default::default()
            },
            UserRole::Driver => MissionFilter {
                status,
                driver_id: Some(user.user_id),
                ..Default::default()
            },
        };

        let missions = self.missions.list(filter).await?;
        Ok(missions.into_iter().map(MissionResponse::from).collect())
    }

    pub async fn transition(
        &self,
        user: AuthenticatedUser,
        id: Uuid,
        request: TransitionRequest,
    ) -> AppResult<ApiResponse<MissionResponse>> {
        let mission = self
            .lifecycle
            .request_transition(id, request.target_status, user.role, user.user_id)
            .await?;

        Ok(ApiResponse::success_with_message(
            mission.into(),
            "Estado actualizado exitosamente".to_string(),
        ))
    }

    pub async fn assign(
        &self,
        user: AuthenticatedUser,
        id: Uuid,
        request: AssignDriverRequest,
    ) -> AppResult<ApiResponse<MissionResponse>> {
        let mission = self
            .dispatch
            .assign_driver(id, request.driver_id, user.role, user.user_id)
            .await?;

        Ok(ApiResponse::success_with_message(
            mission.into(),
            "Chófer asignado exitosamente".to_string(),
        ))
    }

    pub async fn recalculate(
        &self,
        user: AuthenticatedUser,
        id: Uuid,
    ) -> AppResult<ApiResponse<MissionResponse>> {
        let mission = self.lifecycle.recalculate_terms(id, user.role).await?;

        Ok(ApiResponse::success_with_message(
            mission.into(),
            "Términos recalculados exitosamente".to_string(),
        ))
    }

    pub async fn list_attachments(
        &self,
        user: AuthenticatedUser,
        id: Uuid,
    ) -> AppResult<Vec<Attachment>> {
        self.load_scoped(&user, id).await?;
        self.attachments.list_for_mission(id).await
    }

    pub async fn register_attachment(
        &self,
        user: AuthenticatedUser,
        id: Uuid,
        request: RegisterAttachmentRequest,
    ) -> AppResult<ApiResponse<Attachment>> {
        request.validate()?;
        self.load_scoped(&user, id).await?;

        let attachment = self
            .attachments
            .insert(
                id,
                request.filename,
                request.storage_path,
                request.size_bytes,
                request.mime_type,
                user.user_id,
            )
            .await?;

        Ok(ApiResponse::success_with_message(
            attachment,
            "Adjunto registrado exitosamente".to_string(),
        ))
    }

    /// Carga una misión aplicando el alcance de lectura del rol
    async fn load_scoped(&self, user: &AuthenticatedUser, id: Uuid) -> AppResult<Mission> {
        let mission = self
            .missions
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Mission", &id.to_string()))?;

        let allowed = match user.role {
            UserRole::Admin => true,
            UserRole::Client => mission.client_id == user.user_id,
            UserRole::Driver => mission.driver_id == Some(user.user_id),
        };

        if !allowed {
            return Err(forbidden_error(
                "access mission",
                "the mission does not belong to the acting user",
            ));
        }

        Ok(mission)
    }
}
