use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::mission_controller::MissionController;
use crate::dto::common::ApiResponse;
use crate::dto::mission_dto::{
    AssignDriverRequest, CreateMissionRequest, MissionListQuery, MissionResponse,
    RegisterAttachmentRequest, TransitionRequest,
};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::attachment::Attachment;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_mission_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_mission).get(list_missions))
        .route("/:id", get(get_mission))
        .route("/:id/transition", post(transition_mission))
        .route("/:id/assign", post(assign_driver))
        .route("/:id/recalculate", post(recalculate_terms))
        .route("/:id/attachments", get(list_attachments).post(register_attachment))
}

async fn create_mission(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<CreateMissionRequest>,
) -> Result<Json<ApiResponse<MissionResponse>>, AppError> {
    let controller = MissionController::new(&state);
    let response = controller.create(user, request).await?;
    Ok(Json(response))
}

async fn list_missions(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<MissionListQuery>,
) -> Result<Json<Vec<MissionResponse>>, AppError> {
    let controller = MissionController::new(&state);
    let response = controller.list(user, query).await?;
    Ok(Json(response))
}

async fn get_mission(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<MissionResponse>, AppError> {
    let controller = MissionController::new(&state);
    let response = controller.get_by_id(user, id).await?;
    Ok(Json(response))
}

async fn transition_mission(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<TransitionRequest>,
) -> Result<Json<ApiResponse<MissionResponse>>, AppError> {
    let controller = MissionController::new(&state);
    let response = controller.transition(user, id, request).await?;
    Ok(Json(response))
}

async fn assign_driver(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<AssignDriverRequest>,
) -> Result<Json<ApiResponse<MissionResponse>>, AppError> {
    let controller = MissionController::new(&state);
    let response = controller.assign(user, id, request).await?;
    Ok(Json(response))
}

async fn recalculate_terms(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<MissionResponse>>, AppError> {
    let controller = MissionController::new(&state);
    let response = controller.recalculate(user, id).await?;
    Ok(Json(response))
}

async fn list_attachments(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Attachment>>, AppError> {
    let controller = MissionController::new(&state);
    let response = controller.list_attachments(user, id).await?;
    Ok(Json(response))
}

async fn register_attachment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<RegisterAttachmentRequest>,
) -> Result<Json<ApiResponse<Attachment>>, AppError> {
    let controller = MissionController::new(&state);
    let response = controller.register_attachment(user, id, request).await?;
    Ok(Json(response))
}
