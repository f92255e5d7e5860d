use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::notification_controller::NotificationController;
use crate::dto::common::ApiResponse;
use crate::dto::notification_dto::NotificationResponse;
use crate::middleware::auth::AuthenticatedUser;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_notification_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_notifications))
        .route("/:id/read", post(mark_notification_read))
}

async fn list_notifications(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<NotificationResponse>>, AppError> {
    let controller = NotificationController::new(&state);
    let response = controller.list(user).await?;
    Ok(Json(response))
}

async fn mark_notification_read(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<NotificationResponse>>, AppError> {
    let controller = NotificationController::new(&state);
    let response = controller.mark_read(user, id).await?;
    Ok(Json(response))
}
