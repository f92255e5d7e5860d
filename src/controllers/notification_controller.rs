use std::sync::Arc;

use uuid::Uuid;

use crate::dto::common::ApiResponse;
use crate::dto::notification_dto::NotificationResponse;
use crate::middleware::auth::AuthenticatedUser;
use crate::repositories::NotificationStore;
use crate::state::AppState;
use crate::utils::errors::{not_found_error, AppResult};

pub struct NotificationController {
    notifications: Arc<dyn NotificationStore>,
}

impl NotificationController {
    pub fn new(state: &AppState) -> Self {
        Self {
            notifications: state.notifications.clone(),
        }
    }

    pub async fn list(&self, user: AuthenticatedUser) -> AppResult<Vec<NotificationResponse>> {
        let notifications = self.notifications.list_for_user(user.user_id).await?;
        Ok(notifications
            .into_iter()
            .map(NotificationResponse::from)
            .collect())
    }

    pub async fn mark_read(
        &self,
        user: AuthenticatedUser,
        id: Uuid,
    ) -> AppResult<ApiResponse<NotificationResponse>> {
        // Solo el destinatario puede marcar como leída: el filtro por
        // user_id hace que la de otro usuario simplemente no exista.
        let notification = self
            .notifications
            .mark_read(id, user.user_id)
            .await?
            .ok_or_else(|| not_found_error("Notification", &id.to_string()))?;

        Ok(ApiResponse::success_with_message(
            notification.into(),
            "Notificación marcada como leída".to_string(),
        ))
    }
}
