//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum: pool de base de datos, configuración y los
//! servicios de dominio ya cableados con sus colaboradores.

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;

use crate::config::environment::EnvironmentConfig;
use crate::repositories::mission_repository::MissionRepository;
use crate::repositories::notification_repository::NotificationRepository;
use crate::repositories::user_repository::UserRepository;
use crate::repositories::{MissionStore, NotificationStore, UserDirectory};
use crate::services::dispatch_service::DispatchService;
use crate::services::distance_service::{DistanceResolver, MapboxDistanceService};
use crate::services::lifecycle_service::LifecycleService;
use crate::services::notification_service::{NotificationService, RetryPolicy};
use crate::services::pricing_service::PricingService;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: EnvironmentConfig,
    pub missions: Arc<dyn MissionStore>,
    pub users: Arc<dyn UserDirectory>,
    pub notifications: Arc<dyn NotificationStore>,
    pub notifier: Arc<NotificationService>,
    pub lifecycle: Arc<LifecycleService>,
    pub dispatch: Arc<DispatchService>,
}

impl AppState {
    pub fn new(pool: PgPool, config: EnvironmentConfig) -> Self {
        let missions: Arc<dyn MissionStore> = Arc::new(MissionRepository::new(pool.clone()));
        let users: Arc<dyn UserDirectory> = Arc::new(UserRepository::new(pool.clone()));
        let notifications: Arc<dyn NotificationStore> =
            Arc::new(NotificationRepository::new(pool.clone()));

        let notifier = Arc::new(NotificationService::new(
            notifications.clone(),
            RetryPolicy {
                max_attempts: config.notify_max_attempts,
                base_backoff: Duration::from_millis(config.notify_backoff_ms),
            },
        ));

        let distance: Arc<dyn DistanceResolver> = Arc::new(MapboxDistanceService::new(
            config.mapbox_token.clone().unwrap_or_default(),
            Duration::from_secs(config.distance_timeout_secs),
        ));

        let lifecycle = Arc::new(LifecycleService::new(
            missions.clone(),
            users.clone(),
            notifier.clone(),
            distance,
            PricingService::with_default_rates(),
        ));

        let dispatch = Arc::new(DispatchService::new(
            lifecycle.clone(),
            missions.clone(),
            users.clone(),
        ));

        Self {
            pool,
            config,
            missions,
            users,
            notifications,
            notifier,
            lifecycle,
            dispatch,
        }
    }
}
