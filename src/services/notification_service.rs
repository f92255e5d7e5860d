//! Canal de notificaciones
//!
//! Persiste una notificación por destinatario y difunde cada evento de
//! misión por un canal broadcast en proceso, desacoplado del transporte.
//! La entrega es mejor-esfuerzo: reintentos acotados con backoff y después
//! descarte con log. Un fallo aquí jamás revierte la transición que lo
//! originó.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::mission::{Mission, MissionStatus};
use crate::models::notification::{NewNotification, NotificationKind};
use crate::repositories::NotificationStore;
use crate::utils::errors::{AppError, AppResult};

/// Política de reintentos acotada, siempre inyectada desde configuración
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff: Duration::from_millis(200),
        }
    }
}

impl RetryPolicy {
    /// Backoff exponencial con jitter para el intento `attempt` (1-based)
    fn backoff_for(&self, attempt: u32) -> Duration {
        let exponential = self.base_backoff * 2u32.saturating_pow(attempt.saturating_sub(1));
        let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..50));
        exponential + jitter
    }
}

/// Evento de misión difundido a las partes interesadas suscritas
#[derive(Debug, Clone, Serialize)]
pub struct MissionEvent {
    pub mission_id: Uuid,
    pub mission_number: i64,
    pub status: MissionStatus,
    pub kind: NotificationKind,
}

/// Canal de notificaciones: persistencia + broadcast en proceso
pub struct NotificationService {
    store: Arc<dyn NotificationStore>,
    retry: RetryPolicy,
    events: broadcast::Sender<MissionEvent>,
}

impl NotificationService {
    pub fn new(store: Arc<dyn NotificationStore>, retry: RetryPolicy) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            store,
            retry,
            events,
        }
    }

    /// Suscripción al flujo de eventos de misión (sustituto del push en
    /// tiempo real; el polling sobre la tabla es la alternativa)
    pub fn subscribe(&self) -> broadcast::Receiver<MissionEvent> {
        self.events.subscribe()
    }

    /// Entrega una notificación a cada destinatario. Nunca devuelve error:
    /// los fallos se registran y se descartan tras agotar la política.
    pub async fn notify(
        &self,
        recipients: &[Uuid],
        mission: &Mission,
        kind: NotificationKind,
        message: &str,
    ) {
        // Broadcast mejor-esfuerzo; sin suscriptores no es un fallo
        let _ = self.events.send(MissionEvent {
            mission_id: mission.id,
            mission_number: mission.mission_number,
            status: mission.status,
            kind,
        });

        let deliveries = recipients.iter().map(|&user_id| {
            self.deliver_with_retry(NewNotification {
                user_id,
                mission_id: mission.id,
                kind,
                message: message.to_string(),
            })
        });

        for (recipient, result) in recipients.iter().zip(futures::future::join_all(deliveries).await) {
            if let Err(e) = result {
                log::warn!(
                    "⚠️ Notificación descartada para el usuario {}: {}",
                    recipient,
                    e
                );
            }
        }
    }

    async fn deliver_with_retry(&self, new: NewNotification) -> AppResult<()> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.store.insert(new.clone()).await {
                Ok(_) => return Ok(()),
                Err(e) if attempt >= self.retry.max_attempts => {
                    return Err(AppError::NotificationDelivery(format!(
                        "giving up after {} attempts: {}",
                        attempt, e
                    )));
                }
                Err(e) => {
                    log::warn!(
                        "Notification insert attempt {}/{} failed: {}",
                        attempt,
                        self.retry.max_attempts,
                        e
                    );
                    tokio::time::sleep(self.retry.backoff_for(attempt)).await;
                }
            }
        }
    }
}
