//! Orquestador del ciclo de vida de misiones
//!
//! Único punto de mutación del estado de una misión. Aplica la máquina de
//! estados, las reglas de rol y propiedad, la concurrencia optimista contra
//! el store y la emisión de notificaciones tras cada transición.

use std::sync::Arc;

use uuid::Uuid;

use crate::dto::mission_dto::CreateMissionRequest;
use crate::models::mission::{Mission, MissionStatus};
use crate::models::notification::NotificationKind;
use crate::models::user::UserRole;
use crate::repositories::{MissionStore, NewMission, UserDirectory};
use crate::services::distance_service::DistanceResolver;
use crate::services::notification_service::NotificationService;
use crate::services::pricing_service::PricingService;
use crate::utils::errors::{conflict_error, forbidden_error, not_found_error, AppError, AppResult};
use validator::Validate;

/// Destinatario simbólico de una notificación de transición
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyTarget {
    Client,
    Driver,
    Admin,
}

/// Una arista de la máquina de estados: roles que pueden recorrerla y
/// partes a notificar cuando se recorre.
#[derive(Debug)]
pub struct TransitionRule {
    pub from: MissionStatus,
    pub to: MissionStatus,
    pub roles: &'static [UserRole],
    pub notify: &'static [NotifyTarget],
}

/// Tabla de transiciones. Es la única fuente de verdad de la máquina de
/// estados: cualquier par (from, to) ausente es una transición inválida.
/// El actor de la transición nunca se notifica a sí mismo, lo que cubre el
/// "notificar a la otra parte" de las cancelaciones de `pending`.
pub const TRANSITION_RULES: &[TransitionRule] = &[
    TransitionRule {
        from: MissionStatus::Pending,
        to: MissionStatus::Confirmed,
        roles: &[UserRole::Admin],
        notify: &[NotifyTarget::Client],
    },
    TransitionRule {
        from: MissionStatus::Pending,
        to: MissionStatus::Cancelled,
        roles: &[UserRole::Admin, UserRole::Client],
        notify: &[NotifyTarget::Client, NotifyTarget::Admin],
    },
    TransitionRule {
        from: MissionStatus::Confirmed,
        to: MissionStatus::Assigned,
        roles: &[UserRole::Admin],
        notify: &[NotifyTarget::Driver, NotifyTarget::Client],
    },
    TransitionRule {
        from: MissionStatus::Assigned,
        to: MissionStatus::InTransit,
        roles: &[UserRole::Driver],
        notify: &[NotifyTarget::Client],
    },
    TransitionRule {
        from: MissionStatus::Assigned,
        to: MissionStatus::Cancelled,
        roles: &[UserRole::Admin],
        notify: &[NotifyTarget::Client, NotifyTarget::Driver],
    },
    TransitionRule {
        from: MissionStatus::InTransit,
        to: MissionStatus::Delivered,
        roles: &[UserRole::Driver],
        notify: &[NotifyTarget::Client, NotifyTarget::Admin],
    },
    TransitionRule {
        from: MissionStatus::InTransit,
        to: MissionStatus::Incident,
        roles: &[UserRole::Driver],
        notify: &[NotifyTarget::Admin],
    },
    TransitionRule {
        from: MissionStatus::Incident,
        to: MissionStatus::Assigned,
        roles: &[UserRole::Admin],
        notify: &[NotifyTarget::Driver],
    },
    TransitionRule {
        from: MissionStatus::Incident,
        to: MissionStatus::Cancelled,
        roles: &[UserRole::Admin],
        notify: &[NotifyTarget::Client, NotifyTarget::Driver],
    },
    TransitionRule {
        from: MissionStatus::Delivered,
        to: MissionStatus::Completed,
        roles: &[UserRole::Admin],
        notify: &[NotifyTarget::Client],
    },
];

/// Busca la regla de la arista (from → to), si existe
pub fn find_rule(from: MissionStatus, to: MissionStatus) -> Option<&'static TransitionRule> {
    TRANSITION_RULES
        .iter()
        .find(|rule| rule.from == from && rule.to == to)
}

/// Orquestador del ciclo de vida
pub struct LifecycleService {
    missions: Arc<dyn MissionStore>,
    users: Arc<dyn UserDirectory>,
    notifier: Arc<NotificationService>,
    distance: Arc<dyn DistanceResolver>,
    pricing: PricingService,
}

impl LifecycleService {
    pub fn new(
        missions: Arc<dyn MissionStore>,
        users: Arc<dyn UserDirectory>,
        notifier: Arc<NotificationService>,
        distance: Arc<dyn DistanceResolver>,
        pricing: PricingService,
    ) -> Self {
        Self {
            missions,
            users,
            notifier,
            distance,
            pricing,
        }
    }

    /// Crea una misión. Todo-o-nada: si la resolución de distancia o el
    /// cálculo del precio fallan, no se persiste nada.
    pub async fn create_mission(
        &self,
        request: CreateMissionRequest,
        acting_role: UserRole,
        acting_user_id: Uuid,
    ) -> AppResult<Mission> {
        request.validate()?;

        let (client_id, admin_id, status) = match acting_role {
            UserRole::Client => (acting_user_id, None, MissionStatus::Pending),
            UserRole::Admin => {
                let client_id = request.client_id.ok_or_else(|| {
                    AppError::BadRequest(
                        "client_id is required when an admin creates a mission".to_string(),
                    )
                })?;
                match self.users.find_by_id(client_id).await? {
                    Some(user) if user.role == UserRole::Client => {}
                    _ => {
                        return Err(AppError::BadRequest(format!(
                            "client_id '{}' does not reference a client",
                            client_id
                        )))
                    }
                }
                (client_id, Some(acting_user_id), MissionStatus::Confirmed)
            }
            UserRole::Driver => {
                return Err(forbidden_error(
                    "create mission",
                    "drivers may not create missions",
                ))
            }
        };

        // Términos comerciales: distancia y precio, síncronos y bloqueantes.
        // La misión no puede existir sin ellos.
        let distance_km = self
            .distance
            .resolve_km(&request.pickup_address, &request.delivery_address)
            .await?;
        let quote = self.pricing.quote(&request.vehicle_category, distance_km)?;

        let mission = self
            .missions
            .insert(NewMission {
                mission_type: request.mission_type,
                status,
                client_id,
                admin_id,
                vehicle_category: request.vehicle_category,
                vehicle_info: request.vehicle.into(),
                distance_km,
                price_excl_tax: quote.price_excl_tax,
                price_incl_tax: quote.price_incl_tax,
                pickup_address: request.pickup_address,
                pickup_contact: request.pickup_contact.into(),
                pickup_at: request.pickup_at,
                delivery_address: request.delivery_address,
                delivery_contact: request.delivery_contact.into(),
                delivery_at: request.delivery_at,
                notes: request.notes,
            })
            .await?;

        log::info!(
            "🚗 Misión n.º {} creada ({} km, {} € sin IVA, estado '{}')",
            mission.mission_number,
            mission.distance_km,
            mission.price_excl_tax,
            mission.status
        );

        Ok(mission)
    }

    /// Solicita una transición de estado para una misión.
    ///
    /// Orden de validación: existencia → propiedad → arista → rol →
    /// escritura condicional. En cualquier fallo la fila queda intacta.
    pub async fn request_transition(
        &self,
        mission_id: Uuid,
        target_status: MissionStatus,
        acting_role: UserRole,
        acting_user_id: Uuid,
    ) -> AppResult<Mission> {
        let mission = self
            .missions
            .find_by_id(mission_id)
            .await?
            .ok_or_else(|| not_found_error("Mission", &mission_id.to_string()))?;

        check_ownership(&mission, acting_role, acting_user_id)?;

        let rule = find_rule(mission.status, target_status).ok_or(AppError::InvalidTransition {
            from: mission.status,
            to: target_status,
            role: acting_role,
        })?;

        if !rule.roles.contains(&acting_role) {
            return Err(forbidden_error(
                "transition mission",
                &format!(
                    "role '{}' may not move a mission from '{}' to '{}'",
                    acting_role, mission.status, target_status
                ),
            ));
        }

        // Reanudación tras incidencia: solo tiene sentido con el chófer aún
        // asignado; una reasignación pasa por el selector de despacho.
        if target_status == MissionStatus::Assigned && mission.driver_id.is_none() {
            return Err(AppError::BadRequest(
                "mission has no driver; use the dispatch operation to assign one".to_string(),
            ));
        }

        let updated = self
            .missions
            .update_status(mission.id, mission.status, target_status)
            .await?
            .ok_or_else(|| conflict_error("Mission", &mission.id.to_string()))?;

        log::info!(
            "🔄 Misión n.º {}: '{}' → '{}' por rol '{}'",
            updated.mission_number,
            mission.status,
            updated.status,
            acting_role
        );

        let message = format!(
            "La misión n.º {} ha pasado al estado '{}'",
            updated.mission_number, updated.status
        );
        self.spawn_notifications(
            rule,
            updated.clone(),
            acting_user_id,
            NotificationKind::StatusChanged,
            message,
        );

        Ok(updated)
    }

    /// Transición a `assigned` con persistencia del chófer en la misma
    /// escritura atómica. Solo el selector de despacho llega aquí, ya con el
    /// chófer validado y el estado de partida comprobado.
    pub(crate) async fn apply_assignment(
        &self,
        mission: &Mission,
        driver_id: Uuid,
        acting_user_id: Uuid,
    ) -> AppResult<Mission> {
        let rule =
            find_rule(mission.status, MissionStatus::Assigned).ok_or(AppError::InvalidTransition {
                from: mission.status,
                to: MissionStatus::Assigned,
                role: UserRole::Admin,
            })?;

        let updated = self
            .missions
            .update_status_and_driver(mission.id, mission.status, MissionStatus::Assigned, driver_id)
            .await?
            .ok_or_else(|| conflict_error("Mission", &mission.id.to_string()))?;

        log::info!(
            "🧑‍✈️ Misión n.º {}: chófer {} asignado ('{}' → 'assigned')",
            updated.mission_number,
            driver_id,
            mission.status
        );

        let message = format!(
            "Se ha asignado un chófer a la misión n.º {}",
            updated.mission_number
        );
        self.spawn_notifications(
            rule,
            updated.clone(),
            acting_user_id,
            NotificationKind::DriverAssigned,
            message,
        );

        Ok(updated)
    }

    /// Recalcula los términos comerciales de una misión. Única vía de cambio
    /// de precio tras la creación; reservada a admins.
    pub async fn recalculate_terms(
        &self,
        mission_id: Uuid,
        acting_role: UserRole,
    ) -> AppResult<Mission> {
        if acting_role != UserRole::Admin {
            return Err(forbidden_error(
                "recalculate mission terms",
                "only an admin may edit commercial terms",
            ));
        }

        let mission = self
            .missions
            .find_by_id(mission_id)
            .await?
            .ok_or_else(|| not_found_error("Mission", &mission_id.to_string()))?;

        if mission.status.is_terminal() {
            return Err(AppError::BadRequest(format!(
                "cannot recalculate terms of a mission in terminal state '{}'",
                mission.status
            )));
        }

        let distance_km = self
            .distance
            .resolve_km(&mission.pickup_address, &mission.delivery_address)
            .await?;
        let quote = self.pricing.quote(&mission.vehicle_category, distance_km)?;

        let updated = self
            .missions
            .update_terms(
                mission.id,
                distance_km,
                quote.price_excl_tax,
                quote.price_incl_tax,
            )
            .await?
            .ok_or_else(|| not_found_error("Mission", &mission.id.to_string()))?;

        log::info!(
            "💶 Misión n.º {}: términos recalculados ({} km, {} € sin IVA)",
            updated.mission_number,
            updated.distance_km,
            updated.price_excl_tax
        );

        Ok(updated)
    }

    /// Emite las notificaciones de una transición fuera de la ruta crítica.
    /// El commit de estado ya ocurrió: un fallo aquí solo se registra.
    fn spawn_notifications(
        &self,
        rule: &'static TransitionRule,
        mission: Mission,
        acting_user_id: Uuid,
        kind: NotificationKind,
        message: String,
    ) {
        let notifier = self.notifier.clone();
        let users = self.users.clone();

        tokio::spawn(async move {
            let mut recipients: Vec<Uuid> = Vec::new();
            for target in rule.notify {
                match target {
                    NotifyTarget::Client => recipients.push(mission.client_id),
                    NotifyTarget::Driver => {
                        if let Some(driver_id) = mission.driver_id {
                            recipients.push(driver_id);
                        }
                    }
                    NotifyTarget::Admin => {
                        if let Some(admin_id) = mission.admin_id {
                            recipients.push(admin_id);
                        } else {
                            match users.admin_ids().await {
                                Ok(ids) => recipients.extend(ids),
                                Err(e) => {
                                    log::warn!("No se pudo resolver los admins a notificar: {}", e)
                                }
                            }
                        }
                    }
                }
            }

            recipients.sort();
            recipients.dedup();
            recipients.retain(|&id| id != acting_user_id);

            notifier.notify(&recipients, &mission, kind, &message).await;
        });
    }
}

/// Propiedad sobre la misión: un cliente solo opera sus misiones, un chófer
/// solo las que tiene asignadas, un admin no tiene restricción.
fn check_ownership(mission: &Mission, acting_role: UserRole, acting_user_id: Uuid) -> AppResult<()> {
    let owns = match acting_role {
        UserRole::Admin => true,
        UserRole::Client => mission.client_id == acting_user_id,
        UserRole::Driver => mission.driver_id == Some(acting_user_id),
    };

    if owns {
        Ok(())
    } else {
        Err(forbidden_error(
            "operate on mission",
            "the mission does not belong to the acting user",
        ))
    }
}
