//! Tests de integración del selector de despacho.

mod common;

use convoyage_backend::models::mission::MissionStatus;
use convoyage_backend::models::notification::NotificationKind;
use convoyage_backend::models::user::UserRole;
use convoyage_backend::utils::errors::AppError;
use uuid::Uuid;

use common::*;

#[tokio::test]
async fn only_admins_may_dispatch() {
    let env = TestEnv::new();
    let mission = env.seed_mission(MissionStatus::Confirmed, None).await;

    for (role, acting_id) in [
        (UserRole::Client, env.client_id),
        (UserRole::Driver, env.driver_id),
    ] {
        let result = env
            .dispatch
            .assign_driver(mission.id, env.driver_id, role, acting_id)
            .await;
        assert!(
            matches!(result, Err(AppError::Forbidden(_))),
            "el rol '{}' no debería poder despachar",
            role
        );
    }

    let stored = env.missions.get(mission.id).await.unwrap();
    assert_eq!(stored.status, MissionStatus::Confirmed);
    assert_eq!(stored.driver_id, None);
}

#[tokio::test]
async fn unknown_driver_is_rejected() {
    let env = TestEnv::new();
    let mission = env.seed_mission(MissionStatus::Confirmed, None).await;

    // Id inexistente
    let missing = Uuid::new_v4();
    let result = env
        .dispatch
        .assign_driver(mission.id, missing, UserRole::Admin, env.admin_id)
        .await;
    assert!(matches!(result, Err(AppError::UnknownDriver(id)) if id == missing));

    // Id existente pero con rol de cliente
    let result = env
        .dispatch
        .assign_driver(mission.id, env.client_id, UserRole::Admin, env.admin_id)
        .await;
    assert!(matches!(result, Err(AppError::UnknownDriver(_))));

    let stored = env.missions.get(mission.id).await.unwrap();
    assert_eq!(stored.driver_id, None);
}

#[tokio::test]
async fn dispatch_requires_confirmed_or_incident_state() {
    for status in [
        MissionStatus::Pending,
        MissionStatus::Assigned,
        MissionStatus::InTransit,
        MissionStatus::Delivered,
        MissionStatus::Completed,
        MissionStatus::Cancelled,
    ] {
        let env = TestEnv::new();
        let mission = env.seed_mission(status, None).await;

        let result = env
            .dispatch
            .assign_driver(mission.id, env.driver_id, UserRole::Admin, env.admin_id)
            .await;

        assert!(
            matches!(result, Err(AppError::InvalidTransition { .. })),
            "no debería poder despacharse desde '{}'",
            status
        );

        let stored = env.missions.get(mission.id).await.unwrap();
        assert_eq!(stored.status, status);
        assert_eq!(stored.driver_id, None);
    }
}

#[tokio::test]
async fn assignment_sets_status_and_driver_together() {
    let env = TestEnv::new();
    let mission = env.seed_mission(MissionStatus::Confirmed, None).await;

    let updated = env
        .dispatch
        .assign_driver(mission.id, env.driver_id, UserRole::Admin, env.admin_id)
        .await
        .unwrap();

    assert_eq!(updated.status, MissionStatus::Assigned);
    assert_eq!(updated.driver_id, Some(env.driver_id));

    let stored = env.missions.get(mission.id).await.unwrap();
    assert_eq!(stored.status, MissionStatus::Assigned);
    assert_eq!(stored.driver_id, Some(env.driver_id));

    // Chófer y cliente reciben la notificación de asignación
    let driver_inbox = wait_for_notifications(&env.notifications, env.driver_id, 1).await;
    assert_eq!(driver_inbox.len(), 1);
    assert_eq!(driver_inbox[0].kind, NotificationKind::DriverAssigned);

    let client_inbox = wait_for_notifications(&env.notifications, env.client_id, 1).await;
    assert_eq!(client_inbox.len(), 1);
}

#[tokio::test]
async fn reassignment_after_incident_replaces_the_driver() {
    let env = TestEnv::new();
    let mission = env
        .seed_mission(MissionStatus::Incident, Some(env.driver_id))
        .await;

    let updated = env
        .dispatch
        .assign_driver(
            mission.id,
            env.second_driver_id,
            UserRole::Admin,
            env.admin_id,
        )
        .await
        .unwrap();

    assert_eq!(updated.status, MissionStatus::Assigned);
    assert_eq!(updated.driver_id, Some(env.second_driver_id));

    let inbox = wait_for_notifications(&env.notifications, env.second_driver_id, 1).await;
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].kind, NotificationKind::DriverAssigned);
}

#[tokio::test]
async fn lost_assignment_race_changes_nothing() {
    let env = TestEnv::with_conflicting_store();
    let mission = env.seed_mission(MissionStatus::Confirmed, None).await;

    let result = env
        .dispatch
        .assign_driver(mission.id, env.driver_id, UserRole::Admin, env.admin_id)
        .await;

    assert!(matches!(result, Err(AppError::Conflict(_))));

    // Sin asignación parcial: ni estado ni chófer cambian
    let stored = env.missions.get(mission.id).await.unwrap();
    assert_eq!(stored.status, MissionStatus::Confirmed);
    assert_eq!(stored.driver_id, None);
}

#[tokio::test]
async fn dispatch_on_missing_mission_is_not_found() {
    let env = TestEnv::new();

    let result = env
        .dispatch
        .assign_driver(Uuid::new_v4(), env.driver_id, UserRole::Admin, env.admin_id)
        .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}
