//! Fixtures de test: implementaciones en memoria de los colaboradores
//! externos (store de misiones, directorio de usuarios, store de
//! notificaciones, proveedor de distancias).

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use tokio::sync::Mutex;
use uuid::Uuid;

use convoyage_backend::dto::mission_dto::{ContactInput, CreateMissionRequest, VehicleInput};
use convoyage_backend::models::mission::{
    Contact, Mission, MissionStatus, MissionType, VehicleInfo,
};
use convoyage_backend::models::notification::{NewNotification, Notification};
use convoyage_backend::models::user::{User, UserRole};
use convoyage_backend::repositories::{
    MissionFilter, MissionStore, NewMission, NotificationStore, UserDirectory,
};
use convoyage_backend::services::dispatch_service::DispatchService;
use convoyage_backend::services::distance_service::DistanceResolver;
use convoyage_backend::services::lifecycle_service::LifecycleService;
use convoyage_backend::services::notification_service::{NotificationService, RetryPolicy};
use convoyage_backend::services::pricing_service::PricingService;
use convoyage_backend::utils::errors::{AppError, AppResult};

// ---------------------------------------------------------------------------
// Mission store en memoria
// ---------------------------------------------------------------------------

pub struct InMemoryMissionStore {
    missions: Mutex<HashMap<Uuid, Mission>>,
    seq: AtomicI64,
}

impl InMemoryMissionStore {
    pub fn new() -> Self {
        Self {
            missions: Mutex::new(HashMap::new()),
            seq: AtomicI64::new(1),
        }
    }

    /// Siembra una misión en un estado arbitrario
    pub async fn put(&self, mission: Mission) {
        self.missions.lock().await.insert(mission.id, mission);
    }

    pub async fn get(&self, id: Uuid) -> Option<Mission> {
        self.missions.lock().await.get(&id).cloned()
    }

    pub async fn count(&self) -> usize {
        self.missions.lock().await.len()
    }
}

#[async_trait]
impl MissionStore for InMemoryMissionStore {
    async fn insert(&self, new: NewMission) -> AppResult<Mission> {
        let now = Utc::now();
        let mission = Mission {
            id: Uuid::new_v4(),
            mission_number: self.seq.fetch_add(1, Ordering::SeqCst),
            mission_type: new.mission_type,
            status: new.status,
            client_id: new.client_id,
            driver_id: None,
            admin_id: new.admin_id,
            vehicle_category: new.vehicle_category,
            vehicle_info: Json(new.vehicle_info),
            distance_km: new.distance_km,
            price_excl_tax: new.price_excl_tax,
            price_incl_tax: new.price_incl_tax,
            pickup_address: new.pickup_address,
            pickup_contact: Json(new.pickup_contact),
            pickup_at: new.pickup_at,
            delivery_address: new.delivery_address,
            delivery_contact: Json(new.delivery_contact),
            delivery_at: new.delivery_at,
            notes: new.notes,
            created_at: now,
            updated_at: now,
        };

        self.missions.lock().await.insert(mission.id, mission.clone());
        Ok(mission)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Mission>> {
        Ok(self.missions.lock().await.get(&id).cloned())
    }

    async fn list(&self, filter: MissionFilter) -> AppResult<Vec<Mission>> {
        let missions = self.missions.lock().await;
        let mut result: Vec<Mission> = missions
            .values()
            .filter(|m| filter.status.map_or(true, |s| m.status == s))
            .filter(|m| filter.client_id.map_or(true, |c| m.client_id == c))
            .filter(|m| filter.driver_id.map_or(true, |d| m.driver_id == Some(d)))
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected: MissionStatus,
        next: MissionStatus,
    ) -> AppResult<Option<Mission>> {
        let mut missions = self.missions.lock().await;
        match missions.get_mut(&id) {
            Some(mission) if mission.status == expected => {
                mission.status = next;
                mission.updated_at = Utc::now();
                Ok(Some(mission.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn update_status_and_driver(
        &self,
        id: Uuid,
        expected: MissionStatus,
        next: MissionStatus,
        driver_id: Uuid,
    ) -> AppResult<Option<Mission>> {
        let mut missions = self.missions.lock().await;
        match missions.get_mut(&id) {
            Some(mission) if mission.status == expected => {
                mission.status = next;
                mission.driver_id = Some(driver_id);
                mission.updated_at = Utc::now();
                Ok(Some(mission.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn update_terms(
        &self,
        id: Uuid,
        distance_km: Decimal,
        price_excl_tax: Decimal,
        price_incl_tax: Decimal,
    ) -> AppResult<Option<Mission>> {
        let mut missions = self.missions.lock().await;
        match missions.get_mut(&id) {
            Some(mission) => {
                mission.distance_km = distance_km;
                mission.price_excl_tax = price_excl_tax;
                mission.price_incl_tax = price_incl_tax;
                mission.updated_at = Utc::now();
                Ok(Some(mission.clone()))
            }
            None => Ok(None),
        }
    }
}

/// Wrapper que rechaza todo update condicional: simula que otra sesión
/// siempre gana la carrera de escritura.
pub struct ConflictingMissionStore(pub Arc<InMemoryMissionStore>);

#[async_trait]
impl MissionStore for ConflictingMissionStore {
    async fn insert(&self, new: NewMission) -> AppResult<Mission> {
        self.0.insert(new).await
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Mission>> {
        self.0.find_by_id(id).await
    }

    async fn list(&self, filter: MissionFilter) -> AppResult<Vec<Mission>> {
        self.0.list(filter).await
    }

    async fn update_status(
        &self,
        _id: Uuid,
        _expected: MissionStatus,
        _next: MissionStatus,
    ) -> AppResult<Option<Mission>> {
        Ok(None)
    }

    async fn update_status_and_driver(
        &self,
        _id: Uuid,
        _expected: MissionStatus,
        _next: MissionStatus,
        _driver_id: Uuid,
    ) -> AppResult<Option<Mission>> {
        Ok(None)
    }

    async fn update_terms(
        &self,
        id: Uuid,
        distance_km: Decimal,
        price_excl_tax: Decimal,
        price_incl_tax: Decimal,
    ) -> AppResult<Option<Mission>> {
        self.0
            .update_terms(id, distance_km, price_excl_tax, price_incl_tax)
            .await
    }
}

// ---------------------------------------------------------------------------
// Directorio de usuarios en memoria
// ---------------------------------------------------------------------------

pub struct InMemoryUserDirectory {
    users: HashMap<Uuid, User>,
}

impl InMemoryUserDirectory {
    pub fn new(users: Vec<User>) -> Self {
        Self {
            users: users.into_iter().map(|u| (u.id, u)).collect(),
        }
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.users.get(&id).cloned())
    }

    async fn admin_ids(&self) -> AppResult<Vec<Uuid>> {
        let mut ids: Vec<Uuid> = self
            .users
            .values()
            .filter(|u| u.role == UserRole::Admin)
            .map(|u| u.id)
            .collect();
        ids.sort();
        Ok(ids)
    }
}

pub fn user(role: UserRole, name: &str) -> User {
    User {
        id: Uuid::new_v4(),
        full_name: name.to_string(),
        email: None,
        role,
        created_at: Utc::now(),
    }
}

// ---------------------------------------------------------------------------
// Store de notificaciones en memoria
// ---------------------------------------------------------------------------

pub struct InMemoryNotificationStore {
    notifications: Mutex<Vec<Notification>>,
}

impl InMemoryNotificationStore {
    pub fn new() -> Self {
        Self {
            notifications: Mutex::new(Vec::new()),
        }
    }

    pub async fn all(&self) -> Vec<Notification> {
        self.notifications.lock().await.clone()
    }
}

#[async_trait]
impl NotificationStore for InMemoryNotificationStore {
    async fn insert(&self, new: NewNotification) -> AppResult<Notification> {
        let notification = Notification {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            mission_id: new.mission_id,
            kind: new.kind,
            message: new.message,
            is_read: false,
            created_at: Utc::now(),
        };
        self.notifications.lock().await.push(notification.clone());
        Ok(notification)
    }

    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<Notification>> {
        Ok(self
            .notifications
            .lock()
            .await
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn mark_read(&self, id: Uuid, user_id: Uuid) -> AppResult<Option<Notification>> {
        let mut notifications = self.notifications.lock().await;
        match notifications
            .iter_mut()
            .find(|n| n.id == id && n.user_id == user_id)
        {
            Some(notification) => {
                notification.is_read = true;
                Ok(Some(notification.clone()))
            }
            None => Ok(None),
        }
    }
}

// ---------------------------------------------------------------------------
// Proveedores de distancia de test
// ---------------------------------------------------------------------------

pub struct StubDistanceResolver {
    pub km: Decimal,
}

#[async_trait]
impl DistanceResolver for StubDistanceResolver {
    async fn resolve_km(&self, _origin: &str, _destination: &str) -> AppResult<Decimal> {
        Ok(self.km)
    }
}

pub struct FailingDistanceResolver;

#[async_trait]
impl DistanceResolver for FailingDistanceResolver {
    async fn resolve_km(&self, _origin: &str, _destination: &str) -> AppResult<Decimal> {
        Err(AppError::RouteUnavailable(
            "no drivable route in tests".to_string(),
        ))
    }
}

// ---------------------------------------------------------------------------
// Entorno de test completo
// ---------------------------------------------------------------------------

pub struct TestEnv {
    pub missions: Arc<InMemoryMissionStore>,
    pub notifications: Arc<InMemoryNotificationStore>,
    pub lifecycle: Arc<LifecycleService>,
    pub dispatch: Arc<DispatchService>,
    pub admin_id: Uuid,
    pub client_id: Uuid,
    pub driver_id: Uuid,
    pub second_client_id: Uuid,
    pub second_driver_id: Uuid,
}

impl TestEnv {
    pub fn new() -> Self {
        Self::with_resolver(Arc::new(StubDistanceResolver {
            km: Decimal::from(340),
        }))
    }

    pub fn with_resolver(resolver: Arc<dyn DistanceResolver>) -> Self {
        let raw = Arc::new(InMemoryMissionStore::new());
        Self::assemble(raw.clone(), raw, resolver)
    }

    /// Entorno cuyo store pierde todas las carreras de escritura
    pub fn with_conflicting_store() -> Self {
        let raw = Arc::new(InMemoryMissionStore::new());
        let conflicting: Arc<dyn MissionStore> = Arc::new(ConflictingMissionStore(raw.clone()));
        Self::assemble(
            raw,
            conflicting,
            Arc::new(StubDistanceResolver {
                km: Decimal::from(340),
            }),
        )
    }

    fn assemble(
        raw: Arc<InMemoryMissionStore>,
        store: Arc<dyn MissionStore>,
        resolver: Arc<dyn DistanceResolver>,
    ) -> Self {
        let admin = user(UserRole::Admin, "Alice Admin");
        let client = user(UserRole::Client, "Claire Cliente");
        let driver = user(UserRole::Driver, "Diego Chófer");
        let second_client = user(UserRole::Client, "Carlos Cliente");
        let second_driver = user(UserRole::Driver, "Dora Chófer");

        let admin_id = admin.id;
        let client_id = client.id;
        let driver_id = driver.id;
        let second_client_id = second_client.id;
        let second_driver_id = second_driver.id;

        let users: Arc<dyn UserDirectory> = Arc::new(InMemoryUserDirectory::new(vec![
            admin,
            client,
            driver,
            second_client,
            second_driver,
        ]));

        let notifications = Arc::new(InMemoryNotificationStore::new());
        let notification_store: Arc<dyn NotificationStore> = notifications.clone();
        let notifier = Arc::new(NotificationService::new(
            notification_store,
            RetryPolicy {
                max_attempts: 3,
                base_backoff: Duration::from_millis(1),
            },
        ));

        let lifecycle = Arc::new(LifecycleService::new(
            store.clone(),
            users.clone(),
            notifier,
            resolver,
            PricingService::with_default_rates(),
        ));

        let dispatch = Arc::new(DispatchService::new(lifecycle.clone(), store, users));

        Self {
            missions: raw,
            notifications,
            lifecycle,
            dispatch,
            admin_id,
            client_id,
            driver_id,
            second_client_id,
            second_driver_id,
        }
    }

    /// Siembra una misión en un estado arbitrario y la devuelve
    pub async fn seed_mission(
        &self,
        status: MissionStatus,
        driver_id: Option<Uuid>,
    ) -> Mission {
        let mission = mission_fixture(status, self.client_id, driver_id, Some(self.admin_id));
        self.missions.put(mission.clone()).await;
        mission
    }
}

/// Construye una misión completa en el estado dado
pub fn mission_fixture(
    status: MissionStatus,
    client_id: Uuid,
    driver_id: Option<Uuid>,
    admin_id: Option<Uuid>,
) -> Mission {
    let now = Utc::now();
    Mission {
        id: Uuid::new_v4(),
        mission_number: 42,
        mission_type: MissionType::Delivery,
        status,
        client_id,
        driver_id,
        admin_id,
        vehicle_category: "standard-sedan".to_string(),
        vehicle_info: Json(VehicleInfo {
            brand: "Peugeot".to_string(),
            model: "308".to_string(),
            year: 2022,
            fuel_type: "diesel".to_string(),
            license_plate: "FG-456-HI".to_string(),
        }),
        distance_km: Decimal::from(340),
        price_excl_tax: Decimal::new(28900, 2),
        price_incl_tax: Decimal::new(34680, 2),
        pickup_address: "12 Avenue des Champs-Élysées, 75008 Paris".to_string(),
        pickup_contact: Json(Contact {
            first_name: "Jean".to_string(),
            last_name: "Dupont".to_string(),
            phone: "0612345678".to_string(),
            email: Some("jean.dupont@example.fr".to_string()),
        }),
        pickup_at: now + ChronoDuration::days(1),
        delivery_address: "Place Bellecour, 69002 Lyon".to_string(),
        delivery_contact: Json(Contact {
            first_name: "Marie".to_string(),
            last_name: "Durand".to_string(),
            phone: "0698765432".to_string(),
            email: None,
        }),
        delivery_at: now + ChronoDuration::days(2),
        notes: None,
        created_at: now,
        updated_at: now,
    }
}

/// Request de creación válida
pub fn create_request(client_id: Option<Uuid>) -> CreateMissionRequest {
    let now = Utc::now();
    CreateMissionRequest {
        mission_type: MissionType::Delivery,
        client_id,
        vehicle_category: "standard-sedan".to_string(),
        vehicle: VehicleInput {
            brand: "Renault".to_string(),
            model: "Mégane".to_string(),
            year: 2021,
            fuel_type: "essence".to_string(),
            license_plate: "AB-123-CD".to_string(),
        },
        pickup_address: "12 Avenue des Champs-Élysées, 75008 Paris".to_string(),
        pickup_contact: ContactInput {
            first_name: "Jean".to_string(),
            last_name: "Dupont".to_string(),
            phone: "0612345678".to_string(),
            email: None,
        },
        pickup_at: now + ChronoDuration::days(1),
        delivery_address: "Place Bellecour, 69002 Lyon".to_string(),
        delivery_contact: ContactInput {
            first_name: "Marie".to_string(),
            last_name: "Durand".to_string(),
            phone: "0698765432".to_string(),
            email: None,
        },
        delivery_at: now + ChronoDuration::days(2),
        notes: Some("Llaves en recepción".to_string()),
    }
}

/// Espera a que las tareas de notificación en segundo plano alcancen el
/// número esperado de entregas para el usuario.
pub async fn wait_for_notifications(
    store: &InMemoryNotificationStore,
    user_id: Uuid,
    expected: usize,
) -> Vec<Notification> {
    for _ in 0..100 {
        let list = store.list_for_user(user_id).await.unwrap();
        if list.len() >= expected {
            return list;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    store.list_for_user(user_id).await.unwrap()
}

/// Deja drenar las tareas en segundo plano antes de una aserción negativa
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}
