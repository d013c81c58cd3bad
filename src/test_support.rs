// In-memory repository adapters and fixtures for tests

use async_trait::async_trait;
use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use jsonwebtoken::Algorithm;
use mockable::Clock;
use std::sync::{Arc, Mutex};

use crate::auth::models::{NewUser, PasswordReset, User, UserChanges};
use crate::auth::{ResetTokenRepository, UserRepository};
use crate::billing::models::{Billing, BillingChanges, BillingFilter, NewBilling};
use crate::billing::BillingRepository;
use crate::config::Config;
use crate::drones::models::{Drone, DroneChanges, NewDrone};
use crate::drones::DroneRepository;
use crate::error::RepositoryError;
use crate::farmers::models::{Farmer, FarmerChanges, NewFarmer};
use crate::farmers::FarmerRepository;
use crate::object_id::ObjectId;
use crate::query::Pagination;
use crate::roles::{RoleRecord, RoleRepository};
use crate::{AppState, Repositories};

/// Clock that only moves when told to
pub struct ManualClock(Mutex<DateTime<Utc>>);

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance(&self, by: Duration) {
        *self.0.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

/// Skip/limit over an already ordered sequence, like `LIMIT .. OFFSET ..`
fn window<T>(page: Pagination, items: impl IntoIterator<Item = T>) -> Vec<T> {
    items
        .into_iter()
        .skip(page.skip as usize)
        .take(page.limit as usize)
        .collect()
}

/// In-memory equivalent of the equality filters in the billing query
fn billing_matches(filter: &BillingFilter, billing: &Billing) -> bool {
    filter.farmer_id.as_ref().map_or(true, |id| id == &billing.farmer_id)
        && filter.operator_id.as_ref().map_or(true, |id| id == &billing.operator_id)
        && filter.drone_id.as_ref().map_or(true, |id| id == &billing.drone_id)
}

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<Vec<User>>,
}

impl InMemoryUserRepository {
    pub fn set_active(&self, id: &ObjectId, active: bool) {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.iter_mut().find(|u| &u.id == id) {
            user.is_active = active;
        }
    }

    fn email_taken(users: &[User], email: &str, except: Option<&ObjectId>) -> bool {
        users
            .iter()
            .any(|u| u.email.eq_ignore_ascii_case(email) && Some(&u.id) != except)
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: NewUser) -> Result<ObjectId, RepositoryError> {
        let mut users = self.users.lock().unwrap();
        if Self::email_taken(&users, &user.email, None) {
            return Err(RepositoryError::Duplicate("email"));
        }

        let id = ObjectId::new();
        users.push(User {
            id: id.clone(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            is_active: user.is_active,
            created_at: user.created_at,
            updated_at: None,
            created_by: user.created_by,
            updated_by: None,
        });
        Ok(id)
    }

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<User>, RepositoryError> {
        Ok(self.users.lock().unwrap().iter().find(|u| &u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn list(&self, page: Pagination) -> Result<Vec<User>, RepositoryError> {
        Ok(window(page, self.users.lock().unwrap().iter().cloned()))
    }

    async fn update(&self, id: &ObjectId, changes: &UserChanges) -> Result<bool, RepositoryError> {
        if !changes.has_field_changes() {
            return Ok(false);
        }
        let mut users = self.users.lock().unwrap();
        if let Some(email) = &changes.email {
            if Self::email_taken(&users, email, Some(id)) {
                return Err(RepositoryError::Duplicate("email"));
            }
        }

        let Some(user) = users.iter_mut().find(|u| &u.id == id) else {
            return Ok(false);
        };
        if let Some(name) = &changes.name {
            user.name = name.clone();
        }
        if let Some(email) = &changes.email {
            user.email = email.clone();
        }
        if let Some(role) = changes.role {
            user.role = role;
        }
        if let Some(active) = changes.is_active {
            user.is_active = active;
        }
        user.updated_at = changes.updated_at.or(user.updated_at);
        user.updated_by = changes.updated_by.clone().or(user.updated_by.clone());
        Ok(true)
    }

    async fn set_password_by_email(
        &self,
        email: &str,
        password_hash: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let mut users = self.users.lock().unwrap();
        match users.iter_mut().find(|u| u.email.eq_ignore_ascii_case(email)) {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                user.updated_at = Some(updated_at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_password(
        &self,
        id: &ObjectId,
        password_hash: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let mut users = self.users.lock().unwrap();
        match users.iter_mut().find(|u| &u.id == id) {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                user.updated_at = Some(updated_at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: &ObjectId) -> Result<bool, RepositoryError> {
        let mut users = self.users.lock().unwrap();
        let before = users.len();
        users.retain(|u| &u.id != id);
        Ok(users.len() != before)
    }
}

#[derive(Default)]
pub struct InMemoryResetTokenRepository {
    records: Mutex<Vec<PasswordReset>>,
}

impl InMemoryResetTokenRepository {
    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn records(&self) -> Vec<PasswordReset> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResetTokenRepository for InMemoryResetTokenRepository {
    async fn store(&self, reset: PasswordReset) -> Result<(), RepositoryError> {
        let mut records = self.records.lock().unwrap();
        if records.iter().any(|r| r.token_hash == reset.token_hash) {
            return Err(RepositoryError::Duplicate("token_hash"));
        }
        records.push(reset);
        Ok(())
    }

    async fn consume(&self, token_hash: &str, now: DateTime<Utc>) -> Result<Option<String>, RepositoryError> {
        // Check and flip under one lock, like the conditional UPDATE
        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| r.token_hash == token_hash && !r.used && r.expires_at >= now);
        Ok(record.map(|r| {
            r.used = true;
            r.email.clone()
        }))
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|r| r.expires_at >= now);
        Ok((before - records.len()) as u64)
    }
}

pub struct InMemoryRoleRepository;

#[async_trait]
impl RoleRepository for InMemoryRoleRepository {
    async fn list(&self) -> Result<Vec<RoleRecord>, RepositoryError> {
        let seeded = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        Ok(["admin", "operator", "viewer"]
            .iter()
            .enumerate()
            .map(|(i, name)| RoleRecord {
                id: i as i32 + 1,
                name: name.to_string(),
                created_at: seeded,
            })
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryFarmerRepository {
    farmers: Mutex<Vec<Farmer>>,
}

#[async_trait]
impl FarmerRepository for InMemoryFarmerRepository {
    async fn create(&self, farmer: NewFarmer) -> Result<ObjectId, RepositoryError> {
        let id = ObjectId::new();
        self.farmers.lock().unwrap().push(Farmer {
            id: id.clone(),
            name: farmer.name,
            phone_number: farmer.phone_number,
            created_at: farmer.created_at,
            created_by: Some(farmer.created_by),
            updated_at: None,
            updated_by: None,
        });
        Ok(id)
    }

    async fn get(&self, id: &ObjectId) -> Result<Option<Farmer>, RepositoryError> {
        Ok(self.farmers.lock().unwrap().iter().find(|f| &f.id == id).cloned())
    }

    async fn list(&self, page: Pagination) -> Result<Vec<Farmer>, RepositoryError> {
        Ok(window(page, self.farmers.lock().unwrap().iter().cloned()))
    }

    async fn update(&self, id: &ObjectId, changes: &FarmerChanges) -> Result<bool, RepositoryError> {
        if !changes.has_field_changes() {
            return Ok(false);
        }
        let mut farmers = self.farmers.lock().unwrap();
        let Some(farmer) = farmers.iter_mut().find(|f| &f.id == id) else {
            return Ok(false);
        };
        if let Some(name) = &changes.name {
            farmer.name = name.clone();
        }
        if let Some(phone) = &changes.phone_number {
            farmer.phone_number = Some(phone.clone());
        }
        farmer.updated_at = changes.updated_at;
        farmer.updated_by = changes.updated_by.clone();
        Ok(true)
    }

    async fn delete(&self, id: &ObjectId) -> Result<bool, RepositoryError> {
        let mut farmers = self.farmers.lock().unwrap();
        let before = farmers.len();
        farmers.retain(|f| &f.id != id);
        Ok(farmers.len() != before)
    }
}

#[derive(Default)]
pub struct InMemoryDroneRepository {
    drones: Mutex<Vec<Drone>>,
}

fn serial_taken(drones: &[Drone], serial: Option<&str>, except: Option<&ObjectId>) -> bool {
    match serial {
        Some(serial) => drones
            .iter()
            .any(|d| d.serial_number.as_deref() == Some(serial) && Some(&d.id) != except),
        None => false,
    }
}

#[async_trait]
impl DroneRepository for InMemoryDroneRepository {
    async fn create(&self, drone: NewDrone) -> Result<ObjectId, RepositoryError> {
        let mut drones = self.drones.lock().unwrap();
        if serial_taken(&drones, drone.serial_number.as_deref(), None) {
            return Err(RepositoryError::Duplicate("serial_number"));
        }
        let id = ObjectId::new();
        drones.push(Drone {
            id: id.clone(),
            name: drone.name,
            model: drone.model,
            serial_number: drone.serial_number,
            per_hour_rate: drone.per_hour_rate,
            created_at: drone.created_at,
            created_by: Some(drone.created_by),
            updated_at: None,
            updated_by: None,
        });
        Ok(id)
    }

    async fn get(&self, id: &ObjectId) -> Result<Option<Drone>, RepositoryError> {
        Ok(self.drones.lock().unwrap().iter().find(|d| &d.id == id).cloned())
    }

    async fn list(&self, page: Pagination) -> Result<Vec<Drone>, RepositoryError> {
        Ok(window(page, self.drones.lock().unwrap().iter().cloned()))
    }

    async fn update(&self, id: &ObjectId, changes: &DroneChanges) -> Result<bool, RepositoryError> {
        if !changes.has_field_changes() {
            return Ok(false);
        }
        let mut drones = self.drones.lock().unwrap();
        if serial_taken(&drones, changes.serial_number.as_deref(), Some(id)) {
            return Err(RepositoryError::Duplicate("serial_number"));
        }
        let Some(drone) = drones.iter_mut().find(|d| &d.id == id) else {
            return Ok(false);
        };
        if let Some(name) = &changes.name {
            drone.name = name.clone();
        }
        if let Some(model) = &changes.model {
            drone.model = Some(model.clone());
        }
        if let Some(serial) = &changes.serial_number {
            drone.serial_number = Some(serial.clone());
        }
        if let Some(rate) = changes.per_hour_rate {
            drone.per_hour_rate = rate;
        }
        drone.updated_at = changes.updated_at;
        drone.updated_by = changes.updated_by.clone();
        Ok(true)
    }

    async fn delete(&self, id: &ObjectId) -> Result<bool, RepositoryError> {
        let mut drones = self.drones.lock().unwrap();
        let before = drones.len();
        drones.retain(|d| &d.id != id);
        Ok(drones.len() != before)
    }
}

#[derive(Default)]
pub struct InMemoryBillingRepository {
    records: Mutex<Vec<Billing>>,
}

impl InMemoryBillingRepository {
    pub fn snapshot(&self, id: &ObjectId) -> Option<Billing> {
        self.records.lock().unwrap().iter().find(|b| &b.id == id).cloned()
    }
}

#[async_trait]
impl BillingRepository for InMemoryBillingRepository {
    async fn create(&self, billing: NewBilling) -> Result<ObjectId, RepositoryError> {
        let id = ObjectId::new();
        self.records.lock().unwrap().push(Billing {
            id: id.clone(),
            farmer_id: billing.farmer_id,
            operator_id: billing.operator_id,
            drone_id: billing.drone_id,
            acres: billing.acres,
            time_spent: billing.time_spent,
            amount: billing.amount,
            mode_type: billing.mode_type,
            created_at: billing.created_at,
            created_by: Some(billing.created_by),
            updated_at: None,
            updated_by: None,
        });
        Ok(id)
    }

    async fn get(&self, id: &ObjectId) -> Result<Option<Billing>, RepositoryError> {
        Ok(self.snapshot(id))
    }

    async fn list(&self, filter: &BillingFilter, page: Pagination) -> Result<Vec<Billing>, RepositoryError> {
        let mut matching: Vec<Billing> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|b| billing_matches(filter, b))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(window(page, matching))
    }

    async fn update(&self, id: &ObjectId, changes: &BillingChanges) -> Result<bool, RepositoryError> {
        if !changes.has_field_changes() {
            return Ok(false);
        }
        let mut records = self.records.lock().unwrap();
        let Some(record) = records.iter_mut().find(|b| &b.id == id) else {
            return Ok(false);
        };
        if let Some(acres) = changes.acres {
            record.acres = acres;
        }
        if let Some(time) = changes.time_spent {
            record.time_spent = time;
        }
        if let Some(amount) = changes.amount {
            record.amount = amount;
        }
        if let Some(mode) = changes.mode_type {
            record.mode_type = mode;
        }
        record.updated_at = changes.updated_at;
        record.updated_by = changes.updated_by.clone();
        Ok(true)
    }

    async fn delete(&self, id: &ObjectId) -> Result<bool, RepositoryError> {
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|b| &b.id != id);
        Ok(records.len() != before)
    }
}

pub fn test_config() -> Config {
    Config {
        database_url: "postgresql://unused".to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        jwt_secret: "test_secret_key_for_testing_purposes".to_string(),
        jwt_algorithm: Algorithm::HS256,
        token_ttl: Duration::minutes(60),
        reset_token_ttl: Duration::minutes(60),
        reset_sweep_interval: std::time::Duration::from_secs(300),
        db_max_connections: 1,
        expose_reset_token: true,
    }
}

/// Application wired to in-memory adapters and a manual clock
pub struct TestContext {
    pub state: AppState,
    pub clock: Arc<ManualClock>,
    pub users: Arc<InMemoryUserRepository>,
    pub resets: Arc<InMemoryResetTokenRepository>,
    pub billing: Arc<InMemoryBillingRepository>,
}

pub fn test_context() -> TestContext {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let users = Arc::new(InMemoryUserRepository::default());
    let resets = Arc::new(InMemoryResetTokenRepository::default());
    let billing = Arc::new(InMemoryBillingRepository::default());

    let repos = Repositories {
        users: users.clone(),
        resets: resets.clone(),
        roles: Arc::new(InMemoryRoleRepository),
        farmers: Arc::new(InMemoryFarmerRepository::default()),
        drones: Arc::new(InMemoryDroneRepository::default()),
        billing: billing.clone(),
    };
    let state = AppState::new(Arc::new(test_config()), clock.clone(), repos);

    TestContext {
        state,
        clock,
        users,
        resets,
        billing,
    }
}

pub fn test_state() -> (AppState, Arc<ManualClock>) {
    let ctx = test_context();
    (ctx.state, ctx.clock)
}
