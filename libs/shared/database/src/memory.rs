use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use shared_models::clinic::{Booking, BookingFilter, Doctor, Role, Service, UserRecord};

use crate::store::{BookingLedger, CatalogStore, DoctorRoster, StoreError, UserDirectory};

#[derive(Debug, Default)]
struct MemoryState {
    services: Vec<Service>,
    bookings: Vec<Booking>,
    users: Vec<UserRecord>,
    doctors: Vec<Doctor>,
}

/// Process-local store. Each write runs under one write lock, so the
/// booking uniqueness check and the insert are a single atomic step.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<MemoryState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_services(services: Vec<Service>) -> Self {
        Self {
            state: RwLock::new(MemoryState {
                services,
                ..Default::default()
            }),
        }
    }

    pub async fn add_service(&self, service: Service) {
        self.state.write().await.services.push(service);
    }

    pub async fn booking_count(&self) -> usize {
        self.state.read().await.bookings.len()
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn list_services(&self) -> Result<Vec<Service>, StoreError> {
        Ok(self.state.read().await.services.clone())
    }
}

#[async_trait]
impl BookingLedger for InMemoryStore {
    async fn find_bookings(&self, filter: &BookingFilter) -> Result<Vec<Booking>, StoreError> {
        let state = self.state.read().await;
        Ok(state.bookings.iter().filter(|b| filter.matches(b)).cloned().collect())
    }

    async fn insert_booking(&self, booking: &Booking) -> Result<Booking, StoreError> {
        let mut state = self.state.write().await;

        if state.bookings.iter().any(|b| b.patient_key() == booking.patient_key()) {
            return Err(StoreError::Conflict(format!(
                "booking for {} on {} by {} already exists",
                booking.treatment, booking.date, booking.patient
            )));
        }

        state.bookings.push(booking.clone());
        debug!("Stored booking {}", booking.id);
        Ok(booking.clone())
    }

    async fn delete_booking(&self, id: &str) -> Result<u64, StoreError> {
        let mut state = self.state.write().await;
        let before = state.bookings.len();
        state.bookings.retain(|b| b.id != id);
        Ok((before - state.bookings.len()) as u64)
    }
}

#[async_trait]
impl UserDirectory for InMemoryStore {
    async fn list_users(&self) -> Result<Vec<UserRecord>, StoreError> {
        Ok(self.state.read().await.users.clone())
    }

    async fn find_user(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.email == email).cloned())
    }

    async fn upsert_user(&self, user: &UserRecord) -> Result<UserRecord, StoreError> {
        let mut state = self.state.write().await;

        if let Some(existing) = state.users.iter_mut().find(|u| u.email == user.email) {
            existing.profile.extend(user.profile.clone());
            return Ok(existing.clone());
        }

        let created = UserRecord {
            email: user.email.clone(),
            role: Role::None,
            profile: user.profile.clone(),
        };
        state.users.push(created.clone());
        Ok(created)
    }

    async fn set_role(&self, email: &str, role: Role) -> Result<Option<UserRecord>, StoreError> {
        let mut state = self.state.write().await;

        Ok(state.users.iter_mut().find(|u| u.email == email).map(|user| {
            user.role = role;
            user.clone()
        }))
    }
}

#[async_trait]
impl DoctorRoster for InMemoryStore {
    async fn list_doctors(&self) -> Result<Vec<Doctor>, StoreError> {
        Ok(self.state.read().await.doctors.clone())
    }

    async fn insert_doctor(&self, doctor: &Doctor) -> Result<Doctor, StoreError> {
        let mut state = self.state.write().await;

        if state.doctors.iter().any(|d| d.email == doctor.email) {
            return Err(StoreError::Conflict(format!("doctor {} already exists", doctor.email)));
        }

        state.doctors.push(doctor.clone());
        Ok(doctor.clone())
    }

    async fn delete_doctor(&self, email: &str) -> Result<u64, StoreError> {
        let mut state = self.state.write().await;
        let before = state.doctors.len();
        state.doctors.retain(|d| d.email != email);
        Ok((before - state.doctors.len()) as u64)
    }
}
