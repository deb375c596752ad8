//! Storage interface consumed by the cells.
//!
//! Every backend must enforce uniqueness of `(treatment, date, patient)` on
//! `insert_booking` itself and report a violation as [`StoreError::Conflict`].
//! The booking flow relies on that for correctness under concurrent requests.

use async_trait::async_trait;
use thiserror::Error;

use shared_models::clinic::{Booking, BookingFilter, Doctor, Role, Service, UserRecord};
use shared_models::error::AppError;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Uniqueness constraint violated: {0}")]
    Conflict(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Failed to decode store response: {0}")]
    Decode(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => AppError::Conflict(msg),
            other => AppError::Storage(other.to_string()),
        }
    }
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// All services, in catalog order.
    async fn list_services(&self) -> Result<Vec<Service>, StoreError>;
}

#[async_trait]
pub trait BookingLedger: Send + Sync {
    async fn find_bookings(&self, filter: &BookingFilter) -> Result<Vec<Booking>, StoreError>;

    /// Fails with [`StoreError::Conflict`] when a booking with the same
    /// `(treatment, date, patient)` already exists.
    async fn insert_booking(&self, booking: &Booking) -> Result<Booking, StoreError>;

    /// Returns the number of rows removed (0 or 1).
    async fn delete_booking(&self, id: &str) -> Result<u64, StoreError>;
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn list_users(&self) -> Result<Vec<UserRecord>, StoreError>;

    async fn find_user(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Inserts or merges profile fields. Never changes an existing role.
    async fn upsert_user(&self, user: &UserRecord) -> Result<UserRecord, StoreError>;

    async fn set_role(&self, email: &str, role: Role) -> Result<Option<UserRecord>, StoreError>;
}

#[async_trait]
pub trait DoctorRoster: Send + Sync {
    async fn list_doctors(&self) -> Result<Vec<Doctor>, StoreError>;

    /// Fails with [`StoreError::Conflict`] on a duplicate email.
    async fn insert_doctor(&self, doctor: &Doctor) -> Result<Doctor, StoreError>;

    async fn delete_doctor(&self, email: &str) -> Result<u64, StoreError>;
}

pub trait ClinicStore: CatalogStore + BookingLedger + UserDirectory + DoctorRoster {}

impl<T> ClinicStore for T where T: CatalogStore + BookingLedger + UserDirectory + DoctorRoster {}
