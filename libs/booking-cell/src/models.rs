use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_database::StoreError;
use shared_models::clinic::Booking;
use shared_models::error::AppError;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreateBookingRequest {
    pub treatment: String,
    pub date: String,
    pub slot: String,
    pub patient: String,
    #[serde(rename = "patientName", alias = "patient_name")]
    pub patient_name: String,
}

impl CreateBookingRequest {
    pub fn validate(&self) -> Result<(), BookingError> {
        let required = [
            ("treatment", &self.treatment),
            ("date", &self.date),
            ("slot", &self.slot),
            ("patient", &self.patient),
        ];

        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(BookingError::ValidationError(format!("{} is required", field)));
            }
        }

        Ok(())
    }
}

/// Result of a booking attempt. A second request for the same
/// (treatment, date, patient) is not an error; it hands back the booking
/// already on record.
#[derive(Debug, Clone, PartialEq)]
pub enum BookingOutcome {
    Created(Booking),
    AlreadyBooked(Booking),
}

impl BookingOutcome {
    pub fn success(&self) -> bool {
        matches!(self, BookingOutcome::Created(_))
    }

    pub fn booking(&self) -> &Booking {
        match self {
            BookingOutcome::Created(booking) | BookingOutcome::AlreadyBooked(booking) => booking,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelResult {
    pub deleted: bool,
}

/// Remaining slots of one service on the requested date, in catalog order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceAvailability {
    pub name: String,
    pub slots: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub date: String,
}

#[derive(Debug, Deserialize)]
pub struct PatientBookingsQuery {
    pub patient: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ServiceListQuery {
    pub names_only: Option<bool>,
}

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Unknown treatment: {0}")]
    UnknownTreatment(String),

    #[error("Slot {slot} is not offered for {treatment}")]
    InvalidSlot { treatment: String, slot: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::UnknownTreatment(_)
            | BookingError::InvalidSlot { .. }
            | BookingError::ValidationError(_) => AppError::BadRequest(err.to_string()),
            BookingError::Forbidden(msg) => AppError::Forbidden(msg),
            BookingError::Storage(store_err) => store_err.into(),
        }
    }
}
