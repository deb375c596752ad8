use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_database::StoreError;
use shared_models::clinic::Doctor;
use shared_models::error::AppError;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateDoctorRequest {
    pub name: String,
    pub email: String,
    pub specialty: String,
    pub img: Option<String>,
}

impl CreateDoctorRequest {
    pub fn into_doctor(self) -> Result<Doctor, DoctorError> {
        for (field, value) in [("name", &self.name), ("email", &self.email), ("specialty", &self.specialty)] {
            if value.trim().is_empty() {
                return Err(DoctorError::ValidationError(format!("{} is required", field)));
            }
        }

        Ok(Doctor {
            name: self.name,
            email: self.email,
            specialty: self.specialty,
            img: self.img,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteDoctorResult {
    pub deleted: bool,
}

#[derive(Error, Debug)]
pub enum DoctorError {
    #[error("Doctor {0} is already on the roster")]
    AlreadyExists(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error(transparent)]
    Storage(StoreError),
}

impl From<DoctorError> for AppError {
    fn from(err: DoctorError) -> Self {
        match err {
            DoctorError::AlreadyExists(_) => AppError::Conflict(err.to_string()),
            DoctorError::ValidationError(msg) => AppError::BadRequest(msg),
            DoctorError::Storage(store_err) => store_err.into(),
        }
    }
}
