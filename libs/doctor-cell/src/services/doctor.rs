use std::sync::Arc;

use tracing::{debug, info};

use shared_database::{ClinicStore, DoctorRoster, StoreError};
use shared_models::clinic::Doctor;

use crate::models::{CreateDoctorRequest, DeleteDoctorResult, DoctorError};

pub struct DoctorService {
    store: Arc<dyn ClinicStore>,
}

impl DoctorService {
    pub fn new(store: Arc<dyn ClinicStore>) -> Self {
        Self { store }
    }

    pub async fn list_doctors(&self) -> Result<Vec<Doctor>, DoctorError> {
        debug!("Fetching doctor roster");
        self.store.list_doctors().await.map_err(DoctorError::Storage)
    }

    pub async fn add_doctor(&self, request: CreateDoctorRequest) -> Result<Doctor, DoctorError> {
        let doctor = request.into_doctor()?;

        match self.store.insert_doctor(&doctor).await {
            Ok(stored) => {
                info!("Doctor {} added to roster", stored.email);
                Ok(stored)
            }
            Err(StoreError::Conflict(_)) => Err(DoctorError::AlreadyExists(doctor.email)),
            Err(e) => Err(DoctorError::Storage(e)),
        }
    }

    pub async fn remove_doctor(&self, email: &str) -> Result<DeleteDoctorResult, DoctorError> {
        let removed = self.store.delete_doctor(email).await.map_err(DoctorError::Storage)?;

        if removed > 0 {
            info!("Doctor {} removed from roster", email);
        }

        Ok(DeleteDoctorResult { deleted: removed > 0 })
    }
}
