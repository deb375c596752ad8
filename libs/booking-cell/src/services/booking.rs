use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_database::{BookingLedger, CatalogStore, ClinicStore, StoreError};
use shared_models::auth::Identity;
use shared_models::clinic::{Booking, BookingFilter};

use crate::models::{BookingError, BookingOutcome, CancelResult, CreateBookingRequest};
use crate::services::notifier::BookingNotifier;

/// Owns the booking write path. Uniqueness of (treatment, date, patient) is
/// decided by the store's insert, not by the lookup that precedes it.
pub struct BookingCoordinator {
    store: Arc<dyn ClinicStore>,
    notifier: Arc<dyn BookingNotifier>,
}

impl BookingCoordinator {
    pub fn new(store: Arc<dyn ClinicStore>, notifier: Arc<dyn BookingNotifier>) -> Self {
        Self { store, notifier }
    }

    pub async fn create_booking(&self, request: CreateBookingRequest) -> Result<BookingOutcome, BookingError> {
        request.validate()?;
        info!("Booking {} on {} at {} for {}",
              request.treatment, request.date, request.slot, request.patient);

        self.ensure_slot_in_catalog(&request).await?;

        let key = BookingFilter::for_key(&request.treatment, &request.date, &request.patient);

        // Fast path for resubmissions; the insert below is still authoritative.
        if let Some(existing) = self.find_one(&key).await? {
            debug!("Patient {} already holds booking {}", request.patient, existing.id);
            return Ok(BookingOutcome::AlreadyBooked(existing));
        }

        let booking = Booking {
            id: Uuid::new_v4().to_string(),
            treatment: request.treatment,
            date: request.date,
            slot: request.slot,
            patient: request.patient,
            patient_name: request.patient_name,
            created_at: Utc::now(),
        };

        match self.store.insert_booking(&booking).await {
            Ok(stored) => {
                info!("Booking {} created", stored.id);
                self.dispatch_confirmation(stored.clone());
                Ok(BookingOutcome::Created(stored))
            }
            Err(StoreError::Conflict(detail)) => {
                warn!("Concurrent booking for {} on {} by {} lost the insert",
                      booking.treatment, booking.date, booking.patient);

                match self.find_one(&key).await? {
                    Some(existing) => Ok(BookingOutcome::AlreadyBooked(existing)),
                    // winner was cancelled between the insert and this read
                    None => Err(BookingError::Storage(StoreError::Conflict(detail))),
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn cancel_booking(&self, id: &str) -> Result<CancelResult, BookingError> {
        let removed = self.store.delete_booking(id).await?;

        if removed > 0 {
            info!("Booking {} cancelled", id);
        } else {
            debug!("Cancel requested for unknown booking {}", id);
        }

        Ok(CancelResult { deleted: removed > 0 })
    }

    /// Lists `requested_patient`'s bookings, provided the caller is that
    /// patient.
    pub async fn list_bookings_for_patient(
        &self,
        identity: &Identity,
        requested_patient: &str,
    ) -> Result<Vec<Booking>, BookingError> {
        if identity.email != requested_patient {
            warn!("{} attempted to list bookings of {}", identity.email, requested_patient);
            return Err(BookingError::Forbidden("Cannot view another patient's bookings".to_string()));
        }

        Ok(self.store.find_bookings(&BookingFilter::for_patient(requested_patient)).await?)
    }

    async fn ensure_slot_in_catalog(&self, request: &CreateBookingRequest) -> Result<(), BookingError> {
        let services = self.store.list_services().await?;

        let service = services.iter()
            .find(|s| s.name == request.treatment)
            .ok_or_else(|| BookingError::UnknownTreatment(request.treatment.clone()))?;

        if !service.offers_slot(&request.slot) {
            return Err(BookingError::InvalidSlot {
                treatment: request.treatment.clone(),
                slot: request.slot.clone(),
            });
        }

        Ok(())
    }

    async fn find_one(&self, filter: &BookingFilter) -> Result<Option<Booking>, StoreError> {
        Ok(self.store.find_bookings(filter).await?.into_iter().next())
    }

    fn dispatch_confirmation(&self, booking: Booking) {
        let notifier = Arc::clone(&self.notifier);

        tokio::spawn(async move {
            if let Err(e) = notifier.notify_confirmed(&booking).await {
                warn!("Confirmation for booking {} not delivered: {}", booking.id, e);
            }
        });
    }
}
