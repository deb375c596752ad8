use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use shared_database::{BookingLedger, CatalogStore, ClinicStore};
use shared_models::clinic::{Booking, BookingFilter, Service};

use crate::models::{BookingError, ServiceAvailability};

pub struct AvailabilityService {
    store: Arc<dyn ClinicStore>,
}

impl AvailabilityService {
    pub fn new(store: Arc<dyn ClinicStore>) -> Self {
        Self { store }
    }

    /// Remaining slots per service for `date`. Read-only; may lag behind
    /// bookings that are still being written.
    pub async fn compute_availability(&self, date: &str) -> Result<Vec<ServiceAvailability>, BookingError> {
        debug!("Computing availability for {}", date);

        let filter = BookingFilter::for_date(date);
        let (services, bookings) = futures::try_join!(
            self.store.list_services(),
            self.store.find_bookings(&filter),
        )?;

        Ok(project_availability(&services, &bookings))
    }
}

/// Removes every booked slot from its service's catalog. Catalog order is
/// kept for both services and slots; bookings naming a service that is not
/// in the catalog are ignored.
pub fn project_availability(services: &[Service], bookings: &[Booking]) -> Vec<ServiceAvailability> {
    let mut taken: HashMap<&str, HashSet<&str>> = HashMap::new();
    for booking in bookings {
        taken.entry(booking.treatment.as_str())
            .or_default()
            .insert(booking.slot.as_str());
    }

    services.iter()
        .map(|service| {
            let booked = taken.get(service.name.as_str());
            let slots = service.slots.iter()
                .filter(|slot| !booked.is_some_and(|b| b.contains(slot.as_str())))
                .cloned()
                .collect();

            ServiceAvailability {
                name: service.name.clone(),
                slots,
            }
        })
        .collect()
}
