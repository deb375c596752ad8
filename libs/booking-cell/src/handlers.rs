use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    Json,
};
use serde_json::{json, Value};
use tracing::debug;

use shared_database::CatalogStore;
use shared_models::auth::Identity;
use shared_models::clinic::Booking;
use shared_models::error::AppError;
use shared_utils::extractor::{AppJson, AppPath, AppQuery};
use shared_utils::AppState;

use crate::models::{
    AvailabilityQuery, BookingOutcome, CancelResult, CreateBookingRequest,
    PatientBookingsQuery, ServiceAvailability, ServiceListQuery,
};
use crate::services::{AvailabilityService, BookingCoordinator, BookingNotifier};

#[derive(Clone)]
pub struct BookingState {
    pub app: Arc<AppState>,
    pub availability: Arc<AvailabilityService>,
    pub coordinator: Arc<BookingCoordinator>,
}

impl BookingState {
    pub fn new(app: Arc<AppState>, notifier: Arc<dyn BookingNotifier>) -> Self {
        Self {
            availability: Arc::new(AvailabilityService::new(app.store.clone())),
            coordinator: Arc::new(BookingCoordinator::new(app.store.clone(), notifier)),
            app,
        }
    }
}

#[axum::debug_handler]
pub async fn list_services(
    State(state): State<BookingState>,
    AppQuery(query): AppQuery<ServiceListQuery>,
) -> Result<Json<Value>, AppError> {
    let services = state.app.store.list_services().await?;

    if query.names_only.unwrap_or(false) {
        let names: Vec<Value> = services.iter()
            .map(|s| json!({ "name": s.name }))
            .collect();
        return Ok(Json(json!(names)));
    }

    Ok(Json(json!(services)))
}

#[axum::debug_handler]
pub async fn get_availability(
    State(state): State<BookingState>,
    AppQuery(query): AppQuery<AvailabilityQuery>,
) -> Result<Json<Vec<ServiceAvailability>>, AppError> {
    if query.date.trim().is_empty() {
        return Err(AppError::BadRequest("date is required".to_string()));
    }

    let availability = state.availability.compute_availability(&query.date).await?;
    Ok(Json(availability))
}

#[axum::debug_handler]
pub async fn create_booking(
    State(state): State<BookingState>,
    AppJson(request): AppJson<CreateBookingRequest>,
) -> Result<Json<Value>, AppError> {
    let outcome = state.coordinator.create_booking(request).await?;

    let body = match outcome {
        BookingOutcome::Created(booking) => json!({
            "success": true,
            "result": booking,
        }),
        BookingOutcome::AlreadyBooked(existing) => json!({
            "success": false,
            "booking": existing,
        }),
    };

    Ok(Json(body))
}

#[axum::debug_handler]
pub async fn list_patient_bookings(
    State(state): State<BookingState>,
    Extension(identity): Extension<Identity>,
    AppQuery(query): AppQuery<PatientBookingsQuery>,
) -> Result<Json<Vec<Booking>>, AppError> {
    debug!("Listing bookings of {} for {}", query.patient, identity.email);

    let bookings = state.coordinator
        .list_bookings_for_patient(&identity, &query.patient)
        .await?;

    Ok(Json(bookings))
}

#[axum::debug_handler]
pub async fn cancel_booking(
    State(state): State<BookingState>,
    AppPath(booking_id): AppPath<String>,
) -> Result<Json<CancelResult>, AppError> {
    let result = state.coordinator.cancel_booking(&booking_id).await?;
    Ok(Json(result))
}
