use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use auth_cell::router::auth_routes;
use booking_cell::router::booking_routes;
use booking_cell::services::BookingNotifier;
use doctor_cell::router::doctor_routes;
use shared_utils::AppState;

pub fn create_router(state: Arc<AppState>, notifier: Arc<dyn BookingNotifier>) -> Router {
    Router::new()
        .route("/", get(|| async { "Clinic booking API is running!" }))
        .merge(booking_routes(state.clone(), notifier))
        .merge(auth_routes(state.clone()))
        .merge(doctor_routes(state))
}
