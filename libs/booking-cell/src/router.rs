use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, delete},
    middleware,
};

use shared_utils::extractor::auth_middleware;
use shared_utils::AppState;

use crate::handlers::{self, BookingState};
use crate::services::BookingNotifier;

pub fn booking_routes(state: Arc<AppState>, notifier: Arc<dyn BookingNotifier>) -> Router {
    let public_routes = Router::new()
        .route("/service", get(handlers::list_services))
        .route("/available", get(handlers::get_availability))
        .route("/booking", post(handlers::create_booking))
        // TODO: restrict cancellation to the booking's patient or an admin
        .route("/booking/{booking_id}", delete(handlers::cancel_booking));

    let protected_routes = Router::new()
        .route("/booking", get(handlers::list_patient_bookings))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(BookingState::new(state, notifier))
}
