use std::sync::Arc;

use axum::{
    Router,
    routing::{get, delete},
    middleware,
};

use shared_utils::extractor::{admin_middleware, auth_middleware};
use shared_utils::AppState;

use crate::handlers;

pub fn doctor_routes(state: Arc<AppState>) -> Router {
    // Every roster operation is admin-only
    Router::new()
        .route("/doctor", get(handlers::list_doctors).post(handlers::create_doctor))
        .route("/doctor/{email}", delete(handlers::delete_doctor))
        .layer(middleware::from_fn_with_state(state.clone(), admin_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
