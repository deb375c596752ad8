use std::sync::Arc;

use axum::{
    extract::State,
    Json,
};

use shared_models::clinic::Doctor;
use shared_models::error::AppError;
use shared_utils::extractor::{AppJson, AppPath};
use shared_utils::AppState;

use crate::models::{CreateDoctorRequest, DeleteDoctorResult};
use crate::services::DoctorService;

#[axum::debug_handler]
pub async fn list_doctors(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Doctor>>, AppError> {
    let service = DoctorService::new(state.store.clone());
    Ok(Json(service.list_doctors().await?))
}

#[axum::debug_handler]
pub async fn create_doctor(
    State(state): State<Arc<AppState>>,
    AppJson(request): AppJson<CreateDoctorRequest>,
) -> Result<Json<Doctor>, AppError> {
    let service = DoctorService::new(state.store.clone());
    Ok(Json(service.add_doctor(request).await?))
}

#[axum::debug_handler]
pub async fn delete_doctor(
    State(state): State<Arc<AppState>>,
    AppPath(email): AppPath<String>,
) -> Result<Json<DeleteDoctorResult>, AppError> {
    let service = DoctorService::new(state.store.clone());
    Ok(Json(service.remove_doctor(&email).await?))
}
