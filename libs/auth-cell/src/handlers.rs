use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    Json,
};
use serde_json::{Map, Value};
use tracing::{debug, info};

use shared_database::UserDirectory;
use shared_models::auth::{Identity, TokenResponse};
use shared_models::clinic::{Role, UserRecord};
use shared_models::error::AppError;
use shared_utils::jwt::{issue_email_token, issue_token, TokenError};
use shared_utils::extractor::{AppJson, AppPath};
use shared_utils::AppState;

use crate::models::{AdminStatus, UpsertUserResponse};

fn token_error(err: TokenError) -> AppError {
    match err {
        TokenError::MissingEmail => AppError::BadRequest("email is required".to_string()),
        other => AppError::Internal(other.to_string()),
    }
}

/// Issues a bearer token whose claims are the submitted object.
pub async fn login(
    State(state): State<Arc<AppState>>,
    AppJson(body): AppJson<Value>,
) -> Result<Json<TokenResponse>, AppError> {
    let Value::Object(claims) = body else {
        return Err(AppError::BadRequest("login body must be a JSON object".to_string()));
    };

    let config = &state.config;
    let access_token = issue_token(claims, &config.access_token_secret, config.access_token_ttl_hours)
        .map_err(token_error)?;

    Ok(Json(TokenResponse { access_token }))
}

#[axum::debug_handler]
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<UserRecord>>, AppError> {
    debug!("Listing users for {}", identity.email);
    Ok(Json(state.store.list_users().await?))
}

/// Creates or updates the user and hands back a fresh token for them.
#[axum::debug_handler]
pub async fn upsert_user(
    State(state): State<Arc<AppState>>,
    AppPath(email): AppPath<String>,
    AppJson(mut profile): AppJson<Map<String, Value>>,
) -> Result<Json<UpsertUserResponse>, AppError> {
    // the path names the user and roles only change through the admin route
    profile.remove("email");
    profile.remove("role");

    let record = UserRecord {
        email: email.clone(),
        role: Role::None,
        profile,
    };
    let result = state.store.upsert_user(&record).await?;

    let config = &state.config;
    let token = issue_email_token(&email, &config.access_token_secret, config.access_token_ttl_hours)
        .map_err(token_error)?;

    info!("User {} upserted", email);
    Ok(Json(UpsertUserResponse { result, token }))
}

#[axum::debug_handler]
pub async fn check_admin(
    State(state): State<Arc<AppState>>,
    AppPath(email): AppPath<String>,
) -> Result<Json<AdminStatus>, AppError> {
    let admin = state.store.find_user(&email).await?
        .is_some_and(|user| user.is_admin());

    Ok(Json(AdminStatus { admin }))
}

/// Requires the admin layer in front of it.
#[axum::debug_handler]
pub async fn grant_admin(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    AppPath(email): AppPath<String>,
) -> Result<Json<UserRecord>, AppError> {
    let updated = state.store.set_role(&email, Role::Admin).await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", email)))?;

    info!("{} granted admin role to {}", identity.email, email);
    Ok(Json(updated))
}
