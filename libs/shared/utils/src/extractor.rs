use std::sync::Arc;

use axum::{
    extract::{FromRequest, FromRequestParts, Request, State},
    middleware::Next,
    response::Response,
    Extension,
};
use axum_extra::{typed_header::TypedHeaderRejection, TypedHeader};
use headers::{authorization::Bearer, Authorization};
use tracing::{debug, warn};

use shared_database::UserDirectory;
use shared_models::auth::Identity;
use shared_models::clinic::UserRecord;
use shared_models::error::AppError;

use crate::jwt::validate_token;
use crate::state::AppState;

/// `axum::Json` whose rejections answer with the `AppError` body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);

/// Resolves the bearer token into an [`Identity`] and stores it in the
/// request extensions. No credential is a 401; a bad one is a 403.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    bearer: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let TypedHeader(auth) = bearer.map_err(|rejection| {
        if rejection.is_missing() {
            AppError::AuthMissing("Missing authorization header".to_string())
        } else {
            AppError::AuthInvalid("Invalid authorization header format".to_string())
        }
    })?;

    let identity = validate_token(auth.token(), &state.config.access_token_secret)
        .map_err(|e| {
            debug!("Rejected bearer token: {}", e);
            AppError::AuthInvalid(e.to_string())
        })?;

    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}

/// Layer after [`auth_middleware`]: lets the request through only when the
/// caller's user record carries the admin role.
pub async fn admin_middleware(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    require_admin(state.store.as_ref(), &identity).await?;
    Ok(next.run(request).await)
}

/// Capability check shared by the admin layer and handlers that need the
/// requester's record.
pub async fn require_admin<D>(directory: &D, identity: &Identity) -> Result<UserRecord, AppError>
where
    D: UserDirectory + ?Sized,
{
    match directory.find_user(&identity.email).await? {
        Some(user) if user.is_admin() => Ok(user),
        _ => {
            warn!("Admin access denied for {}", identity.email);
            Err(AppError::Forbidden("Admin role required".to_string()))
        }
    }
}
