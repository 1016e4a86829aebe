//! Middleware for bearer token authentication and role authorization

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use tracing::{error, warn};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::Role,
    state::AppState,
};

/// Authenticated caller, inserted into request extensions
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
}

/// Validate the bearer token and attach the caller to the request.
///
/// The token must carry a valid signature, must not be expired, must be
/// recorded in the ledger without the logged-out flag, and must name a user
/// that still exists.
pub async fn auth_middleware(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request<Body>,
    next: Next,
) -> ApiResult<Response> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or(ApiError::Unauthorized)?;
    let token = bearer.token();

    let claims = state.jwt_service.validate_token(token).map_err(|e| {
        warn!("Rejected bearer token: {}", e);
        ApiError::Unauthorized
    })?;

    let record = state
        .token_repository
        .find_by_token(token)
        .await
        .map_err(|e| {
            error!("Failed to look up token: {}", e);
            ApiError::Database(e)
        })?;

    match record {
        Some(record) if !record.logged_out => {}
        Some(_) => {
            warn!("Revoked token presented for user: {}", claims.sub);
            return Err(ApiError::Unauthorized);
        }
        None => {
            warn!("Unknown token presented for user: {}", claims.sub);
            return Err(ApiError::Unauthorized);
        }
    }

    let user = state
        .user_repository
        .find_by_username(&claims.sub)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    req.extensions_mut().insert(AuthUser {
        id: user.id,
        username: user.username,
        role: user.role,
    });

    Ok(next.run(req).await)
}

/// Reject callers that are not administrators.
///
/// Must run inside [`auth_middleware`].
pub async fn require_admin(req: Request<Body>, next: Next) -> ApiResult<Response> {
    let user = req
        .extensions()
        .get::<AuthUser>()
        .ok_or(ApiError::Unauthorized)?;

    if user.role != Role::Admin {
        warn!("User {} denied admin access", user.username);
        return Err(ApiError::Forbidden);
    }

    Ok(next.run(req).await)
}
