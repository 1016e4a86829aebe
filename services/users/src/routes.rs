//! User management routes
//!
//! Layers run in this order, outermost first: CORS, security headers,
//! request tracing, bearer authentication, admin authorization, handler.

use axum::{
    Extension, Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{HeaderValue, StatusCode, header},
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;
use serde::Deserialize;
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use crate::{
    error::{ApiError, ApiResult},
    middleware::{AuthUser, auth_middleware, require_admin},
    models::{LoginCredentials, UserProfile, UserRecord},
    services::{BatchReport, generator},
    state::AppState,
};

/// Query for synthetic generation
#[derive(Debug, Deserialize)]
pub struct GenerateQuery {
    pub count: usize,
}

/// Create the router for the user management service
pub fn create_router(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route("/api/users/:username", get(get_user_by_username))
        .route_layer(middleware::from_fn(require_admin));

    let protected_routes = Router::new()
        .route("/api/users/me", get(logged_out_users))
        .merge(admin_routes)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let batch_limit = state.server_config.batch_max_bytes;

    Router::new()
        .route("/health", get(health_check))
        .route("/api/auth/login", post(login))
        .route("/api/users/login", post(login))
        .route("/api/auth/register", post(register))
        .route("/api/users/generate", get(generate_users))
        .route(
            "/api/users/batch",
            post(batch_import).layer(DefaultBodyLimit::max(batch_limit)),
        )
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "user-service"
    }))
}

/// User login endpoint
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginCredentials>,
) -> ApiResult<impl IntoResponse> {
    let response = state
        .auth_service
        .authenticate(&payload.username, &payload.password)
        .await?;

    Ok((StatusCode::OK, Json(response)))
}

/// Single user registration endpoint
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<UserRecord>,
) -> ApiResult<impl IntoResponse> {
    let profile = state.auth_service.register(payload).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

/// Download `count` synthetic users as a JSON file
pub async fn generate_users(
    State(state): State<AppState>,
    Query(query): Query<GenerateQuery>,
) -> ApiResult<impl IntoResponse> {
    let max = state.server_config.generate_max_count;
    if query.count > max {
        return Err(ApiError::BadRequest(format!(
            "count must be at most {}",
            max
        )));
    }

    info!("Generating {} synthetic user(s)", query.count);
    let users = generator::generate_users(query.count);
    let body = serde_json::to_vec(&users).map_err(|e| {
        error!("Failed to serialize generated users: {}", e);
        ApiError::Unexpected(e.to_string())
    })?;

    let file_name = generator::export_file_name(Utc::now().timestamp_millis());
    let headers = [
        (
            header::CONTENT_TYPE,
            "application/octet-stream".to_string(),
        ),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename={}", file_name),
        ),
    ];

    Ok((StatusCode::OK, headers, body))
}

/// Import users from the multipart `file` part
pub async fn batch_import(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let mut payload = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                error!("Failed to read multipart upload: {}", e);
                return Ok(malformed_response());
            }
        };

        if field.name() != Some("file") {
            continue;
        }

        match field.bytes().await {
            Ok(bytes) => {
                payload = Some(bytes);
                break;
            }
            Err(e) => {
                error!("Failed to read uploaded file: {}", e);
                return Ok(malformed_response());
            }
        }
    }

    let payload = payload.ok_or_else(|| ApiError::BadRequest("missing file part".to_string()))?;

    match state.batch_importer.import_batch(&payload).await {
        Ok(report) => Ok((StatusCode::CREATED, Json(report))),
        Err(ApiError::MalformedPayload(reason)) => {
            warn!("Rejected batch upload: {}", reason);
            Ok(malformed_response())
        }
        Err(e) => Err(e),
    }
}

fn malformed_response() -> (StatusCode, Json<BatchReport>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(BatchReport::malformed()),
    )
}

/// Users having at least one logged-out token
pub async fn logged_out_users(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    info!("Listing logged-out users for {}", caller.username);

    let users = state
        .user_repository
        .find_users_with_logged_out_tokens()
        .await?;
    let profiles: Vec<UserProfile> = users.iter().map(UserProfile::from).collect();

    Ok(Json(profiles))
}

/// Look a user up by username (administrators only)
pub async fn get_user_by_username(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let user = state
        .user_repository
        .find_by_username(&username)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User {} not found", username)))?;

    Ok(Json(UserProfile::from(&user)))
}
