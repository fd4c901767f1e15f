use std::collections::HashMap;

use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    adapters::http::{app_state::AppState, middleware::AuthUser},
    app_error::AppResult,
    application::use_cases::{
        api_key::ApiKeyProfile,
        usage::{UsageRecord, UsageStats},
    },
};

/// Returns a router for API key management endpoints.
/// Note: the session_auth middleware is applied in mod.rs when nesting this
/// router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_api_key).get(list_api_keys))
        .route("/{key_id}", delete(revoke_api_key))
        .route("/{key_id}/usage", get(get_api_key_usage))
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
struct CreateKeyPayload {
    name: String,
}

#[derive(Serialize)]
struct ApiKeyResponse {
    id: Uuid,
    name: String,
    key_prefix: String,
    status: String,
    created_at: Option<NaiveDateTime>,
    last_used_at: Option<NaiveDateTime>,
    revoked_at: Option<NaiveDateTime>,
}

impl From<ApiKeyProfile> for ApiKeyResponse {
    fn from(profile: ApiKeyProfile) -> Self {
        ApiKeyResponse {
            id: profile.id,
            name: profile.name,
            key_prefix: profile.key_prefix,
            status: profile.status.to_string(),
            created_at: profile.created_at,
            last_used_at: profile.last_used_at,
            revoked_at: profile.revoked_at,
        }
    }
}

#[derive(Serialize)]
struct ApiKeyCreateResponse {
    #[serde(flatten)]
    key: ApiKeyResponse,
    /// Full API key, only shown once at creation.
    api_key: String,
}

#[derive(Serialize)]
struct ApiKeyListResponse {
    api_keys: Vec<ApiKeyResponse>,
}

#[derive(Serialize)]
struct UsageEntryResponse {
    endpoint: String,
    method: String,
    status_code: i32,
    response_time: f64,
    ip_address: String,
    user_agent: Option<String>,
    created_at: NaiveDateTime,
}

impl From<UsageRecord> for UsageEntryResponse {
    fn from(record: UsageRecord) -> Self {
        UsageEntryResponse {
            endpoint: record.endpoint,
            method: record.method,
            status_code: record.status_code,
            response_time: record.response_time,
            ip_address: record.ip_address,
            user_agent: record.user_agent,
            created_at: record.created_at,
        }
    }
}

#[derive(Serialize)]
struct UsageStatsResponse {
    total_requests: u64,
    successful_requests: u64,
    failed_requests: u64,
    average_response_time: f64,
    usage_by_endpoint: HashMap<String, u64>,
    recent_usage: Vec<UsageEntryResponse>,
}

impl From<UsageStats> for UsageStatsResponse {
    fn from(stats: UsageStats) -> Self {
        UsageStatsResponse {
            total_requests: stats.total_requests,
            successful_requests: stats.successful_requests,
            failed_requests: stats.failed_requests,
            average_response_time: stats.average_response_time,
            usage_by_endpoint: stats.usage_by_endpoint,
            recent_usage: stats.recent_usage.into_iter().map(Into::into).collect(),
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/keys
/// Create a new API key for the current user. The raw key appears in this
/// response and nowhere else, ever.
async fn create_api_key(
    State(app_state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<CreateKeyPayload>,
) -> AppResult<impl IntoResponse> {
    let (profile, raw_key) = app_state
        .api_key_use_cases
        .create_api_key(auth.user_id, &payload.name)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiKeyCreateResponse {
            key: profile.into(),
            api_key: raw_key,
        }),
    ))
}

/// GET /api/keys
async fn list_api_keys(
    State(app_state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> AppResult<impl IntoResponse> {
    let keys = app_state
        .api_key_use_cases
        .list_api_keys(auth.user_id)
        .await?;

    Ok(Json(ApiKeyListResponse {
        api_keys: keys.into_iter().map(Into::into).collect(),
    }))
}

/// DELETE /api/keys/{key_id}
async fn revoke_api_key(
    State(app_state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(key_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let profile = app_state
        .api_key_use_cases
        .revoke_api_key(key_id, auth.user_id)
        .await?;

    Ok(Json(ApiKeyResponse::from(profile)))
}

/// GET /api/keys/{key_id}/usage
async fn get_api_key_usage(
    State(app_state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(key_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let stats = app_state
        .usage_use_cases
        .usage_stats(key_id, auth.user_id)
        .await?;

    Ok(Json(UsageStatsResponse::from(stats)))
}
