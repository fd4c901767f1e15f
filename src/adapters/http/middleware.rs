use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{
    adapters::http::app_state::AppState,
    app_error::AppError,
    application::{jwt, use_cases::usage::UsageRecorder},
};

/// Authenticated dashboard user, extracted from the session JWT.
#[derive(Clone, Copy, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
}

/// Verified API key context for gated tool requests.
#[derive(Clone, Copy, Debug)]
pub struct ApiKeyContext {
    pub key_id: Uuid,
    pub user_id: Uuid,
}

/// Bearer-JWT session check for dashboard routes. Token minting lives in the
/// external login service; only verification happens here.
pub async fn session_auth_middleware(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&request).ok_or(AppError::InvalidCredentials)?;
    let claims = jwt::verify(&token, &app_state.config.jwt_secret)?;
    let user_id = claims
        .sub
        .parse::<Uuid>()
        .map_err(|_| AppError::InvalidCredentials)?;

    request.extensions_mut().insert(AuthUser { user_id });
    Ok(next.run(request).await)
}

/// Verifies the X-API-Key header for gated tool routes, then guarantees
/// exactly one usage record for the request via a drop guard, whatever the
/// handler's outcome.
///
/// Verification failures are 401 and unattributed: with no credential
/// matched there is no key to charge the attempt to.
pub async fn api_key_auth_middleware(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Latency is measured from here so it includes the verification step.
    let started = Instant::now();

    let raw_key = request
        .headers()
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .ok_or(AppError::InvalidApiKey)?;

    let key = app_state.api_key_use_cases.verify_api_key(&raw_key).await?;

    let ip = client_ip(&request, app_state.config.trust_proxy);
    let user_agent = request
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let mut recorder = UsageRecorder::new(
        app_state.usage_use_cases.as_ref().clone(),
        started,
        key.id,
        request.uri().path().to_string(),
        request.method().to_string(),
        ip,
        user_agent,
    );

    request.extensions_mut().insert(ApiKeyContext {
        key_id: key.id,
        user_id: key.user_id,
    });

    let response = next.run(request).await;

    // On the normal path the guard records the real status; if the request
    // is cancelled before this point, dropping the guard still writes a
    // record with the client-closed status.
    recorder.set_status(response.status().as_u16() as i32);
    drop(recorder);

    Ok(response)
}

fn bearer_token(req: &Request) -> Option<String> {
    let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    value.strip_prefix("Bearer ").map(|t| t.trim().to_string())
}

fn client_ip(req: &Request, trust_proxy: bool) -> String {
    // Only trust forwarded headers if explicitly configured (when behind a
    // reverse proxy).
    if trust_proxy
        && let Some(ip) = forwarded_ip(req)
    {
        return ip;
    }
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn forwarded_ip(req: &Request) -> Option<String> {
    // Extract IP from X-Forwarded-For or X-Real-IP headers
    if let Some(forwarded) = req.headers().get("x-forwarded-for")
        && let Ok(val) = forwarded.to_str()
        && let Some(first) = val.split(',').next()
    {
        let trimmed = first.trim();
        if !trimmed.is_empty() {
            return Some(trimmed.to_string());
        }
    }
    if let Some(real) = req.headers().get("x-real-ip")
        && let Ok(val) = real.to_str()
        && !val.trim().is_empty()
    {
        return Some(val.trim().to_string());
    }
    None
}
