use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use uuid::Uuid;

use crate::app_error::{AppError, AppResult};
use crate::application::{security, validators};
use crate::domain::entities::api_key::KeyStatus;

// ============================================================================
// Repository Trait
// ============================================================================

#[async_trait]
pub trait ApiKeyRepo: Send + Sync {
    async fn create(
        &self,
        user_id: Uuid,
        key_prefix: &str,
        key_hash: &str,
        name: &str,
    ) -> AppResult<ApiKeyProfile>;

    /// All active keys sharing a prefix. Prefixes are short, so collisions
    /// across keys are legal; the caller must fingerprint-check every
    /// candidate.
    async fn find_active_by_prefix(&self, key_prefix: &str) -> AppResult<Vec<ApiKeyCandidate>>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<ApiKeyProfile>>;

    /// Non-revoked keys for a user, most recently created first.
    async fn list_by_user(&self, user_id: Uuid) -> AppResult<Vec<ApiKeyProfile>>;

    /// Set last_used_at to now and return the updated row.
    /// Fails with NotFound when the key is no longer active, so a revoke
    /// committed between lookup and touch still loses the race.
    async fn touch_last_used(&self, id: Uuid) -> AppResult<ApiKeyProfile>;

    /// Mark an active key revoked and return the updated row.
    /// Fails with NotFound when the key is no longer active.
    async fn revoke(&self, id: Uuid) -> AppResult<ApiKeyProfile>;
}

// ============================================================================
// Profile Types
// ============================================================================

/// An API key as exposed outside the persistence boundary. Carries the
/// non-secret prefix only; the fingerprint never leaves the lifecycle engine.
#[derive(Debug, Clone)]
pub struct ApiKeyProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub key_prefix: String,
    pub status: KeyStatus,
    pub created_at: Option<NaiveDateTime>,
    pub last_used_at: Option<NaiveDateTime>,
    pub revoked_at: Option<NaiveDateTime>,
}

/// Candidate row for verification: id plus stored fingerprint.
#[derive(Debug, Clone)]
pub struct ApiKeyCandidate {
    pub id: Uuid,
    pub key_hash: String,
}

// ============================================================================
// Use Cases
// ============================================================================

#[derive(Clone)]
pub struct ApiKeyUseCases {
    api_key_repo: Arc<dyn ApiKeyRepo>,
}

impl ApiKeyUseCases {
    pub fn new(api_key_repo: Arc<dyn ApiKeyRepo>) -> Self {
        Self { api_key_repo }
    }

    /// Create a new API key for a user.
    /// Returns the profile and the raw key. The raw key exists outside this
    /// call only as the returned value; it is never persisted or logged.
    pub async fn create_api_key(
        &self,
        user_id: Uuid,
        name: &str,
    ) -> AppResult<(ApiKeyProfile, String)> {
        let name = name.trim();
        if !validators::is_valid_key_name(name) {
            return Err(AppError::InvalidInput(
                "key name must be 1-100 characters".into(),
            ));
        }

        let raw_key = security::generate_api_key();
        let key_prefix = security::key_prefix(&raw_key)
            .ok_or_else(|| AppError::Internal("generated key shorter than prefix".into()))?;
        let key_hash = security::fingerprint(&raw_key);

        let profile = self
            .api_key_repo
            .create(user_id, key_prefix, &key_hash, name)
            .await?;

        Ok((profile, raw_key))
    }

    /// Verify a raw API key and touch its last_used_at timestamp.
    ///
    /// Prefix lookup narrows the candidate set, then each candidate's stored
    /// fingerprint is compared in constant time. Every failure mode (short
    /// input, unknown prefix, no fingerprint match) reports the same error,
    /// so callers learn nothing about which check rejected the key.
    pub async fn verify_api_key(&self, raw_key: &str) -> AppResult<ApiKeyProfile> {
        let Some(key_prefix) = security::key_prefix(raw_key) else {
            return Err(AppError::InvalidApiKey);
        };

        let candidates = self.api_key_repo.find_active_by_prefix(key_prefix).await?;

        for candidate in candidates {
            if security::fingerprint_matches(raw_key, &candidate.key_hash) {
                return match self.api_key_repo.touch_last_used(candidate.id).await {
                    // Revoked between lookup and touch: same generic error.
                    Err(AppError::NotFound) => Err(AppError::InvalidApiKey),
                    other => other,
                };
            }
        }

        Err(AppError::InvalidApiKey)
    }

    /// Revoke an API key.
    /// Reports NotFound when the key does not exist, belongs to another
    /// user, or is already revoked/expired. Re-revoking is not a success.
    pub async fn revoke_api_key(&self, key_id: Uuid, user_id: Uuid) -> AppResult<ApiKeyProfile> {
        let key = self
            .api_key_repo
            .find_by_id(key_id)
            .await?
            .ok_or(AppError::NotFound)?;

        if key.user_id != user_id || !key.status.is_active() {
            return Err(AppError::NotFound);
        }

        self.api_key_repo.revoke(key_id).await
    }

    /// List all non-revoked API keys for a user (for dashboard display).
    pub async fn list_api_keys(&self, user_id: Uuid) -> AppResult<Vec<ApiKeyProfile>> {
        self.api_key_repo.list_by_user(user_id).await
    }
}
