//! In-memory mock implementations of the repository traits.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        security,
        use_cases::{
            api_key::{ApiKeyCandidate, ApiKeyProfile, ApiKeyRepo},
            usage::{NewUsageRecord, UsageRecord, UsageRepo},
        },
    },
    domain::entities::api_key::KeyStatus,
    infra::llm::LlmClient,
    test_utils::test_datetime_offset_secs,
};

struct StoredKey {
    profile: ApiKeyProfile,
    key_hash: String,
    seq: i64,
}

/// In-memory implementation of ApiKeyRepo for testing.
#[derive(Default)]
pub struct InMemoryApiKeyRepo {
    keys: Mutex<HashMap<Uuid, StoredKey>>,
    seq: AtomicI64,
}

impl InMemoryApiKeyRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// The persisted fingerprint for a key (for test assertions).
    pub fn stored_hash(&self, id: Uuid) -> Option<String> {
        self.keys
            .lock()
            .unwrap()
            .get(&id)
            .map(|k| k.key_hash.clone())
    }

    /// Insert a key derived from a caller-chosen raw secret, bypassing
    /// generation. Used to construct prefix collisions deliberately.
    pub fn seed_key(&self, user_id: Uuid, raw_key: &str, name: &str) -> ApiKeyProfile {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        let profile = ApiKeyProfile {
            id: Uuid::new_v4(),
            user_id,
            name: name.to_string(),
            key_prefix: security::key_prefix(raw_key).expect("seed key too short").to_string(),
            status: KeyStatus::Active,
            created_at: Some(test_datetime_offset_secs(seq)),
            last_used_at: None,
            revoked_at: None,
        };
        self.keys.lock().unwrap().insert(
            profile.id,
            StoredKey {
                profile: profile.clone(),
                key_hash: security::fingerprint(raw_key),
                seq,
            },
        );
        profile
    }
}

#[async_trait]
impl ApiKeyRepo for InMemoryApiKeyRepo {
    async fn create(
        &self,
        user_id: Uuid,
        key_prefix: &str,
        key_hash: &str,
        name: &str,
    ) -> AppResult<ApiKeyProfile> {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        let profile = ApiKeyProfile {
            id: Uuid::new_v4(),
            user_id,
            name: name.to_string(),
            key_prefix: key_prefix.to_string(),
            status: KeyStatus::Active,
            created_at: Some(test_datetime_offset_secs(seq)),
            last_used_at: None,
            revoked_at: None,
        };
        self.keys.lock().unwrap().insert(
            profile.id,
            StoredKey {
                profile: profile.clone(),
                key_hash: key_hash.to_string(),
                seq,
            },
        );
        Ok(profile)
    }

    async fn find_active_by_prefix(&self, key_prefix: &str) -> AppResult<Vec<ApiKeyCandidate>> {
        Ok(self
            .keys
            .lock()
            .unwrap()
            .values()
            .filter(|k| k.profile.status.is_active() && k.profile.key_prefix == key_prefix)
            .map(|k| ApiKeyCandidate {
                id: k.profile.id,
                key_hash: k.key_hash.clone(),
            })
            .collect())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<ApiKeyProfile>> {
        Ok(self.keys.lock().unwrap().get(&id).map(|k| k.profile.clone()))
    }

    async fn list_by_user(&self, user_id: Uuid) -> AppResult<Vec<ApiKeyProfile>> {
        let keys = self.keys.lock().unwrap();
        let mut rows: Vec<&StoredKey> = keys
            .values()
            .filter(|k| k.profile.user_id == user_id && k.profile.revoked_at.is_none())
            .collect();
        rows.sort_by(|a, b| b.seq.cmp(&a.seq));
        Ok(rows.into_iter().map(|k| k.profile.clone()).collect())
    }

    async fn touch_last_used(&self, id: Uuid) -> AppResult<ApiKeyProfile> {
        let mut keys = self.keys.lock().unwrap();
        let key = keys.get_mut(&id).ok_or(AppError::NotFound)?;
        if !key.profile.status.is_active() {
            return Err(AppError::NotFound);
        }
        key.profile.last_used_at = Some(chrono::Utc::now().naive_utc());
        Ok(key.profile.clone())
    }

    async fn revoke(&self, id: Uuid) -> AppResult<ApiKeyProfile> {
        let mut keys = self.keys.lock().unwrap();
        let key = keys.get_mut(&id).ok_or(AppError::NotFound)?;
        if !key.profile.status.is_active() {
            return Err(AppError::NotFound);
        }
        key.profile.status = KeyStatus::Revoked;
        key.profile.revoked_at = Some(chrono::Utc::now().naive_utc());
        Ok(key.profile.clone())
    }
}

/// In-memory implementation of UsageRepo for testing.
#[derive(Default)]
pub struct InMemoryUsageRepo {
    records: Mutex<Vec<UsageRecord>>,
}

impl InMemoryUsageRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully-formed record, timestamps included.
    pub fn seed(&self, record: UsageRecord) {
        self.records.lock().unwrap().push(record);
    }

    /// All records (for test assertions).
    pub fn all(&self) -> Vec<UsageRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl UsageRepo for InMemoryUsageRepo {
    async fn insert(&self, record: NewUsageRecord) -> AppResult<()> {
        self.records.lock().unwrap().push(UsageRecord {
            id: Uuid::new_v4(),
            api_key_id: record.api_key_id,
            endpoint: record.endpoint,
            method: record.method,
            status_code: record.status_code,
            response_time: record.response_time,
            ip_address: record.ip_address,
            user_agent: record.user_agent,
            created_at: chrono::Utc::now().naive_utc(),
        });
        Ok(())
    }

    async fn list_by_key(&self, api_key_id: Uuid) -> AppResult<Vec<UsageRecord>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.api_key_id == api_key_id)
            .cloned()
            .collect())
    }
}

/// Stub LLM client returning a canned completion.
pub struct StubLlmClient {
    pub reply: String,
}

impl StubLlmClient {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
        }
    }
}

#[async_trait]
impl LlmClient for StubLlmClient {
    async fn complete(&self, _instruction: &str, _input: &str) -> AppResult<String> {
        Ok(self.reply.clone())
    }

    async fn describe_image(&self, _instruction: &str, _image_url: &str) -> AppResult<String> {
        Ok(self.reply.clone())
    }
}

/// LLM client that always fails, for exercising upstream error paths.
pub struct FailingLlmClient;

#[async_trait]
impl LlmClient for FailingLlmClient {
    async fn complete(&self, _instruction: &str, _input: &str) -> AppResult<String> {
        Err(AppError::Upstream("completion API unavailable".into()))
    }

    async fn describe_image(&self, _instruction: &str, _image_url: &str) -> AppResult<String> {
        Err(AppError::Upstream("completion API unavailable".into()))
    }
}
