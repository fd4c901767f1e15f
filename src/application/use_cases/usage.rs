use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use uuid::Uuid;

use crate::app_error::{AppError, AppResult};
use crate::application::use_cases::api_key::ApiKeyRepo;

/// Number of entries in the recent-usage feed of a stats response.
pub const RECENT_USAGE_LIMIT: usize = 10;

// ============================================================================
// Repository Trait
// ============================================================================

#[async_trait]
pub trait UsageRepo: Send + Sync {
    /// Append one usage record. Records are immutable once written.
    async fn insert(&self, record: NewUsageRecord) -> AppResult<()>;

    async fn list_by_key(&self, api_key_id: Uuid) -> AppResult<Vec<UsageRecord>>;
}

// ============================================================================
// Record Types
// ============================================================================

#[derive(Debug, Clone)]
pub struct NewUsageRecord {
    pub api_key_id: Uuid,
    pub endpoint: String,
    pub method: String,
    pub status_code: i32,
    /// End-to-end service time in seconds, verification included.
    pub response_time: f64,
    pub ip_address: String,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UsageRecord {
    pub id: Uuid,
    pub api_key_id: Uuid,
    pub endpoint: String,
    pub method: String,
    pub status_code: i32,
    pub response_time: f64,
    pub ip_address: String,
    pub user_agent: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct UsageStats {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub average_response_time: f64,
    pub usage_by_endpoint: HashMap<String, u64>,
    /// Up to RECENT_USAGE_LIMIT records, newest first.
    pub recent_usage: Vec<UsageRecord>,
}

// ============================================================================
// Use Cases
// ============================================================================

#[derive(Clone)]
pub struct UsageUseCases {
    usage_repo: Arc<dyn UsageRepo>,
    api_key_repo: Arc<dyn ApiKeyRepo>,
}

impl UsageUseCases {
    pub fn new(usage_repo: Arc<dyn UsageRepo>, api_key_repo: Arc<dyn ApiKeyRepo>) -> Self {
        Self {
            usage_repo,
            api_key_repo,
        }
    }

    /// Append one usage record for a gated request.
    /// Request-path callers should go through [`UsageRecorder`], which runs
    /// on every exit path and swallows write failures.
    pub async fn record_usage(&self, record: NewUsageRecord) -> AppResult<()> {
        self.usage_repo.insert(record).await
    }

    /// Usage statistics for one key, gated on ownership.
    /// Revoked and expired keys keep their history, so any status passes;
    /// a key owned by someone else reports NotFound.
    pub async fn usage_stats(&self, key_id: Uuid, user_id: Uuid) -> AppResult<UsageStats> {
        let key = self
            .api_key_repo
            .find_by_id(key_id)
            .await?
            .ok_or(AppError::NotFound)?;

        if key.user_id != user_id {
            return Err(AppError::NotFound);
        }

        let mut records = self.usage_repo.list_by_key(key_id).await?;

        let total_requests = records.len() as u64;
        let successful_requests = records.iter().filter(|r| r.status_code < 400).count() as u64;
        let failed_requests = total_requests - successful_requests;

        let average_response_time = if records.is_empty() {
            0.0
        } else {
            records.iter().map(|r| r.response_time).sum::<f64>() / records.len() as f64
        };

        let mut usage_by_endpoint: HashMap<String, u64> = HashMap::new();
        for record in &records {
            *usage_by_endpoint.entry(record.endpoint.clone()).or_insert(0) += 1;
        }

        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records.truncate(RECENT_USAGE_LIMIT);

        Ok(UsageStats {
            total_requests,
            successful_requests,
            failed_requests,
            average_response_time,
            usage_by_endpoint,
            recent_usage: records,
        })
    }
}

// ============================================================================
// Usage Recorder
// ============================================================================

/// Drop guard that guarantees one usage record per gated request, on every
/// exit path: success, error response, or cancellation mid-handler.
///
/// The write runs on a spawned task so a client disconnect cannot lose the
/// record, and write failures are logged and swallowed so they never alter
/// the gated request's own outcome.
pub struct UsageRecorder {
    usage: UsageUseCases,
    started: Instant,
    record: Option<NewUsageRecord>,
}

impl UsageRecorder {
    /// `started` should be captured at gated-request entry so the recorded
    /// latency includes the verification step.
    pub fn new(
        usage: UsageUseCases,
        started: Instant,
        api_key_id: Uuid,
        endpoint: String,
        method: String,
        ip_address: String,
        user_agent: Option<String>,
    ) -> Self {
        Self {
            usage,
            started,
            record: Some(NewUsageRecord {
                api_key_id,
                endpoint,
                method,
                // 499 (nginx client-closed-request) until a real status is
                // known; stays only when the request is cancelled mid-flight.
                status_code: 499,
                response_time: 0.0,
                ip_address,
                user_agent,
            }),
        }
    }

    pub fn set_status(&mut self, status_code: i32) {
        if let Some(record) = self.record.as_mut() {
            record.status_code = status_code;
        }
    }
}

impl Drop for UsageRecorder {
    fn drop(&mut self) {
        let Some(mut record) = self.record.take() else {
            return;
        };
        record.response_time = self.started.elapsed().as_secs_f64();

        let usage = self.usage.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(err) = usage.record_usage(record).await {
                        tracing::error!(error = ?err, "failed to write usage record");
                    }
                });
            }
            Err(_) => {
                tracing::error!("usage record dropped: no async runtime");
            }
        }
    }
}
