use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::api_key::{ApiKeyCandidate, ApiKeyProfile, ApiKeyRepo},
    domain::entities::api_key::KeyStatus,
};

fn row_to_profile(row: sqlx::postgres::PgRow) -> ApiKeyProfile {
    let status: String = row.get("status");
    ApiKeyProfile {
        id: row.get("id"),
        user_id: row.get("user_id"),
        name: row.get("name"),
        key_prefix: row.get("key_prefix"),
        status: KeyStatus::from_str(&status),
        created_at: row.get("created_at"),
        last_used_at: row.get("last_used_at"),
        revoked_at: row.get("revoked_at"),
    }
}

#[async_trait]
impl ApiKeyRepo for PostgresPersistence {
    async fn create(
        &self,
        user_id: Uuid,
        key_prefix: &str,
        key_hash: &str,
        name: &str,
    ) -> AppResult<ApiKeyProfile> {
        let row = sqlx::query(
            r#"
            INSERT INTO api_keys (user_id, key_prefix, key_hash, name, status)
            VALUES ($1, $2, $3, $4, 'active')
            RETURNING id, user_id, name, key_prefix, status, created_at, last_used_at, revoked_at
            "#,
        )
        .bind(user_id)
        .bind(key_prefix)
        .bind(key_hash)
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(row_to_profile(row))
    }

    async fn find_active_by_prefix(&self, key_prefix: &str) -> AppResult<Vec<ApiKeyCandidate>> {
        let rows = sqlx::query(
            r#"
            SELECT id, key_hash
            FROM api_keys
            WHERE key_prefix = $1 AND status = 'active'
            "#,
        )
        .bind(key_prefix)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(rows
            .into_iter()
            .map(|row| ApiKeyCandidate {
                id: row.get("id"),
                key_hash: row.get("key_hash"),
            })
            .collect())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<ApiKeyProfile>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, name, key_prefix, status, created_at, last_used_at, revoked_at
            FROM api_keys
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(row.map(row_to_profile))
    }

    async fn list_by_user(&self, user_id: Uuid) -> AppResult<Vec<ApiKeyProfile>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, name, key_prefix, status, created_at, last_used_at, revoked_at
            FROM api_keys
            WHERE user_id = $1 AND revoked_at IS NULL
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(rows.into_iter().map(row_to_profile).collect())
    }

    async fn touch_last_used(&self, id: Uuid) -> AppResult<ApiKeyProfile> {
        // The status guard keeps a concurrent revoke authoritative: once the
        // revoke commits, this update matches no row.
        let row = sqlx::query(
            r#"
            UPDATE api_keys
            SET last_used_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND status = 'active'
            RETURNING id, user_id, name, key_prefix, status, created_at, last_used_at, revoked_at
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(row_to_profile(row))
    }

    async fn revoke(&self, id: Uuid) -> AppResult<ApiKeyProfile> {
        let row = sqlx::query(
            r#"
            UPDATE api_keys
            SET status = 'revoked', revoked_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND status = 'active'
            RETURNING id, user_id, name, key_prefix, status, created_at, last_used_at, revoked_at
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(row_to_profile(row))
    }
}
