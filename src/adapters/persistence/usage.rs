use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::usage::{NewUsageRecord, UsageRecord, UsageRepo},
};

fn row_to_record(row: sqlx::postgres::PgRow) -> UsageRecord {
    UsageRecord {
        id: row.get("id"),
        api_key_id: row.get("api_key_id"),
        endpoint: row.get("endpoint"),
        method: row.get("method"),
        status_code: row.get("status_code"),
        response_time: row.get("response_time"),
        ip_address: row.get("ip_address"),
        user_agent: row.get("user_agent"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl UsageRepo for PostgresPersistence {
    async fn insert(&self, record: NewUsageRecord) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO api_key_usage
                (api_key_id, endpoint, method, status_code, response_time, ip_address, user_agent)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(record.api_key_id)
        .bind(&record.endpoint)
        .bind(&record.method)
        .bind(record.status_code)
        .bind(record.response_time)
        .bind(&record.ip_address)
        .bind(&record.user_agent)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(())
    }

    async fn list_by_key(&self, api_key_id: Uuid) -> AppResult<Vec<UsageRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, api_key_id, endpoint, method, status_code, response_time,
                   ip_address, user_agent, created_at
            FROM api_key_usage
            WHERE api_key_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(api_key_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(rows.into_iter().map(row_to_record).collect())
    }
}
