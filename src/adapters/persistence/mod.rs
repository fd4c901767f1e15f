//! Postgres adapters for the repository traits.
//!
//! Expected schema (managed outside this crate):
//! - `api_keys(id uuid pk default gen_random_uuid(), user_id uuid, name text,
//!   key_prefix text indexed, key_hash text, status text default 'active',
//!   created_at timestamp default now(), last_used_at timestamp null,
//!   revoked_at timestamp null)`
//! - `api_key_usage(id uuid pk default gen_random_uuid(), api_key_id uuid
//!   references api_keys, endpoint text, method text, status_code int,
//!   response_time double precision, ip_address text, user_agent text null,
//!   created_at timestamp default now())`

use sqlx::PgPool;

use crate::app_error::AppError;

pub mod api_key;
pub mod usage;

#[derive(Clone)]
pub struct PostgresPersistence {
    pool: PgPool,
}

impl PostgresPersistence {
    pub fn new(pool: PgPool) -> Self {
        PostgresPersistence { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => AppError::NotFound,
            _ => AppError::Database(err.to_string()),
        }
    }
}
