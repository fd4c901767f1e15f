use std::env;
use std::net::SocketAddr;

use axum::http::HeaderValue;
use secrecy::SecretString;
use time::Duration;

pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub bind_addr: SocketAddr,
    pub jwt_secret: SecretString,
    pub access_token_ttl: Duration,
    pub cors_origin: HeaderValue,
    /// Whether to trust X-Forwarded-For headers. Set to true only when the
    /// API sits behind a reverse proxy and is not directly exposed.
    pub trust_proxy: bool,
    /// Base URL of the OpenAI-compatible completion API.
    pub llm_api_url: String,
    pub llm_api_key: String,
    pub llm_model: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let db_max_connections: u32 = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or("5".to_string())
            .parse()
            .expect("DB_MAX_CONNECTIONS must be a valid number");

        let bind_addr: SocketAddr = env::var("BIND_ADDR")
            .unwrap_or("127.0.0.1:3001".to_string())
            .parse()
            .expect("BIND_ADDR must be a valid socket address");

        let jwt_secret =
            SecretString::new(env::var("JWT_SECRET").expect("JWT_SECRET must be set").into());

        let access_token_ttl_secs: i64 = env::var("ACCESS_TOKEN_TTL_SECS")
            .unwrap_or("86400".to_string())
            .parse()
            .expect("ACCESS_TOKEN_TTL_SECS must be a valid number");

        let cors_origin: HeaderValue = env::var("CORS_ORIGIN")
            .unwrap_or("http://localhost:3000".to_string())
            .parse()
            .expect("CORS_ORIGIN must be a valid header value");

        let trust_proxy: bool = env::var("TRUST_PROXY")
            .unwrap_or("false".to_string())
            .parse()
            .expect("TRUST_PROXY must be true or false");

        let llm_api_url = env::var("LLM_API_URL")
            .unwrap_or("https://api.openai.com/v1".to_string());
        let llm_api_key = env::var("LLM_API_KEY").expect("LLM_API_KEY must be set");
        let llm_model = env::var("LLM_MODEL").unwrap_or("gpt-4o-mini".to_string());

        Self {
            database_url,
            db_max_connections,
            bind_addr,
            jwt_secret,
            access_token_ttl: Duration::seconds(access_token_ttl_secs),
            cors_origin,
            trust_proxy,
            llm_api_url,
            llm_api_key,
            llm_model,
        }
    }
}
