//! Route-level test harness: a TestServer wired to in-memory repositories
//! and a stub LLM client.

use std::sync::Arc;

use axum::Router;
use axum_test::TestServer;
use secrecy::SecretString;
use time::Duration;
use uuid::Uuid;

use crate::{
    adapters::http::{app_state::AppState, routes},
    application::{
        jwt,
        use_cases::{
            api_key::{ApiKeyRepo, ApiKeyUseCases},
            usage::{UsageRepo, UsageUseCases},
        },
    },
    infra::{config::AppConfig, llm::LlmClient},
    test_utils::{InMemoryApiKeyRepo, InMemoryUsageRepo, StubLlmClient},
};

/// Handles onto the in-memory repositories behind a test server, for
/// assertions on persisted state.
pub struct TestRepos {
    pub api_keys: Arc<InMemoryApiKeyRepo>,
    pub usage: Arc<InMemoryUsageRepo>,
}

pub fn create_test_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://unused".to_string(),
        db_max_connections: 1,
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        jwt_secret: SecretString::new("test-jwt-secret".to_string().into()),
        access_token_ttl: Duration::minutes(5),
        cors_origin: "http://localhost:3000".parse().unwrap(),
        trust_proxy: false,
        llm_api_url: "http://localhost:9".to_string(),
        llm_api_key: "unused".to_string(),
        llm_model: "test-model".to_string(),
    }
}

pub fn build_test_state() -> (AppState, TestRepos) {
    build_test_state_with_llm(Arc::new(StubLlmClient::new("stub completion")))
}

pub fn build_test_state_with_llm(llm: Arc<dyn LlmClient>) -> (AppState, TestRepos) {
    let api_key_repo = Arc::new(InMemoryApiKeyRepo::new());
    let usage_repo = Arc::new(InMemoryUsageRepo::new());

    let api_key_use_cases = ApiKeyUseCases::new(api_key_repo.clone() as Arc<dyn ApiKeyRepo>);
    let usage_use_cases = UsageUseCases::new(
        usage_repo.clone() as Arc<dyn UsageRepo>,
        api_key_repo.clone() as Arc<dyn ApiKeyRepo>,
    );

    let state = AppState {
        config: Arc::new(create_test_config()),
        api_key_use_cases: Arc::new(api_key_use_cases),
        usage_use_cases: Arc::new(usage_use_cases),
        llm,
    };

    (
        state,
        TestRepos {
            api_keys: api_key_repo,
            usage: usage_repo,
        },
    )
}

pub fn build_test_server() -> (TestServer, AppState, TestRepos) {
    build_test_server_with_llm(Arc::new(StubLlmClient::new("stub completion")))
}

pub fn build_test_server_with_llm(llm: Arc<dyn LlmClient>) -> (TestServer, AppState, TestRepos) {
    let (state, repos) = build_test_state_with_llm(llm);
    let app = Router::new()
        .nest("/api", routes::router(state.clone()))
        .with_state(state.clone());
    let server = TestServer::new(app).expect("test server");
    (server, state, repos)
}

/// Mint a session token the way the external login service would.
pub fn session_token(state: &AppState, user_id: Uuid) -> String {
    jwt::issue(user_id, &state.config.jwt_secret, state.config.access_token_ttl)
        .expect("issue test token")
}
