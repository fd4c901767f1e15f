use std::fs::File;
use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    adapters::http::app_state::AppState,
    application::use_cases::{
        api_key::{ApiKeyRepo, ApiKeyUseCases},
        usage::{UsageRepo, UsageUseCases},
    },
    infra::{config::AppConfig, llm::OpenAiLlmClient, postgres_persistence},
};

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let config = AppConfig::from_env();

    let postgres_arc = Arc::new(
        postgres_persistence(&config.database_url, config.db_max_connections).await?,
    );

    let api_key_use_cases = ApiKeyUseCases::new(postgres_arc.clone() as Arc<dyn ApiKeyRepo>);
    let usage_use_cases = UsageUseCases::new(
        postgres_arc.clone() as Arc<dyn UsageRepo>,
        postgres_arc.clone() as Arc<dyn ApiKeyRepo>,
    );

    let llm = Arc::new(OpenAiLlmClient::new(
        config.llm_api_url.clone(),
        config.llm_api_key.clone(),
        config.llm_model.clone(),
    ));

    Ok(AppState {
        config: Arc::new(config),
        api_key_use_cases: Arc::new(api_key_use_cases),
        usage_use_cases: Arc::new(usage_use_cases),
        llm,
    })
}

pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "aigate=debug,tower_http=debug".into());

    // Console (pretty logs)
    let console_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .pretty();

    // File (structured JSON logs)
    let file = File::create("app.log").expect("cannot create log file");
    let json_layer = fmt::layer()
        .json()
        .with_writer(file)
        .with_current_span(true)
        .with_span_list(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .ok();
}
