use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::app_error::{AppError, AppResult};

/// Chat-completion collaborator behind the gated tool endpoints.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, instruction: &str, input: &str) -> AppResult<String>;

    /// Vision variant: the model reads the image behind `image_url`.
    async fn describe_image(&self, instruction: &str, image_url: &str) -> AppResult<String>;
}

/// Client for an OpenAI-compatible chat completions API.
pub struct OpenAiLlmClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl OpenAiLlmClient {
    pub fn new(api_url: String, api_key: String, model: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url,
            api_key,
            model,
        }
    }
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

impl OpenAiLlmClient {
    async fn chat(&self, body: serde_json::Value) -> AppResult<String> {
        let response = self
            .http
            .post(format!("{}/chat/completions", self.api_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::Upstream(format!(
                "completion API returned {}",
                response.status()
            )));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .ok_or_else(|| AppError::Upstream("completion API returned no choices".into()))
    }
}

#[async_trait]
impl LlmClient for OpenAiLlmClient {
    async fn complete(&self, instruction: &str, input: &str) -> AppResult<String> {
        self.chat(json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": instruction },
                { "role": "user", "content": input },
            ],
        }))
        .await
    }

    async fn describe_image(&self, instruction: &str, image_url: &str) -> AppResult<String> {
        self.chat(json!({
            "model": self.model,
            "messages": [
                {
                    "role": "user",
                    "content": [
                        { "type": "text", "text": instruction },
                        { "type": "image_url", "image_url": { "url": image_url } },
                    ],
                },
            ],
        }))
        .await
    }
}
