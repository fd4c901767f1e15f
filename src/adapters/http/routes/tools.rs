use axum::{Extension, Json, Router, extract::State, routing::post};
use serde::{Deserialize, Serialize};

use crate::{
    adapters::http::{app_state::AppState, middleware::ApiKeyContext},
    app_error::{AppError, AppResult},
};

const MAX_INPUT_CHARS: usize = 20_000;

/// Returns a router for the gated AI tool endpoints.
/// Note: the api_key_auth middleware (verification + usage recording) is
/// applied in mod.rs when nesting this router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/summarize", post(summarize_text))
        .route("/paraphrase", post(paraphrase_text))
        .route("/image-to-text", post(image_to_text))
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
struct SummarizeRequest {
    text: String,
    #[serde(default)]
    max_length: Option<u32>,
}

#[derive(Serialize)]
struct SummarizeResponse {
    summary: String,
}

#[derive(Deserialize)]
struct ParaphraseRequest {
    text: String,
    #[serde(default)]
    tone: Option<String>,
}

#[derive(Serialize)]
struct ParaphraseResponse {
    paraphrased: String,
}

#[derive(Deserialize, Default, Clone, Copy)]
#[serde(rename_all = "lowercase")]
enum ImageAnalysisMode {
    #[default]
    Description,
    Ocr,
    Detailed,
}

impl ImageAnalysisMode {
    fn instruction(self) -> &'static str {
        match self {
            ImageAnalysisMode::Description => "Describe what you see in this image.",
            ImageAnalysisMode::Ocr => "Extract all text visible in this image.",
            ImageAnalysisMode::Detailed => "Analyze this image in detail.",
        }
    }
}

#[derive(Deserialize)]
struct ImageToTextRequest {
    image_url: String,
    #[serde(default)]
    mode: ImageAnalysisMode,
}

#[derive(Serialize)]
struct ImageToTextResponse {
    analysis: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/tools/summarize
async fn summarize_text(
    State(app_state): State<AppState>,
    Extension(_ctx): Extension<ApiKeyContext>,
    Json(body): Json<SummarizeRequest>,
) -> AppResult<Json<SummarizeResponse>> {
    validate_text(&body.text)?;

    let instruction = match body.max_length {
        Some(words) => format!("Summarize the following text in at most {words} words."),
        None => "Summarize the following text concisely.".to_string(),
    };

    let summary = app_state.llm.complete(&instruction, &body.text).await?;
    Ok(Json(SummarizeResponse { summary }))
}

/// POST /api/tools/paraphrase
async fn paraphrase_text(
    State(app_state): State<AppState>,
    Extension(_ctx): Extension<ApiKeyContext>,
    Json(body): Json<ParaphraseRequest>,
) -> AppResult<Json<ParaphraseResponse>> {
    validate_text(&body.text)?;

    let instruction = match body.tone.as_deref() {
        Some(tone) => format!("Paraphrase the following text in a {tone} tone."),
        None => "Paraphrase the following text.".to_string(),
    };

    let paraphrased = app_state.llm.complete(&instruction, &body.text).await?;
    Ok(Json(ParaphraseResponse { paraphrased }))
}

/// POST /api/tools/image-to-text
async fn image_to_text(
    State(app_state): State<AppState>,
    Extension(_ctx): Extension<ApiKeyContext>,
    Json(body): Json<ImageToTextRequest>,
) -> AppResult<Json<ImageToTextResponse>> {
    validate_image_url(&body.image_url)?;

    let analysis = app_state
        .llm
        .describe_image(body.mode.instruction(), body.image_url.trim())
        .await?;
    Ok(Json(ImageToTextResponse { analysis }))
}

fn validate_image_url(url: &str) -> AppResult<()> {
    let url = url.trim();
    if url.is_empty() {
        return Err(AppError::InvalidInput("image_url must not be empty".into()));
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(AppError::InvalidInput(
            "image_url must be an http(s) URL".into(),
        ));
    }
    Ok(())
}

fn validate_text(text: &str) -> AppResult<()> {
    if text.trim().is_empty() {
        return Err(AppError::InvalidInput("text must not be empty".into()));
    }
    if text.chars().count() > MAX_INPUT_CHARS {
        return Err(AppError::InvalidInput(format!(
            "text exceeds {MAX_INPUT_CHARS} characters"
        )));
    }
    Ok(())
}
