use axum::http::StatusCode;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use tracing::info;

use crate::data::{self, UploadedImage};
use crate::ocr;

use super::models::{
    ActionRequest, DescribeResponse, ExtractResponse, NarrateResponse, SpeakResponse,
};
use super::state::ServerState;

/// Everything an action can fail with, one variant per failure source.
/// Component calls return `anyhow::Result` internally; the dispatcher turns
/// them into these at the point of invocation and the page renders the
/// message.
#[derive(Debug)]
pub(crate) enum ActionError {
    BadRequest(String),
    Decode(String),
    Extraction(String),
    Synthesis(String),
    Generation(String),
    AssistantUnavailable,
}

impl ActionError {
    pub(crate) fn status(&self) -> StatusCode {
        match self {
            ActionError::BadRequest(_) | ActionError::Decode(_) => StatusCode::BAD_REQUEST,
            ActionError::Extraction(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ActionError::Synthesis(_) | ActionError::Generation(_) => StatusCode::BAD_GATEWAY,
            ActionError::AssistantUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            ActionError::BadRequest(_) => "bad_request",
            ActionError::Decode(_) => "decode_error",
            ActionError::Extraction(_) => "extraction_error",
            ActionError::Synthesis(_) => "synthesis_error",
            ActionError::Generation(_) => "generation_error",
            ActionError::AssistantUnavailable => "assistant_unavailable",
        }
    }

    pub(crate) fn message(&self) -> String {
        match self {
            ActionError::BadRequest(message)
            | ActionError::Decode(message)
            | ActionError::Extraction(message)
            | ActionError::Synthesis(message)
            | ActionError::Generation(message) => message.clone(),
            ActionError::AssistantUnavailable => {
                "scene assistant unavailable: no API key configured".to_string()
            }
        }
    }
}

pub(crate) async fn describe_scene(
    state: &ServerState,
    request: ActionRequest,
) -> Result<DescribeResponse, ActionError> {
    let describer = state
        .describer
        .as_ref()
        .ok_or(ActionError::AssistantUnavailable)?;
    let image = decode_upload(&request)?;
    info!("describe: {} {}x{}", image.mime, image.width, image.height);
    let description = describer
        .describe(&image)
        .await
        .map_err(|err| ActionError::Generation(err.to_string()))?;
    Ok(DescribeResponse {
        description,
        model: describer.model().to_string(),
    })
}

pub(crate) async fn extract_text(
    state: &ServerState,
    request: ActionRequest,
) -> Result<ExtractResponse, ActionError> {
    let image = decode_upload(&request)?;
    info!("extract: {} {}x{}", image.mime, image.width, image.height);
    let text = run_ocr(state, image).await?;
    Ok(ExtractResponse { text })
}

pub(crate) async fn speak_extracted_text(
    state: &ServerState,
    request: ActionRequest,
) -> Result<SpeakResponse, ActionError> {
    let image = decode_upload(&request)?;
    info!("speak: {} {}x{}", image.mime, image.width, image.height);
    let text = run_ocr(state, image).await?;
    let Some(content) = spoken_content(&text) else {
        return Ok(SpeakResponse::no_text());
    };
    let content = content.to_string();
    let audio = state
        .synthesizer
        .synthesize(&content)
        .await
        .map_err(|err| ActionError::Synthesis(err.to_string()))?;
    Ok(SpeakResponse::audio(content, BASE64.encode(audio)))
}

pub(crate) async fn narrate_scene(
    state: &ServerState,
    request: ActionRequest,
) -> Result<NarrateResponse, ActionError> {
    let describer = state
        .describer
        .as_ref()
        .ok_or(ActionError::AssistantUnavailable)?;
    let image = decode_upload(&request)?;
    info!("narrate: {} {}x{}", image.mime, image.width, image.height);
    let description = describer
        .describe(&image)
        .await
        .map_err(|err| ActionError::Generation(err.to_string()))?;
    let audio = state
        .synthesizer
        .synthesize(&description)
        .await
        .map_err(|err| ActionError::Synthesis(err.to_string()))?;
    Ok(NarrateResponse {
        description,
        audio_base64: BASE64.encode(audio),
        mime: data::MP3_MIME.to_string(),
    })
}

fn decode_upload(request: &ActionRequest) -> Result<UploadedImage, ActionError> {
    let Some(encoded) = request
        .image_base64
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
    else {
        return Err(ActionError::BadRequest("image is required".to_string()));
    };
    let bytes = BASE64
        .decode(encoded)
        .map_err(|err| ActionError::BadRequest(format!("invalid base64 image payload: {}", err)))?;
    data::load_upload(bytes, request.mime.as_deref())
        .map_err(|err| ActionError::Decode(err.to_string()))
}

// The OCR call is a subprocess plus pixel work; keep it off the async runtime.
async fn run_ocr(state: &ServerState, image: UploadedImage) -> Result<String, ActionError> {
    let languages = state.settings.ocr_languages.clone();
    tokio::task::spawn_blocking(move || ocr::extract_text(&image, &languages))
        .await
        .map_err(|err| ActionError::Extraction(format!("OCR task failed: {}", err)))?
        .map_err(|err| ActionError::Extraction(err.to_string()))
}

/// The synthesizer must not be called for empty or whitespace-only OCR
/// output; callers short-circuit with the no-text warning instead.
fn spoken_content(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    if trimmed.is_empty() { None } else { Some(trimmed) }
}
