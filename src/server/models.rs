use serde::{Deserialize, Serialize};

use crate::data::MP3_MIME;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub(crate) struct ActionRequest {
    pub(crate) image_base64: Option<String>,
    pub(crate) mime: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct DescribeResponse {
    pub(crate) description: String,
    pub(crate) model: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ExtractResponse {
    pub(crate) text: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct SpeakResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) audio_base64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) mime: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) warning: Option<String>,
}

impl SpeakResponse {
    pub(crate) fn audio(text: String, audio_base64: String) -> Self {
        Self {
            text: Some(text),
            audio_base64: Some(audio_base64),
            mime: Some(MP3_MIME.to_string()),
            warning: None,
        }
    }

    pub(crate) fn no_text() -> Self {
        Self {
            text: None,
            audio_base64: None,
            mime: None,
            warning: Some("no text found in the image".to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct NarrateResponse {
    pub(crate) description: String,
    pub(crate) audio_base64: String,
    pub(crate) mime: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct CapabilitiesResponse {
    pub(crate) assistant_available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) assistant_model: Option<String>,
    pub(crate) ocr_languages: String,
    pub(crate) tts_lang: String,
    pub(crate) accepted_mimes: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ErrorResponse {
    pub(crate) kind: String,
    pub(crate) error: String,
}
