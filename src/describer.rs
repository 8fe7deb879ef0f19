use anyhow::{Context, Result, anyhow};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;
use serde_json::json;

use crate::credential::Credential;
use crate::data::UploadedImage;

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Instructions sent with every description request.
pub const SCENE_PROMPT: &str = "\
You are an AI assistant helping visually impaired individuals by describing the scene in the image. Provide:
1. A list of detected items and their purposes.
2. An overall description of the image.
3. The current status of the scene and how it likely looked before.
4. Predictions of what may happen next based on the image.
5. Suggestions or precautions for visually impaired users.";

/// Client for the hosted language model. Only constructed when a credential
/// was loaded, so holding a value doubles as the capability flag.
#[derive(Debug, Clone)]
pub struct SceneDescriber {
    key: Credential,
    model: String,
}

impl SceneDescriber {
    pub fn new(key: Credential, model: impl Into<String>) -> Self {
        Self {
            key,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Asks the model for a scene description. The uploaded image travels as
    /// inline data next to the fixed prompt, so the answer reflects the
    /// actual pixels.
    pub async fn describe(&self, image: &UploadedImage) -> Result<String> {
        let client = reqwest::Client::new();
        let url = format!("{}/{}:generateContent", BASE_URL, self.model);
        let encoded = BASE64.encode(&image.bytes);
        let body = json!({
            "contents": [{
                "role": "user",
                "parts": [
                    {"text": SCENE_PROMPT},
                    {
                        "inline_data": {
                            "mime_type": image.mime,
                            "data": encoded
                        }
                    }
                ]
            }]
        });

        let response = client
            .post(&url)
            .header("x-goog-api-key", self.key.reveal())
            .json(&body)
            .send()
            .await
            .with_context(|| "scene description request failed")?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(anyhow!(
                "Gemini API error ({}): {}",
                status,
                extract_gemini_error(&text).unwrap_or(text)
            ));
        }
        extract_description(&text)
    }
}

fn extract_description(text: &str) -> Result<String> {
    let payload: GenerateResponse = serde_json::from_str(text)
        .map_err(|err| anyhow!("failed to parse Gemini response JSON: {}", err))?;
    let candidate = payload
        .candidates
        .first()
        .and_then(|candidate| candidate.content.as_ref())
        .ok_or_else(|| anyhow!("no candidate returned from Gemini"))?;

    let description = candidate
        .parts
        .iter()
        .filter_map(|part| part.text.as_deref())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string();
    if description.is_empty() {
        return Err(anyhow!("no description text returned from Gemini"));
    }
    Ok(description)
}

fn extract_gemini_error(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: Option<GeminiError>,
    }

    #[derive(Deserialize)]
    struct GeminiError {
        message: Option<String>,
        status: Option<String>,
        code: Option<i32>,
    }

    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    let error = parsed.error?;
    Some(format_error_parts(
        error.message,
        error.status,
        error.code.map(|value| value.to_string()),
    ))
}

fn format_error_parts(
    message: Option<String>,
    kind: Option<String>,
    code: Option<String>,
) -> String {
    let mut parts = Vec::new();
    if let Some(message) = message
        && !message.trim().is_empty()
    {
        parts.push(message);
    }
    if let Some(kind) = kind
        && !kind.trim().is_empty()
    {
        parts.push(format!("type: {}", kind));
    }
    if let Some(code) = code
        && !code.trim().is_empty()
    {
        parts.push(format!("code: {}", code));
    }
    if parts.is_empty() {
        "unknown error".to_string()
    } else {
        parts.join(" | ")
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<GenerateCandidate>,
}

#[derive(Debug, Deserialize)]
struct GenerateCandidate {
    content: Option<GenerateContent>,
}

#[derive(Debug, Deserialize)]
struct GenerateContent {
    #[serde(default)]
    parts: Vec<GeneratePart>,
}

#[derive(Debug, Deserialize)]
struct GeneratePart {
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::{extract_description, extract_gemini_error};

    #[test]
    fn description_is_joined_from_candidate_parts() {
        let payload = include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/fixtures/gemini_generate_response.json"
        ));
        let description = extract_description(payload).unwrap();
        assert!(description.starts_with("1. Detected items:"));
        assert!(description.contains("street crossing"));
    }

    #[test]
    fn empty_candidate_list_is_an_error() {
        let err = extract_description(r#"{"candidates": []}"#).unwrap_err();
        assert!(err.to_string().contains("no candidate returned"));
    }

    #[test]
    fn candidate_without_text_is_an_error() {
        let payload = r#"{"candidates": [{"content": {"parts": [{}]}}]}"#;
        let err = extract_description(payload).unwrap_err();
        assert!(err.to_string().contains("no description text"));
    }

    #[test]
    fn api_error_body_surfaces_its_message() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid.", "status": "INVALID_ARGUMENT"}}"#;
        let message = extract_gemini_error(body).unwrap();
        assert_eq!(
            message,
            "API key not valid. | type: INVALID_ARGUMENT | code: 400"
        );
    }

    #[test]
    fn unparseable_error_body_yields_none() {
        assert!(extract_gemini_error("<html>502</html>").is_none());
    }
}
