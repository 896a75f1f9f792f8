//! Gemini (Google) image editor.

use crate::edit::provider::ImageEditor;
use crate::edit::request::{EditPart, EditRequest};
use crate::error::{parse_retry_after, sanitize_error_message, LuminaError, Result};
use crate::image::EncodedImage;
use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Default Generative Language API root.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini image model variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GeminiModel {
    /// Nano Banana - Gemini 2.5 Flash Image (fast, economical).
    #[default]
    NanoBanana,
    /// Nano Banana Pro - Gemini 3 Pro Image (highest quality).
    NanoBananaPro,
}

impl GeminiModel {
    /// Returns the API model identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NanoBanana => "gemini-2.5-flash-image",
            Self::NanoBananaPro => "gemini-3-pro-image-preview",
        }
    }
}

impl std::fmt::Display for GeminiModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builder for [`GeminiEditor`].
#[derive(Debug, Clone, Default)]
pub struct GeminiEditorBuilder {
    api_key: Option<String>,
    model: GeminiModel,
    base_url: Option<String>,
}

impl GeminiEditorBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key. Falls back to `GOOGLE_API_KEY`, then `API_KEY`.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the Gemini model variant.
    pub fn model(mut self, model: GeminiModel) -> Self {
        self.model = model;
        self
    }

    /// Overrides the API root (e.g. a proxy or a local mock server).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Builds the editor, resolving the API key.
    pub fn build(self) -> Result<GeminiEditor> {
        let api_key = self
            .api_key
            .or_else(|| std::env::var("GOOGLE_API_KEY").ok())
            .or_else(|| std::env::var("API_KEY").ok())
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                LuminaError::Auth("GOOGLE_API_KEY not set and no API key provided".into())
            })?;

        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(GeminiEditor {
            client: reqwest::Client::new(),
            api_key,
            model: self.model,
            base_url,
        })
    }
}

/// Edits images through Gemini `generateContent`.
pub struct GeminiEditor {
    client: reqwest::Client,
    api_key: String,
    model: GeminiModel,
    base_url: String,
}

impl GeminiEditor {
    /// Creates a new `GeminiEditorBuilder`.
    pub fn builder() -> GeminiEditorBuilder {
        GeminiEditorBuilder::new()
    }

    /// The model this editor calls.
    pub fn model(&self) -> GeminiModel {
        self.model
    }

    async fn edit_impl(&self, image: &EncodedImage, prompt: &str) -> Result<EncodedImage> {
        let start = Instant::now();

        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url,
            self.model.as_str(),
        );

        let body = GeminiRequest::from_edit_request(&EditRequest::new(image, prompt));

        tracing::debug!(
            model = %self.model,
            mime_type = image.mime_type(),
            prompt_len = prompt.len(),
            "sending Gemini edit request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let text = response.text().await.unwrap_or_default();
            return Err(parse_error(status.as_u16(), &text, &headers));
        }

        let text = response.text().await?;
        let gemini_response: GeminiResponse = serde_json::from_str(&text)?;
        let edited = extract_image(gemini_response)?;

        tracing::debug!(
            mime_type = edited.mime_type(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Gemini edit complete"
        );

        Ok(edited)
    }
}

#[async_trait]
impl ImageEditor for GeminiEditor {
    async fn edit(&self, image: &EncodedImage, prompt: &str) -> Result<EncodedImage> {
        self.edit_impl(image, prompt).await
    }

    fn name(&self) -> &str {
        "Gemini (Google)"
    }

    async fn health_check(&self) -> Result<()> {
        let url = format!("{}/models/{}", self.base_url, self.model.as_str());

        let response = self
            .client
            .get(&url)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await?;

        match response.status().as_u16() {
            401 | 403 => Err(LuminaError::Auth("Invalid API key".into())),
            404 => Err(LuminaError::InvalidRequest(
                "Model not found. Verify the model name is correct.".into(),
            )),
            s if !(200..300).contains(&s) => Err(LuminaError::Api {
                status: s,
                message: "Health check failed".into(),
            }),
            _ => Ok(()),
        }
    }
}

fn parse_error(status: u16, text: &str, headers: &reqwest::header::HeaderMap) -> LuminaError {
    let text = sanitize_error_message(text);
    match status {
        402 => LuminaError::Billing(
            "Gemini billing issue: enable billing at https://aistudio.google.com".into(),
        ),
        404 => LuminaError::InvalidRequest(
            "Model not found. Verify the model name is correct.".into(),
        ),
        429 => LuminaError::RateLimited {
            retry_after: parse_retry_after(headers).map(std::time::Duration::from_secs),
        },
        401 | 403 => LuminaError::Auth(text),
        _ => {
            let lower = text.to_lowercase();
            if lower.contains("safety") || lower.contains("blocked") || lower.contains("prohibited")
            {
                LuminaError::ContentBlocked(text)
            } else {
                LuminaError::Api {
                    status,
                    message: text,
                }
            }
        }
    }
}

/// Scans the first candidate for its first inline image part.
fn extract_image(response: GeminiResponse) -> Result<EncodedImage> {
    // Prompt blocks arrive as HTTP 200 with feedback and no candidates.
    if let Some(ref feedback) = response.prompt_feedback {
        if let Some(ref reason) = feedback.block_reason {
            let msg = feedback
                .block_reason_message
                .clone()
                .unwrap_or_else(|| format!("Prompt blocked: {}", reason));
            return Err(LuminaError::ContentBlocked(msg));
        }
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or(LuminaError::NoContent)?;

    let parts = candidate
        .content
        .map(|c| c.parts)
        .filter(|parts| !parts.is_empty());

    let Some(parts) = parts else {
        return Err(match candidate.finish_reason.as_deref() {
            Some(reason) if is_safety_reason(reason) => LuminaError::ContentBlocked(format!(
                "Content blocked by Gemini safety filter: {}",
                reason
            )),
            _ => LuminaError::NoContent,
        });
    };

    let mut text_parts = Vec::new();
    for part in parts {
        if let Some(inline) = part.inline_data {
            base64::engine::general_purpose::STANDARD
                .decode(&inline.data)
                .map_err(|e| LuminaError::Decode(e.to_string()))?;
            return Ok(EncodedImage::from_inline(inline.mime_type, inline.data));
        }
        if let Some(text) = part.text {
            text_parts.push(text);
        }
    }

    if !text_parts.is_empty() {
        tracing::debug!(text = %text_parts.join(" "), "Gemini answered with text only");
    }
    match candidate.finish_reason.as_deref() {
        Some(reason) if is_safety_reason(reason) => Err(LuminaError::ContentBlocked(format!(
            "Content blocked by Gemini safety filter: {}",
            reason
        ))),
        _ => Err(LuminaError::NoImageInResponse),
    }
}

fn is_safety_reason(reason: &str) -> bool {
    matches!(
        reason,
        "SAFETY"
            | "IMAGE_SAFETY"
            | "IMAGE_PROHIBITED_CONTENT"
            | "IMAGE_RECITATION"
            | "RECITATION"
            | "PROHIBITED_CONTENT"
            | "BLOCKLIST"
    )
}

// Request/Response types
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiRequestPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiRequestPart {
    #[serde(rename_all = "camelCase")]
    InlineData { inline_data: GeminiInlineData },
    Text { text: String },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiConfig {
    response_modalities: Vec<String>,
}

impl GeminiRequest {
    fn from_edit_request(req: &EditRequest) -> Self {
        let parts = req
            .parts()
            .iter()
            .map(|part| match part {
                EditPart::InlineData { mime_type, data } => GeminiRequestPart::InlineData {
                    inline_data: GeminiInlineData {
                        mime_type: mime_type.clone(),
                        data: data.clone(),
                    },
                },
                EditPart::Text { text } => GeminiRequestPart::Text { text: text.clone() },
            })
            .collect();

        Self {
            contents: vec![GeminiContent { parts }],
            generation_config: GeminiConfig {
                response_modalities: vec!["IMAGE".to_string()],
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContentResponse>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
    #[serde(default)]
    block_reason_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPartResponse {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> GeminiResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_gemini_model_as_str() {
        assert_eq!(GeminiModel::NanoBanana.as_str(), "gemini-2.5-flash-image");
        assert_eq!(
            GeminiModel::NanoBananaPro.as_str(),
            "gemini-3-pro-image-preview"
        );
        assert_eq!(GeminiModel::default(), GeminiModel::NanoBanana);
    }

    #[test]
    fn test_builder_with_explicit_key() {
        let editor = GeminiEditorBuilder::new()
            .api_key("test-key")
            .model(GeminiModel::NanoBananaPro)
            .base_url("http://localhost:1234/v1beta/")
            .build()
            .unwrap();
        assert_eq!(editor.model(), GeminiModel::NanoBananaPro);
        assert_eq!(editor.base_url, "http://localhost:1234/v1beta");
    }

    #[test]
    fn test_request_serialization() {
        let image = EncodedImage::from_inline("image/png", "iVBORw0KGgo=");
        let req = GeminiRequest::from_edit_request(&EditRequest::new(&image, "remove background"));
        let json = serde_json::to_value(&req).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "contents": [{
                    "parts": [
                        {"inlineData": {"mimeType": "image/png", "data": "iVBORw0KGgo="}},
                        {"text": "remove background"}
                    ]
                }],
                "generationConfig": {"responseModalities": ["IMAGE"]}
            })
        );
    }

    #[test]
    fn test_extract_first_image_ignoring_text() {
        let resp = parse(
            r#"{
            "candidates": [{
                "content": {
                    "parts": [
                        {"text": "Here is your edited image"},
                        {"inlineData": {"mimeType": "image/jpeg", "data": "/9j/4AAQ"}},
                        {"inlineData": {"mimeType": "image/png", "data": "iVBORw0KGgo="}}
                    ]
                },
                "finishReason": "STOP"
            }]
        }"#,
        );
        let image = extract_image(resp).unwrap();
        assert_eq!(image.mime_type(), "image/jpeg");
        assert_eq!(image.data(), "data:image/jpeg;base64,/9j/4AAQ");
    }

    #[test]
    fn test_extract_no_candidates_is_no_content() {
        let err = extract_image(parse(r#"{"candidates": []}"#)).unwrap_err();
        assert!(matches!(err, LuminaError::NoContent));

        let err = extract_image(parse(r#"{}"#)).unwrap_err();
        assert!(matches!(err, LuminaError::NoContent));
    }

    #[test]
    fn test_extract_empty_parts_is_no_content() {
        let err =
            extract_image(parse(r#"{"candidates": [{"content": {"parts": []}}]}"#)).unwrap_err();
        assert!(matches!(err, LuminaError::NoContent));

        let err = extract_image(parse(r#"{"candidates": [{"finishReason": "STOP"}]}"#))
            .unwrap_err();
        assert!(matches!(err, LuminaError::NoContent));
    }

    #[test]
    fn test_extract_text_only_is_no_image() {
        let resp = parse(
            r#"{"candidates": [{"content": {"parts": [{"text": "I can't do that"}]}}]}"#,
        );
        let err = extract_image(resp).unwrap_err();
        assert!(matches!(err, LuminaError::NoImageInResponse));
    }

    #[test]
    fn test_extract_prompt_feedback_block() {
        let resp = parse(
            r#"{
            "candidates": [],
            "promptFeedback": {
                "blockReason": "SAFETY",
                "blockReasonMessage": "Prompt was blocked due to safety"
            }
        }"#,
        );
        match extract_image(resp).unwrap_err() {
            LuminaError::ContentBlocked(msg) => assert_eq!(msg, "Prompt was blocked due to safety"),
            other => panic!("expected ContentBlocked, got {other:?}"),
        }
    }

    #[test]
    fn test_extract_safety_finish_reason() {
        let resp = parse(r#"{"candidates": [{"finishReason": "IMAGE_SAFETY"}]}"#);
        assert!(matches!(
            extract_image(resp).unwrap_err(),
            LuminaError::ContentBlocked(_)
        ));
    }

    #[test]
    fn test_extract_invalid_base64() {
        let resp = parse(
            r#"{"candidates": [{"content": {"parts": [{"inlineData": {"mimeType": "image/png", "data": "@@@"}}]}}]}"#,
        );
        assert!(matches!(
            extract_image(resp).unwrap_err(),
            LuminaError::Decode(_)
        ));
    }

    #[test]
    fn test_parse_error_statuses() {
        let headers = reqwest::header::HeaderMap::new();
        assert!(matches!(
            parse_error(401, "nope", &headers),
            LuminaError::Auth(_)
        ));
        assert!(matches!(
            parse_error(402, "", &headers),
            LuminaError::Billing(_)
        ));
        assert!(matches!(
            parse_error(429, "", &headers),
            LuminaError::RateLimited { retry_after: None }
        ));
        assert!(matches!(
            parse_error(400, "request blocked by safety system", &headers),
            LuminaError::ContentBlocked(_)
        ));
        assert!(matches!(
            parse_error(500, "internal", &headers),
            LuminaError::Api { status: 500, .. }
        ));
    }
}
