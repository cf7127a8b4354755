//! Gemini image-model adapter.
//!
//! All configuration is explicit constructor input; the adapter never reads
//! ambient environment state.

use std::time::Instant;

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    foundation::error::{MaskeditError, MaskeditResult},
    model::provider::{EditProvider, EditRequest, EditedImage},
};

/// Gemini image model variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GeminiModel {
    /// Gemini 2.5 Flash Image (fast, economical).
    #[default]
    Flash,
    /// Gemini 3 Pro Image (highest quality).
    Pro,
}

impl GeminiModel {
    /// The API model identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Flash => "gemini-2.5-flash-image",
            Self::Pro => "gemini-3-pro-image-preview",
        }
    }
}

/// Aspect-ratio hint forwarded to the model's image config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AspectRatioHint {
    /// 1:1.
    Square,
    /// 16:9.
    Landscape,
    /// 9:16.
    Portrait,
}

impl AspectRatioHint {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::Landscape => "16:9",
            Self::Portrait => "9:16",
        }
    }
}

/// Builder for [`GeminiEditor`].
#[derive(Debug, Clone, Default)]
pub struct GeminiEditorBuilder {
    api_key: Option<String>,
    model: GeminiModel,
    system_instruction: Option<String>,
    aspect_ratio: Option<AspectRatioHint>,
}

impl GeminiEditorBuilder {
    /// Create a builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the API key (required; there is no environment fallback).
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the model variant.
    pub fn model(mut self, model: GeminiModel) -> Self {
        self.model = model;
        self
    }

    /// Set a system instruction prefixed to every prompt.
    pub fn system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    /// Set an aspect-ratio hint for generated frames.
    pub fn aspect_ratio(mut self, ratio: AspectRatioHint) -> Self {
        self.aspect_ratio = Some(ratio);
        self
    }

    /// Build the editor.
    pub fn build(self) -> MaskeditResult<GeminiEditor> {
        let api_key = self
            .api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| MaskeditError::validation("gemini api key is required"))?;
        Ok(GeminiEditor {
            client: reqwest::Client::new(),
            api_key,
            model: self.model,
            system_instruction: self.system_instruction,
            aspect_ratio: self.aspect_ratio,
            base_url: GEMINI_BASE_URL.to_string(),
        })
    }
}

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini-backed [`EditProvider`].
pub struct GeminiEditor {
    client: reqwest::Client,
    api_key: String,
    model: GeminiModel,
    system_instruction: Option<String>,
    aspect_ratio: Option<AspectRatioHint>,
    base_url: String,
}

impl GeminiEditor {
    /// Create a [`GeminiEditorBuilder`].
    pub fn builder() -> GeminiEditorBuilder {
        GeminiEditorBuilder::new()
    }

    /// Override the API base URL (tests point this at a local server).
    #[doc(hidden)]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Cheap reachability/authentication probe against the model endpoint.
    pub async fn health_check(&self) -> MaskeditResult<()> {
        let url = format!("{}/models/{}", self.base_url, self.model.as_str());
        let response = self
            .client
            .get(&url)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await?;
        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &text));
        }
        Ok(())
    }

    async fn edit_impl(&self, request: &EditRequest) -> MaskeditResult<EditedImage> {
        let start = Instant::now();
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url,
            self.model.as_str(),
        );

        let body = self.wire_request(request);
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
            let text = response.text().await.unwrap_or_default();
            return Err(classify_status(status.as_u16(), &text));
        }

        let wire: GeminiResponse = response
            .json()
            .await
            .map_err(|e| MaskeditError::model(format!("malformed model response: {e}")))?;

        let candidate = wire
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| MaskeditError::model("model returned no candidates"))?;

        let parts = candidate
            .content
            .map(|c| c.parts)
            .unwrap_or_default();

        // The model answers with a textual explanation instead of an image
        // when it declines the edit; surface that text verbatim.
        let mut explanation = None;
        for part in &parts {
            if let Some(text) = &part.text {
                explanation.get_or_insert_with(|| text.clone());
            }
        }

        let inline = parts.into_iter().find_map(|p| p.inline_data);
        let Some(inline) = inline else {
            let msg =
                explanation.unwrap_or_else(|| "model returned no image payload".to_string());
            return Err(MaskeditError::model(msg));
        };

        let bytes = base64::engine::general_purpose::STANDARD
            .decode(&inline.data)
            .map_err(|e| MaskeditError::model(format!("invalid base64 image payload: {e}")))?;

        debug!(
            model = self.model.as_str(),
            duration_ms = start.elapsed().as_millis() as u64,
            bytes = bytes.len(),
            "gemini edit completed"
        );

        Ok(EditedImage {
            bytes,
            mime_type: inline.mime_type,
        })
    }

    fn wire_request(&self, request: &EditRequest) -> GeminiRequest {
        let prompt = match &self.system_instruction {
            Some(instruction) => format!("{instruction}\n\nUser Request: {}", request.prompt()),
            None => request.prompt().to_string(),
        };

        GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![
                    GeminiRequestPart::InlineData {
                        inline_data: GeminiInlineData {
                            mime_type: request.mime_type().to_string(),
                            data: base64::engine::general_purpose::STANDARD
                                .encode(request.image()),
                        },
                    },
                    GeminiRequestPart::Text { text: prompt },
                ],
            }],
            generation_config: GeminiGenerationConfig {
                response_modalities: vec!["IMAGE".to_string()],
                image_config: self.aspect_ratio.map(|r| GeminiImageConfig {
                    aspect_ratio: r.as_str().to_string(),
                }),
            },
        }
    }
}

#[async_trait]
impl EditProvider for GeminiEditor {
    async fn edit(&self, request: &EditRequest) -> MaskeditResult<EditedImage> {
        self.edit_impl(request).await
    }

    fn name(&self) -> &str {
        "Gemini (Google)"
    }
}

fn classify_status(status: u16, text: &str) -> MaskeditError {
    let lower = text.to_lowercase();
    if status == 429 || status == 402 || lower.contains("resource_exhausted") || lower.contains("quota")
    {
        let msg = if text.is_empty() { "rate limited" } else { text };
        return MaskeditError::quota(msg);
    }
    if status == 401 || status == 403 {
        return MaskeditError::model(format!("authentication failed: {text}"));
    }
    MaskeditError::model(format!("HTTP {status}: {text}"))
}

// Wire types.

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiRequestPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiRequestPart {
    Text { text: String },
    InlineData { inline_data: GeminiInlineData },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    response_modalities: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_config: Option<GeminiImageConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiImageConfig {
    aspect_ratio: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponsePart {
    text: Option<String>,
    inline_data: Option<GeminiInlineData>,
}
