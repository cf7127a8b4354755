use async_trait::async_trait;

use crate::foundation::error::{MaskeditError, MaskeditResult};

/// A request to edit an image: full-frame source bytes plus a text prompt.
#[derive(Clone, Debug)]
pub struct EditRequest {
    image: Vec<u8>,
    mime_type: String,
    prompt: String,
}

impl EditRequest {
    /// Build a request. The prompt must be non-empty and the image bytes
    /// non-empty; the MIME type is sniffed from the bytes when possible.
    pub fn new(image: Vec<u8>, prompt: impl Into<String>) -> MaskeditResult<Self> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(MaskeditError::validation("prompt must be non-empty"));
        }
        if image.is_empty() {
            return Err(MaskeditError::validation("image bytes must be non-empty"));
        }
        let mime_type = sniff_mime(&image).unwrap_or("image/png").to_string();
        Ok(Self {
            image,
            mime_type,
            prompt,
        })
    }

    /// Override the sniffed MIME type.
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    /// The encoded source image bytes.
    pub fn image(&self) -> &[u8] {
        &self.image
    }

    /// The source image's MIME type.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// The edit instruction.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }
}

/// A full-frame edited image returned by the external model.
#[derive(Clone, Debug)]
pub struct EditedImage {
    /// Encoded image bytes.
    pub bytes: Vec<u8>,
    /// MIME type reported by the model.
    pub mime_type: String,
}

/// The external generative-image model, treated as an opaque function:
/// image and prompt in, full-frame edited image out.
///
/// Retries, backoff, and authentication management are the caller's
/// concern, not part of this contract.
#[async_trait]
pub trait EditProvider: Send + Sync {
    /// Perform one edit call.
    async fn edit(&self, request: &EditRequest) -> MaskeditResult<EditedImage>;

    /// Human-readable provider name for messages and logs.
    fn name(&self) -> &str {
        "external image model"
    }
}

/// Detect an image MIME type from magic bytes.
pub fn sniff_mime(data: &[u8]) -> Option<&'static str> {
    if data.len() < 12 {
        return None;
    }
    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some("image/png");
    }
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("image/jpeg");
    }
    if data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
        return Some("image/webp");
    }
    None
}
