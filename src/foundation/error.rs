/// Convenience result type used across maskedit.
pub type MaskeditResult<T> = Result<T, MaskeditError>;

/// Top-level error taxonomy used by pipeline APIs.
#[derive(thiserror::Error, Debug)]
pub enum MaskeditError {
    /// Invalid caller-provided data (empty prompt, bad dimensions, ...).
    #[error("validation error: {0}")]
    Validation(String),

    /// An input image (original, edited, or mask) could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// The external image model failed or returned no image payload.
    #[error("model error: {0}")]
    Model(String),

    /// The external image model refused the call for quota reasons.
    ///
    /// Distinct from [`MaskeditError::Model`] so callers can prompt for a
    /// new key or back off instead of showing a generic failure.
    #[error("quota exhausted: {0}")]
    Quota(String),

    /// Transport-level failure talking to the external image model.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MaskeditError {
    /// Build a [`MaskeditError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`MaskeditError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`MaskeditError::Model`] value.
    pub fn model(msg: impl Into<String>) -> Self {
        Self::Model(msg.into())
    }

    /// Build a [`MaskeditError::Quota`] value.
    pub fn quota(msg: impl Into<String>) -> Self {
        Self::Quota(msg.into())
    }

    /// True when the failure is quota exhaustion on the model side.
    pub fn is_quota(&self) -> bool {
        matches!(self, Self::Quota(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
