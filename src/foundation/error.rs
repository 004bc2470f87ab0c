/// Convenience result type used across panothumb.
pub type PanoResult<T> = Result<T, PanoError>;

/// Top-level error taxonomy used by pipeline APIs.
///
/// Every error is local to a single invocation. Nothing here is retried automatically.
#[derive(thiserror::Error, Debug)]
pub enum PanoError {
    /// The source server answered with a non-success HTTP status.
    #[error("fetch failed: HTTP {0}")]
    FetchFailed(u16),

    /// The request for the source image could not be completed.
    #[error("transport error: {0}")]
    Transport(String),

    /// Source bytes could not be interpreted as an image.
    #[error("decode error: {0}")]
    Decode(String),

    /// The resampled buffer could not be compressed to the output format.
    #[error("encode error: {0}")]
    Encode(String),

    /// Invalid configuration or buffer geometry.
    #[error("validation error: {0}")]
    Validation(String),

    /// The per-pixel workers could not be scheduled or completed.
    #[error("render error: {0}")]
    Render(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PanoError {
    /// Build a [`PanoError::Transport`] value.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Build a [`PanoError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`PanoError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`PanoError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`PanoError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Whether the failure stems from the source asset.
    ///
    /// Callers substitute a fallback image for these. Everything else is a server-side failure.
    pub fn is_client_facing(&self) -> bool {
        matches!(
            self,
            Self::FetchFailed(_) | Self::Transport(_) | Self::Decode(_)
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
