use std::error::Error as StdError;

use thiserror::Error;

/// Longscribe's crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Longscribe's crate-wide error type.
///
/// This is intentionally decoupled from `anyhow` so downstream libraries aren't forced to
/// adopt `anyhow` in their own public APIs.
///
/// Variants are coarse on purpose: the run loop only distinguishes fatal setup/extraction
/// failures (anything except `Transcription`) from per-chunk transcription failures, which
/// the retry policy captures into a `ChunkResult` instead of propagating.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Message(String),

    /// A required external tool (ffmpeg/ffprobe) is not resolvable on PATH.
    #[error("required tool '{0}' was not found on PATH")]
    MissingTool(&'static str),

    /// An external tool ran but exited unsuccessfully.
    #[error("{tool} failed ({status}): {stderr}")]
    Tool {
        tool: &'static str,
        status: String,
        stderr: String,
    },

    /// A single transcription attempt failed (network, auth, quota, malformed response).
    ///
    /// All service-side failure modes fold into this one kind; the retry policy does not
    /// need to tell them apart.
    #[error("transcription failed: {0}")]
    Transcription(String),

    #[error(transparent)]
    Other(#[from] Box<dyn StdError + Send + Sync>),
}

impl Error {
    pub(crate) fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    pub(crate) fn transcription(message: impl Into<String>) -> Self {
        Self::Transcription(message.into())
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Message(format!("{err:#}"))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Other(Box::new(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Other(Box::new(err))
    }
}
