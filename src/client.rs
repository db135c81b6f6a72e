//! Speech-to-text service client.
//!
//! One trait, one implementation chosen at startup. Call sites never branch on
//! which client is in use; tests substitute their own [`TranscriptionClient`]
//! through the same seam.

use std::path::Path;
use std::time::Duration;

use tracing::debug;

use crate::error::{Error, Result};

/// Default API root for the hosted OpenAI service.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// A client capable of transcribing one audio chunk.
///
/// Implementations perform a *single* attempt per call: retry and fallback
/// behavior lives entirely in the retry policy. The client is shared read-only
/// across worker threads, so calls must be stateless.
pub trait TranscriptionClient: Send + Sync {
    /// Transcribe the audio at `audio_path` with `(model, language)`.
    ///
    /// Returns the service's text verbatim (not trimmed). Every failure mode —
    /// network, auth, quota, malformed response — folds into
    /// [`Error::Transcription`].
    fn transcribe(&self, audio_path: &Path, model: &str, language: &str) -> Result<String>;
}

/// `TranscriptionClient` backed by the OpenAI audio transcriptions endpoint
/// (or any API-compatible server).
pub struct OpenAiClient {
    http: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Point the client at a non-default API root (self-hosted compatible
    /// servers, test stubs).
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        // Connecting should fail fast; the transfer itself is unbounded because
        // large chunks can legitimately take minutes to transcribe.
        let http = reqwest::blocking::Client::builder()
            .user_agent(concat!("longscribe/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| Error::msg(format!("failed to build HTTP client: {err}")))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }
}

impl TranscriptionClient for OpenAiClient {
    fn transcribe(&self, audio_path: &Path, model: &str, language: &str) -> Result<String> {
        let url = format!("{}/audio/transcriptions", self.base_url);
        debug!(chunk = %audio_path.display(), model, language, "transcription request");

        let form = reqwest::blocking::multipart::Form::new()
            .text("model", model.to_string())
            .text("language", language.to_string())
            .file("file", audio_path)
            .map_err(|err| {
                Error::transcription(format!(
                    "failed to read chunk '{}': {err}",
                    audio_path.display()
                ))
            })?;

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .map_err(|err| Error::transcription(format!("request to {url} failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(Error::transcription(format!("API error {status}: {body}")));
        }

        let json: serde_json::Value = response
            .json()
            .map_err(|err| Error::transcription(format!("malformed response: {err}")))?;
        let text = json
            .get("text")
            .and_then(|value| value.as_str())
            .ok_or_else(|| Error::transcription("response had no 'text' field"))?;

        Ok(text.to_string())
    }
}
