use std::path::PathBuf;

use serde::Serialize;

/// One contiguous audio segment of the source media.
///
/// Chunks are created by the segmenter, consumed read-only by the transcription
/// client, and never mutated. `index` defines the canonical ordering; chunks
/// partition the source contiguously and without overlap.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// 0-based position within the run.
    pub index: usize,

    /// Path to the extracted WAV for this chunk.
    pub path: PathBuf,

    /// Total number of chunks in this run.
    pub total: usize,
}

impl Chunk {
    /// Display name used in transcript labels and the metadata artifact.
    pub fn label(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// The outcome of transcribing a single chunk.
///
/// Produced exactly once per chunk by the retry policy and immutable thereafter.
/// Exactly one of `text`/`error` is populated, matching `success`.
#[derive(Debug, Clone, Serialize)]
pub struct ChunkResult {
    /// Ties back to `Chunk::index`.
    pub index: usize,

    /// Display name of the chunk file.
    #[serde(rename = "chunk")]
    pub label: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub success: bool,

    #[serde(rename = "fallback", skip_serializing_if = "std::ops::Not::not")]
    pub used_fallback_model: bool,
}

impl ChunkResult {
    /// A successful transcription of `chunk`.
    pub fn ok(chunk: &Chunk, text: String, used_fallback_model: bool) -> Self {
        Self {
            index: chunk.index,
            label: chunk.label(),
            text: Some(text),
            error: None,
            success: true,
            used_fallback_model,
        }
    }

    /// A chunk whose transcription attempts were exhausted.
    pub fn failed(chunk: &Chunk, error: impl ToString) -> Self {
        Self {
            index: chunk.index,
            label: chunk.label(),
            text: None,
            error: Some(error.to_string()),
            success: false,
            used_fallback_model: false,
        }
    }
}
