//! `longscribe` — chunked transcription of long audio/video files.
//!
//! This crate converts a long recording into a single ordered transcript by:
//! - probing the source with ffprobe and picking a duration-appropriate chunk size
//! - extracting and splitting the audio in one ffmpeg pass
//! - transcribing chunks in parallel against a speech-to-text service, with
//!   bounded retries and a fallback model per chunk
//! - reassembling out-of-order completions into an ordered transcript plus a
//!   structured metadata record
//!
//! The library is designed to be driven by the CLI binary, but every stage is
//! usable on its own: tests (and other frontends) swap the service client
//! through the `TranscriptionClient` seam.

// High-level API (most consumers should start here).
pub mod opts;
pub mod pipeline;

// Core orchestration: planning, fan-out, retry, reassembly.
pub mod assembler;
pub mod dispatcher;
pub mod planner;
pub mod retry;

// Data model shared across stages.
pub mod chunk;
pub mod report;

// External collaborators: media tooling and the speech service.
pub mod client;
pub mod ffmpeg;

// Optional on-disk duration cache.
pub mod cache;

// Logging configuration and control.
#[cfg(feature = "logging")]
pub mod logging;

mod error;

pub use error::{Error, Result};
