//! Per-chunk retry and model-fallback policy.
//!
//! This is the correctness-bearing core of a run: every chunk resolves to
//! exactly one [`ChunkResult`], success or not, and a chunk exhausting its
//! attempts never aborts the chunks that already succeeded or are in flight.

use std::thread;
use std::time::Duration;

use tracing::warn;

use crate::chunk::{Chunk, ChunkResult};
use crate::client::TranscriptionClient;
use crate::error::Result;

/// Bounded-retry configuration for a single chunk.
///
/// An explicit value passed around (and inspected by tests) rather than
/// behavior baked into the client.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Attempts made with the primary model before giving up on it.
    pub max_retries: u32,

    /// Delay before the second attempt; doubles on each subsequent failure.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Resolve one chunk to its final result.
    ///
    /// 1. Up to `max_retries` attempts with `primary_model`, exponential
    ///    backoff between failures (no sleep after the last one).
    /// 2. If all primary attempts failed and the fallback is a different
    ///    model, one single-shot attempt with `fallback_model`.
    /// 3. Any remaining failure is captured into the result, never raised.
    pub fn resolve(
        &self,
        client: &dyn TranscriptionClient,
        chunk: &Chunk,
        primary_model: &str,
        fallback_model: &str,
        language: &str,
    ) -> ChunkResult {
        let primary_err = match self.attempt_with_retries(client, chunk, primary_model, language) {
            Ok(text) => return ChunkResult::ok(chunk, text, false),
            Err(err) => err,
        };

        // Retrying the same model once more as a "fallback" would be pointless.
        if primary_model == fallback_model {
            return ChunkResult::failed(chunk, primary_err);
        }

        warn!(
            chunk = %chunk.label(),
            primary_model,
            fallback_model,
            error = %primary_err,
            "primary model exhausted, trying fallback"
        );
        match client.transcribe(&chunk.path, fallback_model, language) {
            Ok(text) => ChunkResult::ok(chunk, text, true),
            Err(fallback_err) => ChunkResult::failed(chunk, fallback_err),
        }
    }

    fn attempt_with_retries(
        &self,
        client: &dyn TranscriptionClient,
        chunk: &Chunk,
        model: &str,
        language: &str,
    ) -> Result<String> {
        let max_retries = self.max_retries.max(1);
        let mut attempt = 0;
        loop {
            match client.transcribe(&chunk.path, model, language) {
                Ok(text) => return Ok(text),
                Err(err) if attempt + 1 >= max_retries => return Err(err),
                Err(err) => {
                    let delay = self.backoff_delay(attempt);
                    warn!(
                        chunk = %chunk.label(),
                        model,
                        attempt = attempt + 1,
                        max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "transcription attempt failed, backing off"
                    );
                    thread::sleep(delay);
                    attempt += 1;
                }
            }
        }
    }

    /// `base_delay * 2^attempt`, saturating on overflow.
    fn backoff_delay(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(1u32.checked_shl(attempt).unwrap_or(u32::MAX))
    }
}
