//! Bounded parallel fan-out of per-chunk transcription work.
//!
//! A fixed pool of worker threads pulls chunks off a shared queue and resolves
//! each one through the retry policy. Completions fan in over a channel and are
//! consumed on the calling thread, so the completion callback is naturally
//! serialized — one result at a time — even when workers finish concurrently.

use std::collections::VecDeque;
use std::sync::{Mutex, mpsc};
use std::thread;

use tracing::debug;

use crate::chunk::{Chunk, ChunkResult};
use crate::client::TranscriptionClient;
use crate::error::Result;
use crate::retry::RetryPolicy;

/// Runs one retry-wrapped transcription task per chunk under a bounded pool.
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher {
    /// Maximum number of chunks transcribing simultaneously.
    pub max_workers: usize,
}

impl Dispatcher {
    pub fn new(max_workers: usize) -> Self {
        Self { max_workers }
    }

    /// Transcribe every chunk, invoking `on_result` as each completes.
    ///
    /// Guarantees:
    /// - at most `max_workers` chunks are in flight at once
    /// - exactly one `ChunkResult` per chunk index, no duplicates or omissions
    /// - a chunk that exhausts its retries never cancels or blocks siblings
    /// - `on_result` runs on the calling thread, one completion at a time
    ///
    /// Completion order is unrelated to chunk index; the returned vector is in
    /// completion order. A callback error (e.g. the output file went away) is
    /// fatal, but in-flight chunks still run to completion before it surfaces.
    pub fn run<F>(
        &self,
        chunks: Vec<Chunk>,
        client: &dyn TranscriptionClient,
        policy: RetryPolicy,
        primary_model: &str,
        fallback_model: &str,
        language: &str,
        mut on_result: F,
    ) -> Result<Vec<ChunkResult>>
    where
        F: FnMut(&ChunkResult) -> Result<()>,
    {
        let total = chunks.len();
        if total == 0 {
            return Ok(Vec::new());
        }

        let workers = self.max_workers.clamp(1, total);
        debug!(total, workers, "dispatching chunks");

        let queue = Mutex::new(VecDeque::from(chunks));
        let (tx, rx) = mpsc::channel::<ChunkResult>();

        thread::scope(|scope| {
            for _ in 0..workers {
                let tx = tx.clone();
                let queue = &queue;
                scope.spawn(move || {
                    loop {
                        let next = match queue.lock() {
                            Ok(mut pending) => pending.pop_front(),
                            // Poisoned queue means a sibling panicked; stop cleanly.
                            Err(_) => break,
                        };
                        let Some(chunk) = next else { break };
                        let result =
                            policy.resolve(client, &chunk, primary_model, fallback_model, language);
                        if tx.send(result).is_err() {
                            break;
                        }
                    }
                });
            }
            // The receive loop ends once every worker has dropped its sender.
            drop(tx);

            let mut results = Vec::with_capacity(total);
            let mut callback_err = None;
            for result in rx {
                if callback_err.is_none() {
                    if let Err(err) = on_result(&result) {
                        callback_err = Some(err);
                    }
                }
                results.push(result);
            }

            match callback_err {
                Some(err) => Err(err),
                None => Ok(results),
            }
        })
    }
}
