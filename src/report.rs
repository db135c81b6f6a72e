//! The structured metadata artifact and run timing helpers.

use std::fs;
use std::path::Path;
use std::time::Instant;

use serde::Serialize;

use crate::chunk::ChunkResult;
use crate::error::Result;

/// Aggregate wall-clock metrics for one run.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct PerfMetrics {
    /// Seconds spent extracting/segmenting audio.
    pub extraction_time: f64,

    /// Seconds from first dispatch to last completion.
    pub transcription_time: f64,

    /// `transcription_time / total_chunks`.
    pub avg_chunk_time: f64,

    /// Number of duration probes skipped thanks to the cache.
    pub cache_hits: u32,
}

#[derive(Debug, Serialize)]
pub struct RunMetadata {
    pub input_file: String,
    pub model_used: String,

    /// Count of chunks that transcribed successfully.
    pub chunks_processed: usize,

    pub total_chunks: usize,
    pub performance_metrics: PerfMetrics,
}

/// The full metadata record written alongside the transcript: run-level
/// metadata plus every per-chunk outcome.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub metadata: RunMetadata,
    pub transcriptions: Vec<ChunkResult>,
}

impl RunReport {
    /// Build the report from results in any order.
    ///
    /// Results are sorted by chunk index before serialization, so re-assembling
    /// the same result set always produces byte-identical output (timing fields
    /// aside).
    pub fn new(
        input: &Path,
        model_requested: &str,
        mut results: Vec<ChunkResult>,
        metrics: PerfMetrics,
    ) -> Self {
        results.sort_by_key(|result| result.index);
        let successful = results.iter().filter(|result| result.success).count();

        Self {
            metadata: RunMetadata {
                input_file: input.display().to_string(),
                model_used: model_requested.to_string(),
                chunks_processed: successful,
                total_chunks: results.len(),
                performance_metrics: metrics,
            },
            transcriptions: results,
        }
    }

    pub fn successful_chunks(&self) -> usize {
        self.metadata.chunks_processed
    }

    pub fn total_chunks(&self) -> usize {
        self.metadata.total_chunks
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Serialize the report to `path` (written once, at run end).
    pub fn write_to(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json_string()?)?;
        Ok(())
    }
}

/// Explicit wall-clock measurement for a phase of the run.
///
/// A value you start and read, composed at call sites, instead of timing baked
/// into the operations themselves.
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    started: Instant,
}

impl Stopwatch {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn result(index: usize, success: bool) -> ChunkResult {
        ChunkResult {
            index,
            label: format!("chunk_{index:03}.wav"),
            text: success.then(|| format!("texto {index}")),
            error: (!success).then(|| "fallo".to_string()),
            success,
            used_fallback_model: false,
        }
    }

    #[test]
    fn report_sorts_results_and_counts_successes() {
        let results = vec![result(2, true), result(0, true), result(1, false)];
        let report = RunReport::new(
            &PathBuf::from("/media/charla.mp4"),
            "gpt-4o-mini-transcribe",
            results,
            PerfMetrics::default(),
        );

        assert_eq!(report.total_chunks(), 3);
        assert_eq!(report.successful_chunks(), 2);
        let indices: Vec<usize> = report.transcriptions.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn serialization_is_deterministic_for_the_same_result_set() -> anyhow::Result<()> {
        let metrics = PerfMetrics {
            extraction_time: 1.5,
            transcription_time: 12.0,
            avg_chunk_time: 4.0,
            cache_hits: 1,
        };

        // Same results, different completion orders.
        let a = RunReport::new(
            &PathBuf::from("/in.mp4"),
            "whisper-1",
            vec![result(1, true), result(0, true), result(2, false)],
            metrics,
        );
        let b = RunReport::new(
            &PathBuf::from("/in.mp4"),
            "whisper-1",
            vec![result(2, false), result(1, true), result(0, true)],
            metrics,
        );

        assert_eq!(a.to_json_string()?, b.to_json_string()?);
        Ok(())
    }

    #[test]
    fn json_uses_the_expected_artifact_keys() -> anyhow::Result<()> {
        let report = RunReport::new(
            &PathBuf::from("/in.mp4"),
            "whisper-1",
            vec![result(0, true)],
            PerfMetrics::default(),
        );
        let value: serde_json::Value = serde_json::from_str(&report.to_json_string()?)?;

        assert_eq!(value["metadata"]["input_file"], "/in.mp4");
        assert_eq!(value["metadata"]["model_used"], "whisper-1");
        assert_eq!(value["metadata"]["total_chunks"], 1);
        assert!(value["metadata"]["performance_metrics"]["extraction_time"].is_number());
        assert!(value["transcriptions"].is_array());
        Ok(())
    }
}
