//! High-level API for running a full transcription.
//!
//! We expose a single ergonomic entry point (`Pipeline`) that wires up
//! probe → plan → segment → parallel dispatch → ordered assembly → report.
//!
//! The intent is:
//! - We construct the service client once (startup is where configuration and
//!   credentials are validated).
//! - Callers choose models, language, workers, and caching via `Opts`.
//! - Per-chunk failures degrade the run; only setup and extraction failures
//!   abort it.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::assembler::TranscriptAssembler;
use crate::cache::DurationCache;
use crate::chunk::{Chunk, ChunkResult};
use crate::client::{OpenAiClient, TranscriptionClient};
use crate::dispatcher::Dispatcher;
use crate::error::{Error, Result};
use crate::ffmpeg;
use crate::opts::Opts;
use crate::planner;
use crate::report::{PerfMetrics, RunReport, Stopwatch};

/// The transcript and metadata files produced for one input.
#[derive(Debug, Clone)]
pub struct Artifacts {
    pub transcript_path: PathBuf,
    pub metadata_path: PathBuf,
}

/// Compute the artifact paths for an input inside an output directory.
pub fn artifact_paths(input: &Path, out_dir: &Path) -> Artifacts {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "transcript".to_string());
    Artifacts {
        transcript_path: out_dir.join(format!("{stem}_transcript.txt")),
        metadata_path: out_dir.join(format!("{stem}_transcript.json")),
    }
}

/// The main high-level transcription entry point.
///
/// `Pipeline` owns the long-lived pieces of a run: the speech-service client
/// (shared read-only across workers) and the run options. Construct once, then
/// call [`Pipeline::run`] per input file.
pub struct Pipeline<C: TranscriptionClient = OpenAiClient> {
    client: C,
    opts: Opts,
}

impl Pipeline<OpenAiClient> {
    /// Create a pipeline backed by the hosted OpenAI service.
    ///
    /// We fail fast if ffmpeg/ffprobe are missing so the invariant is simple:
    /// once `Pipeline::new` succeeds, media extraction is available.
    pub fn new(api_key: impl Into<String>, opts: Opts) -> Result<Self> {
        ffmpeg::check_tools()?;
        Ok(Self {
            client: OpenAiClient::new(api_key)?,
            opts,
        })
    }
}

impl<C: TranscriptionClient> Pipeline<C> {
    /// Create a pipeline over a custom client (tests, compatible servers).
    ///
    /// Skips the external-tool check; callers using [`Pipeline::run`] on real
    /// media are expected to have ffmpeg available.
    pub fn with_client(client: C, opts: Opts) -> Self {
        Self { client, opts }
    }

    pub fn opts(&self) -> &Opts {
        &self.opts
    }

    /// Run one complete transcription: probe, plan, segment, transcribe in
    /// parallel, and write both artifacts under `out_dir`.
    ///
    /// `progress` is invoked once per completed chunk (in completion order, on
    /// the calling thread) with the result and the run's chunk total.
    ///
    /// Returns the final report. A run whose chunks partially failed is still
    /// `Ok`; inspect [`RunReport::successful_chunks`] for the outcome.
    pub fn run(
        &self,
        input: &Path,
        out_dir: &Path,
        mut progress: impl FnMut(&ChunkResult, usize),
    ) -> Result<RunReport> {
        if !input.exists() {
            return Err(Error::msg(format!(
                "input file does not exist: {}",
                input.display()
            )));
        }
        // Source identity is the absolute path; the cache key hashes it.
        let input = &input.canonicalize()?;
        ffmpeg::check_tools()?;
        fs::create_dir_all(out_dir)?;

        // Probe (optionally through the cache) and plan.
        let mut cache_hits = 0u32;
        let duration_seconds = if self.opts.use_cache {
            let cache = DurationCache::new(out_dir.join(".cache"));
            match cache.lookup(input) {
                Some(cached) => {
                    cache_hits = 1;
                    cached
                }
                None => {
                    let probed = ffmpeg::probe_duration(input)?;
                    cache.store(input, probed)?;
                    probed
                }
            }
        } else {
            ffmpeg::probe_duration(input)?
        };

        let plan = planner::with_override(
            planner::plan(duration_seconds)?,
            self.opts.chunk_seconds_override,
        )?;
        info!(
            input = %input.display(),
            duration_seconds,
            chunk_seconds = plan.chunk_seconds,
            expected_chunks = plan.expected_chunks(),
            "planned run"
        );

        // Extract and segment. A failure here is fatal: no chunks, no run.
        let extraction = Stopwatch::start();
        let chunks = ffmpeg::segment(input, &plan, out_dir)?;
        let extraction_time = extraction.elapsed_seconds();
        let total = chunks.len();

        let artifacts = artifact_paths(input, out_dir);
        // Truncate up front so a re-run never appends onto stale output.
        let transcript = BufWriter::new(File::create(&artifacts.transcript_path)?);

        let transcription = Stopwatch::start();
        let results = self.transcribe_chunks(chunks, transcript, &mut progress)?;
        let transcription_time = transcription.elapsed_seconds();

        let metrics = PerfMetrics {
            extraction_time,
            transcription_time,
            avg_chunk_time: transcription_time / total as f64,
            cache_hits,
        };
        let report = RunReport::new(input, &self.opts.primary_model, results, metrics);
        report.write_to(&artifacts.metadata_path)?;

        info!(
            successful = report.successful_chunks(),
            total = report.total_chunks(),
            transcript = %artifacts.transcript_path.display(),
            metadata = %artifacts.metadata_path.display(),
            "run complete"
        );
        Ok(report)
    }

    /// Transcribe an already-segmented chunk list, streaming ordered blocks
    /// into `transcript`.
    ///
    /// This is the dispatch + assembly core of [`Pipeline::run`], exposed so
    /// callers that segment their own audio (or tests with synthetic chunks)
    /// can reuse it.
    pub fn transcribe_chunks<W: Write>(
        &self,
        chunks: Vec<Chunk>,
        transcript: W,
        mut progress: impl FnMut(&ChunkResult, usize),
    ) -> Result<Vec<ChunkResult>> {
        let total = chunks.len();
        let mut assembler = TranscriptAssembler::new(transcript, total);

        let dispatcher = Dispatcher::new(self.opts.max_workers);
        let results = dispatcher.run(
            chunks,
            &self.client,
            self.opts.retry,
            &self.opts.primary_model,
            &self.opts.fallback_model,
            &self.opts.language,
            |result| {
                assembler.push(result.clone())?;
                progress(result, total);
                Ok(())
            },
        )?;
        assembler.close()?;

        Ok(results)
    }
}
