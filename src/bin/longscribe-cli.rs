// CLI for transcribing long audio/video files with chunked speech-to-text.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use longscribe::opts::{DEFAULT_MAX_WORKERS, DEFAULT_PRIMARY_MODEL, FALLBACK_MODEL, Opts};
use longscribe::pipeline::{Pipeline, artifact_paths};
use longscribe::retry::RetryPolicy;

#[derive(Parser, Debug)]
#[command(name = "longscribe")]
#[command(about = "Transcribe long audio/video files with chunked speech-to-text", long_about = None)]
struct Args {
    /// Path to the input video/audio file (mp4, mov, m4a, wav, mp3, ...).
    #[arg(short = 'i', long = "input")]
    input: PathBuf,

    /// Output directory for the transcript and metadata artifacts.
    #[arg(short = 'o', long = "out-dir", default_value = "transcripts")]
    out_dir: PathBuf,

    /// Primary transcription model. The fallback model is always whisper-1.
    #[arg(short = 'm', long = "model", default_value = DEFAULT_PRIMARY_MODEL)]
    model: String,

    /// Override the planner's chunk duration, in seconds.
    #[arg(long = "chunk-seconds")]
    chunk_seconds: Option<u64>,

    /// Maximum number of chunks transcribing in parallel.
    #[arg(short = 'w', long = "max-workers", default_value_t = DEFAULT_MAX_WORKERS)]
    max_workers: usize,

    /// Language hint passed to the speech service.
    #[arg(long = "language", default_value = "es")]
    language: String,

    /// Cache probed durations on disk under the output directory.
    #[arg(long = "use-cache", default_value_t = false)]
    use_cache: bool,
}

fn main() -> Result<()> {
    longscribe::logging::init();
    let args = Args::parse();

    let api_key = load_api_key()
        .context("OPENAI_API_KEY is not set (export it or put it in a local .env file)")?;

    let opts = Opts {
        primary_model: args.model.clone(),
        fallback_model: FALLBACK_MODEL.to_string(),
        language: args.language.clone(),
        max_workers: args.max_workers,
        chunk_seconds_override: args.chunk_seconds,
        use_cache: args.use_cache,
        retry: RetryPolicy::default(),
    };

    let pipeline = Pipeline::new(api_key, opts)?;

    println!(
        "Transcribing {} with '{}'...",
        args.input.display(),
        args.model
    );

    // Created lazily because the chunk count is only known once planning and
    // segmentation have run.
    let mut bar: Option<ProgressBar> = None;
    let report = pipeline.run(&args.input, &args.out_dir, |result, total| {
        let bar = bar.get_or_insert_with(|| chunk_bar(total as u64));
        if result.used_fallback_model {
            bar.println(format!(
                "⚠️  used fallback '{FALLBACK_MODEL}' for {}",
                result.label
            ));
        }
        if let Some(error) = &result.error {
            bar.println(format!("❌ {} failed: {error}", result.label));
        }
        bar.inc(1);
    })?;
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    let metrics = report.metadata.performance_metrics;
    let artifacts = artifact_paths(&args.input, &args.out_dir);
    println!("✅ transcription complete");
    println!(
        "📊 {}/{} chunks successful",
        report.successful_chunks(),
        report.total_chunks()
    );
    println!("   • extraction:    {:.2}s", metrics.extraction_time);
    println!("   • transcription: {:.2}s", metrics.transcription_time);
    println!("   • avg per chunk: {:.2}s", metrics.avg_chunk_time);
    println!("📁 transcript: {}", artifacts.transcript_path.display());
    println!("📁 metadata:   {}", artifacts.metadata_path.display());

    Ok(())
}

fn chunk_bar(total: u64) -> ProgressBar {
    let bar = ProgressBar::new(total);
    bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} {pos}/{len} chunks {bar:40.cyan/blue} {eta}",
        )
        .unwrap()
        .progress_chars("#>-"),
    );
    bar
}

/// Resolve the service API key: process environment first, then a local `.env`.
fn load_api_key() -> Option<String> {
    if let Ok(key) = std::env::var("OPENAI_API_KEY") {
        if !key.trim().is_empty() {
            return Some(key);
        }
    }
    api_key_from_dotenv(Path::new(".env"))
}

fn api_key_from_dotenv(path: &Path) -> Option<String> {
    let raw = fs::read_to_string(path).ok()?;
    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(value) = line.strip_prefix("OPENAI_API_KEY=") {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}
