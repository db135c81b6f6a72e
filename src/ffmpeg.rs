//! Adapter around the external ffmpeg/ffprobe tools.
//!
//! All media work happens here: probing the source duration, extracting mono
//! 16 kHz WAV audio, and splitting long sources into fixed-duration segments in a
//! single ffmpeg pass. A tool failure at this stage is fatal to the whole run —
//! without source audio there is nothing to transcribe.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use tracing::debug;

use crate::chunk::Chunk;
use crate::error::{Error, Result};
use crate::planner::ChunkPlan;

/// Verify that ffmpeg and ffprobe are resolvable on PATH.
///
/// Called before any work begins so a missing install surfaces as a clear
/// startup error instead of a mid-run spawn failure.
pub fn check_tools() -> Result<()> {
    for tool in ["ffmpeg", "ffprobe"] {
        which::which(tool).map_err(|_| Error::MissingTool(tool))?;
    }
    Ok(())
}

/// Probe the duration of a media file in seconds.
pub fn probe_duration(path: &Path) -> Result<f64> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .output()?;
    check_status("ffprobe", &output)?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let raw = stdout.trim();
    raw.parse::<f64>()
        .map_err(|_| Error::msg(format!("ffprobe returned a non-numeric duration: '{raw}'")))
}

/// Produce the ordered chunk list for a planned source.
///
/// Single-chunk plans extract the whole file as one WAV; anything else is split
/// in one ffmpeg pass. Chunk `index` always follows the sorted segment names, so
/// it matches chronological order regardless of directory iteration order.
pub fn segment(source: &Path, plan: &ChunkPlan, work_dir: &Path) -> Result<Vec<Chunk>> {
    if !plan.needs_split() {
        let stem = source
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio".to_string());
        let out_wav = work_dir.join(format!("{stem}.wav"));
        extract_wav(source, &out_wav)?;
        return Ok(vec![Chunk {
            index: 0,
            path: out_wav,
            total: 1,
        }]);
    }

    let chunks_dir = work_dir.join("chunks");
    let paths = extract_and_segment(source, &chunks_dir, plan.chunk_seconds)?;
    if paths.is_empty() {
        return Err(Error::msg(format!(
            "ffmpeg produced no segments in {}",
            chunks_dir.display()
        )));
    }

    let total = paths.len();
    Ok(paths
        .into_iter()
        .enumerate()
        .map(|(index, path)| Chunk { index, path, total })
        .collect())
}

/// Extract the full audio track as mono 16 kHz PCM WAV.
fn extract_wav(input: &Path, out_wav: &Path) -> Result<()> {
    debug!(input = %input.display(), out = %out_wav.display(), "extracting audio");
    let output = Command::new("ffmpeg")
        .args(["-y", "-i"])
        .arg(input)
        .args(["-vn", "-acodec", "pcm_s16le", "-ar", "16000", "-ac", "1"])
        .arg(out_wav)
        .stdin(Stdio::null())
        .output()?;
    check_status("ffmpeg", &output)
}

/// Extract and split in one pass, producing contiguous fixed-duration segments.
///
/// Segments are named `chunk_%03d.wav`, so a lexical sort of the produced names
/// recovers chronological order (the last segment may be shorter).
fn extract_and_segment(input: &Path, out_dir: &Path, segment_seconds: u64) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir)?;
    // A previous run with a smaller chunk size may have left higher-index
    // segments behind; ffmpeg only overwrites the files it regenerates, so the
    // sweep below would pick the stale ones up as chunks of this run.
    clear_stale_segments(out_dir)?;
    let pattern = out_dir.join("chunk_%03d.wav");

    debug!(
        input = %input.display(),
        out_dir = %out_dir.display(),
        segment_seconds,
        "segmenting audio"
    );
    let output = Command::new("ffmpeg")
        .args(["-y", "-i"])
        .arg(input)
        .args(["-vn", "-acodec", "pcm_s16le", "-ar", "16000", "-ac", "1"])
        .args(["-f", "segment", "-segment_time"])
        .arg(segment_seconds.to_string())
        .args(["-reset_timestamps", "1"])
        .arg(&pattern)
        .stdin(Stdio::null())
        .output()?;
    check_status("ffmpeg", &output)?;

    sorted_segment_paths(out_dir)
}

/// Delete leftover `chunk_*.wav` files from an earlier run.
fn clear_stale_segments(dir: &Path) -> Result<()> {
    for path in sorted_segment_paths(dir)? {
        fs::remove_file(path)?;
    }
    Ok(())
}

/// List `chunk_*.wav` files in `dir`, sorted by file name.
fn sorted_segment_paths(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .collect::<std::io::Result<Vec<_>>>()?
        .into_iter()
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with("chunk_") && name.ends_with(".wav"))
        })
        .collect();
    paths.sort();
    Ok(paths)
}

fn check_status(tool: &'static str, output: &Output) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }
    Err(Error::Tool {
        tool,
        status: output
            .status
            .code()
            .map(|code| code.to_string())
            .unwrap_or_else(|| "terminated by signal".to_string()),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    })
}
