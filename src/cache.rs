//! Opt-in on-disk cache of probed media durations.
//!
//! Probing is cheap but not free, and the same long recording is often
//! re-transcribed while tuning models or chunk sizes. Each cached entry is one
//! small JSON record keyed by the sha256 of the absolute input path, so the
//! format stays inspectable (no opaque binary serialization).

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::Result;

/// One cached probe result.
///
/// The input path is stored alongside the duration so a record is
/// self-describing when inspected by hand.
#[derive(Debug, Serialize, Deserialize)]
struct DurationRecord {
    input_path: String,
    duration_seconds: f64,
}

/// A directory of per-input duration records.
#[derive(Debug, Clone)]
pub struct DurationCache {
    dir: PathBuf,
}

impl DurationCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Look up a previously stored duration for `input`.
    ///
    /// Unreadable or malformed records are treated as misses; the caller will
    /// re-probe and overwrite them.
    pub fn lookup(&self, input: &Path) -> Option<f64> {
        let path = self.record_path(input);
        let raw = fs::read_to_string(&path).ok()?;
        let record: DurationRecord = serde_json::from_str(&raw).ok()?;
        debug!(
            input = %input.display(),
            duration_seconds = record.duration_seconds,
            "duration cache hit"
        );
        Some(record.duration_seconds)
    }

    /// Store a probed duration for `input`, creating the cache dir if needed.
    pub fn store(&self, input: &Path, duration_seconds: f64) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let record = DurationRecord {
            input_path: input.display().to_string(),
            duration_seconds,
        };
        fs::write(self.record_path(input), serde_json::to_string_pretty(&record)?)?;
        Ok(())
    }

    fn record_path(&self, input: &Path) -> PathBuf {
        let digest = Sha256::digest(input.display().to_string().as_bytes());
        self.dir.join(format!("duration_{}.json", hex::encode(digest)))
    }
}
