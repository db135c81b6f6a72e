//! Duration-aware chunk-size selection.
//!
//! The planner decides whether a source needs splitting at all and, when it does,
//! balances two pressures: too many chunks multiplies per-request overhead, while
//! overly small chunks give the speech service too little context. The result is a
//! chunk count bounded by [`MAX_CHUNKS`] with a hard floor of [`MIN_CHUNK_SECONDS`]
//! per chunk.

use crate::error::{Error, Result};

/// Sources at or below this duration are transcribed as a single chunk.
pub const SINGLE_CHUNK_THRESHOLD_SECONDS: f64 = 900.0;

/// Floor for the chunk duration when splitting (5 minutes).
pub const MIN_CHUNK_SECONDS: u64 = 300;

/// Upper bound on the number of chunks produced for one source.
pub const MAX_CHUNKS: u64 = 10;

/// The splitting decision for one source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkPlan {
    /// Probed duration of the source, in seconds.
    pub duration_seconds: f64,

    /// Target duration of each segment, in whole seconds.
    pub chunk_seconds: u64,
}

impl ChunkPlan {
    /// Whether the source must be split into multiple segments.
    ///
    /// When false the plan degenerates to a single chunk covering the whole file.
    pub fn needs_split(&self) -> bool {
        self.duration_seconds > self.chunk_seconds as f64
    }

    /// Number of chunks this plan implies (the last one may be shorter).
    pub fn expected_chunks(&self) -> usize {
        if !self.needs_split() {
            return 1;
        }
        (self.duration_seconds / self.chunk_seconds as f64).ceil() as usize
    }
}

/// Compute the chunk plan for a probed duration.
///
/// Pure: no side effects, and the only failure mode is a non-positive duration,
/// which is a precondition violation (fatal to the run).
pub fn plan(duration_seconds: f64) -> Result<ChunkPlan> {
    if !duration_seconds.is_finite() || duration_seconds <= 0.0 {
        return Err(Error::msg(format!(
            "cannot plan chunks for non-positive duration: {duration_seconds}"
        )));
    }

    let chunk_seconds = if duration_seconds <= SINGLE_CHUNK_THRESHOLD_SECONDS {
        // Short input: one chunk spanning the whole file. Round up so a
        // fractional duration still satisfies `chunk_seconds >= duration`.
        duration_seconds.ceil() as u64
    } else {
        MIN_CHUNK_SECONDS.max((duration_seconds / MAX_CHUNKS as f64) as u64)
    };

    Ok(ChunkPlan {
        duration_seconds,
        chunk_seconds,
    })
}

/// Apply an operator-supplied chunk-duration override to a computed plan.
///
/// The planner's choice wins unless the operator explicitly asked for a size.
pub fn with_override(plan: ChunkPlan, chunk_seconds_override: Option<u64>) -> Result<ChunkPlan> {
    match chunk_seconds_override {
        None => Ok(plan),
        Some(0) => Err(Error::msg("chunk duration override must be positive")),
        Some(chunk_seconds) => Ok(ChunkPlan {
            chunk_seconds,
            ..plan
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_input_is_a_single_chunk() -> anyhow::Result<()> {
        for duration in [1.0, 600.0, 900.0] {
            let plan = plan(duration)?;
            assert_eq!(plan.chunk_seconds, duration as u64);
            assert!(!plan.needs_split(), "duration {duration} should not split");
            assert_eq!(plan.expected_chunks(), 1);
        }
        Ok(())
    }

    #[test]
    fn fractional_short_duration_stays_single_chunk() -> anyhow::Result<()> {
        // Probed durations are rarely whole seconds; rounding up keeps the
        // single-chunk guarantee for anything at or under the threshold.
        for duration in [0.4, 599.5, 899.99] {
            let plan = plan(duration)?;
            assert!(
                !plan.needs_split(),
                "duration {duration} should not split (chunk_seconds={})",
                plan.chunk_seconds
            );
            assert_eq!(plan.expected_chunks(), 1);
            assert!(plan.chunk_seconds as f64 >= duration);
        }
        assert_eq!(plan(599.5)?.chunk_seconds, 600);
        Ok(())
    }

    #[test]
    fn long_input_splits_with_minimum_floor() -> anyhow::Result<()> {
        // 2400s / 10 = 240 < 300, so the floor applies: 8 chunks of 300s.
        let plan_40min = plan(2400.0)?;
        assert_eq!(plan_40min.chunk_seconds, 300);
        assert!(plan_40min.needs_split());
        assert_eq!(plan_40min.expected_chunks(), 8);

        // 2 hours: 7200 / 10 = 720 > 300, so the division wins.
        let plan_2h = plan(7200.0)?;
        assert_eq!(plan_2h.chunk_seconds, 720);
        assert_eq!(plan_2h.expected_chunks(), 10);
        Ok(())
    }

    #[test]
    fn just_over_threshold_still_splits() -> anyhow::Result<()> {
        let plan = plan(901.0)?;
        assert_eq!(plan.chunk_seconds, MIN_CHUNK_SECONDS);
        assert!(plan.needs_split());
        Ok(())
    }

    #[test]
    fn non_positive_duration_is_rejected() {
        assert!(plan(0.0).is_err());
        assert!(plan(-10.0).is_err());
        assert!(plan(f64::NAN).is_err());
    }

    #[test]
    fn override_replaces_chunk_seconds() -> anyhow::Result<()> {
        let base = plan(2400.0)?;
        let overridden = with_override(base, Some(600))?;
        assert_eq!(overridden.chunk_seconds, 600);
        assert_eq!(overridden.expected_chunks(), 4);

        assert_eq!(with_override(base, None)?, base);
        assert!(with_override(base, Some(0)).is_err());
        Ok(())
    }
}
