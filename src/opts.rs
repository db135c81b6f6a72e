use crate::retry::RetryPolicy;

/// Default primary transcription model (cost-efficient).
pub const DEFAULT_PRIMARY_MODEL: &str = "gpt-4o-mini-transcribe";

/// Baseline model attempted once when the primary model exhausts its retries.
pub const FALLBACK_MODEL: &str = "whisper-1";

/// Default width of the transcription worker pool.
pub const DEFAULT_MAX_WORKERS: usize = 3;

/// Options that control how a transcription run is performed.
///
/// This struct represents *library-level configuration*, not CLI flags directly.
/// The CLI is responsible for mapping user input into this type so that:
/// - the library remains reusable outside of a CLI context
/// - other frontends (tests, batch jobs) can construct options programmatically
#[derive(Debug, Clone)]
pub struct Opts {
    /// Model requested for every first attempt on a chunk.
    pub primary_model: String,

    /// Model used for the single fallback shot after primary retries exhaust.
    ///
    /// When equal to `primary_model` the fallback step is skipped entirely.
    pub fallback_model: String,

    /// Language hint forwarded to the speech service (e.g. `"es"`, `"en"`).
    pub language: String,

    /// Maximum number of chunks transcribing simultaneously.
    pub max_workers: usize,

    /// Operator override for the planner's chunk duration, in seconds.
    ///
    /// `None` lets the planner pick a duration-appropriate size.
    pub chunk_seconds_override: Option<u64>,

    /// Whether to cache probed durations on disk, keyed by input path.
    pub use_cache: bool,

    /// Per-chunk retry/backoff configuration.
    pub retry: RetryPolicy,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            primary_model: DEFAULT_PRIMARY_MODEL.to_string(),
            fallback_model: FALLBACK_MODEL.to_string(),
            language: "es".to_string(),
            max_workers: DEFAULT_MAX_WORKERS,
            chunk_seconds_override: None,
            use_cache: false,
            retry: RetryPolicy::default(),
        }
    }
}
