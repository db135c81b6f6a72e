//! End-to-end scenarios over the public dispatch/assembly API, using a mock
//! speech client and synthetic chunk lists so no ffmpeg or network is needed.

use std::path::{Path, PathBuf};
use std::time::Duration;

use longscribe::chunk::Chunk;
use longscribe::client::TranscriptionClient;
use longscribe::opts::Opts;
use longscribe::pipeline::Pipeline;
use longscribe::report::{PerfMetrics, RunReport};
use longscribe::retry::RetryPolicy;
use longscribe::{Error, Result};

/// Mock speech service: per-chunk canned text, optional permanent failures,
/// optional primary-model outage (to force the fallback path).
struct MockService {
    /// Chunk labels that fail on every model.
    broken_chunks: Vec<String>,
    /// When set, every call with this model fails (fallback still works).
    broken_model: Option<String>,
}

impl MockService {
    fn healthy() -> Self {
        Self {
            broken_chunks: Vec::new(),
            broken_model: None,
        }
    }
}

impl TranscriptionClient for MockService {
    fn transcribe(&self, audio_path: &Path, model: &str, _language: &str) -> Result<String> {
        let label = audio_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        if self.broken_chunks.contains(&label) {
            return Err(Error::Transcription(format!("service rejected {label}")));
        }
        if self.broken_model.as_deref() == Some(model) {
            return Err(Error::Transcription(format!("model {model} unavailable")));
        }

        Ok(format!("transcript of {label}"))
    }
}

fn chunks(total: usize) -> Vec<Chunk> {
    (0..total)
        .map(|index| Chunk {
            index,
            path: PathBuf::from(format!("chunk_{index:03}.wav")),
            total,
        })
        .collect()
}

fn test_opts() -> Opts {
    Opts {
        retry: RetryPolicy {
            max_retries: 3,
            base_delay: Duration::ZERO,
        },
        ..Opts::default()
    }
}

#[test]
fn single_chunk_run_produces_unlabeled_transcript() -> anyhow::Result<()> {
    let pipeline = Pipeline::with_client(MockService::healthy(), test_opts());
    let mut transcript = Vec::new();

    let results = pipeline.transcribe_chunks(
        vec![Chunk {
            index: 0,
            path: PathBuf::from("keynote.wav"),
            total: 1,
        }],
        &mut transcript,
        |_, _| {},
    )?;

    let text = String::from_utf8(transcript)?;
    assert_eq!(text, "transcript of keynote.wav\n\n");
    assert!(!text.contains("[Chunk"));

    let report = RunReport::new(
        Path::new("/media/keynote.mp4"),
        "gpt-4o-mini-transcribe",
        results,
        PerfMetrics::default(),
    );
    assert_eq!(report.total_chunks(), 1);
    assert_eq!(report.successful_chunks(), 1);
    Ok(())
}

#[test]
fn eight_chunk_run_produces_labeled_blocks_in_order() -> anyhow::Result<()> {
    let pipeline = Pipeline::with_client(MockService::healthy(), test_opts());
    let mut transcript = Vec::new();
    let mut completions = 0usize;

    let results = pipeline.transcribe_chunks(chunks(8), &mut transcript, |_, total| {
        completions += 1;
        assert_eq!(total, 8);
    })?;

    assert_eq!(completions, 8);
    assert_eq!(results.len(), 8);

    let text = String::from_utf8(transcript)?;
    let mut last_position = 0usize;
    for index in 0..8 {
        let label = format!("[Chunk {}/8 - chunk_{index:03}.wav]", index + 1);
        let position = text
            .find(&label)
            .unwrap_or_else(|| panic!("missing block {label} in:\n{text}"));
        assert!(position >= last_position, "block {label} out of order");
        last_position = position;
    }

    let report = RunReport::new(
        Path::new("/media/long.mp4"),
        "gpt-4o-mini-transcribe",
        results,
        PerfMetrics::default(),
    );
    let json: serde_json::Value = serde_json::from_str(&report.to_json_string()?)?;
    let entries = json["transcriptions"].as_array().expect("array");
    assert_eq!(entries.len(), 8);
    let indices: Vec<u64> = entries
        .iter()
        .map(|entry| entry["index"].as_u64().expect("index"))
        .collect();
    assert_eq!(indices, (0..8).collect::<Vec<u64>>());
    Ok(())
}

#[test]
fn one_permanently_failing_chunk_degrades_but_does_not_abort() -> anyhow::Result<()> {
    let service = MockService {
        broken_chunks: vec!["chunk_002.wav".to_string()],
        broken_model: None,
    };
    let pipeline = Pipeline::with_client(service, test_opts());
    let mut transcript = Vec::new();

    // The run itself succeeds; the failure is recorded, not raised.
    let results = pipeline.transcribe_chunks(chunks(5), &mut transcript, |_, _| {})?;

    let report = RunReport::new(
        Path::new("/media/flaky.mp4"),
        "gpt-4o-mini-transcribe",
        results,
        PerfMetrics::default(),
    );
    assert_eq!(report.total_chunks(), 5);
    assert_eq!(report.successful_chunks(), 4);

    let failed = &report.transcriptions[2];
    assert!(!failed.success);
    assert!(failed.text.is_none());
    let error = failed.error.as_deref().expect("error populated");
    assert!(error.contains("chunk_002"), "got: {error}");

    // The failed chunk is absent from the transcript text.
    let text = String::from_utf8(transcript)?;
    assert!(!text.contains("[Chunk 3/5"));
    assert!(text.contains("[Chunk 4/5"));
    Ok(())
}

#[test]
fn primary_model_outage_resolves_through_the_fallback() -> anyhow::Result<()> {
    let service = MockService {
        broken_chunks: Vec::new(),
        broken_model: Some("gpt-4o-mini-transcribe".to_string()),
    };
    let pipeline = Pipeline::with_client(service, test_opts());
    let mut transcript = Vec::new();

    let results = pipeline.transcribe_chunks(chunks(3), &mut transcript, |_, _| {})?;

    assert!(results.iter().all(|result| result.success));
    assert!(results.iter().all(|result| result.used_fallback_model));
    Ok(())
}

#[test]
fn artifacts_round_trip_through_the_filesystem() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let pipeline = Pipeline::with_client(MockService::healthy(), test_opts());

    let transcript_path = dir.path().join("talk_transcript.txt");
    let transcript = std::fs::File::create(&transcript_path)?;
    let results = pipeline.transcribe_chunks(chunks(2), transcript, |_, _| {})?;

    let metadata_path = dir.path().join("talk_transcript.json");
    let report = RunReport::new(
        Path::new("/media/talk.mp4"),
        "gpt-4o-mini-transcribe",
        results,
        PerfMetrics::default(),
    );
    report.write_to(&metadata_path)?;

    let text = std::fs::read_to_string(&transcript_path)?;
    assert!(text.contains("[Chunk 1/2 - chunk_000.wav]"));

    let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&metadata_path)?)?;
    assert_eq!(json["metadata"]["chunks_processed"], 2);
    assert_eq!(json["metadata"]["total_chunks"], 2);
    Ok(())
}
