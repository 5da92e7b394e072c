//! Integration tests for albummux
//!
//! These validate the conversion pipeline end to end against an injected
//! fake transcoder, without running ffmpeg.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use albummux::config::Settings;
use albummux::pipeline::{convert, ConversionJob};
use albummux::transcode::{TranscodeFailure, TranscodeRequest, Transcoder};
use albummux::AlbummuxError;
use tempfile::tempdir;

/// Records every request. Optionally fails at a given call index, and can
/// leave a partial file at the request's output path before failing.
#[derive(Default)]
struct FakeTranscoder {
    requests: RefCell<Vec<TranscodeRequest>>,
    fail_on_call: Option<usize>,
    write_output_before_failing: bool,
    saw_missing_frame: RefCell<bool>,
}

impl FakeTranscoder {
    fn failing_at(call: usize) -> Self {
        Self {
            fail_on_call: Some(call),
            ..Self::default()
        }
    }

    fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }

    fn request_args(&self, index: usize) -> Vec<String> {
        self.requests.borrow()[index]
            .args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }
}

impl Transcoder for FakeTranscoder {
    fn run(&self, request: &TranscodeRequest) -> Result<(), TranscodeFailure> {
        let call = self.requests.borrow().len();

        // Frame inputs must exist on disk by the time they are encoded.
        for arg in &request.args {
            let path = Path::new(arg);
            if path.extension().is_some_and(|e| e == "png") && !path.exists() {
                *self.saw_missing_frame.borrow_mut() = true;
            }
        }

        self.requests.borrow_mut().push(request.clone());

        if Some(call) == self.fail_on_call {
            if self.write_output_before_failing {
                if let Some(out) = request.args.last() {
                    let _ = fs::write(out, b"partial");
                }
            }
            return Err(TranscodeFailure {
                diagnostic: "fake transcoder failure".to_string(),
            });
        }

        Ok(())
    }
}

/// Three unreadable tracks plus a missing artwork path: the recoverable
/// fallbacks must carry the whole pipeline to completion.
fn junk_album(dir: &Path, track_names: &[&str]) -> ConversionJob {
    let mut tracks = Vec::new();
    for name in track_names {
        let path = dir.join(name);
        fs::write(&path, b"not a real flac").unwrap();
        tracks.push(path);
    }
    ConversionJob {
        tracks,
        artwork: dir.join("missing-cover.jpg"),
        output: dir.join("album.mkv"),
    }
}

fn has_pair(args: &[String], flag: &str, value: &str) -> bool {
    args.windows(2).any(|w| w[0] == flag && w[1] == value)
}

#[test]
fn test_convert_issues_one_encode_per_track_plus_combine() {
    let dir = tempdir().unwrap();
    let job = junk_album(dir.path(), &["a.flac", "b.flac", "c.flac"]);
    let fake = FakeTranscoder::default();

    let report = convert(&job, &fake, &Settings::default(), |_, _| {}).unwrap();

    assert_eq!(fake.request_count(), 4);
    assert!(!*fake.saw_missing_frame.borrow());

    for i in 0..3 {
        let args = fake.request_args(i);
        assert!(has_pair(&args, "-loop", "1"));
        assert!(has_pair(&args, "-c:a", "copy"));
    }

    let combine = fake.request_args(3);
    assert!(has_pair(&combine, "-f", "concat"));
    assert!(has_pair(&combine, "-map_metadata", "1"));
    assert_eq!(
        combine.last().unwrap(),
        &job.output.display().to_string()
    );

    assert_eq!(report.stats.track_count, 3);
    assert_eq!(report.output_path, job.output);
}

#[test]
fn test_chapter_count_matches_tracks_and_entries_are_contiguous() {
    let dir = tempdir().unwrap();
    let job = junk_album(dir.path(), &["a.flac", "b.flac", "c.flac"]);
    let fake = FakeTranscoder::default();

    let report = convert(&job, &fake, &Settings::default(), |_, _| {}).unwrap();

    assert_eq!(report.chapters.len(), 3);
    for pair in report.chapters.windows(2) {
        assert_eq!(pair[0].end_ms, pair[1].start_ms);
    }
}

#[test]
fn test_chapter_titles_use_filename_fallback_and_display_only_numbers() {
    let dir = tempdir().unwrap();
    let job = junk_album(dir.path(), &["c-last.flac", "a-first.flac"]);
    let fake = FakeTranscoder::default();

    let report = convert(&job, &fake, &Settings::default(), |_, _| {}).unwrap();

    // Sequencing follows input order, not tag order; the default track
    // number (1) is display text only.
    assert_eq!(report.chapters[0].title, "01. c-last");
    assert_eq!(report.chapters[1].title, "01. a-first");
}

#[test]
fn test_progress_is_monotonic_and_ends_at_100() {
    let dir = tempdir().unwrap();
    let job = junk_album(dir.path(), &["a.flac", "b.flac", "c.flac"]);
    let fake = FakeTranscoder::default();

    let mut events: Vec<(String, u8)> = Vec::new();
    convert(&job, &fake, &Settings::default(), |status, percent| {
        events.push((status.to_string(), percent));
    })
    .unwrap();

    let percents: Vec<u8> = events.iter().map(|(_, p)| *p).collect();
    assert_eq!(percents, vec![0, 16, 33, 50, 75, 100]);

    assert_eq!(events[0].0, "Processing track 1/3");
    assert_eq!(events[3].0, "Combining segments...");
    assert_eq!(events[4].0, "Creating final container...");
    assert_eq!(events[5].0, "Complete!");

    assert_eq!(
        events.iter().filter(|(_, p)| *p == 100).count(),
        1,
        "exactly one terminal 100"
    );
}

#[test]
fn test_progress_for_single_track() {
    let dir = tempdir().unwrap();
    let job = junk_album(dir.path(), &["only.flac"]);
    let fake = FakeTranscoder::default();

    let mut percents: Vec<u8> = Vec::new();
    convert(&job, &fake, &Settings::default(), |_, p| percents.push(p)).unwrap();

    assert_eq!(percents, vec![0, 50, 75, 100]);
}

#[test]
fn test_encode_failure_aborts_job_with_diagnostic() {
    let dir = tempdir().unwrap();
    let job = junk_album(dir.path(), &["a.flac", "b.flac"]);
    let fake = FakeTranscoder::failing_at(0);

    let mut reached_100 = false;
    let result = convert(&job, &fake, &Settings::default(), |_, p| {
        reached_100 |= p == 100;
    });

    match result {
        Err(AlbummuxError::EncodeFailed(diagnostic)) => {
            assert!(diagnostic.contains("fake transcoder failure"));
            assert!(diagnostic.contains("a.flac"));
        }
        other => panic!("expected EncodeFailed, got {other:?}"),
    }

    // Only the failing encode was attempted, and the job never completed.
    assert_eq!(fake.request_count(), 1);
    assert!(!reached_100);
    assert!(!job.output.exists());
}

#[test]
fn test_combine_failure_leaves_no_partial_output() {
    let dir = tempdir().unwrap();
    let job = junk_album(dir.path(), &["a.flac", "b.flac"]);
    let fake = FakeTranscoder {
        fail_on_call: Some(2),
        write_output_before_failing: true,
        ..FakeTranscoder::default()
    };

    let result = convert(&job, &fake, &Settings::default(), |_, _| {});

    match result {
        Err(AlbummuxError::CombineFailed(diagnostic)) => {
            assert!(diagnostic.contains("fake transcoder failure"));
        }
        other => panic!("expected CombineFailed, got {other:?}"),
    }

    assert!(!job.output.exists(), "partial output must be removed");
}

#[test]
fn test_empty_job_is_rejected_before_any_invocation() {
    let fake = FakeTranscoder::default();
    let job = ConversionJob {
        tracks: Vec::new(),
        artwork: PathBuf::from("cover.jpg"),
        output: PathBuf::from("album.mkv"),
    };

    let result = convert(&job, &fake, &Settings::default(), |_, _| {});
    assert!(matches!(result, Err(AlbummuxError::InvalidJob(_))));
    assert_eq!(fake.request_count(), 0);
}

#[test]
fn test_segment_requests_honor_video_settings() {
    let dir = tempdir().unwrap();
    let job = junk_album(dir.path(), &["a.flac"]);
    let fake = FakeTranscoder::default();

    let mut settings = Settings::default();
    settings.video.crf = 20;
    settings.video.preset = "fast".to_string();

    convert(&job, &fake, &settings, |_, _| {}).unwrap();

    let args = fake.request_args(0);
    assert!(has_pair(&args, "-crf", "20"));
    assert!(has_pair(&args, "-preset", "fast"));
}
