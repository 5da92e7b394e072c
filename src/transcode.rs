use std::ffi::OsString;
use std::path::Path;
use std::process::Command;
use std::time::Duration;

use tracing::debug;

use crate::config::VideoSettings;
use crate::error::{AlbummuxError, Result};

/// One fully-specified invocation of the external transcoder.
///
/// Requests are plain argument vectors so the invocation contract can be
/// inspected and tested without running the binary.
#[derive(Debug, Clone)]
pub struct TranscodeRequest {
    pub args: Vec<OsString>,
}

impl TranscodeRequest {
    pub fn describe(&self) -> String {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Diagnostic from a failed transcoder run, surfaced verbatim to the caller.
#[derive(Debug, Clone)]
pub struct TranscodeFailure {
    pub diagnostic: String,
}

/// Executes transcode requests. The production implementation shells out to
/// ffmpeg; tests inject a fake.
pub trait Transcoder {
    fn run(&self, request: &TranscodeRequest) -> std::result::Result<(), TranscodeFailure>;
}

pub struct FfmpegTranscoder;

impl Transcoder for FfmpegTranscoder {
    fn run(&self, request: &TranscodeRequest) -> std::result::Result<(), TranscodeFailure> {
        debug!("ffmpeg {}", request.describe());

        let output = Command::new("ffmpeg")
            .args(&request.args)
            .output()
            .map_err(|e| TranscodeFailure {
                diagnostic: format!("Failed to run ffmpeg: {e}"),
            })?;

        if !output.status.success() {
            return Err(TranscodeFailure {
                diagnostic: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(())
    }
}

/// Build the per-track segment encode: the still frame looped for the full
/// segment duration against the source audio. The audio stream is copied
/// byte-for-byte (`-c:a copy`); the source bitstream is never re-encoded.
pub fn segment_request(
    frame: &Path,
    audio: &Path,
    duration: Duration,
    video: &VideoSettings,
    output: &Path,
) -> TranscodeRequest {
    let args: Vec<OsString> = vec![
        "-y".into(),
        "-loop".into(),
        "1".into(),
        "-i".into(),
        frame.into(),
        "-i".into(),
        audio.into(),
        "-c:v".into(),
        "libx264".into(),
        "-preset".into(),
        video.preset.clone().into(),
        "-crf".into(),
        video.crf.to_string().into(),
        "-c:a".into(),
        "copy".into(),
        "-t".into(),
        format!("{:.3}", duration.as_secs_f64()).into(),
        "-pix_fmt".into(),
        "yuv420p".into(),
        "-r".into(),
        video.frame_rate.to_string().into(),
        output.into(),
    ];

    TranscodeRequest { args }
}

/// Build the final combine: concatenate the ordered segments from the
/// manifest and merge in the chapter metadata, stream-copying everything.
pub fn concat_request(manifest: &Path, chapters: &Path, output: &Path) -> TranscodeRequest {
    let args: Vec<OsString> = vec![
        "-y".into(),
        "-f".into(),
        "concat".into(),
        "-safe".into(),
        "0".into(),
        "-i".into(),
        manifest.into(),
        "-i".into(),
        chapters.into(),
        "-c".into(),
        "copy".into(),
        "-map_metadata".into(),
        "1".into(),
        output.into(),
    ];

    TranscodeRequest { args }
}

fn tool_available(tool: &str) -> bool {
    Command::new(tool)
        .arg("-version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Enumerate required external tools that are not on the PATH.
pub fn missing_tools() -> Vec<String> {
    let mut missing = Vec::new();
    for tool in ["ffmpeg", "ffprobe"] {
        if !tool_available(tool) {
            missing.push(tool.to_string());
        }
    }
    missing
}

/// Fatal-at-startup check: every required tool must be present before a job
/// may begin.
pub fn check_tooling() -> Result<()> {
    let missing = missing_tools();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AlbummuxError::ToolingMissing(missing))
    }
}

/// Best-effort duration probe via ffprobe, used when tag reading fails.
pub fn probe_duration(input: &Path) -> Option<Duration> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(input)
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let duration_str = String::from_utf8_lossy(&output.stdout);
    let duration_secs: f64 = duration_str.trim().parse().ok()?;
    if duration_secs < 0.0 {
        return None;
    }

    Some(Duration::from_secs_f64(duration_secs))
}
