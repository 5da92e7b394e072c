use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::chapter::{ChapterEntry, ChapterIndex};
use crate::config::Settings;
use crate::error::{AlbummuxError, Result};
use crate::frame::FrameComposer;
use crate::metadata;
use crate::transcode::{self, Transcoder};

/// An immutable conversion request: ordered audio tracks, one artwork image,
/// one destination path.
///
/// Track order is authoritative for sequencing; embedded track-number tags
/// are display-only and never re-sorted.
#[derive(Debug, Clone)]
pub struct ConversionJob {
    pub tracks: Vec<PathBuf>,
    pub artwork: PathBuf,
    pub output: PathBuf,
}

impl ConversionJob {
    /// The core validates non-emptiness only; unreadable paths surface from
    /// the components that consume them.
    pub fn validate(&self) -> Result<()> {
        if self.tracks.is_empty() {
            return Err(AlbummuxError::InvalidJob(
                "no audio tracks selected".to_string(),
            ));
        }
        if self.artwork.as_os_str().is_empty() {
            return Err(AlbummuxError::InvalidJob(
                "no artwork image selected".to_string(),
            ));
        }
        if self.output.as_os_str().is_empty() {
            return Err(AlbummuxError::InvalidJob(
                "no output path selected".to_string(),
            ));
        }
        Ok(())
    }
}

/// Timing collected over one conversion run.
#[derive(Debug, Clone)]
pub struct ConversionStats {
    pub total_time: Duration,
    pub render_time: Duration,
    pub encode_time: Duration,
    pub combine_time: Duration,
    pub track_count: usize,
}

/// Result of a successful conversion.
#[derive(Debug, Clone)]
pub struct ConversionReport {
    pub output_path: PathBuf,
    pub chapters: Vec<ChapterEntry>,
    pub total_duration: Duration,
    pub stats: ConversionStats,
}

/// Convert a job into one chaptered container.
///
/// Fully sequential: each track's frame render and segment encode completes
/// before the next begins, with the chapter index advancing in lockstep.
/// Progress is reported to `progress` as (status text, percent) pairs;
/// percents are monotonically non-decreasing and reach 100 exactly once, on
/// success.
pub fn convert<T, F>(
    job: &ConversionJob,
    transcoder: &T,
    settings: &Settings,
    mut progress: F,
) -> Result<ConversionReport>
where
    T: Transcoder + ?Sized,
    F: FnMut(&str, u8),
{
    let start_time = Instant::now();

    job.validate()?;
    settings.validate()?;

    // The scratch directory owns every intermediate artifact for the run and
    // is removed on drop, success or failure; removal errors are swallowed.
    let scratch = tempfile::Builder::new().prefix("albummux-").tempdir()?;
    let scratch_path = scratch.path();
    debug!("Using scratch directory {}", scratch_path.display());

    let composer = FrameComposer::new(settings);
    let mut chapters = ChapterIndex::new();
    let mut segments: Vec<PathBuf> = Vec::with_capacity(job.tracks.len());
    let track_count = job.tracks.len();

    let mut render_time = Duration::ZERO;
    let mut encode_time = Duration::ZERO;

    // ═══════════════════════════════════════════════════════════════════════
    // Stage 1: per-track frame render + segment encode, chapters in lockstep
    // ═══════════════════════════════════════════════════════════════════════
    for (i, track) in job.tracks.iter().enumerate() {
        progress(
            &format!("Processing track {}/{}", i + 1, track_count),
            ((i * 50) / track_count) as u8,
        );

        let meta = metadata::read_track(track);

        let render_start = Instant::now();
        let frame = composer.compose(&job.artwork, &meta);
        let frame_path = scratch_path.join(format!("frame_{i:03}.png"));
        frame.save(&frame_path)?;
        render_time += render_start.elapsed();

        let segment_path = scratch_path.join(format!("segment_{i:03}.mkv"));
        let request = transcode::segment_request(
            &frame_path,
            track,
            meta.duration,
            &settings.video,
            &segment_path,
        );

        let encode_start = Instant::now();
        transcoder.run(&request).map_err(|f| {
            AlbummuxError::EncodeFailed(format!("track {}: {}", track.display(), f.diagnostic))
        })?;
        encode_time += encode_start.elapsed();

        chapters.push(&meta.display_title(), meta.duration);
        segments.push(segment_path);

        info!(
            "Encoded track {}/{}: \"{}\" ({:.1}s)",
            i + 1,
            track_count,
            meta.title,
            meta.duration.as_secs_f64()
        );
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Stage 2: chapter side file + concat manifest
    // ═══════════════════════════════════════════════════════════════════════
    progress("Combining segments...", 50);

    let chapter_path = scratch_path.join("chapters.txt");
    fs::write(&chapter_path, chapters.render())?;

    let manifest_path = scratch_path.join("concat.txt");
    fs::write(&manifest_path, concat_manifest(&segments))?;

    // ═══════════════════════════════════════════════════════════════════════
    // Stage 3: final combine, stream-copying everything
    // ═══════════════════════════════════════════════════════════════════════
    progress("Creating final container...", 75);

    let request = transcode::concat_request(&manifest_path, &chapter_path, &job.output);
    let combine_start = Instant::now();
    if let Err(f) = transcoder.run(&request) {
        // No partial output may be left at the destination.
        let _ = fs::remove_file(&job.output);
        return Err(AlbummuxError::CombineFailed(f.diagnostic));
    }
    let combine_time = combine_start.elapsed();

    progress("Complete!", 100);

    let total_duration = chapters.total_duration();
    info!(
        "Wrote {} ({} chapters, {:.1}s)",
        job.output.display(),
        chapters.len(),
        total_duration.as_secs_f64()
    );

    Ok(ConversionReport {
        output_path: job.output.clone(),
        chapters: chapters.entries().to_vec(),
        total_duration,
        stats: ConversionStats {
            total_time: start_time.elapsed(),
            render_time,
            encode_time,
            combine_time,
            track_count,
        },
    })
}

/// Manifest for the concat demuxer: one `file` directive per segment in
/// order. Embedded single quotes close the quote, escape, and reopen.
fn concat_manifest(segments: &[PathBuf]) -> String {
    let mut manifest = String::new();
    for segment in segments {
        let quoted = segment.display().to_string().replace('\'', "'\\''");
        manifest.push_str(&format!("file '{quoted}'\n"));
    }
    manifest
}

/// Print a summary of a finished conversion.
pub fn print_summary(report: &ConversionReport) {
    println!();
    println!("═══════════════════════════════════════════════════════════════");
    println!("                      Conversion Complete                       ");
    println!("═══════════════════════════════════════════════════════════════");
    println!();
    println!("  Output:     {}", report.output_path.display());
    println!("  Tracks:     {}", report.stats.track_count);
    println!("  Chapters:   {}", report.chapters.len());
    println!(
        "  Duration:   {:.1}s",
        report.total_duration.as_secs_f64()
    );
    println!();
    println!("  Timing:");
    println!(
        "    Render:    {:.2}s",
        report.stats.render_time.as_secs_f64()
    );
    println!(
        "    Encode:    {:.2}s",
        report.stats.encode_time.as_secs_f64()
    );
    println!(
        "    Combine:   {:.2}s",
        report.stats.combine_time.as_secs_f64()
    );
    println!(
        "    Total:     {:.2}s",
        report.stats.total_time.as_secs_f64()
    );
    println!();
    println!("═══════════════════════════════════════════════════════════════");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_requires_tracks() {
        let job = ConversionJob {
            tracks: vec![],
            artwork: PathBuf::from("cover.jpg"),
            output: PathBuf::from("album.mkv"),
        };
        assert!(matches!(
            job.validate(),
            Err(AlbummuxError::InvalidJob(_))
        ));
    }

    #[test]
    fn test_validate_requires_artwork_and_output() {
        let job = ConversionJob {
            tracks: vec![PathBuf::from("a.flac")],
            artwork: PathBuf::new(),
            output: PathBuf::from("album.mkv"),
        };
        assert!(job.validate().is_err());

        let job = ConversionJob {
            tracks: vec![PathBuf::from("a.flac")],
            artwork: PathBuf::from("cover.jpg"),
            output: PathBuf::new(),
        };
        assert!(job.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_complete_job() {
        let job = ConversionJob {
            tracks: vec![PathBuf::from("a.flac")],
            artwork: PathBuf::from("cover.jpg"),
            output: PathBuf::from("album.mkv"),
        };
        assert!(job.validate().is_ok());
    }

    #[test]
    fn test_concat_manifest_lists_segments_in_order() {
        let segments = vec![
            PathBuf::from("/scratch/segment_000.mkv"),
            PathBuf::from("/scratch/segment_001.mkv"),
        ];
        assert_eq!(
            concat_manifest(&segments),
            "file '/scratch/segment_000.mkv'\nfile '/scratch/segment_001.mkv'\n"
        );
    }

    #[test]
    fn test_concat_manifest_escapes_quotes() {
        let segments = vec![PathBuf::from("/tmp/it's here.mkv")];
        assert_eq!(
            concat_manifest(&segments),
            "file '/tmp/it'\\''s here.mkv'\n"
        );
    }
}
