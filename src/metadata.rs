use std::path::Path;
use std::time::Duration;

use lofty::prelude::*;
use lofty::tag::ItemKey;
use tracing::{debug, warn};

use crate::transcode;

pub const DEFAULT_ARTIST: &str = "Unknown Artist";
pub const DEFAULT_ALBUM: &str = "Unknown Album";

/// Tags and stream properties for one source track.
///
/// Immutable once read; one instance per track for the lifetime of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackMetadata {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub track_number: u32,
    pub duration: Duration,
    pub sample_rate: u32,
    pub bit_depth: u8,
    pub channel_count: u8,
}

impl TrackMetadata {
    fn defaults_for(path: &Path) -> Self {
        Self {
            title: filename_stem(path),
            artist: DEFAULT_ARTIST.to_string(),
            album: DEFAULT_ALBUM.to_string(),
            track_number: 1,
            duration: Duration::ZERO,
            sample_rate: 44_100,
            bit_depth: 16,
            channel_count: 2,
        }
    }

    /// Display title used on frames and chapters: `NN. Title`.
    ///
    /// The track-number tag is display-only; sequencing always follows the
    /// caller-supplied file order.
    pub fn display_title(&self) -> String {
        format!("{:02}. {}", self.track_number, self.title)
    }
}

fn filename_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Unknown Track")
        .to_string()
}

/// Read tags and stream properties from an audio file.
///
/// Never fails: an unreadable file falls back to a filename-derived title,
/// "Unknown Artist" / "Unknown Album", track 1, and 44.1 kHz / 16-bit /
/// stereo, with the duration probed via ffprobe as a last resort. The
/// diagnostic is logged and the conversion continues.
pub fn read_track(path: &Path) -> TrackMetadata {
    let tagged = match lofty::read_from_path(path) {
        Ok(tagged) => tagged,
        Err(e) => {
            warn!("Failed to read metadata from {}: {e}", path.display());
            let mut meta = TrackMetadata::defaults_for(path);
            meta.duration = transcode::probe_duration(path).unwrap_or(Duration::ZERO);
            return meta;
        }
    };

    let mut meta = TrackMetadata::defaults_for(path);

    let properties = tagged.properties();
    meta.duration = properties.duration();
    if let Some(rate) = properties.sample_rate() {
        meta.sample_rate = rate;
    }
    if let Some(depth) = properties.bit_depth() {
        meta.bit_depth = depth;
    }
    if let Some(channels) = properties.channels() {
        meta.channel_count = channels;
    }

    if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
        if let Some(v) = tag.get_string(&ItemKey::TrackTitle) {
            if !v.trim().is_empty() {
                meta.title = v.to_string();
            }
        }
        if let Some(v) = tag.get_string(&ItemKey::TrackArtist) {
            let v = v.trim();
            if !v.is_empty() {
                meta.artist = v.to_string();
            }
        }
        if let Some(v) = tag.get_string(&ItemKey::AlbumTitle) {
            let v = v.trim();
            if !v.is_empty() {
                meta.album = v.to_string();
            }
        }
        if let Some(n) = tag.track() {
            if n > 0 {
                meta.track_number = n;
            }
        }
    }

    debug!(
        "Read {}: \"{}\" by {} ({:.1}s, {} Hz / {}-bit / {} ch)",
        path.display(),
        meta.title,
        meta.artist,
        meta.duration.as_secs_f64(),
        meta.sample_rate,
        meta.bit_depth,
        meta.channel_count
    );

    meta
}
