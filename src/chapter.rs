use std::time::Duration;

/// One named time range in the output container, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterEntry {
    pub start_ms: u64,
    pub end_ms: u64,
    pub title: String,
}

/// Accumulates per-track chapters against a running cumulative cursor.
///
/// Entries are contiguous and non-overlapping: each entry starts where the
/// previous one ended. Ordering is push order, which is the job's input file
/// order.
#[derive(Debug, Clone, Default)]
pub struct ChapterIndex {
    cursor: Duration,
    entries: Vec<ChapterEntry>,
}

impl ChapterIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chapter spanning the next `duration` of the output and
    /// advance the cursor.
    pub fn push(&mut self, title: &str, duration: Duration) {
        let start = self.cursor;
        self.cursor += duration;
        self.entries.push(ChapterEntry {
            start_ms: start.as_millis() as u64,
            end_ms: self.cursor.as_millis() as u64,
            title: title.to_string(),
        });
    }

    pub fn entries(&self) -> &[ChapterEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cumulative duration of all pushed chapters.
    pub fn total_duration(&self) -> Duration {
        self.cursor
    }

    /// Serialize to the ffmetadata side file consumed by the combine step:
    /// a magic header line, then one `[CHAPTER]` block per entry declaring a
    /// millisecond timebase, integer start/end offsets, and a title line.
    pub fn render(&self) -> String {
        let mut out = String::from(";FFMETADATA1\n");
        for entry in &self.entries {
            out.push_str("[CHAPTER]\n");
            out.push_str("TIMEBASE=1/1000\n");
            out.push_str(&format!("START={}\n", entry.start_ms));
            out.push_str(&format!("END={}\n", entry.end_ms));
            out.push_str(&format!("title={}\n", escape_value(&entry.title)));
        }
        out
    }
}

/// ffmetadata values treat '=', ';', '#', '\' and newline as markup; they
/// must be backslash-escaped to survive the round trip into the container.
fn escape_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' | '=' | ';' | '#' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '\n' => escaped.push_str("\\\n"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_index() -> ChapterIndex {
        let mut index = ChapterIndex::new();
        index.push("01. First", Duration::from_secs(180));
        index.push("02. Second", Duration::from_secs(200));
        index.push("03. Third", Duration::from_secs(150));
        index
    }

    #[test]
    fn test_entries_are_contiguous() {
        let index = sample_index();
        let entries = index.entries();
        assert_eq!(entries.len(), 3);
        for pair in entries.windows(2) {
            assert_eq!(pair[0].end_ms, pair[1].start_ms);
        }
    }

    #[test]
    fn test_cumulative_offsets() {
        let index = sample_index();
        let entries = index.entries();
        assert_eq!((entries[0].start_ms, entries[0].end_ms), (0, 180_000));
        assert_eq!((entries[1].start_ms, entries[1].end_ms), (180_000, 380_000));
        assert_eq!((entries[2].start_ms, entries[2].end_ms), (380_000, 530_000));
        assert_eq!(index.total_duration(), Duration::from_secs(530));
    }

    #[test]
    fn test_render_format() {
        let index = sample_index();
        let rendered = index.render();

        assert!(rendered.starts_with(";FFMETADATA1\n"));
        assert_eq!(rendered.matches("[CHAPTER]").count(), 3);
        assert_eq!(rendered.matches("TIMEBASE=1/1000").count(), 3);
        assert!(rendered.contains("START=180000\nEND=380000\ntitle=02. Second\n"));
    }

    #[test]
    fn test_fractional_durations_land_on_milliseconds() {
        let mut index = ChapterIndex::new();
        index.push("01. A", Duration::from_secs_f64(1.5));
        index.push("02. B", Duration::from_secs_f64(2.25));

        let entries = index.entries();
        assert_eq!((entries[0].start_ms, entries[0].end_ms), (0, 1500));
        assert_eq!((entries[1].start_ms, entries[1].end_ms), (1500, 3750));
    }

    #[test]
    fn test_zero_duration_track_keeps_contiguity() {
        let mut index = ChapterIndex::new();
        index.push("01. A", Duration::from_secs(10));
        index.push("02. B", Duration::ZERO);
        index.push("03. C", Duration::from_secs(5));

        let entries = index.entries();
        assert_eq!((entries[1].start_ms, entries[1].end_ms), (10_000, 10_000));
        assert_eq!(entries[2].start_ms, 10_000);
    }

    #[test]
    fn test_title_escaping() {
        let mut index = ChapterIndex::new();
        index.push("01. Loud = Quiet; #1", Duration::from_secs(1));

        let rendered = index.render();
        assert!(rendered.contains("title=01. Loud \\= Quiet\\; \\#1\n"));
    }
}
