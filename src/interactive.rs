use std::fs;
use std::path::PathBuf;

use console::style;
use dialoguer::{Confirm, Input, MultiSelect, Select};

use crate::pipeline::ConversionJob;

const AUDIO_EXTENSIONS: &[&str] = &["flac", "wav", "aiff", "ape", "wv"];
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp"];

const DEFAULT_OUTPUT: &str = "album.mkv";

/// Console replacement for the file-selection dialogs: pick tracks, artwork
/// and an output path, confirm, and hand back a job for the pipeline.
pub fn run_wizard() -> anyhow::Result<ConversionJob> {
    print_header();

    let tracks = select_tracks()?;
    let artwork = select_artwork()?;
    let output = select_output()?;

    print_job_summary(&tracks, &artwork, &output);

    if !Confirm::new()
        .with_prompt("Proceed with these settings?")
        .default(true)
        .interact()?
    {
        anyhow::bail!("Cancelled by user");
    }

    println!();

    Ok(ConversionJob {
        tracks,
        artwork,
        output,
    })
}

fn print_header() {
    println!();
    println!(
        "{}",
        style("╔═══════════════════════════════════════════════════╗").cyan()
    );
    println!(
        "{}",
        style("║        albummux - Album to Chaptered Video        ║").cyan()
    );
    println!(
        "{}",
        style("╚═══════════════════════════════════════════════════╝").cyan()
    );
    println!();
}

fn select_tracks() -> anyhow::Result<Vec<PathBuf>> {
    println!("{}", style("Select audio tracks:").bold());

    // Lexical order of the listing is the track order of the job.
    let files = scan_files(".", AUDIO_EXTENSIONS)?;

    if files.is_empty() {
        println!("  No lossless audio files found in current directory.\n");
        let path: String = Input::new()
            .with_prompt("Enter audio file path")
            .interact_text()?;
        let path = PathBuf::from(path);
        if !path.exists() {
            anyhow::bail!("File not found: {}", path.display());
        }
        return Ok(vec![path]);
    }

    let display_items: Vec<String> = files
        .iter()
        .map(|f| {
            let size = fs::metadata(f)
                .map(|m| format_size(m.len()))
                .unwrap_or_else(|_| "?".to_string());
            format!("{} ({})", f.display(), size)
        })
        .collect();

    let defaults = vec![true; display_items.len()];
    let selection = MultiSelect::new()
        .with_prompt("Choose tracks (space toggles, enter confirms)")
        .items(&display_items)
        .defaults(&defaults)
        .interact()?;

    if selection.is_empty() {
        anyhow::bail!("At least one track is required");
    }

    Ok(selection.into_iter().map(|i| files[i].clone()).collect())
}

fn select_artwork() -> anyhow::Result<PathBuf> {
    println!("\n{}", style("Select album artwork:").bold());

    let files = scan_files(".", IMAGE_EXTENSIONS)?;

    let mut items: Vec<String> = files.iter().map(|f| f.display().to_string()).collect();
    items.push("Enter custom path...".to_string());

    let selection = Select::new()
        .with_prompt("Choose an image")
        .items(&items)
        .default(0)
        .interact()?;

    if selection == files.len() {
        let path: String = Input::new()
            .with_prompt("Enter image path")
            .interact_text()?;
        Ok(PathBuf::from(path))
    } else {
        Ok(files[selection].clone())
    }
}

fn select_output() -> anyhow::Result<PathBuf> {
    println!();
    let path: String = Input::new()
        .with_prompt("Output file")
        .default(DEFAULT_OUTPUT.to_string())
        .interact_text()?;
    Ok(PathBuf::from(path))
}

fn scan_files(dir: &str, extensions: &[&str]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if path.is_file() {
            if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
                if extensions.contains(&ext.to_lowercase().as_str()) {
                    files.push(path);
                }
            }
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

fn print_job_summary(tracks: &[PathBuf], artwork: &PathBuf, output: &PathBuf) {
    println!("\n{}", style("═══ Summary ═══").bold());
    println!("  Tracks:   {}", tracks.len());
    for track in tracks {
        println!("    {}", style(track.display()).cyan());
    }
    println!("  Artwork:  {}", style(artwork.display()).cyan());
    println!("  Output:   {}", style(output.display()).cyan());
    println!();
}
