use albummux::config::Settings;
use albummux::transcode::{self, FfmpegTranscoder};
use albummux::{convert, interactive, pipeline};
use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::ffi::OsString;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "albummux")]
#[command(version, about = "Batch lossless audio into a chaptered video container")]
#[command(long_about = "Mux an album of lossless audio tracks into a single MKV: one static \
album-art frame per track, audio stream-copied without re-encoding, and a chapter per track.")]
struct Cli {
    /// Non-interactive invocation is not supported; run without arguments.
    #[arg(hide = true)]
    args: Vec<OsString>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    if !cli.args.is_empty() {
        anyhow::bail!(
            "Command line mode is not implemented. Run without arguments for interactive mode."
        );
    }

    // Required external tooling, enumerated before any job may start.
    let missing = transcode::missing_tools();
    if !missing.is_empty() {
        eprintln!("Missing dependencies:");
        for tool in &missing {
            eprintln!("  - {tool}");
        }
        anyhow::bail!("Please install the missing dependencies and try again");
    }

    let settings = Settings::load()?;
    settings.validate()?;

    let job = interactive::run_wizard()?;

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{bar:40.green} {pos:>3}% {msg}")
            .unwrap(),
    );

    let report = convert(&job, &FfmpegTranscoder, &settings, |status, percent| {
        pb.set_position(percent as u64);
        pb.set_message(status.to_string());
    })?;

    pb.finish_and_clear();
    pipeline::print_summary(&report);

    Ok(())
}
