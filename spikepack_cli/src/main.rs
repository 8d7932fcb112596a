use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::error::ErrorKind;
use clap::Parser;

use spikepack_core::{Pipeline, RunStats};

mod config;
mod logging;

use config::Config;
use logging::LogSink;

// ── CLI definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "spikepack",
    about = "Compress raw .bin electrophysiology recordings under a directory and remove the originals",
    long_about = "Compress raw .bin electrophysiology recordings under a directory and remove the originals.\n\n\
                  Each recording is compressed to .cbin/.ch using the sample rate and channel count from its \
                  .meta sidecar, then DELETED. Keep a backup of the originals.",
    version
)]
struct Cli {
    /// Root directory to scan for recordings
    root: PathBuf,
}

// ── Helpers ────────────────────────────────────────────────────────────────

fn human_bytes(n: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut v = n as f64;
    let mut unit = 0;
    while v >= 1024.0 && unit < UNITS.len() - 1 {
        v /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", n)
    } else {
        format!("{:.2} {}", v, UNITS[unit])
    }
}

fn run(root: &Path) -> anyhow::Result<RunStats> {
    let config = Config::from_env();
    let pipeline = Pipeline::new(config.build_compressor()?);
    let sink = LogSink::open(&config.log_path)?;

    let stats = sink
        .scope(|| {
            tracing::info!(
                compressor = pipeline.compressor_name(),
                "compressing recordings under {}",
                root.display()
            );
            pipeline.run(root)
        })
        .with_context(|| format!("walking {:?}", root))?;

    sink.close()?;
    Ok(stats)
}

// ── Entry point ────────────────────────────────────────────────────────────

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = err.print();
            return ExitCode::SUCCESS;
        }
        Err(_) => {
            eprintln!("Usage: spikepack <root_dir>");
            return ExitCode::FAILURE;
        }
    };

    if !cli.root.is_dir() {
        eprintln!("Invalid Directory: {}", cli.root.display());
        return ExitCode::FAILURE;
    }

    match run(&cli.root) {
        Ok(stats) => {
            eprintln!("  recordings  : {}", stats.visited);
            eprintln!("  compressed  : {}", stats.compressed);
            eprintln!("  skipped     : {}", stats.skipped);
            eprintln!("  failed      : {}", stats.failed);
            eprintln!("  raw input   : {}", human_bytes(stats.bytes_in));
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
