use clap::{Parser, Subcommand};
use log::info;
use std::path::{Path, PathBuf};

use photo_curator_core::matching::registry;
use photo_curator_core::pipeline::Pipeline;
use photo_curator_core::{
    logging, metadata, undo, CuratorConfig, RunSummary, TransferMode,
    DEFAULT_EXIFTOOL_BATCH_SIZE,
};

#[derive(Parser)]
#[command(name = "photo-curator")]
#[command(about = "Curate photo and video archives: organize, deduplicate, and discard")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the curation pipeline
    Run {
        /// Source directory to recursively scan for photos and videos
        #[arg(long)]
        source: PathBuf,

        /// Destination archive directory (files organized into YYYY/MM)
        #[arg(long)]
        destination: PathBuf,

        /// Directory for discarded duplicates
        #[arg(long)]
        discard: PathBuf,

        /// Copy or move files from the source
        #[arg(long, default_value = "copy", value_parser = ["copy", "move"])]
        mode: String,

        /// Strategy for detecting duplicate files
        #[arg(long, default_value = "filename-size")]
        match_strategy: String,

        /// Preview all actions without making changes
        #[arg(long)]
        dry_run: bool,

        /// Enable verbose (debug-level) console output
        #[arg(short, long)]
        verbose: bool,

        /// Directory for log and manifest files
        #[arg(long, default_value = ".")]
        log_dir: PathBuf,

        /// Number of files per exiftool batch call
        #[arg(long, default_value_t = DEFAULT_EXIFTOOL_BATCH_SIZE)]
        exiftool_batch_size: usize,
    },

    /// Reverse operations from a previous run using its manifest
    Undo {
        /// Path to the manifest from a previous run
        manifest: PathBuf,

        /// Preview undo actions without making changes
        #[arg(long)]
        dry_run: bool,

        /// Enable verbose (debug-level) console output
        #[arg(short, long)]
        verbose: bool,

        /// Directory for log files (default: same directory as the manifest)
        #[arg(long)]
        log_dir: Option<PathBuf>,
    },
}

fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            source,
            destination,
            discard,
            mode,
            match_strategy,
            dry_run,
            verbose,
            log_dir,
            exiftool_batch_size,
        } => cmd_run(RunArgs {
            source,
            destination,
            discard,
            mode,
            match_strategy,
            dry_run,
            verbose,
            log_dir,
            exiftool_batch_size,
        }),

        Commands::Undo {
            manifest,
            dry_run,
            verbose,
            log_dir,
        } => cmd_undo(manifest, dry_run, verbose, log_dir),
    }
}

struct RunArgs {
    source: PathBuf,
    destination: PathBuf,
    discard: PathBuf,
    mode: String,
    match_strategy: String,
    dry_run: bool,
    verbose: bool,
    log_dir: PathBuf,
    exiftool_batch_size: usize,
}

/// Make a path absolute without requiring it to exist yet.
fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    }
}

/// Canonicalize if the path exists, otherwise fall back to lexical
/// absolutization (a dry-run may name directories that don't exist yet).
fn resolved(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| absolutize(path))
}

fn cmd_run(args: RunArgs) -> Result<(), anyhow::Error> {
    let log_dir = absolutize(&args.log_dir);
    let run_id = logging::init(&log_dir, args.verbose)?;

    if !args.source.is_dir() {
        anyhow::bail!("--source is not a directory: {}", args.source.display());
    }
    if registry::strategy(&args.match_strategy).is_err() {
        anyhow::bail!(
            "unknown --match-strategy '{}' (available: {})",
            args.match_strategy,
            registry::STRATEGY_NAMES.join(", ")
        );
    }
    if !metadata::exiftool_available() {
        anyhow::bail!(
            "exiftool is not installed or not on PATH \
             (install it with: sudo apt install libimage-exiftool-perl)"
        );
    }

    if !args.dry_run {
        std::fs::create_dir_all(&args.destination)?;
        std::fs::create_dir_all(&args.discard)?;
    }

    let config = CuratorConfig {
        source: resolved(&args.source),
        destination: resolved(&args.destination),
        discard: resolved(&args.discard),
        mode: args.mode.parse::<TransferMode>()?,
        strategy: args.match_strategy,
        dry_run: args.dry_run,
        exiftool_batch_size: args.exiftool_batch_size,
        log_dir,
    };

    if config.source == config.destination {
        info!("Recursive mode: source and destination are the same directory.");
    }

    info!("============================================================");
    info!("photo-curator {}", env!("CARGO_PKG_VERSION"));
    info!("  Source:      {}", config.source.display());
    info!("  Destination: {}", config.destination.display());
    info!("  Discard:     {}", config.discard.display());
    info!("  Mode:        {}", config.mode.as_str());
    info!("  Strategy:    {}", config.strategy);
    info!("  Dry-run:     {}", config.dry_run);
    info!("  Log dir:     {}", config.log_dir.display());
    info!("============================================================");

    let pipeline = Pipeline::new(config, &run_id)?;
    let summary = pipeline.run()?;

    print_summary(&summary);

    if summary.errors > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    info!("============================================================");
    info!("Summary:");
    info!(
        "  Source:      {} files ({} photos, {} videos)",
        summary.files_scanned, summary.source_photos, summary.source_videos
    );
    info!(
        "  Destination: {} files before -> {} files after ({} photos, {} videos)",
        summary.dest_before.files,
        summary.dest_after.files,
        summary.dest_after.photos,
        summary.dest_after.videos
    );
    info!("  Stored:      {}", summary.files_stored);
    info!("  Discarded:   {}", summary.files_discarded);
    info!("  Skipped:     {}", summary.files_skipped);
    info!("  No date:     {}", summary.files_no_date);
    info!("  Errors:      {}", summary.errors);
    if summary.dry_run {
        info!("  (dry-run -- no files were changed)");
    }
    if let Some(path) = &summary.manifest_path {
        info!("  Manifest:    {}", path.display());
    }
    info!("============================================================");
}

fn cmd_undo(
    manifest: PathBuf,
    dry_run: bool,
    verbose: bool,
    log_dir: Option<PathBuf>,
) -> Result<(), anyhow::Error> {
    let manifest = absolutize(&manifest);
    let log_dir = log_dir
        .map(|dir| absolutize(&dir))
        .or_else(|| manifest.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."));

    logging::init(&log_dir, verbose)?;

    let summary = undo::undo_run(&manifest, dry_run, &log_dir)?;

    if summary.failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}
