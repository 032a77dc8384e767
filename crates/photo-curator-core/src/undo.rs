use chrono::Local;
use log::{error, info, warn};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::TransferMode;
use crate::error::Result;
use crate::manifest::{Manifest, MANIFEST_SCHEMA_VERSION};
use crate::types::ActionKind;

/// Counters for a completed undo run
#[derive(Debug, Clone, Copy, Default)]
pub struct UndoSummary {
    /// Transfers successfully reversed
    pub reversed: usize,

    /// Transfers that could not be reversed (left untouched)
    pub failed: usize,

    /// Destinations that no longer existed (nothing to reverse)
    pub already_gone: usize,

    /// Records with nothing to undo (skips, simulations)
    pub skipped: usize,

    pub dry_run: bool,
}

#[derive(Debug, Serialize)]
struct ReversedTransfer {
    restored_source: PathBuf,
    removed_destination: PathBuf,
}

/// Journal of what an undo run did, written next to the original manifest
#[derive(Debug, Serialize)]
struct UndoManifest {
    schema_version: String,
    kind: String,
    run_id: String,
    timestamp: String,
    original_manifest: PathBuf,
    original_run_id: String,
    mode: TransferMode,
    operations_undone: Vec<ReversedTransfer>,
    errors: usize,
}

enum UndoOutcome {
    Reversed,
    AlreadyGone,
    Failed,
}

/// Reverse every operation recorded in a manifest, last action first.
///
/// Later operations may depend on filesystem state established by earlier
/// ones (a collision-suffixed name exists only because an earlier transfer
/// took the base name), so replay order is strict reverse. Undo is
/// best-effort: per-record failures are counted, not fatal.
pub fn undo_run(manifest_path: &Path, dry_run: bool, log_dir: &Path) -> Result<UndoSummary> {
    // Validation happens entirely before the filesystem is touched.
    let manifest = Manifest::load(manifest_path)?;
    let mode = manifest.config.mode;

    info!("Undoing run {} ({} mode)", manifest.run_id, mode.as_str());

    let mut summary = UndoSummary {
        dry_run,
        ..Default::default()
    };

    if manifest.config.dry_run {
        info!("Original run was a dry-run; nothing to undo.");
        return Ok(summary);
    }

    let mut reversed_transfers = Vec::new();

    for op in manifest.operations.iter().rev() {
        if op.action == ActionKind::Skip || op.simulated {
            summary.skipped += 1;
            continue;
        }

        // Sidecars were applied after the parent, so they reverse first.
        for sc in op.sidecars.iter().rev() {
            match undo_one(&sc.destination, &sc.source, None, mode, dry_run) {
                UndoOutcome::Reversed => {
                    summary.reversed += 1;
                    reversed_transfers.push(ReversedTransfer {
                        restored_source: sc.source.clone(),
                        removed_destination: sc.destination.clone(),
                    });
                }
                UndoOutcome::AlreadyGone => summary.already_gone += 1,
                UndoOutcome::Failed => summary.failed += 1,
            }
        }

        let destination = match &op.destination {
            Some(destination) => destination,
            None => {
                summary.skipped += 1;
                continue;
            }
        };

        match undo_one(destination, &op.source, Some(op.source_size), mode, dry_run) {
            UndoOutcome::Reversed => {
                summary.reversed += 1;
                reversed_transfers.push(ReversedTransfer {
                    restored_source: op.source.clone(),
                    removed_destination: destination.clone(),
                });
            }
            UndoOutcome::AlreadyGone => summary.already_gone += 1,
            UndoOutcome::Failed => summary.failed += 1,
        }
    }

    if !dry_run {
        write_undo_manifest(manifest_path, &manifest, reversed_transfers, &summary, log_dir)?;
    }

    info!(
        "Undo complete: {} reversed, {} already gone, {} failed, {} skipped",
        summary.reversed, summary.already_gone, summary.failed, summary.skipped
    );
    if dry_run {
        info!("(dry-run; no files were changed)");
    }

    Ok(summary)
}

/// Reverse one transfer. Copy mode deletes the copy (the source was never
/// disturbed); move mode moves the file back to its recorded source.
fn undo_one(
    destination: &Path,
    source: &Path,
    expected_size: Option<u64>,
    mode: TransferMode,
    dry_run: bool,
) -> UndoOutcome {
    let prefix = if dry_run { "[DRY-RUN] " } else { "" };

    if !destination.exists() {
        warn!("Already gone: {}", destination.display());
        return UndoOutcome::AlreadyGone;
    }

    // The recorded size guards against deleting a file that is not the one
    // this run wrote.
    if let Some(expected) = expected_size {
        match fs::metadata(destination) {
            Ok(metadata) if metadata.len() != expected => {
                warn!(
                    "Size mismatch at {} (expected {}, found {}); leaving in place",
                    destination.display(),
                    expected,
                    metadata.len()
                );
                return UndoOutcome::Failed;
            }
            Err(e) => {
                warn!("Cannot stat {}: {}", destination.display(), e);
                return UndoOutcome::Failed;
            }
            _ => {}
        }
    }

    match mode {
        TransferMode::Copy => {
            info!("{}DELETE: {}", prefix, destination.display());
            if !dry_run {
                if let Err(e) = fs::remove_file(destination) {
                    error!("Cannot delete {}: {}", destination.display(), e);
                    return UndoOutcome::Failed;
                }
                if let Some(parent) = destination.parent() {
                    prune_empty_parents(parent);
                }
            }
            UndoOutcome::Reversed
        }
        TransferMode::Move => {
            if source.exists() {
                warn!(
                    "Source path occupied, not overwriting: {}",
                    source.display()
                );
                return UndoOutcome::Failed;
            }
            info!(
                "{}MOVE BACK: {} -> {}",
                prefix,
                destination.display(),
                source.display()
            );
            if !dry_run {
                if let Some(parent) = source.parent() {
                    if let Err(e) = fs::create_dir_all(parent) {
                        error!("Cannot recreate {}: {}", parent.display(), e);
                        return UndoOutcome::Failed;
                    }
                }
                if let Err(e) = move_back(destination, source) {
                    error!(
                        "Cannot move {} back to {}: {}",
                        destination.display(),
                        source.display(),
                        e
                    );
                    return UndoOutcome::Failed;
                }
                if let Some(parent) = destination.parent() {
                    prune_empty_parents(parent);
                }
            }
            UndoOutcome::Reversed
        }
    }
}

/// Rename, falling back to copy+remove across filesystems.
fn move_back(from: &Path, to: &Path) -> std::io::Result<()> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    fs::copy(from, to)?;
    fs::remove_file(from)?;
    Ok(())
}

/// Remove empty directories up the tree, stopping at the first non-empty
/// ancestor or on any error.
fn prune_empty_parents(start: &Path) {
    let mut current = start.to_path_buf();
    loop {
        let empty = match fs::read_dir(&current) {
            Ok(mut entries) => entries.next().is_none(),
            Err(_) => return,
        };
        if !empty || fs::remove_dir(&current).is_err() {
            return;
        }
        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => return,
        }
    }
}

fn write_undo_manifest(
    original_manifest: &Path,
    manifest: &Manifest,
    operations_undone: Vec<ReversedTransfer>,
    summary: &UndoSummary,
    log_dir: &Path,
) -> Result<PathBuf> {
    let undo_manifest = UndoManifest {
        schema_version: MANIFEST_SCHEMA_VERSION.to_string(),
        kind: "undo".to_string(),
        run_id: format!("{}_undo", manifest.run_id),
        timestamp: Local::now().format("%Y-%m-%dT%H:%M:%S").to_string(),
        original_manifest: original_manifest.to_path_buf(),
        original_run_id: manifest.run_id.clone(),
        mode: manifest.config.mode,
        operations_undone,
        errors: summary.failed,
    };

    fs::create_dir_all(log_dir)?;
    let path = log_dir.join(format!("{}.json", undo_manifest.run_id));
    let file = File::create(&path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &undo_manifest)?;
    writer.write_all(b"\n")?;
    writer.flush()?;

    info!("Undo manifest: {}", path.display());
    Ok(path)
}

// -- Tests --
