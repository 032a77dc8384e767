use log::{debug, error, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{CuratorConfig, TransferMode};
use crate::error::{Error, Result};
use crate::manifest::ManifestWriter;
use crate::matching::content_hash::hash_file;
use crate::types::{ActionKind, FileAction, OperationRecord, RunSummary, SidecarTransfer};

const MAX_COLLISION_SUFFIX: u32 = 9999;

/// Where a transfer may land, after the live collision probe
enum Placement {
    /// Write here (free name, possibly suffixed)
    At(PathBuf),

    /// The destination already holds a byte-identical copy at this path
    AlreadyPresent(PathBuf),
}

/// If `target` exists, append `_001`, `_002`, ... before the extension
/// until a free name is found. The probe is live: the index built at scan
/// time is not trusted to know the current directory contents.
pub fn resolve_collision(target: &Path) -> Result<PathBuf> {
    if !target.exists() {
        return Ok(target.to_path_buf());
    }

    let parent = target.parent().unwrap_or_else(|| Path::new("."));
    let stem = target
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = target
        .extension()
        .map(|s| s.to_string_lossy().into_owned());

    for counter in 1..=MAX_COLLISION_SUFFIX {
        let name = match &ext {
            Some(ext) => format!("{}_{:03}.{}", stem, counter, ext),
            None => format!("{}_{:03}", stem, counter),
        };
        let candidate = parent.join(name);
        if !candidate.exists() {
            return Ok(candidate);
        }
    }

    Err(Error::FileOperation {
        path: target.to_path_buf(),
        reason: "too many name collisions".to_string(),
    })
}

/// Full-content equality check: size first, then blake3 of both files.
fn files_identical(a: &Path, b: &Path) -> Result<bool> {
    let size_a = fs::metadata(a)?.len();
    let size_b = fs::metadata(b)?.len();
    if size_a != size_b {
        return Ok(false);
    }
    Ok(hash_file(a)? == hash_file(b)?)
}

/// Executes planned actions against the filesystem, or simulates them in
/// dry-run. Every completed action appends exactly one operation record
/// reflecting what actually happened.
pub struct Mover<'a> {
    config: &'a CuratorConfig,
}

impl<'a> Mover<'a> {
    pub fn new(config: &'a CuratorConfig) -> Self {
        Self { config }
    }

    /// Execute all actions. A single file's failure is logged, counted,
    /// and does not stop the batch.
    pub fn execute(
        &self,
        actions: Vec<FileAction>,
        manifest: &mut ManifestWriter,
        summary: &mut RunSummary,
    ) {
        for action in actions {
            if let Err(e) = self.execute_one(&action, manifest, summary) {
                error!("Error processing {}: {}", action.source.path.display(), e);
                summary.note_failure(&action.source.path, e.to_string());
            }
        }
    }

    fn execute_one(
        &self,
        action: &FileAction,
        manifest: &mut ManifestWriter,
        summary: &mut RunSummary,
    ) -> Result<()> {
        if action.kind == ActionKind::Skip {
            debug!(
                "SKIP: {} ({})",
                action.source.path.display(),
                action.reason
            );
            summary.files_skipped += 1;
            manifest.record(OperationRecord {
                action: ActionKind::Skip,
                source: action.source.path.clone(),
                destination: None,
                source_size: action.source.size,
                matched_existing: action.matched_existing.clone(),
                sidecars: Vec::new(),
                simulated: self.config.dry_run,
            });
            return Ok(());
        }

        let planned = action.destination.as_ref().ok_or_else(|| Error::FileOperation {
            path: action.source.path.clone(),
            reason: "action has no destination".to_string(),
        })?;

        let final_dest = match self.place(&action.source.path, planned)? {
            Placement::At(dest) => dest,
            Placement::AlreadyPresent(occupied) => {
                info!(
                    "SKIP: {} already present at {}",
                    action.source.path.display(),
                    occupied.display()
                );
                summary.files_skipped += 1;
                manifest.record(OperationRecord {
                    action: ActionKind::Skip,
                    source: action.source.path.clone(),
                    destination: None,
                    source_size: action.source.size,
                    matched_existing: Some(occupied),
                    sidecars: Vec::new(),
                    simulated: self.config.dry_run,
                });
                return Ok(());
            }
        };

        self.transfer(&action.source.path, &final_dest)?;

        // Sidecars ride with the parent. One failing sidecar is logged and
        // counted but does not undo the parent transfer, and successful
        // sidecar transfers still make it into the record.
        let mut sidecar_transfers = Vec::new();
        let sidecar_dir = final_dest.parent().unwrap_or_else(|| Path::new("."));
        for sc in &action.sidecars {
            let sc_name = match sc.path.file_name() {
                Some(name) => name,
                None => continue,
            };
            let sc_planned = sidecar_dir.join(sc_name);
            match self.place(&sc.path, &sc_planned) {
                Ok(Placement::At(sc_dest)) => match self.transfer(&sc.path, &sc_dest) {
                    Ok(()) => sidecar_transfers.push(SidecarTransfer {
                        source: sc.path.clone(),
                        destination: sc_dest,
                    }),
                    Err(e) => {
                        error!("Error processing sidecar {}: {}", sc.path.display(), e);
                        summary.note_failure(&sc.path, e.to_string());
                    }
                },
                Ok(Placement::AlreadyPresent(occupied)) => {
                    info!(
                        "SKIP sidecar: {} already present at {}",
                        sc.path.display(),
                        occupied.display()
                    );
                }
                Err(e) => {
                    error!("Error placing sidecar {}: {}", sc.path.display(), e);
                    summary.note_failure(&sc.path, e.to_string());
                }
            }
        }

        manifest.record(OperationRecord {
            action: action.kind,
            source: action.source.path.clone(),
            destination: Some(final_dest),
            source_size: action.source.size,
            matched_existing: action.matched_existing.clone(),
            sidecars: sidecar_transfers,
            simulated: self.config.dry_run,
        });

        match action.kind {
            ActionKind::Store => summary.files_stored += 1,
            ActionKind::NoDate => summary.files_no_date += 1,
            ActionKind::Discard => summary.files_discarded += 1,
            ActionKind::Skip => {}
        }
        Ok(())
    }

    /// Live collision probe for one transfer. Occupied by different
    /// content means suffix; occupied by identical content means the
    /// write is pointless and the transfer is skipped.
    fn place(&self, source: &Path, planned: &Path) -> Result<Placement> {
        if !planned.exists() {
            return Ok(Placement::At(planned.to_path_buf()));
        }
        if files_identical(source, planned)? {
            return Ok(Placement::AlreadyPresent(planned.to_path_buf()));
        }
        resolve_collision(planned).map(Placement::At)
    }

    /// Copy or move one file. Move is write-then-verify-then-remove: the
    /// source is only removed after the destination length checks out, and
    /// a failed write never leaves a truncated destination behind.
    fn transfer(&self, src: &Path, dest: &Path) -> Result<()> {
        let prefix = if self.config.dry_run { "[DRY-RUN] " } else { "" };
        info!(
            "{}{}: {} -> {}",
            prefix,
            self.config.mode.as_str().to_uppercase(),
            src.display(),
            dest.display()
        );

        if self.config.dry_run {
            return Ok(());
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }

        let copied = match fs::copy(src, dest) {
            Ok(bytes) => bytes,
            Err(e) => {
                let _ = fs::remove_file(dest);
                return Err(Error::FileOperation {
                    path: src.to_path_buf(),
                    reason: format!("copy to {} failed: {}", dest.display(), e),
                });
            }
        };

        let written = fs::metadata(dest)?.len();
        if written != copied {
            let _ = fs::remove_file(dest);
            return Err(Error::FileOperation {
                path: src.to_path_buf(),
                reason: format!(
                    "short write at {} ({} of {} bytes)",
                    dest.display(),
                    written,
                    copied
                ),
            });
        }

        if self.config.mode == TransferMode::Move {
            if let Err(e) = fs::remove_file(src) {
                warn!(
                    "Destination written but source not removed: {} ({})",
                    src.display(),
                    e
                );
                return Err(Error::FileOperation {
                    path: src.to_path_buf(),
                    reason: format!("cannot remove source after move: {}", e),
                });
            }
        }

        Ok(())
    }
}

// -- Tests --
