use chrono::Local;
use log::info;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::{CuratorConfig, TransferMode};
use crate::error::{Error, Result};
use crate::types::{ActionKind, CorpusInventory, OperationRecord, RunSummary};

/// Manifest schema version. Bumped on any incompatible format change;
/// undo refuses manifests written under a different version.
pub const MANIFEST_SCHEMA_VERSION: &str = "1.0";

/// Configuration snapshot embedded in every manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub discard: PathBuf,
    pub mode: TransferMode,
    pub match_strategy: String,
    pub dry_run: bool,
}

impl From<&CuratorConfig> for ConfigSnapshot {
    fn from(config: &CuratorConfig) -> Self {
        Self {
            source: config.source.clone(),
            destination: config.destination.clone(),
            discard: config.discard.clone(),
            mode: config.mode,
            match_strategy: config.strategy.clone(),
            dry_run: config.dry_run,
        }
    }
}

/// Run counters persisted in the manifest's summary block
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManifestSummary {
    pub files_scanned: usize,
    pub files_stored: usize,
    pub files_discarded: usize,
    pub files_skipped: usize,
    pub files_no_date: usize,
    pub errors: usize,
    #[serde(default)]
    pub dest_before: CorpusInventory,
    #[serde(default)]
    pub dest_after: CorpusInventory,
}

impl From<&RunSummary> for ManifestSummary {
    fn from(summary: &RunSummary) -> Self {
        Self {
            files_scanned: summary.files_scanned,
            files_stored: summary.files_stored,
            files_discarded: summary.files_discarded,
            files_skipped: summary.files_skipped,
            files_no_date: summary.files_no_date,
            errors: summary.errors,
            dest_before: summary.dest_before,
            dest_after: summary.dest_after,
        }
    }
}

/// Durable journal of one run: ordered operations plus run metadata.
/// Append order is execution order; the undo engine replays it in reverse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub schema_version: String,
    pub run_id: String,
    pub timestamp: String,
    pub config: ConfigSnapshot,
    pub operations: Vec<OperationRecord>,
    pub summary: ManifestSummary,
}

impl Manifest {
    /// Load and validate a manifest. Every failure here is a
    /// ManifestIntegrity error raised before anything touches the
    /// filesystem.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            Error::ManifestIntegrity(format!("cannot open {}: {}", path.display(), e))
        })?;
        let manifest: Manifest = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            Error::ManifestIntegrity(format!("malformed manifest {}: {}", path.display(), e))
        })?;

        if manifest.schema_version != MANIFEST_SCHEMA_VERSION {
            return Err(Error::ManifestIntegrity(format!(
                "unsupported schema version '{}' (expected '{}')",
                manifest.schema_version, MANIFEST_SCHEMA_VERSION
            )));
        }
        manifest.validate()?;
        Ok(manifest)
    }

    fn validate(&self) -> Result<()> {
        for (i, op) in self.operations.iter().enumerate() {
            if op.action != ActionKind::Skip && op.destination.is_none() {
                return Err(Error::ManifestIntegrity(format!(
                    "operation {} ({}) has no destination",
                    i,
                    op.source.display()
                )));
            }
            if !op.source.is_absolute() {
                return Err(Error::ManifestIntegrity(format!(
                    "operation {} has a relative source path: {}",
                    i,
                    op.source.display()
                )));
            }
        }
        Ok(())
    }
}

/// Collects operation records during a run and writes the manifest once,
/// at successful completion.
pub struct ManifestWriter {
    run_id: String,
    config: ConfigSnapshot,
    log_dir: PathBuf,
    operations: Vec<OperationRecord>,
}

impl ManifestWriter {
    pub fn new(run_id: &str, config: &CuratorConfig) -> Self {
        Self {
            run_id: run_id.to_string(),
            config: ConfigSnapshot::from(config),
            log_dir: config.log_dir.clone(),
            operations: Vec::new(),
        }
    }

    /// Append a completed operation. Records are never rewritten.
    pub fn record(&mut self, operation: OperationRecord) {
        self.operations.push(operation);
    }

    pub fn operations(&self) -> &[OperationRecord] {
        &self.operations
    }

    /// Serialize the manifest to `{log_dir}/{run_id}.json` and return its
    /// path. The caller is responsible for not calling this on dry runs.
    pub fn finalize(self, summary: &RunSummary) -> Result<PathBuf> {
        let manifest = Manifest {
            schema_version: MANIFEST_SCHEMA_VERSION.to_string(),
            run_id: self.run_id.clone(),
            timestamp: Local::now().format("%Y-%m-%dT%H:%M:%S").to_string(),
            config: self.config,
            operations: self.operations,
            summary: ManifestSummary::from(summary),
        };

        fs::create_dir_all(&self.log_dir)?;
        let path = self.log_dir.join(format!("{}.json", self.run_id));
        let file = File::create(&path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &manifest)?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        info!("Manifest: {}", path.display());
        Ok(path)
    }
}
