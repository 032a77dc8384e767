use log::info;

use crate::config::CuratorConfig;
use crate::error::Result;
use crate::manifest::ManifestWriter;
use crate::matching::{self, registry};
use crate::metadata::MetadataExtractor;
use crate::mover::Mover;
use crate::resolver::Resolver;
use crate::scanner::{self, Scanner};
use crate::types::{FileCategory, RunSummary};

/// Orchestrates one curation run: scan, extract dates, match, resolve,
/// execute. Matching and resolving are pure; all side effects happen in
/// the mover, file by file, in the scanner's sorted order.
pub struct Pipeline {
    config: CuratorConfig,
    run_id: String,
}

impl Pipeline {
    /// Validate configuration and assemble a pipeline. Configuration
    /// errors surface here, before any filesystem I/O.
    pub fn new(config: CuratorConfig, run_id: &str) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            run_id: run_id.to_string(),
        })
    }

    pub fn run(&self) -> Result<RunSummary> {
        let mut summary = RunSummary {
            dry_run: self.config.dry_run,
            ..Default::default()
        };
        let strategy = registry::strategy(&self.config.strategy)?;
        let mut manifest = ManifestWriter::new(&self.run_id, &self.config);

        info!("Phase 1/5: scanning source tree");
        let scanner = Scanner::new(&self.config);
        let (media, sidecar_map) = scanner.scan()?;
        summary.files_scanned = media.len();
        summary.source_photos = media
            .iter()
            .filter(|r| r.category == FileCategory::Photo)
            .count();
        summary.source_videos = media
            .iter()
            .filter(|r| r.category == FileCategory::Video)
            .count();
        let sidecar_count: usize = sidecar_map.values().map(|v| v.len()).sum();
        info!(
            "Found {} media files, {} sidecars",
            media.len(),
            sidecar_count
        );

        if media.is_empty() {
            info!("No files to process.");
            if !self.config.dry_run {
                summary.manifest_path = Some(manifest.finalize(&summary)?);
            }
            return Ok(summary);
        }

        info!("Phase 2/5: extracting capture dates");
        let extractor = MetadataExtractor::new(self.config.exiftool_batch_size);
        let media = extractor.enrich(media);

        summary.dest_before = scanner::inventory(&self.config.destination);

        info!(
            "Phase 3/5: matching against the archive ({})",
            strategy.name()
        );
        let mut index = strategy.build_index(&self.config.destination)?;
        info!("Indexed {} archive keys", index.len());
        let (verdicts, failures) = matching::match_records(strategy.as_ref(), &media, &mut index);
        summary.errors += failures.len();
        summary.failures.extend(failures);

        info!("Phase 4/5: resolving actions");
        let resolver = Resolver::new(&self.config);
        let mut actions = resolver.resolve(&verdicts);
        for action in &mut actions {
            if let Some(sidecars) = sidecar_map.get(&action.source.path) {
                action.sidecars = sidecars.clone();
            }
        }

        info!("Phase 5/5: executing file operations");
        let mover = Mover::new(&self.config);
        mover.execute(actions, &mut manifest, &mut summary);

        summary.dest_after = scanner::inventory(&self.config.destination);

        if !self.config.dry_run {
            summary.manifest_path = Some(manifest.finalize(&summary)?);
        }

        Ok(summary)
    }
}
