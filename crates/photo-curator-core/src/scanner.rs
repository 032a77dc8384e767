use log::{debug, warn};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use crate::config::{self, CuratorConfig};
use crate::error::Result;
use crate::types::{CorpusInventory, FileCategory, FileRecord};

/// Map of media file path -> sidecars that travel with it
pub type SidecarMap = HashMap<PathBuf, Vec<FileRecord>>;

fn keep_entry(entry: &DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return true;
    }
    let name = entry.file_name().to_string_lossy().to_lowercase();
    !config::SKIP_DIRNAMES.contains(name.as_str())
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_lowercase()))
}

/// Recursive source discovery and sidecar association
pub struct Scanner<'a> {
    config: &'a CuratorConfig,
}

impl<'a> Scanner<'a> {
    pub fn new(config: &'a CuratorConfig) -> Self {
        Self { config }
    }

    /// Walk the source tree and return media files plus a map of their
    /// sidecars. Media files come back sorted by path: batch-internal
    /// duplicate detection depends on this order being stable across runs.
    pub fn scan(&self) -> Result<(Vec<FileRecord>, SidecarMap)> {
        let mut media_files: Vec<FileRecord> = Vec::new();
        let mut sidecars: Vec<FileRecord> = Vec::new();

        for entry in WalkDir::new(&self.config.source)
            .into_iter()
            .filter_entry(keep_entry)
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().to_lowercase();
            if config::SKIP_FILENAMES.contains(name.as_str()) {
                continue;
            }

            let ext = match extension_of(path) {
                Some(ext) => ext,
                None => continue,
            };
            let category = match FileCategory::from_extension(&ext) {
                Some(category) => category,
                None => continue,
            };

            let size = match fs::metadata(path) {
                Ok(metadata) => metadata.len(),
                Err(e) => {
                    warn!("Cannot stat {}: {}", path.display(), e);
                    continue;
                }
            };

            let record = FileRecord {
                path: path.to_path_buf(),
                category,
                size,
                extension: ext,
                date: None,
                parent_media: None,
            };

            if category == FileCategory::Sidecar {
                sidecars.push(record);
            } else {
                media_files.push(record);
            }
        }

        media_files.sort_by(|a, b| a.path.cmp(&b.path));
        let sidecar_map = map_sidecars(&media_files, sidecars);
        Ok((media_files, sidecar_map))
    }
}

/// Associate sidecars with their media file by (directory, lower-cased stem).
/// Orphan sidecars are dropped.
fn map_sidecars(media_files: &[FileRecord], sidecars: Vec<FileRecord>) -> SidecarMap {
    let mut media_lookup: HashMap<(PathBuf, String), PathBuf> = HashMap::new();
    for mf in media_files {
        if let (Some(parent), Some(stem)) = (mf.path.parent(), mf.path.file_stem()) {
            let key = (parent.to_path_buf(), stem.to_string_lossy().to_lowercase());
            media_lookup.insert(key, mf.path.clone());
        }
    }

    let mut result: SidecarMap = HashMap::new();
    for sc in sidecars {
        let key = match (sc.path.parent(), sc.path.file_stem()) {
            (Some(parent), Some(stem)) => {
                (parent.to_path_buf(), stem.to_string_lossy().to_lowercase())
            }
            _ => continue,
        };
        match media_lookup.get(&key) {
            Some(media_path) => {
                let enriched = FileRecord {
                    parent_media: Some(media_path.clone()),
                    ..sc
                };
                result.entry(media_path.clone()).or_default().push(enriched);
            }
            None => {
                debug!("Orphan sidecar (no matching media): {}", sc.path.display());
            }
        }
    }

    result
}

/// Walk the archive and return (path, size) for every media and sidecar
/// file. A missing root is an empty corpus, but any unreadable entry is an
/// error: index builders must see the whole archive or none of it.
pub fn walk_corpus(root: &Path) -> Result<Vec<(PathBuf, u64)>> {
    let mut files = Vec::new();

    if !root.exists() {
        return Ok(files);
    }

    for entry in WalkDir::new(root).into_iter().filter_entry(keep_entry) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let ext = match extension_of(path) {
            Some(ext) => ext,
            None => continue,
        };
        if FileCategory::from_extension(&ext).is_none() {
            continue;
        }
        let size = fs::metadata(path)?.len();
        files.push((path.to_path_buf(), size));
    }

    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files)
}

/// Count the archive's media files for the run summary. Unreadable entries
/// are skipped: the inventory is informational, not a matching input.
pub fn inventory(root: &Path) -> CorpusInventory {
    let mut inv = CorpusInventory::default();

    if !root.exists() {
        return inv;
    }

    for entry in WalkDir::new(root)
        .into_iter()
        .filter_entry(keep_entry)
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let ext = match extension_of(entry.path()) {
            Some(ext) => ext,
            None => continue,
        };
        match FileCategory::from_extension(&ext) {
            Some(FileCategory::Photo) => {
                inv.files += 1;
                inv.photos += 1;
            }
            Some(FileCategory::Video) => {
                inv.files += 1;
                inv.videos += 1;
            }
            Some(FileCategory::Sidecar) => inv.files += 1,
            None => {}
        }
    }

    inv
}

// -- Tests --
