use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use photo_curator_core::{CuratorConfig, TransferMode, DEFAULT_EXIFTOOL_BATCH_SIZE};

/// Source/destination/discard/log directory tree for one test run
pub struct ArchiveFixture {
    pub _root: TempDir,
    pub source: PathBuf,
    pub destination: PathBuf,
    pub discard: PathBuf,
    pub log_dir: PathBuf,
}

pub fn fixture() -> ArchiveFixture {
    let root = TempDir::new().unwrap();
    let source = root.path().join("source");
    let destination = root.path().join("archive");
    let discard = root.path().join("discard");
    let log_dir = root.path().join("logs");
    for dir in [&source, &destination, &discard, &log_dir] {
        fs::create_dir(dir).unwrap();
    }
    ArchiveFixture {
        _root: root,
        source,
        destination,
        discard,
        log_dir,
    }
}

pub fn config(fx: &ArchiveFixture, mode: TransferMode, strategy: &str, dry_run: bool) -> CuratorConfig {
    CuratorConfig {
        source: fx.source.clone(),
        destination: fx.destination.clone(),
        discard: fx.discard.clone(),
        mode,
        strategy: strategy.to_string(),
        dry_run,
        exiftool_batch_size: DEFAULT_EXIFTOOL_BATCH_SIZE,
        log_dir: fx.log_dir.clone(),
    }
}

pub fn write_file(path: &Path, bytes: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, bytes).unwrap();
}

/// Every file under `root`, as (relative path, content), sorted
pub fn tree_snapshot(root: &Path) -> Vec<(PathBuf, Vec<u8>)> {
    let mut files = Vec::new();
    if !root.exists() {
        return files;
    }
    for entry in walkdir_files(root) {
        let rel = entry.strip_prefix(root).unwrap().to_path_buf();
        files.push((rel, fs::read(&entry).unwrap()));
    }
    files.sort();
    files
}

fn walkdir_files(root: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(&dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                stack.push(path);
            } else {
                out.push(path);
            }
        }
    }
    out
}
