//! Duplicate-matching strategies and the index they share.
//!
//! A strategy reduces a file to a key; the index maps keys to archive
//! files. Classification walks the source batch in sorted order and, after
//! each miss, inserts the file's own key back into the index so a later
//! identical file in the same batch is flagged as a duplicate of the first.

pub mod content_hash;
pub mod filename_size;
pub mod registry;

pub use content_hash::ContentHashStrategy;
pub use filename_size::FilenameSizeStrategy;

use log::{debug, warn};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{Error, Result};
use crate::scanner;
use crate::types::{CorpusEntry, FileFailure, FileRecord, MatchVerdict};

/// Strategy-specific lookup key for one file
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MatchKey {
    /// Lower-cased filename plus byte size
    NameSize(String, u64),

    /// Hex digest of the full file content
    Content(String),
}

/// Lookup index over the existing archive, extended in place as the batch
/// is classified. Insertion order per key is preserved: the first file seen
/// under a key is the one later duplicates are reported against.
#[derive(Debug, Default)]
pub struct MatchIndex {
    entries: HashMap<MatchKey, Vec<CorpusEntry>>,
}

impl MatchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// First entry under `key` that is not `probe` itself. A file must
    /// never match its own archive entry, or a re-run over the archive
    /// would discard everything it already stored.
    pub fn lookup(&self, key: &MatchKey, probe: &Path) -> Option<&CorpusEntry> {
        self.entries.get(key)?.iter().find(|e| e.path != probe)
    }

    /// Insert an entry under `key`. Idempotent per path.
    pub fn insert(&mut self, key: MatchKey, entry: CorpusEntry) {
        let slot = self.entries.entry(key).or_default();
        if !slot.iter().any(|e| e.path == entry.path) {
            slot.push(entry);
        }
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A duplicate-detection strategy: how to key a file, and how to index the
/// existing archive. Both must be read-only with respect to the corpus.
pub trait MatchStrategy: std::fmt::Debug {
    /// Short identifier used for strategy selection
    fn name(&self) -> &'static str;

    /// Compute the index key for one file
    fn key(&self, path: &Path, size: u64) -> Result<MatchKey>;

    /// Build the lookup index over the archive. Any unreadable corpus file
    /// is fatal: a partial index would silently misclassify duplicates.
    fn build_index(&self, destination: &Path) -> Result<MatchIndex> {
        let files = scanner::walk_corpus(destination)
            .map_err(|e| Error::MatchIndex(format!("cannot walk {}: {}", destination.display(), e)))?;

        let mut index = MatchIndex::new();
        for (path, size) in files {
            let key = self
                .key(&path, size)
                .map_err(|e| Error::MatchIndex(format!("cannot key {}: {}", path.display(), e)))?;
            index.insert(key, CorpusEntry { path, size });
        }
        Ok(index)
    }
}

/// Classify `records` against `index`, in the given (sorted) order.
/// Returns one verdict per record plus the files whose key could not be
/// computed; those are classified as new and continue downstream.
pub fn match_records(
    strategy: &dyn MatchStrategy,
    records: &[FileRecord],
    index: &mut MatchIndex,
) -> (Vec<MatchVerdict>, Vec<FileFailure>) {
    let mut verdicts = Vec::with_capacity(records.len());
    let mut failures = Vec::new();

    for record in records {
        let key = match strategy.key(&record.path, record.size) {
            Ok(key) => key,
            Err(e) => {
                warn!("Cannot key {}: {}", record.path.display(), e);
                failures.push(FileFailure {
                    path: record.path.clone(),
                    message: e.to_string(),
                });
                verdicts.push(MatchVerdict {
                    source: record.clone(),
                    matched_existing: None,
                    is_duplicate: false,
                });
                continue;
            }
        };

        match index.lookup(&key, &record.path) {
            Some(entry) => {
                debug!(
                    "Duplicate: {} matches {}",
                    record.path.display(),
                    entry.path.display()
                );
                verdicts.push(MatchVerdict {
                    source: record.clone(),
                    matched_existing: Some(entry.clone()),
                    is_duplicate: true,
                });
            }
            None => {
                // First seen under this key wins: later batch files with
                // the same key are duplicates of this one.
                index.insert(
                    key,
                    CorpusEntry {
                        path: record.path.clone(),
                        size: record.size,
                    },
                );
                verdicts.push(MatchVerdict {
                    source: record.clone(),
                    matched_existing: None,
                    is_duplicate: false,
                });
            }
        }
    }

    (verdicts, failures)
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::types::{FileCategory, FileRecord};
    use std::path::Path;

    pub fn record(path: &Path, size: u64) -> FileRecord {
        FileRecord {
            path: path.to_path_buf(),
            category: FileCategory::Photo,
            size,
            extension: ".jpg".to_string(),
            date: None,
            parent_media: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::record;
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn empty_index_flags_nothing() {
        let strategy = FilenameSizeStrategy;
        let mut index = MatchIndex::new();
        let records = vec![record(Path::new("/src/a.jpg"), 10)];

        let (verdicts, failures) = match_records(&strategy, &records, &mut index);

        assert!(failures.is_empty());
        assert!(!verdicts[0].is_duplicate);
    }

    #[test]
    fn batch_self_reference_first_seen_wins() {
        // B and C share a key, A does not; nothing is in the archive.
        let strategy = FilenameSizeStrategy;
        let mut index = MatchIndex::new();
        let records = vec![
            record(Path::new("/src/a/unique.jpg"), 5),
            record(Path::new("/src/b/twin.jpg"), 9),
            record(Path::new("/src/c/twin.jpg"), 9),
        ];

        let (verdicts, _) = match_records(&strategy, &records, &mut index);

        assert!(!verdicts[0].is_duplicate);
        assert!(!verdicts[1].is_duplicate);
        assert!(verdicts[2].is_duplicate);
        assert_eq!(
            verdicts[2].matched_existing.as_ref().unwrap().path,
            Path::new("/src/b/twin.jpg")
        );
    }

    #[test]
    fn archive_entry_does_not_match_itself() {
        // Recursive re-run: the probe file IS the archive file.
        let strategy = FilenameSizeStrategy;
        let mut index = MatchIndex::new();
        let archived = record(Path::new("/archive/2024/06/photo.jpg"), 7);
        index.insert(
            strategy.key(&archived.path, archived.size).unwrap(),
            CorpusEntry {
                path: archived.path.clone(),
                size: archived.size,
            },
        );

        let (verdicts, _) = match_records(&strategy, &[archived], &mut index);

        assert!(!verdicts[0].is_duplicate);
    }

    #[test]
    fn zero_byte_files_match_by_key() {
        let strategy = FilenameSizeStrategy;
        let mut index = MatchIndex::new();
        index.insert(
            MatchKey::NameSize("empty.jpg".to_string(), 0),
            CorpusEntry {
                path: Path::new("/archive/empty.jpg").to_path_buf(),
                size: 0,
            },
        );

        let records = vec![record(Path::new("/src/empty.jpg"), 0)];
        let (verdicts, _) = match_records(&strategy, &records, &mut index);

        assert!(verdicts[0].is_duplicate);
    }

    #[test]
    fn missing_corpus_builds_an_empty_index() {
        // First run against a destination that does not exist yet
        let dir = tempdir().unwrap();
        let strategy = FilenameSizeStrategy;
        let index = strategy.build_index(&dir.path().join("missing")).unwrap();
        assert!(index.is_empty());
    }
}
