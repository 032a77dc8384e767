use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{Error, Result};
use crate::matching::{MatchIndex, MatchKey, MatchStrategy};
use crate::scanner;
use crate::types::CorpusEntry;

const HASH_CHUNK_SIZE: usize = 64 * 1024;

/// Compute the blake3 hex digest of a file, reading the full content in
/// chunks. There is no partial-read shortcut: a truncated read cannot
/// prove equality.
pub fn hash_file(path: &Path) -> Result<String> {
    let file = File::open(path)?;
    let mut reader = BufReader::with_capacity(HASH_CHUNK_SIZE, file);
    let mut hasher = blake3::Hasher::new();

    loop {
        let chunk = reader.fill_buf()?;
        if chunk.is_empty() {
            break;
        }
        hasher.update(chunk);
        let consumed = chunk.len();
        reader.consume(consumed);
    }

    Ok(hasher.finalize().to_hex().to_string())
}

/// A file is a duplicate if a file with identical content already exists
/// in the archive, regardless of filename. Exact matches only; cost is one
/// full read per file.
#[derive(Debug)]
pub struct ContentHashStrategy;

impl MatchStrategy for ContentHashStrategy {
    fn name(&self) -> &'static str {
        "content-hash"
    }

    fn key(&self, path: &Path, _size: u64) -> Result<MatchKey> {
        Ok(MatchKey::Content(hash_file(path)?))
    }

    /// Hashing the whole archive is the expensive pass, so this override
    /// drives a progress bar while it runs.
    fn build_index(&self, destination: &Path) -> Result<MatchIndex> {
        let files = scanner::walk_corpus(destination)
            .map_err(|e| Error::MatchIndex(format!("cannot walk {}: {}", destination.display(), e)))?;

        let bar = ProgressBar::new(files.len() as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("[{eta}] {bar:40.cyan/blue} {pos}/{len} ({percent}%) {msg}")
                .unwrap()
                .progress_chars("##-"),
        );
        bar.set_message("Hashing archive...");

        let mut index = MatchIndex::new();
        for (path, size) in files {
            let digest = hash_file(&path)
                .map_err(|e| Error::MatchIndex(format!("cannot hash {}: {}", path.display(), e)))?;
            index.insert(MatchKey::Content(digest), CorpusEntry { path, size });
            bar.inc(1);
        }
        bar.finish_and_clear();

        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::{match_records, test_support::record};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn identical_content_hashes_equal() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.jpg");
        let b = dir.path().join("renamed.jpg");
        fs::write(&a, b"same bytes").unwrap();
        fs::write(&b, b"same bytes").unwrap();

        assert_eq!(hash_file(&a).unwrap(), hash_file(&b).unwrap());
    }

    #[test]
    fn different_content_hashes_differ() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.jpg");
        let b = dir.path().join("b.jpg");
        fs::write(&a, b"one").unwrap();
        fs::write(&b, b"two").unwrap();

        assert_ne!(hash_file(&a).unwrap(), hash_file(&b).unwrap());
    }

    #[test]
    fn renamed_duplicate_is_caught() {
        // Duplicate symmetry: content matching ignores filenames.
        let dir = tempdir().unwrap();
        let archive = dir.path().join("archive");
        fs::create_dir(&archive).unwrap();
        let existing = archive.join("IMG_0001.jpg");
        fs::write(&existing, b"pixels").unwrap();

        let incoming = dir.path().join("holiday.jpg");
        fs::write(&incoming, b"pixels").unwrap();

        let strategy = ContentHashStrategy;
        let mut index = strategy.build_index(&archive).unwrap();
        let records = vec![record(&incoming, 6)];

        let (verdicts, failures) = match_records(&strategy, &records, &mut index);

        assert!(failures.is_empty());
        assert!(verdicts[0].is_duplicate);
        assert_eq!(
            verdicts[0].matched_existing.as_ref().unwrap().path,
            existing
        );
    }

    #[test]
    fn batch_twins_detected_without_archive() {
        // B stored, C discarded against B, in path order.
        let dir = tempdir().unwrap();
        let b = dir.path().join("b_first.jpg");
        let c = dir.path().join("c_second.jpg");
        fs::write(&b, b"twin bytes").unwrap();
        fs::write(&c, b"twin bytes").unwrap();

        let strategy = ContentHashStrategy;
        let mut index = MatchIndex::new();
        let records = vec![record(&b, 10), record(&c, 10)];

        let (verdicts, _) = match_records(&strategy, &records, &mut index);

        assert!(!verdicts[0].is_duplicate);
        assert!(verdicts[1].is_duplicate);
        assert_eq!(verdicts[1].matched_existing.as_ref().unwrap().path, b);
    }

    #[test]
    fn unreadable_source_counts_as_key_error() {
        let strategy = ContentHashStrategy;
        let mut index = MatchIndex::new();
        let records = vec![record(Path::new("/path/that/does/not/exist.jpg"), 4)];

        let (verdicts, failures) = match_records(&strategy, &records, &mut index);

        assert_eq!(failures.len(), 1);
        assert!(failures[0].path.ends_with("exist.jpg"));
        assert!(!verdicts[0].is_duplicate);
    }

    #[test]
    fn build_index_covers_the_corpus() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("archive");
        fs::create_dir(&archive).unwrap();
        fs::write(archive.join("a.jpg"), b"one").unwrap();
        fs::write(archive.join("b.jpg"), b"two").unwrap();

        let strategy = ContentHashStrategy;
        let index = strategy.build_index(&archive).unwrap();
        assert_eq!(index.len(), 2);
    }
}
