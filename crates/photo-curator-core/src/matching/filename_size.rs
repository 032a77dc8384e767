use std::path::Path;

use crate::error::Result;
use crate::matching::{MatchKey, MatchStrategy};

/// A file is a duplicate if an identical filename (case-insensitive) with
/// the same byte size already exists in the archive. Fast, but blind to
/// renamed copies.
#[derive(Debug)]
pub struct FilenameSizeStrategy;

impl MatchStrategy for FilenameSizeStrategy {
    fn name(&self) -> &'static str {
        "filename-size"
    }

    fn key(&self, path: &Path, size: u64) -> Result<MatchKey> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        Ok(MatchKey::NameSize(name, size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_case_insensitive() {
        let strategy = FilenameSizeStrategy;
        let a = strategy.key(Path::new("/a/IMG_01.JPG"), 100).unwrap();
        let b = strategy.key(Path::new("/b/img_01.jpg"), 100).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn key_distinguishes_sizes() {
        let strategy = FilenameSizeStrategy;
        let a = strategy.key(Path::new("/a/img.jpg"), 100).unwrap();
        let b = strategy.key(Path::new("/a/img.jpg"), 101).unwrap();
        assert_ne!(a, b);
    }
}
