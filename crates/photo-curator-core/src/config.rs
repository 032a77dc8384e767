use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::matching::registry;

/// Photo extensions recognised by the scanner (lower-cased, with dot)
pub static PHOTO_EXTENSIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        ".jpg", ".jpeg", ".cr2", ".cr3", ".heic", ".png", ".tiff", ".tif", ".gif", ".bmp",
        ".nef", ".arw", ".dng", ".orf", ".rw2",
    ]
    .into_iter()
    .collect()
});

/// Video extensions recognised by the scanner
pub static VIDEO_EXTENSIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [".mov", ".mp4", ".avi", ".mpeg", ".mpg", ".m4v", ".mkv", ".wmv", ".3gp"]
        .into_iter()
        .collect()
});

/// Sidecar extensions that travel with a media file
pub static SIDECAR_EXTENSIONS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| [".xmp", ".thm", ".aae"].into_iter().collect());

/// Junk filenames ignored during scanning (lower-cased)
pub static SKIP_FILENAMES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "desktop.ini",
        "thumbs.db",
        ".ds_store",
        ".picasa.ini",
        "zbthumbnail.info",
    ]
    .into_iter()
    .collect()
});

/// Directory names pruned from every walk (lower-cased)
pub static SKIP_DIRNAMES: Lazy<HashSet<&'static str>> =
    Lazy::new(|| [".picasaoriginals"].into_iter().collect());

/// True when the extension belongs to a photo or video
pub fn is_media_extension(ext: &str) -> bool {
    PHOTO_EXTENSIONS.contains(ext) || VIDEO_EXTENSIONS.contains(ext)
}

pub const DEFAULT_EXIFTOOL_BATCH_SIZE: usize = 500;

/// Whether files leave the source tree or are duplicated into the archive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferMode {
    Copy,
    Move,
}

impl TransferMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Copy => "copy",
            Self::Move => "move",
        }
    }
}

impl FromStr for TransferMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "copy" => Ok(Self::Copy),
            "move" => Ok(Self::Move),
            other => Err(Error::Configuration(format!(
                "unknown transfer mode '{}' (expected 'copy' or 'move')",
                other
            ))),
        }
    }
}

/// Immutable runtime configuration for one curation run
#[derive(Debug, Clone)]
pub struct CuratorConfig {
    /// Source directory to recursively scan
    pub source: PathBuf,

    /// Destination archive (files organised into YYYY/MM)
    pub destination: PathBuf,

    /// Directory for discarded duplicates
    pub discard: PathBuf,

    /// Copy or move semantics
    pub mode: TransferMode,

    /// Name of the matching strategy to use
    pub strategy: String,

    /// Whether to run without making changes
    pub dry_run: bool,

    /// Number of files per exiftool batch invocation
    pub exiftool_batch_size: usize,

    /// Directory for log and manifest files
    pub log_dir: PathBuf,
}

impl CuratorConfig {
    /// Validate the configuration. Runs before any filesystem I/O so that
    /// a bad strategy name or missing source aborts the run cleanly.
    pub fn validate(&self) -> Result<()> {
        if !self.source.is_dir() {
            return Err(Error::Configuration(format!(
                "source is not a directory: {}",
                self.source.display()
            )));
        }
        if self.exiftool_batch_size == 0 {
            return Err(Error::Configuration(
                "exiftool batch size must be at least 1".to_string(),
            ));
        }
        // Closed-registry lookup: unknown names fail here, not mid-run.
        registry::strategy(&self.strategy)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn config(source: PathBuf) -> CuratorConfig {
        CuratorConfig {
            source,
            destination: PathBuf::from("/tmp/dest"),
            discard: PathBuf::from("/tmp/discard"),
            mode: TransferMode::Copy,
            strategy: "filename-size".to_string(),
            dry_run: false,
            exiftool_batch_size: DEFAULT_EXIFTOOL_BATCH_SIZE,
            log_dir: PathBuf::from("/tmp/logs"),
        }
    }

    #[test]
    fn validate_accepts_known_strategy() {
        let dir = tempdir().unwrap();
        let cfg = config(dir.path().to_path_buf());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_rejects_unknown_strategy() {
        let dir = tempdir().unwrap();
        let mut cfg = config(dir.path().to_path_buf());
        cfg.strategy = "quantum".to_string();
        assert!(matches!(cfg.validate(), Err(Error::Configuration(_))));
    }

    #[test]
    fn validate_rejects_missing_source() {
        let cfg = config(PathBuf::from("/path/that/does/not/exist"));
        assert!(matches!(cfg.validate(), Err(Error::Configuration(_))));
    }

    #[test]
    fn transfer_mode_parses() {
        assert_eq!("copy".parse::<TransferMode>().unwrap(), TransferMode::Copy);
        assert_eq!("move".parse::<TransferMode>().unwrap(), TransferMode::Move);
        assert!("sync".parse::<TransferMode>().is_err());
    }
}
