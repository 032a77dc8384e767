use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config;

/// Category of a discovered file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileCategory {
    Photo,
    Video,
    Sidecar,
}

impl FileCategory {
    /// Determine category from a lower-cased extension (with leading dot).
    /// Returns None for extensions the curator does not handle.
    pub fn from_extension(ext: &str) -> Option<Self> {
        if config::PHOTO_EXTENSIONS.contains(ext) {
            Some(Self::Photo)
        } else if config::VIDEO_EXTENSIONS.contains(ext) {
            Some(Self::Video)
        } else if config::SIDECAR_EXTENSIONS.contains(ext) {
            Some(Self::Sidecar)
        } else {
            None
        }
    }
}

/// Capture date extracted from file metadata. Construction validates the
/// range, so a populated date is always a usable archive folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaDate {
    year: u16,
    month: u8,
}

impl MediaDate {
    /// Create a date if year and month are within [1900, 2100] x [1, 12].
    pub fn new(year: u16, month: u8) -> Option<Self> {
        if (1900..=2100).contains(&year) && (1..=12).contains(&month) {
            Some(Self { year, month })
        } else {
            None
        }
    }

    pub fn year(&self) -> u16 {
        self.year
    }

    pub fn month(&self) -> u8 {
        self.month
    }
}

/// A discovered file with its metadata
#[derive(Debug, Clone)]
pub struct FileRecord {
    /// Absolute path to the file
    pub path: PathBuf,

    /// Category derived from the extension
    pub category: FileCategory,

    /// File size in bytes
    pub size: u64,

    /// Lower-cased extension, including the dot
    pub extension: String,

    /// Capture date, if metadata extraction found one
    pub date: Option<MediaDate>,

    /// For sidecars: the media file they belong to
    pub parent_media: Option<PathBuf>,
}

/// One file in the existing archive, as seen by a match index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusEntry {
    pub path: PathBuf,
    pub size: u64,
}

/// Result of classifying one source file against the archive
#[derive(Debug, Clone)]
pub struct MatchVerdict {
    /// The file that was classified
    pub source: FileRecord,

    /// The archive file it matched, if any
    pub matched_existing: Option<CorpusEntry>,

    /// Whether the source is a duplicate of `matched_existing`
    pub is_duplicate: bool,
}

/// Kinds of operations the mover can perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Place in destination YYYY/MM
    Store,

    /// Place in destination NoDate/
    NoDate,

    /// Send the source to the discard directory
    Discard,

    /// Leave in place (already at its computed destination)
    Skip,
}

/// A planned operation for one file and its sidecars
#[derive(Debug, Clone)]
pub struct FileAction {
    /// The file the action applies to
    pub source: FileRecord,

    /// What to do with it
    pub kind: ActionKind,

    /// Planned destination, before collision resolution. None for Skip.
    pub destination: Option<PathBuf>,

    /// The archive file the verdict matched, carried through to the journal
    pub matched_existing: Option<PathBuf>,

    /// Sidecars that travel with the file
    pub sidecars: Vec<FileRecord>,

    /// Human-readable explanation of the decision
    pub reason: String,
}

/// A sidecar transfer recorded alongside its parent operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SidecarTransfer {
    pub source: PathBuf,
    pub destination: PathBuf,
}

/// One completed file operation, as journaled in the manifest.
/// Once appended it is never rewritten.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationRecord {
    /// What was done
    pub action: ActionKind,

    /// Where the file came from
    pub source: PathBuf,

    /// Final destination after collision resolution. None for Skip.
    pub destination: Option<PathBuf>,

    /// Size of the source file in bytes
    pub source_size: u64,

    /// The archive file this one matched, if the verdict found one
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub matched_existing: Option<PathBuf>,

    /// Sidecars moved alongside, in execution order
    #[serde(default)]
    pub sidecars: Vec<SidecarTransfer>,

    /// True when the record describes a dry-run simulation
    #[serde(default)]
    pub simulated: bool,
}

/// Counts of one side of the archive, taken before and after a run
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CorpusInventory {
    pub files: usize,
    pub photos: usize,
    pub videos: usize,
}

/// One file-level failure, kept for the run's aggregate result
#[derive(Debug, Clone)]
pub struct FileFailure {
    pub path: PathBuf,
    pub message: String,
}

/// Summary counters for a completed run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub files_scanned: usize,
    pub source_photos: usize,
    pub source_videos: usize,
    pub files_stored: usize,
    pub files_discarded: usize,
    pub files_skipped: usize,
    pub files_no_date: usize,
    pub errors: usize,
    pub failures: Vec<FileFailure>,
    pub dest_before: CorpusInventory,
    pub dest_after: CorpusInventory,
    pub dry_run: bool,
    pub manifest_path: Option<PathBuf>,
}

impl RunSummary {
    /// Record a per-file failure: counted, detailed, never fatal.
    pub fn note_failure(&mut self, path: &Path, message: String) {
        self.errors += 1;
        self.failures.push(FileFailure {
            path: path.to_path_buf(),
            message,
        });
    }
}
