use log::warn;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Command;

use crate::types::{FileRecord, MediaDate};

/// EXIF fields consulted for a capture date, in priority order
pub const EXIF_DATE_FIELDS: [&str; 3] = ["DateTimeOriginal", "CreateDate", "MediaCreateDate"];

const ZERO_DATE: &str = "0000:00:00 00:00:00";

/// True when exiftool is installed and on PATH
pub fn exiftool_available() -> bool {
    Command::new("exiftool")
        .arg("-ver")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// Parse an exiftool date string ("YYYY:MM:DD HH:MM:SS") into a MediaDate.
/// Out-of-range or malformed values come back as None.
pub fn parse_date(raw: &str) -> Option<MediaDate> {
    let date_part = raw.split_whitespace().next()?;
    let mut parts = date_part.split(':');
    let year: u16 = parts.next()?.parse().ok()?;
    let month: u8 = parts.next()?.parse().ok()?;
    MediaDate::new(year, month)
}

/// EXIF date extraction via exiftool subprocess, in batches
pub struct MetadataExtractor {
    batch_size: usize,
}

impl MetadataExtractor {
    pub fn new(batch_size: usize) -> Self {
        Self { batch_size }
    }

    /// Extract capture dates and return the records with their date set.
    /// A failed batch degrades those records to dateless; it never aborts
    /// the run. Input order is preserved.
    pub fn enrich(&self, media_files: Vec<FileRecord>) -> Vec<FileRecord> {
        if media_files.is_empty() {
            return media_files;
        }

        let paths: Vec<PathBuf> = media_files.iter().map(|r| r.path.clone()).collect();
        let date_map = self.batch_extract(&paths);

        media_files
            .into_iter()
            .map(|mut record| {
                record.date = date_map.get(&record.path).copied();
                record
            })
            .collect()
    }

    /// Call exiftool over chunks of paths and collect parsed dates.
    fn batch_extract(&self, paths: &[PathBuf]) -> HashMap<PathBuf, MediaDate> {
        let mut dates = HashMap::new();

        for (batch_no, chunk) in paths.chunks(self.batch_size).enumerate() {
            let mut cmd = Command::new("exiftool");
            cmd.arg("-json");
            for field in EXIF_DATE_FIELDS {
                cmd.arg(format!("-{}", field));
            }
            cmd.arg("-d").arg("%Y:%m:%d %H:%M:%S");
            cmd.args(chunk);

            let output = match cmd.output() {
                Ok(output) => output,
                Err(e) => {
                    warn!("exiftool batch {} failed to start: {}", batch_no, e);
                    continue;
                }
            };

            // exiftool exits non-zero when some files have no metadata but
            // still prints JSON for the rest; only an empty stdout is fatal
            // for the batch.
            if output.stdout.is_empty() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                warn!(
                    "exiftool batch {} produced no output: {}",
                    batch_no,
                    stderr.chars().take(200).collect::<String>()
                );
                continue;
            }

            let items: Vec<serde_json::Value> = match serde_json::from_slice(&output.stdout) {
                Ok(items) => items,
                Err(e) => {
                    warn!("exiftool batch {} JSON parse error: {}", batch_no, e);
                    continue;
                }
            };

            for item in items {
                let source = match item.get("SourceFile").and_then(|v| v.as_str()) {
                    Some(source) => PathBuf::from(source),
                    None => continue,
                };
                let date = EXIF_DATE_FIELDS
                    .iter()
                    .filter_map(|field| item.get(*field).and_then(|v| v.as_str()))
                    .find(|value| !value.is_empty() && *value != ZERO_DATE)
                    .and_then(parse_date);
                if let Some(date) = date {
                    dates.insert(source, date);
                }
            }
        }

        dates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_date_extracts_year_and_month() {
        let date = parse_date("2024:06:15 10:30:00").unwrap();
        assert_eq!(date.year(), 2024);
        assert_eq!(date.month(), 6);
    }

    #[test]
    fn parse_date_pads_single_digit_month() {
        let date = parse_date("2019:3:02 08:00:00").unwrap();
        assert_eq!(date.month(), 3);
    }

    #[test]
    fn parse_date_rejects_out_of_range() {
        assert!(parse_date("1850:01:01 00:00:00").is_none());
        assert!(parse_date("2024:13:01 00:00:00").is_none());
        assert!(parse_date("2200:01:01 00:00:00").is_none());
    }

    #[test]
    fn parse_date_rejects_garbage() {
        assert!(parse_date("").is_none());
        assert!(parse_date("not a date").is_none());
        assert!(parse_date("2024").is_none());
    }
}
