use std::path::PathBuf;

use crate::config::CuratorConfig;
use crate::types::{ActionKind, FileAction, FileRecord, MatchVerdict};

/// Decides what happens to each file based on its match verdict.
///
/// Decision table, in precedence order:
///   - duplicate                      -> Discard into the discard directory
///   - new, already at its target     -> Skip (recursive re-run)
///   - new, has a capture date        -> Store into destination/YYYY/MM
///   - new, no capture date           -> Store into destination/NoDate
///
/// The archive copy always wins on conflict; content quality is never
/// compared. Pure: no I/O, no filesystem errors. Sidecars are attached by
/// the pipeline afterwards and inherit the parent's destination directory.
pub struct Resolver<'a> {
    config: &'a CuratorConfig,
}

impl<'a> Resolver<'a> {
    pub fn new(config: &'a CuratorConfig) -> Self {
        Self { config }
    }

    pub fn resolve(&self, verdicts: &[MatchVerdict]) -> Vec<FileAction> {
        verdicts.iter().map(|v| self.resolve_one(v)).collect()
    }

    fn resolve_one(&self, verdict: &MatchVerdict) -> FileAction {
        let source = &verdict.source;
        let file_name = source
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| source.path.as_os_str().to_os_string());

        let matched_path = verdict.matched_existing.as_ref().map(|e| e.path.clone());

        if verdict.is_duplicate {
            let reason = match &matched_path {
                Some(path) => format!("duplicate of {}", path.display()),
                None => "duplicate".to_string(),
            };
            return FileAction {
                source: source.clone(),
                kind: ActionKind::Discard,
                destination: Some(self.config.discard.join(&file_name)),
                matched_existing: matched_path,
                sidecars: Vec::new(),
                reason,
            };
        }

        let target = self.target_dir(source).join(&file_name);

        // Recursive re-run: the file already sits at its computed target.
        // Paths are absolute by the time they reach the resolver, so this
        // stays a lexical comparison.
        if target == source.path {
            return FileAction {
                source: source.clone(),
                kind: ActionKind::Skip,
                destination: None,
                matched_existing: None,
                sidecars: Vec::new(),
                reason: "already in correct location".to_string(),
            };
        }

        let (kind, reason) = if source.date.is_some() {
            (ActionKind::Store, "new file".to_string())
        } else {
            (ActionKind::NoDate, "no capture date".to_string())
        };
        FileAction {
            source: source.clone(),
            kind,
            destination: Some(target),
            matched_existing: None,
            sidecars: Vec::new(),
            reason,
        }
    }

    fn target_dir(&self, record: &FileRecord) -> PathBuf {
        match record.date {
            Some(date) => self
                .config
                .destination
                .join(date.year().to_string())
                .join(format!("{:02}", date.month())),
            None => self.config.destination.join("NoDate"),
        }
    }
}
