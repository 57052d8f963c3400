//! Retention candidates.

use std::path::PathBuf;

use chrono::{DateTime, Local};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::decision::{Decision, DecisionEvent};

/// Kind of retention candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    /// Regular file.
    File,
    /// Directory (folder mode only).
    Folder,
}

impl EntryKind {
    /// Check if this is a regular file.
    pub fn is_file(&self) -> bool {
        matches!(self, Self::File)
    }

    /// The noun used in log messages ("file" or "folder").
    pub fn noun(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Folder => "folder",
        }
    }
}

/// A single discovered child of the base directory.
///
/// Produced by discovery, then carried through the pipeline; the passes
/// only ever set the decision and append to the log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    /// Absolute, link-resolved path.
    pub path: PathBuf,

    /// Basename used for pattern matching.
    pub name: CompactString,

    /// File or folder.
    pub kind: EntryKind,

    /// Byte count (0 for folders).
    pub size: u64,

    /// The timestamp used for bucketing, per the configured age type.
    pub age_instant: DateTime<Local>,

    /// Current decision; `None` until a pass decides.
    pub decision: Option<Decision>,

    /// Ordered record of the decision events that touched this entry.
    pub log: Vec<DecisionEvent>,
}

impl Entry {
    /// Create an undecided entry.
    pub fn new(
        path: impl Into<PathBuf>,
        name: impl Into<CompactString>,
        kind: EntryKind,
        size: u64,
        age_instant: DateTime<Local>,
    ) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            kind,
            size,
            age_instant,
            decision: None,
            log: Vec::new(),
        }
    }

    /// Set the decision and append the event that caused it.
    pub fn decide(&mut self, decision: Decision, event: DecisionEvent) {
        self.decision = Some(decision);
        self.log.push(event);
    }

    pub fn is_protected(&self) -> bool {
        matches!(self.decision, Some(Decision::Protected))
    }

    pub fn is_retained(&self) -> bool {
        matches!(self.decision, Some(Decision::Retained(_)))
    }

    pub fn is_pruned(&self) -> bool {
        matches!(self.decision, Some(Decision::Pruned(_)))
    }

    /// Sort newest first; ties broken by byte-lexicographic path order.
    pub fn sort_newest_first(entries: &mut [Entry]) {
        entries.sort_by(|a, b| {
            b.age_instant
                .cmp(&a.age_instant)
                .then_with(|| a.path.as_os_str().cmp(b.path.as_os_str()))
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(name: &str, minute: u32) -> Entry {
        let age = Local
            .with_ymd_and_hms(2026, 1, 31, 12, minute, 0)
            .single()
            .unwrap();
        Entry::new(format!("/base/{name}"), name, EntryKind::File, 10, age)
    }

    #[test]
    fn test_sort_newest_first() {
        let mut entries = vec![entry("a", 1), entry("b", 3), entry("c", 2)];
        Entry::sort_newest_first(&mut entries);
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["b", "c", "a"]);
    }

    #[test]
    fn test_sort_ties_break_on_path() {
        let mut entries = vec![entry("z", 5), entry("a", 5), entry("m", 5)];
        Entry::sort_newest_first(&mut entries);
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["a", "m", "z"]);
    }

    #[test]
    fn test_decide_records_event() {
        let mut e = entry("a", 0);
        assert!(e.decision.is_none());
        e.decide(
            Decision::Protected,
            DecisionEvent::Protected {
                pattern: "*.keep".into(),
            },
        );
        assert!(e.is_protected());
        assert_eq!(e.log.len(), 1);
    }
}
