//! Partition verification.
//!
//! The last gate before anything touches the filesystem: every discovered
//! entry must carry exactly one final decision, and the retained/protected
//! and pruned sets must be disjoint and together cover the full entry set.

use std::collections::HashSet;
use std::path::PathBuf;

use retentions_core::{Decision, Entry, RetentionError};

/// Index sets over the entry list, produced by [`verify`].
#[derive(Debug, Default)]
pub struct Partition {
    pub protected: Vec<usize>,
    pub retained: Vec<usize>,
    pub pruned: Vec<usize>,
}

/// Verify the partition is total and disjoint.
pub fn verify(entries: &[Entry]) -> Result<Partition, RetentionError> {
    let mut partition = Partition::default();
    let mut seen_paths: HashSet<&PathBuf> = HashSet::new();

    for (index, entry) in entries.iter().enumerate() {
        if !seen_paths.insert(&entry.path) {
            return Err(RetentionError::integrity(format!(
                "entry '{}' appears more than once",
                entry.path.display()
            )));
        }
        match &entry.decision {
            Some(Decision::Protected) => partition.protected.push(index),
            Some(Decision::Retained(_)) => partition.retained.push(index),
            Some(Decision::Pruned(_)) => partition.pruned.push(index),
            None => {
                return Err(RetentionError::integrity(format!(
                    "entry '{}' has no decision",
                    entry.path.display()
                )));
            }
        }
    }

    let covered = partition.protected.len() + partition.retained.len() + partition.pruned.len();
    if covered != entries.len() {
        return Err(RetentionError::integrity(format!(
            "partition covers {covered} of {} entries",
            entries.len()
        )));
    }

    Ok(partition)
}
