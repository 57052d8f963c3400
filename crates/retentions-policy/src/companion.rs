//! Companion expansion over the prune set.

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use retentions_core::{CompanionRule, DecisionEvent, Entry, RetentionError};

/// Companion files queued for deletion, keyed by the index of the pruned
/// entry they belong to.
pub type Companions = Vec<(usize, Vec<PathBuf>)>;

/// Resolve companion files for every pruned entry.
///
/// Candidates that do not exist, are not regular files, or are symlinks are
/// skipped. A candidate that matches the protect pattern or is an already
/// retained entry is fatal: the partition would no longer be trustworthy.
pub fn expand_companions<F>(
    entries: &mut [Entry],
    rules: &[CompanionRule],
    is_protected: F,
) -> Result<Companions, RetentionError>
where
    F: Fn(&str) -> bool,
{
    let retained_paths: HashSet<PathBuf> = entries
        .iter()
        .filter(|entry| entry.is_retained())
        .map(|entry| entry.path.clone())
        .collect();
    let mut queued: HashSet<PathBuf> = entries
        .iter()
        .filter(|entry| entry.is_pruned())
        .map(|entry| entry.path.clone())
        .collect();

    let mut companions = Companions::new();

    for index in 0..entries.len() {
        if !entries[index].is_pruned() {
            continue;
        }
        let Some(parent) = entries[index].path.parent().map(PathBuf::from) else {
            continue;
        };

        let mut found = Vec::new();
        for rule in rules {
            if !rule.matches(&entries[index].name) {
                continue;
            }
            for companion_name in rule.expand(&entries[index].name) {
                let candidate = parent.join(&companion_name);
                if queued.contains(&candidate) {
                    continue;
                }

                let Ok(metadata) = fs::symlink_metadata(&candidate) else {
                    continue;
                };
                if !metadata.is_file() {
                    // Also covers symlinks: symlink_metadata does not follow.
                    continue;
                }

                if is_protected(&companion_name) {
                    return Err(RetentionError::integrity(format!(
                        "companion '{companion_name}' of '{}' is protected",
                        entries[index].name
                    )));
                }
                if retained_paths.contains(&candidate) {
                    return Err(RetentionError::integrity(format!(
                        "companion '{companion_name}' of '{}' is retained",
                        entries[index].name
                    )));
                }

                queued.insert(candidate.clone());
                entries[index].log.push(DecisionEvent::CompanionQueued {
                    companion: companion_name.clone().into(),
                    rule: rule.raw.clone(),
                });
                found.push(candidate);
            }
        }

        if !found.is_empty() {
            companions.push((index, found));
        }
    }

    Ok(companions)
}
