//! Execution of the prune set.

use std::fs;
use std::io::Write;
use std::path::Path;

use retentions_core::{Console, Entry, RetentionError, RuleSet};

/// What execution did (or would have done).
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ExecutionOutcome {
    /// Paths removed (primaries and companions).
    pub removed: u64,
    /// Paths that failed to delete and were skipped with a warning.
    pub failed: u64,
}

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Execute the prune set: delete, simulate, or list.
///
/// `entries` must be sorted newest first; pruned entries are processed in
/// that order, each followed by its companions.
pub fn execute(
    entries: &[Entry],
    companions: &[(usize, Vec<std::path::PathBuf>)],
    rules: &RuleSet,
    console: &Console,
) -> Result<ExecutionOutcome, RetentionError> {
    if let Some(separator) = &rules.list_only {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        render_list(entries, separator, &mut out)
            .map_err(|err| RetentionError::io(&rules.base, err))?;
        return Ok(ExecutionOutcome::default());
    }

    let mut outcome = ExecutionOutcome::default();
    for (index, entry) in entries.iter().enumerate() {
        if !entry.is_pruned() {
            continue;
        }
        remove_entry(entry, rules, console, &mut outcome)?;

        let queued = companions
            .iter()
            .find(|(primary, _)| *primary == index)
            .map(|(_, paths)| paths.as_slice())
            .unwrap_or_default();
        for companion in queued {
            remove_companion(companion, rules, console, &mut outcome)?;
        }
    }

    Ok(outcome)
}

/// Write each pruned path followed by the separator.
pub fn render_list(
    entries: &[Entry],
    separator: &str,
    out: &mut impl Write,
) -> std::io::Result<()> {
    for entry in entries.iter().filter(|e| e.is_pruned()) {
        write!(out, "{}{separator}", entry.path.display())?;
    }
    out.flush()
}

fn remove_entry(
    entry: &Entry,
    rules: &RuleSet,
    console: &Console,
    outcome: &mut ExecutionOutcome,
) -> Result<(), RetentionError> {
    let noun = entry.kind.noun();
    let ts = entry.age_instant.format(TIMESTAMP_FORMAT);

    if rules.dry_run {
        console.info(format!("DRY-RUN DELETE: {} (age: {ts})", entry.name));
        return Ok(());
    }

    // A pruned path that is no longer a direct child of the base directory
    // indicates a logic fault; refuse to touch it.
    if entry.path.parent() != Some(rules.base.as_path()) {
        return Err(RetentionError::integrity(format!(
            "refusing to delete '{}': not a direct child of '{}'",
            entry.path.display(),
            rules.base.display()
        )));
    }

    console.info(format!("DELETING: {} (age: {ts})", entry.name));
    let result = if entry.kind.is_file() {
        fs::remove_file(&entry.path)
    } else {
        fs::remove_dir_all(&entry.path)
    };

    match result {
        Ok(()) => outcome.removed += 1,
        Err(err) => {
            if rules.fail_on_delete_error {
                return Err(RetentionError::io(&entry.path, err));
            }
            console.warn(format!(
                "Error while deleting {noun} '{}': {err}",
                entry.name
            ));
            outcome.failed += 1;
        }
    }
    Ok(())
}

fn remove_companion(
    path: &Path,
    rules: &RuleSet,
    console: &Console,
    outcome: &mut ExecutionOutcome,
) -> Result<(), RetentionError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    if rules.dry_run {
        console.info(format!("DRY-RUN DELETE: {name} (companion)"));
        return Ok(());
    }

    console.info(format!("DELETING: {name} (companion)"));
    match fs::remove_file(path) {
        Ok(()) => outcome.removed += 1,
        Err(err) => {
            if rules.fail_on_delete_error {
                return Err(RetentionError::io(path, err));
            }
            console.warn(format!("Error while deleting file '{name}': {err}"));
            outcome.failed += 1;
        }
    }
    Ok(())
}
