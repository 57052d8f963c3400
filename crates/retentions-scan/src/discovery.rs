//! Direct-child enumeration.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Local};

use retentions_core::{AgeType, Console, Entry, EntryKind, RetentionError, RuleSet, LOCK_FILE_NAME};

use crate::folder_time::folder_age;
use crate::pattern::NamePattern;

/// Enumerate the direct children of the base directory that match the rule
/// set, sorted newest first.
///
/// Symbolic links are skipped unconditionally; the lock file is never a
/// candidate. An empty result is not an error.
pub fn discover(rules: &RuleSet, console: &Console) -> Result<Vec<Entry>, RetentionError> {
    let base = rules.base.as_path();
    let matcher = NamePattern::new(&rules.pattern, rules.pattern_mode)?;
    let noun = rules.entity_noun();
    let mut entries = Vec::new();

    let reader = fs::read_dir(base).map_err(|err| RetentionError::io(base, err))?;
    for dirent in reader {
        let dirent = dirent.map_err(|err| RetentionError::io(base, err))?;
        let file_name = dirent.file_name();
        let Some(name) = file_name.to_str() else {
            console.warn(format!(
                "Skipping entry with non-UTF-8 name: {file_name:?}"
            ));
            continue;
        };
        if name == LOCK_FILE_NAME {
            continue;
        }

        let path = dirent.path();
        let metadata =
            fs::symlink_metadata(&path).map_err(|err| RetentionError::io(&path, err))?;
        if metadata.file_type().is_symlink() {
            continue;
        }
        if !matcher.matches(name) {
            continue;
        }

        match &rules.folder_mode {
            None => {
                if !metadata.is_file() {
                    continue;
                }
                let age = age_from_metadata(&path, &metadata, rules.age_type)?;
                entries.push(Entry::new(path, name, EntryKind::File, metadata.len(), age));
            }
            Some(source) => {
                if !metadata.is_dir() {
                    continue;
                }
                match folder_age(&path, source, rules.age_type)? {
                    Some(age) => entries.push(Entry::new(path, name, EntryKind::Folder, 0, age)),
                    None => console.warn(format!("Folder '{name}' is empty -> It is ignored")),
                }
            }
        }
    }

    if entries.is_empty() {
        console.warn(format!(
            "No {noun}s found in '{}' using {} pattern '{}'",
            base.display(),
            rules.pattern_mode.describe(),
            rules.pattern
        ));
        return Ok(entries);
    }

    Entry::sort_newest_first(&mut entries);
    console.info(format!(
        "Found {} {noun}(s) using {} pattern '{}'",
        entries.len(),
        rules.pattern_mode.describe(),
        rules.pattern
    ));

    Ok(entries)
}

/// Check that the configured age type works on this platform by probing the
/// base directory's own metadata.
pub fn check_age_type_support(base: &Path, age_type: AgeType) -> Result<(), RetentionError> {
    let metadata = fs::metadata(base).map_err(|err| RetentionError::io(base, err))?;
    age_from_metadata(base, &metadata, age_type).map_err(|_| {
        RetentionError::config(format!(
            "Invalid --age-type '{}': not supported on this platform",
            age_type.label()
        ))
    })?;
    Ok(())
}

/// Extract the configured timestamp from stat metadata.
pub(crate) fn age_from_metadata(
    path: &Path,
    metadata: &fs::Metadata,
    age_type: AgeType,
) -> Result<DateTime<Local>, RetentionError> {
    let system_time = match age_type {
        AgeType::Mtime => metadata
            .modified()
            .map_err(|err| RetentionError::io(path, err))?,
        AgeType::Atime => metadata
            .accessed()
            .map_err(|err| RetentionError::io(path, err))?,
        AgeType::Birthtime => metadata
            .created()
            .map_err(|err| RetentionError::io(path, err))?,
        AgeType::Ctime => return ctime(path, metadata),
    };
    Ok(DateTime::from(system_time))
}

/// Change time on Unix; platform-defined elsewhere (falls back to the
/// creation time).
#[cfg(unix)]
fn ctime(path: &Path, metadata: &fs::Metadata) -> Result<DateTime<Local>, RetentionError> {
    use std::os::unix::fs::MetadataExt;

    DateTime::from_timestamp(metadata.ctime(), metadata.ctime_nsec() as u32)
        .map(|utc| utc.with_timezone(&Local))
        .ok_or_else(|| {
            RetentionError::io(
                path,
                std::io::Error::other("ctime out of range"),
            )
        })
}

#[cfg(not(unix))]
fn ctime(path: &Path, metadata: &fs::Metadata) -> Result<DateTime<Local>, RetentionError> {
    let created = metadata
        .created()
        .map_err(|err| RetentionError::io(path, err))?;
    Ok(DateTime::from(created))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mtime_and_ctime_supported_everywhere() {
        let temp = tempfile::TempDir::new().unwrap();
        assert!(check_age_type_support(temp.path(), AgeType::Mtime).is_ok());
        assert!(check_age_type_support(temp.path(), AgeType::Ctime).is_ok());
        assert!(check_age_type_support(temp.path(), AgeType::Atime).is_ok());
    }
}
