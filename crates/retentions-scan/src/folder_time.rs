//! Folder age derivation.
//!
//! The youngest-/oldest-file sources are the only recursive walk in the
//! tool: a pure reduction from a directory subtree to a single timestamp.
//! Symbolic links are never followed.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Local};
use jwalk::{Parallelism, WalkDir};

use retentions_core::{AgeType, FolderTimeSource, RetentionError};

use crate::discovery::age_from_metadata;

/// Derive a folder's age from the configured time source.
///
/// Returns `None` when the source is an extremum over descendant files and
/// the folder contains none.
pub fn folder_age(
    folder: &Path,
    source: &FolderTimeSource,
    age_type: AgeType,
) -> Result<Option<DateTime<Local>>, RetentionError> {
    match source {
        FolderTimeSource::Folder => {
            let metadata =
                fs::symlink_metadata(folder).map_err(|err| RetentionError::io(folder, err))?;
            Ok(Some(age_from_metadata(folder, &metadata, age_type)?))
        }
        FolderTimeSource::YoungestFile => extremum(folder, age_type, Extremum::Newest),
        FolderTimeSource::OldestFile => extremum(folder, age_type, Extremum::Oldest),
        FolderTimeSource::Path(relative) => pinned_file_age(folder, relative, age_type).map(Some),
    }
}

#[derive(Clone, Copy)]
enum Extremum {
    Newest,
    Oldest,
}

/// Walk the subtree and reduce descendant file timestamps to one extremum.
fn extremum(
    folder: &Path,
    age_type: AgeType,
    which: Extremum,
) -> Result<Option<DateTime<Local>>, RetentionError> {
    let walker = WalkDir::new(folder)
        .parallelism(Parallelism::Serial)
        .follow_links(false)
        .skip_hidden(false);

    let mut result: Option<DateTime<Local>> = None;
    for dirent in walker {
        let dirent = dirent.map_err(|err| {
            let io = err
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::other("directory walk failed"));
            RetentionError::io(folder, io)
        })?;
        if !dirent.file_type().is_file() {
            continue;
        }

        let path = dirent.path();
        let metadata =
            fs::symlink_metadata(&path).map_err(|err| RetentionError::io(&path, err))?;
        let age = age_from_metadata(&path, &metadata, age_type)?;

        result = Some(match (result, which) {
            (None, _) => age,
            (Some(current), Extremum::Newest) => current.max(age),
            (Some(current), Extremum::Oldest) => current.min(age),
        });
    }

    Ok(result)
}

/// Resolve `path=<p>` inside the folder and take that file's timestamp.
///
/// The resolved path must be a regular file strictly inside the folder
/// after canonicalisation.
fn pinned_file_age(
    folder: &Path,
    relative: &Path,
    age_type: AgeType,
) -> Result<DateTime<Local>, RetentionError> {
    let folder_resolved = folder
        .canonicalize()
        .map_err(|err| RetentionError::io(folder, err))?;

    let candidate = folder.join(relative);
    let resolved = candidate.canonicalize().map_err(|_| {
        RetentionError::config(format!(
            "Invalid folder time source 'path={}': no such file in folder '{}'",
            relative.display(),
            folder.display()
        ))
    })?;

    if !resolved.starts_with(&folder_resolved) || resolved == folder_resolved {
        return Err(RetentionError::config(format!(
            "Invalid folder time source 'path={}': resolves outside folder '{}'",
            relative.display(),
            folder.display()
        )));
    }

    let metadata =
        fs::symlink_metadata(&resolved).map_err(|err| RetentionError::io(&resolved, err))?;
    if !metadata.is_file() {
        return Err(RetentionError::config(format!(
            "Invalid folder time source 'path={}': not a regular file",
            relative.display()
        )));
    }

    age_from_metadata(&resolved, &metadata, age_type)
}
