use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

use tempfile::TempDir;

use retentions_core::{
    Console, FolderTimeSource, LogLevel, PatternMode, RetentionError, RuleSet, RuleSetBuilder,
};
use retentions_scan::{discover, folder_age};

fn quiet() -> Console {
    Console::new(LogLevel::Error)
}

fn write_file(dir: &Path, name: &str, secs_ago: u64) {
    let path = dir.join(name);
    fs::write(&path, name).unwrap();
    let mtime = SystemTime::now() - Duration::from_secs(secs_ago);
    fs::OpenOptions::new()
        .write(true)
        .open(&path)
        .unwrap()
        .set_modified(mtime)
        .unwrap();
}

fn rules_for(dir: &Path, pattern: &str) -> RuleSetBuilder {
    let mut builder = RuleSet::builder();
    builder.base(dir).pattern(pattern).last(1u32);
    builder
}

#[test]
fn test_glob_discovery_sorted_newest_first() {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "old.log", 3600);
    write_file(temp.path(), "new.log", 60);
    write_file(temp.path(), "mid.log", 600);
    write_file(temp.path(), "other.txt", 10);

    let rules = rules_for(temp.path(), "*.log").build().unwrap();
    let entries = discover(&rules, &quiet()).unwrap();

    let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["new.log", "mid.log", "old.log"]);
    assert!(entries.iter().all(|e| e.kind.is_file()));
    assert!(entries.iter().all(|e| e.size > 0));
}

#[test]
fn test_lock_file_is_never_a_candidate() {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "a.log", 60);
    write_file(temp.path(), ".retentions.lock", 1);

    let rules = rules_for(temp.path(), "*").build().unwrap();
    let entries = discover(&rules, &quiet()).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "a.log");
}

#[test]
fn test_regex_discovery() {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "report1.txt", 60);
    write_file(temp.path(), "report2.txt", 120);
    write_file(temp.path(), "data.dat", 10);

    let rules = rules_for(temp.path(), r"report[0-9]+\.txt$")
        .pattern_mode(PatternMode::RegexCaseSensitive)
        .build()
        .unwrap();
    let entries = discover(&rules, &quiet()).unwrap();
    let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["report1.txt", "report2.txt"]);
}

#[test]
fn test_no_matches_is_empty_not_an_error() {
    let temp = TempDir::new().unwrap();
    let rules = rules_for(temp.path(), "*.doesnotexist").build().unwrap();
    let entries = discover(&rules, &quiet()).unwrap();
    assert!(entries.is_empty());
}

#[test]
fn test_unreadable_base_is_io_error() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("nonexistent");
    let rules = rules_for(&missing, "*").build().unwrap();
    let err = discover(&rules, &quiet()).unwrap_err();
    assert!(matches!(err, RetentionError::Io { .. }));
}

#[cfg(unix)]
#[test]
fn test_symlinked_files_are_skipped() {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "real.txt", 60);
    std::os::unix::fs::symlink(temp.path().join("real.txt"), temp.path().join("link.txt"))
        .unwrap();

    let rules = rules_for(temp.path(), "*").build().unwrap();
    let entries = discover(&rules, &quiet()).unwrap();
    let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["real.txt"]);
}

#[test]
fn test_folder_mode_lists_top_level_directories_only() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("folder1/sub")).unwrap();
    fs::create_dir(temp.path().join("folder2")).unwrap();
    write_file(&temp.path().join("folder1/sub"), "a.txt", 60);
    write_file(&temp.path().join("folder2"), "b.txt", 120);
    write_file(temp.path(), "file.txt", 10);

    let rules = rules_for(temp.path(), "*")
        .folder_mode(FolderTimeSource::YoungestFile)
        .build()
        .unwrap();
    let entries = discover(&rules, &quiet()).unwrap();

    let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["folder1", "folder2"]);
    assert!(entries.iter().all(|e| e.size == 0));
}

#[test]
fn test_folder_mode_omits_empty_folders_for_youngest_file() {
    let temp = TempDir::new().unwrap();
    fs::create_dir(temp.path().join("blank")).unwrap();
    fs::create_dir(temp.path().join("full")).unwrap();
    write_file(&temp.path().join("full"), "file.txt", 60);

    let rules = rules_for(temp.path(), "*")
        .folder_mode(FolderTimeSource::YoungestFile)
        .build()
        .unwrap();
    let entries = discover(&rules, &quiet()).unwrap();
    let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["full"]);
}

#[test]
fn test_folder_mode_folder_source_accepts_empty_folders() {
    let temp = TempDir::new().unwrap();
    fs::create_dir(temp.path().join("blank")).unwrap();

    let rules = rules_for(temp.path(), "*")
        .folder_mode(FolderTimeSource::Folder)
        .build()
        .unwrap();
    let entries = discover(&rules, &quiet()).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "blank");
}

#[test]
fn test_youngest_and_oldest_file_reductions() {
    let temp = TempDir::new().unwrap();
    let folder = temp.path().join("snapshots");
    fs::create_dir_all(folder.join("deep/deeper")).unwrap();
    write_file(&folder, "young.txt", 100);
    write_file(&folder.join("deep/deeper"), "old.txt", 100_000);

    let young = folder_age(
        &folder,
        &FolderTimeSource::YoungestFile,
        retentions_core::AgeType::Mtime,
    )
    .unwrap()
    .unwrap();
    let old = folder_age(
        &folder,
        &FolderTimeSource::OldestFile,
        retentions_core::AgeType::Mtime,
    )
    .unwrap()
    .unwrap();

    assert!(young > old);
}

#[test]
fn test_folder_mode_pinned_path() {
    let temp = TempDir::new().unwrap();
    let folder = temp.path().join("snap");
    fs::create_dir_all(folder.join("state")).unwrap();
    write_file(&folder.join("state"), "manifest.json", 500);
    write_file(&folder, "noise.txt", 5);

    let rules = rules_for(temp.path(), "*")
        .folder_mode(FolderTimeSource::Path("state/manifest.json".into()))
        .build()
        .unwrap();
    let entries = discover(&rules, &quiet()).unwrap();
    assert_eq!(entries.len(), 1);

    // The age comes from the pinned file, not the newest file in the tree.
    let pinned = folder_age(
        &folder,
        &FolderTimeSource::Path("state/manifest.json".into()),
        retentions_core::AgeType::Mtime,
    )
    .unwrap()
    .unwrap();
    assert_eq!(entries[0].age_instant, pinned);
}

#[test]
fn test_folder_mode_pinned_path_missing_is_config_error() {
    let temp = TempDir::new().unwrap();
    fs::create_dir(temp.path().join("snap")).unwrap();

    let rules = rules_for(temp.path(), "*")
        .folder_mode(FolderTimeSource::Path("missing.json".into()))
        .build()
        .unwrap();
    let err = discover(&rules, &quiet()).unwrap_err();
    assert!(matches!(err, RetentionError::Config { .. }));
}

#[cfg(unix)]
#[test]
fn test_folder_mode_pinned_path_escaping_folder_is_config_error() {
    let temp = TempDir::new().unwrap();
    fs::create_dir(temp.path().join("snap")).unwrap();
    write_file(temp.path(), "outside.json", 60);

    let err = folder_age(
        &temp.path().join("snap"),
        &FolderTimeSource::Path("../outside.json".into()),
        retentions_core::AgeType::Mtime,
    )
    .unwrap_err();
    assert!(matches!(err, RetentionError::Config { .. }));
}
