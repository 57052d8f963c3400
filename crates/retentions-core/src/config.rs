//! The validated rule set.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::bucket::Granularity;
use crate::companion::CompanionRule;
use crate::log::LogLevel;

/// Name of the advisory lock file created next to the scanned entries.
pub const LOCK_FILE_NAME: &str = ".retentions.lock";

/// How the name pattern (and the protect pattern) is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PatternMode {
    /// Shell-style wildcards, anchored to the full basename.
    #[default]
    Glob,
    /// Extended regular expression, case-sensitive.
    RegexCaseSensitive,
    /// Extended regular expression, case-insensitive.
    RegexIgnoreCase,
}

impl PatternMode {
    /// Short description for log messages.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Glob => "glob",
            Self::RegexCaseSensitive | Self::RegexIgnoreCase => "regex",
        }
    }
}

/// Which stat timestamp feeds the age of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AgeType {
    /// Modification time.
    #[default]
    Mtime,
    /// Change time on Unix; creation time elsewhere (platform-defined).
    Ctime,
    /// Access time. Support is checked, meaningfulness (e.g. under
    /// `noatime` mounts) is not.
    Atime,
    /// Birth/creation time where the filesystem records one.
    Birthtime,
}

impl AgeType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Mtime => "mtime",
            Self::Ctime => "ctime",
            Self::Atime => "atime",
            Self::Birthtime => "birthtime",
        }
    }
}

/// Where a folder's age comes from in folder mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FolderTimeSource {
    /// The directory's own stat.
    Folder,
    /// The newest descendant file.
    YoungestFile,
    /// The oldest descendant file.
    OldestFile,
    /// A named file that must resolve to inside the folder.
    Path(PathBuf),
}

impl FromStr for FolderTimeSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "folder" => Ok(Self::Folder),
            "youngest-file" => Ok(Self::YoungestFile),
            "oldest-file" => Ok(Self::OldestFile),
            other => match other.strip_prefix("path=") {
                Some(path) if !path.is_empty() => Ok(Self::Path(PathBuf::from(path))),
                _ => Err(format!(
                    "Invalid folder time source: {s}. Expected folder, youngest-file, oldest-file or path=<file>"
                )),
            },
        }
    }
}

/// One retention granularity with its bucket count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionRule {
    pub granularity: Granularity,
    /// Keep one representative for each of the newest `count` buckets.
    pub count: u32,
}

/// The validated configuration the pipeline consumes.
#[derive(Debug, Clone, Builder, Serialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct RuleSet {
    /// Absolute, link-resolved base directory.
    pub base: PathBuf,

    /// Name pattern for candidate entries.
    pub pattern: String,

    #[builder(default)]
    pub pattern_mode: PatternMode,

    /// Entries matching this pattern are excluded from all decision logic.
    #[builder(setter(into, strip_option), default)]
    pub protect: Option<String>,

    #[builder(default)]
    pub age_type: AgeType,

    /// Retention granularities; processed finest to coarsest regardless of
    /// the order given here.
    #[builder(default)]
    pub retention: Vec<RetentionRule>,

    /// Always keep the globally newest N entries.
    #[builder(setter(strip_option), default)]
    pub last: Option<u32>,

    /// Absolute age cutoff for retained entries.
    #[builder(setter(strip_option), default)]
    pub max_age: Option<Duration>,

    /// Upper bound on the number of retained entries.
    #[builder(setter(strip_option), default)]
    pub max_files: Option<u64>,

    /// Upper bound on the cumulative size of retained entries.
    #[builder(setter(strip_option), default)]
    pub max_size: Option<u64>,

    /// Operate on direct child directories instead of files.
    #[builder(setter(strip_option), default)]
    pub folder_mode: Option<FolderTimeSource>,

    /// Companion rules applied to the prune set.
    #[builder(default)]
    pub companions: Vec<CompanionRule>,

    /// Show planned actions without deleting.
    #[builder(default)]
    pub dry_run: bool,

    /// Emit prune paths to stdout with this separator; nothing else.
    #[builder(setter(into, strip_option), default)]
    pub list_only: Option<String>,

    /// Abort on the first failed deletion instead of warning.
    #[builder(default)]
    pub fail_on_delete_error: bool,

    /// Acquire the advisory lock (disabled by `--no-lock-file`).
    #[builder(default = "true")]
    pub use_lock_file: bool,

    #[builder(default)]
    pub verbosity: LogLevel,
}

impl RuleSet {
    /// Create a rule set builder.
    pub fn builder() -> RuleSetBuilder {
        RuleSetBuilder::default()
    }

    /// The noun used in log messages for this run's entries.
    pub fn entity_noun(&self) -> &'static str {
        if self.folder_mode.is_some() {
            "folder"
        } else {
            "file"
        }
    }

    /// Retention rules in processing order (finest granularity first).
    pub fn ordered_retention(&self) -> Vec<RetentionRule> {
        let mut rules = self.retention.clone();
        rules.sort_by_key(|rule| rule.granularity);
        rules
    }
}

impl RuleSetBuilder {
    fn validate(&self) -> Result<(), String> {
        let has_rules = self
            .retention
            .as_ref()
            .is_some_and(|rules| !rules.is_empty());
        let has_last = matches!(self.last, Some(Some(_)));
        if !has_rules && !has_last {
            return Err(
                "No retention rule given: specify at least one granularity or --last".to_string(),
            );
        }

        if let Some(rules) = &self.retention {
            for rule in rules {
                if rule.count == 0 {
                    return Err(format!(
                        "Invalid count for --{}: must be an integer > 0",
                        rule.granularity
                    ));
                }
            }
        }
        if matches!(self.last, Some(Some(0))) {
            return Err("Invalid count for --last: must be an integer > 0".to_string());
        }
        if matches!(self.max_files, Some(Some(0))) {
            return Err("Invalid value for --max-files: must be an integer > 0".to_string());
        }
        if matches!(self.max_size, Some(Some(0))) {
            return Err("Invalid value for --max-size: must be > 0".to_string());
        }
        if matches!(self.max_age, Some(Some(age)) if age.is_zero()) {
            return Err("Invalid value for --max-age: must be > 0".to_string());
        }

        let has_companions = self
            .companions
            .as_ref()
            .is_some_and(|rules| !rules.is_empty());
        let list_only = matches!(self.list_only, Some(Some(_)));

        if list_only {
            if matches!(self.verbosity, Some(level) if level >= LogLevel::Info) {
                return Err(
                    "--list-only and --verbose (INFO or above) cannot be used together"
                        .to_string(),
                );
            }
            if has_companions {
                return Err(
                    "--list-only and --delete-companions must not be combined, because list-only output does not distinguish companions"
                        .to_string(),
                );
            }
        }

        if matches!(self.folder_mode, Some(Some(_))) && has_companions {
            return Err("--folder-mode and --delete-companions must not be combined".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_builder() -> RuleSetBuilder {
        let mut builder = RuleSet::builder();
        builder.base("/data/backups").pattern("*.tar.gz");
        builder
    }

    #[test]
    fn test_builder_minimal() {
        let rules = base_builder().last(3u32).build().unwrap();
        assert_eq!(rules.last, Some(3));
        assert!(rules.use_lock_file);
        assert_eq!(rules.verbosity, LogLevel::Error);
        assert_eq!(rules.entity_noun(), "file");
    }

    #[test]
    fn test_builder_requires_some_rule() {
        let err = base_builder().build().unwrap_err().to_string();
        assert!(err.contains("at least one granularity"));
    }

    #[test]
    fn test_builder_rejects_zero_counts() {
        let err = base_builder()
            .retention(vec![RetentionRule {
                granularity: Granularity::Days,
                count: 0,
            }])
            .build()
            .unwrap_err()
            .to_string();
        assert!(err.contains("--days"));
        assert!(err.contains("> 0"));

        assert!(base_builder().last(0u32).build().is_err());
        assert!(base_builder().last(1u32).max_files(0u64).build().is_err());
        assert!(base_builder().last(1u32).max_size(0u64).build().is_err());
    }

    #[test]
    fn test_builder_rejects_list_only_with_verbose() {
        let err = base_builder()
            .last(1u32)
            .list_only("\n")
            .verbosity(LogLevel::Info)
            .build()
            .unwrap_err()
            .to_string();
        assert!(err.contains("--list-only and --verbose"));

        // WARN is fine.
        assert!(base_builder()
            .last(1u32)
            .list_only("\n")
            .verbosity(LogLevel::Warn)
            .build()
            .is_ok());
    }

    #[test]
    fn test_builder_rejects_companions_with_list_only_or_folder_mode() {
        let companion: CompanionRule = "suffix:.tar:.md5".parse().unwrap();

        let err = base_builder()
            .last(1u32)
            .list_only("\n")
            .companions(vec![companion.clone()])
            .build()
            .unwrap_err()
            .to_string();
        assert!(err.contains("--list-only and --delete-companions"));

        let err = base_builder()
            .last(1u32)
            .folder_mode(FolderTimeSource::YoungestFile)
            .companions(vec![companion])
            .build()
            .unwrap_err()
            .to_string();
        assert!(err.contains("--folder-mode and --delete-companions"));
    }

    #[test]
    fn test_ordered_retention_sorts_finest_first() {
        let rules = base_builder()
            .retention(vec![
                RetentionRule {
                    granularity: Granularity::Months,
                    count: 1,
                },
                RetentionRule {
                    granularity: Granularity::Days,
                    count: 7,
                },
                RetentionRule {
                    granularity: Granularity::Weeks,
                    count: 4,
                },
            ])
            .build()
            .unwrap();

        let order: Vec<_> = rules
            .ordered_retention()
            .iter()
            .map(|r| r.granularity)
            .collect();
        assert_eq!(
            order,
            [Granularity::Days, Granularity::Weeks, Granularity::Months]
        );
    }

    #[test]
    fn test_folder_time_source_parsing() {
        assert_eq!(
            "folder".parse::<FolderTimeSource>().unwrap(),
            FolderTimeSource::Folder
        );
        assert_eq!(
            "youngest-file".parse::<FolderTimeSource>().unwrap(),
            FolderTimeSource::YoungestFile
        );
        assert_eq!(
            "oldest-file".parse::<FolderTimeSource>().unwrap(),
            FolderTimeSource::OldestFile
        );
        assert_eq!(
            "path=current/state.json".parse::<FolderTimeSource>().unwrap(),
            FolderTimeSource::Path(PathBuf::from("current/state.json"))
        );
        assert!("foobar".parse::<FolderTimeSource>().is_err());
        assert!("path=".parse::<FolderTimeSource>().is_err());
    }
}
