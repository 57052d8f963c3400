//! Basename pattern matching.

use regex::RegexBuilder;

use retentions_core::{PatternMode, RetentionError};

/// A compiled name pattern: shell-style glob or extended regex.
#[derive(Debug, Clone)]
pub enum NamePattern {
    Glob(glob::Pattern),
    Regex(regex::Regex),
}

impl NamePattern {
    /// Compile a pattern for the given mode.
    ///
    /// Glob patterns must not contain path separators: only direct children
    /// of the base directory are ever considered.
    pub fn new(pattern: &str, mode: PatternMode) -> Result<Self, RetentionError> {
        match mode {
            PatternMode::Glob => {
                if pattern.contains('/') || pattern.contains('\\') {
                    return Err(RetentionError::config(format!(
                        "Invalid glob pattern '{pattern}': must not contain path separators (only direct children are scanned)"
                    )));
                }
                glob::Pattern::new(pattern)
                    .map(Self::Glob)
                    .map_err(|err| {
                        RetentionError::config(format!("Invalid glob pattern '{pattern}': {err}"))
                    })
            }
            PatternMode::RegexCaseSensitive | PatternMode::RegexIgnoreCase => {
                // Anchored at the start of the basename, like a match (not a
                // search) against the name.
                RegexBuilder::new(&format!("^(?:{pattern})"))
                    .case_insensitive(mode == PatternMode::RegexIgnoreCase)
                    .build()
                    .map(Self::Regex)
                    .map_err(|err| {
                        RetentionError::config(format!("Invalid regex pattern '{pattern}': {err}"))
                    })
            }
        }
    }

    /// Whether the basename matches.
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Self::Glob(pattern) => pattern.matches(name),
            Self::Regex(regex) => regex.is_match(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glob_matches_full_basename() {
        let pattern = NamePattern::new("*.tar.gz", PatternMode::Glob).unwrap();
        assert!(pattern.matches("backup-2026-01-31.tar.gz"));
        assert!(!pattern.matches("backup.tar"));
    }

    #[test]
    fn test_glob_character_classes() {
        let pattern = NamePattern::new("db-[0-9]?.dump", PatternMode::Glob).unwrap();
        assert!(pattern.matches("db-01.dump"));
        assert!(!pattern.matches("db-ab.dump"));
    }

    #[test]
    fn test_glob_rejects_path_separators() {
        assert!(NamePattern::new("**/*", PatternMode::Glob).is_err());
        assert!(NamePattern::new("sub/file.txt", PatternMode::Glob).is_err());
    }

    #[test]
    fn test_glob_rejects_invalid_pattern() {
        assert!(NamePattern::new("[invalid", PatternMode::Glob).is_err());
    }

    #[test]
    fn test_regex_is_anchored_at_start() {
        let pattern =
            NamePattern::new(r"report[0-9]+\.txt$", PatternMode::RegexCaseSensitive).unwrap();
        assert!(pattern.matches("report1.txt"));
        assert!(!pattern.matches("old-report1.txt"));
    }

    #[test]
    fn test_regex_case_modes() {
        let sensitive =
            NamePattern::new(r"backup\.tar", PatternMode::RegexCaseSensitive).unwrap();
        assert!(!sensitive.matches("BACKUP.tar"));

        let insensitive =
            NamePattern::new(r"backup\.tar", PatternMode::RegexIgnoreCase).unwrap();
        assert!(insensitive.matches("BACKUP.tar"));
    }

    #[test]
    fn test_regex_rejects_invalid_pattern() {
        assert!(NamePattern::new("[invalid", PatternMode::RegexCaseSensitive).is_err());
    }
}
