//! Companion rules.
//!
//! A rule `TYPE:MATCH:COMPANIONS` relates a pruned file to sibling files
//! that are removed alongside it. `TYPE` is `prefix` or `suffix`, `MATCH`
//! is a possibly-empty literal, and `COMPANIONS` is a comma-separated list
//! of literal replacements.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RetentionError;

/// Which end of the basename the rule matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompanionKind {
    Prefix,
    Suffix,
}

/// A parsed companion rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanionRule {
    pub kind: CompanionKind,
    /// Literal to match; empty matches every basename.
    pub matcher: String,
    /// Literal replacements, one candidate per element.
    pub companions: Vec<String>,
    /// The rule as given on the command line, for log messages.
    pub raw: String,
}

impl CompanionRule {
    /// Whether this rule applies to the given basename.
    pub fn matches(&self, name: &str) -> bool {
        match self.kind {
            CompanionKind::Prefix => name.starts_with(&self.matcher),
            CompanionKind::Suffix => name.ends_with(&self.matcher),
        }
    }

    /// Candidate sibling basenames for a matching name.
    ///
    /// Callers must check [`CompanionRule::matches`] first.
    pub fn expand(&self, name: &str) -> Vec<String> {
        self.companions
            .iter()
            .map(|companion| match self.kind {
                CompanionKind::Prefix => {
                    format!("{companion}{}", &name[self.matcher.len()..])
                }
                CompanionKind::Suffix => {
                    format!("{}{companion}", &name[..name.len() - self.matcher.len()])
                }
            })
            .collect()
    }
}

impl FromStr for CompanionRule {
    type Err = RetentionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ':');
        let (kind, matcher, companions) = match (parts.next(), parts.next(), parts.next()) {
            (Some(kind), Some(matcher), Some(companions)) => (kind, matcher, companions),
            _ => {
                return Err(RetentionError::config(format!(
                    "Invalid companion rule '{s}': expected TYPE:MATCH:COMPANIONS"
                )))
            }
        };

        let kind = match kind {
            "prefix" => CompanionKind::Prefix,
            "suffix" => CompanionKind::Suffix,
            other => {
                return Err(RetentionError::config(format!(
                    "Invalid companion rule '{s}': unknown type '{other}' (expected prefix or suffix)"
                )))
            }
        };

        let companions: Vec<String> = companions.split(',').map(str::to_string).collect();
        if companions.iter().all(String::is_empty) {
            return Err(RetentionError::config(format!(
                "Invalid companion rule '{s}': no companions given"
            )));
        }

        Ok(Self {
            kind,
            matcher: matcher.to_string(),
            companions,
            raw: s.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(def: &str) -> CompanionRule {
        def.parse().unwrap()
    }

    #[test]
    fn test_parse_suffix_rule() {
        let r = rule("suffix:.tar:.md5,.info");
        assert_eq!(r.kind, CompanionKind::Suffix);
        assert_eq!(r.matcher, ".tar");
        assert_eq!(r.companions, [".md5", ".info"]);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!("suffix:.tar".parse::<CompanionRule>().is_err());
        assert!("infix:a:b".parse::<CompanionRule>().is_err());
        assert!("suffix:.tar:".parse::<CompanionRule>().is_err());
    }

    #[test]
    fn test_prefix_matching() {
        let r = rule("prefix:backup-:meta-");
        assert!(r.matches("backup-data.tar"));
        assert!(!r.matches("data-backup.tar"));
    }

    #[test]
    fn test_suffix_matching() {
        let r = rule("suffix:.tar:.md5");
        assert!(r.matches("archive.tar"));
        assert!(!r.matches("archive.zip"));
    }

    #[test]
    fn test_empty_match_is_always_true() {
        let r = rule("suffix::.bak");
        assert!(r.matches("whatever.txt"));
    }

    #[test]
    fn test_expand_prefix() {
        let r = rule("prefix:backup-:meta-");
        assert_eq!(r.expand("backup-data.tar"), ["meta-data.tar"]);
    }

    #[test]
    fn test_expand_suffix() {
        let r = rule("suffix:.tar:.md5,.info");
        assert_eq!(r.expand("archive.tar"), ["archive.md5", "archive.info"]);
    }

    #[test]
    fn test_expand_suffix_empty_match_appends() {
        let r = rule("suffix::.bak");
        assert_eq!(r.expand("file.txt"), ["file.txt.bak"]);
    }
}
