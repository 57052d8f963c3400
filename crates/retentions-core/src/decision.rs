//! Decisions and the per-entry decision log.
//!
//! Events are tagged variants carrying enough data to regenerate their
//! rendered message at any verbosity.

use chrono::{DateTime, Local};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::bucket::{BucketKey, Granularity};
use crate::units::format_size;

/// Final state of an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    /// Matched the protect pattern; excluded from all decision logic.
    Protected,
    /// Survives the run.
    Retained(Reason),
    /// Deleted (or listed/simulated).
    Pruned(Reason),
}

/// Why an entry is retained or pruned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reason {
    /// Selected as the representative of a calendar bucket.
    Bucket {
        granularity: Granularity,
        key: BucketKey,
        /// 1-based position among the buckets selected for this granularity.
        index: u32,
        count: u32,
    },
    /// One of the globally newest N entries.
    Last { index: u32, count: u32 },
    /// Not selected by any retention rule.
    OutsideRetention,
    /// Demoted: older than the absolute age cutoff.
    MaxAge { cutoff: DateTime<Local> },
    /// Demoted: the retained set exceeded the file-count limit.
    MaxFiles { limit: u64 },
    /// Demoted: cumulative retained size exceeded the limit.
    MaxSize { limit: u64 },
}

impl Reason {
    /// Compact token used in demotion messages, e.g. `days[2026-01-31]`.
    pub fn token(&self) -> String {
        match self {
            Self::Bucket {
                granularity, key, ..
            } => format!("{granularity}[{key}]"),
            Self::Last { index, count } => format!("last[{index}/{count}]"),
            Self::OutsideRetention => "outside-retention".to_string(),
            Self::MaxAge { .. } => "max-age".to_string(),
            Self::MaxFiles { .. } => "max-files".to_string(),
            Self::MaxSize { .. } => "max-size".to_string(),
        }
    }

    fn filter_message(&self) -> String {
        match self {
            Self::MaxAge { cutoff } => format!(
                "max total age exceeded (cutoff {})",
                cutoff.format(TIMESTAMP_FORMAT)
            ),
            Self::MaxFiles { limit } => {
                format!("max total count of files exceeded (limit {limit})")
            }
            Self::MaxSize { limit } => {
                format!("max total size exceeded (limit {})", format_size(*limit))
            }
            _ => self.token(),
        }
    }
}

/// One event in an entry's decision log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecisionEvent {
    /// Matched the protect pattern.
    Protected { pattern: String },
    /// Marked retained.
    Retained { reason: Reason },
    /// Marked pruned without ever being retained.
    Pruned { reason: Reason },
    /// Demoted from retained to pruned by a filter.
    Demoted { from: Reason, to: Reason },
    /// A companion file was pulled into the prune set alongside this entry.
    CompanionQueued {
        companion: CompactString,
        rule: String,
    },
}

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

impl DecisionEvent {
    /// Render the human-readable log line for this event.
    pub fn render(&self, name: &str, noun: &str, age: DateTime<Local>) -> String {
        let ts = age.format(TIMESTAMP_FORMAT);
        match self {
            Self::Protected { pattern } => {
                format!("Protecting {noun} '{name}': matches protect pattern '{pattern}'")
            }
            Self::Retained {
                reason:
                    Reason::Bucket {
                        granularity,
                        key,
                        index,
                        count,
                    },
            } => format!(
                "Keeping {noun} '{name}': {granularity} {index}/{count} (key: {key}, age: {ts})"
            ),
            Self::Retained {
                reason: Reason::Last { index, count },
            } => format!("Keeping {noun} '{name}': last {index}/{count} (age: {ts})"),
            Self::Retained { reason } => {
                format!("Keeping {noun} '{name}': {} (age: {ts})", reason.token())
            }
            Self::Pruned { reason } => match reason {
                Reason::OutsideRetention => format!(
                    "Pruning {noun} '{name}': not matched by any retention rule (age: {ts})"
                ),
                other => format!("Pruning {noun} '{name}': {} (age: {ts})", other.token()),
            },
            Self::Demoted { from, to } => format!(
                "Filtering {noun} '{name}': {} (was {})",
                to.filter_message(),
                from.token()
            ),
            Self::CompanionQueued { companion, rule } => {
                format!("Deleting companion '{companion}' of '{name}' (rule {rule})")
            }
        }
    }
}
