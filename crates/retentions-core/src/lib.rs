//! Core types for the retentions pipeline.
//!
//! This crate provides the data model shared by the discovery, policy, and
//! execution crates: entries, calendar buckets, the validated rule set,
//! decisions with their per-entry log, and the error taxonomy.

mod bucket;
mod companion;
mod config;
mod decision;
mod entry;
mod error;
mod log;
pub mod units;

pub use bucket::{BucketKey, Granularity};
pub use companion::{CompanionKind, CompanionRule};
pub use config::{
    AgeType, FolderTimeSource, PatternMode, RetentionRule, RuleSet, RuleSetBuilder,
    LOCK_FILE_NAME,
};
pub use decision::{Decision, DecisionEvent, Reason};
pub use entry::{Entry, EntryKind};
pub use error::RetentionError;
pub use log::{Console, LogLevel};
