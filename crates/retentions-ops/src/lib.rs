//! Lock guard and execution for the retentions pipeline.
//!
//! The only crate that mutates the filesystem. Deletion runs strictly
//! after the integrity gate; the lock guard brackets the whole run.

mod execute;
mod lock;

pub use execute::{execute, render_list, ExecutionOutcome};
pub use lock::LockGuard;
