//! Discovery for the retentions pipeline.
//!
//! Enumerates the direct children of the base directory that match the
//! configured pattern and derives each entry's age, producing the sorted
//! entry list the policy passes consume.

mod discovery;
mod folder_time;
mod pattern;

pub use discovery::{check_age_type_support, discover};
pub use folder_time::folder_age;
pub use pattern::NamePattern;
