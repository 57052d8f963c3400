//! Leveled console output.
//!
//! The decision log and all diagnostics go to stderr so that stdout stays
//! reserved for `--list-only` output. Rendering is deterministic for a
//! frozen entry list.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Verbosity level, ordered from quietest to loudest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum LogLevel {
    /// Errors only.
    #[default]
    Error,
    /// Errors and warnings.
    Warn,
    /// Decision log, summaries, warnings, errors.
    Info,
    /// Everything, including bucket-level detail.
    Debug,
}

impl LogLevel {
    /// All levels, quietest first.
    pub const ALL: [LogLevel; 4] = [Self::Error, Self::Warn, Self::Info, Self::Debug];

    /// Short name as accepted on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Error => "ERROR",
            Self::Warn => "WARN",
            Self::Info => "INFO",
            Self::Debug => "DEBUG",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    /// Accepts numeric (`0`..`3`) and symbolic (`ERROR`..`DEBUG`) spellings,
    /// case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "0" | "ERROR" => Ok(Self::Error),
            "1" | "WARN" => Ok(Self::Warn),
            "2" | "INFO" => Ok(Self::Info),
            "3" | "DEBUG" => Ok(Self::Debug),
            other => Err(format!(
                "Invalid verbosity '{other}': expected 0-3 or ERROR, WARN, INFO, DEBUG"
            )),
        }
    }
}

/// Stderr writer gated by a [`LogLevel`].
#[derive(Debug, Clone, Copy)]
pub struct Console {
    level: LogLevel,
}

impl Console {
    /// Create a console that emits messages up to `level`.
    pub fn new(level: LogLevel) -> Self {
        Self { level }
    }

    /// The configured level.
    pub fn level(&self) -> LogLevel {
        self.level
    }

    /// Whether messages at `level` would be emitted.
    pub fn enabled(&self, level: LogLevel) -> bool {
        level <= self.level
    }

    pub fn error(&self, message: impl AsRef<str>) {
        eprintln!("[ERROR] {}", message.as_ref());
    }

    pub fn warn(&self, message: impl AsRef<str>) {
        if self.enabled(LogLevel::Warn) {
            eprintln!("[WARN] {}", message.as_ref());
        }
    }

    pub fn info(&self, message: impl AsRef<str>) {
        if self.enabled(LogLevel::Info) {
            eprintln!("{}", message.as_ref());
        }
    }

    pub fn debug(&self, message: impl AsRef<str>) {
        if self.enabled(LogLevel::Debug) {
            eprintln!("{}", message.as_ref());
        }
    }
}
