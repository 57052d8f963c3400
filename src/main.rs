//! retentions - apply backup-style retention policy to a directory.
//!
//! Usage:
//!   retentions <path> <pattern> [options]
//!
//! Example:
//!   retentions /data/backups '*.tar.gz' -d 7 -w 4 -m 6
//!
//! Partitions the direct children of `<path>` matching `<pattern>` into
//! keep and prune sets, then deletes the prune set (or simulates with
//! --dry-run, or prints it with --list-only).

use std::path::PathBuf;

use chrono::Local;
use clap::{Parser, ValueEnum};

use retentions_core::{
    AgeType, CompanionRule, Console, FolderTimeSource, Granularity, LogLevel, PatternMode,
    RetentionError, RetentionRule, RuleSet,
};
use retentions_ops::{execute, LockGuard};
use retentions_policy::{
    apply_filters, apply_protection, apply_retention, expand_companions, verify,
};
use retentions_scan::{check_age_type_support, discover, NamePattern};

#[derive(Parser, Debug)]
#[command(
    name = "retentions",
    version,
    // -V belongs to --verbose; --version stays long-only.
    disable_version_flag = true,
    about = "A minimal cross-platform CLI tool for file retention management",
    after_help = "Use with caution!! This tool deletes files unless --dry-run or --list-only is set."
)]
struct Cli {
    /// Base directory to scan
    path: PathBuf,

    /// Glob or regex pattern for matching entries (use quotes to prevent
    /// shell expansion)
    pattern: String,

    /// Keep one file per minute from the last N minutes
    #[arg(long, hide = true, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    minutes: Option<u32>,

    /// Keep one file per hour from the last N hours
    #[arg(short = 'H', long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    hours: Option<u32>,

    /// Keep one file per day from the last N days
    #[arg(short = 'd', long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    days: Option<u32>,

    /// Keep one file per ISO week from the last N weeks
    #[arg(short = 'w', long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    weeks: Option<u32>,

    /// Keep one file per 13-week block from the last N blocks
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    week13: Option<u32>,

    /// Keep one file per month from the last N months
    #[arg(short = 'm', long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    months: Option<u32>,

    /// Keep one file per quarter from the last N quarters
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    quarters: Option<u32>,

    /// Keep one file per year from the last N years
    #[arg(short = 'y', long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    years: Option<u32>,

    /// Always keep the N most recent files
    #[arg(short = 'l', long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    last: Option<u32>,

    /// Demote retained files older than this (e.g. 3d, 2w, 6m)
    #[arg(short = 'a', long, value_name = "DURATION")]
    max_age: Option<String>,

    /// Keep at most N files in total
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    max_files: Option<u64>,

    /// Keep at most this cumulative size (e.g. 500M, 2.5G)
    #[arg(short = 's', long, value_name = "SIZE")]
    max_size: Option<String>,

    /// Treat the pattern (and --protect) as a regex instead of a glob
    #[arg(long, value_enum, value_name = "MODE")]
    regex_mode: Option<RegexModeArg>,

    /// Stat timestamp used as the age of an entry
    #[arg(long, value_enum, value_name = "TYPE", default_value = "mtime")]
    age_type: AgeTypeArg,

    /// Never touch entries matching this pattern (same mode as the main
    /// pattern)
    #[arg(long, value_name = "PATTERN")]
    protect: Option<String>,

    /// Operate on direct child folders; optional time source: folder,
    /// youngest-file (default), oldest-file, path=<file>
    #[arg(long, value_name = "SOURCE", num_args = 0..=1, default_missing_value = "youngest-file")]
    folder_mode: Option<String>,

    /// Delete companion files of pruned files; rule: TYPE:MATCH:COMPANIONS
    /// (e.g. suffix:.tar:.md5,.info)
    #[arg(long, value_name = "RULE", num_args = 1..)]
    delete_companions: Vec<String>,

    /// Show planned actions but do not delete anything
    #[arg(short = 'X', long)]
    dry_run: bool,

    /// Print only the paths that would be deleted, separated by SEP
    /// (default newline; '\0' for NUL)
    #[arg(short = 'L', long, value_name = "SEP", num_args = 0..=1, default_missing_value = "\n")]
    list_only: Option<String>,

    /// Verbosity: 0-3 or ERROR, WARN, INFO, DEBUG (bare -V means INFO)
    #[arg(short = 'V', long, value_name = "LEVEL", num_args = 0..=1, default_missing_value = "INFO")]
    verbose: Option<String>,

    /// Skip the advisory lock file (concurrent runs become your problem)
    #[arg(long)]
    no_lock_file: bool,

    /// Abort on the first failed deletion instead of warning
    #[arg(long)]
    fail_on_delete_error: bool,

    /// Print version
    #[arg(long, action = clap::ArgAction::Version)]
    version: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum RegexModeArg {
    Casesensitive,
    Ignorecase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum AgeTypeArg {
    Mtime,
    Ctime,
    Atime,
    Birthtime,
}

impl From<AgeTypeArg> for AgeType {
    fn from(arg: AgeTypeArg) -> Self {
        match arg {
            AgeTypeArg::Mtime => Self::Mtime,
            AgeTypeArg::Ctime => Self::Ctime,
            AgeTypeArg::Atime => Self::Atime,
            AgeTypeArg::Birthtime => Self::Birthtime,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| run(cli)));
    let code = match result {
        Ok(Ok(())) => 0,
        Ok(Err(err)) => {
            eprintln!("[ERROR] {err}");
            err.exit_code()
        }
        Err(_) => {
            eprintln!("[ERROR] Unexpected internal error");
            9
        }
    };
    std::process::exit(code);
}

/// The pipeline: validate, lock, discover, partition, verify, expand,
/// execute. The lock guard releases on every exit path.
fn run(cli: Cli) -> Result<(), RetentionError> {
    let rules = build_rules(&cli)?;
    let console = Console::new(rules.verbosity);
    console.debug(format!("Parsed arguments: {rules:?}"));

    let _lock = if rules.use_lock_file {
        Some(LockGuard::acquire(&rules.base)?)
    } else {
        None
    };

    let now = Local::now();
    let mut entries = discover(&rules, &console)?;

    if let Some(protect) = rules.protect.clone() {
        let matcher = NamePattern::new(&protect, rules.pattern_mode)?;
        apply_protection(&mut entries, &protect, |name| matcher.matches(name));
    }

    apply_retention(
        &mut entries,
        &rules.ordered_retention(),
        rules.last,
        &console,
    );
    apply_filters(&mut entries, &rules, now);

    let partition = verify(&entries)?;

    let companions = if rules.companions.is_empty() {
        Vec::new()
    } else {
        let protect_matcher = rules
            .protect
            .as_ref()
            .map(|pattern| NamePattern::new(pattern, rules.pattern_mode))
            .transpose()?;
        expand_companions(&mut entries, &rules.companions, |name| {
            protect_matcher
                .as_ref()
                .is_some_and(|matcher| matcher.matches(name))
        })?
    };

    if rules.list_only.is_none() && console.enabled(LogLevel::Info) {
        for entry in &entries {
            for event in &entry.log {
                console.info(event.render(&entry.name, entry.kind.noun(), entry.age_instant));
            }
        }

        let noun = rules.entity_noun();
        console.info(format!("Total {noun}s found: {}", entries.len()));
        console.info(format!(
            "Total {noun}s protected: {}",
            partition.protected.len()
        ));
        console.info(format!("Total {noun}s to keep: {}", partition.retained.len()));
        console.info(format!("Total {noun}s to prune: {}", partition.pruned.len()));
        let companion_count: usize = companions.iter().map(|(_, paths)| paths.len()).sum();
        if companion_count > 0 {
            console.info(format!("Total companions to prune: {companion_count}"));
        }
    }

    execute(&entries, &companions, &rules, &console)?;
    Ok(())
}

/// Turn parsed arguments into the validated rule set.
fn build_rules(cli: &Cli) -> Result<RuleSet, RetentionError> {
    let base = cli
        .path
        .canonicalize()
        .map_err(|_| RetentionError::config(format!("Path not found: {}", cli.path.display())))?;
    if !base.is_dir() {
        return Err(RetentionError::config(format!(
            "Path is not a directory: {}",
            base.display()
        )));
    }

    let age_type: AgeType = cli.age_type.into();
    check_age_type_support(&base, age_type)?;

    let pattern_mode = match cli.regex_mode {
        None => PatternMode::Glob,
        Some(RegexModeArg::Casesensitive) => PatternMode::RegexCaseSensitive,
        Some(RegexModeArg::Ignorecase) => PatternMode::RegexIgnoreCase,
    };
    // Compile now so a bad pattern fails during validation, not discovery.
    NamePattern::new(&cli.pattern, pattern_mode)?;
    if let Some(protect) = &cli.protect {
        NamePattern::new(protect, pattern_mode)?;
    }

    let mut retention = Vec::new();
    for (granularity, flag) in [
        (Granularity::Minutes, cli.minutes),
        (Granularity::Hours, cli.hours),
        (Granularity::Days, cli.days),
        (Granularity::Weeks, cli.weeks),
        (Granularity::Week13, cli.week13),
        (Granularity::Months, cli.months),
        (Granularity::Quarters, cli.quarters),
        (Granularity::Years, cli.years),
    ] {
        if let Some(count) = flag {
            retention.push(RetentionRule { granularity, count });
        }
    }

    let max_age = cli
        .max_age
        .as_deref()
        .map(retentions_core::units::parse_duration)
        .transpose()
        .map_err(RetentionError::config)?;
    let max_size = cli
        .max_size
        .as_deref()
        .map(retentions_core::units::parse_size)
        .transpose()
        .map_err(RetentionError::config)?;

    let folder_mode = cli
        .folder_mode
        .as_deref()
        .map(str::parse::<FolderTimeSource>)
        .transpose()
        .map_err(RetentionError::config)?;

    let companions = cli
        .delete_companions
        .iter()
        .map(|rule| rule.parse::<CompanionRule>())
        .collect::<Result<Vec<_>, _>>()?;

    // '\0' on the command line means a NUL separator.
    let list_only = cli.list_only.clone().map(|separator| {
        if separator == "\\0" {
            "\0".to_string()
        } else {
            separator
        }
    });

    let mut verbosity = match cli.verbose.as_deref() {
        Some(level) => level.parse::<LogLevel>().map_err(RetentionError::config)?,
        None => LogLevel::Error,
    };
    // Dry runs are only useful if you can see the decisions.
    if cli.dry_run && list_only.is_none() && verbosity < LogLevel::Info {
        verbosity = LogLevel::Info;
    }

    let mut builder = RuleSet::builder();
    builder
        .base(base)
        .pattern(cli.pattern.clone())
        .pattern_mode(pattern_mode)
        .age_type(age_type)
        .retention(retention)
        .companions(companions)
        .dry_run(cli.dry_run)
        .fail_on_delete_error(cli.fail_on_delete_error)
        .use_lock_file(!cli.no_lock_file)
        .verbosity(verbosity);
    if let Some(protect) = cli.protect.clone() {
        builder.protect(protect);
    }
    if let Some(last) = cli.last {
        builder.last(last);
    }
    if let Some(max_age) = max_age {
        builder.max_age(max_age);
    }
    if let Some(max_files) = cli.max_files {
        builder.max_files(max_files);
    }
    if let Some(max_size) = max_size {
        builder.max_size(max_size);
    }
    if let Some(folder_mode) = folder_mode {
        builder.folder_mode(folder_mode);
    }
    if let Some(list_only) = list_only {
        builder.list_only(list_only);
    }

    builder
        .build()
        .map_err(|err| RetentionError::config(err.to_string()))
}
