//! Filters over the retained set.
//!
//! Filters only ever demote retained entries to pruned; they never promote
//! and never touch protected entries. Order is fixed: max-age, max-files,
//! max-size.

use chrono::{DateTime, Local, TimeDelta};

use retentions_core::{Decision, DecisionEvent, Entry, Reason, RuleSet};

/// Apply the configured filters to the retained set.
///
/// `entries` must be sorted newest first; `now` is the pipeline start
/// instant captured once per run.
pub fn apply_filters(entries: &mut [Entry], rules: &RuleSet, now: DateTime<Local>) {
    if let Some(max_age) = rules.max_age {
        let delta = TimeDelta::from_std(max_age).unwrap_or(TimeDelta::MAX);
        let cutoff = now - delta;
        for entry in entries.iter_mut() {
            if entry.is_retained() && entry.age_instant < cutoff {
                demote(entry, Reason::MaxAge { cutoff });
            }
        }
    }

    if let Some(max_files) = rules.max_files {
        let retained = entries.iter().filter(|e| e.is_retained()).count() as u64;
        if retained > max_files {
            let mut excess = retained - max_files;
            // Entries are (age desc, path asc); walking backwards demotes
            // oldest first with byte-lexicographic ties resolved.
            for entry in entries.iter_mut().rev() {
                if excess == 0 {
                    break;
                }
                if entry.is_retained() {
                    demote(entry, Reason::MaxFiles { limit: max_files });
                    excess -= 1;
                }
            }
        }
    }

    if let Some(max_size) = rules.max_size {
        let mut cumulative: u64 = 0;
        let mut exceeded = false;
        for entry in entries.iter_mut() {
            if !entry.is_retained() {
                continue;
            }
            if !exceeded {
                cumulative = cumulative.saturating_add(entry.size);
                exceeded = cumulative > max_size;
            }
            if exceeded {
                demote(entry, Reason::MaxSize { limit: max_size });
            }
        }
    }
}

fn demote(entry: &mut Entry, to: Reason) {
    let from = match &entry.decision {
        Some(Decision::Retained(reason)) => reason.clone(),
        _ => Reason::OutsideRetention,
    };
    entry.decide(
        Decision::Pruned(to.clone()),
        DecisionEvent::Demoted { from, to },
    );
}
