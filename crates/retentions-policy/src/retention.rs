//! Protection and the hierarchical retention pass.

use std::collections::HashSet;

use retentions_core::{
    BucketKey, Console, Decision, DecisionEvent, Entry, Reason, RetentionRule,
};

use crate::range::ForbiddenRange;

/// Mark entries matching the protect pattern; they leave the working set.
pub fn apply_protection<F>(entries: &mut [Entry], pattern: &str, is_protected: F)
where
    F: Fn(&str) -> bool,
{
    for entry in entries.iter_mut() {
        if is_protected(&entry.name) {
            entry.decide(
                Decision::Protected,
                DecisionEvent::Protected {
                    pattern: pattern.to_string(),
                },
            );
        }
    }
}

/// Apply the hierarchical calendar rule and the `last` rule.
///
/// `entries` must be sorted newest first. Granularities are processed
/// finest to coarsest; each claims the calendar intervals of its selected
/// buckets, and a coarser granularity skips (without consuming its count)
/// any bucket whose interval intersects the claimed range. Afterwards the
/// globally newest `last` entries are retained, and everything still
/// undecided is tentatively pruned.
pub fn apply_retention(
    entries: &mut [Entry],
    rules: &[RetentionRule],
    last: Option<u32>,
    console: &Console,
) {
    let mut forbidden = ForbiddenRange::new();

    for rule in rules {
        let buckets = collect_buckets(entries, rule);
        let mut claimed = Vec::new();
        let mut selected: u32 = 0;

        for (key, newest_index) in buckets {
            if selected == rule.count {
                break;
            }
            let interval = key.interval();
            if forbidden.intersects(interval) {
                console.debug(format!(
                    "Skipping {} bucket {key}: already covered by a finer granularity",
                    rule.granularity
                ));
                continue;
            }

            selected += 1;
            claimed.push(interval);
            let reason = Reason::Bucket {
                granularity: rule.granularity,
                key,
                index: selected,
                count: rule.count,
            };
            entries[newest_index].decide(
                Decision::Retained(reason.clone()),
                DecisionEvent::Retained { reason },
            );
        }

        for interval in claimed {
            forbidden.insert(interval);
        }
    }

    if let Some(count) = last {
        let mut index: u32 = 0;
        for entry in entries.iter_mut() {
            if entry.is_protected() {
                continue;
            }
            if index == count {
                break;
            }
            index += 1;
            if entry.decision.is_none() {
                let reason = Reason::Last { index, count };
                entry.decide(
                    Decision::Retained(reason.clone()),
                    DecisionEvent::Retained { reason },
                );
            }
        }
    }

    for entry in entries.iter_mut() {
        if entry.decision.is_none() {
            entry.decide(
                Decision::Pruned(Reason::OutsideRetention),
                DecisionEvent::Pruned {
                    reason: Reason::OutsideRetention,
                },
            );
        }
    }
}

/// Group non-protected entries into buckets, newest bucket first.
///
/// Returns each bucket's key and the index of its newest entry. Entries are
/// sorted newest first, so first-seen order is newest-first for buckets as
/// well, and the first entry seen per bucket is its newest.
fn collect_buckets(entries: &[Entry], rule: &RetentionRule) -> Vec<(BucketKey, usize)> {
    let mut seen: HashSet<BucketKey> = HashSet::new();
    let mut buckets = Vec::new();

    for (index, entry) in entries.iter().enumerate() {
        if entry.is_protected() {
            continue;
        }
        let key = rule.granularity.key_of(entry.age_instant);
        if seen.insert(key) {
            buckets.push((key, index));
        }
    }

    buckets
}
