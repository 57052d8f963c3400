//! The forbidden range.
//!
//! Calendar intervals already claimed by finer retention granularities,
//! kept as a sorted set of half-open `[start, end)` intervals. A coarser
//! granularity may only select buckets whose interval does not intersect
//! this set.

use chrono::NaiveDateTime;

/// Sorted, merged set of half-open calendar intervals.
#[derive(Debug, Clone, Default)]
pub struct ForbiddenRange {
    intervals: Vec<(NaiveDateTime, NaiveDateTime)>,
}

impl ForbiddenRange {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Add an interval, merging with any it touches.
    pub fn insert(&mut self, interval: (NaiveDateTime, NaiveDateTime)) {
        let (mut start, mut end) = interval;
        debug_assert!(start <= end);

        let mut merged = Vec::with_capacity(self.intervals.len() + 1);
        for &(s, e) in &self.intervals {
            if e < start || end < s {
                merged.push((s, e));
            } else {
                start = start.min(s);
                end = end.max(e);
            }
        }
        let position = merged.partition_point(|&(s, _)| s < start);
        merged.insert(position, (start, end));
        self.intervals = merged;
    }

    /// Whether the half-open interval intersects any claimed interval.
    pub fn intersects(&self, interval: (NaiveDateTime, NaiveDateTime)) -> bool {
        let (start, end) = interval;
        self.intervals.iter().any(|&(s, e)| start < e && s < end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_empty_range_intersects_nothing() {
        let range = ForbiddenRange::new();
        assert!(range.is_empty());
        assert!(!range.intersects((day(1), day(31))));
    }

    #[test]
    fn test_intersection_is_half_open() {
        let mut range = ForbiddenRange::new();
        range.insert((day(10), day(12)));

        assert!(range.intersects((day(11), day(13))));
        assert!(range.intersects((day(9), day(11))));
        // Touching at the boundary is not an intersection.
        assert!(!range.intersects((day(12), day(14))));
        assert!(!range.intersects((day(8), day(10))));
    }

    #[test]
    fn test_insert_merges_overlapping_intervals() {
        let mut range = ForbiddenRange::new();
        range.insert((day(10), day(12)));
        range.insert((day(20), day(22)));
        range.insert((day(11), day(21)));

        // All three collapse into one span.
        assert!(range.intersects((day(15), day(16))));
        assert!(!range.intersects((day(22), day(23))));
        assert!(!range.intersects((day(9), day(10))));
    }
}
