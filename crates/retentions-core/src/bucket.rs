//! Calendar buckets.
//!
//! A bucket identifies one calendar slot (an hour, a day, an ISO week, a
//! 13-week block, a month, a quarter, a year) in the host-local civil time
//! zone. Every slot has a half-open interval used by the hierarchical
//! retention rule to decide which coarser slots are still eligible.

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime, TimeDelta, Timelike, Weekday};
use serde::{Deserialize, Serialize};

/// Retention granularity, ordered finest to coarsest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Granularity {
    Minutes,
    Hours,
    Days,
    Weeks,
    Week13,
    Months,
    Quarters,
    Years,
}

impl Granularity {
    /// All granularities in processing order (finest first).
    pub const ALL: [Granularity; 8] = [
        Self::Minutes,
        Self::Hours,
        Self::Days,
        Self::Weeks,
        Self::Week13,
        Self::Months,
        Self::Quarters,
        Self::Years,
    ];

    /// The flag-style name used in decision log lines.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Minutes => "minutes",
            Self::Hours => "hours",
            Self::Days => "days",
            Self::Weeks => "weeks",
            Self::Week13 => "week13",
            Self::Months => "months",
            Self::Quarters => "quarters",
            Self::Years => "years",
        }
    }

    /// The bucket an instant falls into at this granularity.
    pub fn key_of(&self, instant: DateTime<Local>) -> BucketKey {
        let local = instant.naive_local();
        let date = local.date();
        match self {
            Self::Minutes => BucketKey::Minute {
                date,
                hour: local.hour(),
                minute: local.minute(),
            },
            Self::Hours => BucketKey::Hour {
                date,
                hour: local.hour(),
            },
            Self::Days => BucketKey::Day { date },
            Self::Weeks => {
                let iso = date.iso_week();
                BucketKey::Week {
                    year: iso.year(),
                    week: iso.week(),
                }
            }
            Self::Week13 => {
                let iso = date.iso_week();
                BucketKey::Week13 {
                    year: iso.year(),
                    block: (iso.week() - 1) / 13,
                }
            }
            Self::Months => BucketKey::Month {
                year: date.year(),
                month: date.month(),
            },
            Self::Quarters => BucketKey::Quarter {
                year: date.year(),
                quarter: (date.month() - 1) / 3 + 1,
            },
            Self::Years => BucketKey::Year { year: date.year() },
        }
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Identifies one calendar slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BucketKey {
    Minute { date: NaiveDate, hour: u32, minute: u32 },
    Hour { date: NaiveDate, hour: u32 },
    Day { date: NaiveDate },
    /// ISO week-numbering year and week.
    Week { year: i32, week: u32 },
    /// ISO year and zero-based 13-week block within it.
    Week13 { year: i32, block: u32 },
    Month { year: i32, month: u32 },
    Quarter { year: i32, quarter: u32 },
    Year { year: i32 },
}

impl BucketKey {
    /// The half-open local-time interval `[start, end)` this slot covers.
    pub fn interval(&self) -> (NaiveDateTime, NaiveDateTime) {
        match *self {
            Self::Minute { date, hour, minute } => {
                let start = at(date, hour, minute);
                (start, start + TimeDelta::minutes(1))
            }
            Self::Hour { date, hour } => {
                let start = at(date, hour, 0);
                (start, start + TimeDelta::hours(1))
            }
            Self::Day { date } => {
                let start = at(date, 0, 0);
                (start, start + TimeDelta::days(1))
            }
            Self::Week { year, week } => {
                let start = at(iso_week_start(year, week), 0, 0);
                (start, start + TimeDelta::days(7))
            }
            Self::Week13 { year, block } => {
                let start = iso_week_start(year, block * 13 + 1);
                // A block may be cut short by the end of the ISO year.
                let end = NaiveDate::from_isoywd_opt(year, block * 13 + 14, Weekday::Mon)
                    .unwrap_or_else(|| iso_week_start(year + 1, 1));
                (at(start, 0, 0), at(end, 0, 0))
            }
            Self::Month { year, month } => {
                let start = first_of(year, month);
                let end = if month == 12 {
                    first_of(year + 1, 1)
                } else {
                    first_of(year, month + 1)
                };
                (at(start, 0, 0), at(end, 0, 0))
            }
            Self::Quarter { year, quarter } => {
                let start_month = (quarter - 1) * 3 + 1;
                let start = first_of(year, start_month);
                let end = if quarter == 4 {
                    first_of(year + 1, 1)
                } else {
                    first_of(year, start_month + 3)
                };
                (at(start, 0, 0), at(end, 0, 0))
            }
            Self::Year { year } => (at(first_of(year, 1), 0, 0), at(first_of(year + 1, 1), 0, 0)),
        }
    }
}

impl std::fmt::Display for BucketKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::Minute { date, hour, minute } => {
                write!(f, "{}-{hour:02}-{minute:02}", date.format("%Y-%m-%d"))
            }
            Self::Hour { date, hour } => write!(f, "{}-{hour:02}", date.format("%Y-%m-%d")),
            Self::Day { date } => write!(f, "{}", date.format("%Y-%m-%d")),
            Self::Week { year, week } => write!(f, "{year}-W{week:02}"),
            Self::Week13 { year, block } => write!(f, "{year}-B{}", block + 1),
            Self::Month { year, month } => write!(f, "{year}-{month:02}"),
            Self::Quarter { year, quarter } => write!(f, "{year}-Q{quarter}"),
            Self::Year { year } => write!(f, "{year}"),
        }
    }
}

fn at(date: NaiveDate, hour: u32, minute: u32) -> NaiveDateTime {
    date.and_hms_opt(hour, minute, 0)
        .expect("in-range time of day")
}

fn first_of(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).expect("in-range calendar month")
}

fn iso_week_start(year: i32, week: u32) -> NaiveDate {
    NaiveDate::from_isoywd_opt(year, week, Weekday::Mon).expect("in-range ISO week")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn local(y: i32, m: u32, d: u32, h: u32) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(y, m, d, h, 30, 0)
            .single()
            .expect("unambiguous local time")
    }

    #[test]
    fn test_day_and_hour_keys() {
        let t = local(2026, 1, 31, 14);
        assert_eq!(
            Granularity::Days.key_of(t).to_string(),
            "2026-01-31"
        );
        assert_eq!(
            Granularity::Hours.key_of(t).to_string(),
            "2026-01-31-14"
        );
        assert_eq!(
            Granularity::Minutes.key_of(t).to_string(),
            "2026-01-31-14-30"
        );
    }

    #[test]
    fn test_iso_week_key_crosses_civil_year() {
        // 2026-01-01 falls in ISO week 2026-W01; 2027-01-01 in 2026-W53.
        let key = Granularity::Weeks.key_of(local(2026, 1, 24, 12));
        assert_eq!(key, BucketKey::Week { year: 2026, week: 4 });
        assert_eq!(key.to_string(), "2026-W04");

        let spillover = Granularity::Weeks.key_of(local(2027, 1, 1, 12));
        assert_eq!(
            spillover,
            BucketKey::Week {
                year: 2026,
                week: 53
            }
        );
    }

    #[test]
    fn test_week_interval_is_monday_to_monday() {
        let (start, end) = BucketKey::Week { year: 2026, week: 4 }.interval();
        assert_eq!(start.date(), NaiveDate::from_ymd_opt(2026, 1, 19).unwrap());
        assert_eq!(end.date(), NaiveDate::from_ymd_opt(2026, 1, 26).unwrap());
    }

    #[test]
    fn test_week13_blocks() {
        assert_eq!(
            Granularity::Week13.key_of(local(2026, 1, 5, 0)),
            BucketKey::Week13 { year: 2026, block: 0 }
        );
        // Week 14 starts the second block.
        assert_eq!(
            Granularity::Week13.key_of(local(2026, 4, 1, 0)),
            BucketKey::Week13 { year: 2026, block: 1 }
        );

        let (start, end) = BucketKey::Week13 { year: 2026, block: 0 }.interval();
        assert_eq!(start.date(), NaiveDate::from_ymd_opt(2025, 12, 29).unwrap());
        assert_eq!(end.date(), NaiveDate::from_ymd_opt(2026, 3, 30).unwrap());
    }

    #[test]
    fn test_week13_final_block_clamps_to_iso_year_end() {
        // 2026 has 53 ISO weeks, so block 4 (week 53) ends at 2027-W01.
        let (start, end) = BucketKey::Week13 { year: 2026, block: 4 }.interval();
        assert_eq!(start.date(), NaiveDate::from_ymd_opt(2026, 12, 28).unwrap());
        assert_eq!(end.date(), NaiveDate::from_ymd_opt(2027, 1, 4).unwrap());
    }

    #[test]
    fn test_quarter_keys_and_intervals() {
        let key = Granularity::Quarters.key_of(local(2026, 5, 10, 0));
        assert_eq!(key, BucketKey::Quarter { year: 2026, quarter: 2 });
        let (start, end) = key.interval();
        assert_eq!(start.date(), NaiveDate::from_ymd_opt(2026, 4, 1).unwrap());
        assert_eq!(end.date(), NaiveDate::from_ymd_opt(2026, 7, 1).unwrap());

        let (_, q4_end) = BucketKey::Quarter { year: 2026, quarter: 4 }.interval();
        assert_eq!(q4_end.date(), NaiveDate::from_ymd_opt(2027, 1, 1).unwrap());
    }

    #[test]
    fn test_month_and_year_intervals() {
        let (start, end) = BucketKey::Month { year: 2026, month: 12 }.interval();
        assert_eq!(start.date(), NaiveDate::from_ymd_opt(2026, 12, 1).unwrap());
        assert_eq!(end.date(), NaiveDate::from_ymd_opt(2027, 1, 1).unwrap());

        let (start, end) = BucketKey::Year { year: 2026 }.interval();
        assert_eq!(start.date(), NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        assert_eq!(end.date(), NaiveDate::from_ymd_opt(2027, 1, 1).unwrap());
    }

    #[test]
    fn test_granularity_order_is_finest_first() {
        let mut sorted = Granularity::ALL;
        sorted.sort();
        assert_eq!(sorted, Granularity::ALL);
        assert!(Granularity::Days < Granularity::Weeks);
        assert!(Granularity::Weeks < Granularity::Week13);
        assert!(Granularity::Week13 < Granularity::Months);
    }
}
