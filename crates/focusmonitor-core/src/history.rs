//! Derived statistics over the record log.
//!
//! Everything here is a pure function of a record slice -- the aggregator
//! keeps no state of its own. Calendar days are UTC days; callers pass
//! the reference day explicitly.

use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use crate::session::FocusRecord;
use crate::storage::UserSettings;

/// Totals for one calendar day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DayStats {
    pub total_min: u64,
    pub session_count: u64,
}

/// Sum of focus minutes and session count for records completed on `day`.
pub fn stats_for_day(records: &[FocusRecord], day: NaiveDate) -> DayStats {
    let mut stats = DayStats::default();
    for record in records {
        if record.date.date_naive() == day {
            stats.total_min += u64::from(record.actual_duration_min);
            stats.session_count += 1;
        }
    }
    stats
}

/// Percentage of the daily goal covered by `stats`, capped at 100.
pub fn goal_progress(stats: DayStats, settings: &UserSettings) -> u32 {
    if settings.daily_goal_min == 0 {
        return 100;
    }
    let pct = stats.total_min * 100 / u64::from(settings.daily_goal_min);
    pct.min(100) as u32
}

/// Display label for a day bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DayLabel {
    Today,
    Yesterday,
    Date(NaiveDate),
}

impl fmt::Display for DayLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DayLabel::Today => write!(f, "Today"),
            DayLabel::Yesterday => write!(f, "Yesterday"),
            DayLabel::Date(day) => write!(f, "{}", day.format("%b %-d, %Y")),
        }
    }
}

/// One calendar day's worth of records, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct DayBucket {
    pub label: DayLabel,
    pub day: NaiveDate,
    pub records: Vec<FocusRecord>,
}

/// Partition records into day buckets, most recent day first; within a
/// bucket, records are ordered by completion date descending. The bucket
/// containing `today` is labeled `Today`, the preceding day `Yesterday`,
/// all others by their literal date.
pub fn group_by_day(records: &[FocusRecord], today: NaiveDate) -> Vec<DayBucket> {
    let mut sorted: Vec<FocusRecord> = records.to_vec();
    sorted.sort_by(|a, b| b.date.cmp(&a.date));

    let mut buckets: Vec<DayBucket> = Vec::new();
    for record in sorted {
        let day = record.date.date_naive();
        match buckets.last_mut() {
            Some(bucket) if bucket.day == day => bucket.records.push(record),
            _ => buckets.push(DayBucket {
                label: label_for(day, today),
                day,
                records: vec![record],
            }),
        }
    }
    buckets
}

fn label_for(day: NaiveDate, today: NaiveDate) -> DayLabel {
    if day == today {
        DayLabel::Today
    } else if day.succ_opt() == Some(today) {
        DayLabel::Yesterday
    } else {
        DayLabel::Date(day)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};

    fn record_at(date: DateTime<Utc>, minutes: u32) -> FocusRecord {
        FocusRecord {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: uuid::Uuid::new_v4().to_string(),
            actual_duration_min: minutes,
            date,
            achievement: None,
            created_at: date,
        }
    }

    fn noon() -> DateTime<Utc> {
        "2026-03-10T12:00:00Z".parse().unwrap()
    }

    #[test]
    fn stats_sum_a_single_day() {
        let records = vec![
            record_at(noon(), 25),
            record_at(noon() + Duration::hours(2), 10),
            record_at(noon() - Duration::days(1), 60),
        ];
        let stats = stats_for_day(&records, noon().date_naive());
        assert_eq!(
            stats,
            DayStats {
                total_min: 35,
                session_count: 2
            }
        );
    }

    #[test]
    fn stats_for_empty_day_are_zero() {
        let stats = stats_for_day(&[], noon().date_naive());
        assert_eq!(stats, DayStats::default());
    }

    #[test]
    fn goal_progress_caps_at_hundred() {
        let settings = UserSettings::default(); // 120 min goal
        let half = DayStats {
            total_min: 60,
            session_count: 2,
        };
        assert_eq!(goal_progress(half, &settings), 50);
        let over = DayStats {
            total_min: 500,
            session_count: 9,
        };
        assert_eq!(goal_progress(over, &settings), 100);
    }

    #[test]
    fn today_then_yesterday_bucket_order() {
        let records = vec![
            record_at(noon() - Duration::days(1), 10),
            record_at(noon(), 25),
        ];
        let buckets = group_by_day(&records, noon().date_naive());
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].label, DayLabel::Today);
        assert_eq!(buckets[1].label, DayLabel::Yesterday);
    }

    #[test]
    fn older_days_get_literal_labels() {
        let old = noon() - Duration::days(30);
        let buckets = group_by_day(&[record_at(old, 25)], noon().date_naive());
        assert_eq!(buckets[0].label, DayLabel::Date(old.date_naive()));
        assert_eq!(buckets[0].label.to_string(), "Feb 8, 2026");
    }

    #[test]
    fn records_within_a_bucket_are_newest_first() {
        let records = vec![
            record_at(noon(), 10),
            record_at(noon() + Duration::hours(3), 25),
            record_at(noon() + Duration::hours(1), 45),
        ];
        let buckets = group_by_day(&records, noon().date_naive());
        assert_eq!(buckets.len(), 1);
        let minutes: Vec<u32> = buckets[0]
            .records
            .iter()
            .map(|r| r.actual_duration_min)
            .collect();
        assert_eq!(minutes, vec![25, 45, 10]);
    }

    #[test]
    fn label_display() {
        assert_eq!(DayLabel::Today.to_string(), "Today");
        assert_eq!(DayLabel::Yesterday.to_string(), "Yesterday");
    }
}
