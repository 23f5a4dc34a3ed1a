use chrono::{Local, NaiveDate, Utc};
use clap::Subcommand;
use focusmonitor_core::history::{self, DayStats};
use focusmonitor_core::storage::{RecordStore, SettingsStore};
use serde::Serialize;

#[derive(Subcommand)]
pub enum HistoryAction {
    /// Today's totals and goal progress
    Today,
    /// Grouped history, most recent day first
    List,
    /// Records completed in an inclusive date range
    Range {
        /// First day (YYYY-MM-DD)
        #[arg(long)]
        from: String,
        /// Last day (YYYY-MM-DD)
        #[arg(long)]
        to: String,
    },
}

#[derive(Serialize)]
struct TodayView {
    #[serde(flatten)]
    stats: DayStats,
    daily_goal_min: u32,
    goal_progress_pct: u32,
}

pub fn run(action: HistoryAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = RecordStore::open()?;

    match action {
        HistoryAction::Today => {
            let settings = SettingsStore::open()?.load()?;
            let records = store.list_all()?;
            let stats = history::stats_for_day(&records, Utc::now().date_naive());
            let view = TodayView {
                stats,
                daily_goal_min: settings.daily_goal_min,
                goal_progress_pct: history::goal_progress(stats, &settings),
            };
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        HistoryAction::List => {
            let records = store.list_all()?;
            if records.is_empty() {
                println!("no focus history yet");
                return Ok(());
            }
            let buckets = history::group_by_day(&records, Utc::now().date_naive());
            for bucket in buckets {
                println!("{}", bucket.label);
                for record in &bucket.records {
                    let when = record.date.with_timezone(&Local).format("%H:%M");
                    match &record.achievement {
                        Some(label) => println!(
                            "  {:>3} min focus  {when}  [{label}]",
                            record.actual_duration_min
                        ),
                        None => println!("  {:>3} min focus  {when}", record.actual_duration_min),
                    }
                }
            }
        }
        HistoryAction::Range { from, to } => {
            let from: NaiveDate = from.parse()?;
            let to: NaiveDate = to.parse()?;
            let start = from.and_time(chrono::NaiveTime::MIN).and_utc();
            let end_of_day = chrono::NaiveTime::from_hms_opt(23, 59, 59).ok_or("invalid time")?;
            let end = to.and_time(end_of_day).and_utc();
            let records = store.list_by_date_range(start, end)?;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
    }
    Ok(())
}
