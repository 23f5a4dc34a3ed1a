//! Session and record types.
//!
//! A [`Session`] is one focus attempt, either started on the spot or
//! scheduled for a future instant. Completed sessions leave behind an
//! immutable [`FocusRecord`]; stopped or cancelled sessions leave nothing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    Instant,
    Scheduled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Pending,
    Running,
    Paused,
    Completed,
    Cancelled,
}

/// One focus attempt. At most one session is live at any time; a session
/// that reaches `Completed` or `Cancelled` is dropped from live state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub mode: SessionMode,
    /// Requested focus length in minutes. Always positive.
    pub duration_min: u32,
    pub status: SessionStatus,
    /// Instant at which a pending session becomes eligible to run.
    /// Present iff `mode` is `Scheduled`.
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Create a running instant session.
    pub fn instant(duration_min: u32, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            mode: SessionMode::Instant,
            duration_min,
            status: SessionStatus::Running,
            scheduled_at: None,
            started_at: Some(now),
            ended_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a pending session that starts at `start_at`.
    pub fn scheduled(duration_min: u32, start_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            mode: SessionMode::Scheduled,
            duration_min,
            status: SessionStatus::Pending,
            scheduled_at: Some(start_at),
            started_at: None,
            ended_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Session duration in seconds.
    pub fn duration_secs(&self) -> u64 {
        u64::from(self.duration_min).saturating_mul(60)
    }
}

/// Permanent log entry for a completed session. Created exactly once, at
/// the instant the countdown reaches zero; never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FocusRecord {
    pub id: String,
    /// Back-reference to the session that produced this record.
    pub session_id: String,
    pub actual_duration_min: u32,
    /// Instant of completion.
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub achievement: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl FocusRecord {
    pub fn for_completed(session: &Session, completed_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            session_id: session.id.clone(),
            actual_duration_min: session.duration_min,
            date: completed_at,
            achievement: achievement_for(session.duration_min),
            created_at: completed_at,
        }
    }
}

/// Label tiers for a completed focus stretch.
fn achievement_for(duration_min: u32) -> Option<String> {
    match duration_min {
        60.. => Some("Flow State".into()),
        25..=59 => Some("Focus Master".into()),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerStatus {
    Idle,
    Running,
    Paused,
}

/// Countdown state, kept consistent with the live session: `running` and
/// `paused` mirror the session status, `idle` means no session or a
/// pending one that has not started yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timer {
    pub remaining_secs: u64,
    pub status: TimerStatus,
}

impl Timer {
    pub fn idle() -> Self {
        Self {
            remaining_secs: 0,
            status: TimerStatus::Idle,
        }
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::idle()
    }
}
