use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::{FocusRecord, SessionMode, SessionStatus, Timer};

/// Every state change in the machine produces an Event. The CLI prints
/// them as JSON; completion hooks react to `SessionCompleted`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionStarted {
        session_id: String,
        mode: SessionMode,
        duration_min: u32,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    SessionScheduled {
        session_id: String,
        duration_min: u32,
        start_at: DateTime<Utc>,
        at: DateTime<Utc>,
    },
    SessionPaused {
        session_id: String,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    SessionResumed {
        session_id: String,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// Running or paused session stopped by the user. Nothing is recorded.
    SessionStopped {
        session_id: String,
        at: DateTime<Utc>,
    },
    /// Pending session cancelled before its start instant.
    SessionCancelled {
        session_id: String,
        at: DateTime<Utc>,
    },
    /// Countdown reached zero. Carries the record to persist.
    SessionCompleted {
        record: FocusRecord,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        session_id: Option<String>,
        session_status: Option<SessionStatus>,
        timer: Timer,
        scheduled_at: Option<DateTime<Utc>>,
        at: DateTime<Utc>,
    },
}
