//! The session/timer state machine.
//!
//! All transitions run on one sequential control flow: every user action
//! and every 1-second tick is a [`Command`] handled by
//! [`FocusMachine::handle`]. The machine holds at most one live session;
//! completed and cancelled sessions are discarded immediately.
//!
//! ## States
//!
//! ```text
//! Empty -> Running -> (Paused <-> Running) -> Empty
//! Empty -> Pending -> Running -> ...
//! ```
//!
//! The caller drives the clock: `now` is an explicit parameter, so a test
//! can replay any timeline deterministically. Persistence of emitted
//! records is the caller's job -- `SessionCompleted` carries the record,
//! and the in-memory transition stands whether or not the append succeeds.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::events::Event;
use crate::session::{FocusRecord, Session, SessionStatus, Timer, TimerStatus};

/// The closed set of transition requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    StartInstant {
        duration_min: u32,
    },
    Schedule {
        duration_min: u32,
        start_at: DateTime<Utc>,
    },
    Pause,
    Resume,
    Stop,
    /// One-second advancement. Also polls a pending session's start
    /// instant.
    Tick,
}

/// Core state machine: at most one live [`Session`] plus its countdown.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FocusMachine {
    session: Option<Session>,
    timer: Timer,
    /// Instant of the last applied tick (or start/resume). Used by
    /// [`FocusMachine::catch_up`] to replay wall-clock time that passed
    /// while no process was driving the machine.
    #[serde(default)]
    last_tick: Option<DateTime<Utc>>,
}

impl FocusMachine {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn timer(&self) -> Timer {
        self.timer
    }

    /// No live session.
    pub fn is_empty(&self) -> bool {
        self.session.is_none()
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self, now: DateTime<Utc>) -> Event {
        Event::StateSnapshot {
            session_id: self.session.as_ref().map(|s| s.id.clone()),
            session_status: self.session.as_ref().map(|s| s.status),
            timer: self.timer,
            scheduled_at: self.session.as_ref().and_then(|s| s.scheduled_at),
            at: now,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Handle one transition request.
    ///
    /// Returns `Ok(Some(event))` when state changed, `Ok(None)` when the
    /// request was a no-op in the current state, and `Err` when the
    /// request was invalid (state unchanged).
    pub fn handle(
        &mut self,
        cmd: Command,
        now: DateTime<Utc>,
    ) -> Result<Option<Event>, SessionError> {
        match cmd {
            Command::StartInstant { duration_min } => {
                self.ensure_empty()?;
                if duration_min == 0 {
                    return Err(SessionError::InvalidDuration);
                }
                let session = Session::instant(duration_min, now);
                self.timer = Timer {
                    remaining_secs: session.duration_secs(),
                    status: TimerStatus::Running,
                };
                self.last_tick = Some(now);
                let event = Event::SessionStarted {
                    session_id: session.id.clone(),
                    mode: session.mode,
                    duration_min,
                    remaining_secs: self.timer.remaining_secs,
                    at: now,
                };
                self.session = Some(session);
                Ok(Some(event))
            }
            Command::Schedule {
                duration_min,
                start_at,
            } => {
                self.ensure_empty()?;
                if duration_min == 0 {
                    return Err(SessionError::InvalidDuration);
                }
                if start_at <= now {
                    return Err(SessionError::ScheduledInPast {
                        requested: start_at,
                        now,
                    });
                }
                let session = Session::scheduled(duration_min, start_at, now);
                self.timer = Timer {
                    remaining_secs: session.duration_secs(),
                    status: TimerStatus::Idle,
                };
                self.last_tick = None;
                let event = Event::SessionScheduled {
                    session_id: session.id.clone(),
                    duration_min,
                    start_at,
                    at: now,
                };
                self.session = Some(session);
                Ok(Some(event))
            }
            Command::Pause => match &mut self.session {
                Some(s) if s.status == SessionStatus::Running => {
                    s.status = SessionStatus::Paused;
                    s.updated_at = now;
                    self.timer.status = TimerStatus::Paused;
                    self.last_tick = None;
                    Ok(Some(Event::SessionPaused {
                        session_id: s.id.clone(),
                        remaining_secs: self.timer.remaining_secs,
                        at: now,
                    }))
                }
                _ => Ok(None),
            },
            Command::Resume => match &mut self.session {
                Some(s) if s.status == SessionStatus::Paused => {
                    s.status = SessionStatus::Running;
                    s.updated_at = now;
                    self.timer.status = TimerStatus::Running;
                    self.last_tick = Some(now);
                    Ok(Some(Event::SessionResumed {
                        session_id: s.id.clone(),
                        remaining_secs: self.timer.remaining_secs,
                        at: now,
                    }))
                }
                _ => Ok(None),
            },
            Command::Stop => match self.session.take() {
                // Stop with nothing live is a no-op, not an error.
                None => Ok(None),
                Some(s) => {
                    self.timer = Timer::idle();
                    self.last_tick = None;
                    let event = if s.status == SessionStatus::Pending {
                        Event::SessionCancelled {
                            session_id: s.id,
                            at: now,
                        }
                    } else {
                        Event::SessionStopped {
                            session_id: s.id,
                            at: now,
                        }
                    };
                    Ok(Some(event))
                }
            },
            Command::Tick => Ok(self.apply_tick(now)),
        }
    }

    /// `StartInstant { duration_min }` convenience wrapper.
    pub fn start_instant(
        &mut self,
        duration_min: u32,
        now: DateTime<Utc>,
    ) -> Result<Option<Event>, SessionError> {
        self.handle(Command::StartInstant { duration_min }, now)
    }

    /// `Schedule { duration_min, start_at }` convenience wrapper.
    pub fn schedule(
        &mut self,
        duration_min: u32,
        start_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Option<Event>, SessionError> {
        self.handle(
            Command::Schedule {
                duration_min,
                start_at,
            },
            now,
        )
    }

    pub fn pause(&mut self, now: DateTime<Utc>) -> Option<Event> {
        self.handle(Command::Pause, now).unwrap_or(None)
    }

    pub fn resume(&mut self, now: DateTime<Utc>) -> Option<Event> {
        self.handle(Command::Resume, now).unwrap_or(None)
    }

    pub fn stop(&mut self, now: DateTime<Utc>) -> Option<Event> {
        self.handle(Command::Stop, now).unwrap_or(None)
    }

    /// Apply one tick. Returns `Some(Event::SessionCompleted)` when the
    /// countdown reaches zero.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<Event> {
        self.handle(Command::Tick, now).unwrap_or(None)
    }

    /// Replay the wall-clock seconds that passed since the last applied
    /// tick. A pending session whose start instant has passed begins at
    /// that instant; a countdown that ran out completes at the instant it
    /// actually reached zero, not at `now`.
    pub fn catch_up(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        let mut events = Vec::new();

        if let Some(s) = &self.session {
            if s.status == SessionStatus::Pending {
                match s.scheduled_at {
                    Some(start_at) if start_at <= now => {
                        events.extend(self.begin_running(start_at));
                    }
                    _ => return events,
                }
            }
        }

        if self.timer.status != TimerStatus::Running {
            return events;
        }
        let last = match self.last_tick {
            Some(last) => last,
            None => {
                self.last_tick = Some(now);
                return events;
            }
        };
        let elapsed = (now - last).num_seconds();
        if elapsed <= 0 {
            return events;
        }
        if elapsed as u64 >= self.timer.remaining_secs {
            let done_at = last + Duration::seconds(self.timer.remaining_secs as i64);
            tracing::debug!(elapsed, "countdown ran out while detached");
            self.timer.remaining_secs = 0;
            events.extend(self.complete(done_at));
        } else {
            self.timer.remaining_secs -= elapsed as u64;
            self.last_tick = Some(last + Duration::seconds(elapsed));
        }
        events
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn ensure_empty(&self) -> Result<(), SessionError> {
        match &self.session {
            Some(s) => Err(SessionError::AlreadyActive { status: s.status }),
            None => Ok(()),
        }
    }

    fn apply_tick(&mut self, now: DateTime<Utc>) -> Option<Event> {
        // A pending session becomes running once its start instant passes.
        if let Some(s) = &self.session {
            if s.status == SessionStatus::Pending {
                return match s.scheduled_at {
                    Some(start_at) if start_at <= now => self.begin_running(now),
                    _ => None,
                };
            }
        }

        if self.timer.status != TimerStatus::Running {
            return None;
        }
        if self.timer.remaining_secs > 0 {
            self.timer.remaining_secs -= 1;
            self.last_tick = Some(now);
        }
        if self.timer.remaining_secs == 0 {
            return self.complete(now);
        }
        None
    }

    fn begin_running(&mut self, at: DateTime<Utc>) -> Option<Event> {
        let s = self.session.as_mut()?;
        s.status = SessionStatus::Running;
        s.started_at = Some(at);
        s.updated_at = at;
        self.timer.status = TimerStatus::Running;
        self.last_tick = Some(at);
        Some(Event::SessionStarted {
            session_id: s.id.clone(),
            mode: s.mode,
            duration_min: s.duration_min,
            remaining_secs: self.timer.remaining_secs,
            at,
        })
    }

    /// Discard the session and emit its record. Fires at most once per
    /// session: the machine is empty afterwards.
    fn complete(&mut self, at: DateTime<Utc>) -> Option<Event> {
        let mut s = self.session.take()?;
        s.status = SessionStatus::Completed;
        s.ended_at = Some(at);
        let record = FocusRecord::for_completed(&s, at);
        self.timer = Timer::idle();
        self.last_tick = None;
        Some(Event::SessionCompleted { record, at })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionMode;
    use proptest::prelude::*;

    fn t0() -> DateTime<Utc> {
        "2026-03-01T09:00:00Z".parse().unwrap()
    }

    fn secs(n: i64) -> Duration {
        Duration::seconds(n)
    }

    #[test]
    fn start_instant_sets_countdown() {
        let mut m = FocusMachine::new();
        let event = m.start_instant(25, t0()).unwrap().unwrap();
        match event {
            Event::SessionStarted {
                mode,
                remaining_secs,
                ..
            } => {
                assert_eq!(mode, SessionMode::Instant);
                assert_eq!(remaining_secs, 1500);
            }
            other => panic!("expected SessionStarted, got {other:?}"),
        }
        assert_eq!(m.timer().status, TimerStatus::Running);
        assert_eq!(m.session().unwrap().status, SessionStatus::Running);
    }

    #[test]
    fn zero_duration_is_rejected() {
        let mut m = FocusMachine::new();
        assert!(matches!(
            m.start_instant(0, t0()),
            Err(SessionError::InvalidDuration)
        ));
        assert!(m.is_empty());
        assert_eq!(m.timer().status, TimerStatus::Idle);
    }

    #[test]
    fn second_start_is_rejected() {
        let mut m = FocusMachine::new();
        m.start_instant(25, t0()).unwrap();
        assert!(matches!(
            m.start_instant(10, t0() + secs(1)),
            Err(SessionError::AlreadyActive { .. })
        ));
        assert_eq!(m.timer().remaining_secs, 1500);
    }

    #[test]
    fn schedule_in_past_is_rejected() {
        let mut m = FocusMachine::new();
        assert!(matches!(
            m.schedule(25, t0(), t0()),
            Err(SessionError::ScheduledInPast { .. })
        ));
        assert!(matches!(
            m.schedule(25, t0() - secs(1), t0()),
            Err(SessionError::ScheduledInPast { .. })
        ));
        assert!(m.is_empty());
    }

    #[test]
    fn scheduled_session_starts_on_its_own() {
        let mut m = FocusMachine::new();
        let start_at = t0() + secs(60);
        m.schedule(10, start_at, t0()).unwrap();
        assert_eq!(m.session().unwrap().status, SessionStatus::Pending);
        assert_eq!(m.timer().status, TimerStatus::Idle);

        // Before the start instant the poll does nothing.
        assert!(m.tick(t0() + secs(30)).is_none());
        assert_eq!(m.session().unwrap().status, SessionStatus::Pending);

        let event = m.tick(start_at).unwrap();
        assert!(matches!(event, Event::SessionStarted { .. }));
        assert_eq!(m.session().unwrap().status, SessionStatus::Running);
        assert_eq!(m.timer().remaining_secs, 600);
    }

    #[test]
    fn cancel_pending_emits_no_record() {
        let mut m = FocusMachine::new();
        m.schedule(10, t0() + secs(60), t0()).unwrap();
        let event = m.stop(t0() + secs(5)).unwrap();
        assert!(matches!(event, Event::SessionCancelled { .. }));
        assert!(m.is_empty());
    }

    #[test]
    fn pause_resume_preserves_remaining() {
        let mut m = FocusMachine::new();
        m.start_instant(25, t0()).unwrap();
        for i in 0..100 {
            m.tick(t0() + secs(i + 1));
        }
        let before = m.timer().remaining_secs;
        assert_eq!(before, 1400);

        m.pause(t0() + secs(101)).unwrap();
        assert_eq!(m.timer().status, TimerStatus::Paused);
        assert_eq!(m.session().unwrap().status, SessionStatus::Paused);
        // Ticks while paused change nothing.
        assert!(m.tick(t0() + secs(200)).is_none());
        assert_eq!(m.timer().remaining_secs, before);

        m.resume(t0() + secs(300)).unwrap();
        assert_eq!(m.timer().remaining_secs, before);
        assert_eq!(m.timer().status, TimerStatus::Running);
        assert_eq!(m.session().unwrap().status, SessionStatus::Running);
    }

    #[test]
    fn pause_without_running_session_is_noop() {
        let mut m = FocusMachine::new();
        assert!(m.pause(t0()).is_none());
        m.schedule(10, t0() + secs(60), t0()).unwrap();
        assert!(m.pause(t0() + secs(1)).is_none());
        assert_eq!(m.session().unwrap().status, SessionStatus::Pending);
    }

    #[test]
    fn stop_when_empty_is_idempotent() {
        let mut m = FocusMachine::new();
        assert!(m.stop(t0()).is_none());
        assert!(m.stop(t0() + secs(1)).is_none());
        assert!(m.is_empty());
    }

    #[test]
    fn stop_discards_session_without_record() {
        let mut m = FocusMachine::new();
        m.start_instant(25, t0()).unwrap();
        m.tick(t0() + secs(1));
        let event = m.stop(t0() + secs(2)).unwrap();
        assert!(matches!(event, Event::SessionStopped { .. }));
        assert!(m.is_empty());
        assert_eq!(m.timer(), Timer::idle());
    }

    #[test]
    fn full_countdown_completes_exactly_once() {
        let mut m = FocusMachine::new();
        m.start_instant(25, t0()).unwrap();

        let mut completions = Vec::new();
        for i in 0..1500 {
            if let Some(Event::SessionCompleted { record, .. }) = m.tick(t0() + secs(i + 1)) {
                completions.push(record);
            }
        }
        assert_eq!(completions.len(), 1);
        let record = &completions[0];
        assert_eq!(record.actual_duration_min, 25);
        assert_eq!(record.date, t0() + secs(1500));

        assert!(m.is_empty());
        assert_eq!(m.timer().remaining_secs, 0);
        assert_eq!(m.timer().status, TimerStatus::Idle);

        // Further ticks do nothing.
        assert!(m.tick(t0() + secs(1501)).is_none());
    }

    #[test]
    fn completion_record_references_session() {
        let mut m = FocusMachine::new();
        m.start_instant(1, t0()).unwrap();
        let session_id = m.session().unwrap().id.clone();
        let mut completed = None;
        for i in 0..60 {
            if let Some(Event::SessionCompleted { record, .. }) = m.tick(t0() + secs(i + 1)) {
                completed = Some(record);
            }
        }
        let record = completed.unwrap();
        assert_eq!(record.session_id, session_id);
        assert_eq!(record.actual_duration_min, 1);
    }

    #[test]
    fn catch_up_advances_running_countdown() {
        let mut m = FocusMachine::new();
        m.start_instant(25, t0()).unwrap();
        let events = m.catch_up(t0() + secs(10));
        assert!(events.is_empty());
        assert_eq!(m.timer().remaining_secs, 1490);
    }

    #[test]
    fn catch_up_completes_at_the_instant_zero_was_reached() {
        let mut m = FocusMachine::new();
        m.start_instant(1, t0()).unwrap();
        let events = m.catch_up(t0() + secs(3600));
        assert_eq!(events.len(), 1);
        match &events[0] {
            Event::SessionCompleted { record, .. } => {
                assert_eq!(record.date, t0() + secs(60));
            }
            other => panic!("expected SessionCompleted, got {other:?}"),
        }
        assert!(m.is_empty());
    }

    #[test]
    fn catch_up_starts_due_pending_session_at_its_instant() {
        let mut m = FocusMachine::new();
        let start_at = t0() + secs(60);
        m.schedule(1, start_at, t0()).unwrap();

        // Not due yet.
        assert!(m.catch_up(t0() + secs(30)).is_empty());
        assert_eq!(m.session().unwrap().status, SessionStatus::Pending);

        // Due and half elapsed.
        let events = m.catch_up(t0() + secs(90));
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Event::SessionStarted { .. }));
        assert_eq!(m.session().unwrap().started_at, Some(start_at));
        assert_eq!(m.timer().remaining_secs, 30);
    }

    #[test]
    fn catch_up_replays_through_completion() {
        let mut m = FocusMachine::new();
        let start_at = t0() + secs(60);
        m.schedule(1, start_at, t0()).unwrap();
        let events = m.catch_up(t0() + secs(600));
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], Event::SessionStarted { .. }));
        match &events[1] {
            Event::SessionCompleted { record, .. } => {
                assert_eq!(record.date, start_at + secs(60));
            }
            other => panic!("expected SessionCompleted, got {other:?}"),
        }
    }

    #[test]
    fn paused_machine_ignores_catch_up() {
        let mut m = FocusMachine::new();
        m.start_instant(25, t0()).unwrap();
        m.pause(t0() + secs(1)).unwrap();
        let before = m.timer().remaining_secs;
        assert!(m.catch_up(t0() + secs(3600)).is_empty());
        assert_eq!(m.timer().remaining_secs, before);
    }

    #[test]
    fn machine_round_trips_through_json() {
        let mut m = FocusMachine::new();
        m.start_instant(25, t0()).unwrap();
        m.tick(t0() + secs(1));
        let json = serde_json::to_string(&m).unwrap();
        let restored: FocusMachine = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.timer(), m.timer());
        assert_eq!(restored.session().unwrap().id, m.session().unwrap().id);
    }

    proptest! {
        #[test]
        fn start_sets_remaining_to_duration_secs(d in 1u32..=600) {
            let mut m = FocusMachine::new();
            m.start_instant(d, t0()).unwrap();
            prop_assert_eq!(m.timer().remaining_secs, u64::from(d) * 60);
            prop_assert_eq!(m.timer().status, TimerStatus::Running);
        }

        #[test]
        fn pause_resume_is_a_noop_on_remaining(d in 1u32..=120, ticks in 0u64..100) {
            let mut m = FocusMachine::new();
            m.start_instant(d, t0()).unwrap();
            let ticks = ticks.min(u64::from(d) * 60 - 1);
            for i in 0..ticks {
                m.tick(t0() + secs(i as i64 + 1));
            }
            let before = m.timer().remaining_secs;
            m.pause(t0() + secs(200));
            m.resume(t0() + secs(300));
            prop_assert_eq!(m.timer().remaining_secs, before);
            prop_assert_eq!(m.timer().status, TimerStatus::Running);
        }

        #[test]
        fn exactly_one_completion_per_session(d in 1u32..=30) {
            let mut m = FocusMachine::new();
            m.start_instant(d, t0()).unwrap();
            let mut completions = 0;
            for i in 0..u64::from(d) * 60 {
                if let Some(Event::SessionCompleted { record, .. }) = m.tick(t0() + secs(i as i64 + 1)) {
                    completions += 1;
                    prop_assert_eq!(record.actual_duration_min, d);
                }
            }
            prop_assert_eq!(completions, 1);
            prop_assert!(m.is_empty());
        }
    }
}
