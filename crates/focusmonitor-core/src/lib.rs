//! # Focus Monitor Core Library
//!
//! Core business logic for the Focus Monitor timer. All operations are
//! available through the `focusmonitor` CLI binary, which is a thin layer
//! over this library.
//!
//! ## Architecture
//!
//! - **State machine**: one live session plus its countdown, advanced by
//!   explicit [`Command`]s including a 1-second tick; every transition is
//!   deterministic in the `now` the caller supplies
//! - **Storage**: SQLite record log and TOML settings file
//! - **History**: pure aggregation over the record log
//! - **Notify**: best-effort completion side-effects (desktop
//!   notification, tone)
//!
//! ## Key Components
//!
//! - [`FocusMachine`]: session/timer state machine
//! - [`RecordStore`]: append-only focus record persistence
//! - [`SettingsStore`] / [`UserSettings`]: user preferences
//! - [`history`]: daily statistics and grouped history views

pub mod error;
pub mod events;
pub mod history;
pub mod notify;
pub mod session;
pub mod storage;
pub mod timer;

pub use error::{CoreError, SessionError, SettingsError, StoreError};
pub use events::Event;
pub use session::{FocusRecord, Session, SessionMode, SessionStatus, Timer, TimerStatus};
pub use storage::{RecordStore, SettingsStore, SettingsUpdate, Theme, UserSettings};
pub use timer::{Command, FocusMachine, Ticker};
