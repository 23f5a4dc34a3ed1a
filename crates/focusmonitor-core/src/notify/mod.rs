//! Completion side-effects.
//!
//! When a session completes, each enabled hook fires once. Hooks are
//! best-effort: failures are logged and ignored, and can never affect the
//! state transition that triggered them.

mod desktop;
mod sound;

pub use desktop::DesktopNotification;
pub use sound::CompletionTone;

use crate::session::FocusRecord;
use crate::storage::UserSettings;

/// A side-effect fired when a session completes.
pub trait CompletionHook: Send + Sync {
    /// Unique identifier (e.g. "desktop", "sound").
    fn name(&self) -> &str;

    /// Whether the user has this hook switched on.
    fn enabled(&self, settings: &UserSettings) -> bool;

    /// Fire the side-effect for a completed session.
    fn on_session_complete(&self, _record: &FocusRecord) -> Result<(), Box<dyn std::error::Error>> {
        Ok(()) // default no-op
    }
}

/// The built-in hooks.
pub fn default_hooks() -> Vec<Box<dyn CompletionHook>> {
    vec![
        Box::new(DesktopNotification),
        Box::new(CompletionTone),
    ]
}

/// Fire every enabled hook for `record`. Never fails.
pub fn notify_completion(settings: &UserSettings, record: &FocusRecord) {
    for hook in default_hooks() {
        if !hook.enabled(settings) {
            continue;
        }
        if let Err(e) = hook.on_session_complete(record) {
            tracing::warn!(hook = hook.name(), error = %e, "completion hook failed");
        }
    }
}
