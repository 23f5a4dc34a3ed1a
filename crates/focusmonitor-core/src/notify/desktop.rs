//! Desktop notification hook.

use notify_rust::Notification;

use super::CompletionHook;
use crate::session::FocusRecord;
use crate::storage::UserSettings;

/// Shows a desktop notification when a session completes.
pub struct DesktopNotification;

impl CompletionHook for DesktopNotification {
    fn name(&self) -> &str {
        "desktop"
    }

    fn enabled(&self, settings: &UserSettings) -> bool {
        settings.notification_enabled
    }

    fn on_session_complete(&self, record: &FocusRecord) -> Result<(), Box<dyn std::error::Error>> {
        let body = match &record.achievement {
            Some(label) => format!(
                "{} minutes of focus -- {}! Take a break.",
                record.actual_duration_min, label
            ),
            None => format!(
                "{} minutes of focus. Take a break.",
                record.actual_duration_min
            ),
        };
        Notification::new()
            .summary("Focus session complete")
            .body(&body)
            .appname("focusmonitor")
            .show()?;
        Ok(())
    }
}
