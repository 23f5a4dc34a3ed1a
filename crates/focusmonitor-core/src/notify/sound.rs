//! Completion tone hook.
//!
//! The tone is synthesized rather than loaded from disk, so there is no
//! asset to ship: two short sine notes through the default output device.

use std::time::Duration;

use rodio::source::{SineWave, Source};
use rodio::{OutputStream, Sink};

use super::CompletionHook;
use crate::session::FocusRecord;
use crate::storage::UserSettings;

/// Plays a short chime when a session completes.
pub struct CompletionTone;

impl CompletionHook for CompletionTone {
    fn name(&self) -> &str {
        "sound"
    }

    fn enabled(&self, settings: &UserSettings) -> bool {
        settings.sound_enabled
    }

    fn on_session_complete(&self, _record: &FocusRecord) -> Result<(), Box<dyn std::error::Error>> {
        let (_stream, handle) = OutputStream::try_default()?;
        let sink = Sink::try_new(&handle)?;
        sink.append(
            SineWave::new(660.0)
                .take_duration(Duration::from_millis(180))
                .amplify(0.25),
        );
        sink.append(
            SineWave::new(880.0)
                .take_duration(Duration::from_millis(320))
                .amplify(0.25),
        );
        sink.sleep_until_end();
        Ok(())
    }
}
