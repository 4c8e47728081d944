//! User-facing notifications.
//!
//! Every terminal state of a conversion ends in exactly one [`Notification`]:
//! a tone, a message and an optional sound cue. The sink is one-shot: the
//! latest notification replaces whatever was shown before.

use serde::Serialize;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundCue {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub tone: Tone,
    pub message: String,
    pub sound: Option<SoundCue>,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            tone: Tone::Success,
            message: message.into(),
            sound: Some(SoundCue::Success),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            tone: Tone::Error,
            message: message.into(),
            sound: Some(SoundCue::Error),
        }
    }

    /// Informational; never plays a sound.
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            tone: Tone::Info,
            message: message.into(),
            sound: None,
        }
    }

    /// Same notification with the sound cue dropped.
    pub fn muted(self) -> Self {
        Self { sound: None, ..self }
    }
}

/// Where notifications go.
pub trait Notifier: Sync {
    fn notify(&self, notification: Notification);
}

/// Prints notifications to stderr. Sound cues ring the terminal bell.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        let line = crate::output::format_notification(&notification);
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(stderr, "{line}");
        if notification.sound.is_some() {
            let _ = write!(stderr, "\x07");
        }
        let _ = stderr.flush();
    }
}
