//! CLI output formatting.
//!
//! # Display
//!
//! One line per file, in batch order. The positional index comes first, the
//! file names second, and the running progress last. Full paths appear as an
//! indented `Source:` line so the output stays readable for long paths.
//!
//! ```text
//! Scanning images...
//! Converting 3 images
//! 001 dawn.jpg → dawn.webp (182.4 KB) [33%]
//!     Source: /photos/trip/dawn.jpg
//! 002 dusk.jpg skipped: output exists [66%]
//!     Source: /photos/trip/dusk.jpg
//! 003 night.png → night.webp (96.0 KB) [100%]
//!     Source: /photos/trip/night.png
//! Completed: 2 converted, 1 skipped
//! ```
//!
//! Notifications go to stderr through the console notifier, so they are not
//! repeated here. With `--json` every event, notifications included, is
//! printed as one JSON object per line instead.
//!
//! # Architecture
//!
//! Each display has a `format_*` function (returns `Vec<String>` or `String`)
//! for testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::controller::PasteReport;
use crate::convert::{ConversionEvent, MSG_SCANNING, Phase, SkipReason};
use crate::notify::{Notification, Tone};
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Human-readable byte count.
pub fn format_bytes(bytes: usize) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

fn phase_label(phase: Phase) -> &'static str {
    match phase {
        Phase::Idle => "Idle",
        Phase::Scanning => "Scanning",
        Phase::Running => "Running",
        Phase::Completed => "Completed",
        Phase::Failed => "Failed",
        Phase::Interrupted => "Interrupted",
    }
}

pub fn format_conversion_event(event: &ConversionEvent) -> Vec<String> {
    match event {
        ConversionEvent::Scanning => vec![MSG_SCANNING.to_string()],
        ConversionEvent::BatchStarted { total } => {
            let noun = if *total == 1 { "image" } else { "images" };
            vec![format!("Converting {total} {noun}")]
        }
        ConversionEvent::FileConverted {
            index,
            source,
            destination,
            bytes,
            progress,
            ..
        } => vec![
            format!(
                "{} {} → {} ({}) [{}%]",
                format_index(index + 1),
                file_name(source),
                file_name(destination),
                format_bytes(*bytes),
                progress
            ),
            format!("    Source: {}", source.display()),
        ],
        ConversionEvent::FileSkipped {
            index,
            source,
            reason,
            progress,
            ..
        } => {
            let why = match reason {
                SkipReason::NotAnImage => "not an image",
                SkipReason::OutputExists => "output exists",
            };
            let mut head = format!("{} {} skipped: {why}", format_index(index + 1), file_name(source));
            if let Some(p) = progress {
                head.push_str(&format!(" [{p}%]"));
            }
            vec![head, format!("    Source: {}", source.display())]
        }
        ConversionEvent::BatchFinished {
            phase,
            converted,
            skipped,
        } => vec![format!(
            "{}: {converted} converted, {skipped} skipped",
            phase_label(*phase)
        )],
        ConversionEvent::Notified(_) => Vec::new(),
    }
}

/// One event as a single JSON line.
pub fn format_json_event(event: &ConversionEvent) -> Result<String, serde_json::Error> {
    serde_json::to_string(event)
}

pub fn format_notification(notification: &Notification) -> String {
    let tag = match notification.tone {
        Tone::Success => "done",
        Tone::Error => "error",
        Tone::Info => "info",
    };
    format!("[{tag}] {}", notification.message)
}

pub fn format_paste_report(report: &PasteReport) -> Vec<String> {
    let mut lines: Vec<String> = report
        .saved
        .iter()
        .map(|p| format!("Saved {}", p.display()))
        .collect();
    if report.declined > 0 {
        lines.push(format!("Declined: {}", report.declined));
    }
    if report.ignored > 0 {
        lines.push(format!("Ignored non-image items: {}", report.ignored));
    }
    for error in &report.errors {
        lines.push(format!("Failed: {error}"));
    }
    lines
}

pub fn print_conversion_event(event: &ConversionEvent, json: bool) {
    if json {
        match format_json_event(event) {
            Ok(line) => println!("{line}"),
            Err(e) => tracing::error!(error = %e, "event serialization failed"),
        }
        return;
    }
    for line in format_conversion_event(event) {
        println!("{}", line);
    }
}

pub fn print_paste_report(report: &PasteReport) {
    for line in format_paste_report(report) {
        println!("{}", line);
    }
}
