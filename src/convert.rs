//! Conversion orchestrator.
//!
//! Drives a resolved file list through read → encode → write, one file at a
//! time, in collector order.
//!
//! ## State machine
//!
//! ```text
//! Idle → Scanning → Running → { Completed | Failed | Interrupted } → Idle
//! ```
//!
//! | Transition | Effect |
//! |---|---|
//! | `Idle → Scanning` | dialog shown, in progress, progress `0` |
//! | `Scanning → Failed` | empty file list; nothing is read or encoded |
//! | `Running` per file | cancel check, fresh settings, read, encode, write, progress |
//! | `Running → Failed` | first error stops the batch; no retry, no skip |
//! | `Running → Completed` | every file done |
//! | `Running → Interrupted` | [`CancelToken`] seen set at a file boundary |
//!
//! Every terminal transition hides the dialog, clears the in-progress flag and
//! resets the state to idle. The terminal outcome is returned as a
//! [`BatchReport`] and announced through the [`Notifier`].
//!
//! Progress after file `i` (0-based) of `total` is `floor((i + 1) * 100 / total)`.
//! Files that no longer match the extension pattern are skipped without a
//! progress update; files skipped because their output already exists still
//! advance it.

use crate::config::{ConfigError, Settings, SettingsSource};
use crate::fs::{FileSystem, FsError};
use crate::imaging::{EncodeBackend, EncodeError};
use crate::naming;
use crate::notify::{Notification, Notifier};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use thiserror::Error;

pub const MSG_INTERRUPTED: &str = "Interrupted.";
pub const MSG_SCANNING: &str = "Scanning images...";

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("{0}")]
    Io(#[source] FsError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("No images found.")]
    EmptySelection,
    #[error("Interrupted.")]
    Interrupted,
}

impl From<FsError> for ConvertError {
    fn from(e: FsError) -> Self {
        match e {
            FsError::NotFound(path) => ConvertError::NotFound(path),
            other => ConvertError::Io(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Idle,
    Scanning,
    Running,
    Completed,
    Failed,
    Interrupted,
}

/// Observable state of the one conversion a controller may run at a time.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConversionState {
    pub phase: Phase,
    /// Index of the file being processed (0-based).
    pub current_index: usize,
    pub current_file: Option<String>,
    /// Completion percentage, `None` when no run is active.
    pub progress: Option<u8>,
    /// Progress dialog visible.
    pub dialog: bool,
    pub in_progress: bool,
    /// Set for the whole of a paste event.
    pub loading: bool,
}

impl ConversionState {
    /// `Idle → Scanning`.
    pub fn begin_scan(&mut self) {
        self.phase = Phase::Scanning;
        self.current_index = 0;
        self.current_file = None;
        self.progress = Some(0);
        self.dialog = true;
        self.in_progress = true;
    }

    /// Back to idle after a terminal transition. `loading` belongs to the
    /// paste flow and is left alone.
    pub fn reset(&mut self) {
        *self = Self {
            loading: self.loading,
            ..Self::default()
        };
    }
}

/// Shared cancellation flag, polled once per file boundary.
///
/// Clones share the flag, so a signal handler can hold one while the
/// orchestrator polls another.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    /// The underlying flag, for `signal_hook::flag::register`.
    pub fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The name no longer matches the extension pattern.
    NotAnImage,
    /// The destination exists and overwriting is off.
    OutputExists,
}

/// Progress events sent to the binary's printer thread.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ConversionEvent {
    Scanning,
    BatchStarted {
        total: usize,
    },
    FileConverted {
        index: usize,
        total: usize,
        source: PathBuf,
        destination: PathBuf,
        bytes: usize,
        progress: u8,
    },
    FileSkipped {
        index: usize,
        total: usize,
        source: PathBuf,
        reason: SkipReason,
        progress: Option<u8>,
    },
    BatchFinished {
        phase: Phase,
        converted: usize,
        skipped: usize,
    },
    Notified(Notification),
}

/// Outcome of one batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    /// `Completed`, `Failed` or `Interrupted`.
    pub phase: Phase,
    pub converted: usize,
    pub skipped: usize,
    pub outputs: Vec<PathBuf>,
    /// Message of the error that ended the batch.
    pub error: Option<String>,
}

impl BatchReport {
    pub(crate) fn new(phase: Phase) -> Self {
        Self {
            phase,
            converted: 0,
            skipped: 0,
            outputs: Vec::new(),
            error: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.phase == Phase::Completed
    }
}

/// Collaborators one batch runs against.
#[derive(Clone, Copy)]
pub struct BatchContext<'a> {
    pub fs: &'a dyn FileSystem,
    pub encoder: &'a dyn EncodeBackend,
    pub settings: &'a dyn SettingsSource,
    pub notifier: &'a dyn Notifier,
    pub cancel: &'a CancelToken,
    pub events: Option<&'a Sender<ConversionEvent>>,
}

impl BatchContext<'_> {
    pub(crate) fn emit(&self, event: ConversionEvent) {
        if let Some(tx) = self.events {
            // A closed printer only loses display output.
            let _ = tx.send(event);
        }
    }

    /// Deliver a notification, dropping its sound when sounds are off.
    pub(crate) fn notify(&self, notification: Notification, sound: bool) {
        let notification = if sound {
            notification
        } else {
            notification.muted()
        };
        self.emit(ConversionEvent::Notified(notification.clone()));
        self.notifier.notify(notification);
    }
}

enum FileOutcome {
    Converted { destination: PathBuf, bytes: usize },
    Skipped(SkipReason),
}

/// `floor((done) * 100 / total)`, `done` counted from 1.
pub fn progress_percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    (done.min(total) * 100 / total) as u8
}

/// Run one batch over `files`.
///
/// The state is moved to `Scanning` first if the caller hasn't done so, and
/// is back at idle when this returns.
pub fn run_batch(ctx: &BatchContext, state: &mut ConversionState, files: &[PathBuf]) -> BatchReport {
    if state.phase == Phase::Idle {
        state.begin_scan();
    }

    if files.is_empty() {
        tracing::info!("batch has no files");
        let mut report = BatchReport::new(Phase::Failed);
        report.error = Some(ConvertError::EmptySelection.to_string());
        finish(ctx, state, &report);
        ctx.notify(Notification::info(ConvertError::EmptySelection.to_string()), false);
        return report;
    }

    let total = files.len();
    state.phase = Phase::Running;
    ctx.emit(ConversionEvent::BatchStarted { total });
    tracing::info!(total, "batch started");

    let mut report = BatchReport::new(Phase::Running);
    let mut sound = true;
    let result = convert_all(ctx, state, files, &mut report, &mut sound);

    match result {
        Ok(()) => {
            report.phase = Phase::Completed;
            tracing::info!(converted = report.converted, skipped = report.skipped, "batch completed");
            finish(ctx, state, &report);
            ctx.notify(
                Notification::success(format!(
                    "{} images have been converted successfully.",
                    report.converted
                )),
                sound,
            );
        }
        Err(ConvertError::Interrupted) => {
            report.phase = Phase::Interrupted;
            report.error = Some(MSG_INTERRUPTED.to_string());
            tracing::info!(converted = report.converted, "batch interrupted");
            finish(ctx, state, &report);
            ctx.notify(Notification::info(MSG_INTERRUPTED), sound);
        }
        Err(e) => {
            let message = e.to_string();
            tracing::error!(error = %message, file = ?state.current_file, "batch failed");
            report.phase = Phase::Failed;
            report.error = Some(message.clone());
            finish(ctx, state, &report);
            ctx.notify(Notification::error(message), sound);
        }
    }
    report
}

pub(crate) fn finish(ctx: &BatchContext, state: &mut ConversionState, report: &BatchReport) {
    state.phase = report.phase;
    state.dialog = false;
    state.in_progress = false;
    state.progress = None;
    ctx.emit(ConversionEvent::BatchFinished {
        phase: report.phase,
        converted: report.converted,
        skipped: report.skipped,
    });
    state.reset();
}

fn convert_all(
    ctx: &BatchContext,
    state: &mut ConversionState,
    files: &[PathBuf],
    report: &mut BatchReport,
    sound: &mut bool,
) -> Result<(), ConvertError> {
    let total = files.len();
    for (index, source) in files.iter().enumerate() {
        if ctx.cancel.is_cancelled() {
            return Err(ConvertError::Interrupted);
        }
        state.current_index = index;
        state.current_file = Some(source.display().to_string());

        let settings = ctx.settings.snapshot()?;
        *sound = settings.notifications.sound;

        match convert_one(ctx, &settings, source)? {
            FileOutcome::Converted { destination, bytes } => {
                let progress = progress_percent(index + 1, total);
                state.progress = Some(progress);
                report.converted += 1;
                report.outputs.push(destination.clone());
                ctx.emit(ConversionEvent::FileConverted {
                    index,
                    total,
                    source: source.clone(),
                    destination,
                    bytes,
                    progress,
                });
            }
            FileOutcome::Skipped(reason) => {
                let progress = match reason {
                    SkipReason::NotAnImage => None,
                    SkipReason::OutputExists => Some(progress_percent(index + 1, total)),
                };
                if progress.is_some() {
                    state.progress = progress;
                }
                report.skipped += 1;
                ctx.emit(ConversionEvent::FileSkipped {
                    index,
                    total,
                    source: source.clone(),
                    reason,
                    progress,
                });
            }
        }
    }
    Ok(())
}

fn convert_one(
    ctx: &BatchContext,
    settings: &Settings,
    source: &Path,
) -> Result<FileOutcome, ConvertError> {
    if !settings.pattern().matches(source) {
        tracing::warn!(path = %source.display(), "not a recognised image, skipped");
        return Ok(FileOutcome::Skipped(SkipReason::NotAnImage));
    }

    let output_dir = if settings.common.same_directory {
        None
    } else {
        Some(settings.output_dir().ok_or_else(|| {
            ConfigError::Validation("no output directory configured".to_string())
        })?)
    };
    let options = settings.encode_options();
    let destination = naming::destination_path(source, options.format(), output_dir.as_deref());

    if !settings.common.overwrite && ctx.fs.exists(&destination) {
        tracing::warn!(path = %destination.display(), "output exists, skipped");
        return Ok(FileOutcome::Skipped(SkipReason::OutputExists));
    }

    let input = ctx.fs.read(source)?;
    let encoded = ctx.encoder.encode(&input, &options)?;
    ctx.fs.save(&destination, &encoded)?;
    tracing::debug!(
        source = %source.display(),
        destination = %destination.display(),
        bytes = encoded.len(),
        "converted"
    );

    if settings.common.delete_original {
        ctx.fs.delete(source)?;
        tracing::debug!(path = %source.display(), "original deleted");
    }

    Ok(FileOutcome::Converted {
        destination,
        bytes: encoded.len(),
    })
}
