//! Interaction front door.
//!
//! Four ways in, one controller:
//!
//! | Entry | Input | Empty result |
//! |---|---|---|
//! | [`on_drop`](Controller::on_drop) | dropped paths | "No images found in the dropped items." |
//! | [`convert_by_dialog`](Controller::convert_by_dialog) | multi-file picker | "No images found in the selected items." |
//! | [`convert_by_dir_dialog`](Controller::convert_by_dir_dialog) | folder picker | "No images found in the selected folder." |
//! | [`on_paste`](Controller::on_paste) | in-memory image items | n/a |
//!
//! Path-based entries go through the collector and then the orchestrator in
//! [`convert`](crate::convert). An empty collection result stops the flow
//! with an error notification before anything is read. A dismissed picker is
//! a silent no-op.
//!
//! Paste bypasses the collector: each image item is encoded straight from
//! memory and written where the [`SavePrompt`] says. Items succeed or fail
//! independently.

use crate::collect::{DIALOG_EXTENSIONS, collect_files};
use crate::config::Settings;
use crate::convert::{
    self, BatchContext, BatchReport, ConversionEvent, ConversionState, ConvertError,
    MSG_SCANNING, Phase, run_batch,
};
use crate::imaging::OutputFormat;
use crate::naming;
use crate::notify::Notification;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const MSG_NO_IMAGES_DROPPED: &str = "No images found in the dropped items.";
pub const MSG_NO_IMAGES_SELECTED: &str = "No images found in the selected items.";
pub const MSG_NO_IMAGES_IN_FOLDER: &str = "No images found in the selected folder.";

/// Paths dropped onto the application.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DropEvent {
    pub paths: Vec<PathBuf>,
}

/// One clipboard item.
#[derive(Debug, Clone, PartialEq)]
pub struct PasteItem {
    pub mime: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PasteEvent {
    pub items: Vec<PasteItem>,
}

/// Native file and folder pickers. `None` means the user dismissed it.
pub trait Picker {
    fn pick_files(&self, extensions: &[&str]) -> Option<Vec<PathBuf>>;
    fn pick_dir(&self) -> Option<PathBuf>;
}

/// Asks where a pasted image should be saved. `None` declines the item.
pub trait SavePrompt {
    fn save_path(&self, suggested: &Path, format: OutputFormat) -> Option<PathBuf>;
}

/// What happened to the items of one paste event.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PasteReport {
    pub saved: Vec<PathBuf>,
    /// Image items whose save prompt was dismissed.
    pub declined: usize,
    /// Non-image items.
    pub ignored: usize,
    pub errors: Vec<String>,
}

/// Owns the conversion state and routes every entry point to the collector
/// and orchestrator.
pub struct Controller<'a> {
    ctx: BatchContext<'a>,
    state: ConversionState,
    pasted: usize,
}

impl<'a> Controller<'a> {
    pub fn new(ctx: BatchContext<'a>) -> Self {
        Self {
            ctx,
            state: ConversionState::default(),
            pasted: 0,
        }
    }

    pub fn state(&self) -> &ConversionState {
        &self.state
    }

    /// Convert everything under the dropped paths.
    pub fn on_drop(&mut self, event: DropEvent) -> BatchReport {
        tracing::info!(paths = event.paths.len(), "drop");
        self.collect_and_run(&event.paths, MSG_NO_IMAGES_DROPPED)
    }

    /// Let the user pick image files, then convert them.
    ///
    /// Returns `None` when the picker was dismissed.
    pub fn convert_by_dialog(&mut self, picker: &dyn Picker) -> Option<BatchReport> {
        let files = picker
            .pick_files(DIALOG_EXTENSIONS)
            .filter(|files| !files.is_empty())?;
        tracing::info!(files = files.len(), "files selected");
        Some(self.collect_and_run(&files, MSG_NO_IMAGES_SELECTED))
    }

    /// Let the user pick a folder, then convert the images in it.
    ///
    /// Returns `None` when the picker was dismissed.
    pub fn convert_by_dir_dialog(&mut self, picker: &dyn Picker) -> Option<BatchReport> {
        let dir = picker.pick_dir()?;
        tracing::info!(dir = %dir.display(), "folder selected");
        Some(self.collect_and_run(&[dir], MSG_NO_IMAGES_IN_FOLDER))
    }

    fn collect_and_run(&mut self, inputs: &[PathBuf], empty_message: &str) -> BatchReport {
        self.ctx.cancel.reset();
        self.state.begin_scan();
        self.state.current_file = Some(MSG_SCANNING.to_string());
        self.ctx.emit(ConversionEvent::Scanning);

        let settings = match self.ctx.settings.snapshot() {
            Ok(settings) => settings,
            Err(e) => return self.stop_scanning(ConvertError::from(e).to_string(), true),
        };
        let sound = settings.notifications.sound;

        let files = match collect_files(
            self.ctx.fs,
            inputs,
            &settings.pattern(),
            settings.common.recursive,
        ) {
            Ok(files) => files,
            Err(e) => return self.stop_scanning(ConvertError::from(e).to_string(), sound),
        };
        if files.is_empty() {
            tracing::warn!("no images found");
            return self.stop_scanning(empty_message.to_string(), sound);
        }

        run_batch(&self.ctx, &mut self.state, &files)
    }

    /// `Scanning → Failed` with an error notification.
    fn stop_scanning(&mut self, message: String, sound: bool) -> BatchReport {
        let mut report = BatchReport::new(Phase::Failed);
        report.error = Some(message.clone());
        convert::finish(&self.ctx, &mut self.state, &report);
        self.ctx.notify(Notification::error(message), sound);
        report
    }

    /// Encode and save every image item of a paste event.
    ///
    /// Non-image items are ignored. A failing item is reported and the next
    /// one is still attempted.
    pub fn on_paste(&mut self, event: PasteEvent, prompt: &dyn SavePrompt) -> PasteReport {
        let mut report = PasteReport::default();
        self.state.loading = true;

        for item in &event.items {
            if !item.mime.starts_with("image/") {
                tracing::debug!(mime = %item.mime, "paste item ignored");
                report.ignored += 1;
                continue;
            }
            self.pasted += 1;

            let settings = match self.ctx.settings.snapshot() {
                Ok(settings) => settings,
                Err(e) => {
                    let message = ConvertError::from(e).to_string();
                    tracing::error!(error = %message, "paste failed");
                    self.ctx.notify(Notification::error(message.clone()), true);
                    report.errors.push(message);
                    continue;
                }
            };
            let sound = settings.notifications.sound;

            match self.paste_one(item, &settings, prompt) {
                Ok(Some(path)) => {
                    tracing::info!(path = %path.display(), "pasted image saved");
                    let label = settings.common.format.label();
                    self.ctx.notify(
                        Notification::success(format!(
                            "Image pasted and converted to {label} successfully."
                        )),
                        sound,
                    );
                    report.saved.push(path);
                }
                Ok(None) => {
                    tracing::debug!("paste save declined");
                    report.declined += 1;
                }
                Err(e) => {
                    let message = e.to_string();
                    tracing::error!(error = %message, "paste failed");
                    self.ctx.notify(Notification::error(message.clone()), sound);
                    report.errors.push(message);
                }
            }
        }

        self.state.loading = false;
        report
    }

    fn paste_one(
        &self,
        item: &PasteItem,
        settings: &Settings,
        prompt: &dyn SavePrompt,
    ) -> Result<Option<PathBuf>, ConvertError> {
        let options = settings.encode_options();
        let format = options.format();
        let name = naming::pasted_file_name(self.pasted, format);
        let suggested = match settings.output_dir() {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name),
        };
        let Some(destination) = prompt.save_path(&suggested, format) else {
            return Ok(None);
        };

        let encoded = self.ctx.encoder.encode(&item.data, &options)?;
        self.ctx.fs.save(&destination, &encoded)?;
        Ok(Some(destination))
    }
}
