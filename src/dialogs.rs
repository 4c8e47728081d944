//! Picker and save-prompt implementations for the binary.
//!
//! With the `dialogs` feature the native OS dialogs from `rfd` are used.
//! Without it, selections come from command-line arguments.

use crate::controller::{Picker, SavePrompt};
use crate::imaging::OutputFormat;
use std::path::{Path, PathBuf};

/// Picker that answers with what was given on the command line.
///
/// An empty file list or a missing directory behaves like a dismissed
/// dialog.
#[derive(Debug, Clone, Default)]
pub struct ArgsPicker {
    pub files: Vec<PathBuf>,
    pub dir: Option<PathBuf>,
}

impl Picker for ArgsPicker {
    fn pick_files(&self, _extensions: &[&str]) -> Option<Vec<PathBuf>> {
        (!self.files.is_empty()).then(|| self.files.clone())
    }

    fn pick_dir(&self) -> Option<PathBuf> {
        self.dir.clone()
    }
}

/// Saves to a fixed path when one was given, else to the suggested one.
#[derive(Debug, Clone, Default)]
pub struct FixedSavePrompt(pub Option<PathBuf>);

impl SavePrompt for FixedSavePrompt {
    fn save_path(&self, suggested: &Path, _format: OutputFormat) -> Option<PathBuf> {
        Some(self.0.clone().unwrap_or_else(|| suggested.to_path_buf()))
    }
}

#[cfg(feature = "dialogs")]
pub use native::{NativePicker, NativeSavePrompt};

#[cfg(feature = "dialogs")]
mod native {
    use super::*;

    /// OS file and folder dialogs.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct NativePicker;

    impl Picker for NativePicker {
        fn pick_files(&self, extensions: &[&str]) -> Option<Vec<PathBuf>> {
            rfd::FileDialog::new()
                .set_title("Select images to convert")
                .add_filter("Images", extensions)
                .pick_files()
        }

        fn pick_dir(&self) -> Option<PathBuf> {
            rfd::FileDialog::new()
                .set_title("Select a folder to convert")
                .pick_folder()
        }
    }

    /// OS save dialog, pre-filled with the suggested path.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct NativeSavePrompt;

    impl SavePrompt for NativeSavePrompt {
        fn save_path(&self, suggested: &Path, format: OutputFormat) -> Option<PathBuf> {
            let mut dialog = rfd::FileDialog::new()
                .set_title("Save pasted image")
                .add_filter(format.label(), &[format.extension()]);
            if let Some(dir) = suggested.parent().filter(|d| !d.as_os_str().is_empty()) {
                dialog = dialog.set_directory(dir);
            }
            if let Some(name) = suggested.file_name() {
                dialog = dialog.set_file_name(name.to_string_lossy());
            }
            dialog.save_file()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_picker_without_files_is_dismissed() {
        assert!(ArgsPicker::default().pick_files(&["png"]).is_none());
        assert!(ArgsPicker::default().pick_dir().is_none());
    }

    #[test]
    fn args_picker_returns_given_selection() {
        let picker = ArgsPicker {
            files: vec![PathBuf::from("a.png")],
            dir: Some(PathBuf::from("/photos")),
        };
        assert_eq!(picker.pick_files(&[]), Some(vec![PathBuf::from("a.png")]));
        assert_eq!(picker.pick_dir(), Some(PathBuf::from("/photos")));
    }

    #[test]
    fn fixed_prompt_prefers_explicit_path() {
        let suggested = Path::new("/docs/pasted-image-1.webp");
        assert_eq!(
            FixedSavePrompt(None).save_path(suggested, OutputFormat::Webp),
            Some(suggested.to_path_buf())
        );
        assert_eq!(
            FixedSavePrompt(Some(PathBuf::from("/tmp/x.webp")))
                .save_path(suggested, OutputFormat::Webp),
            Some(PathBuf::from("/tmp/x.webp"))
        );
    }
}
