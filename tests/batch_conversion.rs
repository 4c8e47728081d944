//! End-to-end conversions through the public API with the real encoder.

use dropconv::config::{FileSettings, Settings, StaticSettings};
use dropconv::controller::{Controller, DropEvent, PasteEvent, PasteItem};
use dropconv::convert::{BatchContext, CancelToken, ConversionEvent, Phase};
use dropconv::dialogs::FixedSavePrompt;
use dropconv::fs::StdFileSystem;
use dropconv::imaging::{OutputFormat, RustEncoder, identify};
use dropconv::notify::{Notification, Notifier, Tone};
use image::{ImageEncoder, RgbImage};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, mpsc};
use tempfile::TempDir;

#[derive(Default)]
struct Collect(Mutex<Vec<Notification>>);

impl Notifier for Collect {
    fn notify(&self, notification: Notification) {
        self.0.lock().unwrap().push(notification);
    }
}

impl Collect {
    fn latest(&self) -> Notification {
        self.0.lock().unwrap().last().cloned().unwrap()
    }
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| image::Rgb([x as u8, y as u8, 90]));
    let mut out = Vec::new();
    image::codecs::png::PngEncoder::new(&mut out)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
    out
}

fn write(root: &Path, rel: &str, bytes: &[u8]) -> PathBuf {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, bytes).unwrap();
    path
}

#[test]
fn drop_folder_to_webp() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "a.png", &png(40, 30));
    write(tmp.path(), "b.PNG", &png(12, 8));
    write(tmp.path(), "readme.md", b"# photos");

    let fs = StdFileSystem::new();
    let encoder = RustEncoder::new();
    let notifier = Collect::default();
    let cancel = CancelToken::new();
    let settings = StaticSettings::default();
    let (tx, rx) = mpsc::channel();

    let report = {
        let mut controller = Controller::new(BatchContext {
            fs: &fs,
            encoder: &encoder,
            settings: &settings,
            notifier: &notifier,
            cancel: &cancel,
            events: Some(&tx),
        });
        controller.on_drop(DropEvent {
            paths: vec![tmp.path().to_path_buf()],
        })
    };
    drop(tx);

    assert_eq!(report.phase, Phase::Completed);
    assert_eq!(report.converted, 2);
    let a = std::fs::read(tmp.path().join("a.webp")).unwrap();
    assert_eq!(identify(&a, OutputFormat::Webp).unwrap(), (40, 30));
    let b = std::fs::read(tmp.path().join("b.webp")).unwrap();
    assert_eq!(identify(&b, OutputFormat::Webp).unwrap(), (12, 8));
    assert_eq!(
        notifier.latest().message,
        "2 images have been converted successfully."
    );

    let progress: Vec<u8> = rx
        .into_iter()
        .filter_map(|e| match e {
            ConversionEvent::FileConverted { progress, .. } => Some(progress),
            _ => None,
        })
        .collect();
    assert_eq!(progress, vec![50, 100]);
}

#[test]
fn config_file_selects_avif_and_output_dir() {
    let tmp = TempDir::new().unwrap();
    let src = write(tmp.path(), "in/photo.png", &png(24, 16));
    let out = tmp.path().join("out");
    std::fs::create_dir(&out).unwrap();
    let config = write(
        tmp.path(),
        "config.toml",
        format!(
            "[common]\nformat = \"avif\"\nsame_directory = false\noutput_dir = {:?}\n\n[avif]\nspeed = 10\n",
            out.display().to_string()
        )
        .as_bytes(),
    );

    let fs = StdFileSystem::new();
    let encoder = RustEncoder::new();
    let notifier = Collect::default();
    let cancel = CancelToken::new();
    let settings = FileSettings::new(Some(config));
    let mut controller = Controller::new(BatchContext {
        fs: &fs,
        encoder: &encoder,
        settings: &settings,
        notifier: &notifier,
        cancel: &cancel,
        events: None,
    });

    let report = controller.on_drop(DropEvent { paths: vec![src] });

    assert_eq!(report.phase, Phase::Completed);
    let avif = std::fs::read(out.join("photo.avif")).unwrap();
    assert_eq!(identify(&avif, OutputFormat::Avif).unwrap(), (24, 16));
}

#[test]
fn corrupt_file_stops_batch() {
    let tmp = TempDir::new().unwrap();
    let first = write(tmp.path(), "1.png", &png(8, 8));
    let broken = write(tmp.path(), "2.png", b"\x89PNG\r\n\x1a\ntruncated");
    let last = write(tmp.path(), "3.png", &png(8, 8));

    let fs = StdFileSystem::new();
    let encoder = RustEncoder::new();
    let notifier = Collect::default();
    let cancel = CancelToken::new();
    let settings = StaticSettings::default();
    let mut controller = Controller::new(BatchContext {
        fs: &fs,
        encoder: &encoder,
        settings: &settings,
        notifier: &notifier,
        cancel: &cancel,
        events: None,
    });

    let report = controller.on_drop(DropEvent {
        paths: vec![first, broken, last],
    });

    assert_eq!(report.phase, Phase::Failed);
    assert!(tmp.path().join("1.webp").exists());
    assert!(!tmp.path().join("3.webp").exists());
    let n = notifier.latest();
    assert_eq!(n.tone, Tone::Error);
    assert!(n.message.starts_with("Failed to decode image"));
}

#[test]
fn paste_png_bytes_to_file() {
    let tmp = TempDir::new().unwrap();
    let dest = tmp.path().join("clip.webp");

    let fs = StdFileSystem::new();
    let encoder = RustEncoder::new();
    let notifier = Collect::default();
    let cancel = CancelToken::new();
    let mut lossy = Settings::default();
    lossy.webp.lossless = false;
    let settings = StaticSettings(lossy);
    let mut controller = Controller::new(BatchContext {
        fs: &fs,
        encoder: &encoder,
        settings: &settings,
        notifier: &notifier,
        cancel: &cancel,
        events: None,
    });

    let report = controller.on_paste(
        PasteEvent {
            items: vec![PasteItem {
                mime: "image/png".to_string(),
                data: png(10, 10),
            }],
        },
        &FixedSavePrompt(Some(dest.clone())),
    );

    assert_eq!(report.saved, vec![dest.clone()]);
    let bytes = std::fs::read(&dest).unwrap();
    assert_eq!(identify(&bytes, OutputFormat::Webp).unwrap(), (10, 10));
    assert_eq!(notifier.latest().tone, Tone::Success);
}
