//! # dropconv
//!
//! A batch image converter: hand it files and folders, get WebP or AVIF
//! files back. The library holds the conversion engine; the `dropconv` binary
//! is a thin command-line front end over it.
//!
//! # Architecture
//!
//! ```text
//! front door ──► collector ──► orchestrator ──► per file: read ─► encode ─► write
//!  (controller)   (collect)      (convert)              (fs)   (imaging)   (fs)
//!       ▲                            │
//!       └──── events, notifications ─┘
//! ```
//!
//! Every side effect sits behind a trait so the batch logic can be tested
//! without disk or codecs:
//!
//! | Trait | Production | Test double |
//! |-------|------------|-------------|
//! | [`fs::FileSystem`] | [`fs::StdFileSystem`] | `MemoryFileSystem` |
//! | [`imaging::EncodeBackend`] | [`imaging::RustEncoder`] | `MockEncoder` |
//! | [`config::SettingsSource`] | [`config::FileSettings`] | [`config::StaticSettings`] |
//! | [`notify::Notifier`] | [`notify::ConsoleNotifier`] | `RecordingNotifier` |
//! | [`controller::Picker`] / [`controller::SavePrompt`] | [`dialogs`] | mocks |
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`collect`] | Extension pattern and file/directory collection |
//! | [`fs`] | Binary I/O gateway and `parse_path` |
//! | [`imaging`] | Decode, then encode to WebP or AVIF |
//! | [`convert`] | Orchestrator state machine, progress, cancellation |
//! | [`controller`] | Drop, file dialog, folder dialog and paste entry points |
//! | [`config`] | `config.toml` loading, merging, validation, per-file snapshots |
//! | [`naming`] | Output file names and destinations |
//! | [`notify`] | Terminal notifications and sound cues |
//! | [`dialogs`] | Native (`dialogs` feature) and argument-driven pickers |
//! | [`output`] | CLI display of progress events |
//!
//! # Design Decisions
//!
//! ## One File at a Time
//!
//! The batch loop never has more than one image in flight, so peak memory is
//! one decoded image and progress only moves forward. The first failure stops
//! the batch with everything before it already written. The AVIF encoder
//! already uses multiple threads internally.
//!
//! ## Settings Are Read Per File
//!
//! The orchestrator asks its [`config::SettingsSource`] for a fresh snapshot
//! before every file instead of freezing settings at batch start. Changing
//! the output format while a long batch runs affects the files still to come.
//!
//! ## Cooperative Cancellation
//!
//! A [`convert::CancelToken`] is polled between files, never mid-encode. The
//! binary wires it to SIGINT, so Ctrl-C finishes the current image and stops.

pub mod collect;
pub mod config;
pub mod controller;
pub mod convert;
pub mod dialogs;
pub mod fs;
pub mod imaging;
pub mod naming;
pub mod notify;
pub mod output;

#[cfg(test)]
pub(crate) mod test_helpers;
