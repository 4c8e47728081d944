use clap::{Parser, Subcommand, ValueEnum};
use dropconv::config::{self, FileSettings, SettingsSource};
use dropconv::controller::{Controller, DropEvent, PasteEvent, PasteItem, Picker, SavePrompt};
use dropconv::convert::{BatchContext, BatchReport, CancelToken, ConversionEvent};
use dropconv::dialogs::{ArgsPicker, FixedSavePrompt};
use dropconv::fs::StdFileSystem;
use dropconv::imaging::RustEncoder;
use dropconv::notify::ConsoleNotifier;
use dropconv::output;
use std::io::Read;
use std::path::PathBuf;
use std::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn version_string() -> &'static str {
    let hash = env!("DROPCONV_GIT_HASH");
    if hash.is_empty() {
        env!("CARGO_PKG_VERSION")
    } else {
        // Leaked once at startup
        Box::leak(format!("{} ({hash})", env!("CARGO_PKG_VERSION")).into_boxed_str())
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Webp,
    Avif,
}

impl FormatArg {
    fn as_str(self) -> &'static str {
        match self {
            FormatArg::Webp => "webp",
            FormatArg::Avif => "avif",
        }
    }
}

/// Per-run settings overrides, merged over the config file.
#[derive(clap::Args, Clone, Default)]
struct Overrides {
    /// Output format
    #[arg(long, value_enum, global = true)]
    format: Option<FormatArg>,

    /// Encoding quality 0-100 (WebP lossy and AVIF)
    #[arg(long, global = true)]
    quality: Option<f32>,

    /// WebP lossless encoding (`--lossless=false` for lossy)
    #[arg(
        long,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        global = true
    )]
    lossless: Option<bool>,

    /// Descend into subdirectories (`--recursive=false` to stay flat)
    #[arg(
        long,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        global = true
    )]
    recursive: Option<bool>,

    /// Write outputs here instead of beside their sources
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// Replace existing output files
    #[arg(
        long,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        global = true
    )]
    overwrite: Option<bool>,

    /// Leave .jpg/.jpeg inputs alone
    #[arg(
        long,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        global = true
    )]
    ignore_jpeg: Option<bool>,
}

impl Overrides {
    /// Only the flags actually given, as a TOML overlay.
    fn to_toml(&self) -> toml::Value {
        let mut common = toml::Table::new();
        let mut webp = toml::Table::new();
        let mut avif = toml::Table::new();

        if let Some(format) = self.format {
            common.insert("format".into(), format.as_str().into());
        }
        if let Some(quality) = self.quality {
            webp.insert("quality".into(), f64::from(quality).into());
            avif.insert("quality".into(), f64::from(quality).into());
        }
        if let Some(lossless) = self.lossless {
            webp.insert("lossless".into(), lossless.into());
        }
        if let Some(recursive) = self.recursive {
            common.insert("recursive".into(), recursive.into());
        }
        if let Some(dir) = &self.output_dir {
            common.insert("output_dir".into(), dir.display().to_string().into());
            common.insert("same_directory".into(), false.into());
        }
        if let Some(overwrite) = self.overwrite {
            common.insert("overwrite".into(), overwrite.into());
        }
        if let Some(ignore_jpeg) = self.ignore_jpeg {
            common.insert("ignore_jpeg".into(), ignore_jpeg.into());
        }

        let mut root = toml::Table::new();
        for (name, table) in [("common", common), ("webp", webp), ("avif", avif)] {
            if !table.is_empty() {
                root.insert(name.into(), toml::Value::Table(table));
            }
        }
        toml::Value::Table(root)
    }
}

#[derive(Parser)]
#[command(name = "dropconv")]
#[command(about = "Convert images to WebP or AVIF")]
#[command(long_about = "\
Convert images to WebP or AVIF

Give it files and folders; every JPEG, PNG, GIF, TIFF or BMP found is
converted, one at a time, next to the original (or into --output-dir).
The first failure stops the batch. Ctrl-C stops it after the current image.

Settings come from the config file, re-read before every image, with
command-line flags layered on top.

Run 'dropconv gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Settings file (default: <config dir>/dropconv/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print events as JSON lines
    #[arg(long, global = true)]
    json: bool,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert the given files and folders
    Convert {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Pick image files to convert
    Pick {
        /// Files to use instead of a dialog
        #[arg(long, num_args = 1..)]
        files: Vec<PathBuf>,
    },
    /// Pick a folder to convert
    PickDir {
        /// Folder to use instead of a dialog
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Convert an image read from stdin
    Paste {
        /// Where to save (default: pasted-image-1.<ext> in the output directory)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
    /// Print the resolved settings
    ShowConfig,
}

impl Command {
    /// Batch commands turn Ctrl-C into a stop at the next file. Paste blocks
    /// on stdin and never polls the token, so it keeps the default handler.
    fn cancels_on_sigint(&self) -> bool {
        matches!(
            self,
            Command::Convert { .. } | Command::Pick { .. } | Command::PickDir { .. }
        )
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[cfg(feature = "dialogs")]
fn picker(files: Vec<PathBuf>, dir: Option<PathBuf>) -> Box<dyn Picker> {
    if files.is_empty() && dir.is_none() {
        Box::new(dropconv::dialogs::NativePicker)
    } else {
        Box::new(ArgsPicker { files, dir })
    }
}

#[cfg(not(feature = "dialogs"))]
fn picker(files: Vec<PathBuf>, dir: Option<PathBuf>) -> Box<dyn Picker> {
    Box::new(ArgsPicker { files, dir })
}

#[cfg(feature = "dialogs")]
fn save_prompt(output: Option<PathBuf>) -> Box<dyn SavePrompt> {
    match output {
        Some(path) => Box::new(FixedSavePrompt(Some(path))),
        None => Box::new(dropconv::dialogs::NativeSavePrompt),
    }
}

#[cfg(not(feature = "dialogs"))]
fn save_prompt(output: Option<PathBuf>) -> Box<dyn SavePrompt> {
    Box::new(FixedSavePrompt(output))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let config_path = match cli.config {
        Some(path) => {
            if !path.exists() {
                return Err(format!("config file not found: {}", path.display()).into());
            }
            Some(path)
        }
        None => config::default_config_path(),
    };

    let settings = FileSettings::new(config_path).with_overrides(cli.overrides.to_toml());
    // Fail fast on a broken config instead of on the first image.
    let resolved = settings.snapshot()?;

    if let Command::ShowConfig = cli.command {
        if let Some(path) = settings.path() {
            eprintln!("# {}", path.display());
        }
        print!("{}", toml::to_string_pretty(&resolved)?);
        return Ok(());
    }

    let cancel = CancelToken::new();
    if cli.command.cancels_on_sigint() {
        signal_hook::flag::register(signal_hook::consts::SIGINT, cancel.flag())?;
    }

    let fs = StdFileSystem::new();
    let encoder = RustEncoder::new();
    let notifier = ConsoleNotifier;

    let json = cli.json;
    let (tx, rx) = mpsc::channel::<ConversionEvent>();
    let printer = std::thread::spawn(move || {
        for event in rx {
            output::print_conversion_event(&event, json);
        }
    });

    let succeeded = {
        let mut controller = Controller::new(BatchContext {
            fs: &fs,
            encoder: &encoder,
            settings: &settings,
            notifier: &notifier,
            cancel: &cancel,
            events: Some(&tx),
        });

        match cli.command {
            Command::Convert { paths } => {
                let report = controller.on_drop(DropEvent { paths });
                batch_succeeded(report)
            }
            Command::Pick { files } => controller
                .convert_by_dialog(picker(files, None).as_ref())
                .is_none_or(batch_succeeded),
            Command::PickDir { dir } => controller
                .convert_by_dir_dialog(picker(Vec::new(), dir).as_ref())
                .is_none_or(batch_succeeded),
            Command::Paste { output } => {
                let mut data = Vec::new();
                std::io::stdin().read_to_end(&mut data)?;
                let mime = infer::get(&data)
                    .map(|kind| kind.mime_type())
                    .unwrap_or("application/octet-stream");
                tracing::debug!(mime, bytes = data.len(), "read stdin");
                let report = controller.on_paste(
                    PasteEvent {
                        items: vec![PasteItem {
                            mime: mime.to_string(),
                            data,
                        }],
                    },
                    save_prompt(output).as_ref(),
                );
                output::print_paste_report(&report);
                if report.ignored > 0 {
                    eprintln!("stdin does not contain an image");
                }
                report.errors.is_empty() && report.ignored == 0
            }
            Command::GenConfig | Command::ShowConfig => true,
        }
    };

    drop(tx);
    printer.join().map_err(|_| "printer thread panicked")?;

    if !succeeded {
        std::process::exit(1);
    }
    Ok(())
}

fn batch_succeeded(report: BatchReport) -> bool {
    report.is_success()
}
