use clap::{Parser, Subcommand};
use qrthumb::config::{self, Config};
use qrthumb::convert::{self, ConvertOptions};
use qrthumb::imaging::{self, ComposeRequest, EcLevel, RustBackend};
use qrthumb::types::TargetSize;
use qrthumb::{job, output};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "qrthumb")]
#[command(about = "Compose QR-code thumbnails over background photos")]
#[command(long_about = "\
Compose QR-code thumbnails over background photos

The background is scaled to cover the output size, center-cropped and
darkened. The overlay (usually a QR code) is scaled to a square one third of
the shorter edge and centered, with the caption drawn below it.

  qrthumb compose background.jpeg qr.png \"Open house\" thumb.png 1280 720
  qrthumb qr https://example.com/ qr.png
  qrthumb convert screenshots/
  qrthumb build                         # everything in qrthumb.toml

Run 'qrthumb gen-config' to generate a documented qrthumb.toml.")]
#[command(version)]
struct Cli {
    /// Config file (missing file = stock defaults)
    #[arg(long, default_value = config::DEFAULT_CONFIG_FILE, global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compose one thumbnail
    Compose(ComposeArgs),
    /// Render a QR code image
    Qr(QrArgs),
    /// Convert every matching image in a directory
    Convert(ConvertArgs),
    /// Render the QR code and all thumbnails described by the config file
    Build,
    /// Print a stock qrthumb.toml with all options documented
    GenConfig,
}

#[derive(clap::Args)]
struct ComposeArgs {
    /// Background photo
    background: PathBuf,
    /// Overlay image, pasted centered
    overlay: PathBuf,
    /// Caption drawn below the overlay
    caption: String,
    /// Output file; the format follows the extension
    output: PathBuf,
    /// Output width in pixels
    #[arg(value_parser = clap::value_parser!(u32).range(1..))]
    width: u32,
    /// Output height in pixels
    #[arg(value_parser = clap::value_parser!(u32).range(1..))]
    height: u32,
    /// Caption font, tried in order (replaces the config's font list)
    #[arg(long = "font")]
    fonts: Vec<PathBuf>,
}

#[derive(clap::Args)]
struct QrArgs {
    /// Payload, typically a URL
    data: String,
    /// Output file
    output: PathBuf,
    /// Pixels per module
    #[arg(
        long,
        value_parser = clap::value_parser!(u32).range(1..=i64::from(config::MAX_QR_MODULE_SIZE))
    )]
    module_size: Option<u32>,
    /// Quiet zone, in modules
    #[arg(
        long,
        value_parser = clap::value_parser!(u32).range(..=i64::from(config::MAX_QR_BORDER))
    )]
    border: Option<u32>,
    /// Error correction level
    #[arg(long, value_enum)]
    ec_level: Option<EcLevel>,
}

#[derive(clap::Args)]
struct ConvertArgs {
    /// Directory to convert
    dir: PathBuf,
    /// Source extensions, comma separated
    #[arg(long, value_delimiter = ',')]
    from: Vec<String>,
    /// Target extension
    #[arg(long)]
    to: Option<String>,
    /// Quality for lossy targets (1-100)
    #[arg(long)]
    quality: Option<u32>,
    /// Descend into subdirectories
    #[arg(long)]
    recursive: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let backend = RustBackend::new();

    match cli.command {
        Command::Compose(args) => {
            let config = config::load_config(&cli.config)?;
            let mut compose = config.thumbnail.compose_config();
            compose.fonts = if args.fonts.is_empty() {
                let base = config_dir(&cli.config);
                compose
                    .fonts
                    .iter()
                    .map(|font| config::resolve_path(&base, font))
                    .collect()
            } else {
                args.fonts
            };
            let outcome = imaging::compose_thumbnail(
                &backend,
                &ComposeRequest {
                    background: &args.background,
                    overlay: &args.overlay,
                    caption: &args.caption,
                    output: &args.output,
                    target: TargetSize::new(args.width, args.height)?,
                },
                &compose,
            )?;
            output::print_compose_outcome(&outcome);
        }
        Command::Qr(args) => {
            let config = config::load_config(&cli.config)?;
            let mut qr = config.qr.map(|q| q.qr_config()).unwrap_or_default();
            if let Some(module_size) = args.module_size {
                qr.module_size = module_size;
            }
            if let Some(border) = args.border {
                qr.border = border;
            }
            if let Some(ec_level) = args.ec_level {
                qr.ec_level = ec_level;
            }
            let dims = imaging::generate_qr(&backend, &args.data, &args.output, &qr)?;
            output::print_qr_output(&args.output, dims);
        }
        Command::Convert(args) => {
            let mut config = config::load_config(&cli.config)?;
            if !args.from.is_empty() {
                config.convert.from = args.from;
            }
            if let Some(to) = args.to {
                config.convert.to = to;
            }
            if let Some(quality) = args.quality {
                config.convert.quality = quality;
            }
            config.convert.recursive |= args.recursive;
            config.validate()?;

            init_thread_pool(&config.processing);
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_convert_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result = convert::convert_directory(
                &backend,
                &args.dir,
                &ConvertOptions::from_config(&config.convert),
                Some(tx),
            );
            printer
                .join()
                .map_err(|_| "progress printer thread panicked")?;
            let report = result?;
            output::print_convert_summary(&report);
            if !report.failed.is_empty() {
                return Err(format!("{} file(s) failed to convert", report.failed.len()).into());
            }
        }
        Command::Build => {
            let config: Config = config::load_config(&cli.config)?;
            let report = job::run_build(&backend, &config, &config_dir(&cli.config))?;
            if let Some(qr) = &report.qr {
                output::print_qr_output(&qr.path, qr.size);
            }
            for outcome in &report.thumbnails {
                output::print_compose_outcome(outcome);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; the config can only constrain down.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

/// Directory that relative config paths are resolved against.
fn config_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
