//! BlurBatch CLI - Concurrent Batch Image Blur
//!
//! Blurs every `.jpg` in a directory on a pool of workers and reports how
//! many images were processed correctly.

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use blurbatch::{
    discover_images, init_with_config, BatchReport, BlurKind, Config, DispatchStrategy,
    Dispatcher, ProgressTracker,
};

/// BlurBatch - Concurrent Batch Image Blur
#[derive(Parser)]
#[command(
    name = "blurbatch",
    version,
    about = "Blur every .jpg in a directory using a pool of parallel workers",
    long_about = "BlurBatch scans an input directory (non-recursively) for files ending in .jpg, \
                  applies a blur to each one on a bounded worker pool and writes \
                  output_<name> files into <input>/out. Unreadable or corrupt files are \
                  reported and skipped; the final line reports successes out of the total."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input directory (default: img/ next to the executable)
    #[arg(short, long, value_name = "DIR")]
    input: Option<PathBuf>,

    /// Output directory (default: <input>/out)
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Number of workers (default: available CPU cores)
    #[arg(short, long, value_name = "COUNT")]
    threads: Option<usize>,

    /// Configuration file path (.toml or .yaml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Worker pool implementation
    #[arg(long, value_enum, value_name = "STRATEGY")]
    strategy: Option<CliStrategy>,

    /// Blur kernel
    #[arg(long, value_enum, value_name = "KIND")]
    blur: Option<CliBlurKind>,

    /// Gaussian blur sigma
    #[arg(long, value_name = "SIGMA")]
    sigma: Option<f32>,

    /// Output JPEG quality (1-100)
    #[arg(short, long, value_name = "QUALITY")]
    quality: Option<u8>,

    /// Artificial delay per image in milliseconds
    #[arg(long, value_name = "MS")]
    pace_ms: Option<u64>,

    /// Draw a progress bar on stderr
    #[arg(long)]
    progress: bool,

    /// Print the final report as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short = 'Q', long, conflicts_with = "verbose")]
    quiet: bool,
}

/// Available subcommands
#[derive(Subcommand)]
enum Commands {
    /// Generate example configuration file
    ExampleConfig {
        /// Output file path (.toml or .yaml)
        #[arg(short, long, default_value = "blurbatch.toml")]
        output: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliStrategy {
    Threads,
    Async,
}

impl From<CliStrategy> for DispatchStrategy {
    fn from(strategy: CliStrategy) -> Self {
        match strategy {
            CliStrategy::Threads => DispatchStrategy::Threads,
            CliStrategy::Async => DispatchStrategy::Async,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliBlurKind {
    Gaussian,
    Box,
}

impl From<CliBlurKind> for BlurKind {
    fn from(kind: CliBlurKind) -> Self {
        match kind {
            CliBlurKind::Gaussian => BlurKind::Gaussian,
            CliBlurKind::Box => BlurKind::Box,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    if let Some(command) = &cli.command {
        if let Err(e) = handle_subcommand(command) {
            eprintln!("{}: {:#}", style("Error").red().bold(), e);
            process::exit(1);
        }
        return;
    }

    match run(&cli) {
        Ok(report) => print_summary(&report, cli.json),
        Err(e) => {
            eprintln!("{}: {:#}", style("Error").red().bold(), e);
            process::exit(1);
        }
    }
}

fn handle_subcommand(command: &Commands) -> Result<()> {
    match command {
        Commands::ExampleConfig { output } => {
            Config::default()
                .to_file(output)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!(
                "{}: Generated example configuration: {}",
                style("Success").green().bold(),
                output.display()
            );
        }
    }
    Ok(())
}

fn run(cli: &Cli) -> Result<BatchReport> {
    let config = build_config(cli)?;
    init_with_config(&config).context("Invalid configuration")?;

    info!("Input: {:?}", config.input_dir);
    info!("Output: {:?}", config.output_dir());

    let files = discover_images(&config.input_dir, &config.processing.suffix)
        .with_context(|| format!("Cannot list images in {}", config.input_dir.display()))?;

    if !cli.json {
        println!("Starting processing of {} images...", files.len());
    }

    let tracker = if cli.progress && !cli.json {
        let bar = ProgressBar::new(files.len() as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})")?
                .progress_chars("#>-"),
        );
        ProgressTracker::with_bar(bar)
    } else {
        ProgressTracker::new()
    };

    let report = Dispatcher::from_config(&config)
        .with_progress(Arc::new(tracker))
        .dispatch(files)
        .context("Batch aborted")?;

    debug!("Batch finished in {:.2}s", report.elapsed.as_secs_f64());

    Ok(report)
}

/// Load the config file if given, then apply command-line overrides
fn build_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::new(default_input_dir()?),
    };

    if let Some(input) = &cli.input {
        config.input_dir = input.clone();
    }
    if let Some(output) = &cli.output {
        config.output_dir = Some(output.clone());
    }
    if let Some(threads) = cli.threads {
        config.processing.threads = Some(threads);
    }
    if let Some(strategy) = cli.strategy {
        config.processing.strategy = strategy.into();
    }
    if let Some(pace_ms) = cli.pace_ms {
        config.processing.pace_ms = Some(pace_ms);
    }
    if let Some(kind) = cli.blur {
        config.blur.kind = kind.into();
    }
    if let Some(sigma) = cli.sigma {
        config.blur.sigma = sigma;
    }
    if let Some(quality) = cli.quality {
        config.output.quality = quality;
    }

    if cli.quiet {
        config.logging.level = "error".to_string();
    } else if cli.verbose {
        config.logging.level = "debug".to_string();
    }

    Ok(config)
}

/// `img/` next to the running executable
fn default_input_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("Cannot locate the running executable")?;
    let dir = exe
        .parent()
        .context("Executable path has no parent directory")?;
    Ok(dir.join("img"))
}

fn print_summary(report: &BatchReport, json_output: bool) {
    if json_output {
        match serde_json::to_string_pretty(report) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("{}: {}", style("Error").red().bold(), e),
        }
        return;
    }

    println!(
        "{} {}",
        style("Processing finished.").bold(),
        report.summary_line()
    );
    if report.failed() > 0 {
        println!("  {}: {}", style("Failed").red(), report.failed());
    }
    println!("  {}: {:.2}s", style("Duration").blue(), report.elapsed.as_secs_f64());
}
