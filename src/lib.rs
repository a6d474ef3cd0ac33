//! BlurBatch - Concurrent Batch Image Blur
//!
//! Discovers the `.jpg` files in a directory, blurs each one on a bounded
//! pool of workers and writes `output_<name>` files into an output directory.
//!
//! # Features
//!
//! - **Bounded Parallelism**: Pool sized to the available CPU cores
//! - **Fault Isolation**: A corrupt or unreadable file fails alone
//! - **Fail Fast**: Non-I/O faults abort the whole batch
//! - **Idempotent Output**: Re-running overwrites with identical results
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use blurbatch::{discover_images, Config, Dispatcher};
//!
//! let config = Config::new("img");
//! let files = discover_images(&config.input_dir, &config.processing.suffix)?;
//!
//! let report = Dispatcher::from_config(&config).dispatch(files)?;
//! println!("{}", report.summary_line());
//! # Ok::<(), blurbatch::BlurBatchError>(())
//! ```

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod parallel;
pub mod processing;

// Re-export commonly used types
pub use config::{BlurKind, Config, DispatchStrategy};
pub use error::{BlurBatchError, Result, Severity};
pub use parallel::{BatchReport, Dispatcher, Outcome, ProgressTracker, Task};
pub use processing::{discover_images, BlurTransform, ImageTransform, ImageWorker, OutputLayout};

use tracing::{info, warn};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the BlurBatch library with default settings
///
/// Sets up logging from `RUST_LOG` and reports system capabilities.
/// Should be called once at program start.
pub fn init() -> Result<()> {
    if tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .finish()
    ).is_ok() {
        info!("BlurBatch v{} initialized", VERSION);
    }

    validate_system_requirements();

    Ok(())
}

/// Initialize with custom configuration
///
/// `RUST_LOG`, when set, takes precedence over the configured level.
/// Logs go to stderr so stdout carries only the batch summary.
pub fn init_with_config(config: &Config) -> Result<()> {
    config.validate()?;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    let installed = if config.logging.json_format {
        tracing::subscriber::set_global_default(
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .finish()
        )
    } else {
        tracing::subscriber::set_global_default(
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .finish()
        )
    };

    if installed.is_ok() {
        info!("BlurBatch v{} initialized with custom config", VERSION);
    }

    validate_system_requirements();

    Ok(())
}

fn validate_system_requirements() {
    use sysinfo::{System, SystemExt};

    let mut system = System::new();
    system.refresh_memory();

    // Decoded images are held in memory by every worker at once
    let available_memory = system.available_memory();
    const MIN_MEMORY_MB: u64 = 256;

    if available_memory < MIN_MEMORY_MB * 1024 * 1024 {
        warn!(
            "Low available memory: {}MB (recommended: >{}MB)",
            available_memory / (1024 * 1024),
            MIN_MEMORY_MB
        );
    }

    let cpu_count = system.physical_core_count().unwrap_or(1);
    info!("Detected {} physical CPU cores, {} logical", cpu_count, num_cpus::get());

    info!("JPEG decode support: {}", image::ImageFormat::Jpeg.can_read());
}
