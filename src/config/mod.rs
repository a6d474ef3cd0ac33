//! Configuration management for BlurBatch

use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use crate::error::{Result, BlurBatchError};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory scanned (non-recursively) for input images
    pub input_dir: PathBuf,

    /// Output directory (None = `<input_dir>/out`)
    pub output_dir: Option<PathBuf>,

    /// Worker pool and discovery settings
    pub processing: ProcessingConfig,

    /// Output naming and encoding settings
    pub output: OutputConfig,

    /// Blur transform settings
    pub blur: BlurConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("img"),
            output_dir: None,
            processing: ProcessingConfig::default(),
            output: OutputConfig::default(),
            blur: BlurConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Worker pool and discovery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Number of workers (None = available hardware parallelism)
    pub threads: Option<usize>,

    /// Execution strategy for the worker pool
    pub strategy: DispatchStrategy,

    /// Artificial delay per item in milliseconds, for throughput benchmarks
    pub pace_ms: Option<u64>,

    /// Case-sensitive file name suffix selecting input files
    pub suffix: String,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            threads: None,
            strategy: DispatchStrategy::Threads,
            pace_ms: None,
            suffix: ".jpg".to_string(),
        }
    }
}

/// Output naming and encoding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Prefix prepended to the input basename
    pub prefix: String,

    /// JPEG quality (1-100)
    pub quality: u8,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            prefix: "output_".to_string(),
            quality: 90,
        }
    }
}

/// Blur transform configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlurConfig {
    /// Blur kernel
    pub kind: BlurKind,

    /// Standard deviation for the gaussian kernel
    pub sigma: f32,
}

impl Default for BlurConfig {
    fn default() -> Self {
        Self {
            kind: BlurKind::Gaussian,
            sigma: 2.0,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Enable JSON logging
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Blur kernel selection
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum BlurKind {
    /// Gaussian blur with configurable sigma
    Gaussian,
    /// Fixed 3x3 box (mean) filter; sigma is ignored
    Box,
}

/// Strategy for running the worker pool
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DispatchStrategy {
    /// Dedicated rayon thread pool
    Threads,
    /// Tokio blocking tasks bounded by a semaphore
    Async,
}

impl Config {
    /// Create a configuration for the given input directory
    pub fn new<P: Into<PathBuf>>(input_dir: P) -> Self {
        Self {
            input_dir: input_dir.into(),
            ..Default::default()
        }
    }

    /// Set an explicit output directory
    pub fn with_output_dir<P: Into<PathBuf>>(mut self, output_dir: P) -> Self {
        self.output_dir = Some(output_dir.into());
        self
    }

    /// Set the worker count
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.processing.threads = Some(threads);
        self
    }

    /// Set the dispatch strategy
    pub fn with_strategy(mut self, strategy: DispatchStrategy) -> Self {
        self.processing.strategy = strategy;
        self
    }

    /// Resolved output directory
    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| self.input_dir.join("out"))
    }

    /// Resolved worker count
    pub fn worker_count(&self) -> usize {
        self.processing.threads.unwrap_or_else(num_cpus::get)
    }

    /// Load configuration from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .map_err(|e| BlurBatchError::config(
                format!("Failed to read config file {:?}: {}", path.as_ref(), e)
            ))?;

        let extension = path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("");

        match extension.to_lowercase().as_str() {
            "toml" => toml::from_str(&content).map_err(Into::into),
            "yaml" | "yml" => serde_yaml::from_str(&content).map_err(Into::into),
            _ => Err(BlurBatchError::config(
                "Unsupported config file format. Use .toml or .yaml"
            )),
        }
    }

    /// Save configuration to file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let extension = path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("");

        let content = match extension.to_lowercase().as_str() {
            "toml" => toml::to_string_pretty(self)
                .map_err(|e| BlurBatchError::config(format!("TOML serialization failed: {}", e)))?,
            "yaml" | "yml" => serde_yaml::to_string(self)
                .map_err(|e| BlurBatchError::config(format!("YAML serialization failed: {}", e)))?,
            _ => return Err(BlurBatchError::config(
                "Unsupported config file format. Use .toml or .yaml"
            )),
        };

        std::fs::write(&path, content)
            .map_err(|e| BlurBatchError::config(
                format!("Failed to write config file {:?}: {}", path.as_ref(), e)
            ))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if let Some(threads) = self.processing.threads {
            if threads == 0 {
                return Err(BlurBatchError::config(
                    "Thread count must be greater than 0"
                ));
            }
        }

        if self.processing.suffix.is_empty() {
            return Err(BlurBatchError::config("Input suffix must not be empty"));
        }

        if self.output.quality == 0 || self.output.quality > 100 {
            return Err(BlurBatchError::config("Quality must be between 1 and 100"));
        }

        if self.output.prefix.contains(std::path::is_separator) {
            return Err(BlurBatchError::config(
                format!("Output prefix must not contain a path separator: {:?}", self.output.prefix)
            ));
        }

        if !self.blur.sigma.is_finite() || self.blur.sigma <= 0.0 {
            return Err(BlurBatchError::config(
                format!("Blur sigma must be a positive number, got {}", self.blur.sigma)
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.output.prefix, "output_");
        assert_eq!(config.processing.suffix, ".jpg");
        assert_eq!(config.processing.strategy, DispatchStrategy::Threads);
        assert!(config.processing.pace_ms.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_output_dir_defaults_under_input() {
        let config = Config::new("/data/img");
        assert_eq!(config.output_dir(), PathBuf::from("/data/img/out"));

        let config = config.with_output_dir("/elsewhere");
        assert_eq!(config.output_dir(), PathBuf::from("/elsewhere"));
    }

    #[test]
    fn test_worker_count() {
        assert!(Config::default().worker_count() > 0);
        assert_eq!(Config::default().with_threads(3).worker_count(), 3);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::new("photos").with_strategy(DispatchStrategy::Async);

        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.input_dir, PathBuf::from("photos"));
        assert_eq!(parsed.processing.strategy, DispatchStrategy::Async);

        let yaml_str = serde_yaml::to_string(&config).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml_str).unwrap();
        assert_eq!(parsed.output.quality, config.output.quality);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let parsed: Config = toml::from_str("input_dir = \"pics\"\n[blur]\nkind = \"box\"\n").unwrap();
        assert_eq!(parsed.input_dir, PathBuf::from("pics"));
        assert_eq!(parsed.blur.kind, BlurKind::Box);
        assert_eq!(parsed.output.prefix, "output_");
    }

    #[test]
    fn test_config_file_io() {
        let dir = TempDir::new().unwrap();
        let config = Config::new("photos").with_threads(2);

        let toml_path = dir.path().join("blurbatch.toml");
        config.to_file(&toml_path).unwrap();
        let loaded = Config::from_file(&toml_path).unwrap();
        assert_eq!(loaded.processing.threads, Some(2));

        let yaml_path = dir.path().join("blurbatch.yaml");
        config.to_file(&yaml_path).unwrap();
        let loaded = Config::from_file(&yaml_path).unwrap();
        assert!(loaded.validate().is_ok());

        assert!(config.to_file(dir.path().join("blurbatch.ini")).is_err());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = Config::default();
        config.processing.threads = Some(0);
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.output.quality = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.output.prefix = "sub/out_".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.blur.sigma = f32::NAN;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.processing.suffix.clear();
        assert!(config.validate().is_err());
    }
}
