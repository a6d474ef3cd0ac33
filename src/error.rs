//! Error types and handling for BlurBatch

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for BlurBatch operations
pub type Result<T> = std::result::Result<T, BlurBatchError>;

/// Main error type for BlurBatch operations
#[derive(Debug, Error)]
pub enum BlurBatchError {
    /// I/O related errors
    #[error("I/O error: {source} (file: {file:?})")]
    IoError {
        #[source]
        source: std::io::Error,
        file: Option<PathBuf>,
    },

    /// Image decoding, encoding or filtering errors
    #[error("Image processing error: {source} (file: {file:?})")]
    ImageError {
        #[source]
        source: image::ImageError,
        file: Option<PathBuf>,
    },

    /// Task path has no usable file name
    #[error("Invalid task path: {path:?}")]
    InvalidTaskPath { path: PathBuf },

    /// Input directory could not be enumerated
    #[error("Failed to scan input directory {dir:?}: {source}")]
    DiscoveryError {
        dir: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    SerdeError(String),

    /// Worker pool errors (pool construction, join failures, panics)
    #[error("Parallel processing error: {message}")]
    ParallelError { message: String },

    /// System resource errors
    #[error("System resource error: {message}")]
    SystemError { message: String },
}

/// How far a task error is allowed to travel.
///
/// `Recoverable` errors are absorbed by the worker into a failed outcome;
/// `Fatal` errors abort the whole batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Recoverable,
    Fatal,
}

impl From<std::io::Error> for BlurBatchError {
    fn from(source: std::io::Error) -> Self {
        Self::IoError { source, file: None }
    }
}

impl From<image::ImageError> for BlurBatchError {
    fn from(source: image::ImageError) -> Self {
        Self::ImageError { source, file: None }
    }
}

impl BlurBatchError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new parallel processing error
    pub fn parallel<S: Into<String>>(message: S) -> Self {
        Self::ParallelError {
            message: message.into(),
        }
    }

    /// Create a new system error
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::SystemError {
            message: message.into(),
        }
    }

    /// Create a new invalid task path error
    pub fn invalid_task_path(path: PathBuf) -> Self {
        Self::InvalidTaskPath { path }
    }

    /// Classify this error for the per-task propagation boundary
    pub fn severity(&self) -> Severity {
        match self {
            Self::IoError { .. } => Severity::Recoverable,

            // Unreadable, corrupt or unwritable images count as I/O failures;
            // resource limits and bad parameters do not.
            Self::ImageError { source, .. } => match source {
                image::ImageError::IoError(_)
                | image::ImageError::Decoding(_)
                | image::ImageError::Encoding(_)
                | image::ImageError::Unsupported(_) => Severity::Recoverable,
                image::ImageError::Limits(_) | image::ImageError::Parameter(_) => Severity::Fatal,
            },

            Self::InvalidTaskPath { .. }
            | Self::DiscoveryError { .. }
            | Self::ConfigError { .. }
            | Self::SerdeError(_)
            | Self::ParallelError { .. }
            | Self::SystemError { .. } => Severity::Fatal,
        }
    }

    /// Check if this error is recoverable (processing can continue)
    pub fn is_recoverable(&self) -> bool {
        self.severity() == Severity::Recoverable
    }

    /// Get the associated file path if available
    pub fn file_path(&self) -> Option<&PathBuf> {
        match self {
            Self::IoError { file, .. } | Self::ImageError { file, .. } => file.as_ref(),
            Self::InvalidTaskPath { path } => Some(path),
            Self::DiscoveryError { dir, .. } => Some(dir),
            _ => None,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::IoError { source, .. } => format!("File system error: {}", source),
            Self::ImageError { source, .. } => format!("Image processing failed: {}", source),
            Self::DiscoveryError { dir, source } => {
                format!("Cannot read input directory {}: {}", dir.display(), source)
            }
            other => other.to_string(),
        }
    }
}

// Convert serde errors to our error type
impl From<toml::de::Error> for BlurBatchError {
    fn from(err: toml::de::Error) -> Self {
        Self::SerdeError(format!("TOML parsing error: {}", err))
    }
}

impl From<serde_yaml::Error> for BlurBatchError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::SerdeError(format!("YAML parsing error: {}", err))
    }
}

/// Error context extension for adding file path information
pub trait ErrorContext<T> {
    /// Add file context to an error
    fn with_file_context(self, file: PathBuf) -> Result<T>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<BlurBatchError>,
{
    fn with_file_context(self, file: PathBuf) -> Result<T> {
        self.map_err(|e| {
            let mut error = e.into();

            match &mut error {
                BlurBatchError::IoError { file: ref mut f, .. }
                | BlurBatchError::ImageError { file: ref mut f, .. } => {
                    if f.is_none() {
                        *f = Some(file);
                    }
                }
                _ => {}
            }

            error
        })
    }
}
