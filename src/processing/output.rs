//! Output naming and directory setup

use std::io;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{Result, BlurBatchError, ErrorContext};

/// Where and under which name processed images are written.
///
/// Two inputs that share a basename map to the same output path; the later
/// write wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    dir: PathBuf,
    prefix: String,
}

impl OutputLayout {
    pub fn new<P: Into<PathBuf>, S: Into<String>>(dir: P, prefix: S) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.output_dir(), config.output.prefix.clone())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `<dir>/<prefix><basename of input>`
    pub fn output_path_for(&self, input: &Path) -> Result<PathBuf> {
        let file_name = input
            .file_name()
            .ok_or_else(|| BlurBatchError::invalid_task_path(input.to_path_buf()))?;

        let mut name = std::ffi::OsString::from(&self.prefix);
        name.push(file_name);

        Ok(self.dir.join(name))
    }

    /// Create the output directory if missing
    pub fn ensure_dir(&self) -> Result<()> {
        ensure_dir(&self.dir)
    }
}

/// Create `dir` and its parents, treating an existing directory as success.
///
/// Safe to call from many workers at once.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    match std::fs::create_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && dir.is_dir() => Ok(()),
        Err(e) => Err(e).with_file_context(dir.to_path_buf()),
    }
}
