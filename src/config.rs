// ABOUTME: Configuration loading for the cdispec binary.
// ABOUTME: Reads the default output format and scratch directory from environment variables.

use std::path::PathBuf;

use cdispec_core::format::{Format, FormatError};
use thiserror::Error;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("CDISPEC_FORMAT is invalid: {0}")]
    InvalidFormat(#[from] FormatError),

    #[error("CDISPEC_SCRATCH_DIR {0} is not a directory")]
    InvalidScratchDir(PathBuf),
}

/// Binary configuration loaded from environment variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CdiSpecConfig {
    pub format: Option<Format>,
    pub scratch_dir: Option<PathBuf>,
}

impl CdiSpecConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - CDISPEC_FORMAT: default output format, `json` or `yaml` (default: unset)
    /// - CDISPEC_SCRATCH_DIR: staging directory for exports (default: OS temp dir)
    pub fn from_env() -> Result<Self, ConfigError> {
        let format = std::env::var("CDISPEC_FORMAT")
            .ok()
            .filter(|f| !f.is_empty())
            .map(|f| f.parse::<Format>())
            .transpose()?;

        let scratch_dir = std::env::var("CDISPEC_SCRATCH_DIR")
            .ok()
            .filter(|d| !d.is_empty())
            .map(PathBuf::from);

        if let Some(dir) = &scratch_dir
            && !dir.is_dir()
        {
            return Err(ConfigError::InvalidScratchDir(dir.clone()));
        }

        Ok(Self {
            format,
            scratch_dir,
        })
    }
}
