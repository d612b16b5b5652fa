// ABOUTME: Spec file formats and the mapping from format tag to on-disk file extension.
// ABOUTME: Normalizes target paths so every written spec ends in a recognized extension.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Extension used for YAML encoded specs, and for any spec without a format tag.
pub const YAML_EXTENSION: &str = ".yaml";

/// Extension used for JSON encoded specs.
pub const JSON_EXTENSION: &str = ".json";

/// Errors that can occur while parsing a format name.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("unsupported spec format {0:?}; expected \"json\" or \"yaml\"")]
    Unsupported(String),
}

/// The serialization format declared for a spec document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Yaml,
    Json,
}

impl Format {
    /// Infer a format from a path's extension. Only `.json` and `.yaml` are recognized.
    /// A trailing separator means the path has no extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.as_os_str().as_encoded_bytes();
        if name.ends_with(JSON_EXTENSION.as_bytes()) {
            Some(Format::Json)
        } else if name.ends_with(YAML_EXTENSION.as_bytes()) {
            Some(Format::Yaml)
        } else {
            None
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Yaml => f.write_str("yaml"),
            Format::Json => f.write_str("json"),
        }
    }
}

impl FromStr for Format {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Ok(Format::Yaml),
            "json" => Ok(Format::Json),
            _ => Err(FormatError::Unsupported(s.to_string())),
        }
    }
}

/// Return the file extension (with leading dot) for a format tag.
/// An unset tag falls back to YAML.
pub fn extension_for(format: Option<Format>) -> &'static str {
    match format {
        Some(Format::Json) => JSON_EXTENSION,
        Some(Format::Yaml) | None => YAML_EXTENSION,
    }
}

/// True if the path ends in exactly `.yaml` or `.json`.
pub fn has_recognized_extension(path: &Path) -> bool {
    Format::from_path(path).is_some()
}

/// Ensure `path` ends in a recognized spec extension.
///
/// A path that already ends in `.yaml` or `.json` is returned unchanged, even if
/// that extension disagrees with `format`. Anything else gets the format's
/// extension appended verbatim, so `report.txt` becomes `report.txt.yaml`.
pub fn normalize_path(path: impl AsRef<Path>, format: Option<Format>) -> PathBuf {
    let path = path.as_ref();
    if has_recognized_extension(path) {
        return path.to_path_buf();
    }

    let mut raw: OsString = path.as_os_str().to_os_string();
    raw.push(extension_for(format));
    PathBuf::from(raw)
}
