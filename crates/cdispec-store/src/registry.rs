// ABOUTME: Directory-scoped CDI spec registry that encodes and durably writes spec files.
// ABOUTME: Writes stage into a sibling temp file, fsync, then rename over the destination.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use cdispec_core::Spec;
use cdispec_core::format::{Format, has_recognized_extension, normalize_path};
use tempfile::Builder;
use thiserror::Error;

/// Errors that can occur during registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("io error at {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("no spec directories configured")]
    NoSpecDirs,

    #[error("spec directory {0} does not exist or is not a directory")]
    InvalidDirectory(PathBuf),

    #[error("invalid spec file name {0:?}")]
    InvalidName(String),
}

impl RegistryError {
    fn io(path: &Path) -> impl FnOnce(io::Error) -> Self + '_ {
        move |source| RegistryError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Options for opening a registry. Later directories take priority over earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryOptions {
    pub spec_dirs: Vec<PathBuf>,
    pub auto_refresh: bool,
}

impl RegistryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_spec_dirs<I, P>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.spec_dirs = dirs.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_auto_refresh(mut self, auto_refresh: bool) -> Self {
        self.auto_refresh = auto_refresh;
        self
    }
}

/// A handle able to persist a spec under a base name.
pub trait SpecWriter {
    /// Write `raw` as `name` and return the path written.
    fn write_spec(&self, raw: &Spec, name: &str) -> Result<PathBuf, RegistryError>;
}

/// Opens registry handles. Save constructs a fresh handle per call, scoped to
/// the destination directory, through this trait.
pub trait PersistenceDelegate {
    type Handle: SpecWriter;

    fn open(&self, options: RegistryOptions) -> Result<Self::Handle, RegistryError>;
}

/// The default delegate, backed by [`SpecRegistry`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RegistryDelegate;

impl PersistenceDelegate for RegistryDelegate {
    type Handle = SpecRegistry;

    fn open(&self, options: RegistryOptions) -> Result<SpecRegistry, RegistryError> {
        SpecRegistry::open(options)
    }
}

/// A registry over one or more spec directories.
#[derive(Debug, Clone)]
pub struct SpecRegistry {
    spec_dirs: Vec<PathBuf>,
    auto_refresh: bool,
}

impl SpecRegistry {
    /// Open a registry over the given directories. At least one directory is required.
    /// Background refresh is not supported; requesting it logs a warning.
    pub fn open(options: RegistryOptions) -> Result<Self, RegistryError> {
        if options.spec_dirs.is_empty() {
            return Err(RegistryError::NoSpecDirs);
        }
        if options.auto_refresh {
            tracing::warn!("spec registry auto-refresh is not supported, continuing without it");
        }

        Ok(Self {
            spec_dirs: options.spec_dirs,
            auto_refresh: false,
        })
    }

    /// Spec directories in increasing priority order.
    pub fn spec_dirs(&self) -> &[PathBuf] {
        &self.spec_dirs
    }

    pub fn auto_refresh(&self) -> bool {
        self.auto_refresh
    }

    /// The directory new specs are written to: the last (highest priority) one.
    fn write_dir(&self) -> Result<&Path, RegistryError> {
        self.spec_dirs
            .last()
            .map(PathBuf::as_path)
            .ok_or(RegistryError::NoSpecDirs)
    }

    fn spec_path(&self, name: &str) -> Result<PathBuf, RegistryError> {
        if name.is_empty() || Path::new(name).file_name().and_then(|n| n.to_str()) != Some(name) {
            return Err(RegistryError::InvalidName(name.to_string()));
        }
        Ok(normalize_path(self.write_dir()?.join(name), None))
    }

    /// Read and decode a spec file, choosing the decoder from its extension.
    pub fn read_spec(path: &Path) -> Result<Spec, RegistryError> {
        let data = fs::read(path).map_err(RegistryError::io(path))?;
        let spec = match Format::from_path(path) {
            Some(Format::Json) => serde_json::from_slice(&data)?,
            Some(Format::Yaml) | None => serde_yaml::from_slice(&data)?,
        };
        Ok(spec)
    }

    /// Remove a spec previously written under `name`. A missing file is not an error.
    pub fn remove_spec(&self, name: &str) -> Result<(), RegistryError> {
        let path = self.spec_path(name)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!("removed spec {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(RegistryError::Io { path, source: e }),
        }
    }

    /// List spec files across all directories in priority order.
    /// Directories that do not exist are skipped.
    pub fn list_spec_files(&self) -> Result<Vec<PathBuf>, RegistryError> {
        let mut files = Vec::new();
        for dir in &self.spec_dirs {
            if !dir.is_dir() {
                continue;
            }

            let mut in_dir = Vec::new();
            for entry in fs::read_dir(dir).map_err(RegistryError::io(dir))? {
                let path = entry.map_err(RegistryError::io(dir))?.path();
                if path.is_file() && has_recognized_extension(&path) {
                    in_dir.push(path);
                }
            }
            in_dir.sort();
            files.extend(in_dir);
        }
        Ok(files)
    }
}

impl SpecWriter for SpecRegistry {
    fn write_spec(&self, raw: &Spec, name: &str) -> Result<PathBuf, RegistryError> {
        let path = self.spec_path(name)?;
        let dir = self.write_dir()?;
        if !dir.is_dir() {
            return Err(RegistryError::InvalidDirectory(dir.to_path_buf()));
        }

        let data = encode(raw, Format::from_path(&path))?;

        let mut staged = Builder::new()
            .prefix(".cdispec-")
            .suffix(".tmp")
            .tempfile_in(dir)
            .map_err(RegistryError::io(dir))?;
        staged.write_all(&data).map_err(RegistryError::io(staged.path()))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            staged
                .as_file()
                .set_permissions(fs::Permissions::from_mode(0o644))
                .map_err(RegistryError::io(staged.path()))?;
        }
        staged.as_file().sync_all().map_err(RegistryError::io(staged.path()))?;

        staged.persist(&path).map_err(|e| RegistryError::Io {
            path: path.clone(),
            source: e.error,
        })?;

        tracing::debug!("wrote spec {} ({} bytes)", path.display(), data.len());
        Ok(path)
    }
}

/// Serialize a spec for the given on-disk format. Unset means YAML.
pub fn encode(raw: &Spec, format: Option<Format>) -> Result<Vec<u8>, RegistryError> {
    match format {
        Some(Format::Json) => {
            let mut data = serde_json::to_vec_pretty(raw)?;
            data.push(b'\n');
            Ok(data)
        }
        Some(Format::Yaml) | None => Ok(serde_yaml::to_string(raw)?.into_bytes()),
    }
}
