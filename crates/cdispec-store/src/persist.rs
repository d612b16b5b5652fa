// ABOUTME: Saves spec documents through a directory-scoped registry and streams exact copies.
// ABOUTME: Streaming stages into a guarded temp file that is removed on every exit path.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use cdispec_core::format::normalize_path;
use cdispec_core::naming::{KindNamer, NameError, SpecNamer};
use tempfile::Builder;
use thiserror::Error;

use crate::registry::{
    PersistenceDelegate, RegistryDelegate, RegistryError, RegistryOptions, SpecWriter,
};
use crate::spec::SpecDocument;

/// Errors that can occur while saving or streaming a spec document.
#[derive(Debug, Error)]
pub enum SpecError {
    #[error("failed to generate spec name: {0}")]
    Naming(#[from] NameError),

    #[error("failed to {op} {path}: {source}")]
    Io {
        op: &'static str,
        path: PathBuf,
        source: io::Error,
    },

    #[error("failed to write spec {path}: {source}")]
    Persistence { path: PathBuf, source: RegistryError },
}

impl SpecError {
    fn io<'a>(op: &'static str, path: &'a Path) -> impl FnOnce(io::Error) -> Self + 'a {
        move |source| SpecError::Io {
            op,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Saves and streams spec documents using injected naming and persistence collaborators.
#[derive(Debug, Clone, Default)]
pub struct Persister<P = RegistryDelegate, N = KindNamer> {
    delegate: P,
    namer: N,
    scratch_dir: Option<PathBuf>,
}

impl Persister {
    /// A persister using the on-disk registry and kind-based naming.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<P, N> Persister<P, N>
where
    P: PersistenceDelegate,
    N: SpecNamer,
{
    pub fn with_delegate<Q: PersistenceDelegate>(self, delegate: Q) -> Persister<Q, N> {
        Persister {
            delegate,
            namer: self.namer,
            scratch_dir: self.scratch_dir,
        }
    }

    pub fn with_namer<M: SpecNamer>(self, namer: M) -> Persister<P, M> {
        Persister {
            delegate: self.delegate,
            namer,
            scratch_dir: self.scratch_dir,
        }
    }

    /// Stage streamed exports in `dir` instead of the OS temp directory.
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    fn scratch_dir(&self) -> PathBuf {
        self.scratch_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Write the document to `path`, overwriting any existing file.
    ///
    /// The path gets the document's extension appended unless it already ends in
    /// `.yaml` or `.json`. Returns the normalized path actually written.
    pub fn save(&self, doc: &SpecDocument, path: impl AsRef<Path>) -> Result<PathBuf, SpecError> {
        let path = normalize_path(path, doc.format());

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| SpecError::Persistence {
                path: path.clone(),
                source: RegistryError::InvalidName(path.display().to_string()),
            })?;

        let registry = self
            .delegate
            .open(
                RegistryOptions::new()
                    .with_spec_dirs([dir])
                    .with_auto_refresh(false),
            )
            .map_err(|source| SpecError::Persistence {
                path: path.clone(),
                source,
            })?;

        registry
            .write_spec(doc.raw(), name)
            .map_err(|source| SpecError::Persistence {
                path: path.clone(),
                source,
            })?;

        Ok(path)
    }

    /// Stream the document, serialized exactly as [`Persister::save`] would write
    /// it, into `sink`. Returns the number of bytes copied.
    ///
    /// Nothing reaches the sink unless the staged file was written completely.
    /// A sink that fails mid-copy may be left holding a truncated stream.
    pub fn write_to<W>(&self, doc: &SpecDocument, sink: &mut W) -> Result<u64, SpecError>
    where
        W: Write + ?Sized,
    {
        let name = self.namer.name_for(doc.raw())?;
        let name = normalize_path(name, doc.format());
        let suffix = name.file_name().unwrap_or(name.as_os_str());

        let scratch = self.scratch_dir();
        let staged = Builder::new()
            .prefix("")
            .suffix(suffix)
            .tempfile_in(&scratch)
            .map_err(SpecError::io("create temporary file in", &scratch))?;

        // From here on `staged` (and then `staged_path`) deletes the file when dropped.
        self.save(doc, staged.path())?;

        let (file, staged_path) = staged.into_parts();
        file.sync_all()
            .map_err(SpecError::io("close temporary file", &staged_path))?;
        drop(file);

        let mut reader =
            File::open(&staged_path).map_err(SpecError::io("open temporary file", &staged_path))?;
        let copied = io::copy(&mut reader, sink)
            .map_err(SpecError::io("copy temporary file", &staged_path))?;
        drop(reader);

        let staged_name = staged_path.display().to_string();
        if let Err(e) = staged_path.close() {
            tracing::warn!("failed to remove temporary file {}: {}", staged_name, e);
        }

        tracing::debug!("streamed {} bytes of spec {}", copied, name.display());
        Ok(copied)
    }
}
