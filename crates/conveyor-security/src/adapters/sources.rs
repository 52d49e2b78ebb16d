//! Byte-source and passphrase adapters.

use crate::ports::outbound::{ByteSource, PassphraseResolver};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use zeroize::Zeroizing;

/// A byte source backed by a file on disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    /// Create a source for the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The underlying path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ByteSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn read(&self) -> io::Result<Vec<u8>> {
        fs::read(&self.path)
    }
}

/// A byte source holding its bytes in memory.
///
/// Used by tests and by embedders that fetch material from a secret
/// manager before calling setup.
#[derive(Debug, Clone)]
pub struct MemorySource {
    label: String,
    bytes: Vec<u8>,
}

impl MemorySource {
    /// Create a source from in-memory bytes. `label` shows up in error
    /// messages in place of a path.
    pub fn new(label: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            label: label.into(),
            bytes: bytes.into(),
        }
    }
}

impl ByteSource for MemorySource {
    fn describe(&self) -> String {
        format!("<in-memory: {}>", self.label)
    }

    fn read(&self) -> io::Result<Vec<u8>> {
        Ok(self.bytes.clone())
    }
}

/// Expand a directory into one [`FileSource`] per regular file, sorted by
/// file name. This is how a trust-store directory becomes a list of
/// certificate sources.
pub fn dir_sources(dir: &Path) -> io::Result<Vec<Box<dyn ByteSource>>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .collect::<io::Result<Vec<_>>>()?
        .into_iter()
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    paths.sort();

    Ok(paths
        .into_iter()
        .map(|path| Box::new(FileSource::new(path)) as Box<dyn ByteSource>)
        .collect())
}

/// Resolver for keys that are not passphrase-protected.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPassphrase;

impl PassphraseResolver for NoPassphrase {
    fn resolve(&self) -> Option<Zeroizing<Vec<u8>>> {
        None
    }
}

/// Resolver returning a passphrase fixed at construction time (typically
/// read from an environment variable or secret manager by the embedder).
pub struct StaticPassphrase {
    passphrase: Zeroizing<Vec<u8>>,
}

impl StaticPassphrase {
    /// Wrap the given passphrase bytes.
    pub fn new(passphrase: impl Into<Vec<u8>>) -> Self {
        Self {
            passphrase: Zeroizing::new(passphrase.into()),
        }
    }
}

impl PassphraseResolver for StaticPassphrase {
    fn resolve(&self) -> Option<Zeroizing<Vec<u8>>> {
        Some(self.passphrase.clone())
    }
}
