//! Turning logical resource names into bytes.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Source of named asset files.
pub trait ResourceOpener: Send + Sync {
    /// Read the whole resource.
    fn open(&self, name: &str) -> io::Result<Vec<u8>>;
}

/// Reads resources from an ordered list of directories.
///
/// Earlier directories shadow later ones, so a directory of downloaded
/// updates can be listed ahead of the install directory.
#[derive(Debug, Clone)]
pub struct DirectoryOpener {
    roots: Vec<PathBuf>,
}

impl DirectoryOpener {
    pub fn new<P: AsRef<Path>>(roots: impl IntoIterator<Item = P>) -> Self {
        Self {
            roots: roots.into_iter().map(|p| p.as_ref().to_path_buf()).collect(),
        }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// First existing path for `name`, if any.
    pub fn locate(&self, name: &str) -> Option<PathBuf> {
        self.roots
            .iter()
            .map(|root| root.join(name))
            .find(|path| path.is_file())
    }
}

impl ResourceOpener for DirectoryOpener {
    fn open(&self, name: &str) -> io::Result<Vec<u8>> {
        for root in &self.roots {
            match fs::read(root.join(name)) {
                Ok(bytes) => return Ok(bytes),
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e),
            }
        }
        Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("Resource not found: {}", name),
        ))
    }
}

/// In-memory resources keyed by exact name.
#[derive(Debug, Clone, Default)]
pub struct MemoryOpener {
    files: HashMap<String, Vec<u8>>,
}

impl MemoryOpener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.files.insert(name.into(), bytes.into());
    }

    pub fn with(mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(name, bytes);
        self
    }
}

impl ResourceOpener for MemoryOpener {
    fn open(&self, name: &str) -> io::Result<Vec<u8>> {
        self.files.get(name).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("Resource not found: {}", name),
            )
        })
    }
}
