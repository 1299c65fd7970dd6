// src/fs/mod.rs

//! Filesystem capability used by the loader, the finder and the copier.
//!
//! Everything returns `std::io::Result` so callers can tell "not found" apart
//! from other failures (the config search and the copier both depend on it).

use std::fmt::Debug;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

pub mod mock;

/// Abstract filesystem interface.
pub trait FileSystem: Send + Sync + Debug {
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Write `contents`, creating parent directories as needed.
    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

    /// Copy `from` to `to`, creating parent directories of `to` as needed.
    fn copy(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Remove a file or a directory tree.
    fn remove_all(&self, path: &Path) -> io::Result<()>;

    fn exists(&self, path: &Path) -> bool;
    fn is_file(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;

    /// True for a symbolic link itself, whatever it points at.
    fn is_symlink(&self, path: &Path) -> bool;

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;

    /// Return a list of entries in a directory.
    /// Returns full paths.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, contents)
    }

    fn copy(&self, from: &Path, to: &Path) -> io::Result<()> {
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(from, to).map(|_| ())
    }

    fn remove_all(&self, path: &Path) -> io::Result<()> {
        let meta = fs::symlink_metadata(path)?;
        if meta.is_dir() {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        }
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_symlink(&self, path: &Path) -> bool {
        fs::symlink_metadata(path).is_ok_and(|meta| meta.file_type().is_symlink())
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        fs::canonicalize(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path)? {
            entries.push(entry?.path());
        }
        Ok(entries)
    }
}

/// `remove_all` that treats an already-absent path as success.
pub fn remove_if_exists(fs: &dyn FileSystem, path: &Path) -> io::Result<()> {
    match fs.remove_all(path) {
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
