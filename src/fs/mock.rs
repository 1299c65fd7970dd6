// src/fs/mock.rs

use super::FileSystem;
use std::collections::HashMap;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone)]
pub enum MockEntry {
    File(Vec<u8>),
    Dir(Vec<String>), // List of child names
}

/// In-memory filesystem shared between clones.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    files: Arc<Mutex<HashMap<PathBuf, MockEntry>>>,
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(ErrorKind::NotFound, format!("no such file: {}", path.display()))
}

fn parent_of(path: &Path) -> Option<&Path> {
    match path.parent() {
        Some(parent) if parent.as_os_str().is_empty() => Some(Path::new(".")),
        Some(parent) if parent != path => Some(parent),
        _ => None,
    }
}

impl MockFileSystem {
    pub fn new() -> Self {
        let mut files = HashMap::new();
        // Ensure root exists
        files.insert(PathBuf::from("."), MockEntry::Dir(Vec::new()));

        Self {
            files: Arc::new(Mutex::new(files)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, MockEntry>> {
        self.files.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = path.as_ref().to_path_buf();
        let mut files = self.lock();
        files.insert(path.clone(), MockEntry::File(content.into()));
        Self::link_to_parent(&mut files, &path);
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut files = self.lock();
        Self::ensure_dir_entry(&mut files, path.as_ref());
    }

    /// Raw bytes of a file, if present.
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        match self.lock().get(path.as_ref()) {
            Some(MockEntry::File(content)) => Some(content.clone()),
            _ => None,
        }
    }

    fn link_to_parent(files: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
        let Some(parent) = parent_of(path) else {
            return;
        };
        Self::ensure_dir_entry(files, parent);
        if let (Some(MockEntry::Dir(children)), Some(name)) = (
            files.get_mut(parent),
            path.file_name().and_then(|n| n.to_str()),
        ) {
            if !children.iter().any(|c| c == name) {
                children.push(name.to_string());
            }
        }
    }

    fn ensure_dir_entry(files: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
        if files.contains_key(path) {
            return;
        }
        files.insert(path.to_path_buf(), MockEntry::Dir(Vec::new()));
        Self::link_to_parent(files, path);
    }
}

impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        match self.lock().get(path) {
            Some(MockEntry::File(content)) => String::from_utf8(content.clone())
                .map_err(|e| io::Error::new(ErrorKind::InvalidData, e)),
            Some(MockEntry::Dir(_)) => Err(io::Error::new(
                ErrorKind::Other,
                format!("is a directory: {}", path.display()),
            )),
            None => Err(not_found(path)),
        }
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        self.add_file(path, contents);
        Ok(())
    }

    fn copy(&self, from: &Path, to: &Path) -> io::Result<()> {
        let content = self.contents(from).ok_or_else(|| not_found(from))?;
        self.add_file(to, content);
        Ok(())
    }

    fn remove_all(&self, path: &Path) -> io::Result<()> {
        let mut files = self.lock();
        if !files.contains_key(path) {
            return Err(not_found(path));
        }
        files.retain(|p, _| !p.starts_with(path));
        let name = path.file_name().and_then(|n| n.to_str());
        if let (Some(parent), Some(name)) = (parent_of(path), name) {
            if let Some(MockEntry::Dir(children)) = files.get_mut(parent) {
                children.retain(|c| c != name);
            }
        }
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.lock().contains_key(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        matches!(self.lock().get(path), Some(MockEntry::File(_)))
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(self.lock().get(path), Some(MockEntry::Dir(_)))
    }

    fn is_symlink(&self, _path: &Path) -> bool {
        false
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        // Tests use absolute paths throughout, so the path is already canonical.
        if self.exists(path) {
            Ok(path.to_path_buf())
        } else {
            Err(not_found(path))
        }
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        match self.lock().get(path) {
            Some(MockEntry::Dir(children)) => {
                Ok(children.iter().map(|name| path.join(name)).collect())
            }
            Some(MockEntry::File(_)) => Err(io::Error::new(
                ErrorKind::Other,
                format!("not a directory: {}", path.display()),
            )),
            None => Err(not_found(path)),
        }
    }
}
