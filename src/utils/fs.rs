//! Filesystem capability
//!
//! The validators only need to read a file, test for existence and, on the
//! success path, drop the intermediate typings directory.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use parking_lot::RwLock;

/// Filesystem access relative to a project root
pub trait FileSystem: Send + Sync {
    /// Working directory all relative paths are resolved against
    fn root(&self) -> &Path;

    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    fn is_file(&self, path: &Path) -> bool;

    /// True for files and directories
    fn exists(&self, path: &Path) -> bool;

    fn remove_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Absolute form of `path` for diagnostics
    fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            normalize(&self.root().join(path))
        }
    }
}

/// The real filesystem
#[derive(Debug, Clone)]
pub struct OsFileSystem {
    root: PathBuf,
}

impl OsFileSystem {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Rooted at the process working directory
    pub fn current_dir() -> io::Result<Self> {
        Ok(Self::new(std::env::current_dir()?))
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }
}

impl FileSystem for OsFileSystem {
    fn root(&self) -> &Path {
        &self.root
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(self.resolve(path))
    }

    fn is_file(&self, path: &Path) -> bool {
        self.resolve(path).is_file()
    }

    fn exists(&self, path: &Path) -> bool {
        self.resolve(path).exists()
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::remove_dir_all(self.resolve(path))
    }
}

/// In-memory tree, directories are implied by the files they contain
#[derive(Debug)]
pub struct MemoryFileSystem {
    root: PathBuf,
    files: RwLock<BTreeMap<PathBuf, String>>,
    dirs: RwLock<BTreeSet<PathBuf>>,
}

impl Default for MemoryFileSystem {
    fn default() -> Self {
        Self::new("/project")
    }
}

impl MemoryFileSystem {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            files: RwLock::new(BTreeMap::new()),
            dirs: RwLock::new(BTreeSet::new()),
        }
    }

    /// Builder-style file insertion
    pub fn with_file(self, path: impl AsRef<Path>, content: impl Into<String>) -> Self {
        self.write(path, content);
        self
    }

    /// Builder-style empty directory insertion
    pub fn with_dir(self, path: impl AsRef<Path>) -> Self {
        let key = self.key(path.as_ref());
        self.dirs.write().insert(key);
        self
    }

    pub fn write(&self, path: impl AsRef<Path>, content: impl Into<String>) {
        let key = self.key(path.as_ref());
        self.files.write().insert(key, content.into());
    }

    fn key(&self, path: &Path) -> PathBuf {
        normalize(&self.root.join(path))
    }
}

impl FileSystem for MemoryFileSystem {
    fn root(&self) -> &Path {
        &self.root
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let key = self.key(path);
        self.files.read().get(&key).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("{} not found", key.display()))
        })
    }

    fn is_file(&self, path: &Path) -> bool {
        self.files.read().contains_key(&self.key(path))
    }

    fn exists(&self, path: &Path) -> bool {
        let key = self.key(path);
        self.files.read().keys().any(|file| file.starts_with(&key))
            || self.dirs.read().iter().any(|dir| dir.starts_with(&key))
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        let key = self.key(path);
        if !self.exists(&key) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} not found", key.display()),
            ));
        }
        self.files.write().retain(|file, _| !file.starts_with(&key));
        self.dirs.write().retain(|dir| !dir.starts_with(&key));
        Ok(())
    }
}

/// Lexically resolve `.` and `..` components
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
