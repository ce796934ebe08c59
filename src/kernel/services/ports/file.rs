//! File provider contract.
//!
//! A `FileProvider` exposes the raw storage primitives. It knows nothing
//! about confinement; `FileService` resolves every path before calling it.

use std::fmt;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;

pub type Result<T> = std::result::Result<T, FileError>;

pub type FileFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileError {
    NotFound(PathBuf),
    NotAFile(PathBuf),
    NotADirectory(PathBuf),
    AlreadyExists(PathBuf),
    TimedOut {
        op: &'static str,
        path: PathBuf,
    },
    Io {
        op: &'static str,
        path: PathBuf,
        message: String,
    },
}

impl FileError {
    pub fn from_io(op: &'static str, path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => FileError::NotFound(path.to_path_buf()),
            io::ErrorKind::AlreadyExists => FileError::AlreadyExists(path.to_path_buf()),
            _ => FileError::Io {
                op,
                path: path.to_path_buf(),
                message: err.to_string(),
            },
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            FileError::NotFound(path)
            | FileError::NotAFile(path)
            | FileError::NotADirectory(path)
            | FileError::AlreadyExists(path)
            | FileError::TimedOut { path, .. }
            | FileError::Io { path, .. } => path,
        }
    }
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileError::NotFound(path) => write!(f, "File not found: {}", path.display()),
            FileError::NotAFile(path) => write!(f, "Not a file: {}", path.display()),
            FileError::NotADirectory(path) => write!(f, "Not a directory: {}", path.display()),
            FileError::AlreadyExists(path) => write!(f, "Already exists: {}", path.display()),
            FileError::TimedOut { op, path } => {
                write!(f, "{} timed out: {}", op, path.display())
            }
            FileError::Io { op, path, message } => {
                write!(f, "{} failed for {}: {}", op, path.display(), message)
            }
        }
    }
}

impl std::error::Error for FileError {}

/// One node of a directory listing.
///
/// `children` is `None` for files and `Some` for directories, even empty
/// ones. Recursive listings fill it; flat listings leave it empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub name: String,
    pub path: PathBuf,
    pub children: Option<Vec<RawEntry>>,
}

impl RawEntry {
    pub fn file(path: PathBuf) -> Self {
        Self {
            name: entry_name(&path),
            path,
            children: None,
        }
    }

    pub fn dir(path: PathBuf, children: Vec<RawEntry>) -> Self {
        Self {
            name: entry_name(&path),
            path,
            children: Some(children),
        }
    }

    pub fn is_dir(&self) -> bool {
        self.children.is_some()
    }
}

fn entry_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

pub trait FileProvider: Send + Sync {
    fn scheme(&self) -> &'static str;

    fn exists<'a>(&'a self, path: &'a Path) -> FileFuture<'a, bool>;

    fn read_file<'a>(&'a self, path: &'a Path) -> FileFuture<'a, String>;

    /// Each level comes back sorted by lowercased name; the index keeps
    /// that order within a kind.
    fn read_dir<'a>(&'a self, path: &'a Path, recursive: bool) -> FileFuture<'a, Vec<RawEntry>>;

    fn create_file<'a>(&'a self, path: &'a Path) -> FileFuture<'a, ()>;

    fn create_dir<'a>(&'a self, path: &'a Path) -> FileFuture<'a, ()>;

    fn write_file<'a>(&'a self, path: &'a Path, content: &'a str) -> FileFuture<'a, ()>;

    fn rename<'a>(&'a self, from: &'a Path, to: &'a Path) -> FileFuture<'a, ()>;

    fn delete_file<'a>(&'a self, path: &'a Path) -> FileFuture<'a, ()>;

    fn delete_dir<'a>(&'a self, path: &'a Path, recursive: bool) -> FileFuture<'a, ()>;
}

#[cfg(test)]
#[path = "../../../../tests/unit/kernel/services/ports/file.rs"]
mod tests;
