//! 本地文件系统 Provider
//!
//! 实现 FileProvider trait，基于 tokio::fs 操作本地文件系统

use crate::kernel::services::ports::file::{FileError, FileFuture, FileProvider, RawEntry, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

pub fn should_ignore(name: &str) -> bool {
    matches!(
        name,
        ".DS_Store"
            | ".Spotlight-V100"
            | ".Trashes"
            | ".fseventsd"
            | ".TemporaryItems"
            | "Thumbs.db"
            | "desktop.ini"
            | ".git"
    )
}

pub struct LocalFileProvider;

impl LocalFileProvider {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LocalFileProvider {
    fn default() -> Self {
        Self::new()
    }
}

async fn path_exists(op: &'static str, path: &Path) -> Result<bool> {
    fs::try_exists(path)
        .await
        .map_err(|e| FileError::from_io(op, path, e))
}

fn list_dir(path: PathBuf, recursive: bool) -> FileFuture<'static, Vec<RawEntry>> {
    Box::pin(async move {
        let mut reader = fs::read_dir(&path)
            .await
            .map_err(|e| FileError::from_io("read_dir", &path, e))?;

        let mut entries = Vec::new();
        while let Some(entry) = reader
            .next_entry()
            .await
            .map_err(|e| FileError::from_io("read_dir", &path, e))?
        {
            let name = entry.file_name().to_string_lossy().to_string();
            if should_ignore(&name) {
                continue;
            }
            let Ok(file_type) = entry.file_type().await else {
                continue;
            };

            let entry_path = entry.path();
            if file_type.is_dir() {
                let children = if recursive {
                    list_dir(entry_path.clone(), true).await?
                } else {
                    Vec::new()
                };
                entries.push(RawEntry::dir(entry_path, children));
            } else {
                entries.push(RawEntry::file(entry_path));
            }
        }

        entries.sort_by_key(|e| e.name.to_lowercase());
        Ok(entries)
    })
}

impl FileProvider for LocalFileProvider {
    fn scheme(&self) -> &'static str {
        "file"
    }

    fn exists<'a>(&'a self, path: &'a Path) -> FileFuture<'a, bool> {
        Box::pin(path_exists("exists", path))
    }

    fn read_file<'a>(&'a self, path: &'a Path) -> FileFuture<'a, String> {
        Box::pin(async move {
            let meta = fs::metadata(path)
                .await
                .map_err(|e| FileError::from_io("read_file", path, e))?;
            if !meta.is_file() {
                return Err(FileError::NotAFile(path.to_path_buf()));
            }
            fs::read_to_string(path)
                .await
                .map_err(|e| FileError::from_io("read_file", path, e))
        })
    }

    fn read_dir<'a>(&'a self, path: &'a Path, recursive: bool) -> FileFuture<'a, Vec<RawEntry>> {
        list_dir(path.to_path_buf(), recursive)
    }

    fn create_file<'a>(&'a self, path: &'a Path) -> FileFuture<'a, ()> {
        Box::pin(async move {
            fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(path)
                .await
                .map(|_| ())
                .map_err(|e| FileError::from_io("create_file", path, e))
        })
    }

    fn create_dir<'a>(&'a self, path: &'a Path) -> FileFuture<'a, ()> {
        Box::pin(async move {
            if path_exists("create_dir", path).await? {
                return Err(FileError::AlreadyExists(path.to_path_buf()));
            }
            fs::create_dir(path)
                .await
                .map_err(|e| FileError::from_io("create_dir", path, e))
        })
    }

    fn write_file<'a>(&'a self, path: &'a Path, content: &'a str) -> FileFuture<'a, ()> {
        Box::pin(async move {
            if let Some(parent) = path.parent() {
                if !path_exists("write_file", parent).await? {
                    fs::create_dir_all(parent)
                        .await
                        .map_err(|e| FileError::from_io("write_file", parent, e))?;
                }
            }
            fs::write(path, content)
                .await
                .map_err(|e| FileError::from_io("write_file", path, e))
        })
    }

    fn rename<'a>(&'a self, from: &'a Path, to: &'a Path) -> FileFuture<'a, ()> {
        Box::pin(async move {
            if !path_exists("rename", from).await? {
                return Err(FileError::NotFound(from.to_path_buf()));
            }
            if path_exists("rename", to).await? {
                return Err(FileError::AlreadyExists(to.to_path_buf()));
            }
            fs::rename(from, to)
                .await
                .map_err(|e| FileError::from_io("rename", from, e))
        })
    }

    fn delete_file<'a>(&'a self, path: &'a Path) -> FileFuture<'a, ()> {
        Box::pin(async move {
            let meta = fs::metadata(path)
                .await
                .map_err(|e| FileError::from_io("delete_file", path, e))?;
            if !meta.is_file() {
                return Err(FileError::NotAFile(path.to_path_buf()));
            }
            fs::remove_file(path)
                .await
                .map_err(|e| FileError::from_io("delete_file", path, e))
        })
    }

    fn delete_dir<'a>(&'a self, path: &'a Path, recursive: bool) -> FileFuture<'a, ()> {
        Box::pin(async move {
            let meta = fs::metadata(path)
                .await
                .map_err(|e| FileError::from_io("delete_dir", path, e))?;
            if !meta.is_dir() {
                return Err(FileError::NotADirectory(path.to_path_buf()));
            }
            let result = if recursive {
                fs::remove_dir_all(path).await
            } else {
                fs::remove_dir(path).await
            };
            result.map_err(|e| FileError::from_io("delete_dir", path, e))
        })
    }
}

#[cfg(test)]
#[path = "../../../../../tests/unit/kernel/services/adapters/file/local.rs"]
mod tests;
