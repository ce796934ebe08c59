//! 文件服务：受限根目录下的文件操作
//!
//! 路径先用 `core::path::join("", path)` 约束，再固定拼上 base 并挂到存储根目录下；
//! 每个原语都走同一个 `operate` 包装：超时 + 日志，错误只通过返回值传递。

use super::local::LocalFileProvider;
use crate::core::path;
use crate::kernel::services::ports::file::{FileError, FileFuture, FileProvider, RawEntry, Result};
use crate::models::EntryKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub struct FileService {
    provider: Arc<dyn FileProvider>,
    storage_root: PathBuf,
    base: String,
    timeout: Option<Duration>,
}

impl FileService {
    /// Local storage confined to `<storage_root>/<base>`.
    pub fn new(storage_root: impl Into<PathBuf>, base: &str) -> Self {
        Self::with_provider(Arc::new(LocalFileProvider::new()), storage_root, base)
    }

    pub fn with_provider(
        provider: Arc<dyn FileProvider>,
        storage_root: impl Into<PathBuf>,
        base: &str,
    ) -> Self {
        Self {
            provider,
            storage_root: storage_root.into(),
            base: path::normalize(base),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn scheme(&self) -> &'static str {
        self.provider.scheme()
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn storage_root(&self) -> &Path {
        &self.storage_root
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Absolute directory every path of this service is confined to.
    pub fn root_dir(&self) -> PathBuf {
        self.resolve("")
    }

    /// Confines `relative` below the base and anchors it at the storage root.
    ///
    /// `relative` is always a store path: the base is prepended even when
    /// the path already starts with the base's own segments.
    pub fn resolve(&self, relative: &str) -> PathBuf {
        let confined = path::join("", &[relative]);
        self.base
            .split('/')
            .chain(confined.split('/'))
            .filter(|c| !c.is_empty())
            .fold(self.storage_root.clone(), |acc, c| acc.join(c))
    }

    async fn operate<T>(&self, op: &'static str, path: &Path, fut: FileFuture<'_, T>) -> Result<T> {
        let result = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, fut).await {
                Ok(result) => result,
                Err(_) => Err(FileError::TimedOut {
                    op,
                    path: path.to_path_buf(),
                }),
            },
            None => fut.await,
        };

        if let Err(err) = &result {
            tracing::warn!(op, path = %path.display(), error = %err, "file operation failed");
        }
        result
    }

    pub async fn exists(&self, path: &str) -> bool {
        let target = self.resolve(path);
        self.operate("exists", &target, self.provider.exists(&target))
            .await
            .unwrap_or(false)
    }

    pub async fn read_file(&self, path: &str) -> Result<String> {
        let target = self.resolve(path);
        self.operate("read_file", &target, self.provider.read_file(&target))
            .await
    }

    pub async fn read_dir(&self, path: &str, recursive: bool) -> Result<Vec<RawEntry>> {
        let target = self.resolve(path);
        self.operate("read_dir", &target, self.provider.read_dir(&target, recursive))
            .await
    }

    pub async fn create_file(&self, path: &str) -> Result<()> {
        let target = self.resolve(path);
        self.operate("create_file", &target, self.provider.create_file(&target))
            .await
    }

    pub async fn create_dir(&self, path: &str) -> Result<()> {
        let target = self.resolve(path);
        self.operate("create_dir", &target, self.provider.create_dir(&target))
            .await
    }

    pub async fn create(&self, path: &str, kind: EntryKind) -> Result<()> {
        match kind {
            EntryKind::File => self.create_file(path).await,
            EntryKind::Directory => self.create_dir(path).await,
        }
    }

    pub async fn write_file(&self, path: &str, content: &str) -> Result<()> {
        let target = self.resolve(path);
        self.operate(
            "write_file",
            &target,
            self.provider.write_file(&target, content),
        )
        .await
    }

    pub async fn rename(&self, old_path: &str, new_path: &str) -> Result<()> {
        let from = self.resolve(old_path);
        let to = self.resolve(new_path);
        self.operate("rename", &from, self.provider.rename(&from, &to))
            .await
    }

    pub async fn delete_file(&self, path: &str) -> Result<()> {
        let target = self.resolve(path);
        self.operate("delete_file", &target, self.provider.delete_file(&target))
            .await
    }

    pub async fn delete_dir(&self, path: &str, recursive: bool) -> Result<()> {
        let target = self.resolve(path);
        self.operate(
            "delete_dir",
            &target,
            self.provider.delete_dir(&target, recursive),
        )
        .await
    }

    /// Deletes a file, or a directory with everything below it.
    pub async fn delete(&self, path: &str, kind: EntryKind) -> Result<()> {
        match kind {
            EntryKind::File => self.delete_file(path).await,
            EntryKind::Directory => self.delete_dir(path, true).await,
        }
    }
}

#[cfg(test)]
#[path = "../../../../../tests/unit/kernel/services/adapters/file/service.rs"]
mod tests;
