//! 文档索引服务
//!
//! Every structural change (create, rename, move, delete) goes through
//! [`NoteIndex`]. A mutation holds the tree's write guard from validation to
//! the closing refresh, so readers never see a half-applied change and at most
//! one mutation is in flight.

use std::fmt;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::core::path;
use crate::kernel::services::adapters::file::FileService;
use crate::kernel::services::bus::IndexBusSender;
use crate::kernel::services::ports::file::FileError;
use crate::models::{
    EntryKind, IndexRow, IndexTree, IndexTreeError, Notice, NoticeAnchor, PlaceholderId,
};

pub const INVALID_NAME_NOTICE: &str = "The passed entry name is not a valid file or folder name.";
pub const NAME_EXISTS_NOTICE: &str = "The passed entry name does already exist.";
pub const REFRESH_FAILED_NOTICE: &str = "The entry list could not be refreshed.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexChange {
    Created {
        kind: EntryKind,
        path: String,
    },
    Renamed {
        kind: EntryKind,
        from: String,
        to: String,
    },
    Deleted {
        kind: EntryKind,
        path: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexEvent {
    Open { kind: EntryKind, path: String },
    Changed(IndexChange),
}

impl IndexEvent {
    pub fn name(&self) -> &'static str {
        match self {
            IndexEvent::Open {
                kind: EntryKind::File,
                ..
            } => "open:file",
            IndexEvent::Open {
                kind: EntryKind::Directory,
                ..
            } => "open:directory",
            IndexEvent::Changed(_) => "changed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    InvalidName(String),
    NameExists(String),
    NotFound(String),
    NotADirectory(String),
    MoveIntoDescendant,
    Adapter(FileError),
}

impl IndexError {
    /// Text shown to the user next to the affected entry.
    pub fn notice_text(&self) -> String {
        match self {
            IndexError::InvalidName(_) => INVALID_NAME_NOTICE.to_string(),
            IndexError::NameExists(_) => NAME_EXISTS_NOTICE.to_string(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for IndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexError::InvalidName(name) => write!(f, "invalid entry name: {:?}", name),
            IndexError::NameExists(path) => write!(f, "entry already exists: {}", path),
            IndexError::NotFound(path) => write!(f, "entry not found: {}", path),
            IndexError::NotADirectory(path) => write!(f, "not a directory: {}", path),
            IndexError::MoveIntoDescendant => {
                write!(f, "cannot move a directory into itself")
            }
            IndexError::Adapter(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for IndexError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IndexError::Adapter(e) => Some(e),
            _ => None,
        }
    }
}

impl From<FileError> for IndexError {
    fn from(e: FileError) -> Self {
        IndexError::Adapter(e)
    }
}

impl From<IndexTreeError> for IndexError {
    fn from(e: IndexTreeError) -> Self {
        match e {
            IndexTreeError::NotFound(path) => IndexError::NotFound(path),
            IndexTreeError::NameExists(path) => IndexError::NameExists(path),
            IndexTreeError::ParentNotDirectory(path) => IndexError::NotADirectory(path),
            IndexTreeError::MoveIntoDescendant => IndexError::MoveIntoDescendant,
        }
    }
}

fn anchor_for(path: &str) -> NoticeAnchor {
    if path.is_empty() {
        NoticeAnchor::Root
    } else {
        NoticeAnchor::Entry(path.to_string())
    }
}

/// Logs the rejection and leaves a notice for the view.
fn reject(tree: &mut IndexTree, anchor: NoticeAnchor, err: IndexError) -> IndexError {
    tracing::warn!(error = %err, "index operation rejected");
    tree.push_notice(anchor, err.notice_text());
    err
}

/// Validates `name` and checks that `parent/name` is free.
fn check_target(
    tree: &mut IndexTree,
    parent: &str,
    name: &str,
    anchor: NoticeAnchor,
) -> Result<String, IndexError> {
    if !path::is_valid_name(name) {
        return Err(reject(tree, anchor, IndexError::InvalidName(name.to_string())));
    }
    let target = path::child_path(parent, name);
    if tree.contains(&target) {
        return Err(reject(tree, anchor, IndexError::NameExists(target)));
    }
    Ok(target)
}

fn check_parent(tree: &mut IndexTree, parent: &str) -> Result<(), IndexError> {
    if tree.is_directory(parent) {
        return Ok(());
    }
    let err = if tree.contains(parent) {
        IndexError::NotADirectory(parent.to_string())
    } else {
        IndexError::NotFound(parent.to_string())
    };
    Err(reject(tree, anchor_for(parent), err))
}

pub struct NoteIndex {
    files: Arc<FileService>,
    tree: RwLock<IndexTree>,
    events: IndexBusSender,
}

impl NoteIndex {
    pub fn new(files: Arc<FileService>, events: IndexBusSender) -> Self {
        let tree = IndexTree::new(files.root_dir());
        Self {
            files,
            tree: RwLock::new(tree),
            events,
        }
    }

    pub fn files(&self) -> &Arc<FileService> {
        &self.files
    }

    fn emit(&self, event: IndexEvent) {
        let name = event.name();
        if self.events.send(event).is_err() {
            tracing::debug!(event = name, "index bus closed, event dropped");
        }
    }

    async fn list_into(&self, tree: &mut IndexTree) -> Result<(), FileError> {
        let entries = self.files.read_dir("", true).await?;
        tree.apply_listing(&entries);
        Ok(())
    }

    /// Re-lists the whole confined directory.
    pub async fn refresh(&self) -> Result<(), IndexError> {
        let mut tree = self.tree.write().await;
        if let Err(e) = self.list_into(&mut tree).await {
            tree.push_notice(NoticeAnchor::Root, REFRESH_FAILED_NOTICE);
            return Err(e.into());
        }
        Ok(())
    }

    /// Closing step of every successful mutation. A failed re-list only
    /// leaves a notice; the mutation itself already happened on disk.
    async fn settle(&self, tree: &mut IndexTree, change: IndexChange) {
        if let Err(e) = self.list_into(tree).await {
            tracing::warn!(error = %e, "refresh after mutation failed");
            tree.push_notice(NoticeAnchor::Root, REFRESH_FAILED_NOTICE);
        }
        self.emit(IndexEvent::Changed(change));
    }

    pub async fn rows(&self) -> Vec<IndexRow> {
        self.tree.read().await.rows()
    }

    pub async fn contains(&self, path: &str) -> bool {
        self.tree.read().await.contains(path)
    }

    pub async fn kind_of(&self, path: &str) -> Option<EntryKind> {
        self.tree.read().await.kind_of(path)
    }

    pub async fn children(&self, parent: &str) -> Option<Vec<String>> {
        self.tree
            .read()
            .await
            .children(parent)
            .map(|paths| paths.into_iter().map(str::to_string).collect())
    }

    pub async fn is_renaming(&self, path: &str) -> bool {
        self.tree.read().await.is_renaming(path)
    }

    pub async fn take_notices(&self) -> Vec<Notice> {
        self.tree.write().await.take_notices()
    }

    pub async fn toggle_expand(&self, path: &str) {
        self.tree.write().await.toggle_expand(path);
    }

    /// Emits `open:file` / `open:directory` for a listed entry.
    pub async fn activate(&self, path: &str) -> Result<(), IndexError> {
        let kind = self
            .tree
            .read()
            .await
            .kind_of(path)
            .ok_or_else(|| IndexError::NotFound(path.to_string()))?;
        self.emit(IndexEvent::Open {
            kind,
            path: path.to_string(),
        });
        Ok(())
    }

    pub async fn create(
        &self,
        parent: &str,
        name: &str,
        kind: EntryKind,
    ) -> Result<String, IndexError> {
        let mut tree = self.tree.write().await;
        check_parent(&mut tree, parent)?;
        let target = check_target(&mut tree, parent, name, anchor_for(parent))?;
        self.create_locked(&mut tree, parent, target, kind).await
    }

    async fn create_locked(
        &self,
        tree: &mut IndexTree,
        parent: &str,
        target: String,
        kind: EntryKind,
    ) -> Result<String, IndexError> {
        if let Err(e) = self.files.create(&target, kind).await {
            return Err(reject(tree, anchor_for(parent), e.into()));
        }
        tracing::info!(path = %target, kind = kind.as_str(), "entry created");
        self.settle(
            tree,
            IndexChange::Created {
                kind,
                path: target.clone(),
            },
        )
        .await;
        Ok(target)
    }

    pub async fn add_placeholder(
        &self,
        parent: &str,
        kind: EntryKind,
    ) -> Result<PlaceholderId, IndexError> {
        let mut tree = self.tree.write().await;
        match tree.add_placeholder(parent, kind) {
            Ok(id) => Ok(id),
            Err(e) => Err(reject(&mut tree, anchor_for(parent), e.into())),
        }
    }

    pub async fn set_placeholder_name(&self, id: PlaceholderId, name: &str) -> bool {
        self.tree.write().await.set_placeholder_name(id, name)
    }

    /// Escape: drops the placeholder without any I/O.
    pub async fn cancel_placeholder(&self, id: PlaceholderId) -> bool {
        self.tree.write().await.take_placeholder(id).is_some()
    }

    /// Enter: tries to persist the placeholder.
    ///
    /// `Ok(None)` when the placeholder is already gone. Validation and
    /// collision failures keep it for another attempt; once the adapter is
    /// called the placeholder is removed whatever the outcome.
    pub async fn commit_placeholder(&self, id: PlaceholderId) -> Result<Option<String>, IndexError> {
        let mut tree = self.tree.write().await;
        let Some(placeholder) = tree.placeholder(id).cloned() else {
            return Ok(None);
        };
        check_parent(&mut tree, &placeholder.parent)?;
        let target = check_target(
            &mut tree,
            &placeholder.parent,
            placeholder.name.trim(),
            NoticeAnchor::Placeholder(id),
        )?;

        tree.take_placeholder(id);
        self.create_locked(&mut tree, &placeholder.parent, target, placeholder.kind)
            .await
            .map(Some)
    }

    /// Focus loss commits like Enter. After Escape the placeholder no longer
    /// exists and this is a no-op.
    pub async fn blur_placeholder(&self, id: PlaceholderId) -> Result<Option<String>, IndexError> {
        self.commit_placeholder(id).await
    }

    pub async fn begin_rename(&self, path: &str) -> Result<(), IndexError> {
        let mut tree = self.tree.write().await;
        match tree.begin_rename(path) {
            Ok(()) => Ok(()),
            Err(e) => Err(reject(&mut tree, anchor_for(path), e.into())),
        }
    }

    pub async fn set_rename_text(&self, path: &str, text: &str) -> bool {
        self.tree.write().await.set_rename_text(path, text)
    }

    /// Escape: restores the label, nothing touches the disk.
    pub async fn cancel_rename(&self, path: &str) -> bool {
        self.tree.write().await.end_rename(path)
    }

    /// Enter on the in-place editor. Returns the entry's path afterwards, or
    /// `None` when no editor is open for `path`.
    pub async fn commit_rename(&self, path: &str) -> Result<Option<String>, IndexError> {
        let mut tree = self.tree.write().await;
        let Some(text) = tree.rename_text(path).map(|t| t.trim().to_string()) else {
            return Ok(None);
        };
        if text == path::file_name(path) {
            tree.end_rename(path);
            return Ok(Some(path.to_string()));
        }

        let target = check_target(
            &mut tree,
            path::parent_path(path),
            &text,
            NoticeAnchor::Entry(path.to_string()),
        )?;
        if let Err(e) = self.move_locked(&mut tree, path, target.clone()).await {
            tree.end_rename(path);
            return Err(e);
        }
        tree.end_rename(&target);
        Ok(Some(target))
    }

    /// Renames `path` within its parent directory.
    pub async fn rename(&self, path: &str, new_name: &str) -> Result<String, IndexError> {
        let mut tree = self.tree.write().await;
        if !tree.contains(path) {
            return Err(reject(
                &mut tree,
                NoticeAnchor::Root,
                IndexError::NotFound(path.to_string()),
            ));
        }
        if new_name == path::file_name(path) {
            return Ok(path.to_string());
        }
        let target = check_target(
            &mut tree,
            path::parent_path(path),
            new_name,
            NoticeAnchor::Entry(path.to_string()),
        )?;
        self.move_locked(&mut tree, path, target.clone()).await?;
        Ok(target)
    }

    /// Moves `path` into `new_parent` (`""` is the root), keeping its name.
    pub async fn move_entry(&self, path: &str, new_parent: &str) -> Result<String, IndexError> {
        let mut tree = self.tree.write().await;
        let Some(kind) = tree.kind_of(path) else {
            return Err(reject(
                &mut tree,
                NoticeAnchor::Root,
                IndexError::NotFound(path.to_string()),
            ));
        };
        check_parent(&mut tree, new_parent)?;
        if kind.is_dir() && path::is_same_or_descendant(new_parent, path) {
            return Err(reject(
                &mut tree,
                anchor_for(path),
                IndexError::MoveIntoDescendant,
            ));
        }
        if path::parent_path(path) == new_parent {
            return Ok(path.to_string());
        }

        let target = check_target(
            &mut tree,
            new_parent,
            path::file_name(path),
            anchor_for(path),
        )?;
        self.move_locked(&mut tree, path, target.clone()).await?;
        Ok(target)
    }

    async fn move_locked(
        &self,
        tree: &mut IndexTree,
        from: &str,
        to: String,
    ) -> Result<(), IndexError> {
        let kind = tree.kind_of(from).unwrap_or(EntryKind::File);
        if let Err(e) = self.files.rename(from, &to).await {
            return Err(reject(tree, anchor_for(from), e.into()));
        }
        tracing::info!(from, to = %to, "entry renamed");

        if let Err(e) = tree.rekey(from, &to) {
            tracing::warn!(from, to = %to, error = %e, "index key move failed");
        }
        self.settle(
            tree,
            IndexChange::Renamed {
                kind,
                from: from.to_string(),
                to,
            },
        )
        .await;
        Ok(())
    }

    /// Deletes a file, or a directory with its whole subtree.
    pub async fn delete(&self, path: &str) -> Result<(), IndexError> {
        let mut tree = self.tree.write().await;
        let Some(kind) = tree.kind_of(path) else {
            return Err(reject(
                &mut tree,
                NoticeAnchor::Root,
                IndexError::NotFound(path.to_string()),
            ));
        };
        if let Err(e) = self.files.delete(path, kind).await {
            return Err(reject(&mut tree, anchor_for(path), e.into()));
        }
        tracing::info!(path, kind = kind.as_str(), "entry deleted");

        tree.evict(path);
        self.settle(
            &mut tree,
            IndexChange::Deleted {
                kind,
                path: path.to_string(),
            },
        )
        .await;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/index.rs"]
mod tests;
