//! 文档索引树数据模型
//!
//! Mirrors the confined document directory. Nodes live in a slotmap arena and
//! are memoized by their relative path, so a node (and the transient rename
//! editor it may carry) survives any number of re-listings.

use crate::core::path;
use crate::kernel::services::ports::file::RawEntry;
use rustc_hash::{FxHashMap, FxHashSet};
use slotmap::{new_key_type, SlotMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

new_key_type! {
    pub struct NodeId;
    pub struct PlaceholderId;
}

pub const NOTICE_DURATION: Duration = Duration::from_millis(2000);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EntryKind {
    File,
    Directory,
}

impl EntryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryKind::File => "file",
            EntryKind::Directory => "directory",
        }
    }

    pub fn is_dir(self) -> bool {
        self == EntryKind::Directory
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexTreeError {
    NotFound(String),
    NameExists(String),
    ParentNotDirectory(String),
    MoveIntoDescendant,
}

impl fmt::Display for IndexTreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexTreeError::NotFound(path) => write!(f, "no entry at {}", path),
            IndexTreeError::NameExists(path) => write!(f, "{} already exists", path),
            IndexTreeError::ParentNotDirectory(path) => {
                write!(f, "{} is not a directory", path)
            }
            IndexTreeError::MoveIntoDescendant => {
                write!(f, "cannot move a directory into its own subtree")
            }
        }
    }
}

impl std::error::Error for IndexTreeError {}

#[derive(Debug, Clone)]
struct Node {
    path: String,
    kind: EntryKind,
    /// `None` until the directory has been listed.
    children: Option<Vec<NodeId>>,
    expanded: bool,
    /// In-place rename buffer while the editor is open.
    rename: Option<String>,
}

impl Node {
    fn new(path: String, kind: EntryKind) -> Self {
        Self {
            path,
            kind,
            children: None,
            expanded: kind.is_dir(),
            rename: None,
        }
    }
}

/// A create in progress. Never part of the persisted listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub parent: String,
    pub kind: EntryKind,
    pub name: String,
    pub focused: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoticeAnchor {
    Placeholder(PlaceholderId),
    Entry(String),
    Root,
}

/// Transient user-facing message, drained by the view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub anchor: NoticeAnchor,
    pub text: String,
    pub duration: Duration,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RowId {
    Entry(NodeId),
    Placeholder(PlaceholderId),
}

#[derive(Debug, Clone)]
pub struct IndexRow {
    pub id: RowId,
    /// Entry path, or the parent path for placeholders.
    pub path: String,
    pub depth: u16,
    pub label: String,
    pub kind: EntryKind,
    pub is_expanded: bool,
    pub is_placeholder: bool,
    pub is_editing: bool,
}

pub struct IndexTree {
    root: PathBuf,
    arena: SlotMap<NodeId, Node>,
    memo: FxHashMap<String, NodeId>,
    top_level: Option<Vec<NodeId>>,
    placeholders: SlotMap<PlaceholderId, Placeholder>,
    /// Placeholder display order, newest first.
    pending: Vec<PlaceholderId>,
    notices: Vec<Notice>,
}

impl IndexTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            arena: SlotMap::with_key(),
            memo: FxHashMap::default(),
            top_level: None,
            placeholders: SlotMap::with_key(),
            pending: Vec::new(),
            notices: Vec::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_listed(&self) -> bool {
        self.top_level.is_some()
    }

    pub fn len(&self) -> usize {
        self.memo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memo.is_empty()
    }

    /// Path of `abs` relative to the root, `/` separated, without a leading
    /// slash. `None` for the root itself or anything outside it.
    pub fn relative_path(&self, abs: &Path) -> Option<String> {
        let rel = abs.strip_prefix(&self.root).ok()?;
        let rel = rel.to_string_lossy().replace('\\', "/");
        let rel = rel.strip_prefix('/').unwrap_or(&rel);
        (!rel.is_empty()).then(|| rel.to_string())
    }

    /// Replaces the listing with a fresh recursive `read_dir` result.
    ///
    /// Known paths keep their node; paths missing from the listing are
    /// evicted.
    pub fn apply_listing(&mut self, entries: &[RawEntry]) {
        let mut seen = FxHashSet::default();
        let top = self.materialize(entries, &mut seen);
        self.top_level = Some(top);

        let stale: Vec<String> = self
            .memo
            .keys()
            .filter(|p| !seen.contains(*p))
            .cloned()
            .collect();
        for path in stale {
            if let Some(id) = self.memo.remove(&path) {
                self.arena.remove(id);
            }
        }

        let memo = &self.memo;
        let arena = &self.arena;
        self.placeholders.retain(|_, p| {
            p.parent.is_empty()
                || memo
                    .get(&p.parent)
                    .and_then(|id| arena.get(*id))
                    .is_some_and(|n| n.kind.is_dir())
        });
        let placeholders = &self.placeholders;
        self.pending.retain(|id| placeholders.contains_key(*id));
    }

    fn materialize(&mut self, entries: &[RawEntry], seen: &mut FxHashSet<String>) -> Vec<NodeId> {
        let mut ids = Vec::with_capacity(entries.len());
        for entry in entries {
            let Some(rel) = self.relative_path(&entry.path) else {
                continue;
            };
            let kind = if entry.is_dir() {
                EntryKind::Directory
            } else {
                EntryKind::File
            };
            let children = entry
                .children
                .as_ref()
                .map(|children| self.materialize(children, seen));

            let existing = self.memo.get(&rel).copied();
            let id = match existing {
                Some(id) if self.arena.get(id).is_some_and(|n| n.kind == kind) => id,
                previous => {
                    if let Some(old) = previous {
                        self.arena.remove(old);
                    }
                    let id = self.arena.insert(Node::new(rel.clone(), kind));
                    self.memo.insert(rel.clone(), id);
                    id
                }
            };
            if let Some(node) = self.arena.get_mut(id) {
                node.children = children;
            }
            seen.insert(rel);
            ids.push(id);
        }
        self.sort_listing(&mut ids);
        ids
    }

    /// Stable partition: directories first, source order kept within a kind.
    fn sort_listing(&self, ids: &mut [NodeId]) {
        ids.sort_by_key(|id| {
            self.arena
                .get(*id)
                .map_or(true, |n| n.kind == EntryKind::File)
        });
    }

    pub fn lookup(&self, path: &str) -> Option<NodeId> {
        self.memo.get(path).copied()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.memo.contains_key(path)
    }

    pub fn kind_of(&self, path: &str) -> Option<EntryKind> {
        self.lookup(path)
            .and_then(|id| self.arena.get(id))
            .map(|n| n.kind)
    }

    pub fn path_of(&self, id: NodeId) -> Option<&str> {
        self.arena.get(id).map(|n| n.path.as_str())
    }

    /// `true` for the root (`""`) and for every known directory.
    pub fn is_directory(&self, path: &str) -> bool {
        path.is_empty() || self.kind_of(path) == Some(EntryKind::Directory)
    }

    /// Relative paths of the direct children of `parent`, in display order.
    pub fn children(&self, parent: &str) -> Option<Vec<&str>> {
        self.listing(parent).map(|ids| {
            ids.iter()
                .filter_map(|id| self.path_of(*id))
                .collect()
        })
    }

    fn listing(&self, parent: &str) -> Option<&Vec<NodeId>> {
        if parent.is_empty() {
            return self.top_level.as_ref();
        }
        let id = self.lookup(parent)?;
        self.arena.get(id)?.children.as_ref()
    }

    fn listing_mut(&mut self, parent: &str) -> Option<&mut Vec<NodeId>> {
        if parent.is_empty() {
            return self.top_level.as_mut();
        }
        let id = self.lookup(parent)?;
        self.arena.get_mut(id)?.children.as_mut()
    }

    pub fn expand(&mut self, path: &str) {
        if let Some(node) = self.lookup(path).and_then(|id| self.arena.get_mut(id)) {
            if node.kind.is_dir() {
                node.expanded = true;
            }
        }
    }

    pub fn collapse(&mut self, path: &str) {
        if let Some(node) = self.lookup(path).and_then(|id| self.arena.get_mut(id)) {
            node.expanded = false;
        }
    }

    pub fn toggle_expand(&mut self, path: &str) {
        if let Some(node) = self.lookup(path).and_then(|id| self.arena.get_mut(id)) {
            if node.kind.is_dir() {
                node.expanded = !node.expanded;
            }
        }
    }

    pub fn is_expanded(&self, path: &str) -> bool {
        self.lookup(path)
            .and_then(|id| self.arena.get(id))
            .is_some_and(|n| n.expanded)
    }

    /// Moves the node at `from` to `to`, keeping its handle. Every memo key
    /// below `from` is rewritten.
    pub fn rekey(&mut self, from: &str, to: &str) -> Result<(), IndexTreeError> {
        let id = self
            .lookup(from)
            .ok_or_else(|| IndexTreeError::NotFound(from.to_string()))?;
        if from == to {
            return Ok(());
        }
        if self.contains(to) {
            return Err(IndexTreeError::NameExists(to.to_string()));
        }

        let new_parent = path::parent_path(to);
        if !self.is_directory(new_parent) {
            return Err(IndexTreeError::ParentNotDirectory(new_parent.to_string()));
        }
        if path::is_same_or_descendant(new_parent, from) {
            return Err(IndexTreeError::MoveIntoDescendant);
        }

        if let Some(listing) = self.listing_mut(path::parent_path(from)) {
            listing.retain(|child| *child != id);
        }

        let moved: Vec<(String, NodeId)> = self
            .memo
            .iter()
            .filter(|(p, _)| path::is_same_or_descendant(p, from))
            .map(|(p, id)| (p.clone(), *id))
            .collect();
        for (old, node_id) in moved {
            self.memo.remove(&old);
            let new = format!("{}{}", to, &old[from.len()..]);
            if let Some(node) = self.arena.get_mut(node_id) {
                node.path = new.clone();
            }
            self.memo.insert(new, node_id);
        }

        for placeholder in self.placeholders.values_mut() {
            if path::is_same_or_descendant(&placeholder.parent, from) {
                placeholder.parent = format!("{}{}", to, &placeholder.parent[from.len()..]);
            }
        }

        let mut listing = self.listing(new_parent).cloned().unwrap_or_default();
        listing.push(id);
        self.sort_listing(&mut listing);
        if let Some(slot) = self.listing_mut(new_parent) {
            *slot = listing;
        }
        Ok(())
    }

    /// Drops the node at `path` and its whole subtree. Returns its kind.
    pub fn evict(&mut self, path: &str) -> Option<EntryKind> {
        let id = self.lookup(path)?;
        let kind = self.arena.get(id)?.kind;

        if let Some(listing) = self.listing_mut(path::parent_path(path)) {
            listing.retain(|child| *child != id);
        }

        let doomed: Vec<String> = self
            .memo
            .keys()
            .filter(|p| path::is_same_or_descendant(p, path))
            .cloned()
            .collect();
        for key in doomed {
            if let Some(node_id) = self.memo.remove(&key) {
                self.arena.remove(node_id);
            }
        }

        self.placeholders
            .retain(|_, p| !path::is_same_or_descendant(&p.parent, path));
        let placeholders = &self.placeholders;
        self.pending.retain(|id| placeholders.contains_key(*id));
        Some(kind)
    }

    /// Adds a focused, empty placeholder at the front of `parent`'s listing.
    pub fn add_placeholder(
        &mut self,
        parent: &str,
        kind: EntryKind,
    ) -> Result<PlaceholderId, IndexTreeError> {
        if !parent.is_empty() && !self.contains(parent) {
            return Err(IndexTreeError::NotFound(parent.to_string()));
        }
        if !self.is_directory(parent) {
            return Err(IndexTreeError::ParentNotDirectory(parent.to_string()));
        }

        for placeholder in self.placeholders.values_mut() {
            placeholder.focused = false;
        }
        let id = self.placeholders.insert(Placeholder {
            parent: parent.to_string(),
            kind,
            name: String::new(),
            focused: true,
        });
        self.pending.insert(0, id);
        self.expand(parent);
        Ok(id)
    }

    pub fn placeholder(&self, id: PlaceholderId) -> Option<&Placeholder> {
        self.placeholders.get(id)
    }

    pub fn set_placeholder_name(&mut self, id: PlaceholderId, name: &str) -> bool {
        match self.placeholders.get_mut(id) {
            Some(placeholder) => {
                placeholder.name = name.to_string();
                true
            }
            None => false,
        }
    }

    /// Removes the placeholder. Later commits or blurs on `id` find nothing.
    pub fn take_placeholder(&mut self, id: PlaceholderId) -> Option<Placeholder> {
        self.pending.retain(|p| *p != id);
        self.placeholders.remove(id)
    }

    pub fn begin_rename(&mut self, path: &str) -> Result<(), IndexTreeError> {
        let node = self
            .lookup(path)
            .and_then(|id| self.arena.get_mut(id))
            .ok_or_else(|| IndexTreeError::NotFound(path.to_string()))?;
        node.rename = Some(path::file_name(&node.path).to_string());
        Ok(())
    }

    pub fn set_rename_text(&mut self, path: &str, text: &str) -> bool {
        match self.rename_buffer_mut(path) {
            Some(buffer) => {
                *buffer = text.to_string();
                true
            }
            None => false,
        }
    }

    pub fn rename_text(&self, path: &str) -> Option<&str> {
        self.lookup(path)
            .and_then(|id| self.arena.get(id))
            .and_then(|n| n.rename.as_deref())
    }

    pub fn is_renaming(&self, path: &str) -> bool {
        self.rename_text(path).is_some()
    }

    /// Closes the in-place editor; the label falls back to the entry name.
    pub fn end_rename(&mut self, path: &str) -> bool {
        self.lookup(path)
            .and_then(|id| self.arena.get_mut(id))
            .and_then(|n| n.rename.take())
            .is_some()
    }

    fn rename_buffer_mut(&mut self, path: &str) -> Option<&mut String> {
        let id = self.lookup(path)?;
        self.arena.get_mut(id)?.rename.as_mut()
    }

    pub fn push_notice(&mut self, anchor: NoticeAnchor, text: impl Into<String>) {
        self.notices.push(Notice {
            anchor,
            text: text.into(),
            duration: NOTICE_DURATION,
        });
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Flattens the tree for display. Placeholders come first in their
    /// parent's listing; collapsed directories hide their children.
    pub fn rows(&self) -> Vec<IndexRow> {
        let mut rows = Vec::new();
        if let Some(top) = &self.top_level {
            self.push_rows("", top, 0, &mut rows);
        }
        rows
    }

    fn push_rows(&self, parent: &str, ids: &[NodeId], depth: u16, rows: &mut Vec<IndexRow>) {
        for pid in &self.pending {
            let Some(placeholder) = self.placeholders.get(*pid) else {
                continue;
            };
            if placeholder.parent != parent {
                continue;
            }
            rows.push(IndexRow {
                id: RowId::Placeholder(*pid),
                path: placeholder.parent.clone(),
                depth,
                label: placeholder.name.clone(),
                kind: placeholder.kind,
                is_expanded: false,
                is_placeholder: true,
                is_editing: true,
            });
        }

        for id in ids {
            let Some(node) = self.arena.get(*id) else {
                continue;
            };
            let label = node
                .rename
                .clone()
                .unwrap_or_else(|| path::file_name(&node.path).to_string());
            rows.push(IndexRow {
                id: RowId::Entry(*id),
                path: node.path.clone(),
                depth,
                label,
                kind: node.kind,
                is_expanded: node.expanded,
                is_placeholder: false,
                is_editing: node.rename.is_some(),
            });

            if node.expanded {
                if let Some(children) = &node.children {
                    self.push_rows(&node.path, children, depth.saturating_add(1), rows);
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/models/index_tree.rs"]
mod tests;
