//! 数据模型层

pub mod index_tree;
pub mod note;

pub use index_tree::{
    EntryKind, IndexRow, IndexTree, IndexTreeError, NodeId, Notice, NoticeAnchor, Placeholder,
    PlaceholderId, RowId, NOTICE_DURATION,
};
pub use note::Note;
