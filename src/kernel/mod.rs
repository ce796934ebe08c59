//! Headless application core (index/state/tabs/workspace).

pub mod index;
pub mod note_editor;
pub mod services;
pub mod state;
pub mod tabs;
pub mod workspace;

pub use index::{IndexChange, IndexError, IndexEvent, NoteIndex};
pub use note_editor::{EditorInstance, EditorStat};
pub use state::{ReactiveState, StateError, StateObserver};
pub use tabs::{StripItem, Tab, TabError, TabManager, TabSurface};
pub use workspace::{Workspace, WorkspaceError};
