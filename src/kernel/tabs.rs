//! 标签页管理
//!
//! Tabs are keyed by their normalized relative path. The active tab and the
//! sidebar flag live in a [`ReactiveState`]; the bound [`SurfaceObserver`]
//! turns every change into strip/mount updates on the shared [`TabSurface`].

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use rustc_hash::FxHashMap;

use super::note_editor::EditorInstance;
use super::state::{ReactiveState, StateError, StateObserver};
use crate::core::path;
use crate::kernel::services::adapters::file::FileService;
use crate::kernel::services::ports::file::FileError;
use crate::models::Note;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotesField {
    ActiveTab,
    ShowFileList,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotesValue {
    Tab(Option<String>),
    Flag(bool),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StripItem {
    Tab {
        path: String,
        title: String,
        active: bool,
    },
    /// Reserved trailing slot; new tabs go in front of it.
    AddTab,
}

impl StripItem {
    fn tab_path(&self) -> Option<&str> {
        match self {
            StripItem::Tab { path, .. } => Some(path),
            StripItem::AddTab => None,
        }
    }
}

/// What the notes page currently shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabSurface {
    pub strip: Vec<StripItem>,
    /// Path of the tab whose editor is mounted.
    pub mounted: Option<String>,
    pub file_list_visible: bool,
}

impl Default for TabSurface {
    fn default() -> Self {
        Self {
            strip: vec![StripItem::AddTab],
            mounted: None,
            file_list_visible: true,
        }
    }
}

impl TabSurface {
    fn position(&self, path: &str) -> Option<usize> {
        self.strip.iter().position(|item| item.tab_path() == Some(path))
    }

    fn set_active(&mut self, path: &str, value: bool) -> bool {
        for item in &mut self.strip {
            if let StripItem::Tab {
                path: item_path,
                active,
                ..
            } = item
            {
                if item_path == path {
                    *active = value;
                    return true;
                }
            }
        }
        false
    }

    pub fn active_titles(&self) -> Vec<&str> {
        self.strip
            .iter()
            .filter_map(|item| match item {
                StripItem::Tab {
                    title,
                    active: true,
                    ..
                } => Some(title.as_str()),
                _ => None,
            })
            .collect()
    }
}

fn lock(surface: &Mutex<TabSurface>) -> MutexGuard<'_, TabSurface> {
    surface.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct SurfaceObserver {
    surface: Arc<Mutex<TabSurface>>,
}

impl SurfaceObserver {
    pub fn new(surface: Arc<Mutex<TabSurface>>) -> Self {
        Self { surface }
    }
}

impl StateObserver<NotesField, NotesValue> for SurfaceObserver {
    fn on_state_changed(&mut self, key: &NotesField, new_value: &NotesValue, old_value: &NotesValue) {
        let mut surface = lock(&self.surface);
        match (key, new_value) {
            (NotesField::ShowFileList, NotesValue::Flag(visible)) => {
                surface.file_list_visible = *visible;
            }
            (NotesField::ActiveTab, NotesValue::Tab(new_tab)) => {
                if let NotesValue::Tab(Some(old)) = old_value {
                    surface.set_active(old, false);
                }
                match new_tab {
                    Some(path) => {
                        if surface.set_active(path, true) {
                            surface.mounted = Some(path.clone());
                        }
                    }
                    None => surface.mounted = None,
                }
            }
            _ => {
                tracing::warn!(?key, "state value does not match its field");
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabError {
    DocumentNotFound(String),
    TabNotOpen(String),
    State(StateError),
    Adapter(FileError),
}

impl fmt::Display for TabError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TabError::DocumentNotFound(path) => write!(f, "The passed note does not exist: {}", path),
            TabError::TabNotOpen(path) => write!(f, "The passed tab does not exist: {}", path),
            TabError::State(e) => write!(f, "{}", e),
            TabError::Adapter(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for TabError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TabError::State(e) => Some(e),
            TabError::Adapter(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StateError> for TabError {
    fn from(e: StateError) -> Self {
        TabError::State(e)
    }
}

pub struct Tab {
    pub note: Note,
    /// Created the first time the tab becomes active.
    pub editor: Option<EditorInstance>,
}

fn tab_key(path: &str) -> String {
    path::join("", &[path])
}

pub struct TabManager {
    files: Arc<FileService>,
    tabs: FxHashMap<String, Tab>,
    surface: Arc<Mutex<TabSurface>>,
    state: ReactiveState<NotesField, NotesValue>,
}

impl TabManager {
    /// Unbound until [`bind_surface`](Self::bind_surface) is called.
    pub fn new(files: Arc<FileService>) -> Self {
        Self {
            files,
            tabs: FxHashMap::default(),
            surface: Arc::new(Mutex::new(TabSurface::default())),
            state: ReactiveState::new([
                (NotesField::ActiveTab, NotesValue::Tab(None)),
                (NotesField::ShowFileList, NotesValue::Flag(true)),
            ]),
        }
    }

    pub fn bind_surface(&mut self) -> Result<(), TabError> {
        let observer = SurfaceObserver::new(self.surface.clone());
        self.state.bind(Box::new(observer))?;
        Ok(())
    }

    pub fn surface(&self) -> TabSurface {
        lock(&self.surface).clone()
    }

    pub fn active_tab(&self) -> Option<&str> {
        match self.state.get(&NotesField::ActiveTab) {
            Some(NotesValue::Tab(Some(path))) => Some(path.as_str()),
            _ => None,
        }
    }

    pub fn file_list_visible(&self) -> bool {
        !matches!(
            self.state.get(&NotesField::ShowFileList),
            Some(NotesValue::Flag(false))
        )
    }

    pub fn is_open(&self, path: &str) -> bool {
        self.tabs.contains_key(&tab_key(path))
    }

    pub fn tab(&self, path: &str) -> Option<&Tab> {
        self.tabs.get(&tab_key(path))
    }

    pub fn editor_mut(&mut self, path: &str) -> Option<&mut EditorInstance> {
        self.tabs
            .get_mut(&tab_key(path))
            .and_then(|tab| tab.editor.as_mut())
    }

    /// Open tab paths in strip order.
    pub fn open_tabs(&self) -> Vec<String> {
        lock(&self.surface)
            .strip
            .iter()
            .filter_map(|item| item.tab_path().map(str::to_string))
            .collect()
    }

    /// Reads and parses the note, then adds a tab for it. An already open
    /// path is only switched to.
    pub async fn open(&mut self, path: &str, activate: bool) -> Result<(), TabError> {
        let key = tab_key(path);
        if self.tabs.contains_key(&key) {
            if activate {
                self.switch(&key)?;
            }
            return Ok(());
        }

        let text = match self.files.read_file(&key).await {
            Ok(text) => text,
            Err(FileError::NotFound(_)) | Err(FileError::NotAFile(_)) => {
                return Err(TabError::DocumentNotFound(key));
            }
            Err(e) => return Err(TabError::Adapter(e)),
        };
        let note = Note::parse(path::file_name(&key), &text);

        {
            let mut surface = lock(&self.surface);
            let item = StripItem::Tab {
                path: key.clone(),
                title: note.title.clone(),
                active: false,
            };
            match surface.strip.last() {
                Some(StripItem::AddTab) => {
                    let at = surface.strip.len() - 1;
                    surface.strip.insert(at, item);
                }
                _ => surface.strip.push(item),
            }
        }
        self.tabs.insert(key.clone(), Tab { note, editor: None });
        tracing::debug!(path = %key, "tab opened");

        if activate {
            self.switch(&key)?;
        }
        Ok(())
    }

    pub fn switch(&mut self, path: &str) -> Result<(), TabError> {
        let key = tab_key(path);
        let tab = self
            .tabs
            .get_mut(&key)
            .ok_or_else(|| TabError::TabNotOpen(key.clone()))?;
        if tab.editor.is_none() {
            tab.editor = Some(EditorInstance::new(&tab.note.title, &tab.note.body));
        }
        self.state.set(NotesField::ActiveTab, NotesValue::Tab(Some(key)))?;
        Ok(())
    }

    /// Closes the tab. Closing the active tab activates its previous
    /// neighbour in the strip, else the next one, else nothing.
    pub fn close(&mut self, path: &str) -> Result<bool, TabError> {
        let key = tab_key(path);
        if !self.tabs.contains_key(&key) {
            return Ok(false);
        }
        let was_active = self.active_tab() == Some(key.as_str());

        let neighbour = {
            let mut surface = lock(&self.surface);
            let Some(at) = surface.position(&key) else {
                return Ok(false);
            };
            let neighbour = if was_active {
                at.checked_sub(1)
                    .and_then(|i| surface.strip.get(i))
                    .and_then(StripItem::tab_path)
                    .or_else(|| surface.strip.get(at + 1).and_then(StripItem::tab_path))
                    .map(str::to_string)
            } else {
                None
            };
            surface.strip.remove(at);
            if surface.mounted.as_deref() == Some(key.as_str()) {
                surface.mounted = None;
            }
            neighbour
        };
        self.tabs.remove(&key);
        tracing::debug!(path = %key, "tab closed");

        match neighbour {
            Some(next) => self.switch(&next)?,
            None if was_active => {
                self.state.set(NotesField::ActiveTab, NotesValue::Tab(None))?;
            }
            None => {}
        }
        Ok(true)
    }

    /// Closes every tab at or below `path`. Returns how many were closed.
    pub fn close_under(&mut self, path: &str) -> Result<usize, TabError> {
        let prefix = tab_key(path);
        let doomed: Vec<String> = self
            .open_tabs()
            .into_iter()
            .filter(|key| path::is_same_or_descendant(key, &prefix))
            .collect();
        for key in &doomed {
            self.close(key)?;
        }
        Ok(doomed.len())
    }

    pub fn toggle_file_list(&mut self) -> Result<bool, TabError> {
        let visible = !self.file_list_visible();
        self.state
            .set(NotesField::ShowFileList, NotesValue::Flag(visible))?;
        Ok(visible)
    }

    /// Points tabs at or below `from` to their new location after a rename
    /// or move. Returns how many tabs moved.
    pub fn rename_open_path(&mut self, from: &str, to: &str) -> Result<usize, TabError> {
        let from = tab_key(from);
        let to = tab_key(to);
        let moved: Vec<String> = self
            .tabs
            .keys()
            .filter(|key| path::is_same_or_descendant(key, &from))
            .cloned()
            .collect();

        let active = self.active_tab().map(str::to_string);
        let mut new_active = None;
        for old_key in &moved {
            let Some(mut tab) = self.tabs.remove(old_key) else {
                continue;
            };
            let new_key = format!("{}{}", to, &old_key[from.len()..]);
            if tab.note.field("title").map_or(true, str::is_empty) {
                tab.note.title = path::file_name(&new_key).to_string();
                if let Some(editor) = tab.editor.as_mut() {
                    editor.set_title(&tab.note.title);
                }
            }

            {
                let mut surface = lock(&self.surface);
                for item in &mut surface.strip {
                    if let StripItem::Tab { path, title, .. } = item {
                        if path == old_key {
                            *path = new_key.clone();
                            *title = tab.note.title.clone();
                        }
                    }
                }
                if surface.mounted.as_deref() == Some(old_key.as_str()) {
                    surface.mounted = Some(new_key.clone());
                }
            }

            if active.as_deref() == Some(old_key.as_str()) {
                new_active = Some(new_key.clone());
            }
            self.tabs.insert(new_key, tab);
        }

        if let Some(key) = new_active {
            self.state
                .set(NotesField::ActiveTab, NotesValue::Tab(Some(key)))?;
        }
        Ok(moved.len())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/tabs.rs"]
mod tests;
