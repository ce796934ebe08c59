//! 工作区：应用目录 + 配置 + 笔记索引 + 标签页
//!
//! `attach` 完成首次运行初始化、加载 `config.json`、恢复上次会话；
//! `pump_index_events` 把索引总线上的事件转发给标签页管理器。

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::index::{IndexChange, IndexEvent, NoteIndex};
use super::services::adapters::app_dirs::{resolve_app_root, AppLayout, Category};
use super::services::adapters::config::{ConfigError, ConfigStore};
use super::services::adapters::file::FileService;
use super::services::bus::{index_bus, IndexBusReceiver};
use super::services::ports::config::AppConfig;
use super::tabs::{TabError, TabManager};
use crate::models::EntryKind;

#[derive(Debug)]
pub enum WorkspaceError {
    Io { path: PathBuf, source: std::io::Error },
    Config(ConfigError),
    Tabs(TabError),
}

impl fmt::Display for WorkspaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkspaceError::Io { path, source } => {
                write!(f, "application folder {}: {}", path.display(), source)
            }
            WorkspaceError::Config(e) => write!(f, "{}", e),
            WorkspaceError::Tabs(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for WorkspaceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WorkspaceError::Io { source, .. } => Some(source),
            WorkspaceError::Config(e) => Some(e),
            WorkspaceError::Tabs(e) => Some(e),
        }
    }
}

impl From<ConfigError> for WorkspaceError {
    fn from(e: ConfigError) -> Self {
        WorkspaceError::Config(e)
    }
}

impl From<TabError> for WorkspaceError {
    fn from(e: TabError) -> Self {
        WorkspaceError::Tabs(e)
    }
}

pub struct Workspace {
    layout: AppLayout,
    config_store: ConfigStore,
    config: AppConfig,
    index: Arc<NoteIndex>,
    tabs: TabManager,
    events: IndexBusReceiver,
}

impl Workspace {
    /// Resolves the application root from `home` (or the user's home) and
    /// attaches to it.
    pub async fn attach(home: Option<&Path>) -> Result<Self, WorkspaceError> {
        let root = resolve_app_root(home).map_err(|source| WorkspaceError::Io {
            path: home.map(Path::to_path_buf).unwrap_or_default(),
            source,
        })?;
        Self::attach_at(root).await
    }

    pub async fn attach_at(root: impl Into<PathBuf>) -> Result<Self, WorkspaceError> {
        let layout = AppLayout::new(root);
        layout.ensure().map_err(|source| WorkspaceError::Io {
            path: layout.root().to_path_buf(),
            source,
        })?;

        let config_store = ConfigStore::in_dir(layout.root());
        let config = config_store.load_or_create()?;

        let (storage_root, base) = layout.confinement(Category::Notes);
        let files =
            Arc::new(FileService::new(storage_root, &base).with_timeout(config.fs.timeout()));

        let (tx, events) = index_bus();
        let index = Arc::new(NoteIndex::new(files.clone(), tx));
        let mut tabs = TabManager::new(files);
        tabs.bind_surface()?;

        if let Err(e) = index.refresh().await {
            tracing::warn!(error = %e, "initial index listing failed");
        }

        let mut workspace = Self {
            layout,
            config_store,
            config,
            index,
            tabs,
            events,
        };
        workspace.restore_session().await?;
        tracing::info!(root = %workspace.layout.root().display(), "workspace attached");
        Ok(workspace)
    }

    async fn restore_session(&mut self) -> Result<(), WorkspaceError> {
        let session = self.config.session.notes.clone();
        for path in &session.open_tabs {
            if let Err(e) = self.tabs.open(path, false).await {
                tracing::warn!(path = %path, error = %e, "session tab skipped");
            }
        }

        if let Some(active) = &session.active_tab {
            if let Err(e) = self.tabs.open(active, true).await {
                tracing::warn!(path = %active, error = %e, "session active tab skipped");
            }
        }
        if self.tabs.active_tab().is_none() {
            if let Some(first) = self.tabs.open_tabs().first() {
                self.tabs.switch(first)?;
            }
        }
        Ok(())
    }

    pub fn layout(&self) -> &AppLayout {
        &self.layout
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn index(&self) -> &Arc<NoteIndex> {
        &self.index
    }

    pub fn tabs(&self) -> &TabManager {
        &self.tabs
    }

    pub fn tabs_mut(&mut self) -> &mut TabManager {
        &mut self.tabs
    }

    /// Applies pending index events to the tabs. Returns how many events
    /// were handled.
    pub async fn pump_index_events(&mut self) -> Result<usize, TabError> {
        let events = self.events.drain();
        let count = events.len();
        for event in events {
            match event {
                IndexEvent::Open {
                    kind: EntryKind::File,
                    path,
                } => match self.tabs.open(&path, true).await {
                    Ok(()) => {}
                    Err(TabError::DocumentNotFound(path)) => {
                        tracing::warn!(path = %path, "opened entry is gone");
                    }
                    Err(e) => return Err(e),
                },
                IndexEvent::Open {
                    kind: EntryKind::Directory,
                    ..
                } => {}
                IndexEvent::Changed(IndexChange::Renamed { from, to, .. }) => {
                    self.tabs.rename_open_path(&from, &to)?;
                }
                IndexEvent::Changed(IndexChange::Deleted { path, .. }) => {
                    self.tabs.close_under(&path)?;
                }
                IndexEvent::Changed(IndexChange::Created { .. }) => {}
            }
        }
        Ok(count)
    }

    /// Writes open tabs and the active tab back to `config.json`.
    pub fn save_session(&mut self) -> Result<(), ConfigError> {
        self.config.session.notes.open_tabs = self.tabs.open_tabs();
        self.config.session.notes.active_tab = self.tabs.active_tab().map(str::to_string);
        self.config_store.save(&self.config)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/workspace.rs"]
mod tests;
