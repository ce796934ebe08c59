use super::*;
use crate::kernel::services::adapters::app_dirs::{APP_FOLDER, START_NOTE};
use crate::kernel::tabs::StripItem;
use tempfile::tempdir;

fn strip_paths(workspace: &Workspace) -> Vec<String> {
    workspace
        .tabs()
        .surface()
        .strip
        .iter()
        .filter_map(|item| match item {
            StripItem::Tab { path, .. } => Some(path.clone()),
            StripItem::AddTab => None,
        })
        .collect()
}

#[tokio::test]
async fn test_first_attach_seeds_and_restores_start_note() {
    let dir = tempdir().unwrap();
    let root = dir.path().join(APP_FOLDER);
    let workspace = Workspace::attach_at(&root).await.unwrap();

    assert!(root.join("notes").join(START_NOTE).is_file());
    assert!(root.join("config.json").is_file());
    assert!(workspace.index().contains(START_NOTE).await);

    assert_eq!(workspace.tabs().active_tab(), Some(START_NOTE));
    let surface = workspace.tabs().surface();
    assert_eq!(surface.mounted.as_deref(), Some(START_NOTE));
    assert_eq!(surface.active_titles(), vec!["Welcome to Noteshell"]);
}

#[tokio::test]
async fn test_explicit_missing_home_is_rejected() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nowhere");
    let err = Workspace::attach(Some(missing.as_path())).await.err().unwrap();
    assert!(matches!(err, WorkspaceError::Io { .. }));
}

#[tokio::test]
async fn test_missing_session_tabs_are_skipped() {
    let dir = tempdir().unwrap();
    let root = dir.path().join(APP_FOLDER);
    AppLayout::new(&root).ensure().unwrap();

    let mut config = AppConfig::default();
    config.session.notes.open_tabs = vec!["gone.md".to_string(), "./start.md".to_string()];
    config.session.notes.active_tab = Some("gone.md".to_string());
    ConfigStore::in_dir(&root).save(&config).unwrap();

    let workspace = Workspace::attach_at(&root).await.unwrap();
    assert_eq!(strip_paths(&workspace), vec![START_NOTE]);
    assert_eq!(workspace.tabs().active_tab(), Some(START_NOTE));
}

#[tokio::test]
async fn test_index_events_drive_tabs() {
    let dir = tempdir().unwrap();
    let mut workspace = Workspace::attach_at(dir.path().join(APP_FOLDER))
        .await
        .unwrap();
    let index = workspace.index().clone();

    index.create("", "ideas.md", EntryKind::File).await.unwrap();
    index.activate("ideas.md").await.unwrap();
    assert_eq!(workspace.pump_index_events().await.unwrap(), 2);
    assert_eq!(workspace.tabs().active_tab(), Some("ideas.md"));
    assert_eq!(strip_paths(&workspace), vec![START_NOTE, "ideas.md"]);

    index.rename("ideas.md", "plans.md").await.unwrap();
    workspace.pump_index_events().await.unwrap();
    assert_eq!(workspace.tabs().active_tab(), Some("plans.md"));
    assert_eq!(workspace.tabs().surface().active_titles(), vec!["plans.md"]);

    index.delete("plans.md").await.unwrap();
    workspace.pump_index_events().await.unwrap();
    assert_eq!(strip_paths(&workspace), vec![START_NOTE]);
    assert_eq!(workspace.tabs().active_tab(), Some(START_NOTE));
}

#[tokio::test]
async fn test_directory_open_leaves_tabs_alone() {
    let dir = tempdir().unwrap();
    let mut workspace = Workspace::attach_at(dir.path().join(APP_FOLDER))
        .await
        .unwrap();
    let index = workspace.index().clone();

    index.create("", "drafts", EntryKind::Directory).await.unwrap();
    index.activate("drafts").await.unwrap();
    workspace.pump_index_events().await.unwrap();
    assert_eq!(strip_paths(&workspace), vec![START_NOTE]);
}

#[tokio::test]
async fn test_save_session_round_trips() {
    let dir = tempdir().unwrap();
    let root = dir.path().join(APP_FOLDER);
    {
        let mut workspace = Workspace::attach_at(&root).await.unwrap();
        workspace
            .index()
            .create("", "b.md", EntryKind::File)
            .await
            .unwrap();
        workspace.tabs_mut().open("b.md", true).await.unwrap();
        workspace.save_session().unwrap();
    }

    let saved = ConfigStore::in_dir(&root).load_or_create().unwrap();
    assert_eq!(saved.session.notes.open_tabs, vec![START_NOTE, "b.md"]);
    assert_eq!(saved.session.notes.active_tab.as_deref(), Some("b.md"));

    let workspace = Workspace::attach_at(&root).await.unwrap();
    assert_eq!(strip_paths(&workspace), vec![START_NOTE, "b.md"]);
    assert_eq!(workspace.tabs().active_tab(), Some("b.md"));
}
