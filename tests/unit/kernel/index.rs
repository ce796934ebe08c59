use super::*;
use crate::kernel::services::adapters::file::LocalFileProvider;
use crate::kernel::services::bus::{index_bus, IndexBusReceiver};
use crate::kernel::services::ports::file::{FileFuture, FileProvider, RawEntry};
use crate::models::RowId;
use std::fs as std_fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::{tempdir, TempDir};
use tokio::sync::Notify;

/// Local provider that counts mutating calls. Renames can be refused, or
/// held at `gate` after signalling `entered`.
struct CountingProvider {
    inner: LocalFileProvider,
    mutations: AtomicUsize,
    fail_rename: bool,
    hold_rename: bool,
    entered: Notify,
    gate: Notify,
}

impl CountingProvider {
    fn new(fail_rename: bool) -> Self {
        Self {
            inner: LocalFileProvider::new(),
            mutations: AtomicUsize::new(0),
            fail_rename,
            hold_rename: false,
            entered: Notify::new(),
            gate: Notify::new(),
        }
    }

    fn holding_renames() -> Self {
        Self {
            hold_rename: true,
            ..Self::new(false)
        }
    }

    fn touch(&self) {
        self.mutations.fetch_add(1, Ordering::SeqCst);
    }
}

impl FileProvider for CountingProvider {
    fn scheme(&self) -> &'static str {
        "counting"
    }

    fn exists<'a>(&'a self, path: &'a Path) -> FileFuture<'a, bool> {
        self.inner.exists(path)
    }

    fn read_file<'a>(&'a self, path: &'a Path) -> FileFuture<'a, String> {
        self.inner.read_file(path)
    }

    fn read_dir<'a>(&'a self, path: &'a Path, recursive: bool) -> FileFuture<'a, Vec<RawEntry>> {
        self.inner.read_dir(path, recursive)
    }

    fn create_file<'a>(&'a self, path: &'a Path) -> FileFuture<'a, ()> {
        self.touch();
        self.inner.create_file(path)
    }

    fn create_dir<'a>(&'a self, path: &'a Path) -> FileFuture<'a, ()> {
        self.touch();
        self.inner.create_dir(path)
    }

    fn write_file<'a>(&'a self, path: &'a Path, content: &'a str) -> FileFuture<'a, ()> {
        self.touch();
        self.inner.write_file(path, content)
    }

    fn rename<'a>(&'a self, from: &'a Path, to: &'a Path) -> FileFuture<'a, ()> {
        self.touch();
        if self.fail_rename {
            return Box::pin(async move {
                Err(FileError::Io {
                    op: "rename",
                    path: from.to_path_buf(),
                    message: "device busy".to_string(),
                })
            });
        }
        if self.hold_rename {
            return Box::pin(async move {
                self.entered.notify_one();
                self.gate.notified().await;
                self.inner.rename(from, to).await
            });
        }
        self.inner.rename(from, to)
    }

    fn delete_file<'a>(&'a self, path: &'a Path) -> FileFuture<'a, ()> {
        self.touch();
        self.inner.delete_file(path)
    }

    fn delete_dir<'a>(&'a self, path: &'a Path, recursive: bool) -> FileFuture<'a, ()> {
        self.touch();
        self.inner.delete_dir(path, recursive)
    }
}

struct Fixture {
    dir: TempDir,
    provider: Arc<CountingProvider>,
    index: NoteIndex,
    events: IndexBusReceiver,
}

impl Fixture {
    async fn new(fail_rename: bool) -> Self {
        Self::with_provider(CountingProvider::new(fail_rename)).await
    }

    async fn with_provider(provider: CountingProvider) -> Self {
        let dir = tempdir().unwrap();
        let notes = dir.path().join("Noteshell").join("notes");
        std_fs::create_dir_all(notes.join("projects").join("old")).unwrap();
        std_fs::write(notes.join("draft.md"), "draft").unwrap();
        std_fs::write(notes.join("final.md"), "final").unwrap();
        std_fs::write(notes.join("projects").join("plan.md"), "plan").unwrap();

        let provider = Arc::new(provider);
        let files = Arc::new(FileService::with_provider(
            provider.clone(),
            dir.path(),
            "Noteshell/notes",
        ));
        let (tx, events) = index_bus();
        let index = NoteIndex::new(files, tx);
        index.refresh().await.unwrap();

        Self {
            dir,
            provider,
            index,
            events,
        }
    }

    fn notes(&self) -> std::path::PathBuf {
        self.dir.path().join("Noteshell").join("notes")
    }

    fn mutations(&self) -> usize {
        self.provider.mutations.load(Ordering::SeqCst)
    }
}

#[tokio::test]
async fn test_refresh_lists_directories_first() {
    let fx = Fixture::new(false).await;
    assert_eq!(
        fx.index.children("").await,
        Some(vec![
            "projects".to_string(),
            "draft.md".to_string(),
            "final.md".to_string()
        ])
    );
    assert_eq!(fx.index.kind_of("projects/old").await, Some(EntryKind::Directory));
}

#[tokio::test]
async fn test_create_file_and_directory() {
    let mut fx = Fixture::new(false).await;

    let path = fx.index.create("", "ideas.md", EntryKind::File).await.unwrap();
    assert_eq!(path, "ideas.md");
    assert!(fx.notes().join("ideas.md").is_file());
    assert!(fx.index.contains("ideas.md").await);

    let path = fx
        .index
        .create("projects", "archive", EntryKind::Directory)
        .await
        .unwrap();
    assert_eq!(path, "projects/archive");
    assert!(fx.notes().join("projects").join("archive").is_dir());

    let events = fx.events.drain();
    assert_eq!(events.len(), 2);
    assert_eq!(
        events[0],
        IndexEvent::Changed(IndexChange::Created {
            kind: EntryKind::File,
            path: "ideas.md".to_string()
        })
    );
}

#[tokio::test]
async fn test_invalid_name_never_reaches_adapter() {
    let fx = Fixture::new(false).await;

    let err = fx
        .index
        .create("", "My:Note", EntryKind::File)
        .await
        .unwrap_err();
    assert_eq!(err, IndexError::InvalidName("My:Note".to_string()));
    assert_eq!(fx.mutations(), 0);

    let notices = fx.index.take_notices().await;
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].text, INVALID_NAME_NOTICE);
    assert_eq!(notices[0].anchor, NoticeAnchor::Root);
}

#[tokio::test]
async fn test_collision_never_reaches_adapter() {
    let fx = Fixture::new(false).await;

    let err = fx
        .index
        .create("", "draft.md", EntryKind::File)
        .await
        .unwrap_err();
    assert_eq!(err, IndexError::NameExists("draft.md".to_string()));
    assert_eq!(fx.mutations(), 0);
}

#[tokio::test]
async fn test_placeholder_commit_creates_entry() {
    let fx = Fixture::new(false).await;

    let id = fx.index.add_placeholder("projects", EntryKind::File).await.unwrap();
    let rows = fx.index.rows().await;
    assert_eq!(rows[1].id, RowId::Placeholder(id));

    fx.index.set_placeholder_name(id, "  todo.md ").await;
    let created = fx.index.commit_placeholder(id).await.unwrap();
    assert_eq!(created, Some("projects/todo.md".to_string()));
    assert!(fx.notes().join("projects").join("todo.md").is_file());
    assert!(fx.index.rows().await.iter().all(|r| !r.is_placeholder));
}

#[tokio::test]
async fn test_placeholder_kept_on_invalid_name() {
    let fx = Fixture::new(false).await;

    let id = fx.index.add_placeholder("", EntryKind::File).await.unwrap();
    fx.index.set_placeholder_name(id, "bad?").await;
    let err = fx.index.commit_placeholder(id).await.unwrap_err();
    assert!(matches!(err, IndexError::InvalidName(_)));
    assert!(fx.index.rows().await[0].is_placeholder);
    assert_eq!(
        fx.index.take_notices().await[0].anchor,
        NoticeAnchor::Placeholder(id)
    );
    assert_eq!(fx.mutations(), 0);
}

#[tokio::test]
async fn test_blur_after_escape_is_noop() {
    let fx = Fixture::new(false).await;

    let id = fx.index.add_placeholder("", EntryKind::Directory).await.unwrap();
    fx.index.set_placeholder_name(id, "later").await;
    assert!(fx.index.cancel_placeholder(id).await);
    assert_eq!(fx.index.blur_placeholder(id).await, Ok(None));
    assert_eq!(fx.mutations(), 0);
    assert!(!fx.notes().join("later").exists());
}

#[tokio::test]
async fn test_rename_to_existing_name_is_rejected() {
    let fx = Fixture::new(false).await;
    fx.index.begin_rename("draft.md").await.unwrap();
    fx.index.set_rename_text("draft.md", "final.md").await;

    let err = fx.index.commit_rename("draft.md").await.unwrap_err();
    assert_eq!(err, IndexError::NameExists("final.md".to_string()));
    assert_eq!(fx.mutations(), 0);
    assert!(fx.index.contains("draft.md").await);
    assert!(fx.index.is_renaming("draft.md").await);
    assert_eq!(
        std_fs::read_to_string(fx.notes().join("draft.md")).unwrap(),
        "draft"
    );
}

#[tokio::test]
async fn test_commit_rename_moves_entry() {
    let mut fx = Fixture::new(false).await;
    fx.index.begin_rename("projects").await.unwrap();
    fx.index.set_rename_text("projects", "work").await;

    let renamed = fx.index.commit_rename("projects").await.unwrap();
    assert_eq!(renamed, Some("work".to_string()));
    assert!(fx.index.contains("work/plan.md").await);
    assert!(!fx.index.contains("projects").await);
    assert!(!fx.index.is_renaming("work").await);
    assert!(fx.notes().join("work").join("plan.md").is_file());

    assert_eq!(
        fx.events.drain(),
        vec![IndexEvent::Changed(IndexChange::Renamed {
            kind: EntryKind::Directory,
            from: "projects".to_string(),
            to: "work".to_string()
        })]
    );
}

#[tokio::test]
async fn test_commit_rename_unchanged_name_skips_io() {
    let fx = Fixture::new(false).await;
    fx.index.begin_rename("draft.md").await.unwrap();

    let result = fx.index.commit_rename("draft.md").await.unwrap();
    assert_eq!(result, Some("draft.md".to_string()));
    assert_eq!(fx.mutations(), 0);
    assert!(!fx.index.is_renaming("draft.md").await);
}

#[tokio::test]
async fn test_failed_rename_reverts_label() {
    let fx = Fixture::new(true).await;
    fx.index.begin_rename("draft.md").await.unwrap();
    fx.index.set_rename_text("draft.md", "fresh.md").await;

    let err = fx.index.commit_rename("draft.md").await.unwrap_err();
    assert!(matches!(err, IndexError::Adapter(FileError::Io { .. })));
    assert!(!fx.index.is_renaming("draft.md").await);

    let rows = fx.index.rows().await;
    let draft = rows.iter().find(|r| r.path == "draft.md").unwrap();
    assert_eq!(draft.label, "draft.md");

    let notices = fx.index.take_notices().await;
    assert_eq!(notices[0].anchor, NoticeAnchor::Entry("draft.md".to_string()));
    assert!(notices[0].text.contains("device busy"));
}

#[tokio::test]
async fn test_move_entry() {
    let fx = Fixture::new(false).await;

    let moved = fx.index.move_entry("draft.md", "projects/old").await.unwrap();
    assert_eq!(moved, "projects/old/draft.md");
    assert!(fx.notes().join("projects").join("old").join("draft.md").is_file());
    assert!(!fx.index.contains("draft.md").await);

    let same = fx.index.move_entry("final.md", "").await.unwrap();
    assert_eq!(same, "final.md");
}

#[tokio::test]
async fn test_move_rejections() {
    let fx = Fixture::new(false).await;

    assert_eq!(
        fx.index.move_entry("projects", "projects/old").await,
        Err(IndexError::MoveIntoDescendant)
    );
    assert_eq!(
        fx.index.move_entry("draft.md", "final.md").await,
        Err(IndexError::NotADirectory("final.md".to_string()))
    );
    assert_eq!(
        fx.index.move_entry("ghost.md", "").await,
        Err(IndexError::NotFound("ghost.md".to_string()))
    );
    std_fs::write(fx.notes().join("projects").join("final.md"), "").unwrap();
    fx.index.refresh().await.unwrap();
    assert_eq!(
        fx.index.move_entry("final.md", "projects").await,
        Err(IndexError::NameExists("projects/final.md".to_string()))
    );
    assert_eq!(fx.mutations(), 0);
}

#[tokio::test]
async fn test_delete_directory_recursively() {
    let mut fx = Fixture::new(false).await;

    fx.index.delete("projects").await.unwrap();
    assert!(!fx.notes().join("projects").exists());
    assert!(!fx.index.contains("projects/plan.md").await);
    assert_eq!(
        fx.events.drain(),
        vec![IndexEvent::Changed(IndexChange::Deleted {
            kind: EntryKind::Directory,
            path: "projects".to_string()
        })]
    );
}

#[tokio::test]
async fn test_activate_emits_open_events() {
    let mut fx = Fixture::new(false).await;

    fx.index.activate("draft.md").await.unwrap();
    fx.index.activate("projects").await.unwrap();
    assert!(fx.index.activate("ghost.md").await.is_err());

    let names: Vec<&str> = fx.events.drain().iter().map(|e| e.name()).collect();
    assert_eq!(names, vec!["open:file", "open:directory"]);
}

#[tokio::test]
async fn test_refresh_picks_up_external_changes() {
    let fx = Fixture::new(false).await;
    std_fs::remove_file(fx.notes().join("final.md")).unwrap();
    std_fs::write(fx.notes().join("new.md"), "").unwrap();

    fx.index.refresh().await.unwrap();
    assert!(!fx.index.contains("final.md").await);
    assert!(fx.index.contains("new.md").await);
}

#[tokio::test]
async fn test_accepted_sequences_keep_paths_unique() {
    let fx = Fixture::new(false).await;

    fx.index.create("", "a.md", EntryKind::File).await.unwrap();
    fx.index.rename("a.md", "b.md").await.unwrap();
    assert!(fx.index.create("", "b.md", EntryKind::File).await.is_err());
    fx.index.move_entry("b.md", "projects").await.unwrap();
    fx.index.create("", "b.md", EntryKind::File).await.unwrap();

    let rows = fx.index.rows().await;
    let mut paths: Vec<&str> = rows.iter().map(|r| r.path.as_str()).collect();
    let total = paths.len();
    paths.sort_unstable();
    paths.dedup();
    assert_eq!(paths.len(), total);
}

#[tokio::test]
async fn test_nested_folders_named_like_the_base() {
    let mut fx = Fixture::new(false).await;

    fx.index.create("", "Noteshell", EntryKind::Directory).await.unwrap();
    fx.index
        .create("Noteshell", "notes", EntryKind::Directory)
        .await
        .unwrap();
    let path = fx
        .index
        .create("Noteshell/notes", "a.md", EntryKind::File)
        .await
        .unwrap();

    assert_eq!(path, "Noteshell/notes/a.md");
    assert!(fx.index.contains("Noteshell/notes/a.md").await);
    assert!(!fx.index.contains("a.md").await);
    assert!(fx.notes().join("Noteshell").join("notes").join("a.md").is_file());
    assert!(!fx.notes().join("a.md").exists());

    let events = fx.events.drain();
    assert_eq!(
        events.last(),
        Some(&IndexEvent::Changed(IndexChange::Created {
            kind: EntryKind::File,
            path: "Noteshell/notes/a.md".to_string()
        }))
    );
}

#[tokio::test]
async fn test_overlapping_mutations_run_one_at_a_time() {
    let fx = Fixture::with_provider(CountingProvider::holding_renames()).await;

    let create_while_renaming = async {
        fx.provider.entered.notified().await;
        let create = fx.index.create("", "x.md", EntryKind::File);
        tokio::pin!(create);
        for _ in 0..8 {
            tokio::select! {
                biased;
                result = &mut create => {
                    fx.provider.gate.notify_one();
                    return result;
                }
                _ = tokio::task::yield_now() => {}
            }
        }
        fx.provider.gate.notify_one();
        create.await
    };

    let (renamed, created) = tokio::join!(
        fx.index.rename("draft.md", "x.md"),
        create_while_renaming
    );

    assert_eq!(renamed, Ok("x.md".to_string()));
    assert_eq!(created, Err(IndexError::NameExists("x.md".to_string())));
    assert_eq!(fx.mutations(), 1);
    assert!(fx.index.contains("x.md").await);
    assert!(!fx.index.contains("draft.md").await);

    let rows = fx.index.rows().await;
    let mut paths: Vec<&str> = rows.iter().map(|r| r.path.as_str()).collect();
    let total = paths.len();
    paths.sort_unstable();
    paths.dedup();
    assert_eq!(paths.len(), total);
}
