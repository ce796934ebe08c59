//! 应用目录布局
//!
//! - 应用根目录：显式指定且存在的 home，否则 `<用户主目录>[/Documents]/Noteshell`
//! - 根目录下每个分类一个子目录，外加 `config.json`
//! - 日志目录：
//!   - macOS: ~/Library/Application Support/noteshell/logs
//!   - Linux: ~/.local/share/noteshell/logs
//!   - Windows: %APPDATA%\noteshell\logs

use std::io;
use std::path::{Path, PathBuf};

use super::config::CONFIG_FILE;

pub const APP_FOLDER: &str = "Noteshell";
const APP_NAME: &str = "noteshell";
const LOG_DIR: &str = "logs";

pub const START_NOTE: &str = "start.md";

const INTRODUCTION: &str = "title: Welcome to Noteshell\n\
description: Simple introduction text.\n\
---\n\
Welcome to Noteshell.\n\n\
Start your new **awesome** adventure right here!\n\n\
_~~~ Noteshell_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Bookmarks,
    Databases,
    Notes,
    Snippets,
    Temp,
    Todos,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Bookmarks,
        Category::Databases,
        Category::Notes,
        Category::Snippets,
        Category::Temp,
        Category::Todos,
    ];

    pub fn dir_name(self) -> &'static str {
        match self {
            Category::Bookmarks => "bookmarks",
            Category::Databases => "databases",
            Category::Notes => "notes",
            Category::Snippets => "snippets",
            Category::Temp => "temp",
            Category::Todos => "todos",
        }
    }
}

fn user_home() -> Option<PathBuf> {
    let var = if cfg!(windows) { "USERPROFILE" } else { "HOME" };
    std::env::var_os(var)
        .map(PathBuf::from)
        .or_else(|| std::env::current_dir().ok())
}

/// Picks the application root.
///
/// An explicit `home` must already exist. Without one the folder is created
/// below the user's home (its `Documents` folder on Windows when present).
pub fn resolve_app_root(home: Option<&Path>) -> io::Result<PathBuf> {
    if let Some(home) = home {
        if home.is_dir() {
            return Ok(home.to_path_buf());
        }
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("home directory does not exist: {}", home.display()),
        ));
    }

    let base = user_home().ok_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, "Cannot determine home directory")
    })?;
    let documents = base.join("Documents");
    let base = if cfg!(windows) && documents.is_dir() {
        documents
    } else {
        base
    };

    let root = base.join(APP_FOLDER);
    if !root.exists() {
        std::fs::create_dir(&root)?;
    }
    Ok(root)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppLayout {
    root: PathBuf,
}

impl AppLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn category_dir(&self, category: Category) -> PathBuf {
        self.root.join(category.dir_name())
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    /// Storage root and confinement base for a category's `FileService`:
    /// the base is `<app folder>/<category>` below the root's parent.
    pub fn confinement(&self, category: Category) -> (PathBuf, String) {
        let folder = self.root.file_name().map(|n| n.to_string_lossy().to_string());
        match (self.root.parent(), folder) {
            (Some(parent), Some(folder)) => (
                parent.to_path_buf(),
                format!("{}/{}", folder, category.dir_name()),
            ),
            _ => (self.root.clone(), category.dir_name().to_string()),
        }
    }

    /// Creates missing category directories. A freshly created notes
    /// directory gets the introduction note. Returns whether it was seeded.
    pub fn ensure(&self) -> io::Result<bool> {
        if !self.root.exists() {
            std::fs::create_dir_all(&self.root)?;
        }

        let mut seeded = false;
        for category in Category::ALL {
            let dir = self.category_dir(category);
            if dir.exists() {
                continue;
            }
            std::fs::create_dir(&dir)?;
            if category == Category::Notes {
                std::fs::write(dir.join(START_NOTE), INTRODUCTION)?;
                seeded = true;
            }
        }
        if seeded {
            tracing::info!(root = %self.root.display(), "initialized application folder");
        }
        Ok(seeded)
    }
}

/// 获取应用数据目录
fn get_app_data_dir() -> Option<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        std::env::var("HOME").ok().map(|home| {
            PathBuf::from(home)
                .join("Library/Application Support")
                .join(APP_NAME)
        })
    }

    #[cfg(target_os = "linux")]
    {
        if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
            Some(PathBuf::from(xdg).join(APP_NAME))
        } else {
            std::env::var("HOME")
                .ok()
                .map(|home| PathBuf::from(home).join(".local/share").join(APP_NAME))
        }
    }

    #[cfg(target_os = "windows")]
    {
        std::env::var("APPDATA")
            .ok()
            .map(|appdata| PathBuf::from(appdata).join(APP_NAME))
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        None
    }
}

/// 获取日志目录路径
pub fn get_log_dir() -> Option<PathBuf> {
    get_app_data_dir().map(|p| p.join(LOG_DIR))
}

/// 确保日志目录存在
pub fn ensure_log_dir() -> io::Result<PathBuf> {
    let dir = get_log_dir().ok_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, "Cannot determine log directory")
    })?;

    if !dir.exists() {
        std::fs::create_dir_all(&dir)?;
    }

    Ok(dir)
}

#[cfg(test)]
#[path = "../../../../tests/unit/kernel/services/adapters/app_dirs.rs"]
mod tests;
