//! Service adapters: OS specific implementations (IO/async).

pub mod app_dirs;
pub mod config;
pub mod file;

pub use app_dirs::{ensure_log_dir, get_log_dir, resolve_app_root, AppLayout, Category};
pub use config::{ConfigError, ConfigStore};
pub use file::{FileService, LocalFileProvider};
