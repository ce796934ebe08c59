//! Service ports: traits + data contracts.

pub mod config;
pub mod file;

pub use config::{AppConfig, FsConfig, NotesSession, SessionConfig};
pub use file::{FileError, FileFuture, FileProvider, RawEntry, Result as FileResult};
