use serde::{Deserialize, Serialize};

pub const CONFIG_VERSION: &str = "0.1.0";
pub const DEFAULT_FS_TIMEOUT_MS: u64 = 10_000;

/// Contents of `config.json` in the application root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub fs: FsConfig,
}

fn default_version() -> String {
    CONFIG_VERSION.to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            session: SessionConfig::default(),
            fs: FsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    #[serde(default = "default_active_page")]
    pub active_page: String,
    #[serde(default)]
    pub notes: NotesSession,
}

fn default_active_page() -> String {
    "notes".to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            active_page: default_active_page(),
            notes: NotesSession::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotesSession {
    #[serde(default)]
    pub active_tab: Option<String>,
    #[serde(default)]
    pub open_tabs: Vec<String>,
}

impl Default for NotesSession {
    fn default() -> Self {
        Self {
            active_tab: Some("./start.md".to_string()),
            open_tabs: vec!["./start.md".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FsConfig {
    /// Per-call limit for storage operations; `0` disables it.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_FS_TIMEOUT_MS
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl FsConfig {
    pub fn timeout(&self) -> Option<std::time::Duration> {
        (self.timeout_ms > 0).then(|| std::time::Duration::from_millis(self.timeout_ms))
    }
}
