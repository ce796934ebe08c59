//! 编辑器实例：标题、正文与统计状态

use super::state::{ReactiveState, StateError, StateObserver};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditorStat {
    Lines,
    Words,
    Characters,
}

fn measure(content: &str) -> [(EditorStat, usize); 3] {
    [
        (EditorStat::Lines, content.lines().count()),
        (EditorStat::Words, content.split_whitespace().count()),
        (EditorStat::Characters, content.chars().count()),
    ]
}

#[derive(Debug)]
pub struct EditorInstance {
    title: String,
    content: String,
    stats: ReactiveState<EditorStat, usize>,
}

impl EditorInstance {
    pub fn new(title: &str, content: &str) -> Self {
        Self {
            title: title.to_string(),
            content: content.to_string(),
            stats: ReactiveState::new(measure(content)),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Replaces the text and updates the statistics that changed.
    pub fn set_content(&mut self, content: &str) {
        self.content = content.to_string();
        for (stat, value) in measure(content) {
            if let Err(e) = self.stats.set_if_changed(stat, value) {
                tracing::warn!(?stat, error = %e, "editor statistic update failed");
            }
        }
    }

    pub fn stat(&self, stat: EditorStat) -> usize {
        self.stats.get(&stat).copied().unwrap_or(0)
    }

    /// Binds a status display to the statistics.
    pub fn bind_stats(
        &mut self,
        observer: Box<dyn StateObserver<EditorStat, usize>>,
    ) -> Result<(), StateError> {
        self.stats.bind(observer)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/note_editor.rs"]
mod tests;
