//! 笔记文档：可选的头部字段 + 正文

use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Note {
    pub title: String,
    pub description: String,
    pub flags: BTreeSet<String>,
    pub fields: BTreeMap<String, String>,
    pub body: String,
}

fn is_delimiter(line: &str) -> bool {
    let line = line.trim_end();
    line.len() >= 3 && line.bytes().all(|b| b == b'-')
}

impl Note {
    /// Splits `text` into header and body.
    ///
    /// The header ends at the first line made of three or more dashes. A
    /// delimiter on the very first line does not count, so such a document
    /// is all body. Header lines are `key: value` pairs; a line without a
    /// colon is a flag.
    pub fn parse(file_name: &str, text: &str) -> Self {
        let mut note = Note {
            title: file_name.to_string(),
            ..Note::default()
        };

        let mut offset = 0;
        let mut split = None;
        for line in text.split_inclusive('\n') {
            let content = line.trim_end_matches(['\n', '\r']);
            if offset > 0 && is_delimiter(content) {
                split = Some((offset, offset + line.len()));
                break;
            }
            offset += line.len();
        }

        let Some((head_end, body_start)) = split else {
            note.body = text.to_string();
            return note;
        };

        for line in text[..head_end].lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match line.split_once(':') {
                Some((key, value)) => {
                    note.fields
                        .insert(key.trim().to_string(), value.trim().to_string());
                }
                None => {
                    note.flags.insert(line.to_string());
                }
            }
        }

        if let Some(title) = note.fields.get("title").filter(|t| !t.is_empty()) {
            note.title = title.clone();
        }
        if let Some(description) = note.fields.get("description") {
            note.description = description.clone();
        }
        note.body = text[body_start..].to_string();
        note
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.contains(flag)
    }

    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/models/note.rs"]
mod tests;
