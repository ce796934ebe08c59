//! Path confinement for the document store.
//!
//! Every path handed to the filesystem adapter goes through [`join`], which
//! keeps the result below the confinement root no matter how many `..`,
//! drive prefixes or leading slashes the caller supplied. Entry names go
//! through [`is_valid_name`] before any disk I/O is attempted.

const FORBIDDEN_CHARS: &[char] = &['\0', '\\', '/', ':', '*', '?', '"', '\'', '<', '>', '|'];

/// Converts `\` to `/`, trims surrounding whitespace and strips exactly one
/// leading and one trailing `/`.
pub fn normalize(path: &str) -> String {
    let path = path.replace('\\', "/");
    let path = path.trim();
    let path = path.strip_prefix('/').unwrap_or(path);
    let path = path.strip_suffix('/').unwrap_or(path);
    path.to_string()
}

/// Joins `segments` below `root`.
///
/// Segments are normalized, empty ones dropped, `.`/`..` resolved lexically
/// (never above the joined path) and drive prefixes discarded. A result that
/// already starts with the root prefix is returned unchanged, so joining twice
/// is a no-op.
pub fn join<S: AsRef<str>>(root: &str, segments: &[S]) -> String {
    let root = normalize(root);
    let joined = segments
        .iter()
        .map(|s| normalize(s.as_ref()))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/");
    let entry_path = resolve_dots(&joined);

    if root.is_empty() {
        return entry_path;
    }
    if entry_path.is_empty() {
        return root;
    }

    let prefix = format!("{root}/");
    if entry_path.starts_with(&prefix) {
        entry_path
    } else {
        format!("{prefix}{entry_path}")
    }
}

fn resolve_dots(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for component in path.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            c if is_drive_prefix(c) => {}
            c => parts.push(c),
        }
    }
    parts.join("/")
}

fn is_drive_prefix(component: &str) -> bool {
    let mut chars = component.chars();
    matches!(
        (chars.next(), chars.next(), chars.next()),
        (Some(letter), Some(':'), None) if letter.is_ascii_alphabetic()
    )
}

/// Joins a child name onto a relative parent path (`""` is the root).
pub fn child_path(parent: &str, name: &str) -> String {
    let parent = normalize(parent);
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}/{name}")
    }
}

/// Parent of a relative path; top level entries have the root (`""`) as parent.
pub fn parent_path(path: &str) -> &str {
    path.rsplit_once('/').map(|(parent, _)| parent).unwrap_or("")
}

/// Last segment of a relative path.
pub fn file_name(path: &str) -> &str {
    path.rsplit_once('/').map(|(_, name)| name).unwrap_or(path)
}

/// `true` when `path` equals `ancestor` or lies below it.
pub fn is_same_or_descendant(path: &str, ancestor: &str) -> bool {
    path == ancestor
        || path
            .strip_prefix(ancestor)
            .is_some_and(|rest| rest.starts_with('/'))
}

fn is_exotic_whitespace(c: char) -> bool {
    matches!(
        c,
        '\u{00a0}'
            | '\u{1680}'
            | '\u{2000}'..='\u{200a}'
            | '\u{2028}'
            | '\u{2029}'
            | '\u{202f}'
            | '\u{205f}'
            | '\u{3000}'
            | '\u{feff}'
    )
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Checks whether `name` can be used as a file or directory name.
pub fn is_valid_name(name: &str) -> bool {
    let Some(last) = name.chars().next_back() else {
        return false;
    };

    if name
        .chars()
        .any(|c| FORBIDDEN_CHARS.contains(&c) || c.is_control() || is_exotic_whitespace(c))
    {
        return false;
    }

    if name.starts_with(char::is_whitespace) || name.ends_with(char::is_whitespace) {
        return false;
    }

    is_word_char(last)
}

#[cfg(test)]
#[path = "../../tests/unit/core/path.rs"]
mod tests;
