use super::*;

#[test]
fn test_plain_document_is_all_body() {
    let note = Note::parse("plain.md", "just text\nmore");
    assert_eq!(note.title, "plain.md");
    assert_eq!(note.description, "");
    assert!(note.fields.is_empty());
    assert_eq!(note.body, "just text\nmore");
}

#[test]
fn test_header_fields_and_flags() {
    let text = "title: Welcome\ndescription:  First steps \npinned\n\n---\n# Body\nline";
    let note = Note::parse("start.md", text);

    assert_eq!(note.title, "Welcome");
    assert_eq!(note.description, "First steps");
    assert!(note.has_flag("pinned"));
    assert_eq!(note.flags.len(), 1);
    assert_eq!(note.field("title"), Some("Welcome"));
    assert_eq!(note.body, "# Body\nline");
}

#[test]
fn test_delimiter_on_first_line_is_ignored() {
    let text = "---\ntitle: x\n---\nbody";
    let note = Note::parse("a.md", text);
    assert_eq!(note.title, "a.md");
    assert_eq!(note.body, text);
}

#[test]
fn test_longer_delimiter_and_crlf() {
    let note = Note::parse("a.md", "tag: one\r\n-----  \r\nbody\r\n");
    assert_eq!(note.field("tag"), Some("one"));
    assert_eq!(note.body, "body\r\n");
}

#[test]
fn test_value_keeps_later_colons() {
    let note = Note::parse("a.md", "link: https://example.com\n---\n");
    assert_eq!(note.field("link"), Some("https://example.com"));
    assert_eq!(note.body, "");
}

#[test]
fn test_two_dashes_are_not_a_delimiter() {
    let note = Note::parse("a.md", "a: b\n--\nbody");
    assert!(note.fields.is_empty());
    assert_eq!(note.body, "a: b\n--\nbody");
}
