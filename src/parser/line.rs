//! Line cleanup and classification

use std::borrow::Cow;

use super::config::ParserConfig;

pub const BEGIN_PREFIX: &str = "BEGIN:";
pub const END_PREFIX: &str = "END:";

/// Structural role of one cleaned line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line<'a> {
    /// `BEGIN:<tag>`; the tag may be empty, which the builder rejects
    Open(&'a str),
    /// `END:<tag>`
    Close(&'a str),
    /// Anything else, meant for the innermost open element
    Content(&'a str),
}

/// How a content line is applied to its enclosing element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Content<'a> {
    Attribute { name: &'a str, value: &'a str },
    Text(&'a str),
}

/// Removes every NUL character; nothing else is touched
///
/// Exports are frequently UTF-16 text read as single bytes, which leaves a
/// NUL after every ASCII character.
pub fn clean_line(raw: &str) -> Cow<'_, str> {
    if raw.contains('\0') {
        Cow::Owned(raw.chars().filter(|&c| c != '\0').collect())
    } else {
        Cow::Borrowed(raw)
    }
}

pub fn classify(line: &str) -> Line<'_> {
    if let Some(tag) = line.strip_prefix(BEGIN_PREFIX) {
        Line::Open(tag)
    } else if let Some(tag) = line.strip_prefix(END_PREFIX) {
        Line::Close(tag)
    } else {
        Line::Content(line)
    }
}

/// Decides between attribute and text for a line inside `enclosing_tag`
///
/// Inside the body section only the configured prefix marks an attribute,
/// so colons in message text stay text.
pub fn classify_content<'a>(
    line: &'a str,
    enclosing_tag: &str,
    config: &ParserConfig,
) -> Content<'a> {
    let is_attribute = if enclosing_tag == config.body_tag {
        line.starts_with(config.body_attribute_prefix.as_str())
    } else {
        line.contains(':')
    };

    if is_attribute {
        let (name, value) = split_attribute(line);
        Content::Attribute { name, value }
    } else {
        Content::Text(line)
    }
}

/// Splits at the first colon; without one the whole line is the name
pub fn split_attribute(line: &str) -> (&str, &str) {
    line.split_once(':').unwrap_or((line, ""))
}
