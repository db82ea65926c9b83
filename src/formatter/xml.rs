use std::borrow::Cow;
use std::fmt::Write as _;

use super::{CommonFormatter, FormatConfig, Formatter};
use crate::dom::{Document, Element, NodeId, NodeKind};

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Writes a document as indented XML
///
/// Tag and attribute names that are not XML names get every offending
/// character replaced by `_xHHHH_`; an empty name becomes `_`. An element
/// whose only child is a text node stays on one line; otherwise every child
/// gets its own line.
pub struct XmlFormatter;

impl CommonFormatter for XmlFormatter {}

impl Formatter for XmlFormatter {
    fn format(&self, document: &Document, config: &FormatConfig) -> String {
        let mut output = String::new();
        if config.xml_declaration {
            output.push_str(XML_DECLARATION);
            output.push('\n');
        }
        for &child in document.children(document.root()) {
            Self::format_node(document, child, 0, config, &mut output);
        }
        output
    }
}

impl XmlFormatter {
    fn format_node(
        document: &Document,
        id: NodeId,
        indent: usize,
        config: &FormatConfig,
        output: &mut String,
    ) {
        match document.kind(id) {
            Some(NodeKind::Element(element)) => {
                Self::format_element(document, element, indent, config, output);
            }
            Some(NodeKind::Text(text)) => {
                output.push_str(&Self::create_indentation(indent, config));
                output.push_str(&escape_xml(text));
                output.push('\n');
            }
            Some(NodeKind::Document { .. }) | None => {}
        }
    }

    fn format_element(
        document: &Document,
        element: &Element,
        indent: usize,
        config: &FormatConfig,
        output: &mut String,
    ) {
        let indent_str = Self::create_indentation(indent, config);
        output.push_str(&indent_str);
        output.push('<');
        output.push_str(&xml_name(element.name()));
        for (key, value) in element.attributes() {
            output.push(' ');
            output.push_str(&xml_name(key));
            output.push_str("=\"");
            output.push_str(&escape_xml(value));
            output.push('"');
        }

        let children = element.children();
        if children.is_empty() {
            output.push_str("/>\n");
            return;
        }

        output.push('>');
        if let [only] = children {
            if let Some(text) = document.text(*only) {
                output.push_str(&escape_xml(text));
                Self::close_tag(element, output);
                return;
            }
        }

        output.push('\n');
        for &child in children {
            Self::format_node(document, child, indent + 1, config, output);
        }
        output.push_str(&indent_str);
        Self::close_tag(element, output);
    }

    fn close_tag(element: &Element, output: &mut String) {
        output.push_str("</");
        output.push_str(&xml_name(element.name()));
        output.push_str(">\n");
    }
}

/// Maps `name` onto a valid XML name
fn xml_name(name: &str) -> Cow<'_, str> {
    if name.is_empty() {
        return Cow::Borrowed("_");
    }
    if name.chars().enumerate().all(|(i, c)| is_valid_at(i, c)) {
        return Cow::Borrowed(name);
    }

    let mut mapped = String::with_capacity(name.len() + 8);
    for (i, c) in name.chars().enumerate() {
        if is_valid_at(i, c) {
            mapped.push(c);
        } else {
            let _ = write!(mapped, "_x{:04X}_", u32::from(c));
        }
    }
    Cow::Owned(mapped)
}

fn is_valid_at(position: usize, c: char) -> bool {
    if position == 0 {
        is_name_start_char(c)
    } else {
        is_name_char(c)
    }
}

fn is_name_start_char(c: char) -> bool {
    matches!(c,
        ':' | 'A'..='Z' | '_' | 'a'..='z'
        | '\u{C0}'..='\u{D6}' | '\u{D8}'..='\u{F6}' | '\u{F8}'..='\u{2FF}'
        | '\u{370}'..='\u{37D}' | '\u{37F}'..='\u{1FFF}' | '\u{200C}'..='\u{200D}'
        | '\u{2070}'..='\u{218F}' | '\u{2C00}'..='\u{2FEF}' | '\u{3001}'..='\u{D7FF}'
        | '\u{F900}'..='\u{FDCF}' | '\u{FDF0}'..='\u{FFFD}' | '\u{10000}'..='\u{EFFFF}')
}

fn is_name_char(c: char) -> bool {
    is_name_start_char(c)
        || matches!(c,
            '-' | '.' | '0'..='9' | '\u{B7}' | '\u{300}'..='\u{36F}' | '\u{203F}'..='\u{2040}')
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
