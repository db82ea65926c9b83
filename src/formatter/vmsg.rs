use super::{FormatConfig, Formatter};
use crate::dom::{Document, NodeId, NodeKind};
use crate::parser::line::{BEGIN_PREFIX, END_PREFIX};

const LINE_ENDING: &str = "\r\n";

/// Writes a document back as VMG lines
///
/// Attributes come first in each element, then the children in order. Text
/// that would itself look like a tag or attribute line is written verbatim,
/// so such trees do not survive a re-parse unchanged.
pub struct VmsgFormatter;

impl Formatter for VmsgFormatter {
    fn format(&self, document: &Document, _config: &FormatConfig) -> String {
        let mut output = String::new();
        for &child in document.children(document.root()) {
            Self::format_node(document, child, &mut output);
        }
        output
    }
}

impl VmsgFormatter {
    fn format_node(document: &Document, id: NodeId, output: &mut String) {
        match document.kind(id) {
            Some(NodeKind::Element(element)) => {
                push_line(output, &[BEGIN_PREFIX, element.name()]);
                for (name, value) in element.attributes() {
                    push_line(output, &[name.as_str(), ":", value.as_str()]);
                }
                for &child in element.children() {
                    Self::format_node(document, child, output);
                }
                push_line(output, &[END_PREFIX, element.name()]);
            }
            Some(NodeKind::Text(text)) => push_line(output, &[text.as_str()]),
            Some(NodeKind::Document { .. }) | None => {}
        }
    }
}

fn push_line(output: &mut String, parts: &[&str]) {
    parts.iter().for_each(|part| output.push_str(part));
    output.push_str(LINE_ENDING);
}
