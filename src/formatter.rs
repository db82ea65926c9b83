mod vmsg;
mod xml;

pub use self::{vmsg::VmsgFormatter, xml::XmlFormatter};
use crate::dom::Document;

/// Configuration options for formatting
#[derive(Debug, Clone)]
pub struct FormatConfig {
    /// Number of spaces for indentation
    pub indent_spaces: usize,
    /// Whether to start XML output with an `<?xml ...?>` declaration
    pub xml_declaration: bool,
}

/// Default configuration for formatting
impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            indent_spaces: 4,
            xml_declaration: true,
        }
    }
}

/// Trait for rendering a document tree as text
pub trait Formatter {
    fn format(&self, document: &Document, config: &FormatConfig) -> String;
}

/// Common formatting functionality shared between formatters
pub trait CommonFormatter {
    /// Creates the indentation string for a nesting level
    fn create_indentation(indent: usize, config: &FormatConfig) -> String {
        " ".repeat(indent * config.indent_spaces)
    }
}
