use crate::{
    dom::Document,
    error::Result,
    formatter::{FormatConfig, Formatter, VmsgFormatter, XmlFormatter},
    parser::VmsgParser,
};

pub fn parse_vmsg(content: &str) -> Result<Document> {
    VmsgParser::new().parse_str(content)
}

pub fn format_xml(document: &Document) -> String {
    XmlFormatter.format(document, &FormatConfig::default())
}

pub fn format_vmsg(document: &Document) -> String {
    VmsgFormatter.format(document, &FormatConfig::default())
}
