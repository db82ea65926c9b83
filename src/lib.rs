//! vmsg2xml: Nokia VMG text-message exports to XML
//!
//! This crate provides functionality to:
//! - Parse VMG line sources into an ordered document tree
//! - Convert whole directories of messages into one document
//! - Write the tree as XML, or back as VMG lines
//!
//! # Examples
//! ```
//! use vmsg2xml::{FormatConfig, Formatter, VmsgParser, XmlFormatter};
//!
//! fn example() -> vmsg2xml::Result<()> {
//!     let doc = VmsgParser::new().parse_lines([
//!         "BEGIN:VMSG",
//!         "BEGIN:VBODY",
//!         "Date:20081026",
//!         "Yes thanks, see you then",
//!         "END:VBODY",
//!         "END:VMSG",
//!     ])?;
//!     println!("{}", XmlFormatter.format(&doc, &FormatConfig::default()));
//!     Ok(())
//! }
//! # example().unwrap();
//! ```

use std::fs::File;
use std::path::Path;

use tracing::{debug, error, info, instrument};

pub mod batch;
pub mod common;
pub mod dom;
pub mod error;
pub mod formatter;
pub mod parser;
pub mod source;
pub mod utils;

// Re-exports
pub use batch::{convert_batch, BatchConfig, BatchReport, BatchSource, OnError, SharedBatch};
pub use common::{documents_equal, trees_equal};
pub use dom::{Document, NodeId, NodeKind};
pub use error::{ErrorKind, ParseError, Result};
pub use formatter::{FormatConfig, Formatter, VmsgFormatter, XmlFormatter};
pub use parser::{DuplicateAttributes, ParserConfig, VmsgParser};
pub use source::LineReader;

/// Parses one message file with the given configuration
#[instrument(skip(config), fields(path = %path.as_ref().display()))]
pub fn parse_file<P: AsRef<Path>>(path: P, config: &ParserConfig) -> Result<Document> {
    let path = path.as_ref();
    debug!("Starting to parse file");

    let parser = VmsgParser::with_config(config.clone())?;
    let file = File::open(path).map_err(|e| {
        error!("Failed to open file: {}", e);
        ParseError::new(ErrorKind::SourceReadFailure(e)).with_context(path.display().to_string())
    })?;

    let document = parser
        .parse_reader(file)
        .map_err(|e| e.with_context(path.display().to_string()))?;

    info!(nodes = document.len(), "File parsed");
    Ok(document)
}
