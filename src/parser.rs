//! VMG line parser
//!
//! The parser is a single pass over the lines of one source with an explicit
//! stack of open elements:
//! - `BEGIN:<tag>` opens a child of the innermost open element
//! - `END:<tag>` closes it and must name it exactly
//! - any other line is an attribute (`name:value`) or a text child of the
//!   innermost open element; inside the body section only the configured
//!   prefix (`Date:`) makes an attribute

pub mod builder;
pub mod config;
pub mod line;

use std::io::{self, Read};

use tracing::debug;

pub use self::builder::MessageBuilder;
pub use self::config::{DuplicateAttributes, ParserConfig, ParsingContext};
use crate::dom::Document;
use crate::error::{ErrorKind, ParseError, Result};
use crate::source::{split_lines, LineReader};

/// Parser for VMG line sources
#[derive(Debug, Clone, Default)]
pub struct VmsgParser {
    config: ParserConfig,
}

impl VmsgParser {
    /// Creates a parser with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a parser after validating `config`
    pub fn with_config(config: ParserConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parses already-split lines
    pub fn parse_lines<I, S>(&self, lines: I) -> Result<Document>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.parse_source(lines.into_iter().map(Ok))
    }

    /// Parses a whole string, split with the same terminator rules as
    /// [`LineReader`]
    pub fn parse_str(&self, input: &str) -> Result<Document> {
        self.parse_lines(split_lines(input))
    }

    /// Parses raw bytes from a reader through [`LineReader`]
    pub fn parse_reader<R: Read>(&self, reader: R) -> Result<Document> {
        self.parse_source(LineReader::new(reader))
    }

    /// Parses a fallible line source into a fresh document
    pub fn parse_source<I, S>(&self, source: I) -> Result<Document>
    where
        I: IntoIterator<Item = io::Result<S>>,
        S: AsRef<str>,
    {
        let mut document = Document::new();
        let mut context = ParsingContext::new(document.root());
        self.parse_into(&mut document, &mut context, source)?;
        Ok(document)
    }

    /// Streams `source` into `document` starting from the state in `context`
    ///
    /// The context is left as the source leaves it, which is what lets a
    /// batch carry one stack across several sources.
    pub fn parse_into<I, S>(
        &self,
        document: &mut Document,
        context: &mut ParsingContext,
        source: I,
    ) -> Result<()>
    where
        I: IntoIterator<Item = io::Result<S>>,
        S: AsRef<str>,
    {
        let mut builder = MessageBuilder::new(document, context, &self.config);
        for line in source {
            let line = line.map_err(|e| {
                ParseError::new(ErrorKind::SourceReadFailure(e))
                    .with_line(builder.lines_read() + 1)
            })?;
            builder.feed(line.as_ref())?;
        }
        debug!(lines = builder.lines_read(), "source exhausted");
        builder.finish()
    }
}
