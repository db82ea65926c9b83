//! Error handling types for the converter
//!
//! Every failure is fatal to the source being parsed. A [`ParseError`] wraps
//! the specific [`ErrorKind`] together with the line it was raised on and,
//! when a batch driver knows it, the label of the source (usually a path).

use std::{error::Error as StdError, fmt, io};

use thiserror::Error;

/// Main error type for parsing and tree operations
#[derive(Debug)]
pub struct ParseError {
    /// The specific kind of error
    kind: ErrorKind,
    /// 1-based line number of the offending line
    line: Option<usize>,
    /// Additional context for the error, such as the input file
    context: Option<String>,
}

/// Error categories raised by the tree model and the line parser
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// `BEGIN:` or `END:` with nothing after the prefix
    #[error("missing tag name")]
    MissingTagName,

    /// `END:` naming a different element than the one currently open
    #[error("mismatched closing tag: expected {expected}, found {actual}")]
    MismatchedTag { expected: String, actual: String },

    /// Attribute or text line with no open element to receive it
    #[error("content line outside of any element")]
    NoEnclosingElement,

    /// The parser could not be set up, e.g. because of an invalid config
    #[error("failed to initialise parser: {0}")]
    ParserInitFailure(String),

    /// The line source failed mid-stream
    #[error("failed to read from source: {0}")]
    SourceReadFailure(#[source] io::Error),

    /// Element created with an empty tag name
    #[error("element tag name must not be empty")]
    InvalidTagName,

    /// Tree mutation that would break the tree invariants
    #[error("invalid append: {0}")]
    InvalidAppend(&'static str),

    /// Input ended while elements were still open (strict mode only)
    #[error("unterminated elements at end of input: {}", .open.join(" > "))]
    UnbalancedAtEof { open: Vec<String> },

    /// Element nesting exceeded the configured limit
    #[error("maximum nesting depth of {max} exceeded")]
    MaxDepthExceeded { max: usize },
}

impl ParseError {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            line: None,
            context: None,
        }
    }

    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn line(&self) -> Option<usize> {
        self.line
    }

    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    pub fn into_kind(self) -> ErrorKind {
        self.kind
    }
}

impl From<ErrorKind> for ParseError {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ctx) = &self.context {
            write!(f, "{}: ", ctx)?;
        }
        match self.line {
            Some(line) => write!(f, "at line {}: {}", line, self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl StdError for ParseError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.kind.source()
    }
}

pub type Result<T> = std::result::Result<T, ParseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_line_and_context() {
        let err = ParseError::new(ErrorKind::MismatchedTag {
            expected: "VBODY".to_string(),
            actual: "VENV".to_string(),
        })
        .with_line(7)
        .with_context("inbox/0001.vmg");

        assert_eq!(
            err.to_string(),
            "inbox/0001.vmg: at line 7: mismatched closing tag: expected VBODY, found VENV"
        );
    }

    #[test]
    fn test_display_without_location() {
        let err = ParseError::from(ErrorKind::NoEnclosingElement);
        assert_eq!(err.to_string(), "content line outside of any element");
        assert_eq!(err.line(), None);
        assert_eq!(err.context(), None);
    }

    #[test]
    fn test_source_read_failure_exposes_io_error() {
        let io_err = io::Error::new(io::ErrorKind::UnexpectedEof, "truncated");
        let err = ParseError::new(ErrorKind::SourceReadFailure(io_err));
        let source = err.source().map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("truncated"));
    }

    #[test]
    fn test_unbalanced_lists_open_tags() {
        let err = ParseError::new(ErrorKind::UnbalancedAtEof {
            open: vec!["VMSG".to_string(), "VENV".to_string()],
        });
        assert!(err.to_string().contains("VMSG > VENV"));
    }
}
