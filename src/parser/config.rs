use std::fmt;

use crate::dom::NodeId;
use crate::error::{ErrorKind, ParseError, Result};

/// Maximum element nesting; 0 leaves nesting unlimited
pub const DEFAULT_MAX_DEPTH: usize = 0;
/// Tag of the message-body section
pub const DEFAULT_BODY_TAG: &str = "VBODY";
/// Only lines with this prefix are attributes inside the body section
pub const DEFAULT_BODY_ATTRIBUTE_PREFIX: &str = "Date:";

/// What happens when an element receives the same attribute twice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicateAttributes {
    /// The later value replaces the earlier one
    #[default]
    LastWins,
    /// The first value is kept, later ones are ignored
    FirstWins,
}

/// Configuration for the line parser
#[derive(Debug, Clone, PartialEq)]
pub struct ParserConfig {
    /// Fail when a source ends with elements still open
    pub require_balanced_at_eof: bool,
    /// Maximum nesting depth of open elements (0 means unlimited)
    pub max_depth: usize,
    /// Element whose content lines are mostly free text
    pub body_tag: String,
    /// Prefix that marks an attribute line inside `body_tag`
    pub body_attribute_prefix: String,
    /// Policy for repeated attribute names on one element
    pub duplicate_attributes: DuplicateAttributes,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            require_balanced_at_eof: false,
            max_depth: DEFAULT_MAX_DEPTH,
            body_tag: DEFAULT_BODY_TAG.to_string(),
            body_attribute_prefix: DEFAULT_BODY_ATTRIBUTE_PREFIX.to_string(),
            duplicate_attributes: DuplicateAttributes::LastWins,
        }
    }
}

impl fmt::Display for ParserConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ParserConfig {{ require_balanced_at_eof: {}, max_depth: {}, body_tag: {}, body_attribute_prefix: {}, duplicate_attributes: {:?} }}",
            self.require_balanced_at_eof,
            self.max_depth,
            self.body_tag,
            self.body_attribute_prefix,
            self.duplicate_attributes
        )
    }
}

impl ParserConfig {
    /// Default configuration that also rejects unterminated elements
    pub fn strict() -> Self {
        Self {
            require_balanced_at_eof: true,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.body_tag.is_empty() {
            return Err(ParseError::new(ErrorKind::ParserInitFailure(
                "body tag must not be empty".to_string(),
            )));
        }
        if !self.body_attribute_prefix.contains(':') {
            return Err(ParseError::new(ErrorKind::ParserInitFailure(format!(
                "body attribute prefix '{}' has no ':' separator",
                self.body_attribute_prefix
            ))));
        }
        Ok(())
    }
}

/// The open-tag stack of one parse
///
/// The document root sits implicitly at the bottom and is never popped;
/// `open` holds the elements whose closing tag has not been seen yet.
/// Elements opened by the caller before parsing (a batch container) do not
/// count against `max_depth`.
#[derive(Debug, Clone)]
pub struct ParsingContext {
    root: NodeId,
    open: Vec<NodeId>,
    preset: usize,
}

impl ParsingContext {
    pub fn new(root: NodeId) -> Self {
        Self {
            root,
            open: Vec::new(),
            preset: 0,
        }
    }

    /// Context that starts with `container` already open
    pub fn within(root: NodeId, container: NodeId) -> Self {
        Self {
            root,
            open: vec![container],
            preset: 1,
        }
    }

    /// Innermost open element, or the document root when none is open
    pub fn current(&self) -> NodeId {
        self.open.last().copied().unwrap_or(self.root)
    }

    /// True when no element is open
    pub fn at_root(&self) -> bool {
        self.open.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.open.len()
    }

    /// Open elements, outermost first
    pub fn open_elements(&self) -> &[NodeId] {
        &self.open
    }

    /// Fails when one more element would exceed `config.max_depth`
    pub fn check_depth(&self, config: &ParserConfig) -> Result<()> {
        let nested = self.open.len().saturating_sub(self.preset);
        if config.max_depth != 0 && nested >= config.max_depth {
            return Err(ParseError::new(ErrorKind::MaxDepthExceeded {
                max: config.max_depth,
            }));
        }
        Ok(())
    }

    pub fn enter_nested(&mut self, element: NodeId, config: &ParserConfig) -> Result<()> {
        self.check_depth(config)?;
        self.open.push(element);
        Ok(())
    }

    pub fn exit_nested(&mut self) -> Option<NodeId> {
        self.open.pop()
    }
}
