use tracing::{debug, trace};

use super::config::{DuplicateAttributes, ParserConfig, ParsingContext};
use super::line::{classify, classify_content, clean_line, Content, Line};
use crate::dom::{Document, NodeId};
use crate::error::{ErrorKind, ParseError, Result};

/// Tag name reported when a closing tag arrives with no element open
pub const DOCUMENT_NODE_NAME: &str = "#document";

/// Streams lines of one source into a document
///
/// The builder borrows the document and the open-tag stack, so a batch
/// driver can hand the same stack to one builder per source.
#[derive(Debug)]
pub struct MessageBuilder<'a> {
    document: &'a mut Document,
    context: &'a mut ParsingContext,
    config: &'a ParserConfig,
    base_depth: usize,
    line_no: usize,
}

impl<'a> MessageBuilder<'a> {
    pub fn new(
        document: &'a mut Document,
        context: &'a mut ParsingContext,
        config: &'a ParserConfig,
    ) -> Self {
        let base_depth = context.depth();
        Self {
            document,
            context,
            config,
            base_depth,
            line_no: 0,
        }
    }

    /// Number of lines consumed so far
    pub fn lines_read(&self) -> usize {
        self.line_no
    }

    /// Processes one raw line, terminator already removed
    pub fn feed(&mut self, raw: &str) -> Result<()> {
        self.line_no += 1;
        let line = clean_line(raw);
        trace!(line = self.line_no, "{}", line);

        let result = match classify(&line) {
            Line::Open(tag) => self.process_start_tag(tag),
            Line::Close(tag) => self.process_end_tag(tag),
            Line::Content(content) => self.process_content(content),
        };
        result.map_err(|e| e.with_line(self.line_no))
    }

    /// Ends the source, checking balance when the config asks for it
    pub fn finish(self) -> Result<()> {
        let depth = self.context.depth();
        if self.config.require_balanced_at_eof && depth > self.base_depth {
            let open = self
                .context
                .open_elements()
                .iter()
                .skip(self.base_depth)
                .filter_map(|&id| self.document.tag_name(id))
                .map(str::to_string)
                .collect();
            return Err(ParseError::new(ErrorKind::UnbalancedAtEof { open }));
        }
        if depth > self.base_depth {
            debug!(open = depth - self.base_depth, "source ended with open elements");
        }
        Ok(())
    }

    fn process_start_tag(&mut self, tag: &str) -> Result<()> {
        if tag.is_empty() {
            return Err(ParseError::new(ErrorKind::MissingTagName));
        }
        self.context.check_depth(self.config)?;
        let element = self.document.create_element(tag)?;
        self.document.append_child(self.context.current(), element)?;
        self.context.enter_nested(element, self.config)?;
        debug!(depth = self.context.depth(), "pushing {}", tag);
        Ok(())
    }

    fn process_end_tag(&mut self, tag: &str) -> Result<()> {
        if tag.is_empty() {
            return Err(ParseError::new(ErrorKind::MissingTagName));
        }
        let expected = self.current_tag().unwrap_or(DOCUMENT_NODE_NAME);
        if self.context.at_root() || expected != tag {
            return Err(ParseError::new(ErrorKind::MismatchedTag {
                expected: expected.to_string(),
                actual: tag.to_string(),
            }));
        }
        self.context.exit_nested();
        debug!(depth = self.context.depth(), "popping {}", tag);
        Ok(())
    }

    fn process_content(&mut self, line: &str) -> Result<()> {
        let element = self.enclosing_element()?;
        let enclosing_tag = self.document.tag_name(element).unwrap_or_default();

        match classify_content(line, enclosing_tag, self.config) {
            Content::Attribute { name, value } => self.process_attribute(element, name, value),
            Content::Text(text) => self.process_text(element, text),
        }
    }

    fn process_attribute(&mut self, element: NodeId, name: &str, value: &str) -> Result<()> {
        if self.config.duplicate_attributes == DuplicateAttributes::FirstWins
            && self.document.attribute(element, name).is_some()
        {
            trace!(attribute = name, "keeping first value");
            return Ok(());
        }
        self.document.set_attribute(element, name, value)
    }

    fn process_text(&mut self, element: NodeId, text: &str) -> Result<()> {
        let node = self.document.create_text(text);
        self.document.append_child(element, node)
    }

    fn enclosing_element(&self) -> Result<NodeId> {
        if self.context.at_root() {
            return Err(ParseError::new(ErrorKind::NoEnclosingElement));
        }
        Ok(self.context.current())
    }

    fn current_tag(&self) -> Option<&str> {
        self.document.tag_name(self.context.current())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(lines: &[&str], config: &ParserConfig) -> (Document, ParsingContext, Result<()>) {
        let mut doc = Document::new();
        let mut ctx = ParsingContext::new(doc.root());
        let mut builder = MessageBuilder::new(&mut doc, &mut ctx, config);
        let fed = lines.iter().try_for_each(|line| builder.feed(line));
        let result = fed.and_then(|()| builder.finish());
        (doc, ctx, result)
    }

    fn assert_only_open_message(doc: &Document, ctx: &ParsingContext) {
        assert_eq!(doc.len(), 2);
        let vmsg = doc.document_element();
        assert_eq!(vmsg.and_then(|id| doc.tag_name(id)), Some("VMSG"));
        assert!(vmsg.is_some_and(|id| doc.children(id).is_empty()));
        assert_eq!(ctx.depth(), 1);
        assert_eq!(ctx.current(), vmsg.unwrap_or(doc.root()));
    }

    #[test]
    fn test_empty_close_tag_leaves_tree_untouched() {
        let (doc, ctx, result) = run(&["BEGIN:VMSG", "END:"], &ParserConfig::default());
        let err = result.unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::MissingTagName));
        assert_eq!(err.line(), Some(2));
        assert_only_open_message(&doc, &ctx);
    }

    #[test]
    fn test_mismatched_close_tag_leaves_tree_untouched() {
        let (doc, ctx, result) = run(&["BEGIN:VMSG", "END:VENV"], &ParserConfig::default());
        assert!(matches!(
            result.unwrap_err().kind(),
            ErrorKind::MismatchedTag { .. }
        ));
        assert_only_open_message(&doc, &ctx);
    }

    #[test]
    fn test_depth_limit_rejects_before_appending() {
        let config = ParserConfig {
            max_depth: 1,
            ..ParserConfig::default()
        };
        let (doc, ctx, result) = run(&["BEGIN:VMSG", "BEGIN:VENV"], &config);
        assert!(matches!(
            result.unwrap_err().kind(),
            ErrorKind::MaxDepthExceeded { max: 1 }
        ));
        assert_only_open_message(&doc, &ctx);
    }

    #[test]
    fn test_error_carries_line_number() {
        let lines = ["BEGIN:VMSG", "VERSION:1.1", "END:VENV"];
        let (_, _, result) = run(&lines, &ParserConfig::default());
        let err = result.unwrap_err();
        assert_eq!(err.line(), Some(3));
        assert!(matches!(
            err.kind(),
            ErrorKind::MismatchedTag { expected, actual } if expected == "VMSG" && actual == "VENV"
        ));
    }

    #[test]
    fn test_close_at_root_is_mismatch() {
        let (_, _, result) = run(&["END:VMSG"], &ParserConfig::default());
        let err = result.unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::MismatchedTag { expected, .. } if expected == DOCUMENT_NODE_NAME
        ));
    }

    #[test]
    fn test_document_name_cannot_close_root() {
        let (_, _, result) = run(&["END:#document"], &ParserConfig::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_first_wins_keeps_original_value() {
        let config = ParserConfig {
            duplicate_attributes: DuplicateAttributes::FirstWins,
            ..ParserConfig::default()
        };
        let lines = ["BEGIN:VCARD", "TEL:1", "TEL:2", "END:VCARD"];
        let (doc, _, result) = run(&lines, &config);
        assert!(result.is_ok());
        let card = doc.document_element();
        assert_eq!(card.and_then(|id| doc.attribute(id, "TEL")), Some("1"));
    }

    #[test]
    fn test_finish_reports_open_tags_in_strict_mode() {
        let (_, _, result) = run(&["BEGIN:VMSG", "BEGIN:VENV"], &ParserConfig::strict());
        let err = result.unwrap_err();
        match err.kind() {
            ErrorKind::UnbalancedAtEof { open } => assert_eq!(open, &["VMSG", "VENV"]),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
