use super::node::{Attributes, Element, NodeData, NodeId, NodeKind};
use crate::error::{ErrorKind, ParseError, Result};

const UNKNOWN_NODE: &str = "node does not belong to this document";

/// Arena-backed document tree
///
/// Every node is owned by the document; parents refer to their children
/// through [`NodeId`] handles and each node stores the handle of its parent.
/// Slot 0 always holds the document root.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    nodes: Vec<NodeData>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Creates an empty document holding only its root node
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeData {
                parent: None,
                kind: NodeKind::Document {
                    children: Vec::new(),
                },
            }],
        }
    }

    /// Handle of the document root
    pub const fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of nodes in the arena, the root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when nothing has been created besides the root
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Creates a detached element
    pub fn create_element(&mut self, name: impl Into<String>) -> Result<NodeId> {
        let name = name.into();
        if name.is_empty() {
            return Err(ParseError::new(ErrorKind::InvalidTagName));
        }
        Ok(self.push_node(NodeKind::Element(Element::new(name))))
    }

    /// Creates a detached text node; the content may be empty
    pub fn create_text(&mut self, content: impl Into<String>) -> NodeId {
        self.push_node(NodeKind::Text(content.into()))
    }

    fn push_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData { parent: None, kind });
        id
    }

    /// Appends `child` as the last child of `parent`
    ///
    /// Fails when `parent` is a text node, when `child` is already attached
    /// somewhere, when `child` is the document root, or when `child` is
    /// `parent` itself or one of its ancestors.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        let parent_kind = &self.data(parent)?.kind;
        if matches!(parent_kind, NodeKind::Text(_)) {
            return Err(invalid_append("text nodes cannot have children"));
        }

        let child_data = self.data(child)?;
        if child_data.kind.is_document() {
            return Err(invalid_append("the document root cannot be a child"));
        }
        if child_data.parent.is_some() {
            return Err(invalid_append("node already has a parent"));
        }
        if self.ancestors_or_self(parent).any(|id| id == child) {
            return Err(invalid_append("node cannot be appended under itself"));
        }

        if let Some(data) = self.nodes.get_mut(child.0) {
            data.parent = Some(parent);
        }
        self.nodes
            .get_mut(parent.0)
            .and_then(|data| data.kind.children_mut())
            .ok_or_else(|| invalid_append(UNKNOWN_NODE))?
            .push(child);
        Ok(())
    }

    /// Inserts or overwrites an attribute on `element`
    ///
    /// Overwriting keeps the attribute at its original position.
    pub fn set_attribute(
        &mut self,
        element: NodeId,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<()> {
        match self.nodes.get_mut(element.0).map(|data| &mut data.kind) {
            Some(NodeKind::Element(el)) => {
                el.attributes.insert(name.into(), value.into());
                Ok(())
            }
            Some(_) => Err(invalid_append("attributes can only be set on elements")),
            None => Err(invalid_append(UNKNOWN_NODE)),
        }
    }

    fn data(&self, id: NodeId) -> Result<&NodeData> {
        self.nodes
            .get(id.0)
            .ok_or_else(|| invalid_append(UNKNOWN_NODE))
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.nodes.get(id.0).map(|data| &data.kind)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|data| data.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match self.kind(id) {
            Some(kind) => kind.children(),
            None => &[],
        }
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        self.kind(id).and_then(NodeKind::as_element)
    }

    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(Element::name)
    }

    pub fn attributes(&self, id: NodeId) -> Option<&Attributes> {
        self.element(id).map(Element::attributes)
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attributes(id)
            .and_then(|attrs| attrs.get(name))
            .map(String::as_str)
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.kind(id).and_then(NodeKind::as_text)
    }

    /// First top-level element, the message in single-source parses
    pub fn document_element(&self) -> Option<NodeId> {
        self.child_elements(self.root()).next()
    }

    pub fn child_elements(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(|&child| self.element(child).is_some())
    }

    /// First child element of `id` named `name`
    pub fn child_element(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.child_elements(id)
            .find(|&child| self.tag_name(child) == Some(name))
    }

    /// Follows `path` one child element at a time, taking the first match
    pub fn find_path(&self, start: NodeId, path: &[&str]) -> Option<NodeId> {
        path.iter()
            .try_fold(start, |current, name| self.child_element(current, name))
    }

    /// Pre-order walk of the subtree rooted at `id`, `id` included
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let stack = if self.kind(id).is_some() {
            vec![id]
        } else {
            Vec::new()
        };
        Descendants { doc: self, stack }
    }

    /// `id` followed by its parent, grandparent and so on up to the root
    pub fn ancestors_or_self(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.kind(id).map(|_| id), move |&current| {
            self.parent(current)
        })
    }

    /// Concatenation of every text node below `id`, in document order
    pub fn text_content(&self, id: NodeId) -> String {
        self.descendants(id)
            .filter_map(|node| self.text(node))
            .collect()
    }

    /// Deep-copies `node` from `other` and appends the copy under `parent`
    pub fn import_subtree(&mut self, parent: NodeId, other: &Self, node: NodeId) -> Result<NodeId> {
        let copy = match other.kind(node) {
            Some(NodeKind::Element(element)) => {
                let copy = self.create_element(element.name())?;
                for (name, value) in element.attributes() {
                    self.set_attribute(copy, name.as_str(), value.as_str())?;
                }
                for &child in element.children() {
                    self.import_subtree(copy, other, child)?;
                }
                copy
            }
            Some(NodeKind::Text(text)) => self.create_text(text.as_str()),
            Some(NodeKind::Document { .. }) => {
                return Err(invalid_append("the document root cannot be a child"))
            }
            None => return Err(invalid_append(UNKNOWN_NODE)),
        };
        self.append_child(parent, copy)?;
        Ok(copy)
    }
}

/// Iterator returned by [`Document::descendants`]
#[derive(Debug)]
pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.doc.children(id).iter().rev().copied());
        Some(id)
    }
}

fn invalid_append(reason: &'static str) -> ParseError {
    ParseError::new(ErrorKind::InvalidAppend(reason))
}
