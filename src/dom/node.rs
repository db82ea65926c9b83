use indexmap::IndexMap;

/// Handle to a node stored in a [`Document`](super::Document)
///
/// Handles are only meaningful for the document that created them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Position of the node in its document's arena
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Ordered attribute map; re-inserting a name keeps its original position
pub type Attributes = IndexMap<String, String>;

/// The closed set of node variants
#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    /// Root of a tree, owns the top-level elements
    Document { children: Vec<NodeId> },
    /// Named element with attributes and ordered children
    Element(Element),
    /// Leaf text payload
    Text(String),
}

/// Element payload
#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    name: String,
    pub(crate) attributes: Attributes,
    pub(crate) children: Vec<NodeId>,
}

impl Element {
    pub(crate) fn new(name: String) -> Self {
        Self {
            name,
            attributes: Attributes::new(),
            children: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

impl NodeKind {
    /// Child handles, empty for text nodes
    pub fn children(&self) -> &[NodeId] {
        match self {
            Self::Document { children } => children,
            Self::Element(element) => &element.children,
            Self::Text(_) => &[],
        }
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut Vec<NodeId>> {
        match self {
            Self::Document { children } => Some(children),
            Self::Element(element) => Some(&mut element.children),
            Self::Text(_) => None,
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_document(&self) -> bool {
        matches!(self, Self::Document { .. })
    }
}

/// Arena slot: the node payload plus its parent link
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct NodeData {
    pub(crate) parent: Option<NodeId>,
    pub(crate) kind: NodeKind,
}
