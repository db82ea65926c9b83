//! In-memory document tree
//!
//! A [`Document`] owns every node in an arena. Nodes are one of three
//! variants ([`NodeKind`]): the document root, elements carrying a tag name,
//! ordered attributes and ordered children, and text leaves.

mod document;
mod node;

pub use document::{Descendants, Document};
pub use node::{Attributes, Element, NodeId, NodeKind};
