use crate::dom::{Document, NodeId, NodeKind};

/// Structural equality of two subtrees, possibly from different documents
///
/// Tag names, attribute sets, text payloads and child order must match.
/// Arena positions and attribute order are ignored.
pub fn trees_equal(left: &Document, l_node: NodeId, right: &Document, r_node: NodeId) -> bool {
    match (left.kind(l_node), right.kind(r_node)) {
        (
            Some(NodeKind::Document { children: l_kids }),
            Some(NodeKind::Document { children: r_kids }),
        ) => children_equal(left, l_kids, right, r_kids),
        (Some(NodeKind::Element(l_el)), Some(NodeKind::Element(r_el))) => {
            if l_el.name() != r_el.name() || l_el.attributes().len() != r_el.attributes().len() {
                return false;
            }
            l_el.attributes()
                .iter()
                .all(|(k, v)| r_el.attributes().get(k).is_some_and(|r_v| v == r_v))
                && children_equal(left, l_el.children(), right, r_el.children())
        }
        (Some(NodeKind::Text(l)), Some(NodeKind::Text(r))) => l == r,
        _ => false,
    }
}

/// Compares two whole documents from their roots
pub fn documents_equal(left: &Document, right: &Document) -> bool {
    trees_equal(left, left.root(), right, right.root())
}

fn children_equal(
    left: &Document,
    l_kids: &[NodeId],
    right: &Document,
    r_kids: &[NodeId],
) -> bool {
    l_kids.len() == r_kids.len()
        && l_kids
            .iter()
            .zip(r_kids.iter())
            .all(|(&l, &r)| trees_equal(left, l, right, r))
}
