use crate::dom::{DomTree, Marker, NodeId};
use crate::error::{RecorderError, Result};
use crate::session::SelectorKey;

/// Derive a reapplicable selector key from a clicked element
///
/// Marker classes are stripped before the signature is taken. Fails with
/// `EmptySelector` when neither an id nor a class signature remains.
pub fn derive_selector_key(dom: &DomTree, node: NodeId) -> Result<SelectorKey> {
    let element = dom.require(node)?;
    let key = SelectorKey::new(element.id(), dom.class_signature(node));

    if key.is_empty() {
        log::debug!("No usable signature on {}", element.to_simple_string());
        return Err(RecorderError::EmptySelector);
    }

    Ok(key)
}

/// Elements on the page matched by `key`, in document order
///
/// An id matches at most one element and never falls back to the class
/// signature.
pub fn matching_nodes(dom: &DomTree, key: &SelectorKey) -> Vec<NodeId> {
    if !key.id.is_empty() {
        return dom.find_by_id(&key.id).into_iter().collect();
    }
    dom.find_by_class_signature(&key.class_signature)
}

/// Mark every element matched by `key` as selected and return the match set
///
/// Elements that already carry the selected marker are left untouched.
pub fn apply_selector(dom: &mut DomTree, key: &SelectorKey) -> Result<Vec<NodeId>> {
    if key.is_empty() {
        return Err(RecorderError::EmptySelector);
    }

    let nodes = matching_nodes(dom, key);
    let mut newly_marked = 0;
    for &node in &nodes {
        if dom.has_marker(node, Marker::Selected) {
            continue;
        }
        if dom.add_marker(node, Marker::Selected) {
            newly_marked += 1;
        }
    }

    log::debug!(
        "Selector {:?}/{:?} matched {} element(s), {} newly marked",
        key.id,
        key.class_signature,
        nodes.len(),
        newly_marked
    );
    Ok(nodes)
}
