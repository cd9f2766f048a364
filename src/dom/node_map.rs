use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Document-order index of an element within one page snapshot
///
/// Ids are only meaningful for the snapshot that produced them. A reload
/// yields a fresh snapshot, so anything that must survive navigation is
/// stored as a selector key instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Location of one element in the tree
#[derive(Debug, Clone, PartialEq)]
pub struct NodeEntry {
    /// Child indices from the root down to this element
    pub path: Vec<usize>,

    pub parent: Option<NodeId>,

    pub children: Vec<NodeId>,

    /// One past the last descendant; descendants occupy `id + 1 .. end`
    pub end: usize,
}

/// Map of node ids to their position in the element tree
/// Uses IndexMap to preserve document order
#[derive(Debug, Clone, Default)]
pub struct NodeMap {
    map: IndexMap<NodeId, NodeEntry>,
}

impl NodeMap {
    /// Create a new empty NodeMap
    pub fn new() -> Self {
        Self { map: IndexMap::new() }
    }

    /// Register a new element and return its id
    pub fn register(&mut self, path: Vec<usize>, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.map.len());
        self.map.insert(
            id,
            NodeEntry {
                path,
                parent,
                children: Vec::new(),
                end: id.0 + 1,
            },
        );
        if let Some(parent) = parent {
            if let Some(entry) = self.map.get_mut(&parent) {
                entry.children.push(id);
            }
        }
        id
    }

    /// Close a node once all of its descendants are registered
    pub fn close(&mut self, id: NodeId) {
        let end = self.map.len();
        if let Some(entry) = self.map.get_mut(&id) {
            entry.end = end;
        }
    }

    pub fn get(&self, id: NodeId) -> Option<&NodeEntry> {
        self.map.get(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.map.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// All ids in document order
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.map.keys().copied()
    }

    /// Descendant ids of `id` in document order, excluding `id` itself
    pub fn descendants(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let range = match self.map.get(&id) {
            Some(entry) => id.0 + 1..entry.end,
            None => 0..0,
        };
        range.map(NodeId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // body > (ul > (li, li), footer)
    fn sample_map() -> NodeMap {
        let mut map = NodeMap::new();
        let body = map.register(vec![], None);
        let ul = map.register(vec![0], Some(body));
        let li1 = map.register(vec![0, 0], Some(ul));
        map.close(li1);
        let li2 = map.register(vec![0, 1], Some(ul));
        map.close(li2);
        map.close(ul);
        let footer = map.register(vec![1], Some(body));
        map.close(footer);
        map.close(body);
        map
    }

    #[test]
    fn test_register_assigns_document_order() {
        let map = sample_map();
        let ids: Vec<_> = map.ids().map(|id| id.0).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
        assert_eq!(map.get(NodeId(3)).unwrap().path, vec![0, 1]);
    }

    #[test]
    fn test_parent_and_children() {
        let map = sample_map();
        assert_eq!(map.get(NodeId(2)).unwrap().parent, Some(NodeId(1)));
        assert_eq!(map.get(NodeId(1)).unwrap().children, vec![NodeId(2), NodeId(3)]);
        assert_eq!(map.get(NodeId(0)).unwrap().parent, None);
    }

    #[test]
    fn test_descendants_are_contiguous() {
        let map = sample_map();
        let under_ul: Vec<_> = map.descendants(NodeId(1)).collect();
        assert_eq!(under_ul, vec![NodeId(2), NodeId(3)]);

        let under_body: Vec<_> = map.descendants(NodeId(0)).collect();
        assert_eq!(under_body.len(), 4);

        assert_eq!(map.descendants(NodeId(4)).count(), 0);
        assert_eq!(map.descendants(NodeId(99)).count(), 0);
    }

    #[test]
    fn test_clear() {
        let mut map = sample_map();
        assert_eq!(map.len(), 5);
        map.clear();
        assert!(map.is_empty());
        assert!(!map.contains(NodeId(0)));
    }
}
