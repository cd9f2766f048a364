use crate::dom::element::{BoundingBox, ElementNode};
use crate::dom::marker::{strip_markers, Marker};
use crate::dom::node_map::{NodeId, NodeMap};
use crate::error::{RecorderError, Result};
use headless_chrome::Tab;
use std::sync::Arc;
use url::Url;

/// Snapshot of a loaded page: the element tree plus the page location
#[derive(Debug, Clone)]
pub struct DomTree {
    /// Root element of the DOM tree (normally `body`)
    pub root: ElementNode,

    /// Document-order index over every element
    pub node_map: NodeMap,

    location: Url,
}

impl DomTree {
    /// Create a tree for a page at `about:blank`
    pub fn new(root: ElementNode) -> Self {
        let location = Url::parse("about:blank").expect("about:blank is a valid URL");
        Self::with_location(root, location)
    }

    /// Create a tree for a page loaded from `location`
    pub fn with_location(root: ElementNode, location: Url) -> Self {
        let mut tree = Self {
            root,
            node_map: NodeMap::new(),
            location,
        };
        tree.build_node_map();
        tree
    }

    /// Build DOM tree from a browser tab
    pub fn from_tab(tab: &Arc<Tab>) -> Result<Self> {
        let js_code = include_str!("extract_dom.js");

        let result = tab
            .evaluate(js_code, false)
            .map_err(|e| RecorderError::DomParseFailed(format!("Failed to execute DOM extraction script: {}", e)))?;

        let json_value = result
            .value
            .ok_or_else(|| RecorderError::DomParseFailed("No value returned from DOM extraction".to_string()))?;

        // The script returns a JSON string, so it is decoded twice
        let json_str: String = serde_json::from_value(json_value)
            .map_err(|e| RecorderError::DomParseFailed(format!("Failed to get JSON string: {}", e)))?;

        let mut root: ElementNode = serde_json::from_str(&json_str)
            .map_err(|e| RecorderError::DomParseFailed(format!("Failed to parse DOM JSON: {}", e)))?;
        root.simplify();

        let location = Url::parse(&tab.get_url())
            .map_err(|e| RecorderError::DomParseFailed(format!("Tab has no usable URL: {}", e)))?;

        Ok(Self::with_location(root, location))
    }

    fn build_node_map(&mut self) {
        self.node_map.clear();
        Self::index_static(&self.root, Vec::new(), None, &mut self.node_map);
    }

    fn index_static(node: &ElementNode, path: Vec<usize>, parent: Option<NodeId>, node_map: &mut NodeMap) {
        let id = node_map.register(path.clone(), parent);

        for (i, child) in node.children.iter().enumerate() {
            let mut child_path = path.clone();
            child_path.push(i);
            Self::index_static(child, child_path, Some(id), node_map);
        }

        node_map.close(id);
    }

    /// URL the snapshot was taken from
    pub fn location(&self) -> &Url {
        &self.location
    }

    /// Root element id
    pub fn root_id(&self) -> NodeId {
        NodeId(0)
    }

    /// Element by id
    pub fn node(&self, id: NodeId) -> Option<&ElementNode> {
        let entry = self.node_map.get(id)?;
        let mut node = &self.root;
        for &i in &entry.path {
            node = node.children.get(i)?;
        }
        Some(node)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut ElementNode> {
        let path = self.node_map.get(id)?.path.clone();
        let mut node = &mut self.root;
        for i in path {
            node = node.children.get_mut(i)?;
        }
        Some(node)
    }

    /// Element by id, failing with `NodeNotFound`
    pub fn require(&self, id: NodeId) -> Result<&ElementNode> {
        self.node(id)
            .ok_or_else(|| RecorderError::NodeNotFound(format!("No element {} in page snapshot", id)))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node_map.get(id)?.parent
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.node_map.get(id)?.children.first().copied()
    }

    /// Descendants of `id` in document order
    pub fn descendants(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.node_map.descendants(id)
    }

    /// Anchor descendants of `id` in document order
    pub fn links_within(&self, id: NodeId) -> Vec<NodeId> {
        self.descendants(id)
            .filter(|&d| self.node(d).is_some_and(|n| n.is_tag("a")))
            .collect()
    }

    /// First element in document order whose id attribute equals `element_id`
    pub fn find_by_id(&self, element_id: &str) -> Option<NodeId> {
        if element_id.is_empty() {
            return None;
        }
        self.node_map
            .ids()
            .find(|&id| self.node(id).is_some_and(|n| n.id() == element_id))
    }

    /// Every element whose marker-free class signature equals `signature`
    pub fn find_by_class_signature(&self, signature: &str) -> Vec<NodeId> {
        if signature.is_empty() {
            return Vec::new();
        }
        self.node_map
            .ids()
            .filter(|&id| self.class_signature(id) == signature)
            .collect()
    }

    /// Class attribute of `id` with recorder markers removed
    pub fn class_signature(&self, id: NodeId) -> String {
        self.node(id).map(|n| strip_markers(n.class_attr())).unwrap_or_default()
    }

    pub fn inner_text(&self, id: NodeId) -> String {
        self.node(id).map(ElementNode::inner_text).unwrap_or_default()
    }

    pub fn attribute(&self, id: NodeId, key: &str) -> Option<&str> {
        self.node(id)?.get_attribute(key).map(String::as_str)
    }

    pub fn bounding_box(&self, id: NodeId) -> Option<BoundingBox> {
        self.node(id)?.bounding_box
    }

    /// Paint a marker. Returns false when already painted.
    pub fn add_marker(&mut self, id: NodeId, marker: Marker) -> bool {
        self.node_mut(id).is_some_and(|n| n.add_class(marker.class_name()))
    }

    pub fn remove_marker(&mut self, id: NodeId, marker: Marker) -> bool {
        self.node_mut(id).is_some_and(|n| n.remove_class(marker.class_name()))
    }

    pub fn has_marker(&self, id: NodeId, marker: Marker) -> bool {
        self.node(id).is_some_and(|n| n.has_class(marker.class_name()))
    }

    /// Elements currently carrying `marker`, in document order
    pub fn marked(&self, marker: Marker) -> Vec<NodeId> {
        self.node_map
            .ids()
            .filter(|&id| self.has_marker(id, marker))
            .collect()
    }

    /// Remove `marker` from every element on the page
    pub fn clear_marker(&mut self, marker: Marker) {
        for id in self.marked(marker) {
            self.remove_marker(id, marker);
        }
    }

    /// Remove every recorder marker from the page
    pub fn clear_all_markers(&mut self) {
        for marker in Marker::ALL {
            self.clear_marker(marker);
        }
    }

    /// Resolve the element's href against the page location
    ///
    /// Returns `None` for elements without an href and for hrefs that
    /// cannot be resolved to an absolute URL.
    pub fn resolve_href(&self, id: NodeId) -> Option<Url> {
        let href = self.attribute(id, "href")?.trim();
        match self.location.join(href) {
            Ok(url) => Some(url),
            Err(e) => {
                log::debug!("Unresolvable href '{}' on {}: {}", href, id, e);
                None
            }
        }
    }

    /// Count total elements in the tree
    pub fn count_elements(&self) -> usize {
        self.node_map.len()
    }

    /// Convert the element tree to JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.root)?)
    }
}
