use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Represents a DOM element node in a page snapshot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ElementNode {
    /// HTML tag name (e.g., "div", "a", "input")
    pub tag_name: String,

    /// Element attributes (e.g., id, class, href, value)
    #[serde(default)]
    pub attributes: HashMap<String, String>,

    /// The element's own text, excluding text of child elements
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,

    /// Child elements in document order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ElementNode>,

    /// Whether the element is rendered
    #[serde(default)]
    pub is_visible: bool,

    /// Bounding box information (x, y, width, height)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,
}

/// Bounding box coordinates for an element
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ElementNode {
    /// Create a new ElementNode
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            attributes: HashMap::new(),
            text_content: None,
            children: Vec::new(),
            is_visible: true,
            bounding_box: None,
        }
    }

    /// Builder method: set attributes
    pub fn with_attributes(mut self, attributes: HashMap<String, String>) -> Self {
        self.attributes = attributes;
        self
    }

    /// Builder method: set a single attribute
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.add_attribute(key, value);
        self
    }

    /// Builder method: set id
    pub fn with_id(self, id: impl Into<String>) -> Self {
        self.with_attribute("id", id)
    }

    /// Builder method: set class attribute
    pub fn with_class(self, class: impl Into<String>) -> Self {
        self.with_attribute("class", class)
    }

    /// Builder method: set text content
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text_content = Some(text.into());
        self
    }

    /// Builder method: set children
    pub fn with_children(mut self, children: Vec<ElementNode>) -> Self {
        self.children = children;
        self
    }

    /// Builder method: append one child
    pub fn with_child(mut self, child: ElementNode) -> Self {
        self.children.push(child);
        self
    }

    /// Builder method: set visibility
    pub fn with_visibility(mut self, visible: bool) -> Self {
        self.is_visible = visible;
        self
    }

    /// Builder method: set bounding box
    pub fn with_bounding_box(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.bounding_box = Some(BoundingBox { x, y, width, height });
        self
    }

    /// Add a single attribute
    pub fn add_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// Add a child element
    pub fn add_child(&mut self, child: ElementNode) {
        self.children.push(child);
    }

    /// Get attribute value by key
    pub fn get_attribute(&self, key: &str) -> Option<&String> {
        self.attributes.get(key)
    }

    /// Element id, empty when absent
    pub fn id(&self) -> &str {
        self.attributes.get("id").map(String::as_str).unwrap_or("")
    }

    /// Raw class attribute, empty when absent
    pub fn class_attr(&self) -> &str {
        self.attributes.get("class").map(String::as_str).unwrap_or("")
    }

    /// Check if element has a specific class
    pub fn has_class(&self, class_name: &str) -> bool {
        self.class_attr().split_whitespace().any(|c| c == class_name)
    }

    /// Add a class token. Returns false when it was already present.
    pub fn add_class(&mut self, class_name: &str) -> bool {
        if self.has_class(class_name) {
            return false;
        }

        let class = match self.attributes.get("class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {}", existing.trim(), class_name),
            _ => class_name.to_string(),
        };
        self.attributes.insert("class".to_string(), class);
        true
    }

    /// Remove a class token. Returns false when it was not present.
    pub fn remove_class(&mut self, class_name: &str) -> bool {
        if !self.has_class(class_name) {
            return false;
        }

        let remaining = self
            .class_attr()
            .split_whitespace()
            .filter(|c| *c != class_name)
            .collect::<Vec<_>>()
            .join(" ");
        self.attributes.insert("class".to_string(), remaining);
        true
    }

    /// Check if element is a specific tag
    pub fn is_tag(&self, tag: &str) -> bool {
        self.tag_name.eq_ignore_ascii_case(tag)
    }

    /// Anchor element carrying an href
    pub fn is_link(&self) -> bool {
        self.is_tag("a") && self.attributes.contains_key("href")
    }

    /// Rendered text of the element and all of its descendants
    pub fn inner_text(&self) -> String {
        let mut parts = Vec::new();
        self.collect_text(&mut parts);
        parts.join(" ")
    }

    fn collect_text<'a>(&'a self, parts: &mut Vec<&'a str>) {
        if let Some(text) = &self.text_content {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                parts.push(trimmed);
            }
        }
        for child in &self.children {
            child.collect_text(parts);
        }
    }

    /// Simplify element by removing unnecessary children (like scripts, styles)
    pub fn simplify(&mut self) {
        self.children.retain(|child| {
            !matches!(child.tag_name.as_str(), "script" | "style" | "noscript")
        });

        for child in &mut self.children {
            child.simplify();
        }
    }

    /// Short one-line rendering used in log output
    pub fn to_simple_string(&self) -> String {
        let mut out = format!("<{}", self.tag_name);

        if !self.id().is_empty() {
            out.push_str(&format!(" id=\"{}\"", self.id()));
        }

        if !self.class_attr().is_empty() {
            out.push_str(&format!(" class=\"{}\"", self.class_attr()));
        }

        out.push('>');

        if let Some(text) = &self.text_content {
            let text = text.trim();
            if !text.is_empty() {
                out.push_str(&text.chars().take(40).collect::<String>());
            }
        }

        out
    }
}

impl BoundingBox {
    /// Create a new BoundingBox
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Check if the bounding box is visible (has non-zero dimensions)
    pub fn is_visible(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_node_creation() {
        let element = ElementNode::new("a")
            .with_id("first")
            .with_class("result title")
            .with_attribute("href", "/item/1")
            .with_text("Item A");

        assert_eq!(element.tag_name, "a");
        assert_eq!(element.id(), "first");
        assert_eq!(element.class_attr(), "result title");
        assert!(element.is_link());
        assert!(element.is_visible);
    }

    #[test]
    fn test_missing_id_and_class_are_empty() {
        let element = ElementNode::new("div");
        assert_eq!(element.id(), "");
        assert_eq!(element.class_attr(), "");
        assert!(!element.is_link());
    }

    #[test]
    fn test_add_and_remove_class() {
        let mut element = ElementNode::new("div").with_class("result");

        assert!(element.add_class("glr_selected"));
        assert!(!element.add_class("glr_selected"));
        assert_eq!(element.class_attr(), "result glr_selected");

        assert!(element.remove_class("glr_selected"));
        assert!(!element.remove_class("glr_selected"));
        assert_eq!(element.class_attr(), "result");
    }

    #[test]
    fn test_add_class_without_existing_attribute() {
        let mut element = ElementNode::new("li");
        element.add_class("glr_hovered");
        assert_eq!(element.class_attr(), "glr_hovered");
    }

    #[test]
    fn test_inner_text_concatenates_descendants() {
        let element = ElementNode::new("div")
            .with_text("  Price: ")
            .with_child(ElementNode::new("span").with_text("12"))
            .with_child(ElementNode::new("span").with_text("EUR\n"));

        assert_eq!(element.inner_text(), "Price: 12 EUR");
    }

    #[test]
    fn test_simplify() {
        let mut parent = ElementNode::new("div")
            .with_child(ElementNode::new("p").with_text("Content"))
            .with_child(ElementNode::new("script").with_text("alert('test')"))
            .with_child(ElementNode::new("span").with_text("More content"));

        parent.simplify();

        assert_eq!(parent.children.len(), 2);
        assert!(parent.children[0].is_tag("p"));
        assert!(parent.children[1].is_tag("span"));
    }

    #[test]
    fn test_deserialize_extraction_payload() {
        let json = r#"{
            "tag_name": "ul",
            "attributes": {"class": "results"},
            "children": [{"tag_name": "li", "text_content": "one", "is_visible": true}]
        }"#;

        let node: ElementNode = serde_json::from_str(json).unwrap();
        assert_eq!(node.class_attr(), "results");
        assert_eq!(node.children[0].inner_text(), "one");
        assert!(!node.is_visible);
    }

    #[test]
    fn test_to_simple_string() {
        let element = ElementNode::new("li").with_id("r1").with_class("result").with_text("Item A");
        let simple = element.to_simple_string();
        assert!(simple.starts_with("<li"));
        assert!(simple.contains("id=\"r1\""));
        assert!(simple.contains("class=\"result\""));
        assert!(simple.contains("Item A"));
    }

    #[test]
    fn test_bounding_box() {
        assert!(BoundingBox::new(10.0, 20.0, 100.0, 50.0).is_visible());
        assert!(!BoundingBox::new(0.0, 0.0, 0.0, 0.0).is_visible());
    }
}
