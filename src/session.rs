//! The persisted recording session and its value types

use crate::dom::{DomTree, NodeId};
use crate::error::{RecorderError, Result};
use chrono::{DateTime, Utc};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// Reapplicable signature identifying a class of page elements
///
/// An id, when present, always wins over the class signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SelectorKey {
    pub id: String,
    pub class_signature: String,
}

impl SelectorKey {
    pub fn new(id: impl Into<String>, class_signature: impl Into<String>) -> Self {
        Self {
            id: id.into().trim().to_string(),
            class_signature: class_signature.into().trim().to_string(),
        }
    }

    pub fn by_id(id: impl Into<String>) -> Self {
        Self::new(id, "")
    }

    pub fn by_class(class_signature: impl Into<String>) -> Self {
        Self::new("", class_signature)
    }

    /// A key with neither id nor class signature cannot select anything
    pub fn is_empty(&self) -> bool {
        self.id.is_empty() && self.class_signature.is_empty()
    }

    /// Whether `node` is matched by this key
    pub fn matches(&self, dom: &DomTree, node: NodeId) -> bool {
        if !self.id.is_empty() {
            return dom.node(node).is_some_and(|n| n.id() == self.id);
        }
        !self.class_signature.is_empty() && dom.class_signature(node) == self.class_signature
    }
}

/// A user-labelled rule pulling one field out of every record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationRule {
    pub title: String,
    pub selector_key: SelectorKey,
}

/// One extracted result item
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Record {
    /// Field values keyed by annotation title
    pub fields: IndexMap<String, String>,

    /// Absolute URLs found inside the item, first occurrence order
    pub links: IndexSet<String>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(&self, title: &str) -> Option<&str> {
        self.fields.get(title).map(String::as_str)
    }

    /// Returns false when the link was already present
    pub fn add_link(&mut self, link: impl Into<String>) -> bool {
        self.links.insert(link.into())
    }
}

/// Where a recording was made, reported in the export summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub os_name: String,
    pub browser_name: String,
    pub browser_version: String,
}

impl Environment {
    /// Describe the current machine and the given browser
    pub fn detect(browser_name: impl Into<String>, browser_version: impl Into<String>) -> Self {
        let os_name = match std::env::consts::OS {
            "windows" => "Windows",
            "macos" => "MacOS",
            "linux" => "Linux",
            other => other,
        };
        Self {
            os_name: os_name.to_string(),
            browser_name: browser_name.into(),
            browser_version: browser_version.into(),
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::detect("unknown", "unknown")
    }
}

/// State of one in-progress recording
///
/// Everything the page agent needs after a reload lives here, so resuming
/// is a single load from the marker store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub search_term: String,

    /// Selector for the repeating result item
    pub selector_key: Option<SelectorKey>,

    pub pager_key: Option<SelectorKey>,

    pub annotations: Vec<AnnotationRule>,

    pub current_page: u32,

    pub total_page_limit: u32,

    /// Path and query of the page the walker navigated to
    pub pending_navigation_target: Option<String>,

    records: Vec<Record>,

    pub source_url: String,

    pub started_at: DateTime<Utc>,

    pub environment: Environment,
}

impl Session {
    pub fn new(source_url: impl Into<String>, environment: Environment) -> Self {
        Self {
            search_term: String::new(),
            selector_key: None,
            pager_key: None,
            annotations: Vec::new(),
            current_page: 1,
            total_page_limit: 1,
            pending_navigation_target: None,
            records: Vec::new(),
            source_url: source_url.into(),
            started_at: Utc::now(),
            environment,
        }
    }

    /// Append a rule. The item selector must already be chosen.
    pub fn push_rule(&mut self, rule: AnnotationRule) -> Result<&AnnotationRule> {
        if self.selector_key.is_none() {
            return Err(RecorderError::SelectionRequired);
        }
        self.annotations.push(rule);
        Ok(&self.annotations[self.annotations.len() - 1])
    }

    pub fn set_page_limit(&mut self, limit: u32) -> Result<()> {
        if limit == 0 {
            return Err(RecorderError::InvalidPageLimit(limit));
        }
        self.total_page_limit = limit;
        Ok(())
    }

    /// Records are append-only for the life of the session
    pub fn append_records(&mut self, records: impl IntoIterator<Item = Record>) {
        self.records.extend(records);
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub(crate) fn restore_records(&mut self, records: Vec<Record>) {
        self.records = records;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::ElementNode;

    #[test]
    fn test_selector_key_trims_and_detects_empty() {
        let key = SelectorKey::new("  ", "  result item ");
        assert_eq!(key.id, "");
        assert_eq!(key.class_signature, "result item");
        assert!(!key.is_empty());
        assert!(SelectorKey::new(" ", "").is_empty());
    }

    #[test]
    fn test_selector_key_prefers_id() {
        let root = ElementNode::new("body")
            .with_child(ElementNode::new("div").with_id("main").with_class("box"))
            .with_child(ElementNode::new("div").with_class("box"));
        let dom = DomTree::new(root);

        let key = SelectorKey::new("main", "box");
        assert!(key.matches(&dom, NodeId(1)));
        assert!(!key.matches(&dom, NodeId(2)));

        let class_key = SelectorKey::by_class("box");
        assert!(class_key.matches(&dom, NodeId(1)));
        assert!(class_key.matches(&dom, NodeId(2)));
        assert!(!SelectorKey::default().matches(&dom, NodeId(0)));
    }

    #[test]
    fn test_push_rule_requires_selection() {
        let mut session = Session::new("https://example.org/", Environment::default());
        let rule = AnnotationRule {
            title: "title".to_string(),
            selector_key: SelectorKey::by_class("name"),
        };

        assert!(matches!(session.push_rule(rule.clone()), Err(RecorderError::SelectionRequired)));

        session.selector_key = Some(SelectorKey::by_class("result"));
        assert_eq!(session.push_rule(rule).unwrap().title, "title");
        assert_eq!(session.annotations.len(), 1);
    }

    #[test]
    fn test_page_limit_must_be_positive() {
        let mut session = Session::new("https://example.org/", Environment::default());
        assert!(matches!(session.set_page_limit(0), Err(RecorderError::InvalidPageLimit(0))));
        session.set_page_limit(4).unwrap();
        assert_eq!(session.total_page_limit, 4);
    }

    #[test]
    fn test_record_links_are_deduplicated() {
        let mut record = Record::new();
        assert!(record.add_link("https://example.org/a"));
        assert!(!record.add_link("https://example.org/a"));
        assert!(record.add_link("https://example.org/b"));
        assert_eq!(record.links.len(), 2);
    }

    #[test]
    fn test_environment_detect() {
        let env = Environment::detect("Chrome", "120.0");
        assert!(!env.os_name.is_empty());
        assert_eq!(env.browser_name, "Chrome");
    }
}
