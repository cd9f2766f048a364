use crate::dom::{DomTree, Marker, NodeId};
use crate::engine::selection::derive_selector_key;
use crate::error::{RecorderError, Result};
use crate::session::{AnnotationRule, Record, Session};

/// Knobs for field extraction
#[derive(Debug, Clone, Copy)]
pub struct ExtractOptions {
    /// A matched annotation element that is itself a link contributes its URL
    /// ahead of the record's other links. When off, such links are left out.
    pub annotated_links: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self { annotated_links: true }
    }
}

/// Attach a titled rule to the element the user clicked
///
/// Blank titles are rejected with `EmptyTitle` and leave the session
/// untouched. The same element may be annotated again under another title.
pub fn add_annotation<'s>(
    session: &'s mut Session,
    dom: &mut DomTree,
    title: &str,
    target: NodeId,
) -> Result<&'s AnnotationRule> {
    let title = title.trim();
    if title.is_empty() {
        return Err(RecorderError::EmptyTitle);
    }
    if session.selector_key.is_none() {
        return Err(RecorderError::SelectionRequired);
    }

    let selector_key = derive_selector_key(dom, target)?;
    dom.add_marker(target, Marker::Annotated);

    log::info!("Annotated {:?} as '{}'", selector_key, title);
    session.push_rule(AnnotationRule {
        title: title.to_string(),
        selector_key,
    })
}

/// Pull one record out of a result item
///
/// Each rule is looked up among the descendants of `record_root` only. A
/// rule with no match leaves its field absent. Rules are applied in order,
/// so of two rules sharing a title the later one wins. Every link inside the
/// item is collected as well, skipping `javascript:` URLs.
pub fn extract_fields(dom: &DomTree, record_root: NodeId, rules: &[AnnotationRule], options: ExtractOptions) -> Record {
    let mut record = Record::new();

    let mut matched = Vec::with_capacity(rules.len());

    for rule in rules {
        let found = dom
            .descendants(record_root)
            .find(|&node| rule.selector_key.matches(dom, node));

        let Some(node) = found else {
            log::debug!("No match for '{}' under {}", rule.title, record_root);
            continue;
        };

        record.fields.insert(rule.title.clone(), dom.inner_text(node));
        matched.push(node);

        if options.annotated_links && dom.node(node).is_some_and(|n| n.is_link()) {
            if let Some(url) = dom.resolve_href(node) {
                if url.scheme() != "javascript" {
                    record.add_link(url.to_string());
                }
            }
        }
    }

    for link in dom.links_within(record_root) {
        if !options.annotated_links && matched.contains(&link) {
            continue;
        }
        let Some(url) = dom.resolve_href(link) else {
            continue;
        };
        if url.scheme() == "javascript" {
            continue;
        }
        record.add_link(url.to_string());
    }

    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::ElementNode;
    use crate::session::{Environment, SelectorKey};
    use url::Url;

    fn item(name: &str, href: &str) -> ElementNode {
        ElementNode::new("div")
            .with_class("result")
            .with_child(
                ElementNode::new("a")
                    .with_class("title")
                    .with_attribute("href", href)
                    .with_text(name),
            )
            .with_child(ElementNode::new("span").with_class("year").with_text("2021"))
            .with_child(ElementNode::new("a").with_attribute("href", "javascript:void(0)").with_text("save"))
            .with_child(ElementNode::new("a").with_attribute("href", href).with_text("more"))
    }

    fn page() -> DomTree {
        let root = ElementNode::new("body")
            .with_child(ElementNode::new("span").with_class("year").with_text("1999"))
            .with_child(item("Item A", "/items/a"))
            .with_child(ElementNode::new("div").with_class("result"));
        DomTree::with_location(root, Url::parse("https://example.org/list").unwrap())
    }

    fn session() -> Session {
        let mut session = Session::new("https://example.org/list", Environment::default());
        session.selector_key = Some(SelectorKey::by_class("result"));
        session
    }

    fn rules() -> Vec<AnnotationRule> {
        vec![
            AnnotationRule {
                title: "title".to_string(),
                selector_key: SelectorKey::by_class("title"),
            },
            AnnotationRule {
                title: "year".to_string(),
                selector_key: SelectorKey::by_class("year"),
            },
        ]
    }

    #[test]
    fn test_add_annotation_records_rule_and_marks_target() {
        let mut dom = page();
        let mut session = session();
        let target = dom.find_by_class_signature("title")[0];

        let rule = add_annotation(&mut session, &mut dom, "  title ", target).unwrap();
        assert_eq!(rule.title, "title");
        assert_eq!(rule.selector_key, SelectorKey::by_class("title"));
        assert!(dom.has_marker(target, Marker::Annotated));
        assert_eq!(dom.class_signature(target), "title");
    }

    #[test]
    fn test_add_annotation_rejects_blank_title() {
        let mut dom = page();
        let mut session = session();
        let target = dom.find_by_class_signature("title")[0];

        assert!(matches!(
            add_annotation(&mut session, &mut dom, "   ", target),
            Err(RecorderError::EmptyTitle)
        ));
        assert!(session.annotations.is_empty());
        assert!(!dom.has_marker(target, Marker::Annotated));
    }

    #[test]
    fn test_add_annotation_twice_on_same_node() {
        let mut dom = page();
        let mut session = session();
        let target = dom.find_by_class_signature("title")[0];

        add_annotation(&mut session, &mut dom, "title", target).unwrap();
        add_annotation(&mut session, &mut dom, "heading", target).unwrap();

        assert_eq!(session.annotations.len(), 2);
        assert_eq!(session.annotations[0].selector_key, session.annotations[1].selector_key);
    }

    #[test]
    fn test_add_annotation_requires_item_selection() {
        let mut dom = page();
        let mut session = Session::new("https://example.org/list", Environment::default());
        let target = dom.find_by_class_signature("title")[0];

        assert!(matches!(
            add_annotation(&mut session, &mut dom, "title", target),
            Err(RecorderError::SelectionRequired)
        ));
    }

    #[test]
    fn test_extract_fields_descendant_scope() {
        let dom = page();
        let root = dom.find_by_class_signature("result")[0];
        let record = extract_fields(&dom, root, &rules(), ExtractOptions::default());

        assert_eq!(record.field("title"), Some("Item A"));
        // The page-level "1999" span sits outside the item
        assert_eq!(record.field("year"), Some("2021"));
    }

    #[test]
    fn test_extract_fields_links() {
        let dom = page();
        let root = dom.find_by_class_signature("result")[0];
        let record = extract_fields(&dom, root, &rules(), ExtractOptions::default());

        let links: Vec<_> = record.links.iter().cloned().collect();
        assert_eq!(links, vec!["https://example.org/items/a".to_string()]);
    }

    #[test]
    fn test_extract_fields_missing_match_is_absent() {
        let dom = page();
        let empty_item = dom.find_by_class_signature("result")[1];
        let record = extract_fields(&dom, empty_item, &rules(), ExtractOptions::default());

        assert!(record.fields.is_empty());
        assert!(record.links.is_empty());
    }

    #[test]
    fn test_duplicate_titles_last_rule_wins() {
        let dom = page();
        let root = dom.find_by_class_signature("result")[0];
        let mut rules = rules();
        rules.push(AnnotationRule {
            title: "title".to_string(),
            selector_key: SelectorKey::by_class("year"),
        });

        let record = extract_fields(&dom, root, &rules, ExtractOptions::default());
        assert_eq!(record.field("title"), Some("2021"));
        assert_eq!(record.fields.get_index(0).unwrap().0, "title");
    }

    #[test]
    fn test_annotated_links_flag_excludes_matched_link() {
        let root = ElementNode::new("body").with_child(
            ElementNode::new("div")
                .with_class("result")
                .with_child(ElementNode::new("a").with_attribute("href", "/other").with_text("other"))
                .with_child(ElementNode::new("a").with_class("title").with_attribute("href", "/main").with_text("Main")),
        );
        let dom = DomTree::with_location(root, Url::parse("https://example.org/").unwrap());
        let item = dom.find_by_class_signature("result")[0];

        let with = extract_fields(&dom, item, &rules()[..1], ExtractOptions { annotated_links: true });
        assert_eq!(with.links.get_index(0).map(String::as_str), Some("https://example.org/main"));

        let without = extract_fields(&dom, item, &rules()[..1], ExtractOptions { annotated_links: false });
        assert_eq!(without.links.iter().map(String::as_str).collect::<Vec<_>>(), ["https://example.org/other"]);
        assert_eq!(without.field("title"), Some("Main"));
    }

    #[test]
    fn test_extract_is_deterministic() {
        let dom = page();
        let root = dom.find_by_class_signature("result")[0];
        let a = extract_fields(&dom, root, &rules(), ExtractOptions::default());
        let b = extract_fields(&dom, root, &rules(), ExtractOptions::default());
        assert_eq!(a, b);
    }
}
