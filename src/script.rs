//! Scripted recordings: the user's clicks written down as JSON
//!
//! ```json
//! {
//!   "start_url": "https://example.org/search?q=rust",
//!   "search_input": {"id": "q"},
//!   "item": {"class": "result"},
//!   "annotations": [{"title": "Title", "target": {"class": "title"}}],
//!   "pager": {"id": "pager"},
//!   "page_limit": 3
//! }
//! ```

use crate::agent::{AgentOutcome, PageAgent, UserEvent};
use crate::dom::{DomTree, NodeId};
use crate::error::{RecorderError, Result};
use crate::protocol::{Panel, PanelMessage};
use crate::store::MarkerStore;
use crate::wizard::WizardStep;
use serde::{Deserialize, Serialize};
use url::Url;

/// An element addressed the way a user would describe it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    Id(String),
    /// Class signature, marker classes excluded
    Class(String),
}

impl Target {
    /// First matching element, searched inside `scope` when given
    pub fn resolve(&self, dom: &DomTree, scope: Option<NodeId>) -> Result<NodeId> {
        let found = match (self, scope) {
            (Target::Id(id), _) => dom.find_by_id(id),
            (Target::Class(signature), Some(scope)) => dom
                .descendants(scope)
                .find(|&node| dom.class_signature(node) == signature.trim()),
            (Target::Class(signature), None) => dom.find_by_class_signature(signature.trim()).first().copied(),
        };
        found.ok_or_else(|| RecorderError::NodeNotFound(format!("{:?}", self)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptedAnnotation {
    pub title: String,
    pub target: Target,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingScript {
    pub start_url: Url,
    pub search_input: Target,
    pub item: Target,
    #[serde(default)]
    pub annotations: Vec<ScriptedAnnotation>,
    /// Omitted for single-page recordings
    #[serde(default)]
    pub pager: Option<Target>,
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,
}

fn default_page_limit() -> u32 {
    1
}

impl RecordingScript {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Play the script on the first page, up to and including the page limit
    ///
    /// Returns whatever the agent asks for once collection started: usually
    /// a navigation or the exported artifacts.
    pub fn play<S: MarkerStore, P: Panel>(&self, agent: &mut PageAgent<S, P>, dom: &mut DomTree) -> Result<AgentOutcome> {
        agent.handle_message(dom, PanelMessage::RecordingStartStop)?;

        let input = self.search_input.resolve(dom, None)?;
        agent.handle_event(dom, UserEvent::Click { target: input })?;

        let item = self.item.resolve(dom, None)?;
        agent.handle_event(dom, UserEvent::Click { target: item })?;
        if agent.step() != WizardStep::Annotating {
            return Err(RecorderError::EmptySelector);
        }

        for annotation in &self.annotations {
            let target = annotation.target.resolve(dom, Some(item))?;
            if let AgentOutcome::PromptTitle(target) = agent.handle_event(dom, UserEvent::Click { target })? {
                agent.handle_event(
                    dom,
                    UserEvent::AnnotationTitled {
                        target,
                        title: Some(annotation.title.clone()),
                    },
                )?;
            }
        }
        agent.handle_message(dom, PanelMessage::AnnotationsDone)?;

        if agent.step() == WizardStep::AwaitingPagerSelection {
            let pager = self
                .pager
                .as_ref()
                .ok_or_else(|| RecorderError::NodeNotFound("pager target missing from script".to_string()))?
                .resolve(dom, None)?;
            agent.handle_event(dom, UserEvent::Click { target: pager })?;
        }

        agent.handle_message(
            dom,
            PanelMessage::StepGetData {
                total_pages: self.page_limit,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::ElementNode;

    fn page() -> DomTree {
        let item = |n: u32| {
            ElementNode::new("li")
                .with_class("result")
                .with_child(ElementNode::new("span").with_class("title").with_text(format!("Item {}", n)))
        };
        let root = ElementNode::new("body")
            .with_child(ElementNode::new("input").with_id("q"))
            .with_child(ElementNode::new("ul").with_child(item(1)).with_child(item(2)));
        DomTree::with_location(root, Url::parse("https://example.org/").unwrap())
    }

    #[test]
    fn test_script_json() {
        let script = RecordingScript::from_json(
            r#"{
                "start_url": "https://example.org/search",
                "search_input": {"id": "q"},
                "item": {"class": "result"},
                "annotations": [{"title": "Title", "target": {"class": "title"}}]
            }"#,
        )
        .unwrap();

        assert_eq!(script.item, Target::Class("result".to_string()));
        assert_eq!(script.page_limit, 1);
        assert!(script.pager.is_none());
    }

    #[test]
    fn test_resolve_scoped_class() {
        let dom = page();
        let second = dom.find_by_class_signature("result")[1];

        let title = Target::Class("title".to_string()).resolve(&dom, Some(second)).unwrap();
        assert_eq!(dom.inner_text(title), "Item 2");

        let input = Target::Id("q".to_string()).resolve(&dom, None).unwrap();
        assert_eq!(dom.node(input).unwrap().tag_name, "input");
    }

    #[test]
    fn test_resolve_missing() {
        let dom = page();
        let result = Target::Id("nope".to_string()).resolve(&dom, None);
        assert!(matches!(result, Err(RecorderError::NodeNotFound(_))));
    }
}
