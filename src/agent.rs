//! The in-page agent: one instance per loaded page
//!
//! A navigation destroys the agent. The next page load creates a new one,
//! which picks the session back up from the marker store when the panel
//! reports `RECORDING_CONTINUE`.

use crate::config::RecorderConfig;
use crate::dom::{DomTree, Marker, NodeId};
use crate::engine::{
    add_annotation, apply_selector, derive_selector_key, designate_pager, extract_fields, next_page_url,
    path_and_query, rebind_pager, resume_if_target_reached, PagerDesignation,
};
use crate::error::{RecorderError, Result};
use crate::export::{export_session, Artifact};
use crate::protocol::{AgentMessage, Panel, PanelMessage};
use crate::session::{Environment, Record, Session};
use crate::store::{MarkerStore, SessionStore};
use crate::wizard::{Interaction, Wizard, WizardStep};
use chrono::Utc;
use url::Url;

/// Input events observed on the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserEvent {
    PointerMove { target: NodeId },
    Click { target: NodeId },
    /// Answer to a title prompt; `None` when the prompt was cancelled
    AnnotationTitled { target: NodeId, title: Option<String> },
    /// The close button around the selected item
    DismissSelection,
}

/// What the host must do after an event was handled
#[derive(Debug, Clone, PartialEq)]
pub enum AgentOutcome {
    Idle,
    /// Ask the user for an annotation title for this element
    PromptTitle(NodeId),
    /// Navigate the tab; the agent is gone after this
    Navigate(Url),
    /// Hand these artifacts to the user; the session is over
    Exported(Vec<Artifact>),
    /// Remove the panel; the session was cancelled
    Closed,
    /// The reloaded page is not the expected one; nothing was resumed
    Inert { expected: String, actual: String },
}

pub struct PageAgent<S: MarkerStore, P: Panel> {
    config: RecorderConfig,
    store: SessionStore<S>,
    panel: P,
    wizard: Wizard,
    session: Option<Session>,
    environment: Environment,
    item: Option<NodeId>,
    pager: Option<NodeId>,
}

impl<S: MarkerStore, P: Panel> PageAgent<S, P> {
    pub fn new(config: RecorderConfig, store: S, panel: P) -> Self {
        let wizard = Wizard::new(config.flow());
        Self {
            config,
            store: SessionStore::new(store),
            panel,
            wizard,
            session: None,
            environment: Environment::default(),
            item: None,
            pager: None,
        }
    }

    /// Builder method: environment reported in the export summary
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn is_recording(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn step(&self) -> WizardStep {
        self.wizard.current()
    }

    pub fn wizard(&self) -> &Wizard {
        &self.wizard
    }

    pub fn panel(&self) -> &P {
        &self.panel
    }

    pub fn store(&self) -> &S {
        self.store.inner()
    }

    pub fn into_parts(self) -> (S, P) {
        (self.store.into_inner(), self.panel)
    }

    /// Handle a message from the control panel
    pub fn handle_message(&mut self, dom: &mut DomTree, message: PanelMessage) -> Result<AgentOutcome> {
        log::debug!("Agent <- {:?} at {:?}", message, self.wizard.current());

        match message {
            PanelMessage::RecordingStartStop => {
                if self.session.is_some() {
                    self.cancel(dom)
                } else {
                    self.start(dom)
                }
            }
            PanelMessage::RecordingContinue => self.resume(dom),
            PanelMessage::AnnotationsDone => self.finish_annotating(dom),
            PanelMessage::StepGetData { total_pages } => self.begin_walk(dom, total_pages),
            PanelMessage::StepSave => match self.session {
                Some(_) => self.export(dom),
                None => Ok(AgentOutcome::Idle),
            },
            PanelMessage::StopRecording | PanelMessage::RecordingCancel => self.cancel(dom),
        }
    }

    /// Handle a pointer or prompt event on the page
    pub fn handle_event(&mut self, dom: &mut DomTree, event: UserEvent) -> Result<AgentOutcome> {
        if self.session.is_none() {
            return Ok(AgentOutcome::Idle);
        }

        match event {
            UserEvent::PointerMove { target } => {
                self.hover(dom, target);
                Ok(AgentOutcome::Idle)
            }
            UserEvent::Click { target } => self.click(dom, target),
            UserEvent::AnnotationTitled { target, title } => self.annotate(dom, target, title),
            UserEvent::DismissSelection => self.dismiss_selection(dom),
        }
    }

    fn start(&mut self, dom: &mut DomTree) -> Result<AgentOutcome> {
        dom.clear_all_markers();
        self.wizard.reset();
        self.item = None;
        self.pager = None;

        let session = Session::new(dom.location().as_str(), self.environment.clone());
        self.store.save(&session)?;
        self.session = Some(session);

        log::info!("Recording started on {}", dom.location());
        Ok(AgentOutcome::Idle)
    }

    fn cancel(&mut self, dom: &mut DomTree) -> Result<AgentOutcome> {
        self.close(dom)?;
        log::info!("Recording cancelled");
        Ok(AgentOutcome::Closed)
    }

    /// Drop every trace of the session: memory, store and page markers
    fn close(&mut self, dom: &mut DomTree) -> Result<()> {
        dom.clear_all_markers();
        self.store.clear()?;
        self.session = None;
        self.item = None;
        self.pager = None;
        self.wizard.reset();
        Ok(())
    }

    fn resume(&mut self, dom: &mut DomTree) -> Result<AgentOutcome> {
        if self.session.is_some() {
            return Ok(AgentOutcome::Idle);
        }

        let Some(mut session) = self.store.load()? else {
            return Ok(AgentOutcome::Idle);
        };

        let Some(expected) = session.pending_navigation_target.clone() else {
            log::debug!("Stored session has no pending navigation; not resuming");
            return Ok(AgentOutcome::Idle);
        };

        if !resume_if_target_reached(Some(&expected), dom.location()) {
            let actual = path_and_query(dom.location());
            let err = RecorderError::ResumeMismatch {
                expected: expected.clone(),
                actual: actual.clone(),
            };
            log::warn!("{}; session left inert", err);
            return Ok(AgentOutcome::Inert { expected, actual });
        }

        log::info!("Resuming on page {} ({})", session.current_page, expected);
        session.pending_navigation_target = None;
        self.session = Some(session);
        self.wizard.resync(WizardStep::Walking);
        self.panel.send(AgentMessage::SetStep {
            step: WizardStep::Walking,
        })?;

        self.collect_page(dom)
    }

    fn hover(&mut self, dom: &mut DomTree, target: NodeId) {
        match self.wizard.current() {
            WizardStep::AwaitingSearchTerm => {
                dom.clear_marker(Marker::Hovered);
                if dom.node(target).is_some_and(|n| n.is_tag("input")) {
                    dom.add_marker(target, Marker::Hovered);
                }
            }
            WizardStep::AwaitingItemSelection | WizardStep::AwaitingPagerSelection => {
                dom.clear_marker(Marker::Hovered);
                dom.add_marker(target, Marker::Hovered);
            }
            WizardStep::Annotating => {
                dom.clear_marker(Marker::AnnotateHovered);
                dom.add_marker(target, Marker::AnnotateHovered);
            }
            _ => {}
        }
    }

    fn click(&mut self, dom: &mut DomTree, target: NodeId) -> Result<AgentOutcome> {
        if self.wizard.accepts(Interaction::SearchInput) {
            self.select_search_term(dom, target)
        } else if self.wizard.accepts(Interaction::ItemSelection) {
            self.select_item(dom, target)
        } else if self.wizard.accepts(Interaction::Annotation) {
            if let Some(item) = self.item {
                if target != item && !dom.descendants(item).any(|d| d == target) {
                    log::debug!("Ignoring click on {} outside the selected item", target);
                    return Ok(AgentOutcome::Idle);
                }
            }
            Ok(AgentOutcome::PromptTitle(target))
        } else if self.wizard.accepts(Interaction::PagerSelection) {
            self.select_pager(dom, target)
        } else {
            Ok(AgentOutcome::Idle)
        }
    }

    fn select_search_term(&mut self, dom: &mut DomTree, target: NodeId) -> Result<AgentOutcome> {
        let element = dom.require(target)?;
        let term = match element.get_attribute("value") {
            Some(value) => value.trim().to_string(),
            None => element.inner_text(),
        };

        let Some(session) = self.session.as_mut() else {
            return Ok(AgentOutcome::Idle);
        };
        if !session.search_term.is_empty() {
            return Ok(AgentOutcome::Idle);
        }

        log::info!("Search term: '{}'", term);
        session.search_term = term;
        dom.remove_marker(target, Marker::Hovered);
        self.persist()?;
        self.step_next()?;
        Ok(AgentOutcome::Idle)
    }

    fn select_item(&mut self, dom: &mut DomTree, target: NodeId) -> Result<AgentOutcome> {
        dom.clear_marker(Marker::Selected);

        let key = match derive_selector_key(dom, target) {
            Ok(key) => key,
            Err(RecorderError::EmptySelector) => {
                self.panel.send(AgentMessage::ValidationFailed {
                    message: "Selected item has no \"id\" or \"classes\" to distinguish it. It cannot be selected."
                        .to_string(),
                })?;
                return Ok(AgentOutcome::Idle);
            }
            Err(e) => return Err(e),
        };

        dom.remove_marker(target, Marker::Hovered);
        dom.add_marker(target, Marker::Selected);
        self.item = Some(target);

        if let Some(session) = self.session.as_mut() {
            log::info!("Result item selected: {:?}", key);
            session.selector_key = Some(key);
        }
        self.persist()?;
        self.step_next()?;
        Ok(AgentOutcome::Idle)
    }

    fn annotate(&mut self, dom: &mut DomTree, target: NodeId, title: Option<String>) -> Result<AgentOutcome> {
        if !self.wizard.accepts(Interaction::Annotation) {
            return Ok(AgentOutcome::Idle);
        }
        let Some(session) = self.session.as_mut() else {
            return Ok(AgentOutcome::Idle);
        };

        match add_annotation(session, dom, title.as_deref().unwrap_or(""), target) {
            Ok(_) => {}
            Err(RecorderError::EmptyTitle) => {
                log::debug!("Annotation prompt on {} cancelled", target);
                return Ok(AgentOutcome::Idle);
            }
            Err(RecorderError::EmptySelector) => {
                self.panel.send(AgentMessage::ValidationFailed {
                    message: "Annotated element has no \"id\" or \"classes\" to find it by.".to_string(),
                })?;
                return Ok(AgentOutcome::Idle);
            }
            Err(e) => return Err(e),
        }

        dom.remove_marker(target, Marker::AnnotateHovered);
        self.persist()?;
        Ok(AgentOutcome::Idle)
    }

    fn dismiss_selection(&mut self, dom: &mut DomTree) -> Result<AgentOutcome> {
        if self.wizard.current() != WizardStep::Annotating {
            return Ok(AgentOutcome::Idle);
        }

        for marker in [Marker::Selected, Marker::Annotated, Marker::AnnotateHovered] {
            dom.clear_marker(marker);
        }
        self.item = None;
        if let Some(session) = self.session.as_mut() {
            session.selector_key = None;
            session.annotations.clear();
        }
        self.persist()?;

        if self.wizard.retreat().is_some() {
            self.panel.send(AgentMessage::StepPrev)?;
        }
        Ok(AgentOutcome::Idle)
    }

    fn finish_annotating(&mut self, dom: &mut DomTree) -> Result<AgentOutcome> {
        if self.wizard.current() != WizardStep::Annotating {
            return Ok(AgentOutcome::Idle);
        }
        let Some(key) = self.session.as_ref().and_then(|s| s.selector_key.clone()) else {
            return Err(RecorderError::SelectionRequired);
        };

        dom.clear_marker(Marker::AnnotateHovered);
        let matched = apply_selector(dom, &key)?;
        log::info!("{} similar result item(s) highlighted", matched.len());

        self.step_next()?;
        Ok(AgentOutcome::Idle)
    }

    fn select_pager(&mut self, dom: &mut DomTree, target: NodeId) -> Result<AgentOutcome> {
        let designation = designate_pager(dom, target);
        dom.clear_marker(Marker::Hovered);
        self.pager = Some(designation.node());

        if let PagerDesignation::Undiscoverable { .. } = designation {
            self.panel.send(AgentMessage::Warning {
                message: "The pager has no discernible ID or Class names. You will have to do each page manually."
                    .to_string(),
            })?;
        }

        if let Some(session) = self.session.as_mut() {
            session.pager_key = designation.key().cloned();
        }
        self.persist()?;
        self.step_next()?;
        Ok(AgentOutcome::Idle)
    }

    fn begin_walk(&mut self, dom: &mut DomTree, total_pages: u32) -> Result<AgentOutcome> {
        if self.wizard.current() != WizardStep::AwaitingPageLimit {
            return Ok(AgentOutcome::Idle);
        }
        let Some(session) = self.session.as_mut() else {
            return Ok(AgentOutcome::Idle);
        };

        if let Err(e) = session.set_page_limit(total_pages) {
            self.panel.send(AgentMessage::ValidationFailed { message: e.to_string() })?;
            return Ok(AgentOutcome::Idle);
        }

        self.persist()?;
        self.step_next()?;
        self.collect_page(dom)
    }

    /// Extract every result on this page, then move on or finish
    fn collect_page(&mut self, dom: &mut DomTree) -> Result<AgentOutcome> {
        let options = self.config.extract_options();
        let Some(session) = self.session.as_mut() else {
            return Ok(AgentOutcome::Idle);
        };
        let key = session.selector_key.clone().ok_or(RecorderError::SelectionRequired)?;

        let items = apply_selector(dom, &key)?;
        let records: Vec<Record> = items
            .iter()
            .map(|&item| extract_fields(&*dom, item, &session.annotations, options))
            .collect();
        log::info!("Page {}: {} record(s) extracted", session.current_page, records.len());
        session.append_records(records);

        let pager = self
            .pager
            .or_else(|| session.pager_key.as_ref().and_then(|key| rebind_pager(&*dom, key)));

        match next_page_url(dom, pager, session.current_page, session.total_page_limit) {
            Some(next) => {
                session.current_page = next.page;
                session.pending_navigation_target = Some(next.target);
                // Must hit the store before the navigation tears the agent down
                self.persist()?;
                log::info!("Navigating to page {}: {}", next.page, next.url);
                Ok(AgentOutcome::Navigate(next.url))
            }
            None => self.export(dom),
        }
    }

    fn export(&mut self, dom: &mut DomTree) -> Result<AgentOutcome> {
        let Some(session) = self.session.as_ref() else {
            return Ok(AgentOutcome::Idle);
        };

        if self.wizard.current() != WizardStep::Exporting {
            self.wizard.resync(WizardStep::Exporting);
            self.panel.send(AgentMessage::SetStep {
                step: WizardStep::Exporting,
            })?;
        }

        let artifacts = export_session(session, &self.config, Utc::now())?;
        self.close(dom)?;
        Ok(AgentOutcome::Exported(artifacts))
    }

    fn persist(&mut self) -> Result<()> {
        match &self.session {
            Some(session) => self.store.save(session),
            None => Ok(()),
        }
    }

    fn step_next(&mut self) -> Result<()> {
        if self.wizard.advance().is_some() {
            self.panel.send(AgentMessage::StepNext)?;
        }
        Ok(())
    }
}
