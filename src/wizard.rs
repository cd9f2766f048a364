//! Guided step sequence and per-step interaction gating

use crate::error::{RecorderError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Every step a recording can pass through, in canonical order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    AwaitingSearchTerm,
    AwaitingItemSelection,
    Annotating,
    AwaitingPagerSelection,
    AwaitingPageLimit,
    Walking,
    Exporting,
}

impl WizardStep {
    pub const ALL: [WizardStep; 7] = [
        WizardStep::AwaitingSearchTerm,
        WizardStep::AwaitingItemSelection,
        WizardStep::Annotating,
        WizardStep::AwaitingPagerSelection,
        WizardStep::AwaitingPageLimit,
        WizardStep::Walking,
        WizardStep::Exporting,
    ];

    /// Instruction shown in the panel
    pub fn instruction(self) -> &'static str {
        match self {
            WizardStep::AwaitingSearchTerm => "Select search string input.",
            WizardStep::AwaitingItemSelection => "Select the first element from the list of results.",
            WizardStep::Annotating => "Click on elements within your selected item to annotate them.",
            WizardStep::AwaitingPagerSelection => "Select the pager.",
            WizardStep::AwaitingPageLimit => "Check correct items have been matched?",
            WizardStep::Walking => "Collecting results from each page...",
            WizardStep::Exporting => "Saving the session files.",
        }
    }
}

/// Buttons the panel shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelAction {
    Cancel,
    AnnotationsDone,
    ConfirmPageLimit,
    Export,
}

/// Page interactions the agent may accept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interaction {
    SearchInput,
    ItemSelection,
    Annotation,
    PagerSelection,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StepActions {
    pub buttons: Vec<PanelAction>,
    pub accepts: Option<Interaction>,
}

impl StepActions {
    fn defaults(step: WizardStep) -> Self {
        use PanelAction::*;
        let (buttons, accepts) = match step {
            WizardStep::AwaitingSearchTerm => (vec![Cancel], Some(Interaction::SearchInput)),
            WizardStep::AwaitingItemSelection => (vec![Cancel], Some(Interaction::ItemSelection)),
            WizardStep::Annotating => (vec![Cancel, AnnotationsDone], Some(Interaction::Annotation)),
            WizardStep::AwaitingPagerSelection => (vec![Cancel], Some(Interaction::PagerSelection)),
            WizardStep::AwaitingPageLimit => (vec![Cancel, ConfirmPageLimit, Export], None),
            WizardStep::Walking => (vec![Cancel], None),
            WizardStep::Exporting => (vec![], None),
        };
        Self { buttons, accepts }
    }
}

/// An ordered step list plus the visible-actions table
///
/// Flows with and without pagination are two configurations of the same
/// engine.
#[derive(Debug, Clone, PartialEq)]
pub struct WizardFlow {
    steps: Vec<WizardStep>,
    actions: IndexMap<WizardStep, StepActions>,
}

impl WizardFlow {
    /// Build a custom flow
    ///
    /// Steps must be strictly increasing, include item selection and end
    /// with `Exporting`.
    pub fn new(steps: Vec<WizardStep>) -> Result<Self> {
        if steps.is_empty() {
            return Err(RecorderError::InvalidFlow("no steps".to_string()));
        }
        if steps.windows(2).any(|w| w[0] >= w[1]) {
            return Err(RecorderError::InvalidFlow("steps must be strictly increasing".to_string()));
        }
        if !steps.contains(&WizardStep::AwaitingItemSelection) {
            return Err(RecorderError::InvalidFlow("item selection step is required".to_string()));
        }
        if steps.last() != Some(&WizardStep::Exporting) {
            return Err(RecorderError::InvalidFlow("last step must be exporting".to_string()));
        }

        let actions = steps.iter().map(|&s| (s, StepActions::defaults(s))).collect();
        Ok(Self { steps, actions })
    }

    /// All seven steps
    pub fn paginated() -> Self {
        Self::from_known(WizardStep::ALL.to_vec())
    }

    /// Pager selection skipped, a single page is collected
    pub fn single_page() -> Self {
        Self::from_known(
            WizardStep::ALL
                .into_iter()
                .filter(|s| *s != WizardStep::AwaitingPagerSelection)
                .collect(),
        )
    }

    fn from_known(steps: Vec<WizardStep>) -> Self {
        let actions = steps.iter().map(|&s| (s, StepActions::defaults(s))).collect();
        Self { steps, actions }
    }

    /// Builder method: override the actions of one step
    pub fn with_actions(mut self, step: WizardStep, actions: StepActions) -> Self {
        if self.contains(step) {
            self.actions.insert(step, actions);
        }
        self
    }

    pub fn steps(&self) -> &[WizardStep] {
        &self.steps
    }

    pub fn contains(&self, step: WizardStep) -> bool {
        self.steps.contains(&step)
    }

    pub fn first(&self) -> WizardStep {
        self.steps[0]
    }

    pub fn actions(&self, step: WizardStep) -> Option<&StepActions> {
        self.actions.get(&step)
    }
}

/// Current position in a [`WizardFlow`]
#[derive(Debug, Clone)]
pub struct Wizard {
    flow: WizardFlow,
    current: WizardStep,
}

impl Wizard {
    pub fn new(flow: WizardFlow) -> Self {
        let current = flow.first();
        Self { flow, current }
    }

    pub fn current(&self) -> WizardStep {
        self.current
    }

    pub fn flow(&self) -> &WizardFlow {
        &self.flow
    }

    /// 1-based position of the current step for display
    pub fn step_number(&self) -> usize {
        self.flow
            .steps
            .iter()
            .filter(|&&s| s <= self.current)
            .count()
    }

    pub fn is_terminal(&self) -> bool {
        self.next_step().is_none()
    }

    fn next_step(&self) -> Option<WizardStep> {
        self.flow.steps.iter().copied().find(|&s| s > self.current)
    }

    fn previous_step(&self) -> Option<WizardStep> {
        self.flow.steps.iter().copied().rev().find(|&s| s < self.current)
    }

    /// Move forward one step; `None` (and no change) at the terminal step
    pub fn advance(&mut self) -> Option<WizardStep> {
        let next = self.next_step()?;
        log::info!("Wizard step {:?} -> {:?}", self.current, next);
        self.current = next;
        Some(next)
    }

    /// Move back one step; `None` (and no change) at the initial step
    pub fn retreat(&mut self) -> Option<WizardStep> {
        let previous = self.previous_step()?;
        log::info!("Wizard step {:?} -> {:?}", self.current, previous);
        self.current = previous;
        Some(previous)
    }

    /// Force the current step, used only to restore state after a reload
    pub fn resync(&mut self, step: WizardStep) {
        log::debug!("Wizard resynchronised to {:?}", step);
        self.current = step;
    }

    pub fn reset(&mut self) {
        self.current = self.flow.first();
    }

    /// Whether a page interaction is accepted at the current step
    pub fn accepts(&self, interaction: Interaction) -> bool {
        self.flow
            .actions(self.current)
            .is_some_and(|a| a.accepts == Some(interaction))
    }

    pub fn visible_actions(&self) -> &[PanelAction] {
        self.flow
            .actions(self.current)
            .map(|a| a.buttons.as_slice())
            .unwrap_or(&[])
    }

    pub fn step_text(&self) -> &'static str {
        self.current.instruction()
    }
}
