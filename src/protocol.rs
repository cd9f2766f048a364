//! Messages exchanged between the control panel and the page agent

use crate::error::Result;
use crate::wizard::{Wizard, WizardFlow, WizardStep};
use serde::{Deserialize, Serialize};

/// Panel → agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PanelMessage {
    /// Toggle the recording on or off
    RecordingStartStop,
    /// A page finished loading
    RecordingContinue,
    /// The user finished annotating
    AnnotationsDone,
    /// Page limit chosen; start collecting
    StepGetData {
        #[serde(rename = "totalPages")]
        total_pages: u32,
    },
    StepSave,
    StopRecording,
    RecordingCancel,
}

/// Agent → panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentMessage {
    StepNext,
    StepPrev,
    SetStep { step: WizardStep },
    /// The last interaction was refused and must be retried
    ValidationFailed { message: String },
    /// Something degraded but the recording continues
    Warning { message: String },
}

/// Transport to the control panel
pub trait Panel {
    fn send(&mut self, message: AgentMessage) -> Result<()>;
}

impl<P: Panel + ?Sized> Panel for &mut P {
    fn send(&mut self, message: AgentMessage) -> Result<()> {
        (**self).send(message)
    }
}

/// Panel that keeps every message and mirrors the displayed step
#[derive(Debug, Clone)]
pub struct RecordingPanel {
    pub sent: Vec<AgentMessage>,
    displayed: Wizard,
}

impl RecordingPanel {
    pub fn new(flow: WizardFlow) -> Self {
        Self {
            sent: Vec::new(),
            displayed: Wizard::new(flow),
        }
    }

    /// Step the panel currently shows
    pub fn displayed_step(&self) -> WizardStep {
        self.displayed.current()
    }

    pub fn take(&mut self) -> Vec<AgentMessage> {
        std::mem::take(&mut self.sent)
    }
}

impl Panel for RecordingPanel {
    fn send(&mut self, message: AgentMessage) -> Result<()> {
        match &message {
            AgentMessage::StepNext => {
                self.displayed.advance();
            }
            AgentMessage::StepPrev => {
                self.displayed.retreat();
            }
            AgentMessage::SetStep { step } => self.displayed.resync(*step),
            AgentMessage::ValidationFailed { .. } | AgentMessage::Warning { .. } => {}
        }
        self.sent.push(message);
        Ok(())
    }
}

/// Panel that only writes messages to the log
#[derive(Debug, Default)]
pub struct LogPanel;

impl Panel for LogPanel {
    fn send(&mut self, message: AgentMessage) -> Result<()> {
        match &message {
            AgentMessage::ValidationFailed { message } => log::error!("{}", message),
            AgentMessage::Warning { message } => log::warn!("{}", message),
            other => log::info!("Panel <- {}", serde_json::to_string(other)?),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panel_message_wire_format() {
        let msg: PanelMessage = serde_json::from_str(r#"{"type": "STEP_GET_DATA", "totalPages": 3}"#).unwrap();
        assert_eq!(msg, PanelMessage::StepGetData { total_pages: 3 });

        let msg: PanelMessage = serde_json::from_str(r#"{"type": "RECORDING_CONTINUE"}"#).unwrap();
        assert_eq!(msg, PanelMessage::RecordingContinue);

        let msg: PanelMessage = serde_json::from_str(r#"{"type": "STOP_RECORDING"}"#).unwrap();
        assert_eq!(msg, PanelMessage::StopRecording);
    }

    #[test]
    fn test_agent_message_wire_format() {
        let json = serde_json::to_value(AgentMessage::SetStep { step: WizardStep::Walking }).unwrap();
        assert_eq!(json, serde_json::json!({"type": "SET_STEP", "step": "walking"}));

        let json = serde_json::to_value(AgentMessage::StepNext).unwrap();
        assert_eq!(json, serde_json::json!({"type": "STEP_NEXT"}));
    }

    #[test]
    fn test_recording_panel_mirrors_steps() {
        let mut panel = RecordingPanel::new(WizardFlow::paginated());
        panel.send(AgentMessage::StepNext).unwrap();
        panel.send(AgentMessage::StepNext).unwrap();
        panel.send(AgentMessage::StepPrev).unwrap();
        assert_eq!(panel.displayed_step(), WizardStep::AwaitingItemSelection);

        panel.send(AgentMessage::SetStep { step: WizardStep::Walking }).unwrap();
        assert_eq!(panel.displayed_step(), WizardStep::Walking);
        assert_eq!(panel.take().len(), 4);
        assert!(panel.sent.is_empty());
    }
}
