//! # listing-recorder
//!
//! Guided recorder for search-results listings. The user points at one
//! result, annotates the fields inside it and marks the pager; the recorder
//! then applies the learned layout to every matching item on every page and
//! exports the records as a table, a JSON dump and a run summary.
//!
//! ## Pieces
//!
//! - **Wizard**: ordered steps gating what the page accepts
//! - **Engines**: selection, annotation and pagination over a page snapshot
//! - **Store**: session persistence across page reloads
//! - **Agent**: per-page controller tying the above to the control panel
//! - **Browser**: Chrome host that loads pages and takes snapshots
//!
//! ## Library Usage
//!
//! ```rust,no_run
//! use listing_recorder::protocol::{LogPanel, PanelMessage};
//! use listing_recorder::{BrowserSession, LaunchOptions, MemoryStore, PageAgent, RecorderConfig};
//! use url::Url;
//!
//! # fn main() -> listing_recorder::Result<()> {
//! let browser = BrowserSession::launch(LaunchOptions::default())?;
//! browser.navigate(&Url::parse("https://example.com/search?q=rust").unwrap())?;
//!
//! let mut dom = browser.snapshot()?;
//! let mut agent = PageAgent::new(RecorderConfig::default(), MemoryStore::new(), LogPanel);
//! agent.handle_message(&mut dom, PanelMessage::RecordingStartStop)?;
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod browser;
pub mod config;
pub mod dom;
pub mod engine;
pub mod error;
pub mod export;
pub mod protocol;
pub mod script;
pub mod session;
pub mod store;
pub mod wizard;

pub use agent::{AgentOutcome, PageAgent, UserEvent};
pub use browser::{BrowserSession, ConnectionOptions, LaunchOptions};
pub use config::RecorderConfig;
pub use dom::{DomTree, ElementNode, Marker, NodeId};
pub use error::{RecorderError, Result};
pub use export::{Artifact, ExportFormat};
pub use script::{RecordingScript, Target};
pub use session::{AnnotationRule, Environment, Record, SelectorKey, Session};
pub use store::{FileStore, MarkerStore, MemoryStore, SessionStore, StoreKey};
pub use wizard::{Wizard, WizardFlow, WizardStep};
