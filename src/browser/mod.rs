//! Chrome host for the recorder
//!
//! The browser only loads pages and hands snapshots to the agent. All
//! recording logic runs on the snapshot.

pub mod config;
pub mod session;

pub use config::{ConnectionOptions, LaunchOptions};
pub use session::BrowserSession;
