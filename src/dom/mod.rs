//! Page snapshot model
//!
//! The recorder never touches a live document directly. It works on a
//! snapshot of the page taken after each load:
//! - ElementNode: Representation of DOM elements
//! - DomTree: Snapshot with document-order addressing and marker painting
//! - NodeMap: Mapping of node ids to tree positions
//! - Marker: Transient class names the recorder paints onto elements

pub mod element;
pub mod marker;
pub mod node_map;
pub mod tree;

pub use element::{BoundingBox, ElementNode};
pub use marker::{strip_markers, Marker};
pub use node_map::{NodeEntry, NodeId, NodeMap};
pub use tree::DomTree;

use crate::error::Result;
use headless_chrome::Tab;
use std::sync::Arc;

/// Snapshot the DOM of a browser tab
pub fn extract_dom(tab: &Arc<Tab>) -> Result<DomTree> {
    DomTree::from_tab(tab)
}
