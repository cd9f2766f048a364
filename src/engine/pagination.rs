use crate::dom::{DomTree, NodeId};
use crate::engine::selection::{derive_selector_key, matching_nodes};
use crate::session::SelectorKey;
use url::Url;

/// Hops away from the clicked element when looking for an identifiable pager
pub const MAX_PAGER_HOPS: usize = 2;

/// Outcome of designating the pager region
#[derive(Debug, Clone, PartialEq)]
pub enum PagerDesignation {
    /// An identifiable element was found within the hop limit
    Anchored { node: NodeId, key: SelectorKey },

    /// Nothing identifiable nearby. The clicked element is used for this
    /// page only; later pages must be advanced by hand.
    Undiscoverable { node: NodeId },
}

impl PagerDesignation {
    pub fn node(&self) -> NodeId {
        match self {
            PagerDesignation::Anchored { node, .. } | PagerDesignation::Undiscoverable { node } => *node,
        }
    }

    pub fn key(&self) -> Option<&SelectorKey> {
        match self {
            PagerDesignation::Anchored { key, .. } => Some(key),
            PagerDesignation::Undiscoverable { .. } => None,
        }
    }
}

/// The next page the walker should visit
#[derive(Debug, Clone, PartialEq)]
pub struct NextPage {
    /// Page number parsed from the link text
    pub page: u32,

    /// Absolute URL to navigate to
    pub url: Url,

    /// Path and query expected after the reload
    pub target: String,
}

/// Bind the pager region from the element the user clicked
///
/// Tries the element itself, then its parent, then its first child.
pub fn designate_pager(dom: &DomTree, clicked: NodeId) -> PagerDesignation {
    match probe(dom, clicked, 0) {
        Some((node, key)) => {
            log::info!("Pager bound to {} via {:?}", node, key);
            PagerDesignation::Anchored { node, key }
        }
        None => {
            log::warn!("Pager {} has no discernible id or class", clicked);
            PagerDesignation::Undiscoverable { node: clicked }
        }
    }
}

fn probe(dom: &DomTree, origin: NodeId, hop: usize) -> Option<(NodeId, SelectorKey)> {
    if hop > MAX_PAGER_HOPS {
        return None;
    }

    let candidate = match hop {
        0 => Some(origin),
        1 => dom.parent(origin),
        _ => dom.first_child(origin),
    };

    if let Some(node) = candidate {
        if let Ok(key) = derive_selector_key(dom, node) {
            return Some((node, key));
        }
    }

    probe(dom, origin, hop + 1)
}

/// Find the pager on a freshly loaded page from its persisted key
pub fn rebind_pager(dom: &DomTree, key: &SelectorKey) -> Option<NodeId> {
    if key.is_empty() {
        return None;
    }
    matching_nodes(dom, key).into_iter().next()
}

/// Pick the link to the next greater page number
///
/// Links whose text is not a number are skipped, and numbers may jump
/// (ellipsis pagers). Returns `None` when no pager is bound, when
/// `current_page` has reached `page_limit`, or when no greater page
/// number that stays within `page_limit + 1` is present.
pub fn next_page_url(dom: &DomTree, pager: Option<NodeId>, current_page: u32, page_limit: u32) -> Option<NextPage> {
    let pager = pager?;

    if current_page >= page_limit {
        log::info!("Page limit {} reached at page {}", page_limit, current_page);
        return None;
    }

    for link in dom.links_within(pager) {
        let Ok(page) = dom.inner_text(link).trim().parse::<u32>() else {
            continue;
        };
        if page <= current_page {
            continue;
        }
        if page > page_limit.saturating_add(1) {
            log::info!("Next page {} lies beyond the limit of {}", page, page_limit);
            return None;
        }

        let Some(url) = dom.resolve_href(link) else {
            log::warn!("Pager link for page {} has no usable href", page);
            return None;
        };
        let target = path_and_query(&url);
        return Some(NextPage { page, url, target });
    }

    None
}

/// Whether the reloaded page is the page the walker navigated to
///
/// Path and query must match exactly; a trailing slash or reordered query
/// parameters count as a different page.
pub fn resume_if_target_reached(expected: Option<&str>, location: &Url) -> bool {
    match expected {
        Some(expected) => expected == path_and_query(location),
        None => false,
    }
}

/// `path?query` of a URL, the form navigation targets are stored in
pub fn path_and_query(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}
