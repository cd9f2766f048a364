//! Selection, annotation and pagination over a page snapshot

pub mod annotation;
pub mod pagination;
pub mod selection;

pub use annotation::{add_annotation, extract_fields, ExtractOptions};
pub use pagination::{
    designate_pager, next_page_url, path_and_query, rebind_pager, resume_if_target_reached, NextPage,
    PagerDesignation, MAX_PAGER_HOPS,
};
pub use selection::{apply_selector, derive_selector_key, matching_nodes};
