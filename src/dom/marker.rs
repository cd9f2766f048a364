use serde::{Deserialize, Serialize};

/// Transient class names the recorder paints onto page elements
///
/// Markers are visual state only. They must never leak into a selector
/// signature, so every signature is computed through [`strip_markers`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Marker {
    /// Element under the pointer while choosing an item or pager
    Hovered,
    /// Element belonging to the selected result set
    Selected,
    /// Element under the pointer while annotating
    AnnotateHovered,
    /// Element the user attached an annotation to
    Annotated,
}

impl Marker {
    pub const ALL: [Marker; 4] = [
        Marker::Hovered,
        Marker::Selected,
        Marker::AnnotateHovered,
        Marker::Annotated,
    ];

    /// Class name written into the element's class attribute
    pub fn class_name(self) -> &'static str {
        match self {
            Marker::Hovered => "glr_hovered",
            Marker::Selected => "glr_selected",
            Marker::AnnotateHovered => "glr_annotate_hovered",
            Marker::Annotated => "glr_annotated",
        }
    }

    /// Check whether a single class token is one of the recorder's markers
    pub fn is_marker_class(class: &str) -> bool {
        Self::ALL.iter().any(|m| m.class_name() == class)
    }
}

/// Remove every marker class from a class attribute and normalise whitespace
pub fn strip_markers(class_attr: &str) -> String {
    class_attr
        .split_whitespace()
        .filter(|c| !Marker::is_marker_class(c))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_markers() {
        assert_eq!(strip_markers("result glr_selected"), "result");
        assert_eq!(strip_markers("  c1   glr_hovered c2 "), "c1 c2");
        assert_eq!(strip_markers("glr_selected glr_annotated"), "");
        assert_eq!(strip_markers(""), "");
    }

    #[test]
    fn test_marker_classes_are_distinct() {
        let mut names: Vec<_> = Marker::ALL.iter().map(|m| m.class_name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), Marker::ALL.len());
    }
}
