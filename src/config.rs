//! Recorder configuration

use crate::engine::ExtractOptions;
use crate::export::ExportFormat;
use crate::wizard::WizardFlow;
use serde::{Deserialize, Serialize};

/// Options selecting between the tool's variants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Walk paginated results (adds the pager step)
    pub pagination: bool,

    /// Artifacts produced at export, always emitted in canonical order
    pub export_formats: Vec<ExportFormat>,

    /// Annotated elements that are links contribute their URL first; when
    /// off, those links are dropped from the record
    pub annotated_links: bool,

    /// Product name used in artifact names and the summary banner
    pub product: String,

    /// Field delimiter of the table artifact
    pub table_delimiter: u8,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            pagination: true,
            export_formats: ExportFormat::ALL.to_vec(),
            annotated_links: true,
            product: "grey_lit_recorder".to_string(),
            table_delimiter: b'\t',
        }
    }
}

impl RecorderConfig {
    /// Create new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: enable or disable pagination
    pub fn pagination(mut self, enabled: bool) -> Self {
        self.pagination = enabled;
        self
    }

    /// Builder method: set exported artifacts
    pub fn export_formats(mut self, formats: impl IntoIterator<Item = ExportFormat>) -> Self {
        self.export_formats = formats.into_iter().collect();
        self
    }

    /// Builder method: whether annotated links feed the link list
    pub fn annotated_links(mut self, enabled: bool) -> Self {
        self.annotated_links = enabled;
        self
    }

    /// Builder method: set product name
    pub fn product(mut self, product: impl Into<String>) -> Self {
        self.product = product.into();
        self
    }

    /// Builder method: set table delimiter
    pub fn table_delimiter(mut self, delimiter: u8) -> Self {
        self.table_delimiter = delimiter;
        self
    }

    pub fn exports(&self, format: ExportFormat) -> bool {
        self.export_formats.contains(&format)
    }

    /// Wizard flow matching the pagination setting
    pub fn flow(&self) -> WizardFlow {
        if self.pagination {
            WizardFlow::paginated()
        } else {
            WizardFlow::single_page()
        }
    }

    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            annotated_links: self.annotated_links,
        }
    }
}
