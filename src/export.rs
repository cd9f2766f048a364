//! Export of the accumulated records as named artifacts

use crate::config::RecorderConfig;
use crate::error::{RecorderError, Result};
use crate::session::{AnnotationRule, Record, Session};
use chrono::{DateTime, SecondsFormat, Utc};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use serde::{Deserialize, Serialize};

/// Kinds of artifact a session can be exported as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    /// Delimited table, one row per record
    Table,
    /// JSON dump of the full record list
    Structured,
    /// Plain-text run summary
    Summary,
}

impl ExportFormat {
    /// Canonical emission order
    pub const ALL: [ExportFormat; 3] = [ExportFormat::Table, ExportFormat::Structured, ExportFormat::Summary];

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Table => "csv",
            ExportFormat::Structured => "json",
            ExportFormat::Summary => "txt",
        }
    }

    pub fn media_type(self) -> &'static str {
        match self {
            ExportFormat::Table => "text/csv;charset=utf-8",
            ExportFormat::Structured => "application/json;charset=utf-8",
            ExportFormat::Summary => "text/plain;charset=utf-8",
        }
    }
}

/// A named byte blob handed to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub name: String,
    pub format: ExportFormat,
    pub bytes: Vec<u8>,
}

impl Artifact {
    pub fn media_type(&self) -> &'static str {
        self.format.media_type()
    }
}

/// Shared artifact name stem, `<product>_session_<YYYY/MM/DD>`
pub fn artifact_stem(product: &str, run_date: DateTime<Utc>) -> String {
    format!("{}_session_{}", product, run_date.format("%Y/%m/%d"))
}

/// Build every configured artifact for the session
pub fn export_session(session: &Session, config: &RecorderConfig, run_date: DateTime<Utc>) -> Result<Vec<Artifact>> {
    let stem = artifact_stem(&config.product, run_date);
    let mut artifacts = Vec::new();

    for format in ExportFormat::ALL {
        if !config.exports(format) {
            continue;
        }

        let bytes = match format {
            ExportFormat::Table => render_table(session.records(), &session.annotations, config.table_delimiter)?,
            ExportFormat::Structured => render_structured(session.records())?,
            ExportFormat::Summary => render_summary(session, &config.product).into_bytes(),
        };

        artifacts.push(Artifact {
            name: format!("{}.{}", stem, format.extension()),
            format,
            bytes,
        });
    }

    log::info!(
        "Exported {} record(s) as {} artifact(s) under '{}'",
        session.records().len(),
        artifacts.len(),
        stem
    );
    Ok(artifacts)
}

/// Header of rule titles, then one quoted row per record
///
/// Missing fields are written as empty values. Each record's links follow
/// its annotated columns.
pub fn render_table(records: &[Record], rules: &[AnnotationRule], delimiter: u8) -> Result<Vec<u8>> {
    // csv writes an empty record as `""`, so a header without titles is a bare line end
    let mut out = Vec::new();
    if rules.is_empty() {
        out.extend_from_slice(b"\r\n");
    }

    let mut writer = WriterBuilder::new()
        .delimiter(delimiter)
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::CRLF)
        .flexible(true)
        .from_writer(out);

    if !rules.is_empty() {
        let header: Vec<&str> = rules.iter().map(|r| r.title.as_str()).collect();
        writer.write_record(&header).map_err(table_error)?;
    }

    for record in records {
        let mut row: Vec<String> = rules
            .iter()
            .map(|rule| collapse_newlines(record.field(&rule.title).unwrap_or("")))
            .collect();
        row.extend(record.links.iter().cloned());
        writer.write_record(&row).map_err(table_error)?;
    }

    writer
        .into_inner()
        .map_err(|e| RecorderError::Export(format!("Failed to finish table: {}", e)))
}

fn table_error(e: csv::Error) -> RecorderError {
    RecorderError::Export(format!("Failed to write table row: {}", e))
}

fn collapse_newlines(value: &str) -> String {
    value.replace("\r\n", " ").replace(['\n', '\r'], " ")
}

/// Pretty JSON array of every record
pub fn render_structured(records: &[Record]) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(records)?)
}

/// Human-readable summary of the run
pub fn render_summary(session: &Session, product: &str) -> String {
    let title = format!("{} Session", display_name(product));
    let lines = [
        title.clone(),
        "=".repeat(title.chars().count()),
        format!("Date Run: {}", session.started_at.to_rfc3339_opts(SecondsFormat::Millis, true)),
        format!("Website URL: {}", session.source_url),
        format!("Search Term: {}", session.search_term),
        format!("Results Returned: {}", session.records().len()),
        String::new(),
        "Environment:".to_string(),
        "-----------".to_string(),
        format!("Operating System: {}", session.environment.os_name),
        format!("Web Browser: {}", session.environment.browser_name),
        format!("Web Browser Version: {}", session.environment.browser_version),
    ];

    let mut text = lines.join("\r\n");
    text.push_str("\r\n");
    text
}

fn display_name(product: &str) -> String {
    product
        .split(['_', '-'])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
