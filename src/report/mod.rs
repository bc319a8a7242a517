//! Report rendering — JSON and Markdown output
//!
//! Transforms an `AssessmentReport` into machine-readable or human-readable
//! form suitable for dashboards, audit evidence, and review packets.

pub mod json;
pub mod markdown;

use crate::engine::AssessmentReport;
use crate::VerisResult;
use std::path::Path;

/// Output format for an assessment report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// Structured JSON (machine-readable)
    Json,
    /// Human-readable Markdown with tables and summaries
    Markdown,
}

/// Write a report in the specified format
pub fn write_report(
    report: &AssessmentReport,
    format: ReportFormat,
    output: &Path,
) -> VerisResult<()> {
    let content = render_report(report, format)?;
    std::fs::write(output, content).map_err(crate::VerisError::Io)?;
    Ok(())
}

/// Render a report to a string
pub fn render_report(report: &AssessmentReport, format: ReportFormat) -> VerisResult<String> {
    match format {
        ReportFormat::Json => json::render(report),
        ReportFormat::Markdown => markdown::render(report),
    }
}
