//! JSON report renderer

use crate::engine::AssessmentReport;
use crate::VerisResult;

/// Render an assessment report as pretty-printed JSON
pub fn render(report: &AssessmentReport) -> VerisResult<String> {
    serde_json::to_string_pretty(report).map_err(crate::VerisError::SerdeError)
}
