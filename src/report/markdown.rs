//! Markdown report renderer
//!
//! Produces a review-ready Markdown document with the assessment metadata,
//! executive summary, findings and recommendations tables, and the optional
//! quantitative and correlation sections.

use crate::engine::AssessmentReport;
use crate::model::RiskLevel;
use crate::VerisResult;

/// Render an assessment report as Markdown
pub fn render(report: &AssessmentReport) -> VerisResult<String> {
    let mut md = String::with_capacity(8192);

    md.push_str("# Veris Risk Assessment Report\n\n");

    // Metadata
    md.push_str("| Field | Value |\n|---|---|\n");
    md.push_str(&format!("| **Risk** | {} (`{}`) |\n", report.risk_title, report.risk_id));
    md.push_str(&format!("| **Framework** | {} |\n", report.framework));
    md.push_str(&format!(
        "| **Score** | **{:.1}** / 25 |\n",
        report.score.score
    ));
    md.push_str(&format!("| **Risk Level** | {} |\n", level_badge(report.risk_level)));
    md.push_str(&format!(
        "| **Confidence** | {:.0}% |\n",
        report.score.confidence * 100.0
    ));
    md.push_str(&format!("| **Assessor** | {} |\n", report.assessor));
    md.push_str(&format!(
        "| **Generated** | {} |\n",
        report.generated_at.format("%Y-%m-%d %H:%M UTC")
    ));
    md.push_str(&format!("| **Duration** | {}ms |\n", report.duration_ms));
    md.push_str(&format!("| **Engine Version** | {} |\n\n", report.engine_version));

    // Executive summary
    md.push_str("## Executive Summary\n\n");
    md.push_str(&report.executive_summary);
    md.push_str("\n\n");

    // Methodology
    md.push_str("## Methodology\n\n");
    md.push_str(&report.methodology);
    md.push_str("\n\n");

    // Findings
    md.push_str("## Findings\n\n");
    md.push_str("| Impact | Finding | Detail |\n|---|---|---|\n");
    for finding in &report.findings {
        md.push_str(&format!(
            "| {} | {} | {} |\n",
            level_badge(finding.impact),
            finding.title,
            finding.description.replace('\n', " ")
        ));
    }
    md.push('\n');

    // Recommendations
    md.push_str("## Recommendations\n\n");
    md.push_str("| Priority | Type | Recommendation |\n|---|---|---|\n");
    for rec in &report.recommendations {
        md.push_str(&format!(
            "| {} | {:?} | {} |\n",
            level_badge(rec.priority),
            rec.recommendation_type,
            rec.description.replace('\n', " ")
        ));
    }
    md.push('\n');

    // Action plan
    if !report.action_plan.is_empty() {
        md.push_str("## Action Plan\n\n");
        for (i, item) in report.action_plan.iter().enumerate() {
            md.push_str(&format!("{}. {} — *{}*\n", i + 1, item.step, item.timeframe));
        }
        md.push('\n');
    }

    // Monitoring plan
    if !report.monitoring_plan.is_empty() {
        md.push_str("## Monitoring Plan\n\n");
        for item in &report.monitoring_plan {
            md.push_str(&format!("- {}\n", item));
        }
        md.push('\n');
    }

    // Quantitative analysis
    if let Some(q) = &report.quantitative_analysis {
        let s = &q.simulation;
        md.push_str("## Quantitative Analysis\n\n");
        md.push_str(&q.narrative);
        md.push_str("\n\n| Statistic | Value |\n|---|---:|\n");
        md.push_str(&format!("| Expected value | {:.2} |\n", s.expected_value));
        md.push_str(&format!("| Standard deviation | {:.2} |\n", s.standard_deviation));
        md.push_str(&format!("| Variance | {:.2} |\n", s.variance));
        md.push_str(&format!("| Iterations | {} |\n", s.iterations));
        for ci in &s.confidence_intervals {
            md.push_str(&format!(
                "| {:.0}% interval | [{:.2}, {:.2}] |\n",
                ci.level * 100.0,
                ci.lower,
                ci.upper
            ));
        }
        for var in &s.value_at_risk {
            md.push_str(&format!(
                "| VaR {:.0}% | {:.2} |\n",
                var.level * 100.0,
                var.value
            ));
        }
        md.push('\n');
    }

    // Correlation
    if let Some(c) = &report.correlation {
        md.push_str("## Correlation Analysis\n\n");
        md.push_str(&format!(
            "Network density {:.2}, clustering {:.2}, systemic exposure {} ({:.2}).\n\n",
            c.network_metrics.density,
            c.network_metrics.clustering,
            c.systemic_risk.level,
            c.systemic_risk.score
        ));
        if !c.pairs.is_empty() {
            md.push_str("| Pair | Type | Strength | Confidence |\n|---|---|---:|---:|\n");
            for pair in &c.pairs {
                md.push_str(&format!(
                    "| `{}` ↔ `{}` | {} | {:.2} | {:.2} |\n",
                    pair.risk1_id,
                    pair.risk2_id,
                    pair.correlation_type,
                    pair.strength,
                    pair.confidence
                ));
            }
            md.push('\n');
        }
    }

    // Qualitative analysis
    md.push_str("## Qualitative Analysis\n\n");
    md.push_str(&report.qualitative_analysis);
    md.push('\n');

    Ok(md)
}

fn level_badge(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::Low => "🟢 low",
        RiskLevel::Medium => "🟡 medium",
        RiskLevel::High => "🟠 high",
        RiskLevel::Critical => "🔴 critical",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{AssessOptions, VerisEngine};
    use crate::model::{Risk, RiskCategory};
    use crate::scoring::Framework;

    fn sample_report() -> AssessmentReport {
        let risk = Risk::new(
            "r-9",
            "Cloud concentration",
            "Single-provider outage halts all customer-facing services",
            RiskCategory::Technology,
            4,
            5,
        );
        VerisEngine::default()
            .assess(&risk, Framework::Coso, &AssessOptions::default())
            .unwrap()
    }

    #[test]
    fn test_markdown_contains_core_sections() {
        let md = render(&sample_report()).unwrap();
        assert!(md.contains("# Veris Risk Assessment Report"));
        assert!(md.contains("## Executive Summary"));
        assert!(md.contains("## Findings"));
        assert!(md.contains("## Recommendations"));
        assert!(md.contains("Cloud concentration"));
    }

    #[test]
    fn test_markdown_shows_level_badge() {
        let md = render(&sample_report()).unwrap();
        assert!(md.contains("critical"), "a 4×5 risk renders as critical");
    }
}
