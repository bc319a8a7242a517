//! # Veris Engine — Assessment Orchestrator
//!
//! Assembles a complete assessment report for one risk:
//!
//! 1. Deterministic scoring (always)
//! 2. Monte Carlo simulation (when requested)
//! 3. Correlation analysis over related risks (when requested and available)
//! 4. Findings, recommendations, action plan, and monitoring plan synthesis
//!
//! Each call is stateless and independent; batches can run concurrently.

use crate::correlation::{self, CorrelationAnalysis, CorrelationOptions};
use crate::model::{Risk, RiskLevel};
use crate::scoring::{self, Framework, ScoreResult, ScoringContext};
use crate::simulation::{self, SimulationParameters, SimulationResult, DEFAULT_ITERATIONS};
use crate::VerisResult;
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Configuration ─────────────────────────────────────────────────

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Name recorded as the assessor on generated reports
    pub assessor: String,
    /// Iteration count used when the caller supplies no simulation parameters
    pub default_iterations: usize,
    /// Options passed through to the correlation analyzer
    pub correlation: CorrelationOptions,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            assessor: "veris-engine".into(),
            default_iterations: DEFAULT_ITERATIONS,
            correlation: CorrelationOptions::default(),
        }
    }
}

/// Per-assessment options with documented defaults (everything off)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssessOptions {
    /// Run the Monte Carlo simulator and embed a quantitative section
    pub include_quantitative: bool,
    /// Run correlation analysis over `related_risks` (skipped when empty)
    pub include_correlation: bool,
    /// Scoring context modifiers
    pub context: Option<ScoringContext>,
    /// Explicit simulation parameters; defaults derive from the risk ratings
    pub simulation: Option<SimulationParameters>,
    /// Peer risks for the correlation section
    #[serde(default)]
    pub related_risks: Vec<Risk>,
}

// ─── Report types ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub title: String,
    pub description: String,
    pub impact: RiskLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationType {
    Mitigation,
    Monitoring,
    Transfer,
    Acceptance,
    Contingency,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub description: String,
    pub priority: RiskLevel,
    pub recommendation_type: RecommendationType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionItem {
    pub step: String,
    pub timeframe: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuantitativeAnalysis {
    pub simulation: SimulationResult,
    pub narrative: String,
}

/// Complete assessment report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentReport {
    pub id: Uuid,
    pub risk_id: String,
    pub risk_title: String,
    pub framework: Framework,
    pub assessor: String,
    pub generated_at: DateTime<Utc>,
    pub executive_summary: String,
    pub methodology: String,
    pub score: ScoreResult,
    pub risk_level: RiskLevel,
    pub findings: Vec<Finding>,
    pub recommendations: Vec<Recommendation>,
    pub action_plan: Vec<ActionItem>,
    pub monitoring_plan: Vec<String>,
    pub qualitative_analysis: String,
    pub quantitative_analysis: Option<QuantitativeAnalysis>,
    pub correlation: Option<CorrelationAnalysis>,
    pub duration_ms: u64,
    pub engine_version: String,
}

// ─── Engine ────────────────────────────────────────────────────────

/// The Veris assessment engine
pub struct VerisEngine {
    config: EngineConfig,
}

impl VerisEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Assess a single risk — scoring, optional simulation, optional
    /// correlation, and report assembly.
    pub fn assess(
        &self,
        risk: &Risk,
        framework: Framework,
        options: &AssessOptions,
    ) -> VerisResult<AssessmentReport> {
        let start = std::time::Instant::now();
        tracing::info!(risk_id = %risk.id, %framework, "assessment started");

        // ── Step 1: deterministic score ──
        let score = scoring::score(risk, framework, options.context.as_ref())?;
        let risk_level = risk.risk_level();

        // ── Step 2: quantitative section (optional) ──
        let quantitative_analysis = if options.include_quantitative {
            let params = options.simulation.clone().unwrap_or_else(|| {
                let mut p = SimulationParameters::for_risk(risk);
                p.iterations = self.config.default_iterations;
                p
            });
            let simulation = simulation::simulate(risk, &params)?;
            tracing::info!(
                risk_id = %risk.id,
                expected_value = simulation.expected_value,
                iterations = simulation.iterations,
                "quantitative analysis complete"
            );
            let narrative = quantitative_narrative(&simulation);
            Some(QuantitativeAnalysis { simulation, narrative })
        } else {
            None
        };

        // ── Step 3: correlation section (optional, omitted without peers) ──
        let correlation = if options.include_correlation && !options.related_risks.is_empty() {
            let mut set = Vec::with_capacity(options.related_risks.len() + 1);
            set.push(risk.clone());
            set.extend(options.related_risks.iter().cloned());
            Some(correlation::analyze(&set, &self.config.correlation))
        } else {
            None
        };

        // ── Step 4: synthesize findings and recommendations ──
        let findings = build_findings(risk, &score, risk_level, correlation.as_ref());
        let recommendations =
            build_recommendations(risk, &score, risk_level, quantitative_analysis.as_ref());
        let action_plan = build_action_plan(&recommendations);
        let monitoring_plan = build_monitoring_plan(risk, risk_level);

        let executive_summary = executive_summary(
            risk,
            &score,
            risk_level,
            quantitative_analysis.as_ref(),
            correlation.as_ref(),
        );
        let qualitative_analysis = qualitative_analysis(&score);

        let duration_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            risk_id = %risk.id,
            score = score.score,
            level = %risk_level,
            findings = findings.len(),
            recommendations = recommendations.len(),
            duration_ms,
            "assessment complete"
        );

        Ok(AssessmentReport {
            id: Uuid::new_v4(),
            risk_id: risk.id.clone(),
            risk_title: risk.title.clone(),
            framework,
            assessor: self.config.assessor.clone(),
            generated_at: Utc::now(),
            executive_summary,
            methodology: methodology_text(framework),
            score,
            risk_level,
            findings,
            recommendations,
            action_plan,
            monitoring_plan,
            qualitative_analysis,
            quantitative_analysis,
            correlation,
            duration_ms,
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }

    /// Assess a batch of risks in parallel with shared options.
    pub fn assess_batch(
        &self,
        risks: &[Risk],
        framework: Framework,
        options: &AssessOptions,
    ) -> Vec<VerisResult<AssessmentReport>> {
        risks
            .par_iter()
            .map(|risk| self.assess(risk, framework, options))
            .collect()
    }
}

impl Default for VerisEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

// ─── Synthesis helpers ─────────────────────────────────────────────

fn build_findings(
    risk: &Risk,
    score: &ScoreResult,
    risk_level: RiskLevel,
    correlation: Option<&CorrelationAnalysis>,
) -> Vec<Finding> {
    let mut findings = Vec::new();

    // Non-trivial risks always produce an actionable finding
    if score.likelihood >= 4 || score.impact >= 4 || risk_level >= RiskLevel::High {
        findings.push(Finding {
            title: "Elevated inherent exposure".into(),
            description: format!(
                "'{}' scores {:.1}/25 ({} likelihood × {} impact), placing it in the {} band.",
                risk.title, score.score, score.likelihood, score.impact, risk_level
            ),
            impact: risk_level.max(RiskLevel::Medium),
        });
    }

    if risk.category.is_compliance_like() {
        findings.push(Finding {
            title: "Regulatory exposure".into(),
            description: format!(
                "The {} category carries regulatory and enforcement exposure independent of score.",
                risk.category
            ),
            impact: risk_level.max(RiskLevel::Medium),
        });
    }

    if score.factors.iter().any(|f| f.name.contains("data_quality")) {
        findings.push(Finding {
            title: "Incomplete risk data".into(),
            description:
                "One or more ratings or descriptive fields were missing and defaulted; \
                 the score understates uncertainty until the record is completed."
                    .into(),
            impact: RiskLevel::Medium,
        });
    } else if score.confidence < 0.5 {
        findings.push(Finding {
            title: "Limited assessment confidence".into(),
            description: format!(
                "Confidence is {:.2}; supply industry context, historical data, or control \
                 information to firm up the estimate.",
                score.confidence
            ),
            impact: RiskLevel::Low,
        });
    }

    if let Some(analysis) = correlation {
        if analysis.systemic_risk.level >= RiskLevel::High {
            findings.push(Finding {
                title: "Systemic concentration".into(),
                description: format!(
                    "Correlation analysis places systemic exposure at {} (score {:.2}); drivers: {}.",
                    analysis.systemic_risk.level,
                    analysis.systemic_risk.score,
                    if analysis.systemic_risk.drivers.is_empty() {
                        "none identified".to_string()
                    } else {
                        analysis.systemic_risk.drivers.join(", ")
                    }
                ),
                impact: analysis.systemic_risk.level,
            });
        }
    }

    if findings.is_empty() {
        findings.push(Finding {
            title: "Exposure within tolerance".into(),
            description: format!(
                "'{}' scores {:.1}/25 in the {} band; no immediate action indicated.",
                risk.title, score.score, risk_level
            ),
            impact: RiskLevel::Low,
        });
    }

    findings
}

fn build_recommendations(
    risk: &Risk,
    score: &ScoreResult,
    risk_level: RiskLevel,
    quantitative: Option<&QuantitativeAnalysis>,
) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    if risk.category.is_compliance_like() {
        recommendations.push(Recommendation {
            description: format!(
                "Implement compliance controls addressing '{}' and map them to the applicable \
                 regulatory requirements; document evidence for audit.",
                risk.title
            ),
            priority: risk_level.max(RiskLevel::Medium),
            recommendation_type: RecommendationType::Mitigation,
        });
    }

    match risk_level {
        RiskLevel::Critical | RiskLevel::High => {
            recommendations.push(Recommendation {
                description: format!(
                    "Design and deploy additional mitigating controls for '{}'; assign an owner \
                     and track residual score toward the {} band or below.",
                    risk.title,
                    RiskLevel::Medium
                ),
                priority: risk_level,
                recommendation_type: RecommendationType::Mitigation,
            });
            recommendations.push(Recommendation {
                description: "Evaluate risk transfer (insurance, contractual) for the \
                              residual exposure."
                    .into(),
                priority: RiskLevel::Medium,
                recommendation_type: RecommendationType::Transfer,
            });
        }
        RiskLevel::Medium => {
            recommendations.push(Recommendation {
                description: format!(
                    "Monitor '{}' against its key indicators and reassess next cycle.",
                    risk.title
                ),
                priority: RiskLevel::Medium,
                recommendation_type: RecommendationType::Monitoring,
            });
        }
        RiskLevel::Low => {
            recommendations.push(Recommendation {
                description: "Accept the risk at current exposure and record the decision.".into(),
                priority: RiskLevel::Low,
                recommendation_type: RecommendationType::Acceptance,
            });
        }
    }

    if score.factors.iter().any(|f| f.name.contains("data_quality")) {
        recommendations.push(Recommendation {
            description: "Complete the risk record (ratings, title, description) to raise \
                          assessment confidence."
                .into(),
            priority: RiskLevel::Medium,
            recommendation_type: RecommendationType::Monitoring,
        });
    }

    // Volatile simulated outcomes warrant a contingency posture
    if let Some(q) = quantitative {
        let s = &q.simulation;
        if s.expected_value > 0.0 && s.standard_deviation / s.expected_value > 0.5 {
            recommendations.push(Recommendation {
                description: format!(
                    "Simulated outcomes are volatile (σ {:.1} against mean {:.1}); prepare a \
                     contingency plan for the tail scenario.",
                    s.standard_deviation, s.expected_value
                ),
                priority: RiskLevel::Medium,
                recommendation_type: RecommendationType::Contingency,
            });
        }
    }

    recommendations
}

fn build_action_plan(recommendations: &[Recommendation]) -> Vec<ActionItem> {
    recommendations
        .iter()
        .map(|rec| ActionItem {
            step: rec.description.clone(),
            timeframe: match rec.priority {
                RiskLevel::Critical => "immediate (0–30 days)".into(),
                RiskLevel::High => "30–60 days".into(),
                RiskLevel::Medium => "60–90 days".into(),
                RiskLevel::Low => "next review cycle".into(),
            },
        })
        .collect()
}

fn build_monitoring_plan(risk: &Risk, risk_level: RiskLevel) -> Vec<String> {
    let cadence = match risk_level {
        RiskLevel::Critical => "weekly",
        RiskLevel::High => "monthly",
        RiskLevel::Medium => "quarterly",
        RiskLevel::Low => "annually",
    };
    vec![
        format!("Review '{}' {} with the risk owner.", risk.title, cadence),
        format!(
            "Track key indicators for the {} category and alert on threshold breach.",
            risk.category
        ),
        "Re-run the assessment after any control change or incident.".into(),
    ]
}

fn executive_summary(
    risk: &Risk,
    score: &ScoreResult,
    risk_level: RiskLevel,
    quantitative: Option<&QuantitativeAnalysis>,
    correlation: Option<&CorrelationAnalysis>,
) -> String {
    let mut summary = format!(
        "'{}' ({} risk) is assessed at {:.1}/25 — {} — with {:.0}% confidence under the {} methodology.",
        risk.title,
        risk.category,
        score.score,
        risk_level,
        score.confidence * 100.0,
        score.methodology,
    );
    if let Some(q) = quantitative {
        summary.push_str(&format!(
            " Monte Carlo simulation over {} trials projects an expected value of {:.1} (σ {:.1}).",
            q.simulation.iterations, q.simulation.expected_value, q.simulation.standard_deviation
        ));
    }
    if let Some(c) = correlation {
        summary.push_str(&format!(
            " Correlation analysis over {} linked risks rates systemic exposure {}.",
            c.clusters.iter().map(|cl| cl.risk_ids.len()).sum::<usize>(),
            c.systemic_risk.level
        ));
    }
    summary
}

fn quantitative_narrative(simulation: &SimulationResult) -> String {
    let p95 = simulation
        .distribution
        .percentiles
        .get("95")
        .copied()
        .unwrap_or(simulation.expected_value);
    format!(
        "Across {} trials the risk value averages {:.1} with standard deviation {:.1}; \
         95% of outcomes fall at or below {:.1} over a {}-day horizon.",
        simulation.iterations,
        simulation.expected_value,
        simulation.standard_deviation,
        p95,
        simulation.time_horizon_days
    )
}

fn qualitative_analysis(score: &ScoreResult) -> String {
    let mut text = String::from("Scoring factors considered: ");
    let parts: Vec<String> = score
        .factors
        .iter()
        .map(|f| format!("{} ({})", f.name, f.detail))
        .collect();
    text.push_str(&parts.join("; "));
    text.push('.');
    text
}

fn methodology_text(framework: Framework) -> String {
    match framework {
        Framework::Coso => {
            "COSO ERM: likelihood × impact rating against objectives, adjusted for \
             entity-level context (industry, size, risk appetite)."
        }
        Framework::Iso31000 => {
            "ISO 31000:2018: risk analysis via consequence and likelihood estimation \
             within the organization's established context."
        }
        Framework::Nist => {
            "NIST SP 800-30: threat likelihood and impact assessment producing a \
             banded risk determination."
        }
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RiskCategory;

    fn make_risk(likelihood: i32, impact: i32, category: RiskCategory) -> Risk {
        Risk::new(
            "r-100",
            "Ransomware incident",
            "Ransomware encrypts production systems causing extended downtime",
            category,
            likelihood,
            impact,
        )
    }

    #[test]
    fn test_severe_risk_produces_actionable_report() {
        let engine = VerisEngine::default();
        let risk = make_risk(5, 5, RiskCategory::Technology);
        let report = engine
            .assess(&risk, Framework::Coso, &AssessOptions::default())
            .unwrap();

        assert!(!report.findings.is_empty());
        assert!(
            report.findings.iter().any(|f| f.impact >= RiskLevel::High),
            "severe risk must carry a high/critical finding"
        );
        assert!(!report.recommendations.is_empty());
        assert!(
            report
                .recommendations
                .iter()
                .any(|r| r.priority >= RiskLevel::High),
            "severe risk must carry a high/critical recommendation"
        );
        assert!(!report.action_plan.is_empty());
        assert!(!report.monitoring_plan.is_empty());
    }

    #[test]
    fn test_compliance_risk_gets_mitigation_recommendation() {
        let engine = VerisEngine::default();
        let risk = make_risk(3, 3, RiskCategory::Compliance);
        let report = engine
            .assess(&risk, Framework::Iso31000, &AssessOptions::default())
            .unwrap();

        let mitigation = report
            .recommendations
            .iter()
            .find(|r| r.recommendation_type == RecommendationType::Mitigation)
            .expect("compliance risk must get a mitigation recommendation");
        assert!(
            mitigation.description.contains("regulatory")
                || mitigation.description.contains("compliance"),
            "mitigation text should reference regulatory language: {}",
            mitigation.description
        );
    }

    #[test]
    fn test_quantitative_section_only_when_requested() {
        let engine = VerisEngine::default();
        let risk = make_risk(4, 3, RiskCategory::Operational);

        let without = engine
            .assess(&risk, Framework::Nist, &AssessOptions::default())
            .unwrap();
        assert!(without.quantitative_analysis.is_none());

        let options = AssessOptions {
            include_quantitative: true,
            simulation: Some(SimulationParameters {
                seed: Some(9),
                iterations: 2_000,
                ..SimulationParameters::for_risk(&risk)
            }),
            ..Default::default()
        };
        let with = engine.assess(&risk, Framework::Nist, &options).unwrap();
        let q = with.quantitative_analysis.expect("quantitative section requested");
        assert!(q.simulation.expected_value.is_finite());
        assert!(!q.narrative.is_empty());
    }

    #[test]
    fn test_correlation_omitted_without_related_risks() {
        let engine = VerisEngine::default();
        let risk = make_risk(3, 4, RiskCategory::Technology);
        let options = AssessOptions { include_correlation: true, ..Default::default() };
        let report = engine.assess(&risk, Framework::Coso, &options).unwrap();
        // No peers available: the section is omitted, not an error
        assert!(report.correlation.is_none());
    }

    #[test]
    fn test_correlation_included_with_related_risks() {
        let engine = VerisEngine::default();
        let risk = make_risk(4, 4, RiskCategory::Technology);
        let peer = Risk::new(
            "r-101",
            "Datacenter outage",
            "Extended downtime after infrastructure failure",
            RiskCategory::Technology,
            3,
            4,
        );
        let options = AssessOptions {
            include_correlation: true,
            related_risks: vec![peer],
            ..Default::default()
        };
        let report = engine.assess(&risk, Framework::Coso, &options).unwrap();
        let analysis = report.correlation.expect("correlation section requested");
        assert!(!analysis.clusters.is_empty());
    }

    #[test]
    fn test_framework_tags_report() {
        let engine = VerisEngine::default();
        let risk = make_risk(2, 2, RiskCategory::Financial);
        for &fw in Framework::ALL {
            let report = engine.assess(&risk, fw, &AssessOptions::default()).unwrap();
            assert_eq!(report.framework, fw);
            assert_eq!(report.score.methodology, fw);
            assert!(!report.methodology.is_empty());
        }
    }

    #[test]
    fn test_low_risk_still_reports() {
        let engine = VerisEngine::default();
        let risk = make_risk(1, 1, RiskCategory::Operational);
        let report = engine
            .assess(&risk, Framework::Coso, &AssessOptions::default())
            .unwrap();
        assert!(!report.findings.is_empty());
        assert!(report
            .recommendations
            .iter()
            .any(|r| r.recommendation_type == RecommendationType::Acceptance));
    }

    #[test]
    fn test_batch_assessment() {
        let engine = VerisEngine::default();
        let risks: Vec<Risk> = (1..=10)
            .map(|i| make_risk((i % 5) + 1, ((i + 2) % 5) + 1, RiskCategory::Operational))
            .collect();
        let reports = engine.assess_batch(&risks, Framework::Nist, &AssessOptions::default());
        assert_eq!(reports.len(), 10);
        for report in reports {
            assert!(report.is_ok());
        }
    }
}
