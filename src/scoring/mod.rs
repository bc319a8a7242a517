//! Deterministic risk scoring — framework-tagged likelihood × impact
//!
//! Computes a context-adjusted score and a confidence estimate for a single
//! risk. Degenerate inputs (missing text, zero ratings) are never rejected;
//! they are floored to usable defaults, flagged with a `data_quality`
//! factor, and penalized in confidence. The permissiveness contract matters:
//! callers rely on always getting a usable score back.

use crate::model::Risk;
use crate::{VerisError, VerisResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

// ─── Framework ──────────────────────────────────────────────────────

/// Named scoring methodology. Tags the output and varies the qualitative
/// narrative; the core arithmetic is identical across all three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Framework {
    Coso,
    Iso31000,
    Nist,
}

impl Framework {
    pub const ALL: &'static [Framework] = &[Self::Coso, Self::Iso31000, Self::Nist];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Coso => "coso",
            Self::Iso31000 => "iso31000",
            Self::Nist => "nist",
        }
    }
}

impl std::fmt::Display for Framework {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Framework {
    type Err = VerisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "coso" => Ok(Self::Coso),
            "iso31000" => Ok(Self::Iso31000),
            "nist" => Ok(Self::Nist),
            other => Err(VerisError::InvalidArgument(format!(
                "unknown framework '{}' (expected coso, iso31000, or nist)",
                other
            ))),
        }
    }
}

// ─── Scoring Context ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrganizationSize {
    Small,
    Medium,
    Large,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTolerance {
    Low,
    Medium,
    High,
}

/// Optional per-call modifiers. Every field has a neutral default; an empty
/// context produces the unadjusted base score.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoringContext {
    /// Industry the organization operates in (free text, keyword-matched)
    pub industry: Option<String>,
    pub organization_size: Option<OrganizationSize>,
    pub risk_tolerance: Option<RiskTolerance>,
    /// Prior observed scores for this risk or its peers
    #[serde(default)]
    pub historical_scores: Vec<f64>,
    /// Controls the caller knows about beyond those on the risk record
    #[serde(default)]
    pub controls: Vec<String>,
}

impl ScoringContext {
    fn is_empty(&self) -> bool {
        self.industry.is_none()
            && self.organization_size.is_none()
            && self.risk_tolerance.is_none()
            && self.historical_scores.is_empty()
            && self.controls.is_empty()
    }
}

// ─── Score Result ───────────────────────────────────────────────────

/// One named contribution to the final score or confidence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringFactor {
    pub name: String,
    /// Multiplier applied to the base score (1.0 = neutral)
    pub weight: f64,
    pub detail: String,
}

/// Output of one scoring call. Never mutated after return.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Context-adjusted score, clamped to [1, 25]
    pub score: f64,
    /// Effective likelihood after the minimum-rating floor, in [1,5]
    pub likelihood: u32,
    /// Effective impact after the minimum-rating floor, in [1,5]
    pub impact: u32,
    /// Confidence in the score, clamped to [0,1]
    pub confidence: f64,
    pub factors: Vec<ScoringFactor>,
    /// Echoes the framework argument verbatim
    pub methodology: Framework,
}

// ─── Scorer ─────────────────────────────────────────────────────────

const BASELINE_CONFIDENCE: f64 = 0.5;

/// Score a risk under the given framework.
///
/// Pure: identical inputs always produce identical output. Degenerate risk
/// data lowers confidence instead of erroring.
pub fn score(
    risk: &Risk,
    framework: Framework,
    context: Option<&ScoringContext>,
) -> VerisResult<ScoreResult> {
    let likelihood = risk.effective_likelihood();
    let impact = risk.effective_impact();
    let base = (likelihood * impact) as f64;

    let mut factors = vec![ScoringFactor {
        name: "likelihood_impact".into(),
        weight: 1.0,
        detail: format!("base score {} × {} = {}", likelihood, impact, base),
    }];

    let mut adjusted = base;
    let mut confidence = BASELINE_CONFIDENCE;

    // ── Context adjustments ──
    if let Some(ctx) = context.filter(|c| !c.is_empty()) {
        if let Some(industry) = &ctx.industry {
            let weight = industry_multiplier(industry);
            adjusted *= weight;
            confidence += 0.08;
            factors.push(ScoringFactor {
                name: "industry_adjustment".into(),
                weight,
                detail: format!("industry '{}' multiplier {:.2}", industry, weight),
            });
        }

        if let Some(size) = ctx.organization_size {
            let weight = match size {
                OrganizationSize::Small => 0.95,
                OrganizationSize::Medium => 1.0,
                OrganizationSize::Large => 1.05,
            };
            adjusted *= weight;
            confidence += 0.05;
            factors.push(ScoringFactor {
                name: "organization_size".into(),
                weight,
                detail: format!("{:?} organization multiplier {:.2}", size, weight),
            });
        }

        if let Some(tolerance) = ctx.risk_tolerance {
            let weight = match tolerance {
                RiskTolerance::Low => 1.10,
                RiskTolerance::Medium => 1.0,
                RiskTolerance::High => 0.90,
            };
            adjusted *= weight;
            confidence += 0.05;
            factors.push(ScoringFactor {
                name: "risk_tolerance".into(),
                weight,
                detail: format!("{:?} tolerance multiplier {:.2}", tolerance, weight),
            });
        }

        let historical: Vec<f64> = ctx
            .historical_scores
            .iter()
            .copied()
            .filter(|s| s.is_finite())
            .collect();
        if !historical.is_empty() {
            // Blend toward the historical mean; constant per call, so score
            // monotonicity across risks is preserved.
            let mean = historical.iter().sum::<f64>() / historical.len() as f64;
            let mean = mean.clamp(1.0, 25.0);
            adjusted = 0.85 * adjusted + 0.15 * mean;
            confidence += 0.07 + 0.01 * (historical.len().min(5) as f64);
            factors.push(ScoringFactor {
                name: "historical_data".into(),
                weight: 0.15,
                detail: format!(
                    "{} historical samples, mean {:.1}",
                    historical.len(),
                    mean
                ),
            });
        }

        if !ctx.controls.is_empty() {
            confidence += 0.05;
            factors.push(ScoringFactor {
                name: "associated_controls".into(),
                weight: 1.0,
                detail: format!("{} controls documented", ctx.controls.len()),
            });
        }
    }

    if !risk.controls.is_empty() {
        confidence += 0.03;
    }

    // ── Data quality penalties ──
    let mut quality_issues: Vec<&str> = Vec::new();
    if risk.likelihood < 1 {
        confidence -= 0.15;
        quality_issues.push("likelihood defaulted to minimum");
    }
    if risk.impact < 1 {
        confidence -= 0.15;
        quality_issues.push("impact defaulted to minimum");
    }
    if risk.title.trim().is_empty() {
        confidence -= 0.08;
        quality_issues.push("empty title");
    }
    if risk.description.trim().is_empty() {
        confidence -= 0.08;
        quality_issues.push("empty description");
    }
    if !quality_issues.is_empty() {
        factors.push(ScoringFactor {
            name: "data_quality".into(),
            weight: 1.0,
            detail: quality_issues.join("; "),
        });
    }

    let result = ScoreResult {
        score: adjusted.clamp(1.0, 25.0),
        likelihood,
        impact,
        confidence: confidence.clamp(0.0, 1.0),
        factors,
        methodology: framework,
    };

    tracing::debug!(
        risk_id = %risk.id,
        framework = %framework,
        score = result.score,
        confidence = result.confidence,
        "scored risk"
    );

    Ok(result)
}

/// Regulated and high-exposure industries score slightly hotter.
fn industry_multiplier(industry: &str) -> f64 {
    let lower = industry.to_ascii_lowercase();
    const REGULATED: &[&str] = &[
        "finance", "financial", "bank", "insurance", "health", "pharma", "energy",
    ];
    const ELEVATED: &[&str] = &["technology", "software", "telecom", "defense"];

    if REGULATED.iter().any(|kw| lower.contains(kw)) {
        1.10
    } else if ELEVATED.iter().any(|kw| lower.contains(kw)) {
        1.05
    } else {
        1.0
    }
}
