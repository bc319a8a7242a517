//! Risk domain model — categories, ratings, statuses, and level banding
//!
//! A `Risk` carries its likelihood and impact ratings as caller-supplied
//! integers; score and level are always derived from them, never stored.
//! Degenerate ratings (zero, negative) are tolerated and floored to the
//! minimum rating rather than rejected — downstream scoring penalizes
//! confidence instead.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Minimum and maximum rating on the 5-point likelihood/impact scale
pub const MIN_RATING: u32 = 1;
pub const MAX_RATING: u32 = 5;

// ─── Category ───────────────────────────────────────────────────────

/// Business category of a risk register entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    Technology,
    Financial,
    Compliance,
    Operational,
    Strategic,
    Reputational,
    Legal,
}

impl RiskCategory {
    /// Categories carrying regulatory exposure — these always receive a
    /// mitigation recommendation in assembled reports.
    pub fn is_compliance_like(&self) -> bool {
        matches!(self, Self::Compliance | Self::Legal)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Technology => "technology",
            Self::Financial => "financial",
            Self::Compliance => "compliance",
            Self::Operational => "operational",
            Self::Strategic => "strategic",
            Self::Reputational => "reputational",
            Self::Legal => "legal",
        }
    }
}

impl std::fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ─── Status ─────────────────────────────────────────────────────────

/// Lifecycle status of a risk entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskStatus {
    Identified,
    Assessed,
    Mitigating,
    Monitored,
    Closed,
}

// ─── Risk Level ─────────────────────────────────────────────────────

/// Banded severity derived from the 1–25 risk score
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Band a 1–25 likelihood × impact score into a level.
    ///
    /// Bands are monotonic and non-overlapping: low 1–2, medium 3–5,
    /// high 6–9, critical 10–25.
    pub fn from_score(score: u32) -> Self {
        match score {
            0..=2 => Self::Low,
            3..=5 => Self::Medium,
            6..=9 => Self::High,
            _ => Self::Critical,
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

// ─── Risk Record ────────────────────────────────────────────────────

/// A single risk register entry.
///
/// `likelihood` and `impact` are signed so that degraded caller data
/// (zero, negative) survives deserialization; the `effective_*` accessors
/// apply the minimum-rating floor used everywhere downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Risk {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: RiskCategory,
    /// Probability rating, intended range 1–5
    pub likelihood: i32,
    /// Severity rating, intended range 1–5
    pub impact: i32,
    pub status: RiskStatus,
    pub organization_id: String,
    pub created_by: String,
    /// Names of controls already associated with this risk
    #[serde(default)]
    pub controls: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Risk {
    /// Construct a risk with the given ratings; remaining fields default.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        category: RiskCategory,
        likelihood: i32,
        impact: i32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            category,
            likelihood,
            impact,
            status: RiskStatus::Identified,
            organization_id: String::new(),
            created_by: String::new(),
            controls: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Likelihood clamped to [1,5]; out-of-range values floor to 1.
    pub fn effective_likelihood(&self) -> u32 {
        clamp_rating(self.likelihood)
    }

    /// Impact clamped to [1,5]; out-of-range values floor to 1.
    pub fn effective_impact(&self) -> u32 {
        clamp_rating(self.impact)
    }

    /// Derived score: effective likelihood × effective impact, range 1–25.
    pub fn risk_score(&self) -> u32 {
        self.effective_likelihood() * self.effective_impact()
    }

    /// Derived level banding of `risk_score`.
    pub fn risk_level(&self) -> RiskLevel {
        RiskLevel::from_score(self.risk_score())
    }

    /// True when either rating needed the minimum-rating floor.
    pub fn has_degenerate_rating(&self) -> bool {
        self.likelihood < MIN_RATING as i32 || self.impact < MIN_RATING as i32
    }

    /// True when title or description carries no information.
    pub fn has_degenerate_text(&self) -> bool {
        self.title.trim().is_empty() || self.description.trim().is_empty()
    }
}

fn clamp_rating(raw: i32) -> u32 {
    if raw < MIN_RATING as i32 {
        MIN_RATING
    } else {
        (raw as u32).min(MAX_RATING)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn risk_with_ratings(likelihood: i32, impact: i32) -> Risk {
        Risk::new(
            "r-1",
            "Server outage",
            "Primary database cluster becomes unavailable",
            RiskCategory::Technology,
            likelihood,
            impact,
        )
    }

    #[test]
    fn test_score_is_product_of_ratings() {
        assert_eq!(risk_with_ratings(3, 4).risk_score(), 12);
        assert_eq!(risk_with_ratings(5, 5).risk_score(), 25);
        assert_eq!(risk_with_ratings(1, 1).risk_score(), 1);
    }

    #[test]
    fn test_level_banding_fixtures() {
        assert_eq!(risk_with_ratings(1, 1).risk_level(), RiskLevel::Low);
        assert_eq!(risk_with_ratings(2, 2).risk_level(), RiskLevel::Medium);
        assert_eq!(risk_with_ratings(3, 3).risk_level(), RiskLevel::High);
        assert_eq!(risk_with_ratings(4, 4).risk_level(), RiskLevel::Critical);
        assert_eq!(risk_with_ratings(5, 5).risk_level(), RiskLevel::Critical);
    }

    #[test]
    fn test_banding_is_monotonic() {
        let mut prev = RiskLevel::Low;
        for score in 1..=25u32 {
            let level = RiskLevel::from_score(score);
            assert!(level >= prev, "level regressed at score {}", score);
            prev = level;
        }
    }

    #[test]
    fn test_degenerate_ratings_floor_to_one() {
        let r = risk_with_ratings(0, -3);
        assert_eq!(r.effective_likelihood(), 1);
        assert_eq!(r.effective_impact(), 1);
        assert_eq!(r.risk_score(), 1);
        assert!(r.has_degenerate_rating());
    }

    #[test]
    fn test_oversized_ratings_cap_at_five() {
        let r = risk_with_ratings(9, 7);
        assert_eq!(r.risk_score(), 25);
        assert!(!r.has_degenerate_rating());
    }

    #[test]
    fn test_degenerate_text_detection() {
        let mut r = risk_with_ratings(3, 3);
        assert!(!r.has_degenerate_text());
        r.title = "   ".into();
        assert!(r.has_degenerate_text());
    }

    #[test]
    fn test_compliance_like_categories() {
        assert!(RiskCategory::Compliance.is_compliance_like());
        assert!(RiskCategory::Legal.is_compliance_like());
        assert!(!RiskCategory::Technology.is_compliance_like());
    }
}
