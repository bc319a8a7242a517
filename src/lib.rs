//! # veris — Risk Scoring & Simulation Engine
//!
//! Standalone analytics core for governance, risk, and compliance (GRC)
//! platforms. Takes a risk register entry and produces a deterministic score,
//! an optional Monte Carlo loss simulation, an optional cross-risk
//! correlation analysis, and a fully assembled assessment report.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      VerisEngine                            │
//! │  ┌──────────┐ ┌────────────┐ ┌─────────────┐               │
//! │  │ Scorer   │ │ Monte Carlo│ │ Correlation │               │
//! │  │ (COSO /  │ │ Simulator  │ │ Analyzer    │               │
//! │  │ ISO/NIST)│ │ (optional) │ │ (optional)  │               │
//! │  └────┬─────┘ └─────┬──────┘ └──────┬──────┘               │
//! │       │             │               │                       │
//! │  ┌────▼─────────────▼───────────────▼─────────────────────┐ │
//! │  │ Report Assembler → Findings → Recommendations → Plans  │ │
//! │  └────────────────────────┬───────────────────────────────┘ │
//! │                           │                                 │
//! │              AssessmentReport → JSON / Markdown             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Capabilities
//!
//! - **Deterministic Scoring**: likelihood × impact under COSO, ISO 31000,
//!   or NIST, adjusted by industry, organization size, risk tolerance,
//!   historical samples, and controls — always usable, never a hard failure
//!   on degraded input
//! - **Monte Carlo Simulation**: normal, triangular, uniform, and beta
//!   distributions; confidence intervals, value-at-risk bands, histograms,
//!   and percentile maps with a never-NaN output guarantee
//! - **Correlation Analysis**: explainable pairwise relatedness over a risk
//!   set, network metrics (density, clustering, path length), clusters, and
//!   a systemic-risk summary
//! - **Report Assembly**: executive summary, findings, prioritized
//!   recommendations, action plan, and monitoring plan per framework
//!
//! Every entry point is a pure computation over its inputs: no persistence,
//! no network, no shared mutable state. Callers may run assessments
//! concurrently without coordination.

pub mod model;
pub mod scoring;
pub mod simulation;
pub mod correlation;
pub mod engine;
pub mod report;

// Re-exports for convenience
pub use model::{Risk, RiskCategory, RiskLevel, RiskStatus};
pub use scoring::{Framework, ScoreResult, ScoringContext, ScoringFactor};
pub use simulation::{
    DistributionSpec, SimulationParameters, SimulationResult, simulate,
};
pub use correlation::{analyze, CorrelationAnalysis, CorrelationOptions};
pub use engine::{AssessOptions, AssessmentReport, EngineConfig, VerisEngine};
pub use report::{render_report, write_report, ReportFormat};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VerisError {
    /// Caller misuse — fix the input, retrying will not help.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Internal computation failure — potentially transient.
    #[error("Computation failed: {0}")]
    Computation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type VerisResult<T> = Result<T, VerisError>;
