//! Monte Carlo risk simulation
//!
//! Each trial draws an independent likelihood and impact sample from the
//! configured distributions; the trial value is their product. Over the
//! sample set the simulator derives expected value, variance, confidence
//! intervals, value-at-risk bands, a histogram, and a percentile map.
//!
//! Outputs are guaranteed finite: parameters are sanitized up front and every
//! draw passes a finiteness guard. An explicit optional seed makes runs
//! reproducible for audit use.

pub mod distributions;

pub use self::distributions::DistributionSpec;

use self::distributions::Sampler;
use crate::model::Risk;
use crate::VerisResult;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Hard cap on requested iterations — a defensive bound, not a tuning knob.
pub const MAX_ITERATIONS: usize = 200_000;
pub const DEFAULT_ITERATIONS: usize = 10_000;

/// Confidence levels every simulation reports, ascending
const CONFIDENCE_LEVELS: [f64; 3] = [0.90, 0.95, 0.99];
/// Two-sided normal quantiles matching `CONFIDENCE_LEVELS`
const Z_SCORES: [f64; 3] = [1.6449, 1.9600, 2.5758];

const PERCENTILE_KEYS: [u32; 8] = [5, 10, 25, 50, 75, 90, 95, 99];
const HISTOGRAM_BINS: usize = 20;

// ─── Parameters ─────────────────────────────────────────────────────

/// Per-call simulation input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationParameters {
    pub likelihood: DistributionSpec,
    pub impact: DistributionSpec,
    pub iterations: usize,
    pub time_horizon_days: u32,
    /// Fixed seed for reproducible runs; `None` draws from entropy
    pub seed: Option<u64>,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            likelihood: DistributionSpec::Triangular { min: 1.0, max: 5.0, mode: 3.0 },
            impact: DistributionSpec::Triangular { min: 1.0, max: 5.0, mode: 3.0 },
            iterations: DEFAULT_ITERATIONS,
            time_horizon_days: 365,
            seed: None,
        }
    }
}

impl SimulationParameters {
    /// Triangular distributions centered on the risk's own ratings.
    pub fn for_risk(risk: &Risk) -> Self {
        let likelihood = risk.effective_likelihood() as f64;
        let impact = risk.effective_impact() as f64;
        Self {
            likelihood: DistributionSpec::Triangular {
                min: (likelihood - 1.0).max(1.0),
                max: (likelihood + 1.0).min(5.0),
                mode: likelihood,
            },
            impact: DistributionSpec::Triangular {
                min: (impact - 1.0).max(1.0),
                max: (impact + 1.0).min(5.0),
                mode: impact,
            },
            ..Default::default()
        }
    }
}

// ─── Result ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub level: f64,
    pub lower: f64,
    pub upper: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueAtRisk {
    pub level: f64,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionSummary {
    pub bins: Vec<HistogramBin>,
    /// Keyed by integer percentile ("50", "95", "99", ...)
    pub percentiles: BTreeMap<String, f64>,
}

/// Output of one simulation run. All fields finite by contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    pub expected_value: f64,
    pub variance: f64,
    pub standard_deviation: f64,
    /// Ascending by level; parallel to `value_at_risk`
    pub confidence_intervals: Vec<ConfidenceInterval>,
    pub value_at_risk: Vec<ValueAtRisk>,
    pub distribution: DistributionSummary,
    /// Iterations actually run (after the defensive cap)
    pub iterations: usize,
    pub time_horizon_days: u32,
}

// ─── Simulator ──────────────────────────────────────────────────────

/// Run a Monte Carlo simulation for one risk.
///
/// Purely computational; the risk record itself only feeds logging and the
/// caller's choice of parameters.
pub fn simulate(risk: &Risk, params: &SimulationParameters) -> VerisResult<SimulationResult> {
    let iterations = params.iterations.clamp(1, MAX_ITERATIONS);
    if iterations != params.iterations {
        tracing::warn!(
            requested = params.iterations,
            clamped = iterations,
            "iteration count clamped to defensive bounds"
        );
    }

    let mut rng = match params.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let likelihood = Sampler::from_spec(&params.likelihood);
    let impact = Sampler::from_spec(&params.impact);

    let mut samples = Vec::with_capacity(iterations);
    for _ in 0..iterations {
        // Ratings are non-negative by domain; floor stray negative tails.
        let l = likelihood.draw(&mut rng).max(0.0);
        let i = impact.draw(&mut rng).max(0.0);
        samples.push(l * i);
    }

    let n = samples.len() as f64;
    let expected_value = samples.iter().sum::<f64>() / n;
    let variance = if samples.len() > 1 {
        let sum_sq = samples
            .iter()
            .map(|v| (v - expected_value).powi(2))
            .sum::<f64>();
        (sum_sq / (n - 1.0)).max(0.0)
    } else {
        0.0
    };
    let standard_deviation = variance.sqrt();

    let mut sorted = samples.clone();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let confidence_intervals = CONFIDENCE_LEVELS
        .iter()
        .zip(Z_SCORES.iter())
        .map(|(&level, &z)| ConfidenceInterval {
            level,
            lower: expected_value - z * standard_deviation,
            upper: expected_value + z * standard_deviation,
        })
        .collect();

    let value_at_risk = CONFIDENCE_LEVELS
        .iter()
        .map(|&level| ValueAtRisk {
            level,
            value: percentile(&sorted, level * 100.0),
        })
        .collect();

    let percentiles = PERCENTILE_KEYS
        .iter()
        .map(|&p| (p.to_string(), percentile(&sorted, p as f64)))
        .collect();

    let result = SimulationResult {
        expected_value,
        variance,
        standard_deviation,
        confidence_intervals,
        value_at_risk,
        distribution: DistributionSummary {
            bins: histogram(&sorted),
            percentiles,
        },
        iterations,
        time_horizon_days: params.time_horizon_days,
    };

    tracing::debug!(
        risk_id = %risk.id,
        iterations,
        expected_value = result.expected_value,
        std_dev = result.standard_deviation,
        "simulation complete"
    );

    Ok(result)
}

/// Linear-interpolated percentile over a sorted sample set
fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = (p / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let w = rank - lo as f64;
        sorted[lo] * (1.0 - w) + sorted[hi] * w
    }
}

fn histogram(sorted: &[f64]) -> Vec<HistogramBin> {
    if sorted.is_empty() {
        return Vec::new();
    }
    let min = sorted[0];
    let max = sorted[sorted.len() - 1];
    if (max - min).abs() < f64::EPSILON {
        return vec![HistogramBin { lower: min, upper: max, count: sorted.len() }];
    }

    let bin_count = HISTOGRAM_BINS.min(sorted.len());
    let width = (max - min) / bin_count as f64;
    let mut bins: Vec<HistogramBin> = (0..bin_count)
        .map(|i| HistogramBin {
            lower: min + width * i as f64,
            upper: min + width * (i + 1) as f64,
            count: 0,
        })
        .collect();

    for &v in sorted {
        let idx = (((v - min) / width) as usize).min(bin_count - 1);
        bins[idx].count += 1;
    }
    bins
}
