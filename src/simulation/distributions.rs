//! Probability distribution specs and finite-guarded sampling
//!
//! Parameters are sanitized before a sampler is built: non-finite values are
//! replaced, inverted ranges swapped, and scale parameters floored, so a
//! degenerate spec degrades to a constant draw instead of poisoning the
//! simulation with NaN.

use rand::Rng;
use rand_distr::{Beta, Distribution, Normal, Triangular, Uniform};
use serde::{Deserialize, Serialize};

const MIN_SCALE: f64 = 1e-9;

/// A likelihood or impact distribution for Monte Carlo sampling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DistributionSpec {
    Normal { mean: f64, std_dev: f64 },
    Triangular { min: f64, max: f64, mode: f64 },
    Uniform { min: f64, max: f64 },
    Beta { alpha: f64, beta: f64, min: f64, max: f64 },
}

impl DistributionSpec {
    /// Theoretical mean of the distribution (after sanitization)
    pub fn mean(&self) -> f64 {
        match self.sanitized() {
            Self::Normal { mean, .. } => mean,
            Self::Triangular { min, max, mode } => (min + max + mode) / 3.0,
            Self::Uniform { min, max } => (min + max) / 2.0,
            Self::Beta { alpha, beta, min, max } => {
                min + (max - min) * alpha / (alpha + beta)
            }
        }
    }

    /// Replace unusable parameters with safe equivalents.
    pub fn sanitized(&self) -> Self {
        fn finite(v: f64, fallback: f64) -> f64 {
            if v.is_finite() { v } else { fallback }
        }

        match *self {
            Self::Normal { mean, std_dev } => {
                let mean = finite(mean, 0.0);
                let std_dev = finite(std_dev, 1.0).abs().max(MIN_SCALE);
                Self::Normal { mean, std_dev }
            }
            Self::Triangular { min, max, mode } => {
                let min = finite(min, 0.0);
                let max = finite(max, min + 1.0);
                let (min, max) = if min <= max { (min, max) } else { (max, min) };
                let max = if max - min < MIN_SCALE { min + MIN_SCALE } else { max };
                let mode = finite(mode, (min + max) / 2.0).clamp(min, max);
                Self::Triangular { min, max, mode }
            }
            Self::Uniform { min, max } => {
                let min = finite(min, 0.0);
                let max = finite(max, min + 1.0);
                let (min, max) = if min <= max { (min, max) } else { (max, min) };
                Self::Uniform { min, max }
            }
            Self::Beta { alpha, beta, min, max } => {
                let alpha = finite(alpha, 2.0).max(MIN_SCALE);
                let beta = finite(beta, 2.0).max(MIN_SCALE);
                let min = finite(min, 0.0);
                let max = finite(max, min + 1.0);
                let (min, max) = if min <= max { (min, max) } else { (max, min) };
                Self::Beta { alpha, beta, min, max }
            }
        }
    }
}

// ─── Sampler ────────────────────────────────────────────────────────

enum SamplerKind {
    Normal(Normal<f64>),
    Triangular(Triangular<f64>),
    Uniform(Uniform<f64>),
    Beta { dist: Beta<f64>, min: f64, span: f64 },
    Constant,
}

/// A compiled sampler for one distribution spec. Built once per simulation;
/// every draw is guaranteed finite.
pub(crate) struct Sampler {
    kind: SamplerKind,
    fallback: f64,
}

impl Sampler {
    pub fn from_spec(spec: &DistributionSpec) -> Self {
        let spec = spec.sanitized();
        let fallback = spec.mean();
        let kind = match spec {
            DistributionSpec::Normal { mean, std_dev } => Normal::new(mean, std_dev)
                .map(SamplerKind::Normal)
                .unwrap_or(SamplerKind::Constant),
            DistributionSpec::Triangular { min, max, mode } => {
                Triangular::new(min, max, mode)
                    .map(SamplerKind::Triangular)
                    .unwrap_or(SamplerKind::Constant)
            }
            DistributionSpec::Uniform { min, max } => {
                SamplerKind::Uniform(Uniform::new_inclusive(min, max))
            }
            DistributionSpec::Beta { alpha, beta, min, max } => Beta::new(alpha, beta)
                .map(|dist| SamplerKind::Beta { dist, min, span: max - min })
                .unwrap_or(SamplerKind::Constant),
        };
        Self { kind, fallback }
    }

    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let value = match &self.kind {
            SamplerKind::Normal(d) => d.sample(rng),
            SamplerKind::Triangular(d) => d.sample(rng),
            SamplerKind::Uniform(d) => d.sample(rng),
            SamplerKind::Beta { dist, min, span } => min + span * dist.sample(rng),
            SamplerKind::Constant => self.fallback,
        };
        if value.is_finite() { value } else { self.fallback }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn draws(spec: &DistributionSpec, n: usize) -> Vec<f64> {
        let sampler = Sampler::from_spec(spec);
        let mut rng = StdRng::seed_from_u64(7);
        (0..n).map(|_| sampler.draw(&mut rng)).collect()
    }

    #[test]
    fn test_uniform_respects_support() {
        let spec = DistributionSpec::Uniform { min: 2.0, max: 4.0 };
        for v in draws(&spec, 5000) {
            assert!((2.0..=4.0).contains(&v), "uniform draw {} outside support", v);
        }
    }

    #[test]
    fn test_triangular_respects_support() {
        let spec = DistributionSpec::Triangular { min: 1.0, max: 5.0, mode: 3.0 };
        for v in draws(&spec, 5000) {
            assert!((1.0..=5.0).contains(&v), "triangular draw {} outside support", v);
        }
    }

    #[test]
    fn test_beta_scaled_into_range() {
        let spec = DistributionSpec::Beta { alpha: 2.0, beta: 5.0, min: 1.0, max: 5.0 };
        for v in draws(&spec, 5000) {
            assert!((1.0..=5.0).contains(&v), "beta draw {} outside [min,max]", v);
        }
    }

    #[test]
    fn test_normal_draws_are_finite() {
        let spec = DistributionSpec::Normal { mean: 3.0, std_dev: 1e6 };
        for v in draws(&spec, 2000) {
            assert!(v.is_finite());
        }
    }

    #[test]
    fn test_nonfinite_parameters_sanitized() {
        let spec = DistributionSpec::Normal { mean: f64::NAN, std_dev: f64::INFINITY };
        for v in draws(&spec, 100) {
            assert!(v.is_finite());
        }
    }

    #[test]
    fn test_inverted_range_swapped() {
        let spec = DistributionSpec::Uniform { min: 10.0, max: 2.0 };
        for v in draws(&spec, 1000) {
            assert!((2.0..=10.0).contains(&v));
        }
    }

    #[test]
    fn test_degenerate_uniform_is_constant() {
        let spec = DistributionSpec::Uniform { min: 3.0, max: 3.0 };
        for v in draws(&spec, 100) {
            assert!((v - 3.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn test_theoretical_means() {
        let normal = DistributionSpec::Normal { mean: 3.0, std_dev: 0.5 };
        assert!((normal.mean() - 3.0).abs() < 1e-12);
        let uniform = DistributionSpec::Uniform { min: 2.0, max: 4.0 };
        assert!((uniform.mean() - 3.0).abs() < 1e-12);
        let tri = DistributionSpec::Triangular { min: 1.0, max: 5.0, mode: 3.0 };
        assert!((tri.mean() - 3.0).abs() < 1e-12);
        let beta = DistributionSpec::Beta { alpha: 2.0, beta: 2.0, min: 0.0, max: 4.0 };
        assert!((beta.mean() - 2.0).abs() < 1e-12);
    }
}
