//! Cross-risk correlation analysis
//!
//! Computes pairwise relatedness over a risk set from three explainable
//! signals: shared category, descriptive-term overlap, and shared signal
//! themes (availability, security, regulatory, financial, third-party).
//! The pairwise scores feed a lightweight network view (density, clustering,
//! path length), threshold-based clusters, derived dependencies, and a
//! systemic-risk summary.
//!
//! Deliberately heuristic and deterministic — no trained model, every
//! strength is reproducible from the inputs.

use crate::model::{Risk, RiskLevel};
use aho_corasick::AhoCorasick;
use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet, VecDeque};

// ─── Signal vocabulary ──────────────────────────────────────────────

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-z0-9]{3,}").unwrap());

static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "and", "for", "with", "that", "this", "from", "are", "our",
        "may", "could", "would", "risk", "risks", "due", "has", "caused",
        "causes", "into", "over", "under", "within", "across", "will",
    ]
    .into_iter()
    .collect()
});

/// Themed keyword groups; sharing a theme is a strong relatedness signal.
static SIGNAL_THEMES: Lazy<Vec<(&'static str, AhoCorasick)>> = Lazy::new(|| {
    fn matcher(patterns: &[&str]) -> AhoCorasick {
        AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .build(patterns)
            .unwrap()
    }
    vec![
        (
            "availability",
            matcher(&["downtime", "outage", "failure", "disruption", "unavailable", "degradation"]),
        ),
        (
            "security",
            matcher(&["breach", "attack", "ransomware", "phishing", "malware", "vulnerability", "unauthorized", "intrusion"]),
        ),
        (
            "regulatory",
            matcher(&["regulation", "regulatory", "compliance", "audit", "fine", "penalty", "gdpr", "sanction"]),
        ),
        (
            "financial",
            matcher(&["loss", "credit", "liquidity", "currency", "fraud", "budget", "revenue"]),
        ),
        (
            "third_party",
            matcher(&["vendor", "supplier", "outsourc", "contractor", "third-party", "third party"]),
        ),
    ]
});

// ─── Options ────────────────────────────────────────────────────────

/// Recognized analysis options with documented defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationOptions {
    /// Minimum pair strength to count as a network edge / cluster link
    pub edge_threshold: f64,
    /// Minimum pair strength to derive a dependency
    pub dependency_threshold: f64,
}

impl Default for CorrelationOptions {
    fn default() -> Self {
        Self { edge_threshold: 0.3, dependency_threshold: 0.6 }
    }
}

// ─── Output types ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationType {
    /// Same business category
    SharedCategory,
    /// Overlapping drivers detected in the descriptive text
    SharedDrivers,
    /// Weak cross-category relatedness
    SystemicExposure,
}

impl std::fmt::Display for CorrelationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SharedCategory => write!(f, "shared-category"),
            Self::SharedDrivers => write!(f, "shared-drivers"),
            Self::SystemicExposure => write!(f, "systemic-exposure"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskPair {
    pub risk1_id: String,
    pub risk2_id: String,
    pub correlation_type: CorrelationType,
    /// Relatedness in [-1, 1]
    pub strength: f64,
    /// Confidence in the pair in [0, 1]
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkMetrics {
    /// Edge density in [0, 1]
    pub density: f64,
    /// Average clustering coefficient in [0, 1]
    pub clustering: f64,
    /// Mean shortest-path length over connected pairs; 0 when no edges
    pub average_path_length: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskCluster {
    pub id: usize,
    pub risk_ids: Vec<String>,
    /// Dominant category of the member risks
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskDependency {
    pub from_risk_id: String,
    pub to_risk_id: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemicRisk {
    /// Aggregate exposure in [0, 1]
    pub score: f64,
    pub level: RiskLevel,
    /// Shared themes driving the exposure
    pub drivers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationAnalysis {
    pub pairs: Vec<RiskPair>,
    pub network_metrics: NetworkMetrics,
    pub clusters: Vec<RiskCluster>,
    pub dependencies: Vec<RiskDependency>,
    pub systemic_risk: SystemicRisk,
}

impl CorrelationAnalysis {
    fn empty() -> Self {
        Self {
            pairs: Vec::new(),
            network_metrics: NetworkMetrics {
                density: 0.0,
                clustering: 0.0,
                average_path_length: 0.0,
            },
            clusters: Vec::new(),
            dependencies: Vec::new(),
            systemic_risk: SystemicRisk {
                score: 0.0,
                level: RiskLevel::Low,
                drivers: Vec::new(),
            },
        }
    }
}

// ─── Per-risk features ──────────────────────────────────────────────

struct RiskFeatures {
    terms: HashSet<String>,
    themes: BTreeSet<&'static str>,
}

fn extract_features(risk: &Risk) -> RiskFeatures {
    let text = format!("{} {}", risk.title, risk.description).to_lowercase();
    let terms = WORD_RE
        .find_iter(&text)
        .map(|m| m.as_str().to_string())
        .filter(|w| !STOPWORDS.contains(w.as_str()))
        .collect();
    let themes = SIGNAL_THEMES
        .iter()
        .filter(|(_, ac)| ac.is_match(&text))
        .map(|(name, _)| *name)
        .collect();
    RiskFeatures { terms, themes }
}

// ─── Analyzer ───────────────────────────────────────────────────────

/// Weights of the three relatedness signals; their sum bounds raw strength.
const CATEGORY_WEIGHT: f64 = 0.35;
const TERM_WEIGHT: f64 = 0.40;
const THEME_WEIGHT: f64 = 0.125;
/// Pairs weaker than this are dropped from the result entirely.
const MIN_PAIR_STRENGTH: f64 = 0.05;

/// Analyze pairwise correlation over a risk set.
///
/// Empty and single-risk inputs are well-defined, not errors.
pub fn analyze(risks: &[Risk], options: &CorrelationOptions) -> CorrelationAnalysis {
    let n = risks.len();
    if n == 0 {
        return CorrelationAnalysis::empty();
    }
    if n == 1 {
        let mut analysis = CorrelationAnalysis::empty();
        analysis.clusters.push(RiskCluster {
            id: 0,
            risk_ids: vec![risks[0].id.clone()],
            label: risks[0].category.to_string(),
        });
        return analysis;
    }

    let features: Vec<RiskFeatures> = risks.iter().map(extract_features).collect();

    let index_pairs: Vec<(usize, usize)> = (0..n)
        .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
        .collect();

    // Pairwise pass is the O(n²) hot spot; score pairs in parallel.
    let scored: Vec<(usize, usize, RiskPair)> = index_pairs
        .par_iter()
        .filter_map(|&(i, j)| {
            score_pair(&risks[i], &features[i], &risks[j], &features[j])
                .map(|pair| (i, j, pair))
        })
        .collect();

    // Edges for the network/cluster view
    let mut adjacency: Vec<HashSet<usize>> = vec![HashSet::new(); n];
    for (i, j, pair) in &scored {
        if pair.strength >= options.edge_threshold {
            adjacency[*i].insert(*j);
            adjacency[*j].insert(*i);
        }
    }

    let network_metrics = network_metrics(&adjacency);
    let clusters = build_clusters(risks, &adjacency);
    let dependencies = derive_dependencies(risks, &scored, options.dependency_threshold);
    let systemic_risk = systemic_risk(&features, &network_metrics, &clusters, n);

    let pairs: Vec<RiskPair> = scored.into_iter().map(|(_, _, p)| p).collect();

    tracing::debug!(
        risks = n,
        pairs = pairs.len(),
        clusters = clusters.len(),
        density = network_metrics.density,
        "correlation analysis complete"
    );

    CorrelationAnalysis {
        pairs,
        network_metrics,
        clusters,
        dependencies,
        systemic_risk,
    }
}

fn score_pair(
    a: &Risk,
    fa: &RiskFeatures,
    b: &Risk,
    fb: &RiskFeatures,
) -> Option<RiskPair> {
    let same_category = a.category == b.category;

    let union = fa.terms.union(&fb.terms).count();
    let jaccard = if union == 0 {
        0.0
    } else {
        fa.terms.intersection(&fb.terms).count() as f64 / union as f64
    };

    let shared_themes: Vec<&str> = fa.themes.intersection(&fb.themes).copied().collect();

    let mut strength = 0.0;
    if same_category {
        strength += CATEGORY_WEIGHT;
    }
    strength += TERM_WEIGHT * jaccard;
    strength += THEME_WEIGHT * (shared_themes.len().min(2) as f64);
    let strength = strength.clamp(-1.0, 1.0);

    if strength < MIN_PAIR_STRENGTH {
        return None;
    }

    let mut signals = 0;
    if same_category {
        signals += 1;
    }
    if jaccard > 0.0 {
        signals += 1;
    }
    if !shared_themes.is_empty() {
        signals += 1;
    }
    let confidence = (0.35 + 0.15 * signals as f64 + 0.15 * jaccard).clamp(0.0, 1.0);

    let correlation_type = if !shared_themes.is_empty() {
        CorrelationType::SharedDrivers
    } else if same_category {
        CorrelationType::SharedCategory
    } else {
        CorrelationType::SystemicExposure
    };

    Some(RiskPair {
        risk1_id: a.id.clone(),
        risk2_id: b.id.clone(),
        correlation_type,
        strength,
        confidence,
    })
}

// ─── Network metrics ────────────────────────────────────────────────

fn network_metrics(adjacency: &[HashSet<usize>]) -> NetworkMetrics {
    let n = adjacency.len();
    let edge_count: usize = adjacency.iter().map(|a| a.len()).sum::<usize>() / 2;
    let density = if n < 2 {
        0.0
    } else {
        (2.0 * edge_count as f64 / (n as f64 * (n as f64 - 1.0))).clamp(0.0, 1.0)
    };

    // Average local clustering coefficient; degree-<2 nodes contribute 0
    let mut clustering_sum = 0.0;
    for neighbors in adjacency {
        let degree = neighbors.len();
        if degree < 2 {
            continue;
        }
        let mut links = 0usize;
        let nodes: Vec<usize> = neighbors.iter().copied().collect();
        for (x, &u) in nodes.iter().enumerate() {
            for &v in &nodes[x + 1..] {
                if adjacency[u].contains(&v) {
                    links += 1;
                }
            }
        }
        clustering_sum += 2.0 * links as f64 / (degree as f64 * (degree as f64 - 1.0));
    }
    let clustering = if n == 0 {
        0.0
    } else {
        (clustering_sum / n as f64).clamp(0.0, 1.0)
    };

    // BFS shortest paths averaged over connected ordered pairs
    let mut total_distance = 0u64;
    let mut reachable_pairs = 0u64;
    for start in 0..n {
        let mut distance = vec![usize::MAX; n];
        distance[start] = 0;
        let mut queue = VecDeque::from([start]);
        while let Some(u) = queue.pop_front() {
            for &v in &adjacency[u] {
                if distance[v] == usize::MAX {
                    distance[v] = distance[u] + 1;
                    queue.push_back(v);
                }
            }
        }
        for (v, &d) in distance.iter().enumerate() {
            if v != start && d != usize::MAX {
                total_distance += d as u64;
                reachable_pairs += 1;
            }
        }
    }
    let average_path_length = if reachable_pairs == 0 {
        0.0
    } else {
        total_distance as f64 / reachable_pairs as f64
    };

    NetworkMetrics { density, clustering, average_path_length }
}

// ─── Clusters ───────────────────────────────────────────────────────

fn build_clusters(risks: &[Risk], adjacency: &[HashSet<usize>]) -> Vec<RiskCluster> {
    let n = risks.len();
    let mut parent: Vec<usize> = (0..n).collect();

    fn find(parent: &mut Vec<usize>, x: usize) -> usize {
        if parent[x] != x {
            let root = find(parent, parent[x]);
            parent[x] = root;
        }
        parent[x]
    }

    for (u, neighbors) in adjacency.iter().enumerate() {
        for &v in neighbors {
            let ru = find(&mut parent, u);
            let rv = find(&mut parent, v);
            if ru != rv {
                parent[ru] = rv;
            }
        }
    }

    let mut groups: Vec<Vec<usize>> = Vec::new();
    let mut root_to_group: std::collections::HashMap<usize, usize> =
        std::collections::HashMap::new();
    for i in 0..n {
        let root = find(&mut parent, i);
        let group = *root_to_group.entry(root).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[group].push(i);
    }

    groups
        .into_iter()
        .enumerate()
        .map(|(id, members)| {
            // Dominant category labels the cluster
            let mut counts: std::collections::HashMap<&str, usize> =
                std::collections::HashMap::new();
            for &m in &members {
                *counts.entry(risks[m].category.name()).or_default() += 1;
            }
            let label = counts
                .into_iter()
                .max_by_key(|&(name, count)| (count, std::cmp::Reverse(name)))
                .map(|(name, _)| name.to_string())
                .unwrap_or_default();
            RiskCluster {
                id,
                risk_ids: members.iter().map(|&m| risks[m].id.clone()).collect(),
                label,
            }
        })
        .collect()
}

// ─── Dependencies & systemic view ───────────────────────────────────

fn derive_dependencies(
    risks: &[Risk],
    scored: &[(usize, usize, RiskPair)],
    threshold: f64,
) -> Vec<RiskDependency> {
    scored
        .iter()
        .filter(|(_, _, pair)| pair.strength >= threshold)
        .map(|&(i, j, _)| {
            // Exposure propagates from the higher-scored risk
            let (from, to) = if risks[i].risk_score() >= risks[j].risk_score() {
                (i, j)
            } else {
                (j, i)
            };
            RiskDependency {
                from_risk_id: risks[from].id.clone(),
                to_risk_id: risks[to].id.clone(),
                description: format!(
                    "'{}' materializing raises exposure on '{}'",
                    risks[from].title, risks[to].title
                ),
            }
        })
        .collect()
}

fn systemic_risk(
    features: &[RiskFeatures],
    metrics: &NetworkMetrics,
    clusters: &[RiskCluster],
    n: usize,
) -> SystemicRisk {
    let max_cluster = clusters
        .iter()
        .map(|c| c.risk_ids.len())
        .max()
        .unwrap_or(0);
    let concentration = if n == 0 { 0.0 } else { max_cluster as f64 / n as f64 };
    let score =
        (0.5 * metrics.density + 0.3 * concentration + 0.2 * metrics.clustering).clamp(0.0, 1.0);

    let level = if score > 0.75 {
        RiskLevel::Critical
    } else if score > 0.5 {
        RiskLevel::High
    } else if score > 0.25 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    // Themes shared by at least two risks drive systemic exposure
    let mut theme_counts: std::collections::HashMap<&str, usize> =
        std::collections::HashMap::new();
    for f in features {
        for &theme in &f.themes {
            *theme_counts.entry(theme).or_default() += 1;
        }
    }
    let mut drivers: Vec<String> = theme_counts
        .into_iter()
        .filter(|&(_, count)| count >= 2)
        .map(|(theme, _)| theme.to_string())
        .collect();
    drivers.sort();

    SystemicRisk { score, level, drivers }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RiskCategory;

    fn make_risk(id: &str, category: RiskCategory, title: &str, description: &str) -> Risk {
        Risk::new(id, title, description, category, 3, 3)
    }

    fn tech_pair() -> Vec<Risk> {
        vec![
            make_risk(
                "r-1",
                RiskCategory::Technology,
                "Core system failure",
                "Extended system downtime following a platform failure",
            ),
            make_risk(
                "r-2",
                RiskCategory::Technology,
                "Data center downtime",
                "System failure causing downtime and data breach exposure",
            ),
        ]
    }

    #[test]
    fn test_empty_input_is_well_defined() {
        let analysis = analyze(&[], &CorrelationOptions::default());
        assert!(analysis.pairs.is_empty());
        assert!(analysis.clusters.is_empty());
        assert!(analysis.dependencies.is_empty());
        assert_eq!(analysis.network_metrics.density, 0.0);
    }

    #[test]
    fn test_single_risk_forms_singleton_cluster() {
        let risks = vec![make_risk(
            "r-1",
            RiskCategory::Financial,
            "FX exposure",
            "Currency loss on unhedged positions",
        )];
        let analysis = analyze(&risks, &CorrelationOptions::default());
        assert!(analysis.pairs.is_empty());
        assert_eq!(analysis.clusters.len(), 1);
        assert_eq!(analysis.clusters[0].risk_ids, vec!["r-1".to_string()]);
        assert_eq!(analysis.network_metrics.density, 0.0);
    }

    #[test]
    fn test_related_technology_risks_detected() {
        let analysis = analyze(&tech_pair(), &CorrelationOptions::default());
        assert!(
            !analysis.pairs.is_empty(),
            "same-category risks with shared incident vocabulary must pair"
        );
        let pair = &analysis.pairs[0];
        assert!(pair.strength > 0.0);
        assert!(pair.confidence >= 0.0 && pair.confidence <= 1.0);
        assert_eq!(pair.correlation_type, CorrelationType::SharedDrivers);
    }

    #[test]
    fn test_metrics_within_documented_ranges() {
        let mut risks = tech_pair();
        risks.push(make_risk(
            "r-3",
            RiskCategory::Compliance,
            "Privacy fine",
            "Regulatory penalty after a GDPR audit finding",
        ));
        let analysis = analyze(&risks, &CorrelationOptions::default());
        let m = &analysis.network_metrics;
        assert!((0.0..=1.0).contains(&m.density));
        assert!((0.0..=1.0).contains(&m.clustering));
        if analysis.pairs.iter().any(|p| p.strength >= 0.3) {
            assert!(m.average_path_length > 0.0);
        }
    }

    #[test]
    fn test_every_risk_in_exactly_one_cluster() {
        let mut risks = tech_pair();
        risks.push(make_risk(
            "r-3",
            RiskCategory::Reputational,
            "Brand damage",
            "Negative press coverage after an incident",
        ));
        risks.push(make_risk(
            "r-4",
            RiskCategory::Financial,
            "Credit loss",
            "Counterparty default on receivables",
        ));
        let analysis = analyze(&risks, &CorrelationOptions::default());
        let mut seen: Vec<&String> = analysis
            .clusters
            .iter()
            .flat_map(|c| c.risk_ids.iter())
            .collect();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), risks.len(), "cluster membership must partition the set");
    }

    #[test]
    fn test_unrelated_risks_yield_no_strong_pair() {
        let risks = vec![
            make_risk(
                "r-1",
                RiskCategory::Financial,
                "Interest rate shift",
                "Rising rates compress lending margins",
            ),
            make_risk(
                "r-2",
                RiskCategory::Reputational,
                "Spokesperson scandal",
                "Public controversy involving brand ambassador",
            ),
        ];
        let analysis = analyze(&risks, &CorrelationOptions::default());
        for pair in &analysis.pairs {
            assert!(pair.strength < 0.3, "unexpected strong pair: {:?}", pair);
        }
    }

    #[test]
    fn test_dependencies_from_strong_pairs() {
        let mut risks = tech_pair();
        risks[0].likelihood = 5;
        risks[0].impact = 5;
        let options = CorrelationOptions { dependency_threshold: 0.4, ..Default::default() };
        let analysis = analyze(&risks, &options);
        if let Some(dep) = analysis.dependencies.first() {
            // Direction runs from the higher-scored risk
            assert_eq!(dep.from_risk_id, "r-1");
            assert_eq!(dep.to_risk_id, "r-2");
        }
    }

    #[test]
    fn test_systemic_drivers_from_shared_themes() {
        let analysis = analyze(&tech_pair(), &CorrelationOptions::default());
        assert!(
            analysis.systemic_risk.drivers.iter().any(|d| d == "availability"),
            "shared downtime vocabulary should surface as an availability driver, got {:?}",
            analysis.systemic_risk.drivers
        );
        assert!((0.0..=1.0).contains(&analysis.systemic_risk.score));
    }
}
