//! # Cluster Quality
//! Grades a whole clustering run.
//!
//! - coherence:    mean intra-cluster average pairwise similarity
//! - distinctness: mean of `1 - similarity` over all cluster pairs
//! - balance:      `1 - Gini(cluster sizes)`
//! - overall:      `0.4*coherence + 0.4*distinctness + 0.2*balance`
//!
//! All similarities here are the *unweighted* Jaccard, independent of the
//! source tags the clusters were built with.

use metrics::histogram;
use serde::{Deserialize, Serialize};

use crate::clustering::{unweighted_similarity, Cluster};
use crate::weighting::round2;

const COHERENCE_WEIGHT: f64 = 0.4;
const DISTINCTNESS_WEIGHT: f64 = 0.4;
const BALANCE_WEIGHT: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            Grade::A
        } else if score >= 0.7 {
            Grade::B
        } else if score >= 0.6 {
            Grade::C
        } else if score >= 0.5 {
            Grade::D
        } else {
            Grade::F
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub overall_score: f64,
    pub coherence: f64,
    pub distinctness: f64,
    pub balance: f64,
    pub grade: Grade,
}

impl QualityMetrics {
    pub fn empty() -> Self {
        Self {
            overall_score: 0.0,
            coherence: 0.0,
            distinctness: 0.0,
            balance: 0.0,
            grade: Grade::F,
        }
    }
}

/// Average pairwise similarity among members; 1 for clusters below two items.
pub fn calculate_intra_cluster_similarity(cluster: &Cluster) -> f64 {
    let items = cluster.items();
    if items.len() < 2 {
        return 1.0;
    }
    let mut sum = 0.0;
    let mut pairs = 0usize;
    for i in 0..items.len() {
        for j in (i + 1)..items.len() {
            sum += unweighted_similarity(&items[i], &items[j]);
            pairs += 1;
        }
    }
    sum / pairs as f64
}

/// Average cross-pair similarity between two clusters (unweighted).
pub fn calculate_inter_cluster_similarity(a: &Cluster, b: &Cluster) -> f64 {
    crate::clustering::cluster_similarity(a.items(), b.items(), &[])
}

/// Rank-weighted Gini coefficient in [0,1]; 0 for empty or all-zero input.
pub fn gini(sizes: &[usize]) -> f64 {
    let n = sizes.len();
    let total: usize = sizes.iter().sum();
    if n == 0 || total == 0 {
        return 0.0;
    }
    let mut sorted = sizes.to_vec();
    sorted.sort_unstable();

    let weighted: f64 = sorted
        .iter()
        .enumerate()
        .map(|(i, &x)| (i + 1) as f64 * x as f64)
        .sum();
    let nf = n as f64;
    let g = (2.0 * weighted) / (nf * total as f64) - (nf + 1.0) / nf;
    g.clamp(0.0, 1.0)
}

pub fn calculate_cluster_quality_metrics(clusters: &[Cluster]) -> QualityMetrics {
    if clusters.is_empty() {
        return QualityMetrics::empty();
    }

    let coherence = clusters
        .iter()
        .map(calculate_intra_cluster_similarity)
        .sum::<f64>()
        / clusters.len() as f64;

    let distinctness = if clusters.len() < 2 {
        1.0
    } else {
        let mut sum = 0.0;
        let mut pairs = 0usize;
        for i in 0..clusters.len() {
            for j in (i + 1)..clusters.len() {
                sum += 1.0 - calculate_inter_cluster_similarity(&clusters[i], &clusters[j]);
                pairs += 1;
            }
        }
        sum / pairs as f64
    };

    let sizes: Vec<usize> = clusters.iter().map(Cluster::item_count).collect();
    let balance = 1.0 - gini(&sizes);

    let overall = round2(
        COHERENCE_WEIGHT * coherence + DISTINCTNESS_WEIGHT * distinctness + BALANCE_WEIGHT * balance,
    );
    histogram!("flow_quality_overall_score").record(overall);

    QualityMetrics {
        overall_score: overall,
        coherence: round2(coherence),
        distinctness: round2(distinctness),
        balance: round2(balance),
        grade: Grade::from_score(overall),
    }
}
