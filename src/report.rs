//! # Theme Report
//! One-shot pipeline used by the service: weights → item scores →
//! clusters → fallback labels and scores → ranking → quality grade.
//!
//! The output is the row shape the persistence layer stores. `insight` is
//! left empty for the external LLM labelling step to fill in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::clustering::{generate_cluster_label, generate_clusters, Cluster, ClusterParams};
use crate::debug::dev_logging_enabled;
use crate::quality::{calculate_cluster_quality_metrics, QualityMetrics};
use crate::tags::{Response, TagMap, TaggedItem};
use crate::weighting::{
    annotate_scores, calculate_cluster_score, calculate_tag_frequencies_with, calculate_weights,
    ContextTable,
};

/// A labelled, scored theme ready to persist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeCluster {
    #[serde(alias = "cluster_label")]
    pub label: String,
    #[serde(default)]
    pub insight: Option<String>,
    pub score: f64,
    pub item_count: usize,
    pub items: Vec<TaggedItem>,
    #[serde(default)]
    pub centroid: TagMap,
}

impl ThemeCluster {
    fn from_cluster(cluster: Cluster) -> Self {
        let label = generate_cluster_label(&cluster);
        let score = calculate_cluster_score(&cluster);
        let centroid = cluster.centroid().clone();
        let item_count = cluster.item_count();
        Self {
            label,
            insight: None,
            score,
            item_count,
            items: cluster.into_items(),
            centroid,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeReport {
    /// Sorted by score, highest first.
    pub clusters: Vec<ThemeCluster>,
    pub quality: QualityMetrics,
    pub item_count: usize,
    pub params: ClusterParams,
    pub generated_at: DateTime<Utc>,
}

/// Build the full report for one user's answers.
///
/// `responses` feed the tag weights used to score items without a score;
/// with no responses every unscored item scores 0.
pub fn build_theme_report(
    mut items: Vec<TaggedItem>,
    responses: &[Response],
    params: &ClusterParams,
    contexts: &ContextTable,
) -> ThemeReport {
    let weights = calculate_weights(&calculate_tag_frequencies_with(responses, contexts));
    annotate_scores(&mut items, &weights);

    let clusters = generate_clusters(&items, params);
    let quality = calculate_cluster_quality_metrics(&clusters);

    let mut themes: Vec<ThemeCluster> = clusters.into_iter().map(ThemeCluster::from_cluster).collect();
    themes.sort_by(|a, b| b.score.total_cmp(&a.score));

    if dev_logging_enabled() {
        info!(
            target: "report",
            items = items.len(),
            clusters = themes.len(),
            overall = quality.overall_score,
            grade = ?quality.grade,
            "theme report built"
        );
    }

    ThemeReport {
        clusters: themes,
        quality,
        item_count: items.len(),
        params: params.clone(),
        generated_at: Utc::now(),
    }
}
