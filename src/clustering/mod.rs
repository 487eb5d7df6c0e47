// src/clustering/mod.rs
//! Similarity-based theme clustering of tagged items.
//!
//! Entry point is [`generate_clusters`]: greedy agglomerative merging on
//! average pairwise weighted-Jaccard similarity, followed by a singleton
//! cleanup pass. [`split_cluster`] and [`generate_cluster_label`] are
//! standalone helpers and are not part of the merge loop.

pub mod label;
pub mod merge;
pub mod similarity;
pub mod split;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::tags::{TagMap, TagType, TaggedItem};

pub use label::generate_cluster_label;
pub use merge::{generate_clusters, generate_clusters_traced, MergePhase, MergeStep};
pub use similarity::{
    calculate_item_similarity, cluster_similarity, tag_type_weight, unweighted_similarity,
};
pub use split::split_cluster;

/// Share of members a tag must appear in to be part of a cluster's centroid.
pub const CENTROID_MIN_SHARE: f64 = 0.3;

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.25;
pub const DEFAULT_MIN_MERGE_SIMILARITY: f64 = 0.1;
pub const DEFAULT_MIN_ITEMS_PER_CLUSTER: usize = 3;
pub const DEFAULT_MAX_MERGE_ITERATIONS: usize = 10_000;

/// Tunables for [`generate_clusters`]. Every field is optional in config/JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterParams {
    /// Merging stops once the best pair falls below this.
    pub similarity_threshold: f64,
    /// Minimum similarity for a leftover singleton to join another cluster.
    pub min_merge_similarity: f64,
    /// Tag types that drive clustering. Empty means "all tags, unweighted".
    pub source_tags: Vec<TagType>,
    /// Only read by [`split_cluster`].
    pub min_items_per_cluster: usize,
    /// Upper bound on merge iterations.
    pub max_merge_iterations: usize,
}

impl Default for ClusterParams {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            min_merge_similarity: DEFAULT_MIN_MERGE_SIMILARITY,
            source_tags: TagType::default_source_tags(),
            min_items_per_cluster: DEFAULT_MIN_ITEMS_PER_CLUSTER,
            max_merge_iterations: DEFAULT_MAX_MERGE_ITERATIONS,
        }
    }
}

impl ClusterParams {
    /// Thresholds finite and within [0,1], iteration cap non-zero,
    /// `source_tags` deduplicated in order.
    pub fn sanitized(mut self) -> Self {
        fn unit(v: f64, default: f64) -> f64 {
            if v.is_finite() {
                v.clamp(0.0, 1.0)
            } else {
                default
            }
        }

        self.similarity_threshold = unit(self.similarity_threshold, DEFAULT_SIMILARITY_THRESHOLD);
        self.min_merge_similarity = unit(self.min_merge_similarity, DEFAULT_MIN_MERGE_SIMILARITY);
        if self.max_merge_iterations == 0 {
            self.max_merge_iterations = DEFAULT_MAX_MERGE_ITERATIONS;
        }

        let mut seen = Vec::with_capacity(self.source_tags.len());
        self.source_tags.retain(|t| {
            if seen.contains(t) {
                false
            } else {
                seen.push(t.clone());
                true
            }
        });
        self
    }
}

/// Per-request overrides layered on top of configured [`ClusterParams`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterParamsPatch {
    pub similarity_threshold: Option<f64>,
    pub min_merge_similarity: Option<f64>,
    pub source_tags: Option<Vec<TagType>>,
    pub min_items_per_cluster: Option<usize>,
    pub max_merge_iterations: Option<usize>,
}

impl ClusterParamsPatch {
    /// Given fields replace `base`; the result is sanitized like file config.
    pub fn apply(&self, base: &ClusterParams) -> ClusterParams {
        ClusterParams {
            similarity_threshold: self
                .similarity_threshold
                .filter(|v| v.is_finite())
                .unwrap_or(base.similarity_threshold),
            min_merge_similarity: self
                .min_merge_similarity
                .filter(|v| v.is_finite())
                .unwrap_or(base.min_merge_similarity),
            source_tags: self
                .source_tags
                .clone()
                .unwrap_or_else(|| base.source_tags.clone()),
            min_items_per_cluster: self
                .min_items_per_cluster
                .unwrap_or(base.min_items_per_cluster),
            max_merge_iterations: self
                .max_merge_iterations
                .unwrap_or(base.max_merge_iterations),
        }
        .sanitized()
    }
}

/// A non-empty group of items judged to share one theme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ClusterRepr")]
pub struct Cluster {
    items: Vec<TaggedItem>,
    item_count: usize,
    centroid: TagMap,
}

#[derive(Deserialize)]
struct ClusterRepr {
    items: Vec<TaggedItem>,
    #[serde(default)]
    centroid: Option<TagMap>,
}

impl From<ClusterRepr> for Cluster {
    fn from(raw: ClusterRepr) -> Self {
        match raw.centroid {
            Some(centroid) => Cluster {
                item_count: raw.items.len(),
                items: raw.items,
                centroid,
            },
            None => Cluster::from_items(raw.items),
        }
    }
}

impl Cluster {
    /// Cluster over `items` with the representative (≥30%) centroid.
    pub fn from_items(items: Vec<TaggedItem>) -> Self {
        let centroid = calculate_centroid(&items, CENTROID_MIN_SHARE);
        Self {
            item_count: items.len(),
            items,
            centroid,
        }
    }

    pub fn items(&self) -> &[TaggedItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<TaggedItem> {
        self.items
    }

    pub fn item_count(&self) -> usize {
        self.item_count
    }

    pub fn centroid(&self) -> &TagMap {
        &self.centroid
    }
}

/// Tags present in at least `min_share` of `items`.
pub fn calculate_centroid(items: &[TaggedItem], min_share: f64) -> TagMap {
    if items.is_empty() {
        return TagMap::new();
    }

    let mut counts: BTreeMap<(&TagType, &str), usize> = BTreeMap::new();
    for item in items {
        for (t, vals) in &item.tags {
            for v in vals {
                *counts.entry((t, v.as_str())).or_insert(0) += 1;
            }
        }
    }

    let needed = min_share * items.len() as f64;
    let mut centroid = TagMap::new();
    for ((t, v), n) in counts {
        if n as f64 >= needed {
            centroid.entry(t.clone()).or_default().insert(v.to_string());
        }
    }
    centroid
}
