// src/lib.rs
// Public library surface for the service binary and integration tests.

pub mod config;
pub mod debug;
pub mod tags;

// Scoring and grouping core
pub mod clustering;
pub mod quality;
pub mod report;
pub mod weighting;

// Service surface
pub mod api;
pub mod metrics;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::clustering::{
    calculate_item_similarity, generate_cluster_label, generate_clusters, split_cluster, Cluster,
    ClusterParams,
};
pub use crate::config::EngineConfig;
pub use crate::quality::{calculate_cluster_quality_metrics, Grade, QualityMetrics};
pub use crate::report::{build_theme_report, ThemeCluster, ThemeReport};
pub use crate::tags::{Response, TagMap, TagType, TaggedItem};
pub use crate::weighting::{
    calculate_bullet_score, calculate_cluster_score, calculate_tag_frequencies, calculate_weights,
    process_tag_weights,
};
