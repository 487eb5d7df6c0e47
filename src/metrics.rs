use axum::{routing::get, Router};
use metrics::{describe_counter, describe_histogram, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

use crate::clustering::ClusterParams;

// One global recorder per process; later inits reuse its handle.
static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

#[derive(Clone)]
pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder (first call only) and publish the
    /// active thresholds as gauges.
    ///
    /// Fails if a different global recorder is already installed.
    pub fn init(params: &ClusterParams) -> anyhow::Result<Self> {
        let handle = HANDLE
            .get_or_try_init(|| {
                let handle = PrometheusBuilder::new().install_recorder()?;

                describe_counter!("flow_cluster_runs_total", "Clustering runs with non-empty input");
                describe_counter!("flow_cluster_items_total", "Items submitted for clustering");
                describe_counter!("flow_cluster_merges_total", "Accepted merges across both phases");
                describe_counter!("flow_weight_runs_total", "Tag weighting runs");
                describe_histogram!(
                    "flow_quality_overall_score",
                    "Overall clustering quality score"
                );
                Ok::<_, anyhow::Error>(handle)
            })?
            .clone();

        gauge!("flow_similarity_threshold").set(params.similarity_threshold);
        gauge!("flow_min_merge_similarity").set(params.min_merge_similarity);

        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
