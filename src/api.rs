//! JSON endpoints over the clustering core.
//!
//! Handlers are thin: the core is synchronous and cheap for one user's
//! answers, so it runs inline.

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tower_http::cors::CorsLayer;

use crate::clustering::{generate_clusters, Cluster, ClusterParams, ClusterParamsPatch};
use crate::config::EngineConfig;
use crate::metrics::Metrics;
use crate::quality::{calculate_cluster_quality_metrics, QualityMetrics};
use crate::report::{build_theme_report, ThemeReport};
use crate::tags::{Response, TaggedItem};
use crate::weighting::{process_tag_weights_with, TagScore};

#[derive(Clone)]
pub struct AppState {
    config: Arc<EngineConfig>,
}

impl AppState {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// State from `FLOW_CONFIG_PATH` / defaults plus env overrides.
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self::new(EngineConfig::from_env()?))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

/// Build the API router. `/metrics` is mounted only when `metrics` is given.
pub fn router(state: AppState, metrics: Option<&Metrics>) -> Router {
    let api = Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/config", get(get_config))
        .route("/weights", post(post_weights))
        .route("/clusters", post(post_clusters))
        .route("/quality", post(post_quality))
        .route("/report", post(post_report))
        .with_state(state);

    let app = match metrics {
        Some(m) => api.merge(m.router()),
        None => api,
    };

    app.layer(CorsLayer::very_permissive())
}

#[derive(Deserialize)]
struct ClusterReq {
    items: Vec<TaggedItem>,
    #[serde(default)]
    params: ClusterParamsPatch,
}

#[derive(Deserialize)]
struct ReportReq {
    items: Vec<TaggedItem>,
    #[serde(default)]
    responses: Vec<Response>,
    #[serde(default)]
    params: ClusterParamsPatch,
}

async fn get_config(State(state): State<AppState>) -> Json<ClusterParams> {
    Json(state.config.clustering.clone())
}

async fn post_weights(
    State(state): State<AppState>,
    Json(responses): Json<Vec<Response>>,
) -> Json<Vec<TagScore>> {
    Json(process_tag_weights_with(&responses, &state.config.contexts))
}

async fn post_clusters(
    State(state): State<AppState>,
    Json(body): Json<ClusterReq>,
) -> Json<Vec<Cluster>> {
    let params = body.params.apply(&state.config.clustering);
    Json(generate_clusters(&body.items, &params))
}

async fn post_quality(Json(clusters): Json<Vec<Cluster>>) -> Json<QualityMetrics> {
    Json(calculate_cluster_quality_metrics(&clusters))
}

async fn post_report(
    State(state): State<AppState>,
    Json(body): Json<ReportReq>,
) -> Json<ThemeReport> {
    let params = body.params.apply(&state.config.clustering);
    Json(build_theme_report(
        body.items,
        &body.responses,
        &params,
        &state.config.contexts,
    ))
}
