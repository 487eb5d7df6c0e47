//! Find My Flow theme service: binary entrypoint.
//! Boots the Axum HTTP server with the clustering config and metrics.

use flow_themes::debug::{is_dev_shuttle_env, ENV_DEV_LOG};
use flow_themes::metrics::Metrics;
use flow_themes::{api, AppState};
use shuttle_axum::ShuttleAxum;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Enable compact tracing logs in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - FLOW_DEV_LOG=1
fn enable_dev_tracing() {
    let dev_flag = std::env::var(ENV_DEV_LOG).ok().is_some_and(|v| v == "1");
    let is_dev_env = cfg!(debug_assertions) || is_dev_shuttle_env();

    if !(dev_flag && is_dev_env) {
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("clustering=debug,weighting=debug,report=info,warn"));

    // Shuttle may already own the global subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    enable_dev_tracing();

    let state = AppState::from_env()?;
    let metrics = Metrics::init(&state.config().clustering)?;
    info!(
        threshold = state.config().clustering.similarity_threshold,
        min_merge = state.config().clustering.min_merge_similarity,
        "theme service configured"
    );

    let router = api::router(state, Some(&metrics));
    Ok(router.into())
}
