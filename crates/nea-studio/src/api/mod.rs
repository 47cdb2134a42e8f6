//! REST operator surface
//!
//! Every handler locks the session, performs one synchronous operation and
//! releases the lock before responding. The formalizer call runs without
//! the lock held.

pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::{
    http::{header, Method},
    routing::{get, post, put},
    Router,
};
use nea_admission::SharedSession;
use nea_formalizer::SpecFormalizer;
use prometheus::Registry;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::metrics::StudioMetrics;

pub use error::ApiError;

/// Shared state behind every route
#[derive(Clone)]
pub struct AppState {
    pub session: SharedSession,
    pub formalizer: Arc<dyn SpecFormalizer>,
    pub metrics: Arc<StudioMetrics>,
    pub registry: Registry,
}

impl AppState {
    /// Build state with a fresh registry holding the studio metrics
    pub fn new(
        session: SharedSession,
        formalizer: Arc<dyn SpecFormalizer>,
    ) -> anyhow::Result<Self> {
        let registry = Registry::new();
        let metrics = StudioMetrics::new()?;
        metrics.register(&registry)?;
        Ok(Self {
            session,
            formalizer,
            metrics: Arc::new(metrics),
            registry,
        })
    }
}

/// Create the REST router
pub fn router(state: AppState) -> Router {
    // CORS layer to allow dashboard connections from any origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    Router::new()
        .route("/health", get(routes::health))
        .route("/metrics", get(routes::export_metrics))
        .route("/api/v1/snapshot", get(routes::snapshot))
        .route("/api/v1/history", get(routes::history))
        .route("/api/v1/telemetry", get(routes::telemetry))
        .route("/api/v1/work", post(routes::request_work))
        .route("/api/v1/mode", put(routes::set_mode))
        .route("/api/v1/domain", put(routes::set_domain))
        .route("/api/v1/stress", put(routes::set_stress))
        .route("/api/v1/automation", put(routes::set_automation))
        .route("/api/v1/formalize", post(routes::formalize))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
