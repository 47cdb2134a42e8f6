//! Route handlers

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Json},
};
use nea_admission::{AdmissionOutcome, SessionSnapshot};
use nea_common::{Domain, PolicyMode, TimeSeriesPoint, WorkUnit, DISPLAY_WINDOW};
use nea_formalizer::{formalize_or_none, FormalizedSpec};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{ApiError, AppState};
use crate::metrics;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct ModeRequest {
    pub mode: String,
}

#[derive(Debug, Deserialize)]
pub struct DomainRequest {
    pub domain: String,
}

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub enabled: bool,
}

#[derive(Debug, Deserialize)]
pub struct FormalizeRequest {
    pub description: String,
}

/// Result of a work request
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkResponse {
    pub admitted: bool,
    pub failure_scheduled: bool,
    pub unit: WorkUnit,
}

impl From<AdmissionOutcome> for WorkResponse {
    fn from(outcome: AdmissionOutcome) -> Self {
        match outcome {
            AdmissionOutcome::Refused { unit } => Self {
                admitted: false,
                failure_scheduled: false,
                unit,
            },
            AdmissionOutcome::Admitted {
                unit,
                failure_scheduled,
            } => Self {
                admitted: true,
                failure_scheduled,
                unit,
            },
        }
    }
}

pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let session_id = state.session.lock().id();
    Json(serde_json::json!({
        "status": "healthy",
        "service": "nea-studio",
        "version": crate::STUDIO_VERSION,
        "sessionId": session_id,
    }))
}

fn observed_snapshot(state: &AppState) -> SessionSnapshot {
    let snapshot = state.session.lock().snapshot();
    state.metrics.observe(&snapshot);
    snapshot
}

pub async fn snapshot(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(observed_snapshot(&state))
}

/// Most recent terminal records, newest last
pub async fn history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Json<Vec<WorkUnit>> {
    let limit = query.limit.unwrap_or(DISPLAY_WINDOW);
    let records = state.session.lock().history().recent(limit).to_vec();
    Json(records)
}

pub async fn telemetry(State(state): State<AppState>) -> Json<Vec<TimeSeriesPoint>> {
    let points = state.session.lock().telemetry();
    Json(points)
}

pub async fn request_work(State(state): State<AppState>) -> Json<WorkResponse> {
    let (outcome, snapshot) = {
        let mut session = state.session.lock();
        let outcome = session.request_work();
        (outcome, session.snapshot())
    };
    state.metrics.observe(&snapshot);
    Json(outcome.into())
}

pub async fn set_mode(
    State(state): State<AppState>,
    Json(body): Json<ModeRequest>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let mode: PolicyMode = body.mode.parse()?;
    state.session.lock().set_mode(mode);
    Ok(Json(observed_snapshot(&state)))
}

pub async fn set_domain(
    State(state): State<AppState>,
    Json(body): Json<DomainRequest>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let domain: Domain = body.domain.parse()?;
    state.session.lock().set_domain(domain);
    Ok(Json(observed_snapshot(&state)))
}

pub async fn set_stress(
    State(state): State<AppState>,
    Json(body): Json<ToggleRequest>,
) -> Json<SessionSnapshot> {
    state.session.lock().set_stress(body.enabled);
    Json(observed_snapshot(&state))
}

pub async fn set_automation(
    State(state): State<AppState>,
    Json(body): Json<ToggleRequest>,
) -> Json<SessionSnapshot> {
    state.session.lock().set_automation(body.enabled);
    Json(observed_snapshot(&state))
}

/// Formal document for the description, or `null`
pub async fn formalize(
    State(state): State<AppState>,
    Json(body): Json<FormalizeRequest>,
) -> Json<Option<FormalizedSpec>> {
    state.metrics.formalizer_requests_total.inc();
    let spec = formalize_or_none(state.formalizer.as_ref(), &body.description).await;
    match &spec {
        Some(doc) => info!(title = doc.title(), "Formalized description"),
        None => state.metrics.formalizer_empty_total.inc(),
    }
    Json(spec)
}

pub async fn export_metrics(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    observed_snapshot(&state);
    let body = metrics::render(&state.registry)?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    ))
}
