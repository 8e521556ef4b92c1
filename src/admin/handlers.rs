use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::admin::AdminState;
use crate::health::{HealthRecord, HealthStatus};

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub running: bool,
    pub providers: usize,
    pub healthy: usize,
}

/// A health record plus its ranking score.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProviderHealthView {
    #[serde(flatten)]
    pub record: HealthRecord,
    pub score: f64,
}

impl From<HealthRecord> for ProviderHealthView {
    fn from(record: HealthRecord) -> Self {
        let score = record.score();
        Self { record, score }
    }
}

#[derive(Serialize)]
pub struct FailureReport {
    pub provider: String,
    pub status: HealthStatus,
}

#[derive(Serialize)]
pub struct Selection {
    pub provider: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SelectQuery {
    /// Comma-separated candidate ids; all registered providers when absent.
    pub providers: Option<String>,
    /// A provider that just failed; the answer is a failover alternative.
    pub failed: Option<String>,
}

fn views(records: Vec<HealthRecord>) -> Json<Vec<ProviderHealthView>> {
    Json(records.into_iter().map(Into::into).collect())
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    let monitor = &state.services.monitor;
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        running: monitor.is_running(),
        providers: monitor.all().len(),
        healthy: monitor.healthy_providers().len(),
    })
}

pub async fn get_providers(State(state): State<AdminState>) -> Json<Vec<ProviderHealthView>> {
    views(state.services.monitor.all())
}

pub async fn get_ranked(State(state): State<AdminState>) -> Json<Vec<ProviderHealthView>> {
    views(state.services.monitor.ranked_providers())
}

pub async fn get_best(
    State(state): State<AdminState>,
) -> Result<Json<ProviderHealthView>, StatusCode> {
    state
        .services
        .monitor
        .best()
        .map(|r| Json(r.into()))
        .ok_or(StatusCode::NOT_FOUND)
}

pub async fn get_provider(
    State(state): State<AdminState>,
    Path(id): Path<String>,
) -> Result<Json<ProviderHealthView>, StatusCode> {
    state
        .services
        .monitor
        .health(&id)
        .map(|r| Json(r.into()))
        .ok_or(StatusCode::NOT_FOUND)
}

pub async fn reset_provider(
    State(state): State<AdminState>,
    Path(id): Path<String>,
) -> StatusCode {
    if state.services.monitor.reset(&id) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

pub async fn report_failure(
    State(state): State<AdminState>,
    Path(id): Path<String>,
) -> Result<Json<FailureReport>, StatusCode> {
    let status = state
        .services
        .balancer
        .report_failure(&id)
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(FailureReport {
        provider: id,
        status,
    }))
}

pub async fn select_provider(
    State(state): State<AdminState>,
    Query(query): Query<SelectQuery>,
) -> Json<Selection> {
    let candidates: Vec<String> = match &query.providers {
        Some(list) => list
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(String::from)
            .collect(),
        None => state
            .services
            .monitor
            .all()
            .into_iter()
            .map(|r| r.provider_id)
            .collect(),
    };

    let balancer = &state.services.balancer;
    let provider = match &query.failed {
        Some(failed) => balancer.failover(failed, candidates.as_slice()),
        None => balancer.select(candidates.as_slice()),
    };
    Json(Selection { provider })
}
