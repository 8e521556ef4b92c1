//! Metrics collection and exposition.
//!
//! # Metrics
//! - `provider_health_probes_total` (counter): probes by provider, outcome
//! - `provider_health_probe_latency_ms` (histogram): probe round-trip time
//! - `provider_health_status` (gauge): 1=healthy, 0.5=degraded, 0.25=unknown, 0=unhealthy
//! - `provider_health_registered` (gauge): 1 while the monitor tracks the
//!   provider, 0 once it is cleared; a status series whose provider reads 0
//!   here is stale
//! - `provider_health_selections_total` (counter): balancer picks by provider
//! - `provider_health_failovers_total` (counter): failover attempts by outcome
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op
//! - Prometheus exposition is opt-in via config

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

use crate::health::{HealthCheckResult, HealthStatus};

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_probe(provider: &str, result: &HealthCheckResult) {
    let outcome = match &result.failure {
        None => "success",
        Some(reason) => reason.label(),
    };
    counter!(
        "provider_health_probes_total",
        "provider" => provider.to_string(),
        "outcome" => outcome
    )
    .increment(1);

    if result.success {
        histogram!("provider_health_probe_latency_ms", "provider" => provider.to_string())
            .record(result.latency_ms as f64);
    }
}

pub fn record_status(provider: &str, status: HealthStatus) {
    let value = match status {
        HealthStatus::Healthy => 1.0,
        HealthStatus::Degraded => 0.5,
        HealthStatus::Unknown => 0.25,
        HealthStatus::Unhealthy => 0.0,
    };
    gauge!("provider_health_status", "provider" => provider.to_string()).set(value);
}

pub fn record_registered(provider: &str, registered: bool) {
    gauge!("provider_health_registered", "provider" => provider.to_string())
        .set(if registered { 1.0 } else { 0.0 });
}

pub fn record_selection(provider: &str) {
    counter!("provider_health_selections_total", "provider" => provider.to_string()).increment(1);
}

pub fn record_failover(outcome: &'static str) {
    counter!("provider_health_failovers_total", "outcome" => outcome).increment(1);
}
