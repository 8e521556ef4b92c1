//! Single-provider reachability probe.
//!
//! # Responsibilities
//! - Send one bounded-time request to a provider's endpoint
//! - Apply the reachability policy (2xx and 404 are "up")
//! - Tag failures so slow and down providers can be told apart
//!
//! # Design Decisions
//! - The probe never fails: every outcome, including a missing or malformed
//!   endpoint, is a `HealthCheckResult`
//! - The network primitive sits behind the `Reachability` trait; the probe
//!   only adds policy (timeout, status interpretation, tagging)
//! - Timeouts use Tokio's timeout facilities; dropping the request future
//!   cancels it

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tokio::time;
use url::Url;

use crate::provider::ProviderDescriptor;

/// Why a probe counted as a failure.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ProbeFailure {
    #[error("no endpoint configured")]
    NoEndpoint,

    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("timeout")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected status {0}")]
    Status(u16),

    /// A failure observed by the caller outside of a probe cycle.
    #[error("reported: {0}")]
    Reported(String),
}

impl ProbeFailure {
    /// Short label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            ProbeFailure::NoEndpoint => "no_endpoint",
            ProbeFailure::InvalidEndpoint(_) => "invalid_endpoint",
            ProbeFailure::Timeout => "timeout",
            ProbeFailure::Network(_) => "network",
            ProbeFailure::Status(_) => "status",
            ProbeFailure::Reported(_) => "reported",
        }
    }
}

/// Outcome of one probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub success: bool,
    /// Round-trip time in milliseconds.
    pub latency_ms: u64,
    pub failure: Option<ProbeFailure>,
    /// Milliseconds since the UNIX epoch.
    pub timestamp: u64,
}

impl HealthCheckResult {
    pub fn success(latency_ms: u64) -> Self {
        Self {
            success: true,
            latency_ms,
            failure: None,
            timestamp: now_millis(),
        }
    }

    pub fn failure(reason: ProbeFailure, latency_ms: u64) -> Self {
        Self {
            success: false,
            latency_ms,
            failure: Some(reason),
            timestamp: now_millis(),
        }
    }
}

pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Network-level error from a reachability request.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ReachError(pub String);

/// Generic reachability primitive: one request, status code or error.
///
/// Implementations need not enforce a deadline; `HealthProbe` does.
#[async_trait]
pub trait Reachability: Send + Sync {
    async fn reach(&self, endpoint: &Url) -> Result<u16, ReachError>;
}

/// HTTP GET reachability via `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpReachability {
    client: reqwest::Client,
}

impl HttpReachability {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpReachability {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Reachability for HttpReachability {
    async fn reach(&self, endpoint: &Url) -> Result<u16, ReachError> {
        let response = self
            .client
            .get(endpoint.clone())
            .header("user-agent", "provider-health-check")
            .send()
            .await
            .map_err(|e| ReachError(e.to_string()))?;
        Ok(response.status().as_u16())
    }
}

/// Bounded-time health check for a single provider.
#[derive(Clone)]
pub struct HealthProbe {
    reachability: Arc<dyn Reachability>,
    timeout: Duration,
}

impl HealthProbe {
    pub fn new(reachability: Arc<dyn Reachability>, timeout: Duration) -> Self {
        Self {
            reachability,
            timeout,
        }
    }

    /// Probe over HTTP with the default client.
    pub fn http(timeout: Duration) -> Self {
        Self::new(Arc::new(HttpReachability::new()), timeout)
    }

    /// Check one provider. Never fails; see `HealthCheckResult`.
    pub async fn check(&self, provider: &ProviderDescriptor) -> HealthCheckResult {
        let Some(endpoint) = provider.primary_endpoint() else {
            return HealthCheckResult::failure(ProbeFailure::NoEndpoint, 0);
        };

        let url = match Url::parse(endpoint) {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!(provider = %provider.id, endpoint, error = %e, "Invalid endpoint");
                return HealthCheckResult::failure(ProbeFailure::InvalidEndpoint(e.to_string()), 0);
            }
        };

        let started = Instant::now();
        let outcome = time::timeout(self.timeout, self.reachability.reach(&url)).await;
        let latency_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(Ok(status)) if is_reachable(status) => HealthCheckResult::success(latency_ms),
            Ok(Ok(status)) => {
                tracing::debug!(provider = %provider.id, status, "Health check failed: non-success status");
                HealthCheckResult::failure(ProbeFailure::Status(status), latency_ms)
            }
            Ok(Err(e)) => {
                tracing::debug!(provider = %provider.id, error = %e, "Health check failed: connection error");
                HealthCheckResult::failure(ProbeFailure::Network(e.0), latency_ms)
            }
            Err(_) => {
                tracing::debug!(provider = %provider.id, "Health check failed: timeout");
                HealthCheckResult::failure(ProbeFailure::Timeout, latency_ms)
            }
        }
    }
}

/// 2xx is up. 404 is up too: many APIs expose no health path at their root.
fn is_reachable(status: u16) -> bool {
    (200..300).contains(&status) || status == 404
}
