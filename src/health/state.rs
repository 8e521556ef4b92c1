//! Provider health state machine.
//!
//! # States
//! - Unknown: registered (or reset) but no evidence yet
//! - Healthy: evidence says the provider is fine
//! - Degraded: reachable but slow or flaky
//! - Unhealthy: repeatedly failing, low success rate, or very slow
//!
//! # State Transitions
//! ```text
//! evaluated after every applied result, first rule wins:
//!   consecutive_failures >= max_consecutive_failures → Unhealthy
//!   success_rate < unhealthy_success_rate            → Unhealthy
//!   success_rate < degraded_success_rate             → Degraded
//!   latency > unhealthy_latency (had a success)      → Unhealthy
//!   latency > degraded_latency (had a success)       → Degraded
//!   otherwise                                        → Healthy
//! ```
//!
//! # Design Decisions
//! - Consecutive-failure memory gives hysteresis against single blips
//! - Latency is an EMA (factor 0.3) and only moves on success
//! - Status is a pure function of the counters and thresholds

use serde::{Deserialize, Serialize};

use crate::config::MonitorConfig;
use crate::health::probe::HealthCheckResult;

/// EMA weight given to a new latency sample.
const LATENCY_SMOOTHING: f64 = 0.3;

/// Latency ceiling for ranking arithmetic.
const LATENCY_CEILING_MS: f64 = 10_000.0;

/// Health classification of a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    #[default]
    Unknown,
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    /// Weight of the status term in the ranking score.
    pub fn weight(self) -> f64 {
        match self {
            HealthStatus::Healthy => 1.0,
            HealthStatus::Degraded => 0.6,
            HealthStatus::Unhealthy => 0.2,
            HealthStatus::Unknown => 0.5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HealthStatus::Unknown => "unknown",
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded => "degraded",
            HealthStatus::Unhealthy => "unhealthy",
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accumulated health of a single provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthRecord {
    pub provider_id: String,
    /// Smoothed round-trip time in milliseconds.
    pub latency_ms: f64,
    pub success_rate: f64,
    pub status: HealthStatus,
    pub consecutive_failures: u32,
    pub total_requests: u64,
    pub successful_requests: u64,
    /// Milliseconds since the UNIX epoch of the last applied result.
    pub last_check: Option<u64>,
}

impl HealthRecord {
    /// A fresh record: unknown status, optimistic success rate.
    pub fn new(provider_id: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            latency_ms: 0.0,
            success_rate: 1.0,
            status: HealthStatus::Unknown,
            consecutive_failures: 0,
            total_requests: 0,
            successful_requests: 0,
            last_check: None,
        }
    }

    /// Fold one probe (or externally observed) result into the counters and
    /// re-evaluate status. Returns the previous status.
    pub fn apply(&mut self, result: &HealthCheckResult, config: &MonitorConfig) -> HealthStatus {
        self.total_requests += 1;

        if result.success {
            self.successful_requests += 1;
            self.consecutive_failures = 0;
            let sample = result.latency_ms as f64;
            self.latency_ms = if self.latency_ms == 0.0 {
                sample
            } else {
                self.latency_ms * (1.0 - LATENCY_SMOOTHING) + sample * LATENCY_SMOOTHING
            };
        } else {
            self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        }

        self.success_rate = self.successful_requests as f64 / self.total_requests as f64;
        self.last_check = Some(result.timestamp);

        let previous = self.status;
        self.status = determine_status(self, config);
        previous
    }

    /// Back to the unproven state; the id and registration survive.
    pub fn reset(&mut self) {
        *self = Self::new(std::mem::take(&mut self.provider_id));
    }

    /// Bring a record from outside (e.g. a restored snapshot) back within
    /// the counter invariants: `successful_requests <= total_requests`,
    /// `success_rate` in [0, 1] and consistent with the counters once any
    /// request was counted, finite non-negative latency.
    pub fn normalize(&mut self) {
        self.successful_requests = self.successful_requests.min(self.total_requests);

        self.success_rate = if self.total_requests > 0 {
            self.successful_requests as f64 / self.total_requests as f64
        } else if self.success_rate.is_finite() {
            self.success_rate.clamp(0.0, 1.0)
        } else {
            1.0
        };

        if !self.latency_ms.is_finite() || self.latency_ms < 0.0 {
            self.latency_ms = 0.0;
        }
    }

    /// Ranking score in [0, 1]; higher is better.
    pub fn score(&self) -> f64 {
        let normalized_latency = (1.0 - self.latency_ms / LATENCY_CEILING_MS).clamp(0.0, 1.0);
        0.4 * self.status.weight() + 0.4 * self.success_rate + 0.2 * normalized_latency
    }
}

/// Classify a record against the configured thresholds.
pub fn determine_status(record: &HealthRecord, config: &MonitorConfig) -> HealthStatus {
    if record.consecutive_failures >= config.max_consecutive_failures {
        return HealthStatus::Unhealthy;
    }
    if record.success_rate < config.unhealthy_success_rate {
        return HealthStatus::Unhealthy;
    }
    if record.success_rate < config.degraded_success_rate {
        return HealthStatus::Degraded;
    }
    if record.successful_requests > 0 {
        if record.latency_ms > config.unhealthy_latency_ms as f64 {
            return HealthStatus::Unhealthy;
        }
        if record.latency_ms > config.degraded_latency_ms as f64 {
            return HealthStatus::Degraded;
        }
    }
    HealthStatus::Healthy
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::probe::ProbeFailure;

    fn ok(latency_ms: u64) -> HealthCheckResult {
        HealthCheckResult::success(latency_ms)
    }

    fn timeout() -> HealthCheckResult {
        HealthCheckResult::failure(ProbeFailure::Timeout, 10_000)
    }

    #[test]
    fn test_three_timeouts_make_healthy_provider_unhealthy() {
        let config = MonitorConfig::default();
        let mut record = HealthRecord::new("a");
        for _ in 0..20 {
            record.apply(&ok(100), &config);
        }
        assert_eq!(record.status, HealthStatus::Healthy);

        record.apply(&timeout(), &config);
        record.apply(&timeout(), &config);
        assert_ne!(record.status, HealthStatus::Unhealthy);

        record.apply(&timeout(), &config);
        assert_eq!(record.consecutive_failures, 3);
        assert_eq!(record.status, HealthStatus::Unhealthy);
    }

    #[test]
    fn test_latency_converges() {
        let config = MonitorConfig::default();
        let mut record = HealthRecord::new("a");
        for _ in 0..10 {
            record.apply(&ok(150), &config);
        }
        assert!((record.latency_ms - 150.0).abs() < 1e-9);
        assert_eq!(record.status, HealthStatus::Healthy);
    }

    #[test]
    fn test_ema_smoothing_and_failures_leave_latency_alone() {
        let config = MonitorConfig::default();
        let mut record = HealthRecord::new("a");
        record.apply(&ok(100), &config);
        record.apply(&ok(200), &config);
        assert!((record.latency_ms - 130.0).abs() < 1e-9);

        record.apply(&timeout(), &config);
        assert!((record.latency_ms - 130.0).abs() < 1e-9);
    }

    #[test]
    fn test_consecutive_failures_reset_on_success() {
        let config = MonitorConfig::default();
        let mut record = HealthRecord::new("a");
        record.apply(&timeout(), &config);
        record.apply(&timeout(), &config);
        assert_eq!(record.consecutive_failures, 2);
        record.apply(&ok(10), &config);
        assert_eq!(record.consecutive_failures, 0);
        record.apply(&timeout(), &config);
        assert_eq!(record.consecutive_failures, 1);
    }

    #[test]
    fn test_counters_stay_consistent() {
        let config = MonitorConfig::default();
        let mut record = HealthRecord::new("a");
        for i in 0..50u64 {
            let result = if i % 3 == 0 { timeout() } else { ok(i * 10) };
            record.apply(&result, &config);
            assert!(record.successful_requests <= record.total_requests);
            assert!((0.0..=1.0).contains(&record.success_rate));
        }
        assert_eq!(record.total_requests, 50);
    }

    #[test]
    fn test_status_rules_in_order() {
        let config = MonitorConfig::default();
        let mut record = HealthRecord::new("a");

        // low success rate wins over good latency
        record.total_requests = 10;
        record.successful_requests = 6;
        record.success_rate = 0.6;
        record.latency_ms = 50.0;
        assert_eq!(determine_status(&record, &config), HealthStatus::Degraded);

        record.success_rate = 0.4;
        assert_eq!(determine_status(&record, &config), HealthStatus::Unhealthy);

        record.success_rate = 1.0;
        record.latency_ms = 2_500.0;
        assert_eq!(determine_status(&record, &config), HealthStatus::Degraded);

        record.latency_ms = 6_000.0;
        assert_eq!(determine_status(&record, &config), HealthStatus::Unhealthy);

        // latency rules need at least one success
        record.successful_requests = 0;
        assert_eq!(determine_status(&record, &config), HealthStatus::Healthy);
    }

    #[test]
    fn test_status_is_pure() {
        let config = MonitorConfig::default();
        let mut record = HealthRecord::new("a");
        record.apply(&ok(2_100), &config);
        let first = determine_status(&record, &config);
        let second = determine_status(&record.clone(), &config);
        assert_eq!(first, second);
        assert_eq!(first, HealthStatus::Degraded);
    }

    #[test]
    fn test_reset_is_unknown_not_healthy() {
        let config = MonitorConfig::default();
        let mut record = HealthRecord::new("a");
        for _ in 0..4 {
            record.apply(&timeout(), &config);
        }
        record.reset();
        assert_eq!(record, HealthRecord::new("a"));
        assert_eq!(record.success_rate, 1.0);
        assert_eq!(record.status, HealthStatus::Unknown);
    }

    #[test]
    fn test_score() {
        let mut record = HealthRecord::new("a");
        // unknown, optimistic, no latency: 0.2 + 0.4 + 0.2
        assert!((record.score() - 0.8).abs() < 1e-9);

        record.status = HealthStatus::Healthy;
        record.latency_ms = 25_000.0;
        // latency term is capped at zero
        assert!((record.score() - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_normalize_repairs_inconsistent_counters() {
        let config = MonitorConfig::default();
        let mut record = HealthRecord {
            success_rate: 1.0,
            total_requests: 4,
            successful_requests: 9,
            latency_ms: f64::NAN,
            ..HealthRecord::new("a")
        };
        record.normalize();
        assert_eq!(record.successful_requests, 4);
        assert_eq!(record.success_rate, 1.0);
        assert_eq!(record.latency_ms, 0.0);

        record.apply(&ok(100), &config);
        assert_eq!(record.success_rate, 1.0);
        assert!(record.score() <= 1.0);

        let mut uncounted = HealthRecord {
            success_rate: f64::NAN,
            ..HealthRecord::new("b")
        };
        uncounted.normalize();
        assert_eq!(uncounted.success_rate, 1.0);

        let mut inflated = HealthRecord {
            success_rate: 3.0,
            latency_ms: -5.0,
            ..HealthRecord::new("c")
        };
        inflated.normalize();
        assert_eq!(inflated.success_rate, 1.0);
        assert_eq!(inflated.latency_ms, 0.0);

        let mut counted = HealthRecord {
            success_rate: 0.9,
            total_requests: 4,
            successful_requests: 1,
            ..HealthRecord::new("d")
        };
        counted.normalize();
        assert_eq!(counted.success_rate, 0.25);
    }
}
