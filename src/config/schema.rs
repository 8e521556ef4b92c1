//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the health
//! daemon. All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::provider::ProviderDescriptor;

/// Root configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct HealthConfig {
    /// Probe cycle and status thresholds.
    pub monitor: MonitorConfig,

    /// Provider selection settings.
    pub balancer: BalancerConfig,

    /// Providers to monitor.
    pub providers: Vec<ProviderDescriptor>,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub admin: AdminConfig,
}

/// Health monitor configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Interval between probe cycles in milliseconds.
    pub check_interval_ms: u64,

    /// Per-probe timeout in milliseconds.
    pub timeout_ms: u64,

    /// Smoothed latency above which a provider is degraded.
    pub degraded_latency_ms: u64,

    /// Smoothed latency above which a provider is unhealthy.
    pub unhealthy_latency_ms: u64,

    /// Success rate below which a provider is degraded.
    pub degraded_success_rate: f64,

    /// Success rate below which a provider is unhealthy.
    pub unhealthy_success_rate: f64,

    /// Number of consecutive failures before marking unhealthy.
    pub max_consecutive_failures: u32,
}

impl MonitorConfig {
    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(self.check_interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            check_interval_ms: 300_000,
            timeout_ms: 10_000,
            degraded_latency_ms: 2_000,
            unhealthy_latency_ms: 5_000,
            degraded_success_rate: 0.8,
            unhealthy_success_rate: 0.5,
            max_consecutive_failures: 3,
        }
    }
}

/// Provider selection strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Score-proportional random sampling.
    #[default]
    Weighted,
    /// Rotate through the candidate pool.
    RoundRobin,
    /// Uniform random pick.
    Random,
}

/// Load balancer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct BalancerConfig {
    pub strategy: Strategy,

    /// Allow computing alternatives after a reported failure.
    pub failover_enabled: bool,

    /// Maximum number of alternatives handed out per failover chain.
    pub max_failover_attempts: u32,

    /// Drop unhealthy providers from the pool (unless that empties it).
    pub exclude_unhealthy: bool,

    /// Select from healthy providers before degraded or unknown ones.
    pub prefer_healthy: bool,
}

impl Default for BalancerConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::Weighted,
            failover_enabled: true,
            max_failover_attempts: 3,
            exclude_unhealthy: true,
            prefer_healthy: true,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}
