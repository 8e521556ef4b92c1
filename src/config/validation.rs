//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (interval/timeout > 0, rates within [0, 1])
//! - Check threshold ordering (degraded is always reached before unhealthy)
//! - Detect duplicate provider ids
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: HealthConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use thiserror::Error;

use crate::config::schema::{HealthConfig, MonitorConfig};
use crate::provider::ProviderDescriptor;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field} must be within [0, 1], got {value}")]
    RateOutOfRange { field: &'static str, value: f64 },

    #[error("degraded_success_rate ({degraded}) must not be below unhealthy_success_rate ({unhealthy})")]
    RateOrder { degraded: f64, unhealthy: f64 },

    #[error("degraded_latency_ms ({degraded}) must not exceed unhealthy_latency_ms ({unhealthy})")]
    LatencyOrder { degraded: u64, unhealthy: u64 },

    #[error("provider at position {0} has an empty id")]
    EmptyProviderId(usize),

    #[error("duplicate provider id '{0}'")]
    DuplicateProviderId(String),
}

/// Validate a full configuration.
pub fn validate_config(config: &HealthConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = monitor_errors(&config.monitor);
    errors.extend(provider_errors(&config.providers));

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate monitor thresholds only.
pub fn validate_monitor(config: &MonitorConfig) -> Result<(), Vec<ValidationError>> {
    let errors = monitor_errors(config);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn monitor_errors(config: &MonitorConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if config.check_interval_ms == 0 {
        errors.push(ValidationError::Zero { field: "check_interval_ms" });
    }
    if config.timeout_ms == 0 {
        errors.push(ValidationError::Zero { field: "timeout_ms" });
    }
    if config.max_consecutive_failures == 0 {
        errors.push(ValidationError::Zero { field: "max_consecutive_failures" });
    }

    let rates = [
        ("degraded_success_rate", config.degraded_success_rate),
        ("unhealthy_success_rate", config.unhealthy_success_rate),
    ];
    let mut rates_valid = true;
    for (field, value) in rates {
        // NaN fails the range check too
        if !(0.0..=1.0).contains(&value) {
            errors.push(ValidationError::RateOutOfRange { field, value });
            rates_valid = false;
        }
    }
    if rates_valid && config.degraded_success_rate < config.unhealthy_success_rate {
        errors.push(ValidationError::RateOrder {
            degraded: config.degraded_success_rate,
            unhealthy: config.unhealthy_success_rate,
        });
    }

    if config.degraded_latency_ms > config.unhealthy_latency_ms {
        errors.push(ValidationError::LatencyOrder {
            degraded: config.degraded_latency_ms,
            unhealthy: config.unhealthy_latency_ms,
        });
    }

    errors
}

fn provider_errors(providers: &[ProviderDescriptor]) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for (i, provider) in providers.iter().enumerate() {
        if provider.id.trim().is_empty() {
            errors.push(ValidationError::EmptyProviderId(i));
        } else if !seen.insert(provider.id.as_str()) {
            errors.push(ValidationError::DuplicateProviderId(provider.id.clone()));
        }
    }

    errors
}
