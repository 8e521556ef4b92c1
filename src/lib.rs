//! Health-aware provider selection.
//!
//! Probes a set of interchangeable upstream API providers, classifies each
//! as healthy, degraded, unhealthy or unknown, and picks providers for
//! outbound calls with failover.
//!
//! ```no_run
//! use std::sync::Arc;
//! use provider_health::{BalancerConfig, HealthMonitor, LoadBalancer, MonitorConfig, ProviderDescriptor};
//!
//! # async fn example() -> Result<(), provider_health::config::ConfigError> {
//! let monitor = Arc::new(HealthMonitor::new(MonitorConfig::default())?);
//! monitor.set_providers(&[
//!     ProviderDescriptor::new("primary", "Primary", vec!["https://api.primary.example".into()]),
//!     ProviderDescriptor::new("backup", "Backup", vec!["https://api.backup.example".into()]),
//! ]);
//! monitor.start().await;
//!
//! let balancer = LoadBalancer::new(Arc::clone(&monitor), BalancerConfig::default());
//! let candidates = ["primary", "backup"];
//! if let Some(chosen) = balancer.select(&candidates) {
//!     // on an error from `chosen`:
//!     balancer.report_failure(&chosen);
//!     let _alternative = balancer.failover(&chosen, &candidates);
//! }
//! monitor.stop();
//! # Ok(())
//! # }
//! ```

pub mod admin;
pub mod config;
pub mod health;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;
pub mod provider;

pub use config::{BalancerConfig, HealthConfig, MonitorConfig, Strategy};
pub use health::{HealthCheckResult, HealthMonitor, HealthRecord, HealthStatus, ProbeFailure};
pub use load_balancer::{FailoverChain, LoadBalancer};
pub use provider::ProviderDescriptor;
