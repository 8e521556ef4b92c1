//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the monitor and balancer from a validated configuration
//! - Register the configured providers
//! - Run the first probe cycle before anything is served
//!
//! # Design Decisions
//! - Fail fast: an invalid configuration is fatal
//! - The admin API starts only after the first cycle, so early queries see
//!   real health instead of a table of unknowns

use notify::RecommendedWatcher;
use std::path::Path;
use std::sync::Arc;

use crate::config::watcher;
use crate::config::{ConfigError, HealthConfig};
use crate::health::HealthMonitor;
use crate::load_balancer::LoadBalancer;

/// The running health core.
#[derive(Clone)]
pub struct Services {
    pub monitor: Arc<HealthMonitor>,
    pub balancer: Arc<LoadBalancer>,
}

impl Services {
    /// Build the core without starting the probe schedule.
    pub fn build(config: &HealthConfig) -> Result<Self, ConfigError> {
        let monitor = Arc::new(HealthMonitor::new(config.monitor.clone())?);
        monitor.set_providers(&config.providers);
        let balancer = Arc::new(LoadBalancer::new(
            Arc::clone(&monitor),
            config.balancer.clone(),
        ));
        Ok(Self { monitor, balancer })
    }

    /// Build the core and start probing.
    pub async fn start(config: &HealthConfig) -> Result<Self, ConfigError> {
        let services = Self::build(config)?;
        services.monitor.start().await;
        tracing::info!(
            providers = config.providers.len(),
            healthy = services.monitor.healthy_providers().len(),
            "Health core started"
        );
        Ok(services)
    }

    /// Pick up a reloaded provider list. Monitor and balancer settings are
    /// fixed for the life of the process.
    pub fn apply_reload(&self, config: &HealthConfig) {
        if config.monitor != *self.monitor.config() || config.balancer != *self.balancer.config() {
            tracing::warn!("Monitor/balancer settings changed; restart to apply them");
        }
        self.monitor.set_providers(&config.providers);
        tracing::info!(
            listed = config.providers.len(),
            monitored = self.monitor.providers().len(),
            "Provider list reloaded"
        );
    }

    /// Apply every effective change of the file at `path` until the
    /// returned watcher is dropped. `current` is the configuration already
    /// in effect.
    pub fn watch_config(
        &self,
        path: &Path,
        current: &HealthConfig,
    ) -> Result<RecommendedWatcher, notify::Error> {
        let services = self.clone();
        watcher::watch_config(path, current.clone(), move |config| {
            services.apply_reload(&config)
        })
    }

    pub fn stop(&self) {
        self.monitor.stop();
    }
}
