//! Active health monitoring.
//!
//! # Responsibilities
//! - Own the per-provider health records
//! - Periodically probe every registered provider
//! - Fold probe and externally reported results into the records
//! - Answer status and ranking queries
//!
//! # Design Decisions
//! - Registration is idempotent; history survives repeated registration
//! - One probe cycle at a time: a tick that fires while a cycle is
//!   outstanding is dropped
//! - Providers are probed concurrently and each result is applied as soon as
//!   its own probe finishes
//! - `stop()` only cancels future ticks; an in-flight cycle completes

use arc_swap::ArcSwap;
use dashmap::DashMap;
use futures_util::future::join_all;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tokio::sync::{broadcast, oneshot, Mutex as CycleLock};
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::config::validation::validate_monitor;
use crate::config::{ConfigError, MonitorConfig};
use crate::health::probe::{HealthCheckResult, HealthProbe, ProbeFailure, Reachability};
use crate::health::state::{HealthRecord, HealthStatus};
use crate::observability::metrics;
use crate::provider::ProviderDescriptor;

pub struct HealthMonitor {
    config: MonitorConfig,
    probe: HealthProbe,
    /// Latest descriptor for every registered provider, in registration order.
    providers: ArcSwap<Vec<ProviderDescriptor>>,
    records: DashMap<String, HealthRecord>,
    /// Registration order, used to keep ranking stable on ties.
    order: RwLock<Vec<String>>,
    cycle: CycleLock<()>,
    /// Stop signal of the scheduled ticker, if one is running.
    schedule: Mutex<Option<broadcast::Sender<()>>>,
}

impl HealthMonitor {
    /// Create a monitor that probes over HTTP.
    pub fn new(config: MonitorConfig) -> Result<Self, ConfigError> {
        validate_monitor(&config).map_err(ConfigError::Validation)?;
        let probe = HealthProbe::http(config.timeout());
        Ok(Self::with_probe(config, probe))
    }

    /// Create a monitor on top of a custom reachability primitive.
    pub fn with_reachability(
        config: MonitorConfig,
        reachability: Arc<dyn Reachability>,
    ) -> Result<Self, ConfigError> {
        validate_monitor(&config).map_err(ConfigError::Validation)?;
        let probe = HealthProbe::new(reachability, config.timeout());
        Ok(Self::with_probe(config, probe))
    }

    fn with_probe(config: MonitorConfig, probe: HealthProbe) -> Self {
        Self {
            config,
            probe,
            providers: ArcSwap::from_pointee(Vec::new()),
            records: DashMap::new(),
            order: RwLock::new(Vec::new()),
            cycle: CycleLock::new(()),
            schedule: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Register providers. Unknown ids get a fresh record; known ids keep
    /// their history and only have their descriptor refreshed.
    pub fn set_providers(&self, providers: &[ProviderDescriptor]) {
        let mut order = self.order.write().unwrap_or_else(PoisonError::into_inner);
        let mut descriptors: Vec<ProviderDescriptor> = (**self.providers.load()).clone();
        let mut added = 0usize;

        for provider in providers {
            match descriptors.iter_mut().find(|d| d.id == provider.id) {
                Some(existing) => *existing = provider.clone(),
                None => descriptors.push(provider.clone()),
            }

            if !self.records.contains_key(&provider.id) {
                self.records
                    .insert(provider.id.clone(), HealthRecord::new(provider.id.clone()));
                order.push(provider.id.clone());
                metrics::record_registered(&provider.id, true);
                metrics::record_status(&provider.id, HealthStatus::Unknown);
                added += 1;
            }
        }

        self.providers.store(Arc::new(descriptors));
        tracing::debug!(added, total = order.len(), "Providers registered");
    }

    /// Descriptors of every registered provider.
    pub fn providers(&self) -> Arc<Vec<ProviderDescriptor>> {
        self.providers.load_full()
    }

    /// Probe one provider without touching any record.
    pub async fn check(&self, provider: &ProviderDescriptor) -> HealthCheckResult {
        self.probe.check(provider).await
    }

    /// Run one cycle now, then keep probing every `check_interval` until
    /// `stop()`. Does nothing if a schedule is already active.
    ///
    /// The schedule lives in its own task, so dropping the returned future
    /// before the first cycle finishes does not stop it.
    pub async fn start(self: &Arc<Self>) {
        let stop_rx = {
            let mut slot = self.schedule.lock().unwrap_or_else(PoisonError::into_inner);
            if slot.is_some() {
                tracing::debug!("Health monitor already running");
                return;
            }
            let (tx, rx) = broadcast::channel(1);
            *slot = Some(tx);
            rx
        };

        tracing::info!(
            interval_ms = self.config.check_interval_ms,
            timeout_ms = self.config.timeout_ms,
            providers = self.providers.load().len(),
            "Health monitor starting"
        );

        let (first_done, first_cycle) = oneshot::channel();
        let monitor = Arc::clone(self);
        tokio::spawn(async move { monitor.run(stop_rx, first_done).await });
        let _ = first_cycle.await;
    }

    /// Cancel future cycles. An in-flight cycle still applies its results.
    pub fn stop(&self) {
        let tx = self
            .schedule
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        match tx {
            Some(tx) => {
                let _ = tx.send(());
                tracing::info!("Health monitor stopped");
            }
            None => tracing::debug!("Health monitor not running"),
        }
    }

    pub fn is_running(&self) -> bool {
        self.schedule
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    async fn run(self: Arc<Self>, mut stop: broadcast::Receiver<()>, first_done: oneshot::Sender<()>) {
        self.run_cycle().await;
        let _ = first_done.send(());

        let interval = self.config.check_interval();
        let mut ticker = time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = stop.recv() => {
                    tracing::debug!("Health monitor received stop signal, exiting loop");
                    break;
                }
                _ = ticker.tick() => {
                    self.try_run_cycle().await;
                }
            }
        }
    }

    /// Probe every registered provider once, waiting for any outstanding
    /// cycle first. Returns the number of providers probed.
    pub async fn run_cycle(&self) -> usize {
        let _cycle = self.cycle.lock().await;
        self.probe_all().await
    }

    async fn try_run_cycle(&self) -> Option<usize> {
        match self.cycle.try_lock() {
            Ok(_cycle) => Some(self.probe_all().await),
            Err(_) => {
                tracing::debug!("Previous probe cycle still running, skipping tick");
                None
            }
        }
    }

    async fn probe_all(&self) -> usize {
        let providers = self.providers.load_full();

        let checks = providers.iter().map(|provider| async move {
            let result = self.probe.check(provider).await;
            metrics::record_probe(&provider.id, &result);
            if let Some(reason) = &result.failure {
                tracing::warn!(
                    provider = %provider.id,
                    reason = %reason,
                    latency_ms = result.latency_ms,
                    "Health check failed"
                );
            }
            self.apply(&provider.id, &result);
        });
        join_all(checks).await;

        tracing::debug!(probed = providers.len(), "Probe cycle complete");
        providers.len()
    }

    /// Fold a result into a provider's record. Unknown ids are ignored.
    fn apply(&self, provider_id: &str, result: &HealthCheckResult) -> Option<HealthStatus> {
        let (previous, current) = {
            let mut record = self.records.get_mut(provider_id)?;
            let previous = record.apply(result, &self.config);
            (previous, record.status)
        };

        if previous != current {
            tracing::info!(
                provider = %provider_id,
                from = %previous,
                to = %current,
                "Provider health changed"
            );
        }
        metrics::record_status(provider_id, current);
        Some(current)
    }

    /// Apply a failure observed outside the probe cycle (e.g. an HTTP error
    /// on real traffic). Returns the new status, or `None` for unknown ids.
    pub fn record_failure(&self, provider_id: &str, reason: impl Into<String>) -> Option<HealthStatus> {
        let result = HealthCheckResult::failure(ProbeFailure::Reported(reason.into()), 0);
        self.apply(provider_id, &result)
    }

    pub fn health(&self, provider_id: &str) -> Option<HealthRecord> {
        self.records.get(provider_id).map(|r| r.value().clone())
    }

    pub fn status(&self, provider_id: &str) -> Option<HealthStatus> {
        self.records.get(provider_id).map(|r| r.status)
    }

    pub fn score(&self, provider_id: &str) -> Option<f64> {
        self.records.get(provider_id).map(|r| r.score())
    }

    /// Every record, in registration order.
    pub fn all(&self) -> Vec<HealthRecord> {
        let order = self.order.read().unwrap_or_else(PoisonError::into_inner);
        order.iter().filter_map(|id| self.health(id)).collect()
    }

    /// Every record by descending score; ties keep registration order.
    pub fn ranked_providers(&self) -> Vec<HealthRecord> {
        let mut records = self.all();
        // stable sort
        records.sort_by(|a, b| b.score().total_cmp(&a.score()));
        records
    }

    pub fn healthy_providers(&self) -> Vec<HealthRecord> {
        self.all()
            .into_iter()
            .filter(|r| r.status == HealthStatus::Healthy)
            .collect()
    }

    pub fn best(&self) -> Option<HealthRecord> {
        self.ranked_providers().into_iter().next()
    }

    /// Forget a provider's history. Status becomes unknown, not healthy.
    pub fn reset(&self, provider_id: &str) -> bool {
        match self.records.get_mut(provider_id) {
            Some(mut record) => {
                record.reset();
                drop(record);
                metrics::record_status(provider_id, HealthStatus::Unknown);
                tracing::info!(provider = %provider_id, "Provider health reset");
                true
            }
            None => false,
        }
    }

    /// Drop every record and descriptor. Cleared providers report
    /// `provider_health_registered 0`.
    pub fn clear_all(&self) {
        let mut order = self.order.write().unwrap_or_else(PoisonError::into_inner);
        for id in order.drain(..) {
            metrics::record_registered(&id, false);
        }
        self.records.clear();
        self.providers.store(Arc::new(Vec::new()));
        tracing::info!("All provider health records cleared");
    }

    /// Snapshot of every record, in registration order.
    pub fn export(&self) -> Vec<HealthRecord> {
        self.all()
    }

    /// Register records from an exported snapshot. Ids that are already
    /// registered are overwritten in place and keep their position.
    ///
    /// Descriptors are not part of a snapshot; providers only get probed once
    /// they are passed to `set_providers`, which leaves restored history intact.
    /// Counters that contradict each other are repaired on the way in.
    pub fn restore(&self, snapshot: Vec<HealthRecord>) {
        let mut order = self.order.write().unwrap_or_else(PoisonError::into_inner);
        for mut record in snapshot {
            record.normalize();
            if !self.records.contains_key(&record.provider_id) {
                order.push(record.provider_id.clone());
                metrics::record_registered(&record.provider_id, true);
            }
            metrics::record_status(&record.provider_id, record.status);
            self.records.insert(record.provider_id.clone(), record);
        }
    }
}
