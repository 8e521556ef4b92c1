//! Health-aware provider selection.
//!
//! # Responsibilities
//! - Build a candidate pool from the caller's provider list
//! - Apply the configured strategy over the monitor's latest snapshot
//! - Route externally observed failures back into the monitor
//! - Compute failover alternatives

use std::collections::HashSet;
use std::sync::Arc;

use crate::config::{BalancerConfig, Strategy};
use crate::health::{HealthMonitor, HealthRecord, HealthStatus};
use crate::load_balancer::failover::FailoverChain;
use crate::load_balancer::round_robin::RoundRobin;
use crate::load_balancer::strategy;
use crate::observability::metrics;

/// A provider as seen at selection time.
#[derive(Debug, Clone, Copy)]
struct Candidate<'a> {
    id: &'a str,
    status: HealthStatus,
    score: f64,
}

/// Selection priority under `prefer_healthy`; lower is tried first.
fn tier(status: HealthStatus) -> u8 {
    match status {
        HealthStatus::Healthy => 0,
        HealthStatus::Degraded | HealthStatus::Unknown => 1,
        HealthStatus::Unhealthy => 2,
    }
}

/// Selects providers from a monitor's snapshot.
pub struct LoadBalancer {
    monitor: Arc<HealthMonitor>,
    config: BalancerConfig,
    rotation: RoundRobin,
}

impl LoadBalancer {
    pub fn new(monitor: Arc<HealthMonitor>, config: BalancerConfig) -> Self {
        Self {
            monitor,
            config,
            rotation: RoundRobin::new(),
        }
    }

    pub fn monitor(&self) -> &Arc<HealthMonitor> {
        &self.monitor
    }

    pub fn config(&self) -> &BalancerConfig {
        &self.config
    }

    /// Pick one provider id from `providers`. `None` only for an empty list.
    pub fn select<S: AsRef<str>>(&self, providers: &[S]) -> Option<String> {
        let candidates = self.candidates(providers);
        if candidates.is_empty() {
            return None;
        }

        let mut pool = candidates.clone();
        if self.config.exclude_unhealthy {
            pool.retain(|c| c.status != HealthStatus::Unhealthy);
            if pool.is_empty() {
                tracing::debug!("All candidates unhealthy, selecting from the full list");
                pool = candidates;
            }
        }

        if self.config.prefer_healthy {
            if let Some(best) = pool.iter().map(|c| tier(c.status)).min() {
                pool.retain(|c| tier(c.status) == best);
            }
        }

        let index = match self.config.strategy {
            Strategy::Weighted => {
                let weights: Vec<f64> = pool.iter().map(|c| c.score).collect();
                strategy::weighted(&weights, &mut rand::thread_rng())
            }
            Strategy::RoundRobin => {
                let ids: Vec<&str> = pool.iter().map(|c| c.id).collect();
                self.rotation.next_index(&ids)
            }
            Strategy::Random => strategy::uniform(pool.len(), &mut rand::thread_rng()),
        };

        let chosen = pool[index];
        tracing::debug!(
            provider = %chosen.id,
            status = %chosen.status,
            score = chosen.score,
            pool = pool.len(),
            strategy = ?self.config.strategy,
            "Provider selected"
        );
        metrics::record_selection(chosen.id);
        Some(chosen.id.to_string())
    }

    /// Fold a failure the caller observed on real traffic into the monitor.
    /// Returns the provider's new status, or `None` if it is not registered.
    pub fn report_failure(&self, provider_id: &str) -> Option<HealthStatus> {
        let status = self.monitor.record_failure(provider_id, "reported by caller");
        tracing::debug!(provider = %provider_id, status = ?status, "Failure reported");
        status
    }

    /// One-shot alternative to `current`. For repeated failover within one
    /// request, use `failover_chain()` so earlier picks stay excluded.
    pub fn failover<S: AsRef<str>>(&self, current: &str, providers: &[S]) -> Option<String> {
        self.failover_chain().next(current, providers)
    }

    /// Start a failover chain for a single outbound call.
    pub fn failover_chain(&self) -> FailoverChain<'_> {
        FailoverChain::new(self)
    }

    /// Unique providers in input order, with their current health.
    /// Unregistered ids are scored like a fresh record.
    fn candidates<'a, S: AsRef<str>>(&self, providers: &'a [S]) -> Vec<Candidate<'a>> {
        let mut seen = HashSet::new();
        providers
            .iter()
            .map(|p| p.as_ref())
            .filter(|id| seen.insert(*id))
            .map(|id| {
                let record = self
                    .monitor
                    .health(id)
                    .unwrap_or_else(|| HealthRecord::new(id));
                Candidate {
                    id,
                    status: record.status,
                    score: record.score(),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MonitorConfig;
    use std::collections::HashMap;

    fn record(id: &str, status: HealthStatus) -> HealthRecord {
        HealthRecord {
            status,
            ..HealthRecord::new(id)
        }
    }

    fn balancer(records: Vec<HealthRecord>, config: BalancerConfig) -> LoadBalancer {
        let monitor = Arc::new(HealthMonitor::new(MonitorConfig::default()).unwrap());
        monitor.restore(records);
        LoadBalancer::new(monitor, config)
    }

    fn config(strategy: Strategy) -> BalancerConfig {
        BalancerConfig {
            strategy,
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_list_selects_nothing() {
        for strategy in [Strategy::Weighted, Strategy::RoundRobin, Strategy::Random] {
            let lb = balancer(vec![], config(strategy));
            assert_eq!(lb.select::<&str>(&[]), None);
        }
    }

    #[test]
    fn test_unhealthy_excluded_unless_nothing_else() {
        let lb = balancer(
            vec![
                record("a", HealthStatus::Unhealthy),
                record("b", HealthStatus::Degraded),
            ],
            config(Strategy::Random),
        );
        for _ in 0..50 {
            assert_eq!(lb.select(&["a", "b"]).as_deref(), Some("b"));
        }
        // total outage: still hand out something
        assert_eq!(lb.select(&["a"]).as_deref(), Some("a"));
    }

    #[test]
    fn test_unhealthy_kept_when_exclusion_disabled() {
        let lb = balancer(
            vec![
                record("a", HealthStatus::Unhealthy),
                record("b", HealthStatus::Healthy),
            ],
            BalancerConfig {
                strategy: Strategy::RoundRobin,
                exclude_unhealthy: false,
                prefer_healthy: false,
                ..Default::default()
            },
        );
        let picks: Vec<_> = (0..4).filter_map(|_| lb.select(&["a", "b"])).collect();
        assert_eq!(picks, vec!["a", "b", "a", "b"]);
    }

    #[test]
    fn test_prefer_healthy_tiers() {
        let lb = balancer(
            vec![
                record("h", HealthStatus::Healthy),
                record("d", HealthStatus::Degraded),
                record("u", HealthStatus::Unknown),
            ],
            config(Strategy::Weighted),
        );
        for _ in 0..50 {
            assert_eq!(lb.select(&["d", "u", "h"]).as_deref(), Some("h"));
        }

        let mut seen = HashMap::new();
        for _ in 0..200 {
            let pick = lb.select(&["d", "u"]).unwrap();
            *seen.entry(pick).or_insert(0) += 1;
        }
        assert_eq!(seen.len(), 2, "degraded and unknown share a tier: {seen:?}");
    }

    #[test]
    fn test_round_robin_rotates_within_pool() {
        let lb = balancer(vec![], config(Strategy::RoundRobin));
        let picks: Vec<_> = (0..4).filter_map(|_| lb.select(&["x", "y", "z"])).collect();
        assert_eq!(picks, vec!["x", "y", "z", "x"]);

        // pool changed: rotation restarts
        assert_eq!(lb.select(&["x", "y"]).as_deref(), Some("x"));
    }

    #[test]
    fn test_duplicates_are_ignored() {
        let lb = balancer(vec![], config(Strategy::RoundRobin));
        let picks: Vec<_> = (0..3).filter_map(|_| lb.select(&["x", "x", "y"])).collect();
        assert_eq!(picks, vec!["x", "y", "x"]);
    }

    #[test]
    fn test_unregistered_providers_are_selectable() {
        let lb = balancer(vec![], config(Strategy::Weighted));
        assert_eq!(lb.select(&["new"]).as_deref(), Some("new"));
    }

    #[test]
    fn test_report_failure_degrades_status() {
        let lb = balancer(vec![], config(Strategy::RoundRobin));
        lb.monitor().set_providers(&[crate::provider::ProviderDescriptor::new(
            "a",
            "A",
            vec![],
        )]);

        assert_eq!(lb.report_failure("a"), Some(HealthStatus::Unhealthy));
        assert_eq!(lb.monitor().health("a").unwrap().consecutive_failures, 1);
        assert_eq!(lb.report_failure("ghost"), None);
    }
}
