//! Failover chains.
//!
//! A chain belongs to one outbound call. Every provider that failed during
//! the call stays excluded, and the chain hands out at most
//! `max_failover_attempts` alternatives. `None` means the caller has no
//! alternative left and must surface the failure.
//!
//! Chains only compute alternatives; folding the failure into the monitor is
//! `LoadBalancer::report_failure`.

use crate::load_balancer::balancer::LoadBalancer;
use crate::observability::metrics;

pub struct FailoverChain<'a> {
    balancer: &'a LoadBalancer,
    excluded: Vec<String>,
    attempts: u32,
}

impl<'a> FailoverChain<'a> {
    pub(crate) fn new(balancer: &'a LoadBalancer) -> Self {
        Self {
            balancer,
            excluded: Vec::new(),
            attempts: 0,
        }
    }

    /// Providers excluded so far.
    pub fn excluded(&self) -> &[String] {
        &self.excluded
    }

    /// Alternatives handed out so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Exclude `failed` and select an alternative from what remains.
    pub fn next<S: AsRef<str>>(&mut self, failed: &str, providers: &[S]) -> Option<String> {
        let config = self.balancer.config();
        if !config.failover_enabled {
            metrics::record_failover("disabled");
            return None;
        }

        if !self.excluded.iter().any(|id| id == failed) {
            self.excluded.push(failed.to_string());
        }

        if self.attempts >= config.max_failover_attempts {
            tracing::warn!(
                failed = %failed,
                attempts = self.attempts,
                "Failover attempts exhausted"
            );
            metrics::record_failover("exhausted");
            return None;
        }

        let remaining: Vec<&str> = providers
            .iter()
            .map(|p| p.as_ref())
            .filter(|id| !self.excluded.iter().any(|e| e == id))
            .collect();

        if remaining.is_empty() {
            tracing::warn!(failed = %failed, "No failover candidates left");
            metrics::record_failover("no_candidates");
            return None;
        }

        self.attempts += 1;
        let choice = self.balancer.select(remaining.as_slice());
        if let Some(next) = &choice {
            tracing::info!(
                failed = %failed,
                next = %next,
                attempt = self.attempts,
                "Failing over"
            );
            metrics::record_failover("selected");
        }
        choice
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{BalancerConfig, MonitorConfig, Strategy};
    use crate::health::HealthMonitor;
    use crate::load_balancer::LoadBalancer;
    use std::sync::Arc;

    fn balancer(config: BalancerConfig) -> LoadBalancer {
        let monitor = Arc::new(HealthMonitor::new(MonitorConfig::default()).unwrap());
        LoadBalancer::new(monitor, config)
    }

    fn round_robin(max_failover_attempts: u32) -> BalancerConfig {
        BalancerConfig {
            strategy: Strategy::RoundRobin,
            max_failover_attempts,
            ..Default::default()
        }
    }

    #[test]
    fn test_no_alternative() {
        let lb = balancer(BalancerConfig::default());
        assert_eq!(lb.failover("a", &["a"]), None);
        assert_eq!(lb.failover::<&str>("a", &[]), None);
    }

    #[test]
    fn test_failover_never_returns_current() {
        let lb = balancer(BalancerConfig::default());
        for _ in 0..50 {
            let next = lb.failover("a", &["a", "b", "c"]).unwrap();
            assert_ne!(next, "a");
        }
    }

    #[test]
    fn test_chain_excludes_earlier_failures() {
        let lb = balancer(round_robin(3));
        let providers = ["a", "b", "c", "d"];
        let mut chain = lb.failover_chain();

        let first = chain.next("a", &providers).unwrap();
        assert_eq!(first, "b");
        let second = chain.next(&first, &providers).unwrap();
        assert_eq!(second, "c");
        let third = chain.next(&second, &providers).unwrap();
        assert_eq!(third, "d");

        assert_eq!(chain.attempts(), 3);
        assert_eq!(chain.excluded(), ["a", "b", "c"]);
        // attempts exhausted even though nothing else failed yet
        assert_eq!(chain.next(&third, &providers), None);
    }

    #[test]
    fn test_chain_runs_out_of_candidates() {
        let lb = balancer(round_robin(10));
        let providers = ["a", "b"];
        let mut chain = lb.failover_chain();

        assert_eq!(chain.next("a", &providers).as_deref(), Some("b"));
        assert_eq!(chain.next("b", &providers), None);
    }

    #[test]
    fn test_disabled_or_zero_attempts() {
        let disabled = balancer(BalancerConfig {
            failover_enabled: false,
            ..Default::default()
        });
        assert_eq!(disabled.failover("a", &["a", "b"]), None);

        let zero = balancer(round_robin(0));
        assert_eq!(zero.failover("a", &["a", "b"]), None);
    }
}
