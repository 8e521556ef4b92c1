//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Probe cycle (monitor.rs):
//!     Periodic timer
//!     → probe.rs checks every provider concurrently
//!     → state.rs folds each result into the provider's record
//!
//! Reported failures (monitor.rs):
//!     Caller observes an error on real traffic
//!     → record_failure() applies it like a failed probe
//!
//! State machine (state.rs):
//!     Unknown → Healthy / Degraded / Unhealthy
//!     Consecutive failures give hysteresis against flapping
//! ```
//!
//! # Design Decisions
//! - Probes never fail; outcomes are values
//! - Health state is per-provider
//! - Only the monitor writes records; everyone else reads snapshots

pub mod monitor;
pub mod probe;
pub mod state;

pub use monitor::HealthMonitor;
pub use probe::{
    HealthCheckResult, HealthProbe, HttpReachability, ProbeFailure, ReachError, Reachability,
};
pub use state::{HealthRecord, HealthStatus};
