//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Caller supplies candidate provider ids
//!     → balancer.rs reads the monitor's current records
//!     → drop unhealthy (unless that leaves nothing)
//!     → keep the best health tier (prefer_healthy)
//!     → apply strategy:
//!         - strategy.rs (weighted by score, or uniform random)
//!         - round_robin.rs (rotate through the pool)
//!     → provider id, or None for an empty list
//!
//! Provider fails on real traffic:
//!     → report_failure() folds it into the monitor
//!     → failover.rs picks an alternative, excluding earlier failures
//! ```
//!
//! # Design Decisions
//! - The balancer never probes and never writes records itself
//! - Selection is synchronous; only the rotation index is mutable
//! - Running out of alternatives is a `None`, not an error

pub mod balancer;
pub mod failover;
pub mod round_robin;
pub mod strategy;

pub use balancer::LoadBalancer;
pub use failover::FailoverChain;
