//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → HealthConfig (validated, immutable)
//!     → monitor / balancer / daemon settings
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → provider list re-registered with the monitor
//! ```
//!
//! # Design Decisions
//! - Monitor and balancer settings are fixed at construction; only the
//!   provider list is picked up on reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AdminConfig, BalancerConfig, HealthConfig, LogFormat, MonitorConfig, ObservabilityConfig,
    Strategy,
};
pub use validation::ValidationError;
