// Netting Status Checker Library
// Decides when a multi-part netting process has finished and publishes its outcome

pub mod audit;
pub mod checker;
pub mod config;
pub mod consumer;
pub mod errors;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod publisher;
pub mod store;

// Re-exports
pub use audit::{StatusLogger, StoreStatusLogger};
pub use checker::{CompletionChecker, Evaluation};
pub use crate::config::{ClaimMode, Config};
pub use errors::{CheckerError, Result};
pub use models::*;
pub use publisher::{NatsOutcomePublisher, OutcomePublisher};
pub use store::{RedisSetStore, SetStore};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const SERVICE_NAME: &str = "netting-checker";
