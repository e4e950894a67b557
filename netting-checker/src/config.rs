use ::config::builder::DefaultState;
use ::config::{ConfigBuilder, ConfigError, Environment};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub redis: RedisConfig,
    pub nats: NatsConfig,
    pub checker: CheckerConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RedisConfig {
    pub url: String,
    /// Expiry for status markers, 0 keeps them forever
    pub marker_ttl_seconds: u64,
}

impl RedisConfig {
    pub fn marker_ttl(&self) -> Option<u64> {
        (self.marker_ttl_seconds > 0).then_some(self.marker_ttl_seconds)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct NatsConfig {
    pub url: String,
    pub trigger_subject: String,
    pub queue_group: String,
    pub outcome_subject: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CheckerConfig {
    pub claim_mode: ClaimMode,
    pub max_concurrent: usize,
}

/// How an evaluation takes ownership of finishing a process
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClaimMode {
    /// Single SET NX on the log key
    #[default]
    Atomic,
    /// GET the log key, then SET it when absent. Racy under concurrent triggers.
    CheckThenSet,
}

impl Config {
    /// Builder preloaded with the service defaults
    pub fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        ::config::Config::builder()
            // Server defaults
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8090)?
            // Redis defaults
            .set_default("redis.url", "redis://redis:6379")?
            .set_default("redis.marker_ttl_seconds", 0)?
            // NATS defaults
            .set_default("nats.url", "nats://nats:4222")?
            .set_default("nats.trigger_subject", "netting.part_two.trigger")?
            .set_default("nats.queue_group", "netting-status-checker")?
            .set_default("nats.outcome_subject", "netting.part_two.completed")?
            // Checker
            .set_default("checker.claim_mode", "atomic")?
            .set_default("checker.max_concurrent", 32)
    }

    pub fn from_env() -> crate::errors::Result<Self> {
        dotenv::dotenv().ok();

        let mut builder = Self::defaults()?
            .add_source(Environment::with_prefix("NETTING_CHECKER").separator("__"));

        // Override from environment variables
        if let Ok(port) = env::var("SERVICE_PORT") {
            builder = builder.set_override("server.port", port)?;
        }

        if let Ok(redis_url) = env::var("REDIS_URL") {
            builder = builder.set_override("redis.url", redis_url)?;
        }

        if let Ok(nats_url) = env::var("NATS_URL") {
            builder = builder.set_override("nats.url", nats_url)?;
        }

        Ok(builder.build()?.try_deserialize()?)
    }
}
