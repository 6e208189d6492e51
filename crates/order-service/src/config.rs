//! # Configuration
//!
//! Command-line settings for the order service. Every flag has a default, so
//! `Settings::default()` and a bare `order-service` invocation agree.
//!
//! `--max-shards` must be the same on every process routing to the same orders; changing it
//! moves almost every order to a different shard.

use clap::Parser;
use shard_framework::RegionSettings;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(name = "order-service")]
#[command(version, about = "Sharded order entities behind an HTTP gateway", long_about = None)]
pub struct Settings {
    /// Number of shards orders are routed over
    #[arg(long, default_value_t = 30)]
    pub max_shards: u32,

    /// Size of the worker pool shards are allocated over
    #[arg(long, default_value_t = 3)]
    pub workers: u32,

    /// Mailbox capacity per order runtime
    #[arg(long, default_value_t = 32)]
    pub mailbox_size: usize,

    /// How long a request waits for its order to reply
    #[arg(long, default_value_t = 5000)]
    pub ask_timeout_ms: u64,

    #[arg(long, default_value_t = 8080)]
    pub http_port: u16,

    /// Artificial latency added to every in-memory store call
    #[arg(long, default_value_t = 0)]
    pub store_latency_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("max-shards must be at least 1")]
    NoShards,
    #[error("workers must be at least 1")]
    NoWorkers,
    #[error("mailbox-size must be at least 1")]
    NoMailbox,
    #[error("ask-timeout-ms must be at least 1")]
    NoTimeout,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_shards: 30,
            workers: 3,
            mailbox_size: 32,
            ask_timeout_ms: 5000,
            http_port: 8080,
            store_latency_ms: 0,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_shards == 0 {
            return Err(ConfigError::NoShards);
        }
        if self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.mailbox_size == 0 {
            return Err(ConfigError::NoMailbox);
        }
        if self.ask_timeout_ms == 0 {
            return Err(ConfigError::NoTimeout);
        }
        Ok(())
    }

    pub fn ask_timeout(&self) -> Duration {
        Duration::from_millis(self.ask_timeout_ms)
    }

    pub fn store_latency(&self) -> Duration {
        Duration::from_millis(self.store_latency_ms)
    }

    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.http_port))
    }

    pub fn region_settings(&self) -> RegionSettings {
        RegionSettings {
            max_shards: self.max_shards,
            workers: self.workers,
            mailbox_size: self.mailbox_size,
            ask_timeout: self.ask_timeout(),
        }
    }
}
