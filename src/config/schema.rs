//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the listener.
//! All types derive Serde traits for deserialization from config files.

use std::net::Ipv4Addr;
use std::time::Duration;

use serde::Deserialize;

/// Root configuration for the single-connection listener.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Listening endpoint (address, port, backlog).
    pub listener: ListenerConfig,

    /// Per-connection settings (buffer size, deadlines).
    pub connection: ConnectionConfig,

    /// Bind retry configuration.
    pub retries: RetryConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// IPv4 address to bind (wildcard by default).
    pub bind_address: Ipv4Addr,

    /// TCP port. `0` asks the OS for an ephemeral port.
    pub port: u16,

    /// Maximum number of pending connections queued by the kernel.
    pub backlog: u32,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: Ipv4Addr::UNSPECIFIED,
            port: 8080,
            backlog: 1024,
        }
    }
}

/// Connection configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Read buffer capacity in bytes. Each read fills at most `capacity - 1`.
    pub buffer_capacity: usize,

    /// Give up waiting for a client after this many seconds (none = wait forever).
    pub accept_timeout_secs: Option<u64>,

    /// Give up on a connected peer that sends nothing for this many seconds.
    pub idle_timeout_secs: Option<u64>,
}

impl ConnectionConfig {
    pub fn accept_timeout(&self) -> Option<Duration> {
        self.accept_timeout_secs.map(Duration::from_secs)
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: 256,
            accept_timeout_secs: None,
            idle_timeout_secs: None,
        }
    }
}

/// Bind retry configuration.
///
/// Only `AddrInUse` failures are retried; the address may still be held by a
/// socket in TIME_WAIT or by a previous instance that is shutting down.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetryConfig {
    /// Enable bind retries.
    pub enabled: bool,

    /// Maximum number of bind attempts, including the first.
    pub max_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_attempts: 5,
            base_delay_ms: 100,
            max_delay_ms: 2000,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable multi-line output.
    Pretty,
    /// Single-line output.
    #[default]
    Compact,
    /// Newline-delimited JSON for machine parsing.
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format: {}", other)),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Compact,
        }
    }
}
