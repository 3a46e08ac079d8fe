//! Configuration for the relay service.
//!
//! Every endpoint, deadline and pool setting lives here and is handed to the
//! relay at construction. Durations are written as humantime strings.

use std::net::SocketAddr;
use std::time::Duration;

use calc_bootstrap::LoggingConfig;
use calc_transport_grpc::{GrpcClientConfig, RpcRetryConfig, build_endpoint};
use serde::{Deserialize, Serialize};

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:50051";
pub const DEFAULT_UPSTREAM_URI: &str = "http://127.0.0.1:50052";

/// Typed configuration resolved from defaults, YAML and `CALCULATOR_GATEWAY__*`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct GatewayConfig {
    pub listen_addr: String,
    pub upstream: UpstreamConfig,
    pub logging: LoggingConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_owned(),
            upstream: UpstreamConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// How the outbound deadline relates to the inbound caller's deadline.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeadlinePolicy {
    /// Always use the configured budget.
    #[default]
    Fixed,
    /// Use the smaller of the budget and the caller's remaining `grpc-timeout`.
    CallerBounded,
}

impl DeadlinePolicy {
    /// Outbound budget for one relayed request.
    #[must_use]
    pub fn effective_budget(self, budget: Duration, caller: Option<Duration>) -> Duration {
        match (self, caller) {
            (Self::CallerBounded, Some(caller)) => budget.min(caller),
            _ => budget,
        }
    }
}

/// The calculation service as seen from the relay.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct UpstreamConfig {
    pub uri: String,

    /// Budget for one relayed request, shared by all of its attempts.
    #[serde(with = "calc_bootstrap::humantime_serde")]
    pub deadline: Duration,

    #[serde(with = "calc_bootstrap::humantime_serde")]
    pub connect_timeout: Duration,

    pub deadline_policy: DeadlinePolicy,
    pub pool: PoolConfig,
    pub retry: RetryConfig,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            uri: DEFAULT_UPSTREAM_URI.to_owned(),
            deadline: Duration::from_secs(1),
            connect_timeout: Duration::from_secs(1),
            deadline_policy: DeadlinePolicy::Fixed,
            pool: PoolConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl UpstreamConfig {
    /// Transport settings for dialing the calculation service.
    #[must_use]
    pub fn client_config(&self) -> GrpcClientConfig {
        GrpcClientConfig::new("calculator").with_connect_timeout(self.connect_timeout)
    }
}

/// Outbound connection pool limits.
///
/// `max_idle = 0` dials a fresh connection for every request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PoolConfig {
    /// Connections in use at the same time.
    pub max_connections: usize,
    /// Connections kept open between requests.
    pub max_idle: usize,
    #[serde(with = "calc_bootstrap::humantime_serde")]
    pub idle_timeout: Duration,
    /// How long a request waits for a free slot before failing.
    #[serde(with = "calc_bootstrap::humantime_serde")]
    pub acquire_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 64,
            max_idle: 8,
            idle_timeout: Duration::from_secs(90),
            acquire_timeout: Duration::from_secs(1),
        }
    }
}

/// Opt-in retry of transient upstream failures.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    pub max_retries: u32,
    #[serde(with = "calc_bootstrap::humantime_serde")]
    pub base_backoff: Duration,
    #[serde(with = "calc_bootstrap::humantime_serde")]
    pub max_backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let policy = RpcRetryConfig::default();
        Self {
            max_retries: policy.max_retries,
            base_backoff: policy.base_backoff,
            max_backoff: policy.max_backoff,
        }
    }
}

impl From<&RetryConfig> for RpcRetryConfig {
    fn from(cfg: &RetryConfig) -> Self {
        RpcRetryConfig::new(cfg.max_retries)
            .with_base_backoff(cfg.base_backoff)
            .with_max_backoff(cfg.max_backoff)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("listen_addr '{addr}' is not a socket address: {source}")]
    ListenAddr {
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("upstream.uri is invalid: {0}")]
    UpstreamUri(#[from] calc_transport_grpc::ConnectError),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

impl GatewayConfig {
    /// Check values that deserialize fine but cannot be used.
    ///
    /// # Errors
    /// Returns [`ValidationError`] describing the first offending field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listen_addr
            .parse::<SocketAddr>()
            .map_err(|source| ValidationError::ListenAddr {
                addr: self.listen_addr.clone(),
                source,
            })?;

        let upstream = &self.upstream;
        build_endpoint(&upstream.uri, &upstream.client_config())?;

        if upstream.deadline.is_zero() {
            return Err(ValidationError::Zero("upstream.deadline"));
        }
        if upstream.connect_timeout.is_zero() {
            return Err(ValidationError::Zero("upstream.connect_timeout"));
        }
        if upstream.pool.max_connections == 0 {
            return Err(ValidationError::Zero("upstream.pool.max_connections"));
        }
        if upstream.pool.acquire_timeout.is_zero() {
            return Err(ValidationError::Zero("upstream.pool.acquire_timeout"));
        }
        Ok(())
    }
}
