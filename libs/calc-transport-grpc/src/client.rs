//! gRPC client transport configuration and connection utilities.
//!
//! This module configures outbound channels with:
//! - A bounded connect timeout
//! - TCP and HTTP/2 keepalive so dead peers are noticed
//! - Tracing spans around connection establishment
//!
//! **Note:** per-call deadlines are owned by the caller, not by the channel.

use std::time::Duration;

use tonic::transport::{Channel, Endpoint};
use tracing::Instrument;

fn duration_to_u64_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Failure to establish an outbound channel.
#[derive(thiserror::Error, Debug)]
pub enum ConnectError {
    #[error("invalid endpoint uri '{uri}': {source}")]
    InvalidUri {
        uri: String,
        #[source]
        source: tonic::transport::Error,
    },

    #[error("failed to connect to '{uri}': {source}")]
    Connect {
        uri: String,
        #[source]
        source: tonic::transport::Error,
    },

    #[error("failed to connect to {service} after {attempts} attempts: {last}")]
    Exhausted {
        service: &'static str,
        attempts: u32,
        #[source]
        last: Box<ConnectError>,
    },
}

/// Configuration for the gRPC client transport stack.
#[derive(Debug, Clone)]
pub struct GrpcClientConfig {
    /// Timeout for establishing a connection.
    pub connect_timeout: Duration,

    /// TCP keepalive probe interval.
    pub tcp_keepalive: Duration,

    /// HTTP/2 PING interval.
    pub http2_keepalive_interval: Duration,

    /// How long to wait for a PING ack before the connection is considered dead.
    pub keepalive_timeout: Duration,

    /// Connection attempts made by [`connect_with_retry`] after the first one.
    pub max_connect_retries: u32,

    /// Base backoff between connection attempts, multiplied by the attempt number.
    pub connect_backoff: Duration,

    /// Upper bound on the backoff between connection attempts.
    pub max_connect_backoff: Duration,

    /// Service name for tracing.
    pub service_name: &'static str,
}

impl Default for GrpcClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            tcp_keepalive: Duration::from_secs(30),
            http2_keepalive_interval: Duration::from_secs(30),
            keepalive_timeout: Duration::from_secs(10),
            max_connect_retries: 3,
            connect_backoff: Duration::from_millis(100),
            max_connect_backoff: Duration::from_secs(2),
            service_name: "grpc_client",
        }
    }
}

impl GrpcClientConfig {
    /// Create a new configuration with the given service name.
    #[must_use]
    pub fn new(service_name: &'static str) -> Self {
        Self {
            service_name,
            ..Default::default()
        }
    }

    /// Set the connect timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the number of connection retries used by [`connect_with_retry`].
    #[must_use]
    pub fn with_max_connect_retries(mut self, retries: u32) -> Self {
        self.max_connect_retries = retries;
        self
    }
}

/// Build a tonic `Endpoint` with the configured timeouts and keepalive settings.
///
/// # Errors
/// Returns [`ConnectError::InvalidUri`] if `uri` cannot be parsed.
pub fn build_endpoint(uri: &str, cfg: &GrpcClientConfig) -> Result<Endpoint, ConnectError> {
    Ok(Endpoint::from_shared(uri.to_owned())
        .map_err(|source| ConnectError::InvalidUri {
            uri: uri.to_owned(),
            source,
        })?
        .connect_timeout(cfg.connect_timeout)
        .tcp_keepalive(Some(cfg.tcp_keepalive))
        .http2_keep_alive_interval(cfg.http2_keepalive_interval)
        .keep_alive_timeout(cfg.keepalive_timeout)
        .keep_alive_while_idle(true))
}

/// Open one connection to a gRPC service.
///
/// Each call dials a fresh HTTP/2 connection; the returned [`Channel`] owns it
/// and closes it once the last clone is dropped.
///
/// # Errors
/// Returns [`ConnectError`] if the uri is invalid or the connection cannot be
/// established within `connect_timeout`.
pub async fn connect_with_stack(uri: &str, cfg: &GrpcClientConfig) -> Result<Channel, ConnectError> {
    let span = tracing::debug_span!("grpc_connect", service = cfg.service_name, uri = %uri);

    async move {
        let endpoint = build_endpoint(uri, cfg)?;
        let channel = endpoint
            .connect()
            .await
            .map_err(|source| ConnectError::Connect {
                uri: uri.to_owned(),
                source,
            })?;

        tracing::debug!(
            service = cfg.service_name,
            connect_timeout_ms = duration_to_u64_ms(cfg.connect_timeout),
            "gRPC client connected"
        );

        Ok(channel)
    }
    .instrument(span)
    .await
}

/// Connect with linear backoff between attempts.
///
/// Meant for process startup, where the peer may still be coming up. Request
/// paths should use [`connect_with_stack`] so a dead peer fails fast.
///
/// # Errors
/// Returns [`ConnectError::InvalidUri`] immediately for a malformed uri, or
/// [`ConnectError::Exhausted`] once all attempts have failed.
pub async fn connect_with_retry(uri: &str, cfg: &GrpcClientConfig) -> Result<Channel, ConnectError> {
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;

        match connect_with_stack(uri, cfg).await {
            Ok(channel) => {
                if attempt > 1 {
                    tracing::info!(
                        service = cfg.service_name,
                        attempt,
                        "gRPC connection established after retries"
                    );
                }
                return Ok(channel);
            }
            Err(e @ ConnectError::InvalidUri { .. }) => return Err(e),
            Err(e) if attempt <= cfg.max_connect_retries => {
                let backoff = (cfg.connect_backoff * attempt).min(cfg.max_connect_backoff);
                tracing::warn!(
                    service = cfg.service_name,
                    attempt,
                    max_retries = cfg.max_connect_retries,
                    error = %e,
                    backoff_ms = duration_to_u64_ms(backoff),
                    "gRPC connection failed, retrying"
                );
                tokio::time::sleep(backoff).await;
            }
            Err(e) => {
                tracing::error!(
                    service = cfg.service_name,
                    attempt,
                    error = %e,
                    "gRPC connection failed after all retries"
                );
                return Err(ConnectError::Exhausted {
                    service: cfg.service_name,
                    attempts: attempt,
                    last: Box::new(e),
                });
            }
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = GrpcClientConfig::default();
        assert_eq!(cfg.connect_timeout, Duration::from_secs(5));
        assert_eq!(cfg.max_connect_retries, 3);
    }

    #[test]
    fn test_config_builder() {
        let cfg = GrpcClientConfig::new("calculator")
            .with_connect_timeout(Duration::from_millis(250))
            .with_max_connect_retries(0);

        assert_eq!(cfg.service_name, "calculator");
        assert_eq!(cfg.connect_timeout, Duration::from_millis(250));
        assert_eq!(cfg.max_connect_retries, 0);
    }

    #[test]
    fn test_build_endpoint_succeeds() {
        let cfg = GrpcClientConfig::default();
        assert!(build_endpoint("http://127.0.0.1:50052", &cfg).is_ok());
    }

    #[test]
    fn test_build_endpoint_rejects_garbage() {
        let cfg = GrpcClientConfig::default();
        let err = build_endpoint("not a uri", &cfg).unwrap_err();
        assert!(matches!(err, ConnectError::InvalidUri { .. }));
    }
}
