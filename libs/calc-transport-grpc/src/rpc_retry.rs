//! Bounded retry policy for unary gRPC calls.
//!
//! Only transient, network-like failures are eligible:
//! - [`tonic::Code::Unavailable`]
//! - [`tonic::Code::DeadlineExceeded`]
//!
//! Every other code is a verdict from the peer and is never retried. The
//! default policy performs no retries at all, so a caller gets exactly one
//! attempt unless it opts in.
//!
//! ## Idempotency Warning
//!
//! **Retrying assumes the operation is idempotent.** A call that timed out may
//! still have executed on the peer.

use std::time::Duration;

use tonic::Code;

/// Retry policy for transient RPC failures.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct RpcRetryConfig {
    /// Maximum number of retry attempts (not including the initial call).
    pub max_retries: u32,

    /// Base backoff; the delay before retry `n` is `base_backoff * n`.
    pub base_backoff: Duration,

    /// Upper bound on a single backoff delay.
    pub max_backoff: Duration,
}

impl Default for RpcRetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            base_backoff: Duration::from_millis(50),
            max_backoff: Duration::from_millis(500),
        }
    }
}

impl RpcRetryConfig {
    /// Create a policy with the given maximum retries.
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// Set the base backoff duration.
    pub fn with_base_backoff(mut self, duration: Duration) -> Self {
        self.base_backoff = duration;
        self
    }

    /// Set the maximum backoff duration.
    pub fn with_max_backoff(mut self, duration: Duration) -> Self {
        self.max_backoff = duration;
        self
    }

    /// Whether a failure with this status code may be retried.
    #[must_use]
    pub fn is_retryable(code: Code) -> bool {
        matches!(code, Code::Unavailable | Code::DeadlineExceeded)
    }

    /// Whether another attempt is allowed after `attempt` attempts have been made.
    #[must_use]
    pub fn allows_retry(&self, attempt: u32) -> bool {
        attempt <= self.max_retries
    }

    /// Delay before the retry following attempt number `attempt` (1-based).
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_backoff
            .saturating_mul(attempt)
            .min(self.max_backoff)
    }
}
