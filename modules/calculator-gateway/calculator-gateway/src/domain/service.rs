//! Domain service for calculator-gateway
//!
//! Forwards one calculation to the calculation service under a deadline
//! budget and classifies whatever comes back into a [`RelayOutcome`].

use std::time::Duration;

use calc_transport_grpc::RpcRetryConfig;
use calculator_sdk::CalculationRequest;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

use crate::config::{DeadlinePolicy, UpstreamConfig};
use crate::domain::outcome::RelayOutcome;
use crate::infra::{ConnectionPool, Connector, GrpcConnector, PoolStats, Upstream};

/// Relay service.
///
/// The pool is the only state shared between requests.
pub struct Service<C: Connector> {
    pool: ConnectionPool<C>,
    budget: Duration,
    policy: DeadlinePolicy,
    retry: RpcRetryConfig,
}

impl Service<GrpcConnector> {
    /// Relay to the calculation service described by `cfg`.
    #[must_use]
    pub fn from_config(cfg: &UpstreamConfig) -> Self {
        Self::new(GrpcConnector::new(cfg.uri.clone(), cfg.client_config()), cfg)
    }
}

impl<C> Service<C>
where
    C: Connector,
    C::Conn: Upstream,
{
    #[must_use]
    pub fn new(connector: C, cfg: &UpstreamConfig) -> Self {
        Self {
            pool: ConnectionPool::new(connector, &cfg.pool),
            budget: cfg.deadline,
            policy: cfg.deadline_policy,
            retry: RpcRetryConfig::from(&cfg.retry),
        }
    }

    #[must_use]
    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    /// Relay one request.
    ///
    /// `caller_deadline` is the time the inbound caller is still willing to
    /// wait, if it announced one. It only shortens the budget under
    /// [`DeadlinePolicy::CallerBounded`].
    #[instrument(
        skip(self, request),
        fields(a = request.a, operator = %request.operator, b = request.b)
    )]
    pub async fn calculate(
        &self,
        request: &CalculationRequest,
        caller_deadline: Option<Duration>,
    ) -> RelayOutcome {
        let budget = self.policy.effective_budget(self.budget, caller_deadline);
        let deadline = deadline_after(budget);

        let mut attempt: u32 = 1;
        loop {
            let outcome = self.attempt(request, deadline, budget).await;

            if !outcome.is_transient() || !self.retry.allows_retry(attempt) {
                log_outcome(&outcome);
                return outcome;
            }

            let backoff = self.retry.backoff(attempt);
            if deadline_after(backoff) >= deadline {
                log_outcome(&outcome);
                return outcome;
            }

            warn!(
                attempt,
                backoff_ms = %backoff.as_millis(),
                %outcome,
                "transient upstream failure, retrying"
            );
            tokio::time::sleep(backoff).await;
            attempt = attempt.saturating_add(1);
        }
    }

    /// One attempt, dial or pool wait included, bounded by `deadline`.
    ///
    /// Expiry drops the in-flight future, which closes the connection it
    /// was holding.
    async fn attempt(
        &self,
        request: &CalculationRequest,
        deadline: Instant,
        budget: Duration,
    ) -> RelayOutcome {
        tokio::time::timeout_at(deadline, self.relay_once(request, budget))
            .await
            .unwrap_or(RelayOutcome::DeadlineExceeded(budget))
    }

    async fn relay_once(&self, request: &CalculationRequest, budget: Duration) -> RelayOutcome {
        let mut conn = match self.pool.acquire().await {
            Ok(conn) => conn,
            Err(e) => return RelayOutcome::TransportFailure(e.to_string()),
        };

        let outcome = match conn.calculate(request.clone()).await {
            Ok(response) => RelayOutcome::Success(response),
            Err(status) => RelayOutcome::from_upstream(&status, budget),
        };

        if outcome.keeps_connection() {
            conn.mark_reusable();
        }
        outcome
    }
}

const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// `now + after`, saturating far in the future instead of overflowing.
fn deadline_after(after: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(after).unwrap_or_else(|| now + FAR_FUTURE)
}

fn log_outcome(outcome: &RelayOutcome) {
    match outcome {
        RelayOutcome::Success(response) => debug!(result = response.result, "relay succeeded"),
        RelayOutcome::UpstreamRejected { .. } => debug!(%outcome, "upstream rejected request"),
        RelayOutcome::TransportFailure(_) | RelayOutcome::DeadlineExceeded(_) => {
            warn!(%outcome, "relay failed");
        }
    }
}
