//! Classified result of one relayed request.

use std::fmt;
use std::time::Duration;

use calc_transport_grpc::RpcRetryConfig;
use calculator_sdk::CalculationResponse;
use tonic::{Code, Status};

/// Prefix of every relay-generated `Unavailable` message.
pub const UNAVAILABLE_PREFIX: &str = "calculation service unavailable";

/// What happened to a relayed request.
///
/// Every exit path of the relay produces exactly one of these before it is
/// turned into the caller's response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// The calculation service answered with a value.
    Success(CalculationResponse),

    /// The calculation service answered with an error verdict.
    UpstreamRejected { code: Code, message: String },

    /// The calculation service could not be reached, or reported itself unavailable.
    TransportFailure(String),

    /// No answer within the budget.
    DeadlineExceeded(Duration),
}

impl RelayOutcome {
    /// Classify an error status returned by the calculation service.
    #[must_use]
    pub fn from_upstream(status: &Status, budget: Duration) -> Self {
        match status.code() {
            Code::Unavailable => Self::TransportFailure(status.message().to_owned()),
            Code::DeadlineExceeded => Self::DeadlineExceeded(budget),
            code => Self::UpstreamRejected {
                code,
                message: status.message().to_owned(),
            },
        }
    }

    /// Status code the caller will see.
    #[must_use]
    pub fn code(&self) -> Code {
        match self {
            Self::Success(_) => Code::Ok,
            Self::UpstreamRejected { code, .. } => *code,
            Self::TransportFailure(_) => Code::Unavailable,
            Self::DeadlineExceeded(_) => Code::DeadlineExceeded,
        }
    }

    /// True for failures a retry might fix.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        RpcRetryConfig::is_retryable(self.code())
    }

    /// Whether the connection that produced this outcome completed a full
    /// round trip and may be reused.
    #[must_use]
    pub fn keeps_connection(&self) -> bool {
        matches!(self, Self::Success(_) | Self::UpstreamRejected { .. })
    }

    /// Response or error for the relay's own caller.
    ///
    /// # Errors
    /// Returns the caller-facing [`Status`] for every non-success outcome.
    pub fn into_result(self) -> Result<CalculationResponse, Status> {
        match self {
            Self::Success(response) => Ok(response),
            Self::UpstreamRejected { code, message } => Err(Status::new(code, message)),
            Self::TransportFailure(reason) => {
                Err(Status::unavailable(format!("{UNAVAILABLE_PREFIX}: {reason}")))
            }
            Self::DeadlineExceeded(budget) => Err(Status::deadline_exceeded(format!(
                "calculation service did not respond within {}ms",
                budget.as_millis()
            ))),
        }
    }
}

impl fmt::Display for RelayOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success(response) => write!(f, "success ({})", response.result),
            Self::UpstreamRejected { code, message } => {
                write!(f, "rejected ({}: {message})", code.description())
            }
            Self::TransportFailure(reason) => write!(f, "transport failure ({reason})"),
            Self::DeadlineExceeded(budget) => {
                write!(f, "deadline exceeded ({}ms)", budget.as_millis())
            }
        }
    }
}
