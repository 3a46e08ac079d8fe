//! Calculator API trait and types
//!
//! Contract trait and error classification for calculator callers.

use async_trait::async_trait;
use tonic::{Code, Status};

use crate::models::{CalculationRequest, CalculationResponse};

/// Calculator API trait
///
/// Implemented by [`crate::CalculatorGrpcClient`]. Callers cannot tell a
/// direct call from a relayed one except through [`CalculatorError`].
#[async_trait]
pub trait CalculatorClient: Send + Sync {
    /// Evaluate `a <operator> b`.
    async fn calculate(
        &self,
        request: CalculationRequest,
    ) -> Result<CalculationResponse, CalculatorError>;
}

/// Error type for Calculator operations, classified by gRPC status code.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CalculatorError {
    /// The request was malformed: unsupported operator or division by zero.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The calculator could not be reached.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// The call did not complete within its deadline.
    #[error("deadline exceeded: {0}")]
    DeadlineExceeded(String),

    /// Any other failure, with the original status code.
    #[error("{code:?}: {message}")]
    Other { code: Code, message: String },
}

impl CalculatorError {
    /// True when retrying the same request cannot succeed.
    #[must_use]
    pub fn is_business_error(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }
}

impl From<Status> for CalculatorError {
    fn from(status: Status) -> Self {
        let message = status.message().to_owned();
        match status.code() {
            Code::InvalidArgument => Self::InvalidArgument(message),
            Code::Unavailable => Self::Unavailable(message),
            Code::DeadlineExceeded => Self::DeadlineExceeded(message),
            code => Self::Other { code, message },
        }
    }
}
