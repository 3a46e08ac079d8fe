//! Domain service for calculator
//!
//! Contains the arithmetic rules. All operations use wrapping 32-bit
//! two's-complement arithmetic; overflow is not reported.

use calculator_sdk::{CalculationRequest, CalculationResponse};
use tracing::{debug, info};

use super::error::ComputeError;

/// Operators understood by the calculation service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
}

impl Operator {
    /// Parse the wire symbol. Returns `None` for anything but `+ - * /`.
    #[must_use]
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "+" => Some(Self::Add),
            "-" => Some(Self::Sub),
            "*" => Some(Self::Mul),
            "/" => Some(Self::Div),
            _ => None,
        }
    }

    /// Apply the operator.
    ///
    /// # Errors
    /// Returns [`ComputeError::DivisionByZero`] for `x / 0`.
    pub fn apply(self, a: i32, b: i32) -> Result<i32, ComputeError> {
        match self {
            Self::Add => Ok(a.wrapping_add(b)),
            Self::Sub => Ok(a.wrapping_sub(b)),
            Self::Mul => Ok(a.wrapping_mul(b)),
            Self::Div if b == 0 => Err(ComputeError::DivisionByZero),
            // Truncates toward zero; i32::MIN / -1 wraps to i32::MIN.
            Self::Div => Ok(a.wrapping_div(b)),
        }
    }
}

/// Stateless calculation service.
#[derive(Clone, Default)]
pub struct Service;

impl Service {
    /// Create a new service.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Evaluate one request.
    ///
    /// # Errors
    /// Returns [`ComputeError::UnsupportedOperation`] for an unknown operator
    /// and [`ComputeError::DivisionByZero`] when dividing by zero.
    pub fn calculate(
        &self,
        request: &CalculationRequest,
    ) -> Result<CalculationResponse, ComputeError> {
        let CalculationRequest { a, b, operator } = request;

        let Some(op) = Operator::from_symbol(operator) else {
            debug!(operator = %operator, "rejecting unsupported operator");
            return Err(ComputeError::UnsupportedOperation(operator.clone()));
        };

        let result = op.apply(*a, *b)?;

        info!(a, operator = %operator, b, result, "Calculation performed");
        Ok(CalculationResponse { result })
    }
}
