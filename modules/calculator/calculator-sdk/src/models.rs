//! Transport-agnostic request/response types.

use crate::proto;

/// One arithmetic request.
///
/// `operator` is kept as the caller sent it; only the calculation service
/// decides whether it is meaningful.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalculationRequest {
    pub a: i32,
    pub b: i32,
    pub operator: String,
}

impl CalculationRequest {
    #[must_use]
    pub fn new(a: i32, operator: impl Into<String>, b: i32) -> Self {
        Self {
            a,
            b,
            operator: operator.into(),
        }
    }
}

/// Result of a successful calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalculationResponse {
    pub result: i32,
}

impl From<proto::CalculateRequest> for CalculationRequest {
    fn from(req: proto::CalculateRequest) -> Self {
        Self {
            a: req.a,
            b: req.b,
            operator: req.opr,
        }
    }
}

impl From<CalculationRequest> for proto::CalculateRequest {
    fn from(req: CalculationRequest) -> Self {
        Self {
            a: req.a,
            b: req.b,
            opr: req.operator,
        }
    }
}

impl From<proto::CalculateResponse> for CalculationResponse {
    fn from(resp: proto::CalculateResponse) -> Self {
        Self {
            result: resp.result,
        }
    }
}

impl From<CalculationResponse> for proto::CalculateResponse {
    fn from(resp: CalculationResponse) -> Self {
        Self {
            result: resp.result,
        }
    }
}
