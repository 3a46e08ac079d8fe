//! gRPC Server implementation for calculator
//!
//! The server implementation handles gRPC requests and delegates
//! to the domain Service for business logic.

use std::sync::Arc;

use tonic::{Request, Response, Status};

use calculator_sdk::{CalculateRequest, CalculateResponse, CalculateService, CalculationRequest};

use crate::domain::{ComputeError, Service};

/// gRPC service implementation that wraps the domain Service.
#[derive(Clone)]
pub struct CalculatorServiceImpl {
    service: Arc<Service>,
}

impl CalculatorServiceImpl {
    /// Create a new `CalculatorServiceImpl` with the given Service.
    #[must_use]
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

impl From<ComputeError> for Status {
    fn from(err: ComputeError) -> Self {
        Status::invalid_argument(err.to_string())
    }
}

#[tonic::async_trait]
impl CalculateService for CalculatorServiceImpl {
    async fn calculate(
        &self,
        request: Request<CalculateRequest>,
    ) -> Result<Response<CalculateResponse>, Status> {
        let req = CalculationRequest::from(request.into_inner());

        let resp = self.service.calculate(&req)?;

        Ok(Response::new(resp.into()))
    }
}
