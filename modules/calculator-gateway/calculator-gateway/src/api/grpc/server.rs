//! gRPC Server implementation for calculator-gateway
//!
//! Exposes the same `CalculateService` contract as the calculation service
//! and delegates every call to the relay [`Service`].

use std::sync::Arc;

use calc_transport_grpc::caller_timeout;
use calculator_sdk::{CalculateRequest, CalculateResponse, CalculateService, CalculationRequest};
use tonic::{Request, Response, Status};

use crate::domain::Service;
use crate::infra::{Connector, Upstream};

/// gRPC service implementation that wraps the relay Service.
pub struct GatewayServiceImpl<C: Connector> {
    service: Arc<Service<C>>,
}

impl<C: Connector> Clone for GatewayServiceImpl<C> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
        }
    }
}

impl<C: Connector> GatewayServiceImpl<C> {
    #[must_use]
    pub fn new(service: Arc<Service<C>>) -> Self {
        Self { service }
    }
}

#[tonic::async_trait]
impl<C> CalculateService for GatewayServiceImpl<C>
where
    C: Connector,
    C::Conn: Upstream,
{
    async fn calculate(
        &self,
        request: Request<CalculateRequest>,
    ) -> Result<Response<CalculateResponse>, Status> {
        let caller_deadline = caller_timeout(request.metadata());
        let req = CalculationRequest::from(request.into_inner());

        let response = self
            .service
            .calculate(&req, caller_deadline)
            .await
            .into_result()?;

        Ok(Response::new(response.into()))
    }
}
