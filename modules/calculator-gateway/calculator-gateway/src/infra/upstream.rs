//! The calculation service as an outbound dependency.

use async_trait::async_trait;
use calc_transport_grpc::{ConnectError, GrpcClientConfig, connect_with_stack};
use calculator_sdk::{CalculateRequest, CalculateServiceClient, CalculationRequest, CalculationResponse};
use tonic::Status;
use tonic::transport::Channel;

use super::pool::Connector;

/// One open connection to the calculation service.
#[async_trait]
pub trait Upstream: Send {
    /// Forward one request over this connection.
    ///
    /// # Errors
    /// Returns the [`Status`] produced by the calculation service or by the
    /// transport.
    async fn calculate(
        &mut self,
        request: CalculationRequest,
    ) -> Result<CalculationResponse, Status>;
}

#[async_trait]
impl Upstream for CalculateServiceClient<Channel> {
    async fn calculate(
        &mut self,
        request: CalculationRequest,
    ) -> Result<CalculationResponse, Status> {
        let response =
            CalculateServiceClient::calculate(self, CalculateRequest::from(request)).await?;
        Ok(response.into_inner().into())
    }
}

/// Dials the calculation service, one HTTP/2 connection per call.
pub struct GrpcConnector {
    uri: String,
    cfg: GrpcClientConfig,
}

impl GrpcConnector {
    #[must_use]
    pub fn new(uri: impl Into<String>, cfg: GrpcClientConfig) -> Self {
        Self {
            uri: uri.into(),
            cfg,
        }
    }
}

#[async_trait]
impl Connector for GrpcConnector {
    type Conn = CalculateServiceClient<Channel>;

    async fn connect(&self) -> Result<Self::Conn, ConnectError> {
        let channel = connect_with_stack(&self.uri, &self.cfg).await?;
        Ok(CalculateServiceClient::new(channel))
    }
}
