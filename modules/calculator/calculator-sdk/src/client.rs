//! gRPC client implementation of `CalculatorClient`

use std::time::Duration;

use async_trait::async_trait;
use calc_transport_grpc::{ConnectError, GrpcClientConfig, connect_with_retry};
use tonic::transport::Channel;

use crate::api::{CalculatorClient, CalculatorError};
use crate::models::{CalculationRequest, CalculationResponse};
use crate::proto::CalculateRequest;
use crate::proto::calculate_service_client::CalculateServiceClient;

/// gRPC client for either calculator endpoint.
#[derive(Clone)]
pub struct CalculatorGrpcClient {
    inner: CalculateServiceClient<Channel>,
    timeout: Option<Duration>,
}

impl CalculatorGrpcClient {
    /// Connect using the default transport configuration with retries.
    ///
    /// # Errors
    /// Returns [`ConnectError`] if no connection could be established.
    pub async fn connect(uri: &str) -> Result<Self, ConnectError> {
        Self::connect_with(uri, &GrpcClientConfig::new("calculator")).await
    }

    /// Connect with an explicit transport configuration.
    ///
    /// # Errors
    /// Returns [`ConnectError`] if no connection could be established.
    pub async fn connect_with(uri: &str, cfg: &GrpcClientConfig) -> Result<Self, ConnectError> {
        let channel = connect_with_retry(uri, cfg).await?;
        Ok(Self::from_channel(channel))
    }

    /// Wrap an existing channel.
    #[must_use]
    pub fn from_channel(channel: Channel) -> Self {
        Self {
            inner: CalculateServiceClient::new(channel),
            timeout: None,
        }
    }

    /// Announce a deadline to the server with every call (`grpc-timeout`).
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[async_trait]
impl CalculatorClient for CalculatorGrpcClient {
    async fn calculate(
        &self,
        request: CalculationRequest,
    ) -> Result<CalculationResponse, CalculatorError> {
        let mut client = self.inner.clone();

        let mut grpc_request = tonic::Request::new(CalculateRequest::from(request));
        if let Some(timeout) = self.timeout {
            grpc_request.set_timeout(timeout);
        }

        let response = client.calculate(grpc_request).await.map_err(|status| {
            tracing::debug!(code = ?status.code(), message = %status.message(), "calculate failed");
            CalculatorError::from(status)
        })?;

        Ok(response.into_inner().into())
    }
}
