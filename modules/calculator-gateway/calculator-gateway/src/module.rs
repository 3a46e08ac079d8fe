//! Calculator gateway module wiring
//!
//! Builds the relay from configuration and serves it as
//! `calc.v1.CalculateService`.

use std::sync::Arc;

use calc_transport_grpc::{ServeError, serve_tcp};
use calculator_sdk::{CalculateServiceServer, SERVICE_NAME};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tonic::service::{Routes, RoutesBuilder};

use crate::api::grpc::GatewayServiceImpl;
use crate::config::UpstreamConfig;
use crate::domain::Service;
use crate::infra::{Connector, GrpcConnector, Upstream};

/// Relay module.
pub struct CalculatorGateway<C: Connector = GrpcConnector> {
    service: Arc<Service<C>>,
}

impl CalculatorGateway {
    /// Relay to the calculation service described by `cfg`.
    ///
    /// No connection is opened until the first request arrives.
    #[must_use]
    pub fn from_config(cfg: &UpstreamConfig) -> Self {
        tracing::info!(
            upstream = %cfg.uri,
            deadline_ms = %cfg.deadline.as_millis(),
            max_connections = cfg.pool.max_connections,
            max_idle = cfg.pool.max_idle,
            "initializing calculator gateway"
        );
        Self::new(Arc::new(Service::from_config(cfg)))
    }
}

impl<C> CalculatorGateway<C>
where
    C: Connector,
    C::Conn: Upstream,
{
    #[must_use]
    pub fn new(service: Arc<Service<C>>) -> Self {
        Self { service }
    }

    /// Routes exposing `calc.v1.CalculateService`.
    #[must_use]
    pub fn routes(&self) -> Routes {
        let svc = CalculateServiceServer::new(GatewayServiceImpl::new(Arc::clone(&self.service)));
        let mut builder = RoutesBuilder::default();
        builder.add_service(svc);
        builder.routes()
    }

    /// Serve on `listener` until `cancel` fires.
    ///
    /// # Errors
    /// Returns [`ServeError`] if the gRPC server fails.
    pub async fn serve(
        &self,
        listener: TcpListener,
        cancel: CancellationToken,
    ) -> Result<(), ServeError> {
        tracing::info!(service = SERVICE_NAME, "starting calculator gateway");
        serve_tcp(listener, self.routes(), cancel).await
    }
}
