//! Calculator module wiring
//!
//! Builds the tonic routes for the calculation service and serves them.

use std::sync::Arc;

use calc_transport_grpc::{ServeError, serve_tcp};
use calculator_sdk::{CalculateServiceServer, SERVICE_NAME};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tonic::service::{Routes, RoutesBuilder};

use crate::api::grpc::CalculatorServiceImpl;
use crate::domain::Service;

/// Calculation service module.
#[derive(Clone, Default)]
pub struct CalculatorModule {
    service: Arc<Service>,
}

impl CalculatorModule {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes exposing `calc.v1.CalculateService`.
    #[must_use]
    pub fn routes(&self) -> Routes {
        let svc = CalculateServiceServer::new(CalculatorServiceImpl::new(self.service.clone()));
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
        tracing::info!(service = SERVICE_NAME, "starting calculation service");
        serve_tcp(listener, self.routes(), cancel).await
    }
}
